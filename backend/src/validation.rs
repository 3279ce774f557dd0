//! Request body validation for student writes.
//!
//! Runs before any storage access. Reports every problem in the body at once
//! so clients can fix all fields in a single round trip. Uniqueness is left to
//! the database.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use shared::{StudentFields, ValidationIssue};

use crate::domain::StudentError;

static EMAIL_LOCAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\p{L}\p{N}!#$%&'*+/=?^_`{|}~-]+(\.[\p{L}\p{N}!#$%&'*+/=?^_`{|}~-]+)*$")
        .expect("valid email local part regex")
});
static EMAIL_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\p{L}\p{N}]([\p{L}\p{N}-]{0,61}[\p{L}\p{N}])?$").expect("valid domain label regex")
});

const MAX_EMAIL_LEN: usize = 254;
const MAX_LOCAL_LEN: usize = 64;

/// Validate a JSON body and turn it into the fields of a student
pub fn validate_student(body: &Value) -> Result<StudentFields, StudentError> {
    let Some(object) = body.as_object() else {
        return Err(StudentError::Validation(vec![ValidationIssue::new(
            &["body"],
            "Input should be a valid dictionary or object to extract fields from",
            "model_attributes_type",
        )]));
    };

    let mut issues = Vec::new();

    let name = required_text(object, "name", &mut issues);
    let age = required_integer(object, "age", &mut issues);
    let address = required_text(object, "address", &mut issues);
    let email = required_email(object, "email", &mut issues);

    match (name, age, address, email) {
        (Some(name), Some(age), Some(address), Some(email)) if issues.is_empty() => Ok(StudentFields {
            name,
            age,
            address,
            email,
        }),
        _ => Err(StudentError::Validation(issues)),
    }
}

fn field<'a>(
    object: &'a Map<String, Value>,
    key: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<&'a Value> {
    match object.get(key) {
        Some(Value::Null) | None => {
            issues.push(ValidationIssue::new(&["body", key], "Field required", "missing"));
            None
        }
        Some(value) => Some(value),
    }
}

fn required_text(
    object: &Map<String, Value>,
    key: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<String> {
    let value = field(object, key, issues)?;
    let Some(text) = value.as_str() else {
        issues.push(ValidationIssue::new(
            &["body", key],
            "Input should be a valid string",
            "string_type",
        ));
        return None;
    };

    if text.trim().is_empty() {
        issues.push(ValidationIssue::new(
            &["body", key],
            "String should have at least 1 character",
            "string_too_short",
        ));
        return None;
    }

    Some(text.to_string())
}

fn required_integer(
    object: &Map<String, Value>,
    key: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<i64> {
    let value = field(object, key, issues)?;
    match value.as_i64() {
        Some(number) => Some(number),
        None => {
            issues.push(ValidationIssue::new(
                &["body", key],
                "Input should be a valid integer",
                "int_type",
            ));
            None
        }
    }
}

fn required_email(
    object: &Map<String, Value>,
    key: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<String> {
    let value = field(object, key, issues)?;
    let Some(text) = value.as_str() else {
        issues.push(ValidationIssue::new(
            &["body", key],
            "Input should be a valid string",
            "string_type",
        ));
        return None;
    };

    match normalize_email(text) {
        Ok(email) => Some(email),
        Err(reason) => {
            issues.push(ValidationIssue::new(
                &["body", key],
                format!("value is not a valid email address: {}", reason),
                "value_error",
            ));
            None
        }
    }
}

/// Check email syntax and lower-case the domain part
pub fn normalize_email(input: &str) -> Result<String, &'static str> {
    if input.len() > MAX_EMAIL_LEN {
        return Err("The email address is too long.");
    }

    let mut parts = input.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err("An email address must have exactly one @-sign.");
    };

    if local.is_empty() {
        return Err("There must be something before the @-sign.");
    }
    if local.len() > MAX_LOCAL_LEN {
        return Err("The part before the @-sign is too long.");
    }
    if !EMAIL_LOCAL_RE.is_match(local) {
        return Err("The part before the @-sign is not valid.");
    }

    if domain.is_empty() {
        return Err("There must be something after the @-sign.");
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return Err("The part after the @-sign is not valid. It should have a period.");
    }
    if !labels.iter().all(|label| EMAIL_LABEL_RE.is_match(label)) {
        return Err("The part after the @-sign is not valid.");
    }
    if labels.last().map_or(true, |tld| tld.chars().all(|c| c.is_ascii_digit())) {
        return Err("The part after the @-sign is not valid.");
    }

    Ok(format!("{}@{}", local, domain.to_lowercase()))
}
