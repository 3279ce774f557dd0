use serde::{Deserialize, Serialize};

/// A persisted student record as returned by every read and write endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Assigned by storage on insert, never changes afterwards
    pub id: i64,
    pub name: String,
    pub age: i64,
    pub address: String,
    /// Unique across all students
    pub email: String,
}

/// The writable fields of a student. Used as the body of create and update.
///
/// Updates replace all four fields wholesale; there is no partial patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentFields {
    pub name: String,
    pub age: i64,
    pub address: String,
    pub email: String,
}

impl Student {
    /// Attach a storage id to a set of fields
    pub fn from_fields(id: i64, fields: StudentFields) -> Self {
        Self {
            id,
            name: fields.name,
            age: fields.age,
            address: fields.address,
            email: fields.email,
        }
    }

    /// The writable part of this record
    pub fn fields(&self) -> StudentFields {
        StudentFields {
            name: self.name.clone(),
            age: self.age,
            address: self.address.clone(),
            email: self.email.clone(),
        }
    }
}

/// Body returned by DELETE /students/:id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteStudentResponse {
    pub message: String,
}

impl DeleteStudentResponse {
    pub fn for_id(id: i64) -> Self {
        Self {
            message: format!("Student with ID {} deleted", id),
        }
    }
}

/// Error body for not-found, conflict and internal errors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}

impl ErrorDetail {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// One field-level problem found while validating a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Where the problem is, e.g. `["body", "email"]` or `["path", "student_id"]`
    pub loc: Vec<String>,
    /// Human-readable description
    pub msg: String,
    /// Machine-readable error code such as `missing` or `int_type`
    #[serde(rename = "type")]
    pub kind: String,
}

impl ValidationIssue {
    pub fn new(loc: &[&str], msg: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            loc: loc.iter().map(|part| part.to_string()).collect(),
            msg: msg.into(),
            kind: kind.into(),
        }
    }
}

/// Error body for 422 responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorResponse {
    pub detail: Vec<ValidationIssue>,
}
