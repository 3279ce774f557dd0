use serde_json::Value;
use shared::{Student, ValidationIssue};
use sqlx::error::ErrorKind;
use tracing::{info, warn};

use crate::db::DbConnection;
use crate::repository::StudentRepository;
use crate::validation::validate_student;

/// Failures a student operation can surface to the caller
#[derive(Debug, thiserror::Error)]
pub enum StudentError {
    #[error("Invalid student data")]
    Validation(Vec<ValidationIssue>),
    #[error("Student not found: {0}")]
    NotFound(i64),
    #[error("{0}")]
    ConstraintViolation(String),
    #[error("Storage error: {0}")]
    Storage(sqlx::Error),
}

impl From<sqlx::Error> for StudentError {
    fn from(err: sqlx::Error) -> Self {
        let kind = match &err {
            sqlx::Error::Database(db_err) => Some(db_err.kind()),
            _ => None,
        };

        match kind {
            Some(ErrorKind::UniqueViolation) => {
                StudentError::ConstraintViolation("A student with this email already exists".to_string())
            }
            Some(ErrorKind::NotNullViolation) | Some(ErrorKind::CheckViolation) => {
                StudentError::ConstraintViolation("A required student field is missing".to_string())
            }
            _ => StudentError::Storage(err),
        }
    }
}

pub type StudentResult<T> = Result<T, StudentError>;

/// Service for managing student records.
///
/// Every call checks out its own session, performs one repository operation
/// and lets the session drop on return.
#[derive(Clone)]
pub struct StudentService {
    db: DbConnection,
}

impl StudentService {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// List every student
    pub async fn list_students(&self) -> StudentResult<Vec<Student>> {
        let mut session = self.db.session().await?;
        let students = StudentRepository::list_all(&mut session).await?;

        info!("Found {} students", students.len());
        Ok(students)
    }

    /// Get a student by ID
    pub async fn get_student(&self, id: i64) -> StudentResult<Student> {
        let mut session = self.db.session().await?;

        match StudentRepository::get(&mut session, id).await? {
            Some(student) => Ok(student),
            None => {
                warn!("Student not found: {}", id);
                Err(StudentError::NotFound(id))
            }
        }
    }

    /// Validate a body and create a student from it
    pub async fn create_student(&self, body: &Value) -> StudentResult<Student> {
        let fields = validate_student(body)?;

        let mut session = self.db.session().await?;
        let student = StudentRepository::insert(&mut session, &fields)
            .await
            .map_err(log_constraint_violation)?;

        info!("Created student with ID: {}", student.id);
        Ok(student)
    }

    /// Replace every field of an existing student
    pub async fn update_student(&self, id: i64, body: &Value) -> StudentResult<Student> {
        let fields = validate_student(body)?;

        let mut session = self.db.session().await?;
        match StudentRepository::replace(&mut session, id, &fields)
            .await
            .map_err(log_constraint_violation)?
        {
            Some(student) => {
                info!("Updated student with ID: {}", id);
                Ok(student)
            }
            None => {
                warn!("Student not found for update: {}", id);
                Err(StudentError::NotFound(id))
            }
        }
    }

    /// Hard-delete a student
    pub async fn delete_student(&self, id: i64) -> StudentResult<()> {
        let mut session = self.db.session().await?;

        if StudentRepository::delete(&mut session, id).await? {
            info!("Deleted student with ID: {}", id);
            Ok(())
        } else {
            warn!("Student not found for delete: {}", id);
            Err(StudentError::NotFound(id))
        }
    }
}

fn log_constraint_violation(err: sqlx::Error) -> StudentError {
    let err = StudentError::from(err);
    if let StudentError::ConstraintViolation(message) = &err {
        warn!("Constraint violation: {}", message);
    }
    err
}
