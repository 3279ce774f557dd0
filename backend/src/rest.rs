//! # REST API
//!
//! HTTP endpoints for student records. This layer only translates: it pulls
//! the path id and JSON body out of the request, hands them to
//! [`StudentService`], and turns the outcome into a status code and JSON body.

use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::Value;
use shared::{DeleteStudentResponse, ErrorDetail, ValidationErrorResponse, ValidationIssue};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::domain::{StudentError, StudentService};

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub student_service: StudentService,
}

impl AppState {
    pub fn new(student_service: StudentService) -> Self {
        Self { student_service }
    }
}

impl IntoResponse for StudentError {
    fn into_response(self) -> Response {
        match self {
            StudentError::Validation(issues) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ValidationErrorResponse { detail: issues }),
            )
                .into_response(),
            StudentError::NotFound(_) => {
                (StatusCode::NOT_FOUND, Json(ErrorDetail::new("Student not found"))).into_response()
            }
            StudentError::ConstraintViolation(message) => {
                (StatusCode::CONFLICT, Json(ErrorDetail::new(message))).into_response()
            }
            StudentError::Storage(e) => {
                error!("Storage error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorDetail::new("Internal server error")),
                )
                    .into_response()
            }
        }
    }
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, cors_origin: Option<HeaderValue>) -> Router {
    let router = Router::new()
        .route("/students", get(list_students).post(create_student))
        .route(
            "/students/:student_id",
            get(get_student).put(update_student).delete(delete_student),
        )
        .fallback(not_found)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http());

    match cors_origin {
        Some(origin) => {
            info!("Allowing cross-origin requests from {:?}", origin);
            let cors = CorsLayer::new()
                .allow_origin(origin)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers(Any);
            router.layer(cors)
        }
        None => router,
    }
}

/// GET /students
pub async fn list_students(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /students");

    match state.student_service.list_students().await {
        Ok(students) => (StatusCode::OK, Json(students)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /students/:student_id
pub async fn get_student(
    State(state): State<AppState>,
    student_id: Result<Path<i64>, PathRejection>,
) -> impl IntoResponse {
    let student_id = match path_id(student_id) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    info!("GET /students/{}", student_id);

    match state.student_service.get_student(student_id).await {
        Ok(student) => (StatusCode::OK, Json(student)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /students
pub async fn create_student(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> impl IntoResponse {
    info!("POST /students");

    let body = match json_body(body) {
        Ok(body) => body,
        Err(e) => return e.into_response(),
    };

    match state.student_service.create_student(&body).await {
        Ok(student) => (StatusCode::OK, Json(student)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// PUT /students/:student_id
pub async fn update_student(
    State(state): State<AppState>,
    student_id: Result<Path<i64>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> impl IntoResponse {
    let student_id = match path_id(student_id) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    info!("PUT /students/{}", student_id);

    let body = match json_body(body) {
        Ok(body) => body,
        Err(e) => return e.into_response(),
    };

    match state.student_service.update_student(student_id, &body).await {
        Ok(student) => (StatusCode::OK, Json(student)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// DELETE /students/:student_id
pub async fn delete_student(
    State(state): State<AppState>,
    student_id: Result<Path<i64>, PathRejection>,
) -> impl IntoResponse {
    let student_id = match path_id(student_id) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    info!("DELETE /students/{}", student_id);

    match state.student_service.delete_student(student_id).await {
        Ok(()) => (StatusCode::OK, Json(DeleteStudentResponse::for_id(student_id))).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(ErrorDetail::new("Not Found")))
}

fn path_id(extracted: Result<Path<i64>, PathRejection>) -> Result<i64, StudentError> {
    match extracted {
        Ok(Path(id)) => Ok(id),
        Err(rejection) => Err(StudentError::Validation(vec![ValidationIssue::new(
            &["path", "student_id"],
            format!("Input should be a valid integer: {}", rejection.body_text()),
            "int_parsing",
        )])),
    }
}

// Bodies are taken as untyped JSON so validation can report every bad field at once
fn json_body(extracted: Result<Json<Value>, JsonRejection>) -> Result<Value, StudentError> {
    match extracted {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => Err(StudentError::Validation(vec![ValidationIssue::new(
            &["body"],
            rejection.body_text(),
            "json_invalid",
        )])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::json;
    use shared::Student;
    use tower::ServiceExt;

    async fn setup_test_app() -> Router {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        create_router(AppState::new(StudentService::new(db)), None)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn alice() -> Value {
        json!({
            "name": "Alice",
            "age": 20,
            "address": "1 Main St",
            "email": "alice@example.com"
        })
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let app = setup_test_app().await;

        let (status, created) = send(&app, Method::POST, "/students", Some(alice())).await;
        assert_eq!(status, StatusCode::OK);
        let created: Student = serde_json::from_value(created).unwrap();
        assert!(created.id > 0);
        assert_eq!(created.name, "Alice");

        let (status, fetched) = send(&app, Method::GET, &format!("/students/{}", created.id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(serde_json::from_value::<Student>(fetched).unwrap(), created);
    }

    #[tokio::test]
    async fn test_list_students() {
        let app = setup_test_app().await;

        let (status, listed) = send(&app, Method::GET, "/students", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed, json!([]));

        send(&app, Method::POST, "/students", Some(alice())).await;
        let (status, listed) = send(&app, Method::GET, "/students", None).await;
        assert_eq!(status, StatusCode::OK);

        let students: Vec<Student> = serde_json::from_value(listed).unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_get_missing_student_is_404() {
        let app = setup_test_app().await;

        let (status, body) = send(&app, Method::GET, "/students/12345", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"detail": "Student not found"}));
    }

    #[tokio::test]
    async fn test_invalid_email_is_422_and_not_persisted() {
        let app = setup_test_app().await;

        let mut body = alice();
        body["email"] = json!("not-an-email");
        let (status, response) = send(&app, Method::POST, "/students", Some(body)).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response["detail"][0]["loc"], json!(["body", "email"]));
        assert_eq!(response["detail"][0]["type"], json!("value_error"));

        let (_, listed) = send(&app, Method::GET, "/students", None).await;
        assert_eq!(listed, json!([]));
    }

    #[tokio::test]
    async fn test_missing_fields_are_422() {
        let app = setup_test_app().await;

        let (status, response) =
            send(&app, Method::POST, "/students", Some(json!({"name": "Alice"}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let detail = response["detail"].as_array().unwrap();
        assert_eq!(detail.len(), 3);
        assert!(detail.iter().all(|issue| issue["type"] == json!("missing")));
    }

    #[tokio::test]
    async fn test_malformed_json_is_422() {
        let app = setup_test_app().await;

        let request = Request::builder()
            .method(Method::POST)
            .uri("/students")
            .header("content-type", "application/json")
            .body(Body::from("{\"name\": "))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["detail"][0]["type"], json!("json_invalid"));
    }

    #[tokio::test]
    async fn test_non_integer_path_id_is_422() {
        let app = setup_test_app().await;

        let (status, body) = send(&app, Method::GET, "/students/abc", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["detail"][0]["loc"], json!(["path", "student_id"]));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_409() {
        let app = setup_test_app().await;

        let (first, _) = send(&app, Method::POST, "/students", Some(alice())).await;
        let (second, body) = send(&app, Method::POST, "/students", Some(alice())).await;

        assert_eq!(first, StatusCode::OK);
        assert_eq!(second, StatusCode::CONFLICT);
        assert!(body["detail"].as_str().unwrap().contains("email"));
    }

    #[tokio::test]
    async fn test_update_replaces_record() {
        let app = setup_test_app().await;

        let (_, created) = send(&app, Method::POST, "/students", Some(alice())).await;
        let id = created["id"].as_i64().unwrap();

        let replacement = json!({
            "name": "Alicia",
            "age": 25,
            "address": "5 Lake Dr",
            "email": "alicia@example.com"
        });
        let (status, updated) =
            send(&app, Method::PUT, &format!("/students/{}", id), Some(replacement)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            updated,
            json!({
                "id": id,
                "name": "Alicia",
                "age": 25,
                "address": "5 Lake Dr",
                "email": "alicia@example.com"
            })
        );

        let (_, fetched) = send(&app, Method::GET, &format!("/students/{}", id), None).await;
        assert_eq!(fetched, updated);
    }

    #[tokio::test]
    async fn test_update_missing_student_is_404() {
        let app = setup_test_app().await;

        let (status, body) = send(&app, Method::PUT, "/students/77", Some(alice())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"detail": "Student not found"}));
    }

    #[tokio::test]
    async fn test_delete_then_get_is_404() {
        let app = setup_test_app().await;

        let (_, created) = send(&app, Method::POST, "/students", Some(alice())).await;
        let id = created["id"].as_i64().unwrap();

        let (status, body) = send(&app, Method::DELETE, &format!("/students/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": format!("Student with ID {} deleted", id)}));

        let (status, _) = send(&app, Method::GET, &format!("/students/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::DELETE, &format!("/students/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let app = setup_test_app().await;

        let (status, body) = send(&app, Method::GET, "/teachers", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"detail": "Not Found"}));
    }

    #[tokio::test]
    async fn test_cors_header_for_configured_origin() {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        let origin = HeaderValue::from_static("http://localhost:8080");
        let app = create_router(AppState::new(StudentService::new(db)), Some(origin));

        let request = Request::builder()
            .method(Method::GET)
            .uri("/students")
            .header("origin", "http://localhost:8080")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "http://localhost:8080"
        );
    }
}
