use crate::access::ResourceKind;
use crate::config::ConfigError;
use crate::directory::repository::RepositoryError;
use crate::directory::validation::FieldErrors;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

pub const DUPLICATE_ENROLLMENT: &str = "Student is already enrolled in this course.";

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Seed(RepositoryError),
    Service(ServiceError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Seed(err) => write!(f, "seed error: {}", err),
            AppError::Service(err) => write!(f, "service error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Seed(err) => Some(err),
            AppError::Service(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<RepositoryError> for AppError {
    fn from(value: RepositoryError) -> Self {
        Self::Seed(value)
    }
}

impl From<ServiceError> for AppError {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}

/// Error raised by the directory and enrollment services.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(ResourceKind),
    #[error("you do not have permission to perform this action")]
    Forbidden,
    #[error("authentication credentials were not provided")]
    Unauthenticated,
    #[error("invalid payload: {0}")]
    Validation(FieldErrors),
    #[error("student is already enrolled in this course")]
    DuplicateEnrollment,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<FieldErrors> for ServiceError {
    fn from(value: FieldErrors) -> Self {
        Self::Validation(value)
    }
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) | ServiceError::Repository(RepositoryError::NotFound) => {
                StatusCode::NOT_FOUND
            }
            ServiceError::Forbidden => StatusCode::FORBIDDEN,
            ServiceError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ServiceError::Validation(_)
            | ServiceError::DuplicateEnrollment
            | ServiceError::Repository(RepositoryError::MissingReference { .. }) => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::Repository(RepositoryError::Conflict { .. }) => StatusCode::CONFLICT,
            ServiceError::Repository(RepositoryError::Unavailable(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ServiceError::NotFound(_) | ServiceError::Repository(RepositoryError::NotFound) => {
                json!({ "detail": "Not found." })
            }
            ServiceError::Forbidden => {
                json!({ "detail": "You do not have permission to perform this action." })
            }
            ServiceError::Unauthenticated => {
                json!({ "detail": "Authentication credentials were not provided." })
            }
            ServiceError::Validation(errors) => json!(errors),
            ServiceError::DuplicateEnrollment => {
                json!({ "non_field_errors": [DUPLICATE_ENROLLMENT] })
            }
            ServiceError::Repository(RepositoryError::MissingReference { field, kind }) => {
                json!(FieldErrors::single(field, invalid_reference(*kind)))
            }
            ServiceError::Repository(RepositoryError::Conflict { constraint }) => json!({
                "error": self.to_string(),
                "constraint": constraint,
            }),
            ServiceError::Repository(RepositoryError::Unavailable(_)) => {
                json!({ "error": self.to_string() })
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Message attached to an id field that points at a missing record.
pub fn invalid_reference(kind: ResourceKind) -> String {
    format!("Invalid {} ID.", kind.label())
}
