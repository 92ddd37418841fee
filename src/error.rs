use thiserror::Error;
use actix_web::{ResponseError, HttpResponse, http::StatusCode};
use actix_web::http::header::ContentType;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("No session found, please connect to a server and retry")]
    MissingSession,

    #[error("Session not found, please connect again")]
    UnknownSession,

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::Database(err.into())
    }
}

// Clients of this service read plain text, so errors are rendered as such.
impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = self.to_string();
        if status.is_server_error() {
            error!("Request failed with {}: {}", status.as_u16(), message);
        }
        HttpResponse::build(status)
            .insert_header(ContentType::plaintext())
            .body(message)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::UnknownSession => StatusCode::BAD_REQUEST,
            AppError::MissingSession => StatusCode::UNAUTHORIZED,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Could not connect to server: {0}")]
    ConnectionError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Query is not valid format: {0}")]
    InvalidQuery(String),

    #[error("Operation was not acknowledged by the server")]
    NotAcknowledged,

    #[error("{operation} affected {actual} document(s), expected {expected}")]
    UnexpectedCount {
        operation: &'static str,
        expected: u64,
        actual: u64,
    },
}

impl From<mongodb::error::Error> for DatabaseError {
    fn from(err: mongodb::error::Error) -> Self {
        DatabaseError::QueryError(err.to_string())
    }
}
