use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] redb::Error),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::error::EncodeError),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] bincode::error::DecodeError),

    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Group not found")]
    GroupNotFound,

    #[error("Member not found in this group")]
    MemberNotFound,

    #[error("Not a pending member of this group")]
    NotPendingMember,

    #[error("Cannot remove the group owner")]
    OwnerRemoval,

    #[error("Only the group owner can do this")]
    NotGroupOwner,

    #[error("Only the group owner or the member themself can remove a member")]
    RemovalForbidden,

    #[error("Dish is already listed in this group")]
    DishAlreadyListed,
}

/// Machine-readable failure category carried in every error response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Permission,
    Duplicate,
    Persistence,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Permission => StatusCode::FORBIDDEN,
            ErrorKind::Duplicate => StatusCode::CONFLICT,
            ErrorKind::Persistence => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl AppError {
    /// Classify the error so callers can tell retryable store failures
    /// apart from rejected requests
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::InvalidInput(_) => ErrorKind::Validation,
            AppError::GroupNotFound
            | AppError::MemberNotFound
            | AppError::NotPendingMember => ErrorKind::NotFound,
            AppError::OwnerRemoval | AppError::NotGroupOwner | AppError::RemovalForbidden => {
                ErrorKind::Permission
            }
            AppError::DishAlreadyListed => ErrorKind::Duplicate,
            AppError::Database(_)
            | AppError::Transaction(_)
            | AppError::Table(_)
            | AppError::Storage(_)
            | AppError::Commit(_)
            | AppError::Serialization(_)
            | AppError::Deserialization(_)
            | AppError::TaskJoin(_) => ErrorKind::Persistence,
        }
    }
}

/// Implement IntoResponse to convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();

        // Store failures are logged in full but never echoed to the client
        let message = if kind == ErrorKind::Persistence {
            tracing::error!("Persistence failure: {:?}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": message,
            "kind": kind,
        }));

        (kind.status(), body).into_response()
    }
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;
