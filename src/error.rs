use thiserror::Error;
use tonic::Status;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AppError> for Status {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Database(e) => Status::internal(format!("Database error: {}", e)),
            AppError::Migration(e) => Status::internal(format!("Migration error: {}", e)),
            AppError::NotFound(msg) => Status::not_found(msg),
            AppError::InvalidInput(msg) => Status::invalid_argument(msg),
            AppError::Conflict(msg) => Status::aborted(msg),
            AppError::DuplicateEmail => Status::already_exists("Email already registered"),
            AppError::InvalidCredentials => Status::unauthenticated("Invalid credentials"),
            AppError::Unauthenticated => Status::unauthenticated("Authentication required"),
            AppError::Storage(msg) => Status::internal(format!("Storage error: {}", msg)),
            AppError::Internal(msg) => Status::internal(msg),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::Code;

    #[test]
    fn test_status_mapping() {
        let status: Status = AppError::NotFound("Item not found".to_string()).into();
        assert_eq!(status.code(), Code::NotFound);
        assert_eq!(status.message(), "Item not found");

        let status: Status = AppError::DuplicateEmail.into();
        assert_eq!(status.code(), Code::AlreadyExists);

        let status: Status = AppError::InvalidCredentials.into();
        assert_eq!(status.code(), Code::Unauthenticated);
        assert_eq!(status.message(), "Invalid credentials");

        let status: Status = AppError::Conflict("Item was changed concurrently".to_string()).into();
        assert_eq!(status.code(), Code::Aborted);
    }
}
