use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::Request;
use thiserror::Error;

use crate::structs::ErrorBody;

/// Why a caller could not be authenticated.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("No token")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    ExpiredToken,
    #[error("Invalid login credentials")]
    BadCredentials,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Authentication(#[from] AuthFailure),

    /// The target note is missing or belongs to someone else. Callers cannot tell which.
    #[error("Note not found")]
    NotFound,

    #[error("{0}")]
    Storage(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::Authentication(_) => Status::Unauthorized,
            ApiError::Validation(_) | ApiError::NotFound | ApiError::Storage(_) => Status::BadRequest,
        }
    }

    /// Keeps the top-level message only, the chain goes to the log.
    pub fn storage(err: anyhow::Error) -> Self {
        tracing::error!("storage failure: {:#}", err);
        ApiError::Storage(err.to_string())
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        (status, Json(ErrorBody { error: self.to_string() })).respond_to(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(ApiError::Validation("x".into()).status(), Status::BadRequest);
        assert_eq!(ApiError::Storage("x".into()).status(), Status::BadRequest);
        assert_eq!(ApiError::NotFound.status(), Status::BadRequest);
        assert_eq!(
            ApiError::from(AuthFailure::MissingToken).status(),
            Status::Unauthorized
        );
    }

    #[test]
    fn missing_and_invalid_tokens_read_differently() {
        assert_eq!(ApiError::from(AuthFailure::MissingToken).to_string(), "No token");
        assert_eq!(ApiError::from(AuthFailure::InvalidToken).to_string(), "Invalid token");
        assert_eq!(ApiError::from(AuthFailure::ExpiredToken).to_string(), "Token expired");
    }

    #[test]
    fn storage_error_hides_the_chain() {
        let err = anyhow::anyhow!("disk I/O error").context("Failed writing note");
        assert_eq!(ApiError::storage(err).to_string(), "Failed writing note");
    }
}
