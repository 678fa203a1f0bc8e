//! # API Errors
//!
//! Every handler returns `Result<HttpResponse, ApiError>`. `ApiError` carries the
//! whole error taxonomy of the service and converts itself into the JSON error body
//! (`{message, errors?}`) with the matching status code.
//!
//! Collaborator failures (storage, object store) become a plain `500 Internal server
//! error`: the cause is logged here and never sent to the client.

use crate::object_store::ObjectStoreError;
use crate::storage::StoreError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use crm_common::responses::{ErrorBody, FieldViolation};
use log::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The input failed one or more schema constraints. All violations are reported.
    #[error("{message}")]
    Validation {
        message: &'static str,
        errors: Vec<FieldViolation>,
    },

    /// A required path parameter was blank. Carries the entity name (`Lead`, ...).
    #[error("{0} ID is required")]
    MissingParameter(&'static str),

    #[error("Invalid JSON body")]
    MalformedBody(String),

    /// An object upload broke off before the body was complete.
    #[error("Upload body could not be read")]
    IncompleteUpload(String),

    #[error("Object exceeds the {0} byte limit")]
    PayloadTooLarge(u64),

    #[error("Invalid pagination token")]
    InvalidPaginationToken,

    #[error("Authentication required")]
    Unauthenticated,

    /// Carries the full client-facing message (`Lead not found`, `Call has no recording`).
    #[error("{0}")]
    NotFound(&'static str),

    #[error("Access denied")]
    Forbidden,

    #[error("failed to encode pagination token: {0}")]
    TokenEncoding(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error(transparent)]
    ObjectStore(#[from] ObjectStoreError),
}

impl ApiError {
    pub fn invalid_input(errors: Vec<FieldViolation>) -> Self {
        Self::Validation {
            message: "Invalid input",
            errors,
        }
    }

    pub fn invalid_query(errors: Vec<FieldViolation>) -> Self {
        Self::Validation {
            message: "Invalid query parameters",
            errors,
        }
    }

    fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::TokenEncoding(_) | Self::Storage(_) | Self::ObjectStore(_)
        )
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. }
            | Self::MissingParameter(_)
            | Self::MalformedBody(_)
            | Self::IncompleteUpload(_)
            | Self::InvalidPaginationToken => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::TokenEncoding(_) | Self::Storage(_) | Self::ObjectStore(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = if self.is_internal() {
            error!("Request failed: {}", self);
            ErrorBody {
                message: "Internal server error".to_string(),
                errors: None,
            }
        } else {
            let errors = match self {
                Self::Validation { errors, .. } => Some(errors.clone()),
                Self::MalformedBody(detail) | Self::IncompleteUpload(detail) => {
                    Some(vec![FieldViolation::new("body", detail)])
                }
                _ => None,
            };
            ErrorBody {
                message: self.to_string(),
                errors,
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_of(err: ApiError) -> (StatusCode, ErrorBody) {
        let response = err.error_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn validation_errors_list_every_violation() {
        let (status, body) = body_of(ApiError::invalid_input(vec![
            FieldViolation::new("firstName", "Required"),
            FieldViolation::new("email", "Invalid email"),
        ]))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.message, "Invalid input");
        assert_eq!(body.errors.map(|e| e.len()), Some(2));
    }

    #[actix_web::test]
    async fn storage_failures_do_not_leak_details() {
        let err = ApiError::Storage(StoreError::InvalidTable("secret_table".to_string()));
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, "Internal server error");
        assert!(body.errors.is_none());
    }

    #[actix_web::test]
    async fn client_errors_use_their_own_message() {
        let (status, body) = body_of(ApiError::MissingParameter("Call")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.message, "Call ID is required");

        let (status, body) = body_of(ApiError::NotFound("Call has no recording")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.message, "Call has no recording");

        let (status, body) = body_of(ApiError::PayloadTooLarge(1024)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body.message, "Object exceeds the 1024 byte limit");
    }
}
