//! Errors returned by roster and meet operations.
//!
//! Every failure is scoped to the request that caused it and is rendered as
//! `{"error": "<message>"}` with a status code matching its kind.

use db::codes::Gender;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use rocket::{
    http::Status,
    response::{self, Responder},
    serde::json::{json, Json},
    Request,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// A required field is missing or malformed.
    #[error("{0}")]
    Validation(String),
    /// A boolean-ish field held a value that is not a recognised boolean.
    #[error("{field} must be a boolean (true/false, yes/no, on/off, 1/0)")]
    InvalidBoolean { field: String },
    /// A foreign key does not resolve within the organization.
    #[error("{0}")]
    InvalidReference(String),
    #[error("this meet already offers that event for that gender")]
    DuplicateOffering,
    #[error("this athlete is already entered in that event")]
    DuplicateEntry,
    #[error("a {athlete} athlete cannot be entered in a {offering} event")]
    GenderMismatch { athlete: Gender, offering: Gender },
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Database(#[from] DieselError),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn invalid_reference(message: impl Into<String>) -> Self {
        ApiError::InvalidReference(message.into())
    }

    pub fn status(&self) -> Status {
        match self {
            ApiError::Validation(_)
            | ApiError::InvalidBoolean { .. }
            | ApiError::InvalidReference(_) => Status::BadRequest,
            ApiError::DuplicateOffering | ApiError::DuplicateEntry => {
                Status::Conflict
            }
            ApiError::GenderMismatch { .. } => Status::UnprocessableEntity,
            ApiError::NotFound(_) => Status::NotFound,
            ApiError::Database(_) => Status::InternalServerError,
        }
    }
}

/// Whether `error` is the store rejecting a row that breaks a uniqueness
/// constraint.
pub fn is_unique_violation(error: &DieselError) -> bool {
    matches!(
        error,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
    )
}

/// Maps a uniqueness violation to `conflict`, passing other errors through.
pub fn on_unique_violation(
    conflict: ApiError,
) -> impl FnOnce(DieselError) -> ApiError {
    move |error| {
        if is_unique_violation(&error) {
            conflict
        } else {
            ApiError::Database(error)
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        let message = match &self {
            ApiError::Database(error) => {
                tracing::error!(%error, "database error");
                "internal server error".to_string()
            }
            other => {
                tracing::debug!(%status, "{other}");
                other.to_string()
            }
        };

        (status, Json(json!({ "error": message }))).respond_to(req)
    }
}
