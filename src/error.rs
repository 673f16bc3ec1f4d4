// src/error.rs
use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::finance::calculator::AmountOverflow;

/// One rejected input, keyed by its field path (`diesel_entries[1].location`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("{} field(s) are invalid", .0.len())]
    InvalidFields(Vec<FieldError>),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::DatabaseError(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) | AppError::InvalidFields(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<AmountOverflow> for AppError {
    fn from(err: AmountOverflow) -> Self {
        AppError::InvalidFields(vec![FieldError::new(err.field, "Amount is too large to calculate with")])
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::DatabaseError(ref e) => {
                tracing::error!(error = %e, "Database error");
                json!({ "error": "Database error occurred" })
            }
            AppError::Internal(ref msg) => {
                tracing::error!(error = %msg, "Internal error");
                json!({ "error": "An unexpected error occurred" })
            }
            AppError::InvalidFields(errors) => {
                let mut details: BTreeMap<String, Vec<String>> = BTreeMap::new();
                for e in errors {
                    details.entry(e.field).or_default().push(e.message);
                }
                json!({
                    "error": "One or more fields are invalid",
                    "details": details,
                })
            }
            AppError::NotFound(msg) | AppError::ValidationError(msg) => {
                json!({ "error": msg })
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn not_found_keeps_message() {
        let (status, body) = body_json(AppError::not_found("Trip not found")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Trip not found");
    }

    #[tokio::test]
    async fn internal_message_is_hidden() {
        let (status, body) = body_json(AppError::internal("row 7 is corrupt")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "An unexpected error occurred");
    }

    #[tokio::test]
    async fn invalid_fields_are_grouped_by_field() {
        let err = AppError::InvalidFields(vec![
            FieldError::new("closing_km", "Closing KM must be greater than or equal to Starting KM"),
            FieldError::new("rent", "Must be a positive number"),
            FieldError::new("rent", "Rent is required"),
        ]);
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["rent"].as_array().unwrap().len(), 2);
        assert_eq!(
            body["details"]["closing_km"][0],
            "Closing KM must be greater than or equal to Starting KM"
        );
    }

    #[test]
    fn overflow_becomes_a_field_error() {
        let err = AppError::from(AmountOverflow { field: "diesel_entries[0]".into() });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        match err {
            AppError::InvalidFields(fields) => {
                assert_eq!(fields[0].field, "diesel_entries[0]");
                assert_eq!(fields[0].message, "Amount is too large to calculate with");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn status_mapping() {
        assert_eq!(AppError::validation("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::from(sqlx::Error::RowNotFound).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
