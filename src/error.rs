//! Error types for the Menu Share server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::extraction::ExtractionError;
use crate::menu::ParseError;
use crate::store::StoreError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Menu not found: {0}")]
    MenuNotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Image exceeds the {max} byte upload limit")]
    PayloadTooLarge { max: usize },

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Failed to parse menu items: {0}")]
    Parse(#[from] ParseError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Error response body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_id: Option<String>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, kind: &'static str) -> Self {
        Self {
            error: error.into(),
            kind,
            details: None,
            raw_response: None,
            requested_id: None,
        }
    }

    fn with_details(
        error: impl Into<String>,
        kind: &'static str,
        details: impl Into<String>,
    ) -> Self {
        Self {
            details: Some(details.into()),
            ..Self::new(error, kind)
        }
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MenuNotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Extraction(_)
            | AppError::Parse(_)
            | AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn to_body(&self) -> ErrorResponse {
        match self {
            AppError::MenuNotFound(id) => ErrorResponse {
                requested_id: Some(id.clone()),
                ..ErrorResponse::new("Menu not found", "not_found")
            },
            AppError::BadRequest(msg) => ErrorResponse::new(msg.clone(), "bad_request"),
            AppError::PayloadTooLarge { .. } => ErrorResponse::with_details(
                "Image too large",
                "payload_too_large",
                self.to_string(),
            ),
            AppError::Extraction(e) => {
                let kind = if e.is_configuration() {
                    "configuration_error"
                } else {
                    "extraction_error"
                };
                ErrorResponse::with_details("Failed to process menu", kind, e.to_string())
            }
            AppError::Parse(e) => ErrorResponse {
                raw_response: Some(e.raw_response().to_string()),
                ..ErrorResponse::with_details(
                    "Failed to parse menu items",
                    "parse_error",
                    e.to_string(),
                )
            },
            AppError::Storage(e) => {
                let error = match e {
                    StoreError::Read { .. } => "Failed to read menus file",
                    StoreError::Corrupt { .. } => "Invalid menu data format",
                    StoreError::Write { .. } | StoreError::Serialize(_) => {
                        "Failed to save menus file"
                    }
                };
                ErrorResponse::with_details(error, "storage_error", e.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        (status, Json(self.to_body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_not_found_body() {
        let err = AppError::MenuNotFound("abc".to_string());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let body = serde_json::to_value(err.to_body()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "error": "Menu not found",
                "kind": "not_found",
                "requestedId": "abc"
            })
        );
    }

    #[test]
    fn test_parse_error_carries_raw_response() {
        let err = AppError::from(ParseError::NoJsonObject {
            raw: "no menu here".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = serde_json::to_value(err.to_body()).unwrap();
        assert_eq!(body["kind"], "parse_error");
        assert_eq!(body["rawResponse"], "no menu here");
        assert_eq!(body["details"], "No JSON object found in response");
    }

    #[test]
    fn test_missing_key_is_a_configuration_error() {
        let err = AppError::from(ExtractionError::MissingApiKey {
            provider: "anthropic",
            env_var: "ANTHROPIC_API_KEY",
        });
        let body = serde_json::to_value(err.to_body()).unwrap();
        assert_eq!(body["kind"], "configuration_error");
        assert!(body.get("rawResponse").is_none());
    }

    #[test]
    fn test_storage_error_kinds() {
        let err = AppError::from(StoreError::Corrupt {
            path: PathBuf::from("data/menu.json"),
            message: "expected an array".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = serde_json::to_value(err.to_body()).unwrap();
        assert_eq!(body["error"], "Invalid menu data format");
        assert_eq!(body["kind"], "storage_error");
    }

    #[test]
    fn test_input_errors_are_client_errors() {
        assert_eq!(
            AppError::BadRequest("No image provided".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::PayloadTooLarge { max: 5 }.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }
}
