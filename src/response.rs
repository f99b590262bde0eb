//! Uniform response envelope for donor operations.

use crate::error::{AppError, AppResult, ErrorKind, FieldError};
use serde::{Deserialize, Serialize};

const UNEXPECTED_MESSAGE: &str = "An unexpected error occurred";

/// Failure details carried by an unsuccessful response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<FieldError>,
}

/// Success flag, human-readable message and either data or an error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }

    /// Build a failure response.
    ///
    /// With `expose_internal` off (production), unexpected errors only say
    /// that something went wrong.
    pub fn from_error(err: &AppError, expose_internal: bool) -> Self {
        let kind = err.kind();
        let message = if kind == ErrorKind::Unexpected && !expose_internal {
            UNEXPECTED_MESSAGE.to_string()
        } else {
            err.to_string()
        };
        Self {
            success: false,
            message,
            data: None,
            error: Some(ErrorBody {
                kind,
                details: err.field_errors().to_vec(),
            }),
        }
    }

    pub fn from_result(
        result: AppResult<T>,
        success_message: impl Into<String>,
        expose_internal: bool,
    ) -> Self {
        match result {
            Ok(data) => Self::ok(success_message, data),
            Err(err) => Self::from_error(&err, expose_internal),
        }
    }

    /// HTTP-equivalent status for this response
    pub fn status_code(&self) -> u16 {
        self.error
            .as_ref()
            .map_or(200, |body| body.kind.status_code())
    }
}
