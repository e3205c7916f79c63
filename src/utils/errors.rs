use anyhow::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

/// Stable machine-readable error codes returned to clients.
///
/// Internal causes stay in the server-side log (keyed by the request id from
/// the logging middleware); clients only ever see these codes plus a generic
/// message.
pub mod codes {
    pub const BAD_CREDENTIALS: &str = "BAD_CREDENTIALS";
    pub const ALREADY_LOGGED_IN: &str = "ALREADY_LOGGED_IN";
    pub const INVALID_TOKEN: &str = "INVALID_TOKEN";
    pub const VALIDATION: &str = "VALIDATION";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const INTERNAL: &str = "INTERNAL";
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub code: &'static str,
    pub error: Error,
    /// Extra fields merged into the JSON body (e.g. the 409 session
    /// diagnostics). Must never carry token material.
    pub details: Option<Value>,
}

impl AppError {
    pub fn new<E>(status: StatusCode, code: &'static str, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status,
            code,
            error: err.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, codes::INTERNAL, err)
    }

    pub fn not_found<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, err)
    }

    pub fn unprocessable<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, codes::VALIDATION, err)
    }

    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, err)
    }

    pub fn unauthorized<E>(code: &'static str, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::UNAUTHORIZED, code, err)
    }

    pub fn bad_credentials() -> Self {
        Self::unauthorized(
            codes::BAD_CREDENTIALS,
            anyhow::anyhow!("Wrong email or password"),
        )
    }

    pub fn invalid_token() -> Self {
        Self::unauthorized(
            codes::INVALID_TOKEN,
            anyhow::anyhow!("Invalid or expired token"),
        )
    }

    pub fn conflict<E>(code: &'static str, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::CONFLICT, code, err)
    }

    pub fn database<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, codes::INTERNAL, err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(code = self.code, error = %self.error, "request failed");
        }

        // 5xx bodies never expose the underlying cause string.
        let message = if self.status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.error.to_string()
        };

        let mut body = json!({
            "error": message,
            "code": self.code,
        });

        if let Some(Value::Object(details)) = self.details {
            let obj = body.as_object_mut().unwrap();
            for (key, value) in details {
                obj.insert(key, value);
            }
        }

        (self.status, Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        AppError::internal(err)
    }
}
