//! Uniform `{success, data, message}` envelope for every backend reply.
//!
//! DESIGN
//! ======
//! The backend wraps most replies in its own envelope but not all of them,
//! and error bodies put the useful text in different fields depending on
//! which layer produced them. Everything is folded into [`ApiResponse`] here
//! so callers only ever inspect one shape.

#[cfg(test)]
#[path = "envelope_test.rs"]
mod envelope_test;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ApiError;

/// Message used for wrapped 2xx bodies that carried no envelope of their own.
pub const SUCCESS_MESSAGE: &str = "Success";

/// Generic validation text the backend emits; the specific reason lives elsewhere.
const GENERIC_VALIDATION_MESSAGE: &str = "Validation failed";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: String,
}

impl<T> ApiResponse<T> {
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), message: SUCCESS_MESSAGE.to_owned() }
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self { success: false, data: None, message: message.into() }
    }

    /// Convert the payload while keeping the success flag and message.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse { success: self.success, data: self.data.map(f), message: self.message }
    }

    /// The payload of a successful call.
    ///
    /// # Errors
    ///
    /// [`ApiError::Rejected`] with the envelope message when the call failed,
    /// [`ApiError::MissingData`] when it succeeded without a payload.
    pub fn into_result(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(ApiError::Rejected(self.message));
        }
        self.data.ok_or(ApiError::MissingData)
    }

    /// Like [`ApiResponse::into_result`] but an absent payload is `T::default()`.
    ///
    /// # Errors
    ///
    /// [`ApiError::Rejected`] when the call failed.
    pub fn into_result_or_default(self) -> Result<T, ApiError>
    where
        T: Default,
    {
        if !self.success {
            return Err(ApiError::Rejected(self.message));
        }
        Ok(self.data.unwrap_or_default())
    }

    /// Success flag only, for calls whose payload is irrelevant. Returns the message.
    ///
    /// # Errors
    ///
    /// [`ApiError::Rejected`] when the call failed.
    pub fn into_ack(self) -> Result<String, ApiError> {
        if self.success { Ok(self.message) } else { Err(ApiError::Rejected(self.message)) }
    }
}

impl ApiResponse<Value> {
    /// Decode the raw payload into `T`. A payload that does not match `T`
    /// turns the response into a failure.
    #[must_use]
    pub fn decode<T: DeserializeOwned>(self) -> ApiResponse<T> {
        let data = match self.data {
            None | Some(Value::Null) => None,
            Some(value) => match serde_json::from_value(value) {
                Ok(data) => Some(data),
                Err(e) => return ApiResponse::failure(format!("invalid response payload: {e}")),
            },
        };
        ApiResponse { success: self.success, data, message: self.message }
    }
}

/// Fold an HTTP status and (possibly empty) JSON body into an envelope.
///
/// - non-2xx: failure with the most specific message the body offers
/// - 2xx carrying `success`: taken as the backend's own envelope
/// - any other 2xx: wrapped as a success with the body as data
#[must_use]
pub fn normalize(status: u16, body: Value) -> ApiResponse<Value> {
    if !(200..300).contains(&status) {
        return ApiResponse::failure(error_message(status, &body));
    }

    if let Some(success) = body.get("success") {
        let success = success.as_bool().unwrap_or(false);
        let message = body.get("message").and_then(Value::as_str).unwrap_or_default().to_owned();
        let data = body.get("data").filter(|d| !d.is_null()).cloned();
        return ApiResponse { success, data, message };
    }

    ApiResponse::ok(body)
}

/// Pick the user-facing message out of an error body.
///
/// Order: `data` as a string, `error`, `message` (unless it is the generic
/// validation text), `data.message`, `data.error`, then `message` or a
/// status-code fallback.
#[must_use]
pub fn error_message(status: u16, body: &Value) -> String {
    let data = body.get("data");
    let field = |v: Option<&Value>, key: &str| v.and_then(|v| v.get(key)).and_then(text);

    if let Some(message) = data.and_then(Value::as_str).filter(|s| !s.is_empty()) {
        return message.to_owned();
    }
    if let Some(message) = body.get("error").and_then(text) {
        return message;
    }
    if let Some(message) = body.get("message").and_then(text) {
        if message != GENERIC_VALIDATION_MESSAGE {
            return message;
        }
    }
    if let Some(message) = field(data, "message") {
        return message;
    }
    if let Some(message) = field(data, "error") {
        return message;
    }
    body.get("message")
        .and_then(text)
        .unwrap_or_else(|| format!("API call failed with status {status}"))
}

/// Non-empty text from a JSON value; non-string scalars and objects are rendered as JSON.
fn text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
