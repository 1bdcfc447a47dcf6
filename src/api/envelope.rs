//! Backend response envelope
//!
//! The backend answers every call with a JSON object tagged by `status`:
//! ```json
//! { "status": "success", "data": [...], "logs": [{ "message": "..." }] }
//! { "status": "error", "message": "Stok tidak cukup" }
//! ```
//! Older endpoints signal failure with `"success": false` instead.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Message used when the backend reports an error without one
pub const DEFAULT_ERROR_MESSAGE: &str = "Terjadi kesalahan pada server.";

/// A diagnostic entry attached to a response by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// The domain payload of a successful response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessPayload {
    /// The `data` field; `Null` when the backend sent none
    #[serde(default)]
    pub data: Value,
    /// Diagnostic entries sent alongside the payload
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<LogEntry>,
    /// Any other top-level fields (e.g. `user` on login)
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl SuccessPayload {
    /// Looks up a top-level envelope field, `data` included
    pub fn field(&self, name: &str) -> Option<&Value> {
        if name == "data" {
            return Some(&self.data);
        }
        self.extra.get(name)
    }

    /// The `data` field as a list; anything other than an array is empty
    pub fn data_list(&self) -> &[Value] {
        self.data.as_array().map(Vec::as_slice).unwrap_or_default()
    }

    /// Deserializes the `data` field into a domain type
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.data)
    }
}

/// A parsed response envelope
#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePayload {
    Success(SuccessPayload),
    Error { message: String, logs: Vec<LogEntry> },
}

/// Errors that make a response body unusable
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// Body is not a JSON object of the expected shape
    #[error("Failed to parse response body: {0}")]
    Json(#[from] serde_json::Error),

    /// Neither a known `status` tag nor a `success` flag was present
    #[error("Unrecognized response status: {}", .0.as_deref().unwrap_or("<missing>"))]
    UnknownStatus(Option<String>),
}

#[derive(Deserialize)]
struct RawEnvelope {
    status: Option<String>,
    success: Option<bool>,
    #[serde(default)]
    data: Value,
    message: Option<Value>,
    logs: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Keeps the well-formed diagnostic entries and drops the rest
fn lenient_logs(logs: Option<Value>) -> Vec<LogEntry> {
    let Some(Value::Array(entries)) = logs else {
        return Vec::new();
    };
    entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect()
}

impl ResponsePayload {
    /// Parses a response body
    pub fn parse(body: &str) -> Result<Self, EnvelopeError> {
        let raw: RawEnvelope = serde_json::from_str(body)?;
        let logs = lenient_logs(raw.logs);

        let is_error = raw.status.as_deref() == Some("error") || raw.success == Some(false);
        if is_error {
            let message = raw
                .message
                .as_ref()
                .and_then(Value::as_str)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(DEFAULT_ERROR_MESSAGE)
                .to_string();
            return Ok(ResponsePayload::Error { message, logs });
        }

        match (raw.status.as_deref(), raw.success) {
            (Some("success"), _) | (None, Some(true)) => {
                let mut extra = raw.extra;
                if let Some(message) = raw.message {
                    extra.insert("message".to_string(), message);
                }
                Ok(ResponsePayload::Success(SuccessPayload {
                    data: raw.data,
                    logs,
                    extra,
                }))
            }
            _ => Err(EnvelopeError::UnknownStatus(raw.status)),
        }
    }

    /// Diagnostic entries carried by either variant
    pub fn logs(&self) -> &[LogEntry] {
        match self {
            ResponsePayload::Success(payload) => &payload.logs,
            ResponsePayload::Error { logs, .. } => logs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_success_with_data_and_logs() {
        let body = r#"{
            "status": "success",
            "data": [{"id": "BRG-001", "nama": "Beras"}],
            "logs": [{"message": "read sheet", "data": {"rows": 1}}, {"message": "done"}]
        }"#;

        let payload = match ResponsePayload::parse(body).expect("Should parse") {
            ResponsePayload::Success(payload) => payload,
            other => panic!("Expected success, got {:?}", other),
        };

        assert_eq!(payload.data_list().len(), 1);
        assert_eq!(payload.data[0]["nama"], "Beras");
        assert_eq!(payload.logs.len(), 2);
        assert_eq!(payload.logs[0].data, Some(json!({"rows": 1})));
        assert!(payload.logs[1].data.is_none());
        assert!(payload.extra.is_empty());
    }

    #[test]
    fn test_parse_success_keeps_extra_fields() {
        let body =
            r#"{"status": "success", "user": {"email": "admin@gudang.id", "role": "admin"}}"#;

        let ResponsePayload::Success(payload) = ResponsePayload::parse(body).unwrap() else {
            panic!("Expected success");
        };

        assert_eq!(payload.data, Value::Null);
        assert!(payload.data_list().is_empty());
        assert_eq!(payload.field("user").unwrap()["role"], "admin");
        assert_eq!(payload.field("data"), Some(&Value::Null));
    }

    #[test]
    fn test_parse_error_with_message() {
        let body = r#"{"status": "error", "message": "Stok tidak cukup"}"#;

        let parsed = ResponsePayload::parse(body).unwrap();

        assert_eq!(
            parsed,
            ResponsePayload::Error {
                message: "Stok tidak cukup".to_string(),
                logs: Vec::new(),
            }
        );
    }

    #[test]
    fn test_parse_error_without_message_uses_default() {
        let parsed = ResponsePayload::parse(r#"{"status": "error"}"#).unwrap();
        match parsed {
            ResponsePayload::Error { message, .. } => {
                assert_eq!(message, DEFAULT_ERROR_MESSAGE)
            }
            other => panic!("Expected error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_legacy_success_false_is_error() {
        let body = r#"{"success": false, "message": "Email sudah terdaftar"}"#;
        let parsed = ResponsePayload::parse(body).unwrap();
        match parsed {
            ResponsePayload::Error { message, .. } => {
                assert_eq!(message, "Email sudah terdaftar")
            }
            other => panic!("Expected error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_error_keeps_logs() {
        let body =
            r#"{"status": "error", "message": "x", "logs": [{"message": "validation failed"}]}"#;
        let parsed = ResponsePayload::parse(body).unwrap();
        assert_eq!(parsed.logs().len(), 1);
        assert_eq!(parsed.logs()[0].message, "validation failed");
    }

    #[test]
    fn test_parse_null_logs_is_empty() {
        let body = r#"{"status": "success", "data": 1, "logs": null}"#;
        let parsed = ResponsePayload::parse(body).unwrap();
        assert!(parsed.logs().is_empty());
    }

    #[test]
    fn test_parse_drops_log_entries_without_message() {
        let body = r#"{
            "status": "success",
            "data": [1],
            "logs": [{"msg": "x"}, "plain text", {"message": "kept"}, {"message": 7}]
        }"#;

        let parsed = ResponsePayload::parse(body).expect("Stray log lines must not fail parsing");

        assert!(matches!(parsed, ResponsePayload::Success(_)));
        assert_eq!(parsed.logs().len(), 1);
        assert_eq!(parsed.logs()[0].message, "kept");
    }

    #[test]
    fn test_parse_tolerates_non_array_logs_and_message() {
        let body = r#"{"status": "success", "data": [], "logs": "none", "message": 3}"#;
        let ResponsePayload::Success(payload) = ResponsePayload::parse(body).unwrap() else {
            panic!("Expected success");
        };
        assert!(payload.logs.is_empty());
        assert_eq!(payload.field("message"), Some(&json!(3)));

        let body = r#"{"status": "error", "message": {"code": 1}}"#;
        match ResponsePayload::parse(body).unwrap() {
            ResponsePayload::Error { message, .. } => {
                assert_eq!(message, DEFAULT_ERROR_MESSAGE)
            }
            other => panic!("Expected error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_unknown_status_fails() {
        let result = ResponsePayload::parse(r#"{"status": "pending"}"#);
        assert!(matches!(
            result,
            Err(EnvelopeError::UnknownStatus(Some(ref s))) if s == "pending"
        ));

        let result = ResponsePayload::parse(r#"{"data": []}"#);
        assert!(matches!(result, Err(EnvelopeError::UnknownStatus(None))));
    }

    #[test]
    fn test_parse_invalid_json_fails() {
        let result = ResponsePayload::parse("<html>Service unavailable</html>");
        assert!(matches!(result, Err(EnvelopeError::Json(_))));
    }

    #[test]
    fn test_data_as_typed() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Vendor {
            nama: String,
        }

        let payload = SuccessPayload {
            data: json!([{"nama": "PT Maju"}, {"nama": "CV Jaya"}]),
            logs: Vec::new(),
            extra: Map::new(),
        };

        let vendors: Vec<Vendor> = payload.data_as().unwrap();
        assert_eq!(vendors.len(), 2);
        assert_eq!(vendors[1].nama, "CV Jaya");
    }

    #[test]
    fn test_success_payload_survives_cache_encoding() {
        let body = r#"{
            "status": "success",
            "data": {"total": 3},
            "user": "x",
            "logs": [{"message": "m"}]
        }"#;
        let ResponsePayload::Success(payload) = ResponsePayload::parse(body).unwrap() else {
            panic!("Expected success");
        };

        let encoded = serde_json::to_string(&payload).unwrap();
        let decoded: SuccessPayload = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, payload);
    }
}
