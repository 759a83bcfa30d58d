//! Error taxonomy and the single boundary that normalizes remote failures.

use serde_json::Value;
use std::collections::BTreeMap;

/// Tag for a [`FeedError`], cheap to copy and compare
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Unauthenticated,
  Unauthorized,
  NotFound,
  Validation,
  NetworkUnreachable,
  Server,
  Protocol,
}

/// Normalized failure of a feed operation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
  /// No local session token; raised before any network call
  #[error("Login required")]
  Unauthenticated,

  /// Server answered 401 or 403
  #[error("Not authorized: {0}")]
  Unauthorized(String),

  #[error("Not found: {0}")]
  NotFound(String),

  #[error("{message}")]
  Validation {
    message: String,
    field_errors: BTreeMap<String, String>,
  },

  /// No response was received
  #[error("Network unreachable: {0}")]
  NetworkUnreachable(String),

  #[error("Server error ({status}): {message}")]
  Server { status: u16, message: String },

  /// A 2xx body that could not be understood
  #[error("Unexpected response: {0}")]
  Protocol(String),
}

impl FeedError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Unauthenticated => ErrorKind::Unauthenticated,
      Self::Unauthorized(_) => ErrorKind::Unauthorized,
      Self::NotFound(_) => ErrorKind::NotFound,
      Self::Validation { .. } => ErrorKind::Validation,
      Self::NetworkUnreachable(_) => ErrorKind::NetworkUnreachable,
      Self::Server { .. } => ErrorKind::Server,
      Self::Protocol(_) => ErrorKind::Protocol,
    }
  }

  pub fn is_not_found(&self) -> bool {
    self.kind() == ErrorKind::NotFound
  }
}

/// Turn a non-2xx status and its (possibly empty) body into a [`FeedError`].
///
/// Handles the DRF error shapes: `{"detail": ..}`, a bare list of messages,
/// `{"non_field_errors": [..]}` and per-field maps `{"field": [..]}`.
pub fn normalize_response(status: u16, body: &str) -> FeedError {
  let parsed: Option<Value> = serde_json::from_str(body).ok();

  match status {
    401 | 403 => FeedError::Unauthorized(
      parsed
        .as_ref()
        .and_then(summary_message)
        .unwrap_or_else(|| "Permission denied".to_string()),
    ),
    404 => FeedError::NotFound(
      parsed
        .as_ref()
        .and_then(summary_message)
        .unwrap_or_else(|| "Resource not found".to_string()),
    ),
    400 | 422 => validation_error(parsed.as_ref()),
    _ => FeedError::Server {
      status,
      message: parsed
        .as_ref()
        .and_then(summary_message)
        .unwrap_or_else(|| fallback_body(body)),
    },
  }
}

fn validation_error(body: Option<&Value>) -> FeedError {
  let field_errors = body.map(field_messages).unwrap_or_default();

  let message = body.and_then(summary_message).unwrap_or_else(|| {
    if field_errors.is_empty() {
      "Invalid request".to_string()
    } else {
      field_errors
        .iter()
        .map(|(field, msg)| format!("{}: {}", field, msg))
        .collect::<Vec<_>>()
        .join("; ")
    }
  });

  FeedError::Validation {
    message,
    field_errors,
  }
}

/// Single display message when the body carries one outside the field map.
fn summary_message(body: &Value) -> Option<String> {
  match body {
    Value::String(s) if !s.is_empty() => Some(s.clone()),
    Value::Array(items) => join_messages(items, ", "),
    Value::Object(map) => {
      if let Some(Value::String(detail)) = map.get("detail") {
        return Some(detail.clone());
      }
      if let Some(Value::Array(items)) = map.get("non_field_errors") {
        return join_messages(items, " ");
      }
      if let Some(Value::String(message)) = map.get("message") {
        return Some(message.clone());
      }
      None
    }
    _ => None,
  }
}

fn field_messages(body: &Value) -> BTreeMap<String, String> {
  let Value::Object(map) = body else {
    return BTreeMap::new();
  };

  map
    .iter()
    .filter(|(key, _)| !matches!(key.as_str(), "detail" | "non_field_errors" | "message"))
    .filter_map(|(key, value)| {
      let message = match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => join_messages(items, " "),
        _ => None,
      }?;
      Some((key.clone(), message))
    })
    .collect()
}

fn join_messages(items: &[Value], sep: &str) -> Option<String> {
  let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
  if parts.is_empty() {
    None
  } else {
    Some(parts.join(sep))
  }
}

fn fallback_body(body: &str) -> String {
  let trimmed = body.trim();
  if trimmed.is_empty() {
    "Request failed".to_string()
  } else {
    trimmed.chars().take(200).collect()
  }
}
