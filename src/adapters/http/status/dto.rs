//! Request body for the ingress endpoint.

use serde::Deserialize;
use serde_json::Value;

use crate::application::handlers::PublishStatusCommand;
use crate::domain::foundation::RelayError;
use crate::domain::status::StatusMetadata;

/// Body of `POST /status/update`.
///
/// Every field is optional at this layer; presence rules are enforced by
/// the publish handler so that error precedence stays in one place.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub secret: Option<String>,
    /// Any JSON value, read with [`is_truthy`].
    #[serde(default)]
    pub clear: Option<Value>,
    /// Non-string values count as absent.
    #[serde(default)]
    pub details: Option<Value>,
    #[serde(default)]
    pub state: Option<Value>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub metadata: Option<StatusMetadata>,
}

impl UpdateStatusRequest {
    /// Parse a raw body.
    ///
    /// Anything that is not a non-empty JSON object of the expected shape is
    /// reported as `No body`.
    pub fn parse(body: &[u8]) -> Result<Self, RelayError> {
        let value: Value = serde_json::from_slice(body).map_err(|_| RelayError::InvalidBody)?;
        match &value {
            Value::Object(fields) if !fields.is_empty() => {}
            _ => return Err(RelayError::InvalidBody),
        }
        serde_json::from_value(value).map_err(|_| RelayError::InvalidBody)
    }
}

/// Truthiness of a loosely typed flag: `null`, `false`, `0`, `""`, `[]` and
/// `{}` are false, everything else is true.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

fn text(value: Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

impl From<UpdateStatusRequest> for PublishStatusCommand {
    fn from(req: UpdateStatusRequest) -> Self {
        PublishStatusCommand {
            secret: req.secret,
            clear: req.clear.as_ref().is_some_and(is_truthy),
            details: text(req.details),
            state: text(req.state),
            service: req.service,
            metadata: req.metadata,
        }
    }
}
