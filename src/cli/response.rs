//! Response types
//!
//! `{"status":"ok","data":...}` or
//! `{"status":"error","code":...,"message":...,"context":...}`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::errors::CliError;
use crate::finalization::FinalizeError;

/// Response to one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response {
    Ok {
        data: Value,
    },
    Error {
        code: String,
        message: String,
        context: Value,
    },
}

impl Response {
    pub fn ok(data: Value) -> Self {
        Response::Ok { data }
    }

    pub fn error(code: &str, message: impl Into<String>, context: Value) -> Self {
        Response::Error {
            code: code.to_string(),
            message: message.into(),
            context,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Response::Ok { .. })
    }

    /// Error code, if this is an error response
    pub fn code(&self) -> Option<&str> {
        match self {
            Response::Ok { .. } => None,
            Response::Error { code, .. } => Some(code),
        }
    }

    /// Convert to a JSON value
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            json!({
                "status": "error",
                "code": "QC_CLI_IO_ERROR",
                "message": format!("Response serialization failed: {}", e),
                "context": null
            })
        })
    }
}

impl From<&FinalizeError> for Response {
    fn from(err: &FinalizeError) -> Self {
        let context = match err {
            FinalizeError::NotEligible {
                quarter_id,
                findings,
            } => json!({ "quarter_id": quarter_id, "findings": findings }),
            FinalizeError::AlreadyFinalized { existing } => json!({ "existing": existing }),
            FinalizeError::DuplicateOverride {
                quarter_id,
                rule_key,
                incident_id,
            } => json!({
                "quarter_id": quarter_id,
                "rule_key": rule_key,
                "incident_id": incident_id
            }),
            FinalizeError::QuarterNotFound(quarter_id) => json!({ "quarter_id": quarter_id }),
            FinalizeError::UnknownRule(rule_key) => json!({ "rule_key": rule_key }),
            FinalizeError::DigestMismatchInternal { quarter_id, .. } => {
                json!({ "quarter_id": quarter_id })
            }
            FinalizeError::StoreUnavailable(store) => json!({ "store_code": store.code() }),
            FinalizeError::InvalidInput(_) => Value::Null,
        };
        Response::error(err.code(), err.to_string(), context)
    }
}

impl From<&CliError> for Response {
    fn from(err: &CliError) -> Self {
        Response::error(err.code(), err.to_string(), Value::Null)
    }
}
