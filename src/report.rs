//! Structured operation results
//!
//! Every front-end-facing operation runs through [`run`], which turns any
//! error into `success: false` plus a message instead of propagating it.

use serde::Serialize;
use tracing::{error, info, info_span, warn};
use uuid::Uuid;

use crate::error::ChecklistResult;

/// Outcome of one operation
#[derive(Debug, Serialize)]
pub struct OperationReport<T: Serialize> {
    pub success: bool,
    pub run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> OperationReport<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            run_id: Uuid::new_v4().to_string(),
            data: Some(data),
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            run_id: Uuid::new_v4().to_string(),
            data: None,
            message: Some(message.into()),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| {
            format!(
                "{{\"success\":false,\"run_id\":\"{}\",\"message\":\"unserializable report: {}\"}}",
                self.run_id, e
            )
        })
    }
}

/// Run `op` under a fresh run id and log how it went.
pub fn run<T, F>(operation: &str, op: F) -> OperationReport<T>
where
    T: Serialize,
    F: FnOnce() -> ChecklistResult<T>,
{
    let run_id = Uuid::new_v4().to_string();
    let span = info_span!("operation", op = operation, run_id = %run_id);
    let _guard = span.enter();

    let mut report = match op() {
        Ok(data) => {
            info!("{} succeeded", operation);
            OperationReport::ok(data)
        }
        Err(e) => {
            if e.is_rejection() {
                warn!(error = %e, "{} rejected", operation);
            } else {
                error!(error = %e, "{} failed", operation);
            }
            OperationReport::failed(e.to_string())
        }
    };
    report.run_id = run_id;
    report
}
