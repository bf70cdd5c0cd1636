//! Structured logging utilities
//!
//! Provides helpers for:
//! - Structured JSON audit events
//! - Trace ids that follow one flow across log lines

use serde_json::{json, Value};

/// Get current timestamp in milliseconds
pub fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

/// Get current Unix time in seconds
pub fn now_secs() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// Structured log event builder
///
/// Usage:
/// ```
/// use interop_transfer::logging::LogEvent;
///
/// let log_value = LogEvent::new("INTEROP_FLOW")
///     .field("trace_id", "flow_ClaimAsset_bob_1700000000000")
///     .field("views", 1)
///     .field("status", "ok")
///     .build();
///
/// log::info!("{}", log_value);
/// ```
pub struct LogEvent {
    fields: serde_json::Map<String, Value>,
}

impl LogEvent {
    /// Create a new log event with the given event name
    pub fn new(event: &str) -> Self {
        let mut fields = serde_json::Map::new();
        fields.insert("event".to_string(), json!(event));
        fields.insert("timestamp_ms".to_string(), json!(now_ms()));

        Self { fields }
    }

    /// Add a field to the log event
    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Build the final JSON value
    pub fn build(self) -> Value {
        Value::Object(self.fields)
    }
}

/// Generate trace_id for interop flows
pub fn gen_flow_trace_id(flow_type: &str, unique: &str) -> String {
    format!(
        "flow_{}_{}_{}_{}",
        flow_type,
        unique,
        now_ms(),
        uuid::Uuid::new_v4().simple()
    )
}
