//! Activity event schema
//!
//! ## Schemas
//!
//! | Schema | Shape | Written by |
//! |--------|-------|------------|
//! | **Current** | [`ActivityEvent`]: identity, `event_type`, open `extensions` | this crate |
//! | **Legacy** | [`LegacyActivityEvent`]: `ts`, `tool`, `ctx`, `result` | older loggers, read only |
//!
//! Both may appear in the same stream file. Readers tell them apart by shape
//! alone (see [`StreamRecord::parse_line`]); there is no version field.
//!
//! ## Extensions
//!
//! New or experimental data goes in [`ActivityEvent::extensions`], never in a
//! new top-level field. Older readers keep parsing the core schema unchanged.

use crate::error::{Error, Result};
use crate::session::SessionIdentity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Conventional `event_type` values. Any other string is equally valid.
pub mod event_type {
    /// Tool use and other back-and-forth
    pub const INTERACTION: &str = "interaction";
    pub const REALIZATION: &str = "realization";
    pub const STRUGGLE: &str = "struggle";
    pub const BREAKTHROUGH: &str = "breakthrough";
    /// Command execution and other habitual work
    pub const ROUTINE: &str = "routine";
}

/// Extension key holding the outcome tag (`success`, `failure`, ...).
pub const EXT_RESULT: &str = "result";
/// Extension key holding the duration in whole milliseconds.
pub const EXT_DURATION_MS: &str = "duration_ms";

pub const RESULT_SUCCESS: &str = "success";
pub const RESULT_FAILURE: &str = "failure";

// ============================================
// Current schema
// ============================================

/// One line of an activity stream, current schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    pub instance_id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Open tag; see [`event_type`] for conventional values
    pub event_type: String,
    /// What was being done (already sanitized)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_context: Option<String>,
    /// Set later by consolidation, never by the logger
    #[serde(default)]
    pub felt_significant: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotional_tone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, serde_json::Value>,
}

impl ActivityEvent {
    /// Build an event for `identity`, stamped now.
    ///
    /// `result` lands in `extensions.result`; a non-zero `duration` lands in
    /// `extensions.duration_ms`.
    pub fn new(
        identity: &SessionIdentity,
        event_type: &str,
        context: &str,
        result: &str,
        duration: Duration,
    ) -> Self {
        let mut extensions = BTreeMap::new();
        extensions.insert(EXT_RESULT.to_string(), serde_json::Value::from(result));
        if !duration.is_zero() {
            let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
            extensions.insert(EXT_DURATION_MS.to_string(), serde_json::Value::from(millis));
        }

        Self {
            timestamp: Utc::now(),
            session_id: identity.session_id.clone(),
            instance_id: identity.instance_id.clone(),
            user_id: identity.user_id.clone(),
            project_id: identity.project_id.clone(),
            event_type: event_type.to_string(),
            context: (!context.is_empty()).then(|| context.to_string()),
            work_context: identity.work_context.clone(),
            felt_significant: false,
            emotional_tone: None,
            notes: None,
            extensions,
        }
    }

    /// Outcome tag from `extensions.result`.
    pub fn result(&self) -> Option<&str> {
        self.extensions.get(EXT_RESULT).and_then(|v| v.as_str())
    }

    /// Duration from `extensions.duration_ms`.
    pub fn duration_ms(&self) -> Option<u64> {
        self.extensions.get(EXT_DURATION_MS).and_then(|v| v.as_u64())
    }

    /// Serialize as one JSONL line, trailing newline included.
    pub fn to_line(&self) -> Result<String> {
        let mut line = serde_json::to_string(self).map_err(Error::Serialize)?;
        line.push('\n');
        Ok(line)
    }
}

// ============================================
// Legacy schema
// ============================================

/// One line of an activity stream, historical schema. Read only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyActivityEvent {
    #[serde(rename = "ts", alias = "timestamp")]
    pub timestamp: DateTime<Utc>,
    pub tool: String,
    #[serde(rename = "ctx", alias = "context", default)]
    pub context: String,
    #[serde(default)]
    pub result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

// ============================================
// Reading either schema
// ============================================

/// A parsed stream line in whichever schema it was written.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamRecord {
    Current(ActivityEvent),
    Legacy(LegacyActivityEvent),
}

impl StreamRecord {
    /// Parse one line, choosing the schema by which keys are present.
    ///
    /// `session_id` or `event_type` means current; otherwise `tool` means
    /// legacy. Anything else is rejected.
    pub fn parse_line(line: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(line)?;
        let Some(object) = value.as_object() else {
            return Err(Error::UnrecognisedRecord("not a JSON object".to_string()));
        };

        if object.contains_key("session_id") || object.contains_key("event_type") {
            Ok(StreamRecord::Current(serde_json::from_value(value)?))
        } else if object.contains_key("tool") {
            Ok(StreamRecord::Legacy(serde_json::from_value(value)?))
        } else {
            Err(Error::UnrecognisedRecord(
                "no session_id, event_type or tool key".to_string(),
            ))
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            StreamRecord::Current(e) => e.timestamp,
            StreamRecord::Legacy(e) => e.timestamp,
        }
    }

    /// `event_type` for current records, `tool` for legacy ones.
    pub fn kind(&self) -> &str {
        match self {
            StreamRecord::Current(e) => &e.event_type,
            StreamRecord::Legacy(e) => &e.tool,
        }
    }

    pub fn context(&self) -> Option<&str> {
        match self {
            StreamRecord::Current(e) => e.context.as_deref(),
            StreamRecord::Legacy(e) => Some(e.context.as_str()).filter(|c| !c.is_empty()),
        }
    }

    pub fn result(&self) -> Option<&str> {
        match self {
            StreamRecord::Current(e) => e.result(),
            StreamRecord::Legacy(e) => Some(e.result.as_str()).filter(|r| !r.is_empty()),
        }
    }

    pub fn duration_ms(&self) -> Option<u64> {
        match self {
            StreamRecord::Current(e) => e.duration_ms(),
            StreamRecord::Legacy(e) => e.duration_ms,
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, StreamRecord::Legacy(_))
    }
}
