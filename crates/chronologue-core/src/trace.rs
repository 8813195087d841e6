use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{CompletionStatus, TraceType, Visibility};

/// Longest duration, in minutes, a single event may span.
pub const MAX_DURATION_MINUTES: u32 = 1440;

/// Naive layouts accepted in addition to RFC 3339; interpreted as UTC.
const NAIVE_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// A structured record representing a goal, observation, reflection or
/// calendar event.
///
/// Every field is optional at the type level: which fields are mandatory is
/// decided by [`crate::TraceValidator`], whose required set can be loosened.
/// Values only reach this type through validation, so enum and timestamp
/// fields are already known to be well-formed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryTrace {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub trace_type: Option<TraceType>,
    #[serde(
        default,
        with = "timestamp_serde",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    /// Preferred summary text, typically filled in by a summarization step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_event_uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_status: Option<CompletionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collaborators: Option<Vec<String>>,
    /// Raw duration as written in the source: an integer or one of the
    /// textual forms understood by the duration resolver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<Value>,
    /// Fields the data model does not name (e.g. `embedding`, `source`).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MemoryTrace {
    /// Identifier for diagnostics; `"unknown"` when the trace has none.
    pub fn display_id(&self) -> &str {
        self.id.as_deref().unwrap_or("unknown")
    }

    /// Start time normalized to UTC.
    pub fn start_utc(&self) -> Option<DateTime<Utc>> {
        self.timestamp.map(|ts| ts.with_timezone(&Utc))
    }

    /// Title if set and non-blank.
    pub fn effective_title(&self) -> Option<&str> {
        self.title.as_deref().filter(|title| !title.trim().is_empty())
    }
}

/// Parse an ISO-8601 timestamp (`Z`, `+HH:MM`, or naive meaning UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed);
    }
    NAIVE_TIMESTAMP_FORMATS.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(raw, format)
            .ok()
            .map(|naive| naive.and_utc().fixed_offset())
    })
}

/// Format a timestamp as RFC 3339 with second precision (`Z` for UTC).
pub fn format_timestamp(ts: &DateTime<FixedOffset>) -> String {
    if ts.offset().local_minus_utc() == 0 {
        ts.with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Secs, true)
    } else {
        ts.to_rfc3339_opts(SecondsFormat::Secs, false)
    }
}

mod timestamp_serde {
    use chrono::{DateTime, FixedOffset};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<FixedOffset>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_str(&super::format_timestamp(ts)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<FixedOffset>>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|raw| {
            super::parse_timestamp(&raw)
                .ok_or_else(|| D::Error::custom(format!("invalid timestamp '{raw}'")))
        })
        .transpose()
    }
}
