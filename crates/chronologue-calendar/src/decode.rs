use std::sync::OnceLock;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use chronologue_core::TraceType;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::encode::ICS_DATETIME_FORMAT;
use crate::escape::unescape_text;

/// Best-effort view of one calendar event. Every field is optional; whether
/// the result is an acceptable trace is decided by validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PartialTrace {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_iso"
    )]
    pub start: Option<DateTime<Utc>>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_iso"
    )]
    pub end: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i64>,
}

impl PartialTrace {
    /// Start as `YYYY-MM-DDTHH:MM:SSZ`.
    pub fn start_iso(&self) -> Option<String> {
        self.start.as_ref().map(to_iso)
    }

    pub fn end_iso(&self) -> Option<String> {
        self.end.as_ref().map(to_iso)
    }

    /// Build a trace record suitable for validation.
    ///
    /// Imported events become `calendar_event` traces grouped under
    /// `task_id`; the event UID is kept both as `id` and as
    /// `linked_event_uid` so re-encoding reuses it.
    pub fn to_record(&self, task_id: &str) -> Value {
        let mut record = Map::new();
        record.insert("type".into(), json!(TraceType::CalendarEvent.as_str()));
        record.insert("task_id".into(), json!(task_id));
        if let Some(uid) = &self.id {
            record.insert("id".into(), json!(uid));
            record.insert("linked_event_uid".into(), json!(uid));
        }
        if let Some(start) = self.start_iso() {
            record.insert("timestamp".into(), json!(start));
        }
        if let Some(content) = &self.content {
            record.insert("content".into(), json!(content));
        }
        if let Some(title) = &self.title {
            record.insert("title".into(), json!(title));
        }
        if let Some(location) = &self.location {
            record.insert("location".into(), json!(location));
        }
        if let Some(minutes) = self.duration_minutes {
            record.insert("duration_minutes".into(), json!(minutes));
        }
        if let Some(email) = &self.organizer_email {
            record.insert("organizer_email".into(), json!(email));
        }
        Value::Object(record)
    }
}

/// Decode a single event's lines. Never fails; unknown lines are ignored.
///
/// Text values keep their whitespace so encoded titles round-trip exactly.
pub fn decode(event_text: &str) -> PartialTrace {
    let mut trace = PartialTrace::default();

    for line in event_text.split(['\r', '\n']) {
        if let Some(value) = line.strip_prefix("SUMMARY:") {
            trace.title = non_empty(unescape_text(value));
        } else if let Some(value) = line.strip_prefix("DESCRIPTION:") {
            trace.content = non_empty(unescape_text(value));
        } else if let Some(value) = line.strip_prefix("DTSTART:") {
            trace.start = parse_ics_datetime(value);
        } else if let Some(value) = line.strip_prefix("DTEND:") {
            trace.end = parse_ics_datetime(value);
        } else if let Some(value) = line.strip_prefix("UID:") {
            trace.id = non_empty(value.trim().to_string());
        } else if let Some(value) = line.strip_prefix("LOCATION:") {
            trace.location = non_empty(unescape_text(value));
        } else if line.starts_with("ORGANIZER;CN=") {
            trace.organizer_email = organizer_email(line);
        }
    }

    if let (Some(start), Some(end)) = (trace.start, trace.end) {
        trace.duration_minutes = Some((end - start).num_seconds().div_euclid(60));
    }

    trace
}

/// Decode every `BEGIN:VEVENT` … `END:VEVENT` pair in a document.
///
/// Markers count only as whole lines (CR, LF or CRLF terminated), so marker
/// text inside an escaped value never opens or closes an event.
pub fn decode_all(document: &str) -> Vec<PartialTrace> {
    let Some(pattern) = event_pattern() else {
        return Vec::new();
    };
    pattern
        .captures_iter(document)
        .filter_map(|caps| caps.get(1))
        .map(|body| decode(body.as_str()))
        .collect()
}

/// Parse `YYYYMMDDTHHMMSSZ`.
pub fn parse_ics_datetime(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw.trim(), ICS_DATETIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

fn to_iso(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn serialize_iso<S: serde::Serializer>(
    value: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(dt) => serializer.serialize_str(&to_iso(dt)),
        None => serializer.serialize_none(),
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

fn organizer_email(line: &str) -> Option<String> {
    let caps = organizer_pattern()?.captures(line)?;
    non_empty(caps.get(1)?.as_str().trim().to_string())
}

fn event_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?msR)^BEGIN:VEVENT$(.*?)^END:VEVENT$").ok())
        .as_ref()
}

fn organizer_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?i)mailto:(\S+)").ok())
        .as_ref()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chronologue_core::validate;

    use crate::encode::{EventEncoder, format_ics_datetime};

    const REVIEW_EVENT: &str = "
SUMMARY:Review Planning
DESCRIPTION:Weekly review of upcoming tasks
DTSTART:20250501T100000Z
DTEND:20250501T103000Z
UID:review-20250501@memory.ai
LOCATION:https://zoom.us/j/12345
ORGANIZER;CN=Memory Agent:mailto:agent@memorysystem.ai
";

    #[test]
    fn test_decode_all_known_fields() {
        let event = decode(REVIEW_EVENT);
        assert_eq!(event.title.as_deref(), Some("Review Planning"));
        assert_eq!(
            event.content.as_deref(),
            Some("Weekly review of upcoming tasks")
        );
        assert_eq!(event.start_iso().as_deref(), Some("2025-05-01T10:00:00Z"));
        assert_eq!(event.end_iso().as_deref(), Some("2025-05-01T10:30:00Z"));
        assert_eq!(event.location.as_deref(), Some("https://zoom.us/j/12345"));
        assert_eq!(event.id.as_deref(), Some("review-20250501@memory.ai"));
        assert_eq!(
            event.organizer_email.as_deref(),
            Some("agent@memorysystem.ai")
        );
        assert_eq!(event.duration_minutes, Some(30));
    }

    #[test]
    fn test_decode_empty_text() {
        assert_eq!(decode(""), PartialTrace::default());
        assert_eq!(decode("X-UNKNOWN:1\nRRULE:FREQ=WEEKLY"), PartialTrace::default());
    }

    #[test]
    fn test_malformed_datetime_is_omitted() {
        let event = decode("DTSTART:2025-05-01 10:00\nDTEND:20250501T103000Z");
        assert!(event.start.is_none());
        assert!(event.end.is_some());
        assert!(event.duration_minutes.is_none());
    }

    #[test]
    fn test_duration_is_floored() {
        let event = decode("DTSTART:20250501T100000Z\nDTEND:20250501T100159Z");
        assert_eq!(event.duration_minutes, Some(1));
        let backwards = decode("DTSTART:20250501T100000Z\nDTEND:20250501T095930Z");
        assert_eq!(backwards.duration_minutes, Some(-1));
    }

    #[test]
    fn test_dtstamp_not_mistaken_for_dtstart() {
        let event = decode("DTSTAMP:20250401T080000Z");
        assert!(event.start.is_none());
    }

    #[test]
    fn test_decode_all_multiple_events_with_cr_lines() {
        let document = "BEGIN:VCALENDAR\rVERSION:2.0\rPRODID:-//Test//EN\r\
BEGIN:VEVENT\rUID:a@x\rSUMMARY:First\rEND:VEVENT\r\
BEGIN:VEVENT\rUID:b@x\rSUMMARY:Second\rEND:VEVENT\rEND:VCALENDAR";
        let events = decode_all(document);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].title.as_deref(), Some("First"));
        assert_eq!(events[1].id.as_deref(), Some("b@x"));
    }

    #[test]
    fn test_decode_all_ignores_unterminated_event() {
        let document = "BEGIN:VEVENT\nUID:a@x\nEND:VEVENT\nBEGIN:VEVENT\nUID:b@x\n";
        let events = decode_all(document);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id.as_deref(), Some("a@x"));
    }

    #[test]
    fn test_decode_all_ignores_markers_inside_values() {
        let document = "BEGIN:VEVENT\rUID:a@x\r\
LOCATION:lab\\nEND:VEVENT\\nBEGIN:VEVENT\\nUID:forged\r\
END:VEVENT";
        let events = decode_all(document);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id.as_deref(), Some("a@x"));
        assert_eq!(
            events[0].location.as_deref(),
            Some("lab\nEND:VEVENT\nBEGIN:VEVENT\nUID:forged")
        );
    }

    #[test]
    fn test_decode_all_accepts_crlf_lines() {
        let document = "BEGIN:VEVENT\r\nUID:a@x\r\nEND:VEVENT\r\nBEGIN:VEVENT\r\nUID:b@x\r\nEND:VEVENT\r\n";
        let ids: Vec<_> = decode_all(document)
            .into_iter()
            .filter_map(|event| event.id)
            .collect();
        assert_eq!(ids, vec!["a@x", "b@x"]);
    }

    #[test]
    fn test_round_trip_preserves_event_fields() {
        let record = serde_json::json!({
            "id": "t1",
            "type": "calendar_event",
            "timestamp": "2024-04-07T09:00:00Z",
            "content": "Calibrate pipettes; log results, then file C:\\lab\\report",
            "task_id": "lab_ops",
            "location": "wetlab_sync",
            "duration_minutes": "1h30m"
        });
        let trace = validate(&record).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 4, 1, 8, 0, 0).unwrap();
        let encoder = EventEncoder::default();
        let fields = encoder.derive_fields(&trace).unwrap();
        let block = encoder.encode_at(&trace, now).unwrap();

        let decoded = decode(&block.to_string());
        assert_eq!(decoded.title.as_deref(), Some(fields.summary.as_str()));
        assert_eq!(decoded.start, Some(block.dtstart));
        assert_eq!(decoded.end, Some(block.dtend));
        assert_eq!(decoded.location.as_deref(), Some("wetlab_sync"));
        assert_eq!(decoded.id.as_deref(), Some(block.uid.as_str()));
        assert_eq!(decoded.content, trace.content);
        assert_eq!(decoded.duration_minutes, Some(90));
        assert_eq!(format_ics_datetime(&block.dtend), "20240407T103000Z");
    }

    #[test]
    fn test_round_trip_keeps_padded_title() {
        let trace = validate(&serde_json::json!({
            "id": "t7",
            "type": "calendar_event",
            "timestamp": "2024-04-07T09:00:00Z",
            "content": "  indented notes ",
            "task_id": "lab_ops",
            "title": "  Lab meeting  "
        }))
        .unwrap();
        let block = EventEncoder::default().encode(&trace).unwrap();
        let decoded = decode(&block.to_string());
        assert_eq!(decoded.title.as_deref(), Some("  Lab meeting  "));
        assert_eq!(decoded.content.as_deref(), Some("  indented notes "));
    }

    #[test]
    fn test_round_trip_location_with_line_break() {
        let trace = validate(&serde_json::json!({
            "id": "t8",
            "type": "observation",
            "timestamp": "2024-04-07T09:00:00Z",
            "content": "Calibration",
            "task_id": "lab_ops",
            "location": "Room 1\nSTATUS:CANCELLED"
        }))
        .unwrap();
        let block = EventEncoder::default().encode(&trace).unwrap();
        let decoded = decode(&block.to_string());
        assert_eq!(decoded.location.as_deref(), Some("Room 1\nSTATUS:CANCELLED"));
        assert_eq!(decoded.id.as_deref(), Some(block.uid.as_str()));
    }

    #[test]
    fn test_to_record_validates_and_reencodes_with_same_uid() {
        let event = decode(REVIEW_EVENT);
        let record = event.to_record("imported_calendar");
        let trace = validate(&record).unwrap();
        assert_eq!(trace.trace_type, Some(TraceType::CalendarEvent));
        assert_eq!(trace.title.as_deref(), Some("Review Planning"));
        assert_eq!(record["organizer_email"], "agent@memorysystem.ai");

        let block = EventEncoder::default().encode(&trace).unwrap();
        assert_eq!(block.uid, "review-20250501@memory.ai");
        assert_eq!(format_ics_datetime(&block.dtend), "20250501T103000Z");
    }

    #[test]
    fn test_to_record_without_description_fails_validation() {
        let event = decode("UID:x@y\nDTSTART:20250501T100000Z");
        let err = validate(&event.to_record("imported")).unwrap_err();
        assert_eq!(err.to_string(), "Missing required field: content");
    }

    #[test]
    fn test_serializes_iso_datetimes() {
        let event = decode(REVIEW_EVENT);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["start"], "2025-05-01T10:00:00Z");
        assert!(json.get("nonexistent").is_none());
    }
}
