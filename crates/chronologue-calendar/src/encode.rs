use std::fmt;

use chrono::{DateTime, Duration, Utc};
use chronologue_config::{ChronologueConfig, DurationConfig};
use chronologue_core::{EncodeError, MemoryTrace};

use crate::duration::{Resolution, resolve};
use crate::escape::escape_text;

/// `YYYYMMDDTHHMMSSZ`, the UTC form used for every calendar datetime.
pub const ICS_DATETIME_FORMAT: &str = "%Y%m%dT%H%M%SZ";
pub const EVENT_STATUS: &str = "CONFIRMED";

/// Settings that shape derived event fields.
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderOptions {
    pub uid_domain: String,
    pub summary_max_chars: usize,
    pub durations: DurationConfig,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self::from_config(&ChronologueConfig::default())
    }
}

impl EncoderOptions {
    pub fn from_config(config: &ChronologueConfig) -> Self {
        Self {
            uid_domain: config.calendar.uid_domain.clone(),
            summary_max_chars: config.calendar.summary_max_chars,
            durations: config.duration.clone(),
        }
    }
}

/// Event fields derived from a trace, before any text escaping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFields {
    pub uid: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub summary: String,
    pub description: String,
    pub location: String,
    pub duration: Resolution,
}

/// One `BEGIN:VEVENT` … `END:VEVENT` unit. `summary`, `description` and
/// `location` are stored escaped, exactly as they appear in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBlock {
    pub uid: String,
    pub dtstamp: DateTime<Utc>,
    pub dtstart: DateTime<Utc>,
    pub dtend: DateTime<Utc>,
    pub summary: String,
    pub description: String,
    pub location: String,
}

impl EventBlock {
    pub fn lines(&self) -> Vec<String> {
        vec![
            "BEGIN:VEVENT".to_string(),
            format!("UID:{}", self.uid),
            format!("DTSTAMP:{}", format_ics_datetime(&self.dtstamp)),
            format!("DTSTART:{}", format_ics_datetime(&self.dtstart)),
            format!("DTEND:{}", format_ics_datetime(&self.dtend)),
            format!("SUMMARY:{}", self.summary),
            format!("DESCRIPTION:{}", self.description),
            format!("LOCATION:{}", self.location),
            format!("STATUS:{EVENT_STATUS}"),
            "END:VEVENT".to_string(),
        ]
    }

    /// Render with the given line separator and no leading or trailing break.
    pub fn render(&self, separator: &str) -> String {
        self.lines().join(separator)
    }
}

impl fmt::Display for EventBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render("\n"))
    }
}

/// Turns validated traces into event blocks.
#[derive(Debug, Clone, Default)]
pub struct EventEncoder {
    options: EncoderOptions,
}

impl EventEncoder {
    pub fn new(options: EncoderOptions) -> Self {
        Self { options }
    }

    pub fn from_config(config: &ChronologueConfig) -> Self {
        Self::new(EncoderOptions::from_config(config))
    }

    pub fn options(&self) -> &EncoderOptions {
        &self.options
    }

    /// Derive the unescaped event fields.
    ///
    /// Fails when `timestamp` or `content` is absent, or when the UID would
    /// span more than one line.
    pub fn derive_fields(&self, trace: &MemoryTrace) -> Result<EventFields, EncodeError> {
        let start = trace
            .start_utc()
            .ok_or(EncodeError::MissingField("timestamp"))?;
        let content = trace
            .content
            .as_deref()
            .ok_or(EncodeError::MissingField("content"))?;

        let duration = resolve(trace, self.options.durations.default_for(trace.trace_type));
        let end = start + Duration::minutes(i64::from(duration.minutes));

        let uid = match trace
            .linked_event_uid
            .as_deref()
            .filter(|uid| !uid.trim().is_empty())
        {
            Some(linked) => linked.to_string(),
            None => {
                let base = trace
                    .task_id
                    .as_deref()
                    .or(trace.id.as_deref())
                    .unwrap_or("trace");
                derive_uid(base, &start, &self.options.uid_domain)
            }
        };
        if uid.contains(['\r', '\n']) {
            return Err(EncodeError::LineBreak("uid"));
        }

        let summary = match trace.effective_title() {
            Some(title) => title.to_string(),
            None => summarize(content, self.options.summary_max_chars),
        };

        let description = match trace.chat_url.as_deref() {
            Some(url) => format!("{content}\nChat log: {url}"),
            None => content.to_string(),
        };

        Ok(EventFields {
            uid,
            start,
            end,
            summary,
            description,
            location: trace.location.clone().unwrap_or_default(),
            duration,
        })
    }

    pub fn encode(&self, trace: &MemoryTrace) -> Result<EventBlock, EncodeError> {
        self.encode_at(trace, Utc::now())
    }

    /// Encode with an explicit generation time for `DTSTAMP`.
    pub fn encode_at(
        &self,
        trace: &MemoryTrace,
        now: DateTime<Utc>,
    ) -> Result<EventBlock, EncodeError> {
        let fields = self.derive_fields(trace)?;
        Ok(EventBlock {
            uid: fields.uid,
            dtstamp: now,
            dtstart: fields.start,
            dtend: fields.end,
            summary: escape_text(&fields.summary),
            description: escape_text(&fields.description),
            location: escape_text(&fields.location),
        })
    }
}

/// Encode with default options.
pub fn encode(trace: &MemoryTrace) -> Result<EventBlock, EncodeError> {
    EventEncoder::default().encode(trace)
}

pub fn format_ics_datetime(dt: &DateTime<Utc>) -> String {
    dt.format(ICS_DATETIME_FORMAT).to_string()
}

/// `<normalized base>-<YYYYMMDD>@<domain>`.
pub fn derive_uid(base: &str, start: &DateTime<Utc>, domain: &str) -> String {
    let date = format_ics_datetime(start);
    format!("{}-{}@{domain}", normalize_uid_base(base), &date[..8])
}

/// Lower-case and collapse every run of non-ASCII-alphanumeric characters
/// into a single `_`.
pub fn normalize_uid_base(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_run = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out
}

/// First `max_chars` characters of `content`, with `...` only when cut.
pub fn summarize(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &content[..idx]),
        None => content.to_string(),
    }
}
