use std::fmt;

use chrono::{DateTime, Utc};
use chronologue_config::ChronologueConfig;
use chronologue_core::{EncodeError, TraceValidator, ValidationError};
use serde_json::Value;
use tracing::{debug, warn};

use crate::encode::{EventBlock, EventEncoder};

/// Line terminator inside a consolidated document.
const LINE_BREAK: &str = "\r";

/// Why a trace did not make it into the consolidated document.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    Invalid(ValidationError),
    Unencodable(EncodeError),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(err) => write!(f, "invalid trace: {err}"),
            Self::Unencodable(err) => write!(f, "cannot encode trace: {err}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedTrace {
    /// Position in the source collection.
    pub index: usize,
    pub id: Option<String>,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Consolidation {
    pub blocks: Vec<EventBlock>,
    pub skipped: Vec<SkippedTrace>,
    /// `None` when no trace survived.
    pub document: Option<String>,
}

impl Consolidation {
    pub fn encoded_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.document.is_none()
    }
}

/// Validates, encodes and wraps a collection of trace records.
#[derive(Debug, Clone)]
pub struct Consolidator {
    validator: TraceValidator,
    encoder: EventEncoder,
    prodid: String,
}

impl Default for Consolidator {
    fn default() -> Self {
        Self::from_config(&ChronologueConfig::default())
    }
}

impl Consolidator {
    pub fn new(validator: TraceValidator, encoder: EventEncoder, prodid: impl Into<String>) -> Self {
        Self {
            validator,
            encoder,
            prodid: prodid.into(),
        }
    }

    pub fn from_config(config: &ChronologueConfig) -> Self {
        Self::new(
            TraceValidator::with_required_fields(config.validation.required_fields.iter().cloned()),
            EventEncoder::from_config(config),
            config.calendar.prodid.clone(),
        )
    }

    pub fn validator(&self) -> &TraceValidator {
        &self.validator
    }

    pub fn encoder(&self) -> &EventEncoder {
        &self.encoder
    }

    pub fn consolidate(&self, traces: &[Value]) -> Consolidation {
        self.consolidate_at(traces, Utc::now())
    }

    /// Consolidate with a fixed `DTSTAMP` for every block.
    pub fn consolidate_at(&self, traces: &[Value], now: DateTime<Utc>) -> Consolidation {
        let mut blocks = Vec::with_capacity(traces.len());
        let mut skipped = Vec::new();

        for (index, record) in traces.iter().enumerate() {
            let outcome = self
                .validator
                .validate(record)
                .map_err(SkipReason::Invalid)
                .and_then(|trace| {
                    self.encoder
                        .encode_at(&trace, now)
                        .map_err(SkipReason::Unencodable)
                });

            match outcome {
                Ok(block) => blocks.push(block),
                Err(reason) => {
                    let id = record_id(record);
                    warn!(
                        index,
                        trace_id = id.as_deref().unwrap_or("unknown"),
                        %reason,
                        "skipping trace"
                    );
                    skipped.push(SkippedTrace { index, id, reason });
                }
            }
        }

        debug!(
            encoded = blocks.len(),
            skipped = skipped.len(),
            "consolidated traces"
        );
        let document = wrap_calendar(&blocks, &self.prodid);
        Consolidation {
            blocks,
            skipped,
            document,
        }
    }
}

/// Wrap event blocks in a calendar container. `None` when there are no blocks.
pub fn wrap_calendar(blocks: &[EventBlock], prodid: &str) -> Option<String> {
    if blocks.is_empty() {
        return None;
    }
    let body = blocks
        .iter()
        .map(|block| block.render(LINE_BREAK))
        .collect::<Vec<_>>()
        .join(LINE_BREAK);
    Some(format!(
        "BEGIN:VCALENDAR{LINE_BREAK}VERSION:2.0{LINE_BREAK}PRODID:-//{prodid}//EN{LINE_BREAK}{body}{LINE_BREAK}END:VCALENDAR"
    ))
}

fn record_id(record: &Value) -> Option<String> {
    record.get("id").and_then(Value::as_str).map(str::to_string)
}
