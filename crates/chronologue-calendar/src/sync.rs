use chrono::SecondsFormat;
use chronologue_core::{EncodeError, MemoryTrace};
use serde::{Deserialize, Serialize};

use crate::encode::EventEncoder;

/// Plain event mapping handed to a remote calendar collaborator.
///
/// Derived with the same rules as an encoded block, but unescaped and with
/// RFC 3339 UTC times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncFields {
    pub uid: String,
    pub summary: String,
    pub description: String,
    pub start: String,
    pub end: String,
    pub location: String,
}

pub fn sync_fields(encoder: &EventEncoder, trace: &MemoryTrace) -> Result<SyncFields, EncodeError> {
    let fields = encoder.derive_fields(trace)?;
    Ok(SyncFields {
        uid: fields.uid,
        summary: fields.summary,
        description: fields.description,
        start: fields.start.to_rfc3339_opts(SecondsFormat::Secs, true),
        end: fields.end.to_rfc3339_opts(SecondsFormat::Secs, true),
        location: fields.location,
    })
}
