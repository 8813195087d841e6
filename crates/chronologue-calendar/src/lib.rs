//! Calendar interchange for memory traces: duration resolution, event
//! encoding and decoding, per-file consolidation into one calendar, and
//! Markdown previews of decoded calendars.

pub mod batch;
pub mod consolidate;
pub mod decode;
pub mod duration;
pub mod encode;
mod escape;
pub mod import;
pub mod preview;
pub mod source;
pub mod sync;
pub mod tempo;

pub use batch::{
    FileOutcome, FileReport, consolidate_dir, consolidate_file, list_sources, output_path_for,
    plan_outputs,
};
pub use consolidate::{Consolidation, Consolidator, SkipReason, SkippedTrace, wrap_calendar};
pub use decode::{PartialTrace, decode, decode_all, parse_ics_datetime};
pub use duration::{DurationSource, MAX_DURATION_MINUTES, Resolution, resolve};
pub use encode::{EncoderOptions, EventBlock, EventEncoder, EventFields, encode};
pub use import::{ImportReport, import_calendar, import_calendar_text, import_dir, import_file};
pub use preview::{preview_table, write_preview};
pub use source::{load_source, write_source};
pub use sync::{SyncFields, sync_fields};
pub use tempo::tempo_tokens;
