//! Memory trace data model, error taxonomy and the trace validation contract.

pub mod error;
pub mod trace;
pub mod types;
pub mod validate;

pub use error::{EncodeError, ValidationError};
pub use trace::{MAX_DURATION_MINUTES, MemoryTrace, format_timestamp, parse_timestamp};
pub use types::{CompletionStatus, OutputFormat, TraceType, Visibility};
pub use validate::{REQUIRED_FIELDS, TraceValidator, validate};
