use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Kind of memory trace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceType {
    Goal,
    Observation,
    Reflection,
    CalendarEvent,
}

impl TraceType {
    pub const ALL: [TraceType; 4] = [
        Self::Goal,
        Self::Observation,
        Self::Reflection,
        Self::CalendarEvent,
    ];

    /// Returns the wire name used in trace documents
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Goal => "goal",
            Self::Observation => "observation",
            Self::Reflection => "reflection",
            Self::CalendarEvent => "calendar_event",
        }
    }
}

impl std::str::FromStr for TraceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "Invalid trace type '{s}'. Valid values: goal, observation, reflection, calendar_event"
                )
            })
    }
}

impl std::fmt::Display for TraceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Completion state of the task a trace belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    Pending,
    Done,
    Scheduled,
    Canceled,
}

impl CompletionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Done => "done",
            Self::Scheduled => "scheduled",
            Self::Canceled => "canceled",
        }
    }
}

impl std::str::FromStr for CompletionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "done" => Ok(Self::Done),
            "scheduled" => Ok(Self::Scheduled),
            "canceled" => Ok(Self::Canceled),
            other => Err(format!(
                "Invalid completion status '{other}'. Valid values: pending, done, scheduled, canceled"
            )),
        }
    }
}

/// Who may see a trace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Private,
    Shared,
    Public,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Shared => "shared",
            Self::Public => "public",
        }
    }
}

impl std::str::FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(Self::Private),
            "shared" => Ok(Self::Shared),
            "public" => Ok(Self::Public),
            other => Err(format!(
                "Invalid visibility '{other}'. Valid values: private, shared, public"
            )),
        }
    }
}

/// Output format for CLI responses
#[derive(Clone, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
