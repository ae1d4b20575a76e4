//! Errors surfaced to the evaluator by host functions.
//!
//! None of these are fatal to the host process: the worst outcome is that
//! the current invocation stops early. Outbound actions already performed
//! are never rolled back.

use thiserror::Error;

/// Coarse classification of an [`ExecError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A counter, the generic call ceiling, the sleep budget or the
    /// pattern cache was exhausted.
    ResourceExceeded,
    /// The script passed something that could not be resolved or accepted.
    InvalidArgument,
    /// An outbound action failed in the transport or scheduler.
    Transport,
    /// The evaluator itself failed while rendering a program.
    Evaluation,
}

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("too many calls to {action} (max {limit} per invocation)")]
    TooManyCalls { action: String, limit: u32 },

    #[error("too many potential api calls (max {limit} per invocation)")]
    TooManyApiCalls { limit: u32 },

    #[error("can sleep for max {max} seconds combined ({slept}s slept, {requested}s requested)")]
    SleepBudgetExceeded { requested: u64, slept: u64, max: u64 },

    #[error("too many distinct patterns (max {capacity} per invocation)")]
    PatternCacheFull { capacity: usize },

    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("unknown channel")]
    UnknownChannel,

    #[error("unknown role")]
    UnknownRole,

    #[error("unknown user")]
    UnknownUser,

    #[error("no template name passed")]
    MissingProgramName,

    #[error("unknown template: {0}")]
    UnknownProgram(String),

    #[error("can't call this in a nested template")]
    NestedCallInNested,

    #[error(
        "trying to pass the entire current context data in as template args, \
         use nil and access the data normally instead"
    )]
    UnsafePayload,

    #[error("role list has {count} entries (platform limit is {max})")]
    TooManyRoles { count: usize, max: usize },

    #[error("{0}")]
    InvalidArgument(String),

    #[error("transport error: {0}")]
    Transport(#[source] anyhow::Error),

    #[error("evaluation failed: {0}")]
    Evaluation(String),
}

impl ExecError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExecError::TooManyCalls { .. }
            | ExecError::TooManyApiCalls { .. }
            | ExecError::SleepBudgetExceeded { .. }
            | ExecError::PatternCacheFull { .. } => ErrorKind::ResourceExceeded,
            ExecError::Transport(_) => ErrorKind::Transport,
            ExecError::Evaluation(_) => ErrorKind::Evaluation,
            _ => ErrorKind::InvalidArgument,
        }
    }

    /// Every sandbox error leaves the host process healthy; the script may
    /// react to it or the invocation may stop.
    pub fn is_recoverable(&self) -> bool {
        true
    }

    pub fn is_resource_exceeded(&self) -> bool {
        self.kind() == ErrorKind::ResourceExceeded
    }
}
