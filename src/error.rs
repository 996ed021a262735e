//! Error types.
//!
//! Task-level errors are recovered by substitution, aggregation errors abort
//! a run, and configuration errors are raised before any run starts.

use std::time::Duration;
use thiserror::Error;

/// Failure of a single analyst task.
#[derive(Error, Debug)]
pub enum TaskError {
    /// An external data source could not be reached or returned bad data.
    #[error("data source '{source_name}' failed: {message}")]
    Source {
        source_name: &'static str,
        message: String,
    },

    /// The language model call failed.
    #[error("model call failed: {0}")]
    Llm(#[from] LlmError),

    /// The model answered, but not with the declared structure.
    #[error("unusable response: {0}")]
    Format(String),

    /// A producer this task depends on did not deliver its context.
    #[error("required input from {producer} unavailable: {reason}")]
    Dependency {
        producer: &'static str,
        reason: String,
    },

    /// A credential the task needs is not configured.
    #[error("missing credential: environment variable {0} is not set")]
    MissingCredentials(String),

    /// The task ran past the per-task deadline.
    #[error("timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The task panicked.
    #[error("task panicked: {0}")]
    Panicked(String),
}

impl TaskError {
    /// Shorthand for a data-source failure.
    pub fn source(source_name: &'static str, message: impl Into<String>) -> Self {
        TaskError::Source {
            source_name,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for TaskError {
    fn from(e: serde_json::Error) -> Self {
        TaskError::Format(e.to_string())
    }
}

/// Errors from an OpenAI-compatible chat endpoint.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("cannot connect to {0}")]
    Connect(String),

    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to send request: {0}")]
    Transport(String),

    #[error("failed to parse response: {0}")]
    Decode(String),

    #[error("response contained no content")]
    EmptyContent,

    #[error("missing credential: environment variable {0} is not set")]
    MissingApiKey(String),
}

/// Failure of the terminal narrative synthesis step.
#[derive(Error, Debug)]
pub enum AggregationError {
    #[error("narrative synthesis failed: {0}")]
    Narrator(#[from] LlmError),

    #[error("narrative synthesis returned an unusable result: {0}")]
    Format(String),
}

/// Invalid configuration, detected at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("weight table is empty")]
    EmptyWeights,

    #[error("weights sum to {0}, expected 1.0")]
    WeightSum(f64),

    #[error("weight for '{score}' must be a finite value in [0, 1], got {weight}")]
    InvalidWeight { score: String, weight: f64 },

    #[error("score '{0}' is declared more than once")]
    DuplicateScore(String),

    #[error("score '{score}' references report '{report}', which no configured analyst produces")]
    UnknownReport { score: String, report: String },

    #[error("score '{score}' references field '{field}', which report '{report}' does not declare")]
    UnknownField {
        score: String,
        report: String,
        field: String,
    },

    #[error("unknown analyst '{0}'")]
    UnknownAnalyst(String),

    #[error("analyst '{0}' is configured more than once")]
    DuplicateAnalyst(String),

    #[error("no analysts configured")]
    NoAnalysts,

    #[error("task timeout must be at least 1 second")]
    ZeroTaskTimeout,

    #[error(
        "task timeout of {timeout}s is shorter than the {required}s '{analyst}' may spend on \
         requests; raise analysis.task_timeout_seconds or lower the endpoint timeouts"
    )]
    TaskTimeoutTooShort {
        timeout: u64,
        analyst: String,
        required: u64,
    },

    #[error("failed to read config file {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse config file {path}: {message}")]
    Parse { path: String, message: String },
}

/// Failure of a whole analysis run.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("invalid subject: {0}")]
    InvalidSubject(String),

    #[error(transparent)]
    Aggregation(#[from] AggregationError),
}
