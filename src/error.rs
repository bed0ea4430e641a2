//! Error types for the simulation worker.

use reqwest::StatusCode;

/// Configuration-related errors. Always fatal: the process refuses to
/// start the worker loop on any of these.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Task-queue client errors.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// The request never produced a usable HTTP response.
    #[error("Transport error talking to queue: {0}")]
    Transport(#[from] reqwest::Error),

    /// The queue answered with a status the protocol does not define.
    #[error("Unexpected status code from queue: {0}")]
    UnexpectedStatus(StatusCode),

    /// A 2xx response whose body is not the promised JSON document.
    #[error("Malformed queue response: {0}")]
    MalformedResponse(String),

    /// A claim body whose `id` is not a string.
    #[error("Claim response carries a non-string task id")]
    InvalidTaskId,

    /// A claim body whose `task` is missing, not an object, or does
    /// not deserialize into a task.
    #[error("Claim response carries an invalid task: {0}")]
    InvalidTask(String),
}

impl QueueError {
    /// Whether this error should stretch the next pacing delay.
    /// Malformed bodies are a per-task problem, not a queue outage.
    pub fn triggers_backoff(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::UnexpectedStatus(_))
    }
}

/// Errors turning a time-series collection into a delimited table.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("Cannot encode an empty time-series collection")]
    Empty,

    #[error("Series '{label}' has {actual} points but the first series has {expected}")]
    LengthMismatch {
        label: String,
        expected: usize,
        actual: usize,
    },
}

/// Errors turning a delimited table back into time series.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Table has a header but no data rows")]
    Empty,

    #[error("Row {row} has {actual} columns, header has {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Row {row}, column {column}: '{value}' is not a number")]
    BadNumber {
        row: usize,
        column: usize,
        value: String,
    },
}

/// Errors from staging and running one external simulation.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("Failed to load model artifact: {0}")]
    ModelLoad(#[source] std::io::Error),

    #[error("Failed to encode input table: {0}")]
    Encode(#[from] EncodeError),

    #[error("Failed to stage temporary file: {0}")]
    Staging(#[source] std::io::Error),

    #[error("Failed to launch simulation engine: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Simulation engine exited with {status}: {stderr}")]
    EngineFailed {
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("Failed to read simulation output: {0}")]
    OutputRead(#[source] std::io::Error),
}

/// Umbrella for everything that can go wrong while processing one
/// claimed task. Caught at the worker-loop boundary; never fatal.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Simulation error: {0}")]
    Simulation(#[from] SimulationError),

    #[error("Output decoding error: {0}")]
    Decode(#[from] DecodeError),
}
