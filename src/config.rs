//! Worker configuration, read from the environment once at startup.
//!
//! Immutable after construction; the worker loop and the heartbeat
//! only ever borrow it. Any invalid value is a fatal startup error.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Fixed pacing delay applied after a transport or unexpected-status
/// error on the claim path. Single-level, not exponential.
pub const CLAIM_ERROR_BACKOFF: Duration = Duration::from_millis(1000);

/// Process-wide worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Base URL of the task queue, e.g. `https://localhost:22345`.
    pub queue_origin: String,
    /// Root under which `{id}/model_instance.fmu` artifacts live.
    /// May be empty, meaning the current directory.
    pub model_base_path: PathBuf,
    /// Base pacing interval between loop iterations.
    pub wait_time: Duration,
    /// Heartbeat interval.
    pub alive_event_wait_time: Duration,
}

impl WorkerConfig {
    /// Load and validate configuration from process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load and validate configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let queue_origin = lookup("QUEUE_ORIGIN")
            .ok_or_else(|| ConfigError::MissingEnvVar("QUEUE_ORIGIN".into()))?;
        if queue_origin.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "QUEUE_ORIGIN".into(),
                message: "must be a string of length 1 or longer".into(),
            });
        }

        let model_base_path = lookup("MODEL_BASE_PATH")
            .ok_or_else(|| ConfigError::MissingEnvVar("MODEL_BASE_PATH".into()))?;

        let wait_time = parse_positive_millis(&lookup, "WAIT_TIME", 50)?;
        let alive_event_wait_time =
            parse_positive_millis(&lookup, "ALIVE_EVENT_WAIT_TIME", 3_600_000)?;

        Ok(Self {
            queue_origin,
            model_base_path: PathBuf::from(model_base_path),
            wait_time,
            alive_event_wait_time,
        })
    }
}

fn parse_positive_millis<F>(lookup: &F, key: &str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let millis = match lookup(key) {
        None => default,
        Some(raw) => raw
            .parse::<u64>()
            .ok()
            .filter(|&ms| ms > 0)
            .ok_or_else(|| ConfigError::InvalidValue {
                key: key.into(),
                message: format!("is '{raw}' but must be a positive integer"),
            })?,
    };
    Ok(Duration::from_millis(millis))
}
