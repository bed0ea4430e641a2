//! Simulation invoker — stages a task's model and input table on
//! temporary storage, drives the external engine as a subprocess and
//! retrieves its raw output table.
//!
//! Temporary files are drop-guarded (`NamedTempFile`), so every exit
//! path — success, staging failure, engine failure — releases them.
//! This component never retries; a failed run is a permanent failure
//! for that task.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::process::Command;

use crate::codec::{self, EncodeOptions};
use crate::error::SimulationError;
use crate::timeseries::Task;

/// Name of the model artifact inside each model-instance directory.
pub const MODEL_ARTIFACT_FILENAME: &str = "model_instance.fmu";

const DEFAULT_ENGINE_BINARY: &str = "fmpy";

/// Seam between the worker loop and the external engine. Returns the
/// engine's raw output table; decoding stays with the caller.
#[async_trait]
pub trait SimulationRunner: Send + Sync {
    async fn simulate(&self, task: &Task) -> Result<String, SimulationError>;
}

/// Production runner invoking the FMPy CLI.
pub struct FmpyEngine {
    model_base_path: PathBuf,
    binary: String,
}

impl FmpyEngine {
    pub fn new(model_base_path: PathBuf) -> Self {
        Self {
            model_base_path,
            binary: DEFAULT_ENGINE_BINARY.to_string(),
        }
    }

    /// Override the engine binary (tests substitute a stand-in).
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    fn model_artifact_path(&self, model_instance_id: &str) -> PathBuf {
        self.model_base_path
            .join(model_instance_id)
            .join(MODEL_ARTIFACT_FILENAME)
    }
}

#[async_trait]
impl SimulationRunner for FmpyEngine {
    async fn simulate(&self, task: &Task) -> Result<String, SimulationError> {
        let params = &task.simulation_parameters;

        // Stage the model artifact as raw bytes.
        let model_file = NamedTempFile::new().map_err(SimulationError::Staging)?;
        let artifact = tokio::fs::read(self.model_artifact_path(&task.model_instance_id))
            .await
            .map_err(SimulationError::ModelLoad)?;
        tokio::fs::write(model_file.path(), &artifact)
            .await
            .map_err(SimulationError::Staging)?;

        // Stage the encoded input table.
        let input_file = NamedTempFile::new().map_err(SimulationError::Staging)?;
        let encode_opts = EncodeOptions {
            start_time_ms: Some(params.start_time),
            ..EncodeOptions::default()
        };
        let table = codec::encode(&task.input_timeseries, &encode_opts)?;
        tokio::fs::write(input_file.path(), table)
            .await
            .map_err(SimulationError::Staging)?;

        // Empty sink the engine writes its output table into.
        let output_file = NamedTempFile::new().map_err(SimulationError::Staging)?;

        let output = Command::new(&self.binary)
            .arg("simulate")
            .arg(model_file.path())
            .arg(format!("--output-file={}", output_file.path().display()))
            .arg(format!("--input-file={}", input_file.path().display()))
            .arg("--start-time=0")
            .arg(format!("--stop-time={}", params.relative_stop_time_secs()))
            .arg(format!("--output-interval={}", params.output_interval))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(SimulationError::Spawn)?;

        if !output.status.success() {
            return Err(SimulationError::EngineFailed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        tracing::debug!(
            stdout = %String::from_utf8_lossy(&output.stdout),
            stderr = %String::from_utf8_lossy(&output.stderr),
            "engine run finished"
        );

        tokio::fs::read_to_string(output_file.path())
            .await
            .map_err(SimulationError::OutputRead)
    }
}
