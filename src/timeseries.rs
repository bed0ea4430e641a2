//! Data model: time series, tasks and simulation results.
//!
//! Field names follow the queue's JSON wire shape exactly
//! (`model_instance_id`, camelCase simulation parameters, points
//! nested under a `timeseries` key), so these types serialize
//! straight onto the protocol.

use serde::{Deserialize, Serialize};

/// One timestamped sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub value: f64,
}

/// A labeled, unit-annotated sequence of samples, ordered by
/// timestamp ascending. Series in the same collection are assumed
/// co-sampled; the codec relies on this without enforcing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub label: String,
    pub unit: String,
    #[serde(rename = "timeseries")]
    pub points: Vec<Point>,
}

impl TimeSeries {
    pub fn new(label: impl Into<String>, unit: impl Into<String>, points: Vec<Point>) -> Self {
        Self {
            label: label.into(),
            unit: unit.into(),
            points,
        }
    }
}

/// Absolute simulation window and output sampling interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    /// Milliseconds since the Unix epoch.
    #[serde(rename = "startTime")]
    pub start_time: i64,
    /// Milliseconds since the Unix epoch.
    #[serde(rename = "stopTime")]
    pub stop_time: i64,
    #[serde(rename = "outputInterval")]
    pub output_interval: f64,
}

impl SimulationParameters {
    /// Simulation duration in whole seconds, the engine's convention.
    pub fn relative_stop_time_secs(&self) -> i64 {
        (self.stop_time - self.start_time) / 1000
    }
}

/// One unit of simulation work as pulled from the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub model_instance_id: String,
    pub input_timeseries: Vec<TimeSeries>,
    pub simulation_parameters: SimulationParameters,
}

/// A task together with the queue-assigned claim id. Consumed by
/// exactly one processing attempt and never persisted; an abandoned
/// claim becomes redeliverable by the queue's own policy.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimedTask {
    pub id: String,
    pub task: Task,
}

/// The outcome of one successful simulation run. Transient; exists
/// only within a single processing cycle.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub raw_output_table: String,
    pub output_series: Vec<TimeSeries>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_deserializes_from_wire_shape() {
        let json = serde_json::json!({
            "model_instance_id": "abc-123",
            "input_timeseries": [{
                "label": "u",
                "unit": "K",
                "timeseries": [
                    { "timestamp": 0, "value": 1.0 },
                    { "timestamp": 1000, "value": 2.0 }
                ]
            }],
            "simulation_parameters": {
                "startTime": 0,
                "stopTime": 2000,
                "outputInterval": 1.0
            }
        });

        let task: Task = serde_json::from_value(json).unwrap();
        assert_eq!(task.model_instance_id, "abc-123");
        assert_eq!(task.input_timeseries.len(), 1);
        assert_eq!(task.input_timeseries[0].points[1].timestamp, 1000);
        assert_eq!(task.simulation_parameters.stop_time, 2000);
    }

    #[test]
    fn relative_stop_time_is_in_seconds() {
        let params = SimulationParameters {
            start_time: 5_000,
            stop_time: 125_000,
            output_interval: 0.5,
        };
        assert_eq!(params.relative_stop_time_secs(), 120);
    }

    #[test]
    fn series_serializes_points_under_timeseries_key() {
        let series = TimeSeries::new("u", "K", vec![Point { timestamp: 0, value: 1.0 }]);
        let json = serde_json::to_value(&series).unwrap();
        assert!(json.get("timeseries").is_some());
        assert!(json.get("points").is_none());
    }
}
