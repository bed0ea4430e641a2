//! Task lifecycle client — claim and result-submission calls against
//! the HTTP task queue.
//!
//! HTTP outcomes are mapped into domain outcomes here: an empty queue
//! and an expired claim are expected results, not errors, and a 2xx
//! body that does not match the protocol shape is rejected before
//! anything downstream trusts it.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;

use crate::error::QueueError;
use crate::timeseries::{ClaimedTask, Task, TimeSeries};

/// Result-submission body. `error` and `result` are mutually
/// exclusive; both are always present on the wire, one as null.
#[derive(Debug, Clone, Serialize)]
pub struct ReportBody {
    pub error: Option<String>,
    pub result: Option<Vec<TimeSeries>>,
}

impl ReportBody {
    pub fn success(result: Vec<TimeSeries>) -> Self {
        Self {
            error: None,
            result: Some(result),
        }
    }

    pub fn failure(description: impl Into<String>) -> Self {
        Self {
            error: Some(description.into()),
            result: None,
        }
    }
}

/// How the queue received a result submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// 200 — the result was recorded.
    Accepted,
    /// 404 — the claim expired or was reassigned while we worked.
    /// Expected under redelivery; the task is simply let go.
    Expired,
}

/// Seam between the worker loop and the queue. Object-safe so tests
/// can substitute an in-memory queue.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Claim the next task, if any. `Ok(None)` means the queue is
    /// empty, which is a normal outcome.
    async fn claim(&self) -> Result<Option<ClaimedTask>, QueueError>;

    /// Submit the result (or failure description) for a claimed task.
    async fn report(&self, task_id: &str, body: &ReportBody) -> Result<ReportOutcome, QueueError>;
}

/// Production client speaking the queue's JSON protocol via reqwest.
pub struct HttpTaskQueue {
    client: reqwest::Client,
    origin: String,
}

impl HttpTaskQueue {
    pub fn new(client: reqwest::Client, origin: impl Into<String>) -> Self {
        Self {
            client,
            origin: origin.into(),
        }
    }
}

#[async_trait]
impl TaskQueue for HttpTaskQueue {
    async fn claim(&self) -> Result<Option<ClaimedTask>, QueueError> {
        let response = self
            .client
            .post(format!("{}/tasks/_pull", self.origin))
            .send()
            .await?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(None),
            StatusCode::OK => {
                let body: Value = response
                    .json()
                    .await
                    .map_err(|e| QueueError::MalformedResponse(e.to_string()))?;
                parse_claim_body(&body).map(Some)
            }
            status => Err(QueueError::UnexpectedStatus(status)),
        }
    }

    async fn report(&self, task_id: &str, body: &ReportBody) -> Result<ReportOutcome, QueueError> {
        let response = self
            .client
            .post(format!("{}/tasks/{}/result", self.origin, task_id))
            .json(body)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(ReportOutcome::Accepted),
            StatusCode::NOT_FOUND => Ok(ReportOutcome::Expired),
            status => Err(QueueError::UnexpectedStatus(status)),
        }
    }
}

/// Validate and deserialize a claim response body.
///
/// The id must be a string and the task an object before the task is
/// deserialized in full; anything else is a malformed response, kept
/// distinct from transport and status errors.
pub fn parse_claim_body(body: &Value) -> Result<ClaimedTask, QueueError> {
    let id = body
        .get("id")
        .and_then(Value::as_str)
        .ok_or(QueueError::InvalidTaskId)?
        .to_string();

    let task_value = body
        .get("task")
        .filter(|v| v.is_object())
        .ok_or_else(|| QueueError::InvalidTask("not a JSON object".into()))?;

    let task: Task = serde_json::from_value(task_value.clone())
        .map_err(|e| QueueError::InvalidTask(e.to_string()))?;

    Ok(ClaimedTask { id, task })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task_json() -> Value {
        json!({
            "model_instance_id": "m-1",
            "input_timeseries": [{
                "label": "u",
                "unit": "K",
                "timeseries": [{ "timestamp": 0, "value": 1.0 }]
            }],
            "simulation_parameters": {
                "startTime": 0,
                "stopTime": 1000,
                "outputInterval": 1.0
            }
        })
    }

    #[test]
    fn valid_claim_body_parses() {
        let body = json!({ "id": "task-1", "task": task_json() });
        let claimed = parse_claim_body(&body).unwrap();
        assert_eq!(claimed.id, "task-1");
        assert_eq!(claimed.task.model_instance_id, "m-1");
    }

    #[test]
    fn non_string_id_is_rejected() {
        let body = json!({ "id": 123, "task": task_json() });
        assert!(matches!(
            parse_claim_body(&body),
            Err(QueueError::InvalidTaskId)
        ));
    }

    #[test]
    fn non_object_task_is_rejected() {
        let body = json!({ "id": "task-1", "task": "not-an-object" });
        assert!(matches!(
            parse_claim_body(&body),
            Err(QueueError::InvalidTask(_))
        ));
    }

    #[test]
    fn task_missing_fields_is_rejected() {
        let body = json!({ "id": "task-1", "task": { "model_instance_id": "m-1" } });
        assert!(matches!(
            parse_claim_body(&body),
            Err(QueueError::InvalidTask(_))
        ));
    }

    #[test]
    fn report_bodies_carry_one_side_as_null() {
        let success = serde_json::to_value(ReportBody::success(vec![])).unwrap();
        assert!(success["error"].is_null());
        assert!(success["result"].is_array());

        let failure = serde_json::to_value(ReportBody::failure("engine exploded")).unwrap();
        assert_eq!(failure["error"], "engine exploded");
        assert!(failure["result"].is_null());
    }

    #[test]
    fn malformed_responses_do_not_trigger_backoff() {
        assert!(!QueueError::MalformedResponse("x".into()).triggers_backoff());
        assert!(!QueueError::InvalidTaskId.triggers_backoff());
        assert!(!QueueError::InvalidTask("x".into()).triggers_backoff());
        assert!(QueueError::UnexpectedStatus(StatusCode::IM_A_TEAPOT).triggers_backoff());
    }
}
