use chrono::{DateTime, Utc};
use thiserror::Error;

use superplane_core::{ExecutionResult, ExecutionState, RequestState, ResultReason};

use crate::execution::CanvasNodeExecution;
use crate::request::CanvasNodeRequest;

/// A transition was attempted from a state that does not permit it. Every transition function in this
/// module enforces its precondition itself rather than trusting the
/// caller, so a bug upstream surfaces here instead of corrupting a row.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
  #[error("execution is not pending (current state: {0:?})")]
  ExecutionNotPending(ExecutionState),

  #[error("execution is already finished")]
  ExecutionAlreadyFinished,

  #[error("request is not pending (current state: {0:?})")]
  RequestNotPending(RequestState),
}

/// `pending → started`. The sole legal predecessor state is `Pending` — this is what
/// makes the invariant "exactly one worker recorded that transition"
/// checkable: two callers racing on the same in-memory value
/// can't both succeed.
pub fn start_execution(
  execution: &mut CanvasNodeExecution,
  now: DateTime<Utc>,
) -> Result<(), TransitionError> {
  if execution.state != ExecutionState::Pending {
    return Err(TransitionError::ExecutionNotPending(execution.state));
  }
  execution.state = ExecutionState::Started;
  execution.started_at = Some(now);
  Ok(())
}

/// `pending|started → finished`. Enforces the invariant "state=finished ⇒ result is set" by
/// construction — there is no way to call this without supplying `result`.
pub fn finish_execution(
  execution: &mut CanvasNodeExecution,
  result: ExecutionResult,
  reason: Option<ResultReason>,
  message: Option<String>,
  now: DateTime<Utc>,
) -> Result<(), TransitionError> {
  if execution.state == ExecutionState::Finished {
    return Err(TransitionError::ExecutionAlreadyFinished);
  }
  execution.state = ExecutionState::Finished;
  execution.result = Some(result);
  execution.result_reason = reason;
  execution.result_message = message;
  execution.finished_at = Some(now);
  Ok(())
}

/// `pending → completed`.
pub fn finish_request(request: &mut CanvasNodeRequest) -> Result<(), TransitionError> {
  if request.state != RequestState::Pending {
    return Err(TransitionError::RequestNotPending(request.state));
  }
  request.state = RequestState::Completed;
  Ok(())
}

/// `pending → pending` with a new `scheduled_at` (retry) or `pending →
/// failed` (terminal), for a request whose handler errored.
pub fn retry_request(
  request: &mut CanvasNodeRequest,
  error: String,
  retry_at: Option<DateTime<Utc>>,
) -> Result<(), TransitionError> {
  if request.state != RequestState::Pending {
    return Err(TransitionError::RequestNotPending(request.state));
  }
  request.error = Some(error);
  match retry_at {
    Some(at) => request.scheduled_at = at,
    None => request.state = RequestState::Failed,
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use serde_json::Value;

  use superplane_core::{EventId, NodeId, WorkflowId};

  use super::*;
  use crate::execution::CanvasNodeExecution;
  use crate::request::CanvasNodeRequest;

  fn pending_execution() -> CanvasNodeExecution {
    CanvasNodeExecution::new_pending(
      WorkflowId::new(),
      NodeId::new("c"),
      EventId::new(),
      None,
      Value::Null,
      Utc::now(),
    )
  }

  #[test]
  fn start_then_finish_happy_path() {
    let mut exec = pending_execution();
    start_execution(&mut exec, Utc::now()).unwrap();
    assert_eq!(exec.state, ExecutionState::Started);

    finish_execution(&mut exec, ExecutionResult::Passed, None, None, Utc::now()).unwrap();
    assert_eq!(exec.state, ExecutionState::Finished);
    assert_eq!(exec.result, Some(ExecutionResult::Passed));
  }

  #[test]
  fn starting_twice_is_rejected() {
    let mut exec = pending_execution();
    start_execution(&mut exec, Utc::now()).unwrap();
    let err = start_execution(&mut exec, Utc::now()).unwrap_err();
    assert_eq!(err, TransitionError::ExecutionNotPending(ExecutionState::Started));
  }

  #[test]
  fn config_build_failure_finishes_directly_from_pending() {
    let mut exec = pending_execution();
    finish_execution(
      &mut exec,
      ExecutionResult::Failed,
      Some(ResultReason::Error),
      Some("error building configuration".to_string()),
      Utc::now(),
    )
    .unwrap();
    assert_eq!(exec.state, ExecutionState::Finished);
    assert_eq!(exec.result_reason, Some(ResultReason::Error));
  }

  #[test]
  fn finishing_an_already_finished_execution_is_rejected() {
    let mut exec = pending_execution();
    finish_execution(&mut exec, ExecutionResult::Passed, None, None, Utc::now()).unwrap();
    let err = finish_execution(&mut exec, ExecutionResult::Failed, None, None, Utc::now()).unwrap_err();
    assert_eq!(err, TransitionError::ExecutionAlreadyFinished);
  }

  fn pending_request() -> CanvasNodeRequest {
    CanvasNodeRequest::new_invoke_action(
      WorkflowId::new(),
      NodeId::new("t"),
      None,
      "emitEvent",
      Value::Null,
      Utc::now(),
      Utc::now(),
    )
  }

  #[test]
  fn request_completes_from_pending() {
    let mut req = pending_request();
    finish_request(&mut req).unwrap();
    assert_eq!(req.state, RequestState::Completed);
  }

  #[test]
  fn request_retry_keeps_it_pending_with_new_schedule() {
    let mut req = pending_request();
    let retry_at = Utc::now() + chrono::Duration::seconds(30);
    retry_request(&mut req, "transient".to_string(), Some(retry_at)).unwrap();
    assert_eq!(req.state, RequestState::Pending);
    assert_eq!(req.scheduled_at, retry_at);
  }

  #[test]
  fn request_retry_without_retry_at_fails_terminally() {
    let mut req = pending_request();
    retry_request(&mut req, "action not found".to_string(), None).unwrap();
    assert_eq!(req.state, RequestState::Failed);
  }

  #[test]
  fn completed_request_is_monotone() {
    let mut req = pending_request();
    finish_request(&mut req).unwrap();
    let err = finish_request(&mut req).unwrap_err();
    assert_eq!(err, TransitionError::RequestNotPending(RequestState::Completed));
  }
}
