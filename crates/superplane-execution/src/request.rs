use chrono::{DateTime, Utc};
use serde_json::Value;

use superplane_core::{ExecutionId, NodeId, RequestId, RequestState, RequestType, WorkflowId};

/// `spec.{action-name, parameters}`.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
  pub action_name: String,
  pub parameters: Value,
}

/// A deferred call to an action on a node or on an execution. With `execution_id = None` it targets the node itself (a
/// trigger emitting an event); with it set, the specific execution.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasNodeRequest {
  pub id: RequestId,
  pub workflow_id: WorkflowId,
  pub node_id: NodeId,
  pub execution_id: Option<ExecutionId>,
  pub request_type: RequestType,
  pub spec: RequestSpec,
  pub state: RequestState,
  pub error: Option<String>,
  pub created_at: DateTime<Utc>,
  pub scheduled_at: DateTime<Utc>,
}

impl CanvasNodeRequest {
  pub fn new_invoke_action(
    workflow_id: WorkflowId,
    node_id: NodeId,
    execution_id: Option<ExecutionId>,
    action_name: impl Into<String>,
    parameters: Value,
    scheduled_at: DateTime<Utc>,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      id: RequestId::new(),
      workflow_id,
      node_id,
      execution_id,
      request_type: RequestType::InvokeAction,
      spec: RequestSpec { action_name: action_name.into(), parameters },
      state: RequestState::Pending,
      error: None,
      created_at: now,
      scheduled_at,
    }
  }

  /// A request on the node itself: no specific execution.
  pub fn targets_node(&self) -> bool {
    self.execution_id.is_none()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn node_scoped_request_has_no_execution_id() {
    let req = CanvasNodeRequest::new_invoke_action(
      WorkflowId::new(),
      NodeId::new("t"),
      None,
      "emitEvent",
      Value::Null,
      Utc::now(),
      Utc::now(),
    );
    assert!(req.targets_node());
    assert_eq!(req.state, RequestState::Pending);
  }
}
