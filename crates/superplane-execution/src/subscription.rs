use serde_json::Value;

use superplane_core::{IntegrationId, NodeId, SubscriptionId, WorkflowId};

/// `(integration-id, workflow-id, node-id, configuration)`.
/// Nodes subscribe to integration-emitted events through this row so the
/// integration never needs to know which nodes consume it.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrationSubscription {
  pub id: SubscriptionId,
  pub integration_id: IntegrationId,
  pub workflow_id: WorkflowId,
  pub node_id: NodeId,
  pub configuration: Value,
}
