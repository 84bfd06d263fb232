use serde_json::Value;

use superplane_config::NodeRef;
use superplane_core::{IntegrationId, NodeId, WorkflowId};

/// A `CanvasNode` row as read back by the engine. Soft-deleted
/// rows are filtered out at query time (`deleted_at IS NULL`), so a
/// `StoredNode` the engine sees is always live.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredNode {
  pub workflow_id: WorkflowId,
  pub node_id: NodeId,
  pub node_ref: NodeRef,
  pub configuration: Value,
  pub integration_id: Option<IntegrationId>,
}
