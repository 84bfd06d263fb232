use serde_json::Value;

use superplane_core::{IntegrationId, NodeId};
use superplane_config::NodeRef;

/// A node inside a resolved `Canvas` or `Blueprint`. Structurally identical
/// to `CanvasNodeDef` — resolution validates the graph around it, it does
/// not change the node's own shape (there is no content-addressable
/// component digest to lock in this design: components are looked up by
/// name in the in-process registry at dispatch time, not at resolve time).
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
  pub node_id: NodeId,
  pub node_ref: NodeRef,
  pub configuration: Value,
  pub integration_id: Option<IntegrationId>,
}
