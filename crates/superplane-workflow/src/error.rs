use thiserror::Error;

use superplane_core::NodeId;

#[derive(Debug, Error)]
pub enum ResolveError {
  #[error("edge references unknown node: from={from}, to={to}")]
  InvalidEdge { from: NodeId, to: NodeId },

  #[error("duplicate node id: {0}")]
  DuplicateNodeId(NodeId),

  #[error("cycle detected in canvas graph")]
  CycleDetected,

  #[error("blueprint output channel references unknown internal node: {0}")]
  InvalidBlueprintOutput(NodeId),

  #[error("node not found: {0}")]
  NodeNotFound(NodeId),
}
