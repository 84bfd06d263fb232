use serde::{Deserialize, Serialize};

use superplane_core::{Channel, NodeId};

/// Directed `(source-node-id, target-node-id, channel)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDef {
  pub from: NodeId,
  pub to: NodeId,
  pub channel: Channel,
}
