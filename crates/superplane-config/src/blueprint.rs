use serde::{Deserialize, Serialize};

use superplane_core::{BlueprintId, Channel, NodeId};

use crate::edge::EdgeDef;
use crate::node::CanvasNodeDef;

/// Maps an internal node's output channel onto the blueprint's own external
/// output channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueprintOutputChannelDef {
  pub internal_node_id: NodeId,
  pub internal_channel: Channel,
  pub external_channel: Channel,
}

/// A reusable sub-graph: its own nodes, edges, and exposed output channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlueprintDef {
  pub id: BlueprintId,
  pub name: String,
  pub nodes: Vec<CanvasNodeDef>,
  pub edges: Vec<EdgeDef>,
  pub output_channels: Vec<BlueprintOutputChannelDef>,
}
