use std::collections::HashMap;

use superplane_core::{BlueprintId, Channel, NodeId};

use crate::graph::Graph;
use crate::node::Node;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlueprintOutputChannel {
  pub internal_node_id: NodeId,
  pub internal_channel: Channel,
  pub external_channel: Channel,
}

/// A resolved, reusable sub-graph: its own nodes and edges,
/// plus the mapping from internal node output channels to the blueprint's
/// own external output channels.
#[derive(Debug, Clone)]
pub struct Blueprint {
  pub id: BlueprintId,
  pub name: String,
  pub nodes: HashMap<NodeId, Node>,
  pub edges: Vec<(NodeId, NodeId, Channel)>,
  pub output_channels: Vec<BlueprintOutputChannel>,
}

impl Blueprint {
  pub fn get_node(&self, node_id: &NodeId) -> Option<&Node> {
    self.nodes.get(node_id)
  }

  pub fn graph(&self) -> Graph {
    let node_ids: Vec<NodeId> = self.nodes.keys().cloned().collect();
    let edge_pairs: Vec<(NodeId, NodeId)> =
      self.edges.iter().map(|(from, to, _)| (from.clone(), to.clone())).collect();
    Graph::new(&node_ids, &edge_pairs)
  }

  /// The first node of the blueprint in entry-point order, instantiated as
  /// the child execution when a blueprint node starts.
  pub fn entry_node(&self) -> Option<&NodeId> {
    self.graph().entry_points().first()
  }

  /// Resolve an internal node's channel to the blueprint's external channel,
  /// if this blueprint exposes it.
  pub fn external_channel_for(&self, node_id: &NodeId, channel: &Channel) -> Option<&Channel> {
    self
      .output_channels
      .iter()
      .find(|oc| &oc.internal_node_id == node_id && &oc.internal_channel == channel)
      .map(|oc| &oc.external_channel)
  }
}
