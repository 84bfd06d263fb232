use std::collections::HashMap;

use superplane_core::{Channel, NodeId, OrganizationId, WorkflowId};

use crate::graph::Graph;
use crate::node::Node;

/// A validated, resolved canvas: every edge references an existing node and
/// the node set contains no duplicate ids or cycles.
#[derive(Debug, Clone)]
pub struct Canvas {
  pub workflow_id: WorkflowId,
  pub organization_id: OrganizationId,
  pub name: String,
  pub nodes: HashMap<NodeId, Node>,
  pub edges: Vec<(NodeId, NodeId, Channel)>,
}

impl Canvas {
  pub fn get_node(&self, node_id: &NodeId) -> Option<&Node> {
    self.nodes.get(node_id)
  }

  pub fn graph(&self) -> Graph {
    let node_ids: Vec<NodeId> = self.nodes.keys().cloned().collect();
    let edge_pairs: Vec<(NodeId, NodeId)> =
      self.edges.iter().map(|(from, to, _)| (from.clone(), to.clone())).collect();
    Graph::new(&node_ids, &edge_pairs)
  }

  /// Edges leaving `node_id` on `channel`, in declaration order.
  pub fn edges_from(&self, node_id: &NodeId, channel: &Channel) -> Vec<&NodeId> {
    self
      .edges
      .iter()
      .filter(|(from, _, c)| from == node_id && c == channel)
      .map(|(_, to, _)| to)
      .collect()
  }
}
