use std::collections::{HashMap, HashSet};

use superplane_core::NodeId;

/// Adjacency view over a resolved node set, used to answer "what fires
/// downstream of this node's channel" without re-scanning the edge list.
#[derive(Debug, Clone)]
pub struct Graph {
  adjacency: HashMap<NodeId, Vec<NodeId>>,
  reverse_adjacency: HashMap<NodeId, Vec<NodeId>>,
  entry_points: Vec<NodeId>,
  join_points: HashSet<NodeId>,
}

impl Graph {
  pub fn new(node_ids: &[NodeId], edges: &[(NodeId, NodeId)]) -> Self {
    let mut adjacency: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    let mut reverse_adjacency: HashMap<NodeId, Vec<NodeId>> = HashMap::new();

    for id in node_ids {
      adjacency.entry(id.clone()).or_default();
      reverse_adjacency.entry(id.clone()).or_default();
    }

    for (from, to) in edges {
      adjacency.entry(from.clone()).or_default().push(to.clone());
      reverse_adjacency.entry(to.clone()).or_default().push(from.clone());
    }

    let entry_points: Vec<NodeId> = node_ids
      .iter()
      .filter(|id| reverse_adjacency.get(*id).is_none_or(|v| v.is_empty()))
      .cloned()
      .collect();

    let join_points: HashSet<NodeId> = reverse_adjacency
      .iter()
      .filter(|(_, incoming)| incoming.len() > 1)
      .map(|(id, _)| id.clone())
      .collect();

    Self { adjacency, reverse_adjacency, entry_points, join_points }
  }

  pub fn entry_points(&self) -> &[NodeId] {
    &self.entry_points
  }

  pub fn downstream(&self, node_id: &NodeId) -> &[NodeId] {
    self.adjacency.get(node_id).map(|v| v.as_slice()).unwrap_or(&[])
  }

  pub fn upstream(&self, node_id: &NodeId) -> &[NodeId] {
    self.reverse_adjacency.get(node_id).map(|v| v.as_slice()).unwrap_or(&[])
  }

  pub fn is_join_point(&self, node_id: &NodeId) -> bool {
    self.join_points.contains(node_id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn finds_entry_points_and_downstream() {
    let t: NodeId = "t".into();
    let c: NodeId = "c".into();
    let graph = Graph::new(&[t.clone(), c.clone()], &[(t.clone(), c.clone())]);
    assert_eq!(graph.entry_points(), &[t.clone()]);
    assert_eq!(graph.downstream(&t), &[c.clone()]);
    assert_eq!(graph.upstream(&c), &[t]);
  }

  #[test]
  fn detects_join_points() {
    let a: NodeId = "a".into();
    let b: NodeId = "b".into();
    let j: NodeId = "j".into();
    let graph = Graph::new(
      &[a.clone(), b.clone(), j.clone()],
      &[(a.clone(), j.clone()), (b.clone(), j.clone())],
    );
    assert!(graph.is_join_point(&j));
    assert!(!graph.is_join_point(&a));
  }
}
