use std::collections::{HashMap, HashSet};

use superplane_core::NodeId;
use superplane_config::{BlueprintDef, CanvasDef, CanvasNodeDef, EdgeDef};

use crate::blueprint::{Blueprint, BlueprintOutputChannel};
use crate::canvas::Canvas;
use crate::error::ResolveError;
use crate::node::Node;

/// Validates a declarative `CanvasDef`/`BlueprintDef` and locks it into the
/// resolved graph types the engine consumes. Component/trigger/blueprint
/// *existence* is not checked here — that happens at dispatch time against
/// the live registry, because the
/// registry is a dependency of `superplane-component`/`superplane-engine`,
/// not of this structural-validation layer.
#[derive(Debug, Default, Clone, Copy)]
pub struct Resolver;

impl Resolver {
  pub fn new() -> Self {
    Self
  }

  pub fn resolve_canvas(&self, def: CanvasDef) -> Result<Canvas, ResolveError> {
    let node_ids = collect_node_ids(&def.nodes)?;
    let edge_tuples = to_edge_pairs(&def.edges, &node_ids)?;
    detect_cycle(&node_ids, &edge_tuples)?;

    let nodes = def.nodes.into_iter().map(|n| (n.node_id.clone(), to_node(n))).collect();
    let edges = def
      .edges
      .into_iter()
      .map(|e| (e.from, e.to, e.channel))
      .collect();

    Ok(Canvas {
      workflow_id: def.workflow_id,
      organization_id: def.organization_id,
      name: def.name,
      nodes,
      edges,
    })
  }

  pub fn resolve_blueprint(&self, def: BlueprintDef) -> Result<Blueprint, ResolveError> {
    let node_ids = collect_node_ids(&def.nodes)?;
    let edge_tuples = to_edge_pairs(&def.edges, &node_ids)?;
    detect_cycle(&node_ids, &edge_tuples)?;

    for oc in &def.output_channels {
      if !node_ids.contains(&oc.internal_node_id) {
        return Err(ResolveError::InvalidBlueprintOutput(oc.internal_node_id.clone()));
      }
    }

    let nodes = def.nodes.into_iter().map(|n| (n.node_id.clone(), to_node(n))).collect();
    let edges = def
      .edges
      .into_iter()
      .map(|e| (e.from, e.to, e.channel))
      .collect();
    let output_channels = def
      .output_channels
      .into_iter()
      .map(|oc| BlueprintOutputChannel {
        internal_node_id: oc.internal_node_id,
        internal_channel: oc.internal_channel,
        external_channel: oc.external_channel,
      })
      .collect();

    Ok(Blueprint { id: def.id, name: def.name, nodes, edges, output_channels })
  }
}

fn to_node(def: CanvasNodeDef) -> Node {
  Node {
    node_id: def.node_id,
    node_ref: def.node_ref,
    configuration: def.configuration,
    integration_id: def.integration_id,
  }
}

fn collect_node_ids(nodes: &[CanvasNodeDef]) -> Result<HashSet<NodeId>, ResolveError> {
  let mut ids = HashSet::new();
  for node in nodes {
    if !ids.insert(node.node_id.clone()) {
      return Err(ResolveError::DuplicateNodeId(node.node_id.clone()));
    }
  }
  Ok(ids)
}

fn to_edge_pairs(
  edges: &[EdgeDef],
  node_ids: &HashSet<NodeId>,
) -> Result<Vec<(NodeId, NodeId)>, ResolveError> {
  let mut pairs = Vec::with_capacity(edges.len());
  for edge in edges {
    if !node_ids.contains(&edge.from) {
      return Err(ResolveError::InvalidEdge { from: edge.from.clone(), to: edge.to.clone() });
    }
    if !node_ids.contains(&edge.to) {
      return Err(ResolveError::InvalidEdge { from: edge.from.clone(), to: edge.to.clone() });
    }
    pairs.push((edge.from.clone(), edge.to.clone()));
  }
  Ok(pairs)
}

/// DFS with white/gray/black coloring; a back edge to a gray node is a cycle.
fn detect_cycle(node_ids: &HashSet<NodeId>, edges: &[(NodeId, NodeId)]) -> Result<(), ResolveError> {
  let mut adjacency: HashMap<&NodeId, Vec<&NodeId>> = HashMap::new();
  for id in node_ids {
    adjacency.insert(id, Vec::new());
  }
  for (from, to) in edges {
    if let Some(neighbors) = adjacency.get_mut(from) {
      neighbors.push(to);
    }
  }

  #[derive(Clone, Copy, PartialEq)]
  enum Color {
    White,
    Gray,
    Black,
  }

  let mut color: HashMap<&NodeId, Color> = node_ids.iter().map(|id| (id, Color::White)).collect();

  fn dfs<'a>(
    node: &'a NodeId,
    adjacency: &HashMap<&'a NodeId, Vec<&'a NodeId>>,
    color: &mut HashMap<&'a NodeId, Color>,
  ) -> bool {
    color.insert(node, Color::Gray);
    if let Some(neighbors) = adjacency.get(node) {
      for &neighbor in neighbors {
        match color.get(neighbor) {
          Some(Color::Gray) => return true,
          Some(Color::White) => {
            if dfs(neighbor, adjacency, color) {
              return true;
            }
          }
          _ => {}
        }
      }
    }
    color.insert(node, Color::Black);
    false
  }

  for id in node_ids {
    if color.get(id) == Some(&Color::White) && dfs(id, &adjacency, &mut color) {
      return Err(ResolveError::CycleDetected);
    }
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use superplane_config::NodeRef;
  use superplane_core::{OrganizationId, WorkflowId};

  fn node(id: &str, node_ref: NodeRef) -> CanvasNodeDef {
    CanvasNodeDef {
      node_id: id.into(),
      node_ref,
      configuration: serde_json::Value::Null,
      integration_id: None,
    }
  }

  fn canvas_def(nodes: Vec<CanvasNodeDef>, edges: Vec<EdgeDef>) -> CanvasDef {
    CanvasDef {
      workflow_id: WorkflowId::new(),
      organization_id: OrganizationId::new(),
      name: "test".into(),
      nodes,
      edges,
    }
  }

  #[test]
  fn resolves_a_simple_canvas() {
    let def = canvas_def(
      vec![
        node("t", NodeRef::Trigger { name: "schedule".into() }),
        node("c", NodeRef::Component { name: "noop".into() }),
      ],
      vec![EdgeDef { from: "t".into(), to: "c".into(), channel: "default".into() }],
    );
    let canvas = Resolver::new().resolve_canvas(def).unwrap();
    assert_eq!(canvas.nodes.len(), 2);
    let entry: superplane_core::NodeId = "t".into();
    assert_eq!(canvas.graph().entry_points(), &[entry]);
  }

  #[test]
  fn rejects_duplicate_node_ids() {
    let def = canvas_def(
      vec![
        node("a", NodeRef::Component { name: "noop".into() }),
        node("a", NodeRef::Component { name: "noop".into() }),
      ],
      vec![],
    );
    assert!(matches!(
      Resolver::new().resolve_canvas(def),
      Err(ResolveError::DuplicateNodeId(_))
    ));
  }

  #[test]
  fn rejects_edges_to_unknown_nodes() {
    let def = canvas_def(
      vec![node("a", NodeRef::Component { name: "noop".into() })],
      vec![EdgeDef { from: "a".into(), to: "missing".into(), channel: "default".into() }],
    );
    assert!(matches!(Resolver::new().resolve_canvas(def), Err(ResolveError::InvalidEdge { .. })));
  }

  #[test]
  fn rejects_cycles() {
    let def = canvas_def(
      vec![
        node("a", NodeRef::Component { name: "noop".into() }),
        node("b", NodeRef::Component { name: "noop".into() }),
      ],
      vec![
        EdgeDef { from: "a".into(), to: "b".into(), channel: "default".into() },
        EdgeDef { from: "b".into(), to: "a".into(), channel: "default".into() },
      ],
    );
    assert!(matches!(Resolver::new().resolve_canvas(def), Err(ResolveError::CycleDetected)));
  }

  #[test]
  fn blueprint_output_channel_must_reference_a_real_node() {
    use superplane_config::BlueprintOutputChannelDef;
    let def = BlueprintDef {
      id: superplane_core::BlueprintId::new(),
      name: "b".into(),
      nodes: vec![node("n1", NodeRef::Component { name: "noop".into() })],
      edges: vec![],
      output_channels: vec![BlueprintOutputChannelDef {
        internal_node_id: "missing".into(),
        internal_channel: "default".into(),
        external_channel: "default".into(),
      }],
    };
    assert!(matches!(
      Resolver::new().resolve_blueprint(def),
      Err(ResolveError::InvalidBlueprintOutput(_))
    ));
  }
}
