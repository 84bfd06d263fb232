//! Validated canvas graphs.
//!
//! A resolved `Canvas` or `Blueprint` is a `superplane-config` definition
//! whose edges and node ids have been checked for validity and whose graph
//! structure (entry points, join points) has been pre-computed. Nothing
//! here talks to a store or a registry — see `superplane-engine` for that.

mod blueprint;
mod blueprint_registry;
mod canvas;
mod error;
mod graph;
mod node;
mod resolver;

pub use blueprint::{Blueprint, BlueprintOutputChannel};
pub use blueprint_registry::BlueprintRegistry;
pub use canvas::Canvas;
pub use error::ResolveError;
pub use graph::Graph;
pub use node::Node;
pub use resolver::Resolver;
