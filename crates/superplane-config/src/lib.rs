//! Declarative, pre-resolution workflow definitions: the JSON shapes a user
//! (or the excluded HTTP API) authors before `superplane-workflow` validates
//! and locks them into a resolved graph.

mod blueprint;
mod canvas;
mod edge;
mod node;
mod node_ref;

pub use blueprint::{BlueprintDef, BlueprintOutputChannelDef};
pub use canvas::CanvasDef;
pub use edge::EdgeDef;
pub use node::CanvasNodeDef;
pub use node_ref::NodeRef;
