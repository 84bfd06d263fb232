//! The Component & Trigger contract, the per-invocation
//! capability contexts components see, and the in-process registry that
//! maps a `ref.component.name`/`ref.trigger.name` to its implementation.
//!
//! Nothing here talks to a database directly — the context traits are
//! narrow capability bundles that `superplane-engine` implements against
//! a live transaction, and that tests implement against an in-memory
//! double.

mod context;
mod contract;
mod error;
mod registry;

pub use context::{
  ActionContext, ExecutionMetadataContext, IntegrationMessageContext, NodeRequestContext,
  NotificationRequest, SecretReader, WebhookContext,
};
pub use contract::{ActionSpec, Component, ConfigurationField, Trigger};
pub use error::ComponentError;
pub use registry::{ComponentRegistry, Implementation};
