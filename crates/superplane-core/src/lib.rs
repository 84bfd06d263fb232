//! Identifiers and stable enum values shared across the SuperPlane
//! execution core crates.

mod enums;
mod ids;

pub use enums::{ExecutionResult, ExecutionState, NodeKind, RequestState, RequestType, ResultReason};
pub use ids::{
  BlueprintId, Channel, EventId, ExecutionId, IntegrationId, NodeId, OrganizationId, RequestId,
  SubscriptionId, WorkflowId,
};
