//! Concrete implementations of the capability-context traits declared in
//! `superplane-component`. Which one a worker builds
//! depends on whether it still holds the row's claim for the call's whole
//! lifetime (`ClaimedExecutionContext`) or must hand a context across a
//! boundary it doesn't control the end of (`LiveExecutionContext` and the
//! types built on top of it).

mod action;
mod claimed_execution;
mod integration_message;
mod live_execution;
mod node_request;

pub use action::ActionDispatchContext;
pub use claimed_execution::ClaimedExecutionContext;
pub use integration_message::IntegrationMessageDispatchContext;
pub use live_execution::LiveExecutionContext;
pub use node_request::NodeRequestDispatchContext;
