//! Domain models for the units of work the engine drives to completion
//!: `CanvasEvent`, `CanvasNodeExecution`, `CanvasNodeRequest`,
//! `ExecutionKV`, `IntegrationSubscription`. The state-transition functions
//! here are pure — no database, no clock reads beyond what's passed in —
//! so they can be unit tested directly and reused identically by
//! `superplane-store`'s conditional `UPDATE` statements and by
//! `superplane-engine`'s in-memory bookkeeping.

mod event;
mod execution;
mod kv;
mod request;
mod subscription;
mod transition;

pub use event::CanvasEvent;
pub use execution::CanvasNodeExecution;
pub use kv::ExecutionKv;
pub use request::{CanvasNodeRequest, RequestSpec};
pub use subscription::IntegrationSubscription;
pub use transition::{TransitionError, finish_execution, finish_request, retry_request, start_execution};
