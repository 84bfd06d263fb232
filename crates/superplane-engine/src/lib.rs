//! SuperPlane execution core: the Node Execution Worker, Node Request
//! Worker, Integration Event Router and Notification Consumer, wired
//! together atop the persistent store and message bus.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Supervisor                          │
//! │  - owns a CancellationToken                                 │
//! │  - runs ExecutionWorker, RequestWorker and                  │
//! │    NotificationConsumer concurrently until cancelled         │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!           ┌───────────────────┼────────────────────┐
//!           ▼                   ▼                    ▼
//! ┌─────────────────┐ ┌──────────────────┐ ┌───────────────────────┐
//! │ ExecutionWorker  │ │  RequestWorker    │ │ NotificationConsumer  │
//! │ (canvas_node_    │ │ (canvas_node_     │ │ (drains the bus's     │
//! │  executions)     │ │  requests)        │ │  notification topic)  │
//! └─────────────────┘ └──────────────────┘ └───────────────────────┘
//! ```
//!
//! `Core` (see `api`) and `IntegrationRouter` are the inbound facade for
//! callers outside the poll loops: the upstream event-routing subsystem,
//! timers, and the integration HTTP/polling layer.

mod api;
mod blueprint;
mod config;
mod context;
mod error;
mod execution_worker;
mod integration;
mod integration_router;
mod request_worker;
mod secrets;
mod supervisor;

pub use api::Core;
pub use config::WorkerConfig;
pub use context::{ActionDispatchContext, ClaimedExecutionContext, IntegrationMessageDispatchContext, LiveExecutionContext, NodeRequestDispatchContext};
pub use error::EngineError;
pub use execution_worker::ExecutionWorker;
pub use integration::{IntegrationLookup, IntegrationLookupError, InMemoryIntegrationLookup};
pub use integration_router::IntegrationRouter;
pub use request_worker::RequestWorker;
pub use secrets::{InMemorySecretsBackend, OrgSecretReader, SecretsBackend, SecretsError};
pub use supervisor::Supervisor;

pub use blueprint::{child_node_id, instantiate_entry_child, propagate_child_completion, split_child_node_id, ParentCompletion};
