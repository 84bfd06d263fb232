//! The Message Bus: a topic/queue broker used purely
//! for cross-worker wake-ups and decoupled side effects. Delivery is
//! at-least-once — every consumer built on top of this (the notification
//! consumer, the execution worker's wake-up listener) must be idempotent.
//!
//! Ground truth always lives in the store; the bus is an optimisation.
//! A disconnected bus must never stop a worker from making progress
//! through its 1s poll loop.

mod error;
mod memory;
mod message;

pub use error::BusError;
pub use memory::InMemoryBus;
pub use message::{BusMessage, NotificationEmailRequested, RoutingKey};

use async_trait::async_trait;

/// The publish side of the bus, as consumed by `superplane-engine`. Workers
/// hold an `Arc<dyn Bus>` and call `publish` after committing a
/// transaction; a publish failure is logged and swallowed by the caller,
/// never propagated as a reason to fail the unit of work that triggered it.
#[async_trait]
pub trait Bus: Send + Sync {
  async fn publish(&self, message: BusMessage) -> Result<(), BusError>;
}
