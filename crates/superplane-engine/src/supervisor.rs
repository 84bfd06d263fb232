use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use superplane_bus::InMemoryBus;
use superplane_notify::NotificationConsumer;

use crate::execution_worker::ExecutionWorker;
use crate::request_worker::RequestWorker;

/// Runs the Node Execution Worker, Node Request Worker and Notification
/// Consumer concurrently until `cancel` fires, mirroring the teacher's
/// `WorkflowRunner::start` channel/cancellation-token loop generalized
/// from one worker to the three that make up this core. Each collaborator
/// gets its own child token so one of them panicking or returning early
/// doesn't silently orphan the others: `tokio::join!` still waits for all
/// three to observe the shared cancellation.
pub struct Supervisor {
  execution_worker: ExecutionWorker,
  request_worker: RequestWorker,
  notifications: NotificationConsumer,
  bus: Arc<InMemoryBus>,
}

impl Supervisor {
  pub fn new(execution_worker: ExecutionWorker, request_worker: RequestWorker, notifications: NotificationConsumer, bus: Arc<InMemoryBus>) -> Self {
    Self { execution_worker, request_worker, notifications, bus }
  }

  /// Blocks until `cancel` is triggered.
  pub async fn run(self, cancel: CancellationToken) {
    info!("starting superplane engine supervisor");

    let notification_rx = self.bus.subscribe_notifications();

    tokio::join!(
      self.execution_worker.run(cancel.child_token()),
      self.request_worker.run(cancel.child_token()),
      self.notifications.run(notification_rx, cancel.child_token()),
    );

    info!("superplane engine supervisor stopped");
  }
}
