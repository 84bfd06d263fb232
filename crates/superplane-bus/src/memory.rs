use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{error, info};

use crate::error::BusError;
use crate::message::{BusMessage, NotificationEmailRequested, RoutingKey};
use crate::Bus;

const RECONNECT_BACKOFF: Duration = Duration::from_secs(5);

/// An in-process bus over `tokio::sync::broadcast` channels, standing in
/// for the real queue broker this core treats as an external collaborator.
/// Exercises the same contract real brokers give: at-least-once delivery
/// (a slow/absent subscriber just misses messages, same as a lagged
/// broadcast receiver — see `subscribe_*`), and a disconnect/reconnect
/// cycle with a 5s backoff.
pub struct InMemoryBus {
  execution: broadcast::Sender<(superplane_core::WorkflowId, superplane_core::ExecutionId, superplane_core::NodeId)>,
  notification: broadcast::Sender<NotificationEmailRequested>,
  connected: Arc<AtomicBool>,
}

impl InMemoryBus {
  pub fn new() -> Self {
    let (execution, _) = broadcast::channel(1024);
    let (notification, _) = broadcast::channel(1024);
    Self { execution, notification, connected: Arc::new(AtomicBool::new(true)) }
  }

  pub fn subscribe_execution_touched(
    &self,
  ) -> broadcast::Receiver<(superplane_core::WorkflowId, superplane_core::ExecutionId, superplane_core::NodeId)> {
    self.execution.subscribe()
  }

  pub fn subscribe_notifications(&self) -> broadcast::Receiver<NotificationEmailRequested> {
    self.notification.subscribe()
  }

  /// Simulate a broker disconnect. Publishes fail with `BusError::
  /// Disconnected` until the backoff elapses and the bus reconnects on its
  /// own, without a real network dependency to fail.
  pub fn simulate_disconnect(&self) {
    if self.connected.swap(false, Ordering::SeqCst) {
      error!("message bus disconnected, reconnecting in {:?}", RECONNECT_BACKOFF);
      let connected = self.connected.clone();
      tokio::spawn(async move {
        tokio::time::sleep(RECONNECT_BACKOFF).await;
        connected.store(true, Ordering::SeqCst);
        info!("message bus reconnected");
      });
    }
  }

  pub fn is_connected(&self) -> bool {
    self.connected.load(Ordering::SeqCst)
  }
}

impl Default for InMemoryBus {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl Bus for InMemoryBus {
  async fn publish(&self, message: BusMessage) -> Result<(), BusError> {
    if !self.is_connected() {
      return Err(BusError::Disconnected);
    }

    match message {
      BusMessage::ExecutionTouched { workflow_id, execution_id, node_id } => {
        // No subscribers is not an error — the execution worker's own 1s
        // poll loop is the ground truth; this publish is an optimisation.
        let _ = self.execution.send((workflow_id, execution_id, node_id));
        Ok(())
      }
      BusMessage::NotificationEmailRequested(payload) => {
        let _ = self.notification.send(payload);
        Ok(())
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::message::RoutingKey;

  #[tokio::test]
  async fn publish_delivers_to_a_live_subscriber() {
    let bus = InMemoryBus::new();
    let mut rx = bus.subscribe_execution_touched();

    let workflow_id = superplane_core::WorkflowId::new();
    let execution_id = superplane_core::ExecutionId::new();
    let node_id = superplane_core::NodeId::new("c");
    bus
      .publish(BusMessage::ExecutionTouched {
        workflow_id,
        execution_id,
        node_id: node_id.clone(),
      })
      .await
      .unwrap();

    let (got_workflow, got_execution, got_node) = rx.recv().await.unwrap();
    assert_eq!(got_workflow, workflow_id);
    assert_eq!(got_execution, execution_id);
    assert_eq!(got_node, node_id);
  }

  #[tokio::test]
  async fn publish_with_no_subscriber_is_not_an_error() {
    let bus = InMemoryBus::new();
    let result = bus
      .publish(BusMessage::ExecutionTouched {
        workflow_id: superplane_core::WorkflowId::new(),
        execution_id: superplane_core::ExecutionId::new(),
        node_id: superplane_core::NodeId::new("c"),
      })
      .await;
    assert!(result.is_ok());
  }

  #[tokio::test]
  async fn disconnect_fails_publish_until_reconnect() {
    let bus = InMemoryBus::new();
    bus.simulate_disconnect();
    assert!(!bus.is_connected());

    let err = bus
      .publish(BusMessage::NotificationEmailRequested(NotificationEmailRequested {
        organization_id: superplane_core::OrganizationId::new(),
        title: "t".into(),
        body: "b".into(),
        url: None,
        url_label: None,
        emails: vec![],
        groups: vec![],
        roles: vec![],
      }))
      .await
      .unwrap_err();
    assert!(matches!(err, BusError::Disconnected));
  }

  #[test]
  fn routing_keys_match_spec_strings() {
    assert_eq!(RoutingKey::WorkflowExecution.as_str(), "workflow.execution");
    assert_eq!(
      RoutingKey::NotificationEmailRequested.as_str(),
      "workflow.notification-email-requested"
    );
  }
}
