use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use superplane_bus::NotificationEmailRequested;

use crate::error::NotifyError;
use crate::rbac::{RbacLookup, UserDirectory};
use crate::sender::NotificationSender;

/// Consumes `workflow.notification-email-requested` messages off the bus
/// and resolves them to a recipient set before handing off to the email
/// collaborator.
pub struct NotificationConsumer {
  rbac: Arc<dyn RbacLookup>,
  directory: Arc<dyn UserDirectory>,
  sender: Arc<dyn NotificationSender>,
}

impl NotificationConsumer {
  pub fn new(rbac: Arc<dyn RbacLookup>, directory: Arc<dyn UserDirectory>, sender: Arc<dyn NotificationSender>) -> Self {
    Self { rbac, directory, sender }
  }

  /// Resolve and deliver a single notification. A
  /// group/role lookup failure is logged and that subset is skipped, the
  /// rest of the recipients still get the notification; an empty resolved
  /// set drops the notification entirely rather than sending to nobody.
  pub async fn handle(&self, msg: &NotificationEmailRequested) -> Result<(), NotifyError> {
    let mut recipients: HashSet<String> = HashSet::new();

    for email in &msg.emails {
      recipients.insert(normalize_email(email));
    }

    for group in &msg.groups {
      match self.resolve_group(msg.organization_id, group).await {
        Ok(emails) => recipients.extend(emails),
        Err(err) => warn!(group = %group, error = %err, "skipping group in notification recipient resolution"),
      }
    }

    for role in &msg.roles {
      match self.resolve_role(msg.organization_id, role).await {
        Ok(emails) => recipients.extend(emails),
        Err(err) => warn!(role = %role, error = %err, "skipping role in notification recipient resolution"),
      }
    }

    if recipients.is_empty() {
      info!(title = %msg.title, "dropping notification with empty resolved recipient set");
      return Ok(());
    }

    let bcc: Vec<String> = recipients.into_iter().collect();
    self
      .sender
      .send_notification(&msg.title, &msg.body, msg.url.as_deref(), msg.url_label.as_deref(), &bcc)
      .await
  }

  async fn resolve_group(
    &self,
    org: superplane_core::OrganizationId,
    group: &str,
  ) -> Result<Vec<String>, NotifyError> {
    let user_ids = self.rbac.group_member_ids(org, group).await?;
    self.resolve_emails(org, &user_ids).await
  }

  async fn resolve_role(
    &self,
    org: superplane_core::OrganizationId,
    role: &str,
  ) -> Result<Vec<String>, NotifyError> {
    let user_ids = self.rbac.role_assignee_ids(org, role).await?;
    self.resolve_emails(org, &user_ids).await
  }

  async fn resolve_emails(
    &self,
    org: superplane_core::OrganizationId,
    user_ids: &[String],
  ) -> Result<Vec<String>, NotifyError> {
    let mut emails = Vec::with_capacity(user_ids.len());
    for user_id in user_ids {
      if let Some(email) = self.directory.active_email(org, user_id).await? {
        emails.push(normalize_email(&email));
      }
    }
    Ok(emails)
  }

  /// Drain the bus until cancelled. At-least-once delivery means `handle`
  /// must tolerate being called twice for the same logical notification;
  /// it is (sending a notification twice has no state to corrupt).
  pub async fn run(&self, mut rx: broadcast::Receiver<NotificationEmailRequested>, cancel: CancellationToken) {
    loop {
      tokio::select! {
        _ = cancel.cancelled() => {
          info!("notification consumer shutting down");
          return;
        }
        received = rx.recv() => {
          match received {
            Ok(msg) => {
              if let Err(err) = self.handle(&msg).await {
                warn!(error = %err, "notification delivery failed");
              }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
              warn!(skipped, "notification consumer lagged behind the bus");
            }
            Err(broadcast::error::RecvError::Closed) => {
              info!("notification bus closed, stopping consumer");
              return;
            }
          }
        }
      }
    }
  }
}

fn normalize_email(email: &str) -> String {
  email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::rbac::{InMemoryRbac, InMemoryUserDirectory};
  use crate::sender::InMemorySender;
  use superplane_core::OrganizationId;

  fn request(org: OrganizationId) -> NotificationEmailRequested {
    NotificationEmailRequested {
      organization_id: org,
      title: "Deploy failed".into(),
      body: "node X failed".into(),
      url: Some("https://example.com/run/1".into()),
      url_label: Some("View run".into()),
      emails: vec![],
      groups: vec![],
      roles: vec![],
    }
  }

  fn consumer(
    rbac: Arc<InMemoryRbac>,
    directory: Arc<InMemoryUserDirectory>,
    sender: Arc<InMemorySender>,
  ) -> NotificationConsumer {
    NotificationConsumer::new(rbac, directory, sender)
  }

  #[tokio::test]
  async fn dedupes_overlapping_group_role_and_raw_emails() {
    let org = OrganizationId::new();
    let rbac = Arc::new(InMemoryRbac::new());
    let directory = Arc::new(InMemoryUserDirectory::new());
    let sender = Arc::new(InMemorySender::new());

    rbac.set_group(org, "on-call", vec!["u1".into()]);
    rbac.set_role(org, "admin", vec!["u1".into(), "u2".into()]);
    directory.set_active(org, "u1", "Alice@Example.com");
    directory.set_active(org, "u2", "bob@example.com");

    let mut msg = request(org);
    msg.emails = vec!["  alice@example.com ".into()];
    msg.groups = vec!["on-call".into()];
    msg.roles = vec!["admin".into()];

    let consumer = consumer(rbac, directory, sender.clone());
    consumer.handle(&msg).await.unwrap();

    let sent = sender.sent();
    assert_eq!(sent.len(), 1);
    let mut bcc = sent[0].bcc.clone();
    bcc.sort();
    assert_eq!(bcc, vec!["alice@example.com".to_string(), "bob@example.com".to_string()]);
  }

  #[tokio::test]
  async fn failed_group_lookup_is_skipped_not_fatal() {
    struct FailingRbac;
    #[async_trait::async_trait]
    impl RbacLookup for FailingRbac {
      async fn group_member_ids(&self, _org: OrganizationId, _group: &str) -> Result<Vec<String>, NotifyError> {
        Err(NotifyError::GroupLookup { group: "eng".into(), message: "unreachable".into() })
      }
      async fn role_assignee_ids(&self, _org: OrganizationId, _role: &str) -> Result<Vec<String>, NotifyError> {
        Ok(vec!["u2".into()])
      }
    }

    let org = OrganizationId::new();
    let directory = Arc::new(InMemoryUserDirectory::new());
    directory.set_active(org, "u2", "bob@example.com");
    let sender = Arc::new(InMemorySender::new());

    let consumer = NotificationConsumer::new(Arc::new(FailingRbac), directory, sender.clone());

    let mut msg = request(org);
    msg.groups = vec!["eng".into()];
    msg.roles = vec!["admin".into()];

    consumer.handle(&msg).await.unwrap();

    let sent = sender.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].bcc, vec!["bob@example.com".to_string()]);
  }

  #[tokio::test]
  async fn empty_recipient_set_is_dropped() {
    let org = OrganizationId::new();
    let rbac = Arc::new(InMemoryRbac::new());
    let directory = Arc::new(InMemoryUserDirectory::new());
    let sender = Arc::new(InMemorySender::new());

    let consumer = consumer(rbac, directory, sender.clone());
    consumer.handle(&request(org)).await.unwrap();

    assert!(sender.sent().is_empty());
  }
}
