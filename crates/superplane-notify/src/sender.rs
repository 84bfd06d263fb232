use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::NotifyError;

/// The outbound email collaborator. Implemented by the host process.
#[async_trait]
pub trait NotificationSender: Send + Sync {
  async fn send_notification(
    &self,
    title: &str,
    body: &str,
    url: Option<&str>,
    url_label: Option<&str>,
    bcc: &[String],
  ) -> Result<(), NotifyError>;
}

/// A sent notification, as recorded by `InMemorySender` for assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct SentNotification {
  pub title: String,
  pub body: String,
  pub url: Option<String>,
  pub url_label: Option<String>,
  pub bcc: Vec<String>,
}

/// In-memory double of `NotificationSender` for tests; records every send
/// rather than performing one.
#[derive(Debug, Default)]
pub struct InMemorySender {
  sent: Mutex<Vec<SentNotification>>,
}

impl InMemorySender {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn sent(&self) -> Vec<SentNotification> {
    self.sent.lock().unwrap().clone()
  }
}

#[async_trait]
impl NotificationSender for InMemorySender {
  async fn send_notification(
    &self,
    title: &str,
    body: &str,
    url: Option<&str>,
    url_label: Option<&str>,
    bcc: &[String],
  ) -> Result<(), NotifyError> {
    self.sent.lock().unwrap().push(SentNotification {
      title: title.to_string(),
      body: body.to_string(),
      url: url.map(str::to_string),
      url_label: url_label.map(str::to_string),
      bcc: bcc.to_vec(),
    });
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn records_sent_notifications() {
    let sender = InMemorySender::new();
    sender
      .send_notification("hi", "body", Some("http://x"), Some("open"), &["a@example.com".into()])
      .await
      .unwrap();

    let sent = sender.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].title, "hi");
    assert_eq!(sent[0].bcc, vec!["a@example.com".to_string()]);
  }
}
