use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
  #[error("bus is disconnected, reconnecting")]
  Disconnected,

  #[error("no subscriber for routing key {0}")]
  NoSubscriber(&'static str),
}
