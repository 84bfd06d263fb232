use std::time::Duration;

/// Tunables for the Node Execution Worker and Node Request Worker poll
/// loops. Constructed
/// programmatically by the embedding process — there is no config-file
/// parser here, that belongs to the excluded CLI/HTTP host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerConfig {
  /// How often the main loop re-polls for pending rows.
  pub poll_interval: Duration,
  /// Upper bound on rows processed concurrently per tick.
  pub concurrency: usize,
  /// How many rows a single poll fetches before the concurrency gate
  /// throttles further dispatch.
  pub batch_size: i64,
}

impl Default for WorkerConfig {
  fn default() -> Self {
    Self {
      poll_interval: Duration::from_secs(1),
      concurrency: 25,
      batch_size: 25,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_match_the_stated_constants() {
    let config = WorkerConfig::default();
    assert_eq!(config.poll_interval, Duration::from_secs(1));
    assert_eq!(config.concurrency, 25);
  }
}
