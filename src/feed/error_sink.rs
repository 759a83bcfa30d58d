use std::sync::Mutex;

use crate::api::error::FeedError;

/// Single-slot holder for the most recent failure.
///
/// Presentation reads it passively; a newer error replaces the older one.
#[derive(Debug, Default)]
pub struct ErrorSink {
  last: Mutex<Option<FeedError>>,
}

impl ErrorSink {
  pub fn record(&self, error: &FeedError) {
    *self.slot() = Some(error.clone());
  }

  pub fn last(&self) -> Option<FeedError> {
    self.slot().clone()
  }

  /// Consume the error, leaving the slot empty
  pub fn take(&self) -> Option<FeedError> {
    self.slot().take()
  }

  pub fn clear(&self) {
    *self.slot() = None;
  }

  fn slot(&self) -> std::sync::MutexGuard<'_, Option<FeedError>> {
    self.last.lock().unwrap_or_else(|e| e.into_inner())
  }
}
