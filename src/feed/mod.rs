//! Client-side cache of the social feed.
//!
//! [`FeedCache`] is the session service object. Its operations are split by
//! concern across the submodules:
//! - `loader`: paginated loading of the post list
//! - `mutations`: optimistic likes, comment and post mutations
//! - `follow`: follow/unfollow reconciliation against the cached profile
//! - `tree`: pure comment-forest edits used by the mutations
//!
//! All state sits behind short-lived locks that are never held across a network
//! call, so concurrent operations interleave only at the gateway boundary.

mod error_sink;
#[cfg(test)]
mod fake;
mod follow;
mod loader;
mod mutations;
pub mod state;
pub mod tree;
pub mod types;

use std::sync::{Mutex, MutexGuard};

use crate::api::error::FeedError;
use crate::api::gateway::FeedGateway;

pub use error_sink::ErrorSink;
pub use follow::FollowOutcome;
pub use state::{FeedState, LoadPhase};
use types::{FollowProfileView, Post, PostId, SessionToken};

/// Follower and following lists of the last user looked up
#[derive(Debug, Clone, Default)]
pub struct FollowLists {
  pub followers: Vec<FollowProfileView>,
  pub following: Vec<FollowProfileView>,
}

/// Feed cache for one signed-in session.
///
/// Created at session start, [`reset`](Self::reset) on logout. Callers only get
/// copies of the cached data; every change goes through an operation.
pub struct FeedCache<G: FeedGateway> {
  gateway: G,
  token: Mutex<Option<SessionToken>>,
  feed: Mutex<FeedState>,
  profile: Mutex<Option<FollowProfileView>>,
  follow_lists: Mutex<FollowLists>,
  /// Bumped by every initial load and reset; stale load responses are dropped
  generation: Mutex<u64>,
  errors: ErrorSink,
}

impl<G: FeedGateway> FeedCache<G> {
  pub fn new(gateway: G, page_size: u32) -> Self {
    Self {
      gateway,
      token: Mutex::new(None),
      feed: Mutex::new(FeedState::new(page_size.max(1))),
      profile: Mutex::new(None),
      follow_lists: Mutex::new(FollowLists::default()),
      generation: Mutex::new(0),
      errors: ErrorSink::default(),
    }
  }

  pub fn sign_in(&self, token: SessionToken) {
    *lock(&self.token) = Some(token);
  }

  pub fn is_authenticated(&self) -> bool {
    lock(&self.token).is_some()
  }

  /// Drop everything cached for this session, including the token.
  pub fn reset(&self) {
    *lock(&self.generation) += 1;
    *lock(&self.token) = None;
    let page_size = lock(&self.feed).page_size;
    *lock(&self.feed) = FeedState::new(page_size);
    *lock(&self.profile) = None;
    *lock(&self.follow_lists) = FollowLists::default();
    self.errors.clear();
  }

  pub fn snapshot(&self) -> FeedState {
    lock(&self.feed).clone()
  }

  pub fn posts(&self) -> Vec<Post> {
    lock(&self.feed).posts.clone()
  }

  pub fn post(&self, id: PostId) -> Option<Post> {
    lock(&self.feed).post(id).cloned()
  }

  pub fn phase(&self) -> LoadPhase {
    lock(&self.feed).phase()
  }

  pub fn profile(&self) -> Option<FollowProfileView> {
    lock(&self.profile).clone()
  }

  pub fn follow_lists(&self) -> FollowLists {
    lock(&self.follow_lists).clone()
  }

  pub fn last_error(&self) -> Option<FeedError> {
    self.errors.last()
  }

  pub fn errors(&self) -> &ErrorSink {
    &self.errors
  }

  /// Current token, or `Unauthenticated` (recorded) before any network call.
  fn require_token(&self) -> Result<SessionToken, FeedError> {
    lock(&self.token).clone().ok_or_else(|| {
      self.errors.record(&FeedError::Unauthenticated);
      FeedError::Unauthenticated
    })
  }

  fn current_token(&self) -> Option<SessionToken> {
    lock(&self.token).clone()
  }

  /// Record a failure in the error slot and hand it back for `?`/`Err`.
  fn fail(&self, error: FeedError) -> FeedError {
    self.errors.record(&error);
    error
  }
}

/// Lock a cache mutex, ignoring poisoning (no edit panics halfway through).
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  mutex.lock().unwrap_or_else(|e| e.into_inner())
}
