use super::types::{Post, PostId};
use crate::api::error::FeedError;

/// Where the loader is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
  Idle,
  InitialLoading,
  Loaded,
  LoadingMore,
  /// Loaded, but the last load failed; no further pages until `load_initial`
  Error,
}

/// The cached feed. Only the cache's own operations mutate it.
#[derive(Debug, Clone)]
pub struct FeedState {
  pub posts: Vec<Post>,
  /// Next page to request, starting at 1
  pub page: u32,
  pub page_size: u32,
  pub has_more: bool,
  pub is_initial_loading: bool,
  pub is_loading_more: bool,
  pub last_error: Option<FeedError>,
  /// Set once an unpaginated response is seen; no more pages this session
  pub unpaginated: bool,
  pub(crate) loaded_once: bool,
}

impl FeedState {
  pub fn new(page_size: u32) -> Self {
    Self {
      posts: Vec::new(),
      page: 1,
      page_size,
      has_more: true,
      is_initial_loading: false,
      is_loading_more: false,
      last_error: None,
      unpaginated: false,
      loaded_once: false,
    }
  }

  pub fn phase(&self) -> LoadPhase {
    if self.is_initial_loading {
      LoadPhase::InitialLoading
    } else if self.is_loading_more {
      LoadPhase::LoadingMore
    } else if self.last_error.is_some() && !self.has_more {
      LoadPhase::Error
    } else if self.loaded_once {
      LoadPhase::Loaded
    } else {
      LoadPhase::Idle
    }
  }

  pub fn post(&self, id: PostId) -> Option<&Post> {
    self.posts.iter().find(|p| p.id == id)
  }

  pub(crate) fn post_mut(&mut self, id: PostId) -> Option<&mut Post> {
    self.posts.iter_mut().find(|p| p.id == id)
  }
}
