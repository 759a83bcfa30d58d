//! Paginated loading of the post list.

use std::collections::HashSet;
use tracing::{debug, warn};

use super::state::FeedState;
use super::tree::duplicate_ids;
use super::types::{FeedPage, PageShape, Post};
use super::{lock, FeedCache};
use crate::api::error::FeedError;
use crate::api::gateway::FeedGateway;

impl<G: FeedGateway> FeedCache<G> {
  /// Reload from page 1, replacing whatever is cached.
  ///
  /// Always issues a request, even while another load is in flight; the older
  /// load's response is discarded when it arrives.
  pub async fn load_initial(&self) -> Result<(), FeedError> {
    let generation = {
      let mut generation = lock(&self.generation);
      *generation += 1;
      *generation
    };

    let page_size = {
      let mut feed = lock(&self.feed);
      feed.page = 1;
      feed.posts.clear();
      feed.has_more = true;
      feed.is_initial_loading = true;
      feed.is_loading_more = false;
      feed.page_size
    };

    debug!(generation, page_size, "Loading first page");
    let token = self.current_token();
    let result = self.gateway.list_posts(token.as_ref(), 1, page_size).await;

    if !self.is_current(generation) {
      debug!(generation, "Discarding superseded initial load");
      return result.map(|_| ()).map_err(|e| self.fail(e));
    }

    let mut feed = lock(&self.feed);
    feed.is_initial_loading = false;
    feed.loaded_once = true;

    match result {
      Ok(page) => {
        feed.posts.clear();
        apply_page(&mut feed, page, 1);
        feed.last_error = None;
        Ok(())
      }
      Err(e) => {
        feed.has_more = false;
        feed.last_error = Some(e.clone());
        drop(feed);
        Err(self.fail(e))
      }
    }
  }

  /// Fetch and append the next page.
  ///
  /// Returns immediately without a request when a page is already being fetched
  /// or there are no more pages. The second caller is not queued.
  pub async fn load_more(&self) -> Result<(), FeedError> {
    let generation = *lock(&self.generation);

    let (page, page_size) = {
      let mut feed = lock(&self.feed);
      if feed.is_loading_more || feed.is_initial_loading || !feed.has_more {
        debug!(
          loading_more = feed.is_loading_more,
          has_more = feed.has_more,
          "Skipping load_more"
        );
        return Ok(());
      }
      feed.is_loading_more = true;
      (feed.page, feed.page_size)
    };

    debug!(generation, page, page_size, "Loading next page");
    let token = self.current_token();
    let result = self.gateway.list_posts(token.as_ref(), page, page_size).await;

    if !self.is_current(generation) {
      debug!(generation, page, "Discarding stale page");
      return result.map(|_| ()).map_err(|e| self.fail(e));
    }

    let mut feed = lock(&self.feed);
    feed.is_loading_more = false;

    match result {
      Ok(fetched) => {
        apply_page(&mut feed, fetched, page);
        feed.last_error = None;
        Ok(())
      }
      Err(e) => {
        feed.has_more = false;
        feed.last_error = Some(e.clone());
        drop(feed);
        Err(self.fail(e))
      }
    }
  }

  fn is_current(&self, generation: u64) -> bool {
    *lock(&self.generation) == generation
  }
}

/// Append a fetched page and advance the cursor past `requested`.
fn apply_page(feed: &mut FeedState, page: FeedPage, requested: u32) {
  let received = page.posts.len();
  let appended = append_unique(&mut feed.posts, page.posts);

  feed.page = requested + 1;
  match page.shape {
    PageShape::Paginated { has_next } => {
      // A short page is terminal even if the server claims a next page
      feed.has_more = !feed.unpaginated && has_next && received == feed.page_size as usize;
    }
    PageShape::Unpaginated => {
      feed.unpaginated = true;
      feed.has_more = false;
    }
  }

  debug!(
    received,
    appended,
    total = feed.posts.len(),
    next_page = feed.page,
    has_more = feed.has_more,
    "Applied page"
  );
}

fn append_unique(posts: &mut Vec<Post>, incoming: Vec<Post>) -> usize {
  let mut seen: HashSet<_> = posts.iter().map(|p| p.id).collect();
  let mut appended = 0;

  for post in incoming {
    if !seen.insert(post.id) {
      warn!(post_id = post.id, "Post already cached, skipping duplicate");
      continue;
    }
    let dups = duplicate_ids(&post.comments);
    if !dups.is_empty() {
      warn!(post_id = post.id, ?dups, "Comment ids repeat within post");
    }
    posts.push(post);
    appended += 1;
  }

  appended
}
