//! Domain types held by the feed cache.
//!
//! These are separate from the wire types in `api::api_types` so the cache never
//! depends on how a particular backend spells its fields.

use chrono::{DateTime, Utc};
use std::fmt;

pub type PostId = u64;
pub type CommentId = u64;
pub type UserId = u64;
pub type FollowEdgeId = u64;

/// Author of a post or comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
  pub id: UserId,
  pub username: String,
}

/// A post in the feed, owned by the feed list
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
  pub id: PostId,
  pub author: Author,
  pub content: String,
  pub image_url: Option<String>,
  pub likes_count: u64,
  pub is_liked: bool,
  pub comments: Vec<CommentNode>,
  pub created_at: DateTime<Utc>,
}

/// A comment and its nested replies.
///
/// `replies` is always present, even for a freshly created leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentNode {
  pub id: CommentId,
  pub parent_id: Option<CommentId>,
  pub content: String,
  pub author: Author,
  pub replies: Vec<CommentNode>,
}

#[cfg(test)]
impl CommentNode {
  pub fn leaf(id: CommentId, parent_id: Option<CommentId>, content: &str, author: Author) -> Self {
    Self {
      id,
      parent_id,
      content: content.to_string(),
      author,
      replies: Vec::new(),
    }
  }
}

/// How a page response was shaped on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageShape {
  /// `{results, next}` envelope; `has_next` is whether `next` was non-null
  Paginated { has_next: bool },
  /// Bare list with no envelope, always a single terminal page
  Unpaginated,
}

/// One page of posts as returned by the gateway
#[derive(Debug, Clone)]
pub struct FeedPage {
  pub posts: Vec<Post>,
  pub shape: PageShape,
}

/// Cached view of another user's profile from the current user's perspective.
///
/// `follow_edge_id` is `Some` exactly when `is_following` is true.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowProfileView {
  pub user_id: UserId,
  pub username: String,
  pub is_following: bool,
  pub followers_count: u64,
  pub following_count: u64,
  pub follow_edge_id: Option<FollowEdgeId>,
}

impl FollowProfileView {
  pub fn invariant_holds(&self) -> bool {
    self.is_following == self.follow_edge_id.is_some()
  }
}

/// A follow relationship as stored by the remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowEdge {
  pub id: FollowEdgeId,
  pub follower_id: Option<UserId>,
  pub following_id: UserId,
}

/// Server-confirmed like state, when the toggle endpoint reports one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeReceipt {
  pub liked: bool,
  pub likes_count: u64,
}

/// Image attached to a new post
#[derive(Debug, Clone)]
pub struct PostImage {
  pub file_name: String,
  pub bytes: Vec<u8>,
}

/// Opaque session token. Acquisition and storage happen outside this crate.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
  pub fn new(token: impl Into<String>) -> Self {
    Self(token.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

// Never print the token itself
impl fmt::Debug for SessionToken {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("SessionToken(..)")
  }
}
