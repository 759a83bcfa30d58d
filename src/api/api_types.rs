//! Serde-deserializable types matching the feed API responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on what the cache needs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::feed::types::{
  Author, CommentNode, FeedPage, FollowEdge, FollowProfileView, LikeReceipt, PageShape, Post,
};

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiUser {
  pub id: u64,
  #[serde(default)]
  pub username: String,
}

impl From<ApiUser> for Author {
  fn from(user: ApiUser) -> Self {
    Author {
      id: user.id,
      username: user.username,
    }
  }
}

// ============================================================================
// Posts and comments
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiComment {
  pub id: u64,
  pub user: ApiUser,
  #[serde(default)]
  pub content: String,
  pub parent: Option<u64>,
  // Freshly created comments may come back without a replies field
  #[serde(default)]
  pub replies: Vec<ApiComment>,
}

impl From<ApiComment> for CommentNode {
  fn from(comment: ApiComment) -> Self {
    CommentNode {
      id: comment.id,
      parent_id: comment.parent,
      content: comment.content,
      author: comment.user.into(),
      replies: comment.replies.into_iter().map(CommentNode::from).collect(),
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct ApiPost {
  pub id: u64,
  pub user: ApiUser,
  #[serde(default)]
  pub content: String,
  pub image: Option<String>,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub comments: Vec<ApiComment>,
  #[serde(default)]
  pub likes_count: u64,
  #[serde(default)]
  pub is_liked: bool,
}

impl From<ApiPost> for Post {
  fn from(post: ApiPost) -> Self {
    Post {
      id: post.id,
      author: post.user.into(),
      content: post.content,
      image_url: post.image,
      likes_count: post.likes_count,
      is_liked: post.is_liked,
      comments: post.comments.into_iter().map(CommentNode::from).collect(),
      created_at: post.created_at,
    }
  }
}

/// Post list response: either the paginated envelope or a bare list
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ApiPostPage {
  Paginated {
    results: Vec<ApiPost>,
    next: Option<String>,
  },
  Bare(Vec<ApiPost>),
}

impl From<ApiPostPage> for FeedPage {
  fn from(page: ApiPostPage) -> Self {
    match page {
      ApiPostPage::Paginated { results, next } => FeedPage {
        posts: results.into_iter().map(Post::from).collect(),
        shape: PageShape::Paginated {
          has_next: next.is_some(),
        },
      },
      ApiPostPage::Bare(results) => FeedPage {
        posts: results.into_iter().map(Post::from).collect(),
        shape: PageShape::Unpaginated,
      },
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct ApiLikeResponse {
  pub liked: bool,
  pub likes_count: u64,
}

impl From<ApiLikeResponse> for LikeReceipt {
  fn from(resp: ApiLikeResponse) -> Self {
    LikeReceipt {
      liked: resp.liked,
      likes_count: resp.likes_count,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct ApiNewComment<'a> {
  pub content: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub parent: Option<u64>,
}

// ============================================================================
// Profiles and follows
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiProfile {
  pub id: u64,
  pub username: String,
  #[serde(default)]
  pub followers_count: u64,
  #[serde(default)]
  pub following_count: u64,
  #[serde(default)]
  pub is_following: bool,
  pub follow_id_for_current_user: Option<u64>,
}

impl From<ApiProfile> for FollowProfileView {
  fn from(profile: ApiProfile) -> Self {
    let edge = profile.follow_id_for_current_user;
    if profile.is_following != edge.is_some() {
      warn!(
        user_id = profile.id,
        is_following = profile.is_following,
        ?edge,
        "Profile follow flag disagrees with edge id, trusting the edge id"
      );
    }

    FollowProfileView {
      user_id: profile.id,
      username: profile.username,
      is_following: edge.is_some(),
      followers_count: profile.followers_count,
      following_count: profile.following_count,
      follow_edge_id: edge,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct ApiNewFollow {
  pub following_id: u64,
}

#[derive(Debug, Deserialize)]
pub struct ApiFollow {
  pub id: u64,
  pub follower: Option<ApiUser>,
  pub following: Option<ApiUser>,
}

impl ApiFollow {
  /// The create endpoint only echoes nested users, so the requested target is the fallback.
  pub fn into_edge(self, requested_target: u64) -> FollowEdge {
    FollowEdge {
      id: self.id,
      follower_id: self.follower.map(|u| u.id),
      following_id: self.following.map(|u| u.id).unwrap_or(requested_target),
    }
  }
}
