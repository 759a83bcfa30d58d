//! Scripted in-memory gateway for tests.

use chrono::{TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::Mutex;

use super::lock;
use super::types::{
  Author, CommentId, CommentNode, FeedPage, FollowEdge, FollowEdgeId, FollowProfileView,
  LikeReceipt, PageShape, Post, PostId, PostImage, SessionToken, UserId,
};
use crate::api::error::FeedError;
use crate::api::gateway::{FeedGateway, GatewayResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
  ListPosts { page: u32, authed: bool },
  CreatePost { content: String, has_image: bool },
  DeletePost(PostId),
  ToggleLike(PostId),
  CreateComment { post_id: PostId, parent: Option<CommentId> },
  DeleteComment { post_id: PostId, comment_id: CommentId },
  GetProfile(String),
  CreateFollow(UserId),
  DeleteFollow(FollowEdgeId),
  ListFollowers(UserId),
  ListFollowing(UserId),
}

/// Each operation pops its next scripted result. Deletes and likes succeed
/// when nothing is scripted; everything else fails.
#[derive(Default)]
pub struct FakeGateway {
  yield_mid_call: bool,
  calls: Mutex<Vec<Call>>,
  pages: Mutex<VecDeque<GatewayResult<FeedPage>>>,
  created_posts: Mutex<VecDeque<GatewayResult<Post>>>,
  likes: Mutex<VecDeque<GatewayResult<Option<LikeReceipt>>>>,
  comments: Mutex<VecDeque<GatewayResult<CommentNode>>>,
  deletes: Mutex<VecDeque<GatewayResult<()>>>,
  profiles: Mutex<VecDeque<GatewayResult<FollowProfileView>>>,
  follows: Mutex<VecDeque<GatewayResult<FollowEdge>>>,
  user_lists: Mutex<VecDeque<GatewayResult<Vec<FollowProfileView>>>>,
}

impl FakeGateway {
  /// Suspend once inside every call, after the response is chosen
  pub fn with_yield(mut self) -> Self {
    self.yield_mid_call = true;
    self
  }

  pub fn push_page(&self, result: GatewayResult<FeedPage>) {
    lock(&self.pages).push_back(result);
  }

  pub fn push_created_post(&self, result: GatewayResult<Post>) {
    lock(&self.created_posts).push_back(result);
  }

  pub fn push_like(&self, result: GatewayResult<Option<LikeReceipt>>) {
    lock(&self.likes).push_back(result);
  }

  pub fn push_comment(&self, result: GatewayResult<CommentNode>) {
    lock(&self.comments).push_back(result);
  }

  pub fn push_delete(&self, result: GatewayResult<()>) {
    lock(&self.deletes).push_back(result);
  }

  pub fn push_profile(&self, result: GatewayResult<FollowProfileView>) {
    lock(&self.profiles).push_back(result);
  }

  pub fn push_follow(&self, result: GatewayResult<FollowEdge>) {
    lock(&self.follows).push_back(result);
  }

  pub fn push_user_list(&self, result: GatewayResult<Vec<FollowProfileView>>) {
    lock(&self.user_lists).push_back(result);
  }

  pub fn calls(&self) -> Vec<Call> {
    lock(&self.calls).clone()
  }

  /// Pages requested by `list_posts`, in call order
  pub fn list_calls(&self) -> Vec<u32> {
    self
      .calls()
      .into_iter()
      .filter_map(|c| match c {
        Call::ListPosts { page, .. } => Some(page),
        _ => None,
      })
      .collect()
  }

  fn record<T>(
    &self,
    call: Call,
    queue: &Mutex<VecDeque<GatewayResult<T>>>,
    fallback: impl FnOnce() -> GatewayResult<T>,
  ) -> GatewayResult<T> {
    lock(&self.calls).push(call);
    lock(queue).pop_front().unwrap_or_else(fallback)
  }

  async fn pause(&self) {
    if self.yield_mid_call {
      tokio::task::yield_now().await;
    }
  }
}

fn unscripted<T>() -> GatewayResult<T> {
  Err(FeedError::Protocol("no scripted response".to_string()))
}

impl FeedGateway for FakeGateway {
  async fn list_posts(
    &self,
    token: Option<&SessionToken>,
    page: u32,
    _page_size: u32,
  ) -> GatewayResult<FeedPage> {
    let authed = token.is_some();
    let result = self.record(Call::ListPosts { page, authed }, &self.pages, unscripted);
    self.pause().await;
    result
  }

  async fn create_post(
    &self,
    _token: &SessionToken,
    content: &str,
    image: Option<&PostImage>,
  ) -> GatewayResult<Post> {
    let call = Call::CreatePost {
      content: content.to_string(),
      has_image: image.is_some(),
    };
    let result = self.record(call, &self.created_posts, unscripted);
    self.pause().await;
    result
  }

  async fn delete_post(&self, _token: &SessionToken, post_id: PostId) -> GatewayResult<()> {
    let result = self.record(Call::DeletePost(post_id), &self.deletes, || Ok(()));
    self.pause().await;
    result
  }

  async fn toggle_like(
    &self,
    _token: &SessionToken,
    post_id: PostId,
  ) -> GatewayResult<Option<LikeReceipt>> {
    let result = self.record(Call::ToggleLike(post_id), &self.likes, || Ok(None));
    self.pause().await;
    result
  }

  async fn create_comment(
    &self,
    _token: &SessionToken,
    post_id: PostId,
    _content: &str,
    parent: Option<CommentId>,
  ) -> GatewayResult<CommentNode> {
    let call = Call::CreateComment { post_id, parent };
    let result = self.record(call, &self.comments, unscripted);
    self.pause().await;
    result
  }

  async fn delete_comment(
    &self,
    _token: &SessionToken,
    post_id: PostId,
    comment_id: CommentId,
  ) -> GatewayResult<()> {
    let call = Call::DeleteComment {
      post_id,
      comment_id,
    };
    let result = self.record(call, &self.deletes, || Ok(()));
    self.pause().await;
    result
  }

  async fn get_profile(
    &self,
    _token: Option<&SessionToken>,
    username: &str,
  ) -> GatewayResult<FollowProfileView> {
    let call = Call::GetProfile(username.to_string());
    let result = self.record(call, &self.profiles, unscripted);
    self.pause().await;
    result
  }

  async fn create_follow(
    &self,
    _token: &SessionToken,
    following_id: UserId,
  ) -> GatewayResult<FollowEdge> {
    let result = self.record(Call::CreateFollow(following_id), &self.follows, unscripted);
    self.pause().await;
    result
  }

  async fn delete_follow(&self, _token: &SessionToken, edge_id: FollowEdgeId) -> GatewayResult<()> {
    let result = self.record(Call::DeleteFollow(edge_id), &self.deletes, || Ok(()));
    self.pause().await;
    result
  }

  async fn list_followers(
    &self,
    _token: &SessionToken,
    user_id: UserId,
  ) -> GatewayResult<Vec<FollowProfileView>> {
    let result = self.record(Call::ListFollowers(user_id), &self.user_lists, unscripted);
    self.pause().await;
    result
  }

  async fn list_following(
    &self,
    _token: &SessionToken,
    user_id: UserId,
  ) -> GatewayResult<Vec<FollowProfileView>> {
    let result = self.record(Call::ListFollowing(user_id), &self.user_lists, unscripted);
    self.pause().await;
    result
  }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn author(id: UserId) -> Author {
  Author {
    id,
    username: format!("user{}", id),
  }
}

pub fn post(id: PostId) -> Post {
  Post {
    id,
    author: author(1),
    content: format!("post {}", id),
    image_url: None,
    likes_count: 0,
    is_liked: false,
    comments: Vec::new(),
    created_at: Utc.timestamp_opt(1_700_000_000 - id as i64, 0).unwrap(),
  }
}

pub fn comment(id: CommentId, parent: Option<CommentId>) -> CommentNode {
  CommentNode::leaf(id, parent, &format!("comment {}", id), author(2))
}

/// A terminal paginated page of posts with the given ids
pub fn page(ids: impl IntoIterator<Item = PostId>) -> FeedPage {
  paginated(ids, false)
}

/// A terminal paginated page holding exactly `posts`
pub fn page_of(posts: Vec<Post>) -> FeedPage {
  FeedPage {
    posts,
    shape: PageShape::Paginated { has_next: false },
  }
}

pub fn paginated(ids: impl IntoIterator<Item = PostId>, has_next: bool) -> FeedPage {
  FeedPage {
    posts: ids.into_iter().map(post).collect(),
    shape: PageShape::Paginated { has_next },
  }
}

pub fn profile(user_id: UserId, edge: Option<FollowEdgeId>, followers: u64) -> FollowProfileView {
  FollowProfileView {
    user_id,
    username: format!("user{}", user_id),
    is_following: edge.is_some(),
    followers_count: followers,
    following_count: 0,
    follow_edge_id: edge,
  }
}
