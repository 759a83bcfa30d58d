//! The remote side of the cache, as seen by the feed core.

use std::future::Future;

use super::error::FeedError;
use crate::feed::types::{
  CommentId, CommentNode, FeedPage, FollowEdge, FollowEdgeId, FollowProfileView, LikeReceipt,
  Post, PostId, PostImage, SessionToken, UserId,
};

pub type GatewayResult<T> = Result<T, FeedError>;

/// Request/response access to the authoritative store.
///
/// Mutating calls take a [`SessionToken`] by reference, so the core has to hold
/// one before it can reach the network at all. Reads accept an optional token.
pub trait FeedGateway: Send + Sync {
  fn list_posts(
    &self,
    token: Option<&SessionToken>,
    page: u32,
    page_size: u32,
  ) -> impl Future<Output = GatewayResult<FeedPage>> + Send;

  fn create_post(
    &self,
    token: &SessionToken,
    content: &str,
    image: Option<&PostImage>,
  ) -> impl Future<Output = GatewayResult<Post>> + Send;

  fn delete_post(
    &self,
    token: &SessionToken,
    post_id: PostId,
  ) -> impl Future<Output = GatewayResult<()>> + Send;

  /// Returns the server's like state when the response body carries one.
  fn toggle_like(
    &self,
    token: &SessionToken,
    post_id: PostId,
  ) -> impl Future<Output = GatewayResult<Option<LikeReceipt>>> + Send;

  fn create_comment(
    &self,
    token: &SessionToken,
    post_id: PostId,
    content: &str,
    parent: Option<CommentId>,
  ) -> impl Future<Output = GatewayResult<CommentNode>> + Send;

  fn delete_comment(
    &self,
    token: &SessionToken,
    post_id: PostId,
    comment_id: CommentId,
  ) -> impl Future<Output = GatewayResult<()>> + Send;

  fn get_profile(
    &self,
    token: Option<&SessionToken>,
    username: &str,
  ) -> impl Future<Output = GatewayResult<FollowProfileView>> + Send;

  fn create_follow(
    &self,
    token: &SessionToken,
    following_id: UserId,
  ) -> impl Future<Output = GatewayResult<FollowEdge>> + Send;

  fn delete_follow(
    &self,
    token: &SessionToken,
    edge_id: FollowEdgeId,
  ) -> impl Future<Output = GatewayResult<()>> + Send;

  fn list_followers(
    &self,
    token: &SessionToken,
    user_id: UserId,
  ) -> impl Future<Output = GatewayResult<Vec<FollowProfileView>>> + Send;

  fn list_following(
    &self,
    token: &SessionToken,
    user_id: UserId,
  ) -> impl Future<Output = GatewayResult<Vec<FollowProfileView>>> + Send;
}
