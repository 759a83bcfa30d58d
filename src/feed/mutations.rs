//! Local-first mutations reconciled against the server's answer.

use tracing::{info, warn};

use super::tree::{delete_node, insert_reply, Placement};
use super::types::{CommentId, CommentNode, Post, PostId, PostImage};
use super::{lock, FeedCache};
use crate::api::error::FeedError;
use crate::api::gateway::FeedGateway;

impl<G: FeedGateway> FeedCache<G> {
  /// Toggle the current user's like on a cached post.
  ///
  /// The flip is applied before the request. If the request fails, the post's
  /// like fields go back to what they were and the error is recorded.
  pub async fn like_post(&self, post_id: PostId) -> Result<(), FeedError> {
    let token = self.require_token()?;

    let (was_liked, old_count) = {
      let mut feed = lock(&self.feed);
      let post = feed.post_mut(post_id).ok_or_else(|| {
        self.fail(FeedError::NotFound(format!("post {} is not cached", post_id)))
      })?;

      let before = (post.is_liked, post.likes_count);
      post.is_liked = !post.is_liked;
      post.likes_count = if post.is_liked {
        post.likes_count + 1
      } else {
        post.likes_count.saturating_sub(1)
      };
      before
    };

    match self.gateway.toggle_like(&token, post_id).await {
      Ok(receipt) => {
        if let Some(receipt) = receipt {
          if let Some(post) = lock(&self.feed).post_mut(post_id) {
            post.is_liked = receipt.liked;
            post.likes_count = receipt.likes_count;
          }
        }
        info!(post_id, "Like toggled");
        Ok(())
      }
      Err(e) => {
        // The post may have been dropped by a reload meanwhile
        if let Some(post) = lock(&self.feed).post_mut(post_id) {
          post.is_liked = was_liked;
          post.likes_count = old_count;
        }
        warn!(post_id, error = %e, "Like failed, rolled back");
        Err(self.fail(e))
      }
    }
  }

  /// Create a comment (or a reply when `parent` is set) and splice it into the
  /// cached post's comment forest.
  ///
  /// The parent echoed by the server wins; the requested parent is the
  /// fallback. If the post is no longer cached the comment is still returned.
  pub async fn create_comment(
    &self,
    post_id: PostId,
    content: &str,
    parent: Option<CommentId>,
  ) -> Result<CommentNode, FeedError> {
    let token = self.require_token()?;

    let created = self
      .gateway
      .create_comment(&token, post_id, content, parent)
      .await
      .map_err(|e| self.fail(e))?;

    let parent_id = created.parent_id.or(parent);
    let mut node = created;
    node.parent_id = parent_id;

    match lock(&self.feed).post_mut(post_id) {
      Some(post) => {
        let placement = insert_reply(&mut post.comments, node.clone(), parent_id);
        if placement == Placement::TopLevelFallback {
          warn!(post_id, comment_id = node.id, "Reply shown at top level");
        }
      }
      None => warn!(post_id, comment_id = node.id, "Post not cached, comment not spliced"),
    }

    info!(post_id, comment_id = node.id, ?parent_id, "Comment created");
    Ok(node)
  }

  /// Delete a comment remotely, then remove it from the cached forest.
  ///
  /// A comment that is already gone locally counts as success.
  pub async fn delete_comment(
    &self,
    post_id: PostId,
    comment_id: CommentId,
  ) -> Result<(), FeedError> {
    let token = self.require_token()?;

    self
      .gateway
      .delete_comment(&token, post_id, comment_id)
      .await
      .map_err(|e| self.fail(e))?;

    let removed = lock(&self.feed)
      .post_mut(post_id)
      .map(|post| delete_node(&mut post.comments, comment_id))
      .unwrap_or(false);

    if !removed {
      warn!(post_id, comment_id, "Deleted comment was not in local cache");
    }
    info!(post_id, comment_id, "Comment deleted");
    Ok(())
  }

  /// Create a post, then reload the first page instead of inserting locally.
  ///
  /// A failing reload is recorded but does not fail the creation.
  pub async fn create_post(
    &self,
    content: &str,
    image: Option<&PostImage>,
  ) -> Result<Post, FeedError> {
    let token = self.require_token()?;

    let post = self
      .gateway
      .create_post(&token, content, image)
      .await
      .map_err(|e| self.fail(e))?;
    info!(post_id = post.id, "Post created");

    if let Err(e) = self.load_initial().await {
      warn!(error = %e, "Feed reload after post creation failed");
    }

    Ok(post)
  }

  pub async fn delete_post(&self, post_id: PostId) -> Result<(), FeedError> {
    let token = self.require_token()?;

    self
      .gateway
      .delete_post(&token, post_id)
      .await
      .map_err(|e| self.fail(e))?;

    lock(&self.feed).posts.retain(|p| p.id != post_id);
    info!(post_id, "Post deleted");
    Ok(())
  }
}
