use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::api_types::{
  ApiComment, ApiFollow, ApiLikeResponse, ApiNewComment, ApiNewFollow, ApiPost, ApiPostPage,
  ApiProfile,
};
use super::error::{normalize_response, FeedError};
use super::gateway::{FeedGateway, GatewayResult};
use crate::config::ApiConfig;
use crate::feed::types::{
  CommentId, CommentNode, FeedPage, FollowEdge, FollowEdgeId, FollowProfileView, LikeReceipt,
  Post, PostId, PostImage, SessionToken, UserId,
};

/// HTTP implementation of [`FeedGateway`] for the DRF-style backend
#[derive(Clone)]
pub struct HttpGateway {
  client: reqwest::Client,
  community: Url,
  accounts: Url,
}

impl HttpGateway {
  pub fn new(config: &ApiConfig) -> GatewayResult<Self> {
    let root = Url::parse(&with_trailing_slash(&config.url))
      .map_err(|e| FeedError::Protocol(format!("Invalid API url {}: {}", config.url, e)))?;

    let community = join(&root, &with_trailing_slash(&config.community_prefix))?;
    let accounts = join(&root, &with_trailing_slash(&config.accounts_prefix))?;

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| FeedError::NetworkUnreachable(format!("Failed to build HTTP client: {}", e)))?;

    Ok(Self {
      client,
      community,
      accounts,
    })
  }

  fn community_url(&self, path: &str) -> GatewayResult<Url> {
    join(&self.community, path)
  }

  /// `profile/<username>/` with the username escaped as one path segment
  fn profile_url(&self, username: &str) -> GatewayResult<Url> {
    let mut url = self.accounts.clone();
    url
      .path_segments_mut()
      .map_err(|_| FeedError::Protocol(format!("Cannot extend {}", self.accounts)))?
      .pop_if_empty()
      .push("profile")
      .push(username)
      .push("");
    Ok(url)
  }

  /// Send a request and map transport failures and non-2xx statuses.
  async fn send(
    &self,
    request: RequestBuilder,
    token: Option<&SessionToken>,
  ) -> GatewayResult<Response> {
    let request = match token {
      Some(t) => request.header("Authorization", format!("Token {}", t.as_str())),
      None => request,
    };

    let response = request.send().await.map_err(transport_error)?;
    let status = response.status();
    debug!(status = status.as_u16(), url = %response.url(), "Feed API response");

    if status.is_success() {
      return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(normalize_response(status.as_u16(), &body))
  }

  async fn send_json<T: DeserializeOwned>(
    &self,
    request: RequestBuilder,
    token: Option<&SessionToken>,
  ) -> GatewayResult<T> {
    let response = self.send(request, token).await?;
    let body = response.text().await.map_err(transport_error)?;
    serde_json::from_str(&body).map_err(|e| FeedError::Protocol(format!("Invalid body: {}", e)))
  }
}

impl FeedGateway for HttpGateway {
  async fn list_posts(
    &self,
    token: Option<&SessionToken>,
    page: u32,
    page_size: u32,
  ) -> GatewayResult<FeedPage> {
    let url = self.community_url("posts/")?;
    let request = self
      .client
      .get(url)
      .query(&[("page", page), ("page_size", page_size)]);

    let page: ApiPostPage = self.send_json(request, token).await?;
    Ok(page.into())
  }

  async fn create_post(
    &self,
    token: &SessionToken,
    content: &str,
    image: Option<&PostImage>,
  ) -> GatewayResult<Post> {
    let url = self.community_url("posts/")?;

    let mut form = Form::new().text("content", content.to_string());
    if let Some(image) = image {
      let part = Part::bytes(image.bytes.clone()).file_name(image.file_name.clone());
      form = form.part("image", part);
    }

    let post: ApiPost = self
      .send_json(self.client.post(url).multipart(form), Some(token))
      .await?;
    Ok(post.into())
  }

  async fn delete_post(&self, token: &SessionToken, post_id: PostId) -> GatewayResult<()> {
    let url = self.community_url(&format!("posts/{}/", post_id))?;
    self.send(self.client.delete(url), Some(token)).await?;
    Ok(())
  }

  async fn toggle_like(
    &self,
    token: &SessionToken,
    post_id: PostId,
  ) -> GatewayResult<Option<LikeReceipt>> {
    let url = self.community_url(&format!("posts/{}/like/", post_id))?;
    let response = self
      .send(self.client.post(url).json(&serde_json::json!({})), Some(token))
      .await?;

    // The body is optional; anything unparseable just means "no receipt"
    let body = response.text().await.unwrap_or_default();
    Ok(
      serde_json::from_str::<ApiLikeResponse>(&body)
        .ok()
        .map(LikeReceipt::from),
    )
  }

  async fn create_comment(
    &self,
    token: &SessionToken,
    post_id: PostId,
    content: &str,
    parent: Option<CommentId>,
  ) -> GatewayResult<CommentNode> {
    let url = self.community_url(&format!("posts/{}/comments/", post_id))?;
    let body = ApiNewComment { content, parent };

    let comment: ApiComment = self
      .send_json(self.client.post(url).json(&body), Some(token))
      .await?;
    Ok(comment.into())
  }

  async fn delete_comment(
    &self,
    token: &SessionToken,
    post_id: PostId,
    comment_id: CommentId,
  ) -> GatewayResult<()> {
    let url = self.community_url(&format!("posts/{}/comments/{}/", post_id, comment_id))?;
    self.send(self.client.delete(url), Some(token)).await?;
    Ok(())
  }

  async fn get_profile(
    &self,
    token: Option<&SessionToken>,
    username: &str,
  ) -> GatewayResult<FollowProfileView> {
    let url = self.profile_url(username)?;
    let profile: ApiProfile = self.send_json(self.client.get(url), token).await?;
    Ok(profile.into())
  }

  async fn create_follow(
    &self,
    token: &SessionToken,
    following_id: UserId,
  ) -> GatewayResult<FollowEdge> {
    let url = self.community_url("follows/")?;
    let body = ApiNewFollow { following_id };

    let follow: ApiFollow = self
      .send_json(self.client.post(url).json(&body), Some(token))
      .await?;
    Ok(follow.into_edge(following_id))
  }

  async fn delete_follow(&self, token: &SessionToken, edge_id: FollowEdgeId) -> GatewayResult<()> {
    let url = self.community_url(&format!("follows/{}/", edge_id))?;
    self.send(self.client.delete(url), Some(token)).await?;
    Ok(())
  }

  async fn list_followers(
    &self,
    token: &SessionToken,
    user_id: UserId,
  ) -> GatewayResult<Vec<FollowProfileView>> {
    let url = self.community_url(&format!("follows/user/{}/followers/", user_id))?;
    let users: Vec<ApiProfile> = self.send_json(self.client.get(url), Some(token)).await?;
    Ok(users.into_iter().map(FollowProfileView::from).collect())
  }

  async fn list_following(
    &self,
    token: &SessionToken,
    user_id: UserId,
  ) -> GatewayResult<Vec<FollowProfileView>> {
    let url = self.community_url(&format!("follows/user/{}/following/", user_id))?;
    let users: Vec<ApiProfile> = self.send_json(self.client.get(url), Some(token)).await?;
    Ok(users.into_iter().map(FollowProfileView::from).collect())
  }
}

fn transport_error(e: reqwest::Error) -> FeedError {
  FeedError::NetworkUnreachable(e.to_string())
}

fn join(base: &Url, path: &str) -> GatewayResult<Url> {
  base
    .join(path)
    .map_err(|e| FeedError::Protocol(format!("Invalid path {}: {}", path, e)))
}

fn with_trailing_slash(s: &str) -> String {
  if s.ends_with('/') {
    s.to_string()
  } else {
    format!("{}/", s)
  }
}
