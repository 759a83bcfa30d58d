//! Follow/unfollow against the cached profile view.

use tracing::{debug, info, warn};

use super::types::{FollowEdge, FollowEdgeId, FollowProfileView, UserId};
use super::{lock, FeedCache};
use crate::api::error::FeedError;
use crate::api::gateway::FeedGateway;

/// Result of a successful [`FeedCache::toggle_follow`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowOutcome {
  Followed(FollowEdge),
  Unfollowed,
}

impl FollowOutcome {
  pub fn is_following(&self) -> bool {
    matches!(self, Self::Followed(_))
  }
}

impl<G: FeedGateway> FeedCache<G> {
  /// Fetch a profile by username and make it the cached profile view.
  ///
  /// A 404 clears the cached view and yields `Ok(None)` without recording an
  /// error, since a missing profile is a normal state.
  pub async fn fetch_profile(
    &self,
    username: &str,
  ) -> Result<Option<FollowProfileView>, FeedError> {
    let token = self.current_token();

    match self.gateway.get_profile(token.as_ref(), username).await {
      Ok(profile) => {
        *lock(&self.profile) = Some(profile.clone());
        Ok(Some(profile))
      }
      Err(e) if e.is_not_found() => {
        debug!(username, "No profile for user");
        *lock(&self.profile) = None;
        Ok(None)
      }
      Err(e) => Err(self.fail(e)),
    }
  }

  /// Follow `target` when `current_edge` is `None`, otherwise delete that edge.
  ///
  /// On success the cached profile (if it is `target`'s) is reconciled: it is
  /// refetched when its username is known, else patched locally. If the refetch
  /// fails the local patch is applied instead and the refetch error recorded.
  /// On failure nothing cached changes.
  pub async fn toggle_follow(
    &self,
    target: UserId,
    current_edge: Option<FollowEdgeId>,
  ) -> Result<FollowOutcome, FeedError> {
    let token = self.require_token()?;

    let outcome = match current_edge {
      Some(edge_id) => {
        self
          .gateway
          .delete_follow(&token, edge_id)
          .await
          .map_err(|e| self.fail(e))?;
        info!(target, edge_id, "Unfollowed");
        FollowOutcome::Unfollowed
      }
      None => {
        let edge = self
          .gateway
          .create_follow(&token, target)
          .await
          .map_err(|e| self.fail(e))?;
        info!(target, edge_id = edge.id, "Followed");
        FollowOutcome::Followed(edge)
      }
    };

    self.reconcile_profile(target, &outcome).await;
    Ok(outcome)
  }

  async fn reconcile_profile(&self, target: UserId, outcome: &FollowOutcome) {
    let username = match lock(&self.profile).as_ref() {
      Some(profile) if profile.user_id == target => Some(profile.username.clone()),
      Some(_) | None => None,
    };

    let Some(username) = username.filter(|u| !u.is_empty()) else {
      self.patch_profile(target, outcome);
      return;
    };

    let token = self.current_token();
    match self.gateway.get_profile(token.as_ref(), &username).await {
      Ok(fresh) if fresh.user_id == target => {
        debug_assert!(fresh.invariant_holds());
        *lock(&self.profile) = Some(fresh);
      }
      Ok(fresh) => {
        warn!(target, got = fresh.user_id, "Refetched profile is for another user");
        self.patch_profile(target, outcome);
      }
      Err(e) => {
        warn!(target, error = %e, "Profile refetch failed, patching locally");
        self.errors.record(&e);
        self.patch_profile(target, outcome);
      }
    }
  }

  fn patch_profile(&self, target: UserId, outcome: &FollowOutcome) {
    let mut cached = lock(&self.profile);
    let Some(profile) = cached.as_mut().filter(|p| p.user_id == target) else {
      return;
    };

    match outcome {
      FollowOutcome::Followed(edge) => {
        profile.is_following = true;
        profile.followers_count += 1;
        profile.follow_edge_id = Some(edge.id);
      }
      FollowOutcome::Unfollowed => {
        profile.is_following = false;
        profile.followers_count = profile.followers_count.saturating_sub(1);
        profile.follow_edge_id = None;
      }
    }
    debug_assert!(profile.invariant_holds());
  }

  pub async fn fetch_followers(
    &self,
    user_id: UserId,
  ) -> Result<Vec<FollowProfileView>, FeedError> {
    let token = self.require_token()?;
    let followers = self
      .gateway
      .list_followers(&token, user_id)
      .await
      .map_err(|e| self.fail(e))?;

    lock(&self.follow_lists).followers = followers.clone();
    Ok(followers)
  }

  pub async fn fetch_following(
    &self,
    user_id: UserId,
  ) -> Result<Vec<FollowProfileView>, FeedError> {
    let token = self.require_token()?;
    let following = self
      .gateway
      .list_following(&token, user_id)
      .await
      .map_err(|e| self.fail(e))?;

    lock(&self.follow_lists).following = following.clone();
    Ok(following)
  }

  /// Fetch both lists concurrently; either failure fails the whole call.
  pub async fn load_follow_lists(&self, user_id: UserId) -> Result<(), FeedError> {
    futures::try_join!(self.fetch_followers(user_id), self.fetch_following(user_id))?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::super::fake::{profile, Call, FakeGateway};
  use super::super::types::SessionToken;
  use super::*;

  fn signed_in(gateway: FakeGateway) -> FeedCache<FakeGateway> {
    let cache = FeedCache::new(gateway, 10);
    cache.sign_in(SessionToken::new("t0k3n"));
    cache
  }

  fn edge(id: FollowEdgeId, following_id: UserId) -> FollowEdge {
    FollowEdge {
      id,
      follower_id: Some(1),
      following_id,
    }
  }

  /// Put a profile in the cache with an empty username so toggles patch locally
  async fn cache_profile_without_username(
    cache: &FeedCache<FakeGateway>,
    view: FollowProfileView,
  ) {
    cache.gateway.push_profile(Ok(FollowProfileView {
      username: String::new(),
      ..view
    }));
    cache.fetch_profile("anyone").await.unwrap();
  }

  #[tokio::test]
  async fn test_unfollow_patches_locally() {
    let cache = signed_in(FakeGateway::default());
    cache_profile_without_username(&cache, profile(9, Some(3), 5)).await;

    let outcome = cache.toggle_follow(9, Some(3)).await.unwrap();

    assert_eq!(outcome, FollowOutcome::Unfollowed);
    let view = cache.profile().unwrap();
    assert!(!view.is_following);
    assert_eq!(view.follow_edge_id, None);
    assert_eq!(view.followers_count, 4);
    assert!(view.invariant_holds());
    assert!(cache.gateway.calls().contains(&Call::DeleteFollow(3)));
  }

  #[tokio::test]
  async fn test_unfollow_count_floors_at_zero() {
    let cache = signed_in(FakeGateway::default());
    cache_profile_without_username(&cache, profile(9, Some(3), 0)).await;

    cache.toggle_follow(9, Some(3)).await.unwrap();
    assert_eq!(cache.profile().unwrap().followers_count, 0);
  }

  #[tokio::test]
  async fn test_follow_patches_edge_id() {
    let gateway = FakeGateway::default();
    gateway.push_follow(Ok(edge(12, 9)));
    let cache = signed_in(gateway);
    cache_profile_without_username(&cache, profile(9, None, 2)).await;

    let outcome = cache.toggle_follow(9, None).await.unwrap();

    assert!(outcome.is_following());
    let view = cache.profile().unwrap();
    assert!(view.is_following);
    assert_eq!(view.follow_edge_id, Some(12));
    assert_eq!(view.followers_count, 3);
  }

  #[tokio::test]
  async fn test_follow_refetches_when_username_known() {
    let gateway = FakeGateway::default();
    gateway.push_profile(Ok(profile(9, None, 2)));
    gateway.push_follow(Ok(edge(12, 9)));
    gateway.push_profile(Ok(profile(9, Some(12), 7)));
    let cache = signed_in(gateway);
    cache.fetch_profile("user9").await.unwrap();

    cache.toggle_follow(9, None).await.unwrap();

    // Server count, not a local +1
    assert_eq!(cache.profile().unwrap(), profile(9, Some(12), 7));
    let profile_calls = cache
      .gateway
      .calls()
      .into_iter()
      .filter(|c| matches!(c, Call::GetProfile(_)))
      .count();
    assert_eq!(profile_calls, 2);
  }

  #[tokio::test]
  async fn test_failed_refetch_falls_back_to_patch() {
    let gateway = FakeGateway::default();
    gateway.push_profile(Ok(profile(9, Some(3), 5)));
    gateway.push_profile(Err(FeedError::NetworkUnreachable("lost".to_string())));
    let cache = signed_in(gateway);
    cache.fetch_profile("user9").await.unwrap();

    cache.toggle_follow(9, Some(3)).await.unwrap();

    let view = cache.profile().unwrap();
    assert!(view.invariant_holds());
    assert_eq!(view.followers_count, 4);
    assert!(cache.last_error().is_some());
  }

  #[tokio::test]
  async fn test_failed_toggle_leaves_profile_identical() {
    let gateway = FakeGateway::default();
    gateway.push_profile(Ok(profile(9, Some(3), 5)));
    gateway.push_delete(Err(FeedError::Server {
      status: 500,
      message: "nope".to_string(),
    }));
    let cache = signed_in(gateway);
    cache.fetch_profile("user9").await.unwrap();
    let before = cache.profile();

    assert!(cache.toggle_follow(9, Some(3)).await.is_err());

    assert_eq!(cache.profile(), before);
    assert!(cache.last_error().is_some());
  }

  #[tokio::test]
  async fn test_failed_follow_leaves_profile_identical() {
    let gateway = FakeGateway::default();
    gateway.push_profile(Ok(profile(9, None, 2)));
    gateway.push_follow(Err(FeedError::Validation {
      message: "Already following.".to_string(),
      field_errors: Default::default(),
    }));
    let cache = signed_in(gateway);
    cache.fetch_profile("user9").await.unwrap();
    let before = cache.profile();

    assert!(cache.toggle_follow(9, None).await.is_err());

    assert_eq!(cache.profile(), before);
    assert!(cache.gateway.calls().contains(&Call::CreateFollow(9)));
    assert_eq!(
      cache.last_error().map(|e| e.to_string()),
      Some("Already following.".to_string())
    );
  }

  #[tokio::test]
  async fn test_other_users_profile_untouched() {
    let gateway = FakeGateway::default();
    gateway.push_follow(Ok(edge(12, 4)));
    let cache = signed_in(gateway);
    cache_profile_without_username(&cache, profile(9, None, 2)).await;
    let before = cache.profile();

    cache.toggle_follow(4, None).await.unwrap();
    assert_eq!(cache.profile(), before);
  }

  #[tokio::test]
  async fn test_toggle_requires_token() {
    let cache = FeedCache::new(FakeGateway::default(), 10);
    assert_eq!(
      cache.toggle_follow(9, None).await.unwrap_err(),
      FeedError::Unauthenticated
    );
    assert!(cache.gateway.calls().is_empty());
  }

  #[tokio::test]
  async fn test_missing_profile_is_empty_state() {
    let gateway = FakeGateway::default();
    gateway.push_profile(Err(FeedError::NotFound("no profile".to_string())));
    let cache = signed_in(gateway);

    assert_eq!(cache.fetch_profile("ghost").await.unwrap(), None);
    assert!(cache.profile().is_none());
    assert!(cache.last_error().is_none());
  }

  #[tokio::test]
  async fn test_load_follow_lists() {
    let gateway = FakeGateway::default();
    gateway.push_user_list(Ok(vec![profile(2, None, 0), profile(3, None, 0)]));
    gateway.push_user_list(Ok(vec![profile(4, Some(8), 1)]));
    let cache = signed_in(gateway);

    cache.load_follow_lists(1).await.unwrap();

    let lists = cache.follow_lists();
    assert_eq!(lists.followers.len(), 2);
    assert_eq!(lists.following.len(), 1);
  }
}
