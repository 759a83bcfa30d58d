use clap::Subcommand;
use color_eyre::{eyre::eyre, Result};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::api::error::FeedError;
use crate::api::FeedGateway;
use crate::feed::tree::{count_nodes, find_node};
use crate::feed::types::{
  CommentId, CommentNode, FollowProfileView, Post, PostId, PostImage, UserId,
};
use crate::feed::{FeedCache, LoadPhase};

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Command {
  /// Show the feed
  Feed {
    /// Number of pages to load
    #[arg(long, default_value_t = 1)]
    pages: u32,
  },
  /// Toggle your like on a post
  Like { post: PostId },
  /// Comment on a post, or reply to a comment with --parent
  Comment {
    post: PostId,
    text: String,
    #[arg(long)]
    parent: Option<CommentId>,
  },
  /// Delete one of your comments
  Uncomment { post: PostId, comment: CommentId },
  /// Publish a new post
  Post {
    text: String,
    #[arg(long)]
    image: Option<PathBuf>,
  },
  /// Delete one of your posts
  DeletePost { post: PostId },
  /// Show a user's profile
  Profile { username: String },
  /// Follow or unfollow a user
  Follow { username: String },
  /// List a user's followers
  Followers { user_id: UserId },
  /// List who a user follows
  Following { user_id: UserId },
}

pub async fn run<G: FeedGateway>(command: Command, cache: &FeedCache<G>) -> Result<()> {
  match command {
    Command::Feed { pages } => {
      let mut result = cache.load_initial().await;
      for _ in 1..pages {
        if result.is_err() || !cache.snapshot().has_more {
          break;
        }
        result = cache.load_more().await;
      }
      for post in cache.posts() {
        println!("{}", render_post(&post));
      }
      let footer = feed_footer(cache.phase(), cache.snapshot().has_more, cache.last_error());
      if let Some(footer) = footer {
        println!("{}", footer);
      }
      result?;
    }
    Command::Like { post } => {
      ensure_cached(cache, post).await?;
      cache.like_post(post).await?;
      if let Some(post) = cache.post(post) {
        let verb = if post.is_liked { "Liked" } else { "Unliked" };
        println!("{} post {} ({} likes)", verb, post.id, post.likes_count);
      }
    }
    Command::Comment { post, text, parent } => {
      ensure_cached(cache, post).await?;
      let comment = cache.create_comment(post, &text, parent).await?;
      println!("Created comment {}", comment.id);
      if let Some(post) = cache.post(post) {
        if let Some(parent) = parent.and_then(|id| find_node(&post.comments, id)) {
          println!("In reply to {}: {}", parent.author.username, parent.content);
        }
        println!("{}", render_post(&post));
      }
    }
    Command::Uncomment { post, comment } => {
      ensure_cached(cache, post).await?;
      cache.delete_comment(post, comment).await?;
      println!("Deleted comment {}", comment);
    }
    Command::Post { text, image } => {
      let image = match image {
        Some(path) => Some(read_image(&path).await?),
        None => None,
      };
      let post = cache.create_post(&text, image.as_ref()).await?;
      println!("Published post {}", post.id);
    }
    Command::DeletePost { post } => {
      cache.delete_post(post).await?;
      println!("Deleted post {}", post);
    }
    Command::Profile { username } => match cache.fetch_profile(&username).await? {
      Some(profile) => println!("{}", render_profile(&profile)),
      None => println!("{} has no profile", username),
    },
    Command::Follow { username } => {
      let profile = cache
        .fetch_profile(&username)
        .await?
        .ok_or_else(|| eyre!("No profile for {}", username))?;

      let outcome = cache.toggle_follow(profile.user_id, profile.follow_edge_id).await?;
      if outcome.is_following() {
        println!("Now following {}", username);
      } else {
        println!("Unfollowed {}", username);
      }
      if let Some(profile) = cache.profile() {
        println!("{}", render_profile(&profile));
      }
    }
    Command::Followers { user_id } => {
      cache.load_follow_lists(user_id).await?;
      for user in cache.follow_lists().followers {
        println!("{}", render_profile(&user));
      }
    }
    Command::Following { user_id } => {
      cache.load_follow_lists(user_id).await?;
      for user in cache.follow_lists().following {
        println!("{}", render_profile(&user));
      }
    }
  }

  Ok(())
}

/// Load pages until `post_id` is cached or the feed runs out.
async fn ensure_cached<G: FeedGateway>(cache: &FeedCache<G>, post_id: PostId) -> Result<()> {
  cache.load_initial().await?;
  while cache.post(post_id).is_none() {
    if !cache.snapshot().has_more {
      return Err(eyre!("Post {} is not in the feed", post_id));
    }
    cache.load_more().await?;
  }
  Ok(())
}

async fn read_image(path: &Path) -> Result<PostImage> {
  let bytes = tokio::fs::read(path)
    .await
    .map_err(|e| eyre!("Failed to read image {}: {}", path.display(), e))?;
  let file_name = path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_else(|| "image".to_string());

  Ok(PostImage { file_name, bytes })
}

/// Trailing line after the feed listing, if any
fn feed_footer(phase: LoadPhase, has_more: bool, last_error: Option<FeedError>) -> Option<String> {
  match (phase, last_error) {
    (LoadPhase::Error, Some(e)) => Some(format!("(feed stopped: {})", e)),
    (LoadPhase::Error, None) => Some("(feed stopped)".to_string()),
    _ if has_more => Some("(more posts available)".to_string()),
    _ => None,
  }
}

fn render_post(post: &Post) -> String {
  let mut out = format!(
    "#{} {} ({})\n  {}\n  {} {} likes, {} comments",
    post.id,
    post.author.username,
    post.created_at.format("%Y-%m-%d %H:%M"),
    post.content,
    if post.is_liked { "♥" } else { "♡" },
    post.likes_count,
    count_nodes(&post.comments),
  );
  if let Some(url) = &post.image_url {
    let _ = write!(out, "\n  [image] {}", url);
  }
  render_comments(&mut out, &post.comments, 1);
  out
}

fn render_comments(out: &mut String, comments: &[CommentNode], depth: usize) {
  for comment in comments {
    let _ = write!(
      out,
      "\n{}- [{}] {}: {}",
      "  ".repeat(depth),
      comment.id,
      comment.author.username,
      comment.content
    );
    render_comments(out, &comment.replies, depth + 1);
  }
}

fn render_profile(profile: &FollowProfileView) -> String {
  let mut out = format!(
    "{} (id {}) - {} followers, {} following",
    profile.username, profile.user_id, profile.followers_count, profile.following_count
  );
  if profile.is_following {
    out.push_str(" - you follow");
  }
  out
}
