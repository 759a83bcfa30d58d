//! Pure edits over a post's comment forest.
//!
//! Every search walks the forest in one fixed depth-first order: top level left
//! to right, each node's replies before its next sibling. When ids collide the
//! first node in that order wins.

use std::collections::HashSet;
use tracing::warn;

use super::types::{CommentId, CommentNode};

/// Where [`insert_reply`] put the new node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
  TopLevel,
  UnderParent,
  /// The parent was not in the local forest; the node went to the top level
  TopLevelFallback,
}

/// Append `node` under `parent_id`, or at the top level when `parent_id` is `None`.
///
/// A missing parent is a cache-consistency warning, not an error.
pub fn insert_reply(
  forest: &mut Vec<CommentNode>,
  node: CommentNode,
  parent_id: Option<CommentId>,
) -> Placement {
  let Some(parent_id) = parent_id else {
    forest.push(node);
    return Placement::TopLevel;
  };

  match find_node_mut(forest, parent_id) {
    Some(parent) => {
      parent.replies.push(node);
      Placement::UnderParent
    }
    None => {
      warn!(
        parent_id,
        comment_id = node.id,
        "Parent comment not in local cache, appending reply at top level"
      );
      forest.push(node);
      Placement::TopLevelFallback
    }
  }
}

/// Remove the first node with `target_id`, together with its replies.
///
/// Returns false when nothing matched; the forest is then untouched.
pub fn delete_node(forest: &mut Vec<CommentNode>, target_id: CommentId) -> bool {
  if let Some(pos) = forest.iter().position(|n| n.id == target_id) {
    // A match deeper in an earlier sibling comes first in walk order
    for node in &mut forest[..pos] {
      if delete_node(&mut node.replies, target_id) {
        return true;
      }
    }
    forest.remove(pos);
    return true;
  }

  forest
    .iter_mut()
    .any(|node| delete_node(&mut node.replies, target_id))
}

pub fn find_node(forest: &[CommentNode], id: CommentId) -> Option<&CommentNode> {
  for node in forest {
    if node.id == id {
      return Some(node);
    }
    if let Some(found) = find_node(&node.replies, id) {
      return Some(found);
    }
  }
  None
}

fn find_node_mut(forest: &mut [CommentNode], id: CommentId) -> Option<&mut CommentNode> {
  for node in forest {
    if node.id == id {
      return Some(node);
    }
    if let Some(found) = find_node_mut(&mut node.replies, id) {
      return Some(found);
    }
  }
  None
}

/// Total number of nodes at every depth
pub fn count_nodes(forest: &[CommentNode]) -> usize {
  forest
    .iter()
    .map(|node| 1 + count_nodes(&node.replies))
    .sum()
}

/// Ids that occur more than once, in walk order of their second occurrence
pub fn duplicate_ids(forest: &[CommentNode]) -> Vec<CommentId> {
  fn walk(forest: &[CommentNode], seen: &mut HashSet<CommentId>, dups: &mut Vec<CommentId>) {
    for node in forest {
      if !seen.insert(node.id) {
        dups.push(node.id);
      }
      walk(&node.replies, seen, dups);
    }
  }

  let mut seen = HashSet::new();
  let mut dups = Vec::new();
  walk(forest, &mut seen, &mut dups);
  dups
}
