use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::forest;
use crate::{CommentId, ProjectId, UserId};

/// One user-authored message attached to a project.
///
/// `replies` is never read from the wire. It is filled in by
/// [`build_forest`](crate::build_forest) and serialized so a built forest can
/// be emitted as nested JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    pub author_id: UserId,
    pub author_name: String,
    #[serde(default)]
    pub author_avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub like_count: u32,
    #[serde(default)]
    pub liked_by_current_user: bool,
    #[serde(default, deserialize_with = "deserialize_parent_id")]
    pub parent_comment_id: Option<CommentId>,
    #[serde(default, skip_deserializing)]
    pub replies: Vec<Comment>,
}

/// Some backends send `""` instead of `null` for root comments.
fn deserialize_parent_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<CommentId>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        Some(s) if !s.trim().is_empty() => s.parse().map(Some).map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

/// The like delta actually applied by an optimistic toggle, kept so the
/// exact inverse can be applied if the write fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LikeChange {
    pub(crate) delta: i64,
    pub(crate) previous_liked: bool,
}

impl Comment {
    pub fn is_root(&self) -> bool {
        self.parent_comment_id.is_none()
    }

    /// Copy of this comment with no replies attached.
    pub(crate) fn detached(&self) -> Comment {
        Comment {
            id: self.id.clone(),
            content: self.content.clone(),
            author_id: self.author_id.clone(),
            author_name: self.author_name.clone(),
            author_avatar_url: self.author_avatar_url.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            like_count: self.like_count,
            liked_by_current_user: self.liked_by_current_user,
            parent_comment_id: self.parent_comment_id.clone(),
            replies: Vec::new(),
        }
    }

    /// Count and flag always move together. Unliking a comment at zero
    /// applies a zero delta rather than wrapping.
    pub(crate) fn apply_like(&mut self, like: bool) -> LikeChange {
        let before = self.like_count;
        let previous_liked = self.liked_by_current_user;
        self.like_count = if like {
            before.saturating_add(1)
        } else {
            before.saturating_sub(1)
        };
        self.liked_by_current_user = like;
        LikeChange {
            delta: i64::from(self.like_count) - i64::from(before),
            previous_liked,
        }
    }

    pub(crate) fn revert_like(&mut self, change: LikeChange) {
        let reverted = (i64::from(self.like_count) - change.delta).max(0);
        self.like_count = u32::try_from(reverted).unwrap_or(u32::MAX);
        self.liked_by_current_user = change.previous_liked;
    }

    /// Adopt the server's like state for this comment.
    pub(crate) fn reconcile_like(&mut self, server: &Comment) {
        self.like_count = server.like_count;
        self.liked_by_current_user = server.liked_by_current_user;
    }
}

/// Payload for creating a comment or a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub content: String,
    pub project_id: ProjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_comment_id: Option<CommentId>,
}

impl NewComment {
    pub fn new(project_id: ProjectId, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            project_id,
            parent_comment_id: None,
        }
    }

    pub fn reply_to(project_id: ProjectId, parent: CommentId, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            project_id,
            parent_comment_id: Some(parent),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentEdit {
    pub comment_id: CommentId,
    pub content: String,
}

/// The published state: a project's root comments with nested replies.
///
/// `project_id` is `None` until the first successful load.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentForest {
    pub project_id: Option<ProjectId>,
    pub roots: Vec<Comment>,
}

impl CommentForest {
    pub fn new(project_id: ProjectId, roots: Vec<Comment>) -> Self {
        Self {
            project_id: Some(project_id),
            roots,
        }
    }

    /// Finds a comment at any depth.
    pub fn find(&self, comment_id: &CommentId) -> Option<&Comment> {
        let path = forest::find_path(&self.roots, comment_id)?;
        forest::get_by_path(&self.roots, &path)
    }

    /// Total number of comments, roots and replies.
    pub fn len(&self) -> usize {
        self.iter_depth_first().count()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Walks every thread in display order, yielding `(depth, comment)`
    /// with roots at depth 0.
    pub fn iter_depth_first(&self) -> DepthFirst<'_> {
        DepthFirst::new(&self.roots)
    }
}

/// Pre-order traversal over a slice of comment trees.
pub struct DepthFirst<'a> {
    stack: Vec<(usize, &'a Comment)>,
}

impl<'a> DepthFirst<'a> {
    pub fn new(roots: &'a [Comment]) -> Self {
        Self {
            stack: roots.iter().rev().map(|c| (0, c)).collect(),
        }
    }
}

impl<'a> Iterator for DepthFirst<'a> {
    type Item = (usize, &'a Comment);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, comment) = self.stack.pop()?;
        self.stack
            .extend(comment.replies.iter().rev().map(|reply| (depth + 1, reply)));
        Some((depth, comment))
    }
}
