use crate::model::{Comment, CommentEdit, NewComment};
use crate::{CommentId, ProjectId, Result};

/// Remote comment read/write collaborator.
///
/// Implementations return payloads already unwrapped from any transport
/// envelope, and map failures onto [`Error`](crate::Error):
/// `NetworkFailure` when no response arrived, `RemoteRejected` when the
/// server answered with a failure.
#[async_trait::async_trait]
pub trait CommentApi: Send + Sync {
    /// Flat, unordered-by-parent list of every comment on a project.
    async fn list_comments(&self, project_id: &ProjectId) -> Result<Vec<Comment>>;

    async fn create_comment(&self, comment: &NewComment) -> Result<Comment>;

    /// Returns the comment with the authoritative like count.
    async fn like_comment(&self, comment_id: &CommentId) -> Result<Comment>;

    /// Returns the comment with the authoritative like count.
    async fn unlike_comment(&self, comment_id: &CommentId) -> Result<Comment>;

    async fn update_comment(&self, edit: &CommentEdit) -> Result<Comment>;

    async fn delete_comment(&self, comment_id: &CommentId) -> Result<()>;
}
