mod api;
mod auth;
mod forest;
#[cfg(feature = "http")]
mod http;
mod model;
mod store;

pub use api::CommentApi;
pub use auth::{Actor, AuthContext};
pub use forest::{MAX_REPLY_DEPTH, build_forest};
#[cfg(feature = "http")]
pub use http::HttpCommentApi;
pub use model::{Comment, CommentEdit, CommentForest, DepthFirst, NewComment};
pub use rtrack_types::{CommentId, ProjectId, UserId};
pub use store::CommentTreeStore;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Not signed in: this action requires an authenticated user")]
    Unauthenticated,
    #[error("Network failure: {message}")]
    NetworkFailure { message: String },
    #[error("Request rejected by server: {message}")]
    RemoteRejected {
        status: Option<u16>,
        message: String,
    },
    #[error("Comment not found: {comment_id}")]
    NotFound { comment_id: CommentId },
    #[error("Comment store has been disposed")]
    Disposed,
    #[error("Failed to decode response: {message}")]
    Decode { message: String },
    #[error("Invalid API base URL {url}: {message}")]
    InvalidBaseUrl { url: String, message: String },
}

impl Error {
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkFailure {
            message: message.into(),
        }
    }

    pub fn rejected(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::RemoteRejected {
            status,
            message: message.into(),
        }
    }

    /// Only transport failures are worth retrying. Nothing in this crate
    /// retries on its own; adapters decide.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkFailure { .. })
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
