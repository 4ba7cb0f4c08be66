mod id;

pub use id::{CommentId, InvalidIdError, ProjectId, UserId};
