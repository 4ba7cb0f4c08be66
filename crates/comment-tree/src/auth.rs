use crate::UserId;

/// The signed-in user on whose behalf mutations are made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub display_name: String,
}

impl Actor {
    pub fn new(user_id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
        }
    }
}

/// Authentication state handed to a [`CommentTreeStore`](crate::CommentTreeStore).
///
/// The store never looks anywhere else for the current user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    actor: Option<Actor>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self { actor: None }
    }

    pub fn authenticated(actor: Actor) -> Self {
        Self { actor: Some(actor) }
    }

    pub fn actor(&self) -> Option<&Actor> {
        self.actor.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.actor.is_some()
    }
}

impl From<Option<Actor>> for AuthContext {
    fn from(actor: Option<Actor>) -> Self {
        Self { actor }
    }
}
