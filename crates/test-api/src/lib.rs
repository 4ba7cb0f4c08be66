use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{TimeZone, Utc};
use comment_tree::{Comment, CommentApi, CommentEdit, Error, NewComment, Result};
use rtrack_types::{CommentId, ProjectId, UserId};
use tokio::sync::oneshot;

/// The calls a [`FakeCommentApi`] can be told to fail or hold back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Create,
    Like,
    Unlike,
    Update,
    Delete,
}

/// In-memory comment backend for store tests.
///
/// Comments are kept flat per project in insertion order, the way the real
/// backend returns them. Tests can queue failures per operation with
/// [`fail_next`](Self::fail_next) and hold a call until they release it with
/// [`gate_next`](Self::gate_next). A gated `List` call snapshots the data when
/// it is made, not when it is released, so it can deliver stale results.
pub struct FakeCommentApi {
    state: Mutex<FakeState>,
    author_id: UserId,
    author_name: String,
}

#[derive(Default)]
struct FakeState {
    projects: HashMap<ProjectId, Vec<Comment>>,
    failures: HashMap<Operation, VecDeque<Error>>,
    gates: HashMap<Operation, VecDeque<oneshot::Receiver<()>>>,
    calls: HashMap<Operation, usize>,
}

impl FakeState {
    fn find_mut(&mut self, comment_id: &CommentId) -> Option<&mut Comment> {
        self.projects
            .values_mut()
            .flat_map(|comments| comments.iter_mut())
            .find(|comment| &comment.id == comment_id)
    }

    fn contains(&self, project_id: &ProjectId, comment_id: &CommentId) -> bool {
        self.projects
            .get(project_id)
            .is_some_and(|comments| comments.iter().any(|c| &c.id == comment_id))
    }
}

impl Default for FakeCommentApi {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeCommentApi {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
            author_id: user_id("u-test"),
            author_name: "Test User".to_string(),
        }
    }

    pub fn with_comments(self, project: &str, comments: Vec<Comment>) -> Self {
        self.lock()
            .projects
            .entry(project_id(project))
            .or_default()
            .extend(comments);
        self
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a comment directly to the backend, bypassing any store.
    pub fn insert(&self, project: &str, comment: Comment) {
        self.lock()
            .projects
            .entry(project_id(project))
            .or_default()
            .push(comment);
    }

    /// Changes a stored comment behind the store's back, e.g. likes from
    /// other users. Returns `false` when the comment does not exist.
    pub fn modify(&self, comment: &str, edit: impl FnOnce(&mut Comment)) -> bool {
        match self.lock().find_mut(&comment_id(comment)) {
            Some(stored) => {
                edit(stored);
                true
            }
            None => false,
        }
    }

    pub fn comments(&self, project: &str) -> Vec<Comment> {
        self.lock()
            .projects
            .get(&project_id(project))
            .cloned()
            .unwrap_or_default()
    }

    pub fn find(&self, comment: &str) -> Option<Comment> {
        self.lock().find_mut(&comment_id(comment)).cloned()
    }

    /// The next call of `operation` fails with `error`. Calls queue up.
    pub fn fail_next(&self, operation: Operation, error: Error) {
        self.lock()
            .failures
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// The next call of `operation` waits until the returned sender fires or
    /// is dropped.
    pub fn gate_next(&self, operation: Operation) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.lock().gates.entry(operation).or_default().push_back(rx);
        tx
    }

    pub fn calls(&self, operation: Operation) -> usize {
        self.lock().calls.get(&operation).copied().unwrap_or(0)
    }

    fn begin(&self, operation: Operation) -> (Option<Error>, Option<oneshot::Receiver<()>>) {
        let mut state = self.lock();
        *state.calls.entry(operation).or_default() += 1;
        let failure = state
            .failures
            .get_mut(&operation)
            .and_then(VecDeque::pop_front);
        let gate = state.gates.get_mut(&operation).and_then(VecDeque::pop_front);
        (failure, gate)
    }

    async fn pass(gate: Option<oneshot::Receiver<()>>) {
        if let Some(gate) = gate {
            // A dropped sender releases the call too.
            let _ = gate.await;
        }
    }

    async fn settle(&self, operation: Operation) -> Result<()> {
        let (failure, gate) = self.begin(operation);
        Self::pass(gate).await;
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn not_found(comment_id: &CommentId) -> Error {
    Error::rejected(Some(404), format!("comment {comment_id} not found"))
}

#[async_trait::async_trait]
impl CommentApi for FakeCommentApi {
    async fn list_comments(&self, project_id: &ProjectId) -> Result<Vec<Comment>> {
        let (failure, gate) = self.begin(Operation::List);
        let snapshot = self
            .lock()
            .projects
            .get(project_id)
            .cloned()
            .unwrap_or_default();
        Self::pass(gate).await;
        match failure {
            Some(err) => Err(err),
            None => Ok(snapshot),
        }
    }

    async fn create_comment(&self, comment: &NewComment) -> Result<Comment> {
        self.settle(Operation::Create).await?;
        let mut state = self.lock();
        if let Some(parent) = &comment.parent_comment_id {
            if !state.contains(&comment.project_id, parent) {
                return Err(not_found(parent));
            }
        }
        let now = Utc::now();
        let created = Comment {
            id: comment_id(&uuid::Uuid::new_v4().to_string()),
            content: comment.content.clone(),
            author_id: self.author_id.clone(),
            author_name: self.author_name.clone(),
            author_avatar_url: None,
            created_at: now,
            updated_at: now,
            like_count: 0,
            liked_by_current_user: false,
            parent_comment_id: comment.parent_comment_id.clone(),
            replies: Vec::new(),
        };
        state
            .projects
            .entry(comment.project_id.clone())
            .or_default()
            .push(created.clone());
        log::debug!("fake api created {}", created.id);
        Ok(created)
    }

    async fn like_comment(&self, comment_id: &CommentId) -> Result<Comment> {
        self.settle(Operation::Like).await?;
        let mut state = self.lock();
        let comment = state.find_mut(comment_id).ok_or_else(|| not_found(comment_id))?;
        if !comment.liked_by_current_user {
            comment.like_count += 1;
            comment.liked_by_current_user = true;
        }
        Ok(comment.clone())
    }

    async fn unlike_comment(&self, comment_id: &CommentId) -> Result<Comment> {
        self.settle(Operation::Unlike).await?;
        let mut state = self.lock();
        let comment = state.find_mut(comment_id).ok_or_else(|| not_found(comment_id))?;
        if comment.liked_by_current_user {
            comment.like_count = comment.like_count.saturating_sub(1);
            comment.liked_by_current_user = false;
        }
        Ok(comment.clone())
    }

    async fn update_comment(&self, edit: &CommentEdit) -> Result<Comment> {
        self.settle(Operation::Update).await?;
        let mut state = self.lock();
        let comment = state
            .find_mut(&edit.comment_id)
            .ok_or_else(|| not_found(&edit.comment_id))?;
        comment.content = edit.content.clone();
        comment.updated_at = Utc::now();
        Ok(comment.clone())
    }

    async fn delete_comment(&self, comment_id: &CommentId) -> Result<()> {
        self.settle(Operation::Delete).await?;
        let mut state = self.lock();
        for comments in state.projects.values_mut() {
            if let Some(position) = comments.iter().position(|c| &c.id == comment_id) {
                comments.remove(position);
                return Ok(());
            }
        }
        Err(not_found(comment_id))
    }
}

pub fn project_id(id: &str) -> ProjectId {
    id.parse().unwrap()
}

pub fn comment_id(id: &str) -> CommentId {
    id.parse().unwrap()
}

pub fn user_id(id: &str) -> UserId {
    id.parse().unwrap()
}

/// A comment as the backend would return it: no replies attached, fixed
/// timestamps, no likes.
pub fn comment(id: &str, parent: Option<&str>) -> Comment {
    let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    Comment {
        id: comment_id(id),
        content: format!("comment {id}"),
        author_id: user_id("u1"),
        author_name: "Ada".to_string(),
        author_avatar_url: None,
        created_at: at,
        updated_at: at,
        like_count: 0,
        liked_by_current_user: false,
        parent_comment_id: parent.map(comment_id),
        replies: Vec::new(),
    }
}
