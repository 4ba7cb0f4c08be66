use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{broadcast, watch};

use crate::api::CommentApi;
use crate::auth::{Actor, AuthContext};
use crate::forest;
use crate::model::{Comment, CommentEdit, CommentForest, LikeChange, NewComment};
use crate::{CommentId, Error, ProjectId, Result};

const ERROR_CHANNEL_CAPACITY: usize = 16;

/// Owns the comment forest of one project and mediates every mutation.
///
/// The forest is published through a `watch` channel: subscribers get the
/// latest forest as soon as they subscribe and every later change. Snapshots
/// are shared `Arc`s; mutations copy on write, so a snapshot a consumer holds
/// never changes underneath it.
///
/// - `refresh` replaces the forest wholesale. A failed refresh leaves the
///   published forest untouched and reports the error on the error channel.
/// - `post`, `update` and `remove` write first and refresh after success. The
///   server assigns ids and ordering, so nothing is inserted locally.
/// - `toggle_like` is optimistic: the count and flag change immediately and
///   are rolled back if the write fails.
///
/// Each refresh takes a ticket when it starts. A response is published only if
/// its ticket is newer than the one behind the current forest, so an older
/// request resolving late never overwrites a newer result.
///
/// After [`dispose`](Self::dispose) nothing is published again. Requests
/// already in flight still complete and their result goes back to the caller,
/// but the store's state is left alone.
pub struct CommentTreeStore {
    api: Arc<dyn CommentApi>,
    state: Mutex<StoreState>,
}

struct StoreState {
    auth: AuthContext,
    active_project: Option<ProjectId>,
    issued_ticket: u64,
    published_ticket: u64,
    /// `None` once disposed.
    channels: Option<Channels>,
}

struct Channels {
    forest: watch::Sender<Arc<CommentForest>>,
    errors: broadcast::Sender<Error>,
}

impl StoreState {
    fn channels(&self) -> Result<&Channels> {
        self.channels.as_ref().ok_or(Error::Disposed)
    }

    /// Edits one comment of the published forest in place and notifies
    /// subscribers. Subscribers are not woken when the comment is missing.
    fn modify_comment<T>(
        &self,
        comment_id: &CommentId,
        edit: impl FnOnce(&mut Comment) -> T,
    ) -> Result<T> {
        let channels = self.channels()?;
        let mut outcome = Err(Error::NotFound {
            comment_id: comment_id.clone(),
        });
        channels.forest.send_if_modified(|published| {
            let Some(path) = forest::find_path(&published.roots, comment_id) else {
                return false;
            };
            let roots = &mut Arc::make_mut(published).roots;
            let Some(comment) = forest::get_mut_by_path(roots, &path) else {
                return false;
            };
            outcome = Ok(edit(comment));
            true
        });
        outcome
    }
}

impl CommentTreeStore {
    pub fn new(api: Arc<dyn CommentApi>, auth: AuthContext) -> Self {
        let (forest_tx, _) = watch::channel(Arc::new(CommentForest::default()));
        let (errors_tx, _) = broadcast::channel(ERROR_CHANNEL_CAPACITY);
        Self {
            api,
            state: Mutex::new(StoreState {
                auth,
                active_project: None,
                issued_ticket: 0,
                published_ticket: 0,
                channels: Some(Channels {
                    forest: forest_tx,
                    errors: errors_tx,
                }),
            }),
        }
    }

    /// The guarded state is only ever updated by plain assignments, so a
    /// poisoned lock still holds consistent data.
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Switches context. Does not fetch anything.
    pub fn set_active_project(&self, project_id: ProjectId) {
        log::debug!("active project set to {}", project_id);
        self.lock().active_project = Some(project_id);
    }

    pub fn active_project(&self) -> Option<ProjectId> {
        self.lock().active_project.clone()
    }

    pub fn set_auth_context(&self, auth: AuthContext) {
        self.lock().auth = auth;
    }

    pub fn auth_context(&self) -> AuthContext {
        self.lock().auth.clone()
    }

    /// Live forest stream. The receiver starts at the latest published forest.
    pub fn subscribe(&self) -> Result<watch::Receiver<Arc<CommentForest>>> {
        Ok(self.lock().channels()?.forest.subscribe())
    }

    /// Refresh failures, including the ones from the refresh that follows a
    /// successful write.
    pub fn subscribe_errors(&self) -> Result<broadcast::Receiver<Error>> {
        Ok(self.lock().channels()?.errors.subscribe())
    }

    pub fn snapshot(&self) -> Result<Arc<CommentForest>> {
        Ok(self.lock().channels()?.forest.borrow().clone())
    }

    pub fn is_disposed(&self) -> bool {
        self.lock().channels.is_none()
    }

    /// Closes both channels. Receivers see the sender go away; results that
    /// arrive later are dropped.
    pub fn dispose(&self) {
        if self.lock().channels.take().is_some() {
            log::debug!("comment store disposed");
        }
    }

    /// Fetches the flat comment list for `project_id`, builds the forest and
    /// publishes it.
    pub async fn refresh(&self, project_id: &ProjectId) -> Result<()> {
        let ticket = {
            let mut state = self.lock();
            state.channels()?;
            state.issued_ticket += 1;
            state.issued_ticket
        };
        log::debug!("refreshing comments for {} (ticket {})", project_id, ticket);

        match self.api.list_comments(project_id).await {
            Ok(comments) => {
                let roots = forest::build_forest(&comments);
                self.publish(project_id, ticket, roots);
                Ok(())
            }
            Err(err) => {
                log::error!("failed to load comments for {}: {}", project_id, err);
                self.report_refresh_error(&err);
                Err(err)
            }
        }
    }

    fn publish(&self, project_id: &ProjectId, ticket: u64, roots: Vec<Comment>) {
        let mut state = self.lock();
        let Some(channels) = state.channels.as_ref() else {
            log::debug!("store disposed, dropping comments for {}", project_id);
            return;
        };
        if ticket <= state.published_ticket {
            log::debug!(
                "dropping stale comments for {} (ticket {}, showing {})",
                project_id,
                ticket,
                state.published_ticket
            );
            return;
        }
        let loaded = CommentForest::new(project_id.clone(), roots);
        log::debug!(
            "publishing {} comment(s) in {} thread(s) for {}",
            loaded.len(),
            loaded.roots.len(),
            project_id
        );
        channels.forest.send_replace(Arc::new(loaded));
        state.published_ticket = ticket;
    }

    fn report_refresh_error(&self, err: &Error) {
        let state = self.lock();
        if let Some(channels) = state.channels.as_ref() {
            // No receivers is fine: the caller still gets the error.
            let _ = channels.errors.send(err.clone());
        }
    }

    /// Creates a comment, then reloads its project.
    ///
    /// Fails with [`Error::Unauthenticated`] before any request when nobody is
    /// signed in.
    pub async fn post(&self, comment: NewComment) -> Result<Comment> {
        let actor = self.authorize()?;
        log::debug!("{} posting on {}", actor.user_id, comment.project_id);

        let created = self
            .api
            .create_comment(&comment)
            .await
            .inspect_err(|err| log::error!("failed to post comment: {}", err))?;
        log::info!("posted comment {} on {}", created.id, comment.project_id);

        self.refresh_after_write(&comment.project_id).await;
        Ok(created)
    }

    /// Optimistically likes or unlikes a comment anywhere in the forest.
    ///
    /// The change is visible to subscribers before the request is sent. On
    /// success the server's count is adopted; on failure the exact delta that
    /// was applied is reverted before the error is returned. A comment that is
    /// not in the current forest is left alone and no request is made.
    pub async fn toggle_like(&self, comment_id: &CommentId, like: bool) -> Result<()> {
        let actor = self.authorize()?;
        let (change, ticket) = {
            let state = self.lock();
            match state.modify_comment(comment_id, |comment| comment.apply_like(like)) {
                Ok(change) => (change, state.published_ticket),
                Err(Error::NotFound { .. }) => {
                    log::debug!("comment {} not in forest, ignoring like toggle", comment_id);
                    return Ok(());
                }
                Err(err) => return Err(err),
            }
        };
        log::debug!(
            "{} set like={} on {} (pending)",
            actor.user_id,
            like,
            comment_id
        );

        let result = if like {
            self.api.like_comment(comment_id).await
        } else {
            self.api.unlike_comment(comment_id).await
        };

        match result {
            Ok(server) => {
                let reconciled = self
                    .lock()
                    .modify_comment(comment_id, |comment| comment.reconcile_like(&server));
                if let Err(err) = reconciled {
                    log::debug!("like on {} confirmed but not applied: {}", comment_id, err);
                }
                log::info!(
                    "like={} on {} confirmed, count {}",
                    like,
                    comment_id,
                    server.like_count
                );
                Ok(())
            }
            Err(err) => {
                log::warn!("like={} on {} failed, rolling back: {}", like, comment_id, err);
                self.rollback_like(comment_id, change, ticket);
                Err(err)
            }
        }
    }

    fn rollback_like(&self, comment_id: &CommentId, change: LikeChange, ticket: u64) {
        let state = self.lock();
        if state.published_ticket != ticket {
            // The forest was reloaded from the server while the write was in
            // flight; the optimistic change is already gone.
            log::debug!("forest reloaded since like on {}, nothing to roll back", comment_id);
            return;
        }
        if let Err(err) = state.modify_comment(comment_id, |comment| comment.revert_like(change)) {
            log::debug!("rollback of like on {} skipped: {}", comment_id, err);
        }
    }

    /// Changes a comment's content, then reloads the active project.
    pub async fn update(
        &self,
        comment_id: &CommentId,
        content: impl Into<String>,
    ) -> Result<Comment> {
        self.authorize()?;
        let edit = CommentEdit {
            comment_id: comment_id.clone(),
            content: content.into(),
        };

        let updated = self
            .api
            .update_comment(&edit)
            .await
            .inspect_err(|err| log::error!("failed to update comment {}: {}", comment_id, err))?;
        log::info!("updated comment {}", comment_id);

        self.refresh_active_project().await;
        Ok(updated)
    }

    /// Deletes a comment, then reloads the active project.
    pub async fn remove(&self, comment_id: &CommentId) -> Result<()> {
        self.authorize()?;

        self.api
            .delete_comment(comment_id)
            .await
            .inspect_err(|err| log::error!("failed to delete comment {}: {}", comment_id, err))?;
        log::info!("deleted comment {}", comment_id);

        self.refresh_active_project().await;
        Ok(())
    }

    fn authorize(&self) -> Result<Actor> {
        let state = self.lock();
        state.channels()?;
        state.auth.actor().cloned().ok_or_else(|| {
            log::warn!("rejecting comment mutation: no signed-in user");
            Error::Unauthenticated
        })
    }

    async fn refresh_active_project(&self) {
        let Some(project_id) = self.active_project() else {
            log::debug!("no active project, skipping refresh");
            return;
        };
        self.refresh_after_write(&project_id).await;
    }

    /// The write already succeeded; a failed reload only goes to the error
    /// channel.
    async fn refresh_after_write(&self, project_id: &ProjectId) {
        if self.is_disposed() {
            log::debug!("store disposed, skipping refresh of {}", project_id);
            return;
        }
        if let Err(err) = self.refresh(project_id).await {
            log::debug!("refresh after write failed for {}: {}", project_id, err);
        }
    }
}
