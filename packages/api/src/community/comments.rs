//! # CommentThread
//!
//! Comments of one post, loaded lazily and at most once at a time.
//!
//! - [`CommentThread::open`] fetches only when the thread has not loaded yet
//!   (or the last load failed). A loaded thread is a cache; only mutations
//!   change it.
//! - [`CommentThread::fetch`] keeps a single request in flight; a call while
//!   one is loading returns [`FetchOutcome::InFlight`] without a request.
//! - Adding and deleting go through the [`MutationController`]; rollback is
//!   the exact inverse of the optimistic step: the comment is removed or
//!   reinserted, and the post's `comments_count` is stepped back only if the
//!   optimistic step moved it.
//!
//! Optimistic comments carry negative temporary ids until the server's copy
//! replaces them.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, warn};

use super::feed::Feed;
use super::mutation::{
    acknowledged, Mutation, MutationController, MutationKey, MutationKind, MutationOutcome,
    PendingMutation, Target,
};
use super::notify::ChangeNotifier;
use crate::auth::{Session, SessionStore};
use crate::client::Backend;
use crate::error::{ApiError, MutationFailure};
use crate::models::{Comment, CommentId, PostId};
use crate::timer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadStatus {
    Idle,
    Loading,
    Loaded,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Loaded(Vec<Comment>),
    /// Another fetch for this post was already running; no request was made.
    InFlight,
}

/// Fields an add or delete changes.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentChange {
    /// The owning post's `comments_count`, if the post is in the feed.
    pub comments_count: Option<u32>,
    /// The affected comment and its position, while it is in the thread.
    pub comment: Option<(usize, Comment)>,
}

#[derive(Debug)]
struct ThreadState {
    status: ThreadStatus,
    comments: Vec<Comment>,
    next_temp_id: CommentId,
    in_flight_add: Option<CommentId>,
}

/// Delete affordance check. Presentation only: the server decides.
pub fn can_delete(comment: &Comment, viewer: Option<&Session>) -> bool {
    !comment.is_pending() && viewer.is_some_and(|v| v.subject_id == comment.author_id)
}

pub struct CommentThread<B> {
    post_id: PostId,
    state: Rc<RefCell<ThreadState>>,
    backend: Rc<B>,
    session: SessionStore,
    feed: Feed,
    controller: MutationController,
    notifier: ChangeNotifier,
    request_timeout: Duration,
}

impl<B> Clone for CommentThread<B> {
    fn clone(&self) -> Self {
        Self {
            post_id: self.post_id,
            state: Rc::clone(&self.state),
            backend: Rc::clone(&self.backend),
            session: self.session.clone(),
            feed: self.feed.clone(),
            controller: self.controller.clone(),
            notifier: self.notifier.clone(),
            request_timeout: self.request_timeout,
        }
    }
}

/// Puts a thread back to `Idle` if its fetch future is dropped mid-request.
struct LoadingGuard<'a> {
    state: &'a RefCell<ThreadState>,
    settled: bool,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            let mut state = self.state.borrow_mut();
            if state.status == ThreadStatus::Loading {
                state.status = ThreadStatus::Idle;
            }
        }
    }
}

impl<B: Backend> CommentThread<B> {
    pub(crate) fn new(
        post_id: PostId,
        backend: Rc<B>,
        session: SessionStore,
        feed: Feed,
        controller: MutationController,
        notifier: ChangeNotifier,
        request_timeout: Duration,
    ) -> Self {
        Self {
            post_id,
            state: Rc::new(RefCell::new(ThreadState {
                status: ThreadStatus::Idle,
                comments: Vec::new(),
                next_temp_id: -1,
                in_flight_add: None,
            })),
            backend,
            session,
            feed,
            controller,
            notifier,
            request_timeout,
        }
    }

    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    pub fn status(&self) -> ThreadStatus {
        self.state.borrow().status
    }

    pub fn comments(&self) -> Vec<Comment> {
        self.state.borrow().comments.clone()
    }

    /// Whether the signed-in viewer may be offered a delete for `comment`.
    pub fn viewer_can_delete(&self, comment: &Comment) -> bool {
        can_delete(comment, self.session.current().as_ref())
    }

    pub fn is_adding(&self) -> bool {
        self.controller
            .is_pending(&MutationKey::new(Target::Post(self.post_id), MutationKind::AddComment))
    }

    pub fn is_deleting(&self, comment_id: CommentId) -> bool {
        self.controller.is_pending(&MutationKey::new(
            Target::Comment(comment_id),
            MutationKind::DeleteComment,
        ))
    }

    /// Load the thread unless it is already loaded or loading.
    pub async fn open(&self) -> Result<(), ApiError> {
        match self.status() {
            ThreadStatus::Loaded | ThreadStatus::Loading => {
                debug!(post_id = self.post_id, "comments already loaded or loading");
                Ok(())
            }
            ThreadStatus::Idle | ThreadStatus::Failed => self.fetch().await.map(|_| ()),
        }
    }

    /// Fetch the comments, keeping one request in flight per post.
    pub async fn fetch(&self) -> Result<FetchOutcome, ApiError> {
        if self.status() == ThreadStatus::Loading {
            debug!(post_id = self.post_id, "comment fetch already in flight");
            return Ok(FetchOutcome::InFlight);
        }
        let Some(token) = self.session.credential() else {
            return Err(ApiError::Unauthenticated);
        };

        self.set_status(ThreadStatus::Loading);
        let mut guard = LoadingGuard {
            state: &self.state,
            settled: false,
        };

        let reply = timer::with_timeout(
            self.request_timeout,
            self.backend.get_comments(&token, self.post_id),
        )
        .await;
        guard.settled = true;

        let result = match reply {
            None => Err(ApiError::TimedOut(self.request_timeout)),
            Some(Err(e)) => Err(e),
            Some(Ok(envelope)) => envelope
                .into_result()
                .map(Option::unwrap_or_default)
                .map_err(ApiError::Rejected),
        };

        match result {
            Ok(fetched) => {
                {
                    let mut state = self.state.borrow_mut();
                    let in_flight = state.in_flight_add;
                    let mut comments = fetched;
                    // An add still awaiting the server stays visible.
                    comments.extend(
                        state
                            .comments
                            .iter()
                            .filter(|c| Some(c.id) == in_flight)
                            .cloned(),
                    );
                    state.comments = comments;
                    state.status = ThreadStatus::Loaded;
                }
                debug!(post_id = self.post_id, "comments loaded");
                self.notifier.notify();
                Ok(FetchOutcome::Loaded(self.comments()))
            }
            Err(e) => {
                warn!(post_id = self.post_id, error = %e, "loading comments failed");
                self.set_status(ThreadStatus::Failed);
                Err(e)
            }
        }
    }

    /// Post a comment, showing it immediately.
    ///
    /// Commits with the server's copy of the comment when it sends one back.
    pub async fn add_comment(&self, content: &str) -> MutationOutcome<Option<Comment>> {
        let content = content.trim();
        if content.is_empty() {
            return MutationOutcome::NotApplied(MutationFailure::InvalidInput(
                "comment is empty".to_string(),
            ));
        }

        let author = self.session.current();
        self.controller
            .submit(AddComment {
                thread: self.clone(),
                content: content.to_string(),
                author_id: author.as_ref().map(|s| s.subject_id.clone()).unwrap_or_default(),
                author_name: author.map(|s| s.username),
            })
            .await
    }

    pub async fn delete_comment(&self, comment_id: CommentId) -> MutationOutcome<()> {
        self.controller
            .submit(DeleteComment {
                thread: self.clone(),
                comment_id,
            })
            .await
    }

    fn set_status(&self, status: ThreadStatus) {
        self.state.borrow_mut().status = status;
        self.notifier.notify();
    }

    fn comments_count(&self) -> Option<u32> {
        self.feed.get(self.post_id).map(|p| p.comments_count)
    }

    fn adjust_count(&self, increment: bool) {
        self.feed.update(self.post_id, |post| {
            post.comments_count = if increment {
                post.comments_count + 1
            } else {
                post.comments_count.saturating_sub(1)
            };
        });
    }

    /// Step the count back if `apply` moved it. Other keys may have changed
    /// the count meanwhile, so this is relative rather than a restore.
    fn undo_count(&self, pending: &PendingMutation<CommentChange>) {
        match (pending.before.comments_count, pending.after.comments_count) {
            (Some(before), Some(after)) if after > before => self.adjust_count(false),
            (Some(before), Some(after)) if after < before => self.adjust_count(true),
            _ => {}
        }
    }

    fn position(&self, comment_id: CommentId) -> Option<(usize, Comment)> {
        self.state
            .borrow()
            .comments
            .iter()
            .enumerate()
            .find(|(_, c)| c.id == comment_id)
            .map(|(i, c)| (i, c.clone()))
    }

    fn remove(&self, comment_id: CommentId) {
        self.state
            .borrow_mut()
            .comments
            .retain(|c| c.id != comment_id);
    }
}

struct AddComment<B> {
    thread: CommentThread<B>,
    content: String,
    author_id: String,
    author_name: Option<String>,
}

impl<B: Backend> Mutation for AddComment<B> {
    type Snapshot = CommentChange;
    type Output = Option<Comment>;

    fn key(&self) -> MutationKey {
        MutationKey::new(Target::Post(self.thread.post_id), MutationKind::AddComment)
    }

    fn describe(&self) -> String {
        "post your comment".to_string()
    }

    fn capture(&self) -> Result<CommentChange, MutationFailure> {
        Ok(CommentChange {
            comments_count: self.thread.comments_count(),
            comment: None,
        })
    }

    fn apply(&self, before: &CommentChange) -> CommentChange {
        let placed = {
            let mut state = self.thread.state.borrow_mut();
            let id = state.next_temp_id;
            state.next_temp_id -= 1;
            state.in_flight_add = Some(id);

            let comment = Comment {
                id,
                post_id: Some(self.thread.post_id),
                author_id: self.author_id.clone(),
                author_name: self.author_name.clone(),
                content: self.content.clone(),
                created_at: None,
            };
            state.comments.push(comment.clone());
            (state.comments.len() - 1, comment)
        };
        self.thread.adjust_count(true);

        CommentChange {
            comments_count: before.comments_count.map(|n| n + 1),
            comment: Some(placed),
        }
    }

    async fn dispatch(&self, token: &str) -> Result<Option<Comment>, MutationFailure> {
        let data = acknowledged(
            self.thread
                .backend
                .add_comment(token, self.thread.post_id, &self.content)
                .await,
        )?;
        Ok(data.and_then(|value| serde_json::from_value::<Comment>(value).ok()))
    }

    fn commit(&self, pending: &PendingMutation<CommentChange>, output: &Option<Comment>) {
        let Some((_, temp)) = &pending.after.comment else {
            return;
        };
        let mut state = self.thread.state.borrow_mut();
        state.in_flight_add = None;
        match output {
            Some(stored) => {
                if let Some(slot) = state.comments.iter_mut().find(|c| c.id == temp.id) {
                    *slot = stored.clone();
                }
            }
            // No server copy: keep the placeholder and reload on next open.
            None if state.status == ThreadStatus::Loaded => state.status = ThreadStatus::Idle,
            None => {}
        }
    }

    fn rollback(&self, pending: &PendingMutation<CommentChange>) {
        if let Some((_, temp)) = &pending.after.comment {
            self.thread.state.borrow_mut().in_flight_add = None;
            self.thread.remove(temp.id);
        }
        self.thread.undo_count(pending);
    }
}

struct DeleteComment<B> {
    thread: CommentThread<B>,
    comment_id: CommentId,
}

impl<B: Backend> Mutation for DeleteComment<B> {
    type Snapshot = CommentChange;
    type Output = ();

    fn key(&self) -> MutationKey {
        MutationKey::new(Target::Comment(self.comment_id), MutationKind::DeleteComment)
    }

    fn describe(&self) -> String {
        "delete the comment".to_string()
    }

    fn capture(&self) -> Result<CommentChange, MutationFailure> {
        if self.comment_id < 0 {
            return Err(MutationFailure::UnknownTarget);
        }
        let comment = self
            .thread
            .position(self.comment_id)
            .ok_or(MutationFailure::UnknownTarget)?;
        Ok(CommentChange {
            comments_count: self.thread.comments_count(),
            comment: Some(comment),
        })
    }

    fn apply(&self, before: &CommentChange) -> CommentChange {
        self.thread.remove(self.comment_id);
        self.thread.adjust_count(false);
        CommentChange {
            comments_count: before.comments_count.map(|n| n.saturating_sub(1)),
            comment: None,
        }
    }

    async fn dispatch(&self, token: &str) -> Result<(), MutationFailure> {
        acknowledged(
            self.thread
                .backend
                .delete_comment(token, self.comment_id)
                .await,
        )
        .map(|_| ())
    }

    fn rollback(&self, pending: &PendingMutation<CommentChange>) {
        if let Some((index, comment)) = &pending.before.comment {
            let mut state = self.thread.state.borrow_mut();
            let at = (*index).min(state.comments.len());
            state.comments.insert(at, comment.clone());
        }
        self.thread.undo_count(pending);
    }
}
