//! # Community
//!
//! Social interactions on posts: the [`Feed`] replica, like toggling, and one
//! [`CommentThread`] per post, all reconciled through a shared
//! [`MutationController`].
//!
//! [`Community`] bundles the collaborators so UI code holds a single handle.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use store::ClientConfig;

mod comments;
mod feed;
mod likes;
mod mutation;
mod notice;
mod notify;

pub use comments::{can_delete, CommentChange, CommentThread, FetchOutcome, ThreadStatus};
pub use feed::Feed;
pub use likes::{LikeState, ToggleLike};
pub use mutation::{
    Mutation, MutationController, MutationKey, MutationKind, MutationOutcome, PendingMutation,
    Target,
};
pub use notice::{Notice, NoticeLevel, Notices};
pub use notify::{ChangeNotifier, SubscriptionId};

use crate::auth::SessionStore;
use crate::client::Backend;
use crate::models::PostId;

pub struct Community<B> {
    backend: Rc<B>,
    session: SessionStore,
    feed: Feed,
    notices: Notices,
    notifier: ChangeNotifier,
    controller: MutationController,
    threads: Rc<RefCell<HashMap<PostId, CommentThread<B>>>>,
    request_timeout: Duration,
}

impl<B> Clone for Community<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Rc::clone(&self.backend),
            session: self.session.clone(),
            feed: self.feed.clone(),
            notices: self.notices.clone(),
            notifier: self.notifier.clone(),
            controller: self.controller.clone(),
            threads: Rc::clone(&self.threads),
            request_timeout: self.request_timeout,
        }
    }
}

impl<B> PartialEq for Community<B> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.threads, &other.threads)
    }
}

impl<B: Backend> Community<B> {
    pub fn new(backend: Rc<B>, session: SessionStore, config: &ClientConfig) -> Self {
        let notifier = ChangeNotifier::new();
        let notices = Notices::new();
        let controller = MutationController::new(
            session.clone(),
            notices.clone(),
            notifier.clone(),
            config.mutation_timeout(),
        );
        Self {
            backend,
            session,
            feed: Feed::new(notifier.clone()),
            notices,
            notifier,
            controller,
            threads: Rc::new(RefCell::new(HashMap::new())),
            request_timeout: config.request_timeout(),
        }
    }

    pub fn feed(&self) -> &Feed {
        &self.feed
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    pub fn controller(&self) -> &MutationController {
        &self.controller
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Flip the viewer's like on `post_id`. Ignored while a toggle on the
    /// same post is pending.
    pub async fn toggle_like(&self, post_id: PostId) -> MutationOutcome<()> {
        self.controller
            .submit(ToggleLike {
                backend: Rc::clone(&self.backend),
                feed: self.feed.clone(),
                post_id,
            })
            .await
    }

    pub fn is_like_pending(&self, post_id: PostId) -> bool {
        self.controller
            .is_pending(&MutationKey::new(Target::Post(post_id), MutationKind::ToggleLike))
    }

    /// The comment thread of `post_id`, created on first use.
    pub fn thread(&self, post_id: PostId) -> CommentThread<B> {
        self.threads
            .borrow_mut()
            .entry(post_id)
            .or_insert_with(|| {
                CommentThread::new(
                    post_id,
                    Rc::clone(&self.backend),
                    self.session.clone(),
                    self.feed.clone(),
                    self.controller.clone(),
                    self.notifier.clone(),
                    self.request_timeout,
                )
            })
            .clone()
    }

    /// Abort pending mutations and forget the viewer-specific replica
    /// (posts with their `is_liked` flags, cached threads), e.g. after logout.
    pub fn reset(&self) {
        self.controller.cancel_all();
        self.threads.borrow_mut().clear();
        self.feed.clear();
    }
}
