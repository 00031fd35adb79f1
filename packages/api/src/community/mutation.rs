//! # Optimistic mutations
//!
//! Every user action that changes server state and must show up immediately
//! goes through [`MutationController::submit`]:
//!
//! 1. **capture** the fields the action will change,
//! 2. **apply** the new values to the replica at once,
//! 3. **dispatch** the request (under a deadline and an abort handle),
//! 4. **reconcile**: keep the applied values on success, restore the captured
//!    ones exactly on any failure and raise a notice.
//!
//! Per [`MutationKey`] (target + kind) the state machine is
//! `Idle -> Pending -> {Committed, RolledBack} -> Idle`. A submit while the
//! key is pending is ignored, never dispatched. Different keys are
//! independent and may be pending together.

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use futures::future::{AbortHandle, Abortable, Aborted};
use tracing::{debug, info, warn};

use super::notice::{NoticeLevel, Notices};
use super::notify::ChangeNotifier;
use crate::auth::SessionStore;
use crate::error::{ApiError, MutationFailure};
use crate::models::{ApiResponse, CommentId, PostId};
use crate::timer;

/// The item a mutation changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Post(PostId),
    Comment(CommentId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    ToggleLike,
    AddComment,
    DeleteComment,
}

/// Serialization unit: at most one pending mutation per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MutationKey {
    pub target: Target,
    pub kind: MutationKind,
}

impl MutationKey {
    pub fn new(target: Target, kind: MutationKind) -> Self {
        Self { target, kind }
    }
}

/// A mutation between "applied" and "reconciled".
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMutation<S> {
    pub key: MutationKey,
    pub before: S,
    pub after: S,
}

/// One optimistic action against the replica.
pub trait Mutation {
    /// Observable fields the mutation changes.
    type Snapshot: Clone;
    /// What the server acknowledged with.
    type Output;

    fn key(&self) -> MutationKey;

    /// Short phrase for notices, e.g. "like this post".
    fn describe(&self) -> String;

    /// Read the current fields. Fails when the target is not in the replica.
    fn capture(&self) -> Result<Self::Snapshot, MutationFailure>;

    /// Write the optimistic values and return them.
    fn apply(&self, before: &Self::Snapshot) -> Self::Snapshot;

    fn dispatch(&self, token: &str) -> impl Future<Output = Result<Self::Output, MutationFailure>>;

    /// Called after the server acknowledged. The applied values stay in place.
    fn commit(&self, _pending: &PendingMutation<Self::Snapshot>, _output: &Self::Output) {}

    /// Undo `apply` so the observable fields equal `pending.before` again.
    fn rollback(&self, pending: &PendingMutation<Self::Snapshot>);
}

/// How a submit ended.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome<T> {
    Committed(T),
    RolledBack(MutationFailure),
    /// The same key was already pending; nothing happened.
    Ignored,
    /// Refused before anything was applied.
    NotApplied(MutationFailure),
}

impl<T> MutationOutcome<T> {
    pub fn is_committed(&self) -> bool {
        matches!(self, MutationOutcome::Committed(_))
    }

    pub fn failure(&self) -> Option<&MutationFailure> {
        match self {
            MutationOutcome::RolledBack(f) | MutationOutcome::NotApplied(f) => Some(f),
            MutationOutcome::Committed(_) | MutationOutcome::Ignored => None,
        }
    }
}

type PendingMap = Rc<RefCell<HashMap<MutationKey, AbortHandle>>>;

/// An applied mutation awaiting its reply.
///
/// Dropping it releases the key. If the submit future is dropped before the
/// reply is reconciled, the applied values are rolled back here.
struct InFlight<M: Mutation> {
    mutation: M,
    pending: PendingMutation<M::Snapshot>,
    slots: PendingMap,
    notifier: ChangeNotifier,
    reconciled: bool,
}

impl<M: Mutation> Drop for InFlight<M> {
    fn drop(&mut self) {
        self.slots.borrow_mut().remove(&self.pending.key);
        if !self.reconciled {
            self.mutation.rollback(&self.pending);
            debug!(key = ?self.pending.key, "submit dropped, mutation rolled back");
            self.notifier.notify();
        }
    }
}

/// Runs [`Mutation`]s and tracks which keys are pending.
#[derive(Clone)]
pub struct MutationController {
    pending: PendingMap,
    session: SessionStore,
    notices: Notices,
    notifier: ChangeNotifier,
    timeout: Duration,
}

impl MutationController {
    pub fn new(
        session: SessionStore,
        notices: Notices,
        notifier: ChangeNotifier,
        timeout: Duration,
    ) -> Self {
        Self {
            pending: Rc::new(RefCell::new(HashMap::new())),
            session,
            notices,
            notifier,
            timeout,
        }
    }

    pub fn is_pending(&self, key: &MutationKey) -> bool {
        self.pending.borrow().contains_key(key)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Abort the pending mutation for `key`; it rolls back as
    /// [`MutationFailure::Cancelled`]. Returns false if nothing was pending.
    pub fn cancel(&self, key: &MutationKey) -> bool {
        let handle = self.pending.borrow().get(key).cloned();
        match handle {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Abort everything pending, e.g. on logout.
    pub fn cancel_all(&self) {
        let handles: Vec<AbortHandle> = self.pending.borrow().values().cloned().collect();
        if !handles.is_empty() {
            info!(count = handles.len(), "cancelling pending mutations");
        }
        for handle in handles {
            handle.abort();
        }
    }

    pub async fn submit<M: Mutation>(&self, mutation: M) -> MutationOutcome<M::Output> {
        let key = mutation.key();
        if self.is_pending(&key) {
            debug!(?key, "mutation already pending, ignoring");
            return MutationOutcome::Ignored;
        }

        let Some(token) = self.session.credential() else {
            self.notices.push(
                NoticeLevel::Warning,
                format!("Sign in to {}.", mutation.describe()),
            );
            return MutationOutcome::NotApplied(MutationFailure::Unauthenticated);
        };

        let before = match mutation.capture() {
            Ok(before) => before,
            Err(failure) => {
                debug!(?key, %failure, "mutation not applied");
                return MutationOutcome::NotApplied(failure);
            }
        };

        let (handle, registration) = AbortHandle::new_pair();
        self.pending.borrow_mut().insert(key, handle);
        let after = mutation.apply(&before);
        let mut flight = InFlight {
            mutation,
            pending: PendingMutation { key, before, after },
            slots: Rc::clone(&self.pending),
            notifier: self.notifier.clone(),
            reconciled: false,
        };
        self.notifier.notify();

        let dispatched = Abortable::new(
            timer::with_timeout(self.timeout, flight.mutation.dispatch(&token)),
            registration,
        );
        let result = match dispatched.await {
            Ok(Some(result)) => result,
            Ok(None) => Err(MutationFailure::TimedOut(self.timeout)),
            Err(Aborted) => Err(MutationFailure::Cancelled),
        };

        let outcome = match result {
            Ok(output) => {
                flight.mutation.commit(&flight.pending, &output);
                debug!(?key, "mutation committed");
                MutationOutcome::Committed(output)
            }
            Err(failure) => {
                flight.mutation.rollback(&flight.pending);
                if failure == MutationFailure::Cancelled {
                    debug!(?key, "mutation cancelled and rolled back");
                } else {
                    warn!(?key, %failure, "mutation rolled back");
                    self.notices.push(
                        NoticeLevel::Error,
                        format!("Could not {}: {failure}", flight.mutation.describe()),
                    );
                }
                MutationOutcome::RolledBack(failure)
            }
        };

        flight.reconciled = true;
        drop(flight);
        self.notifier.notify();
        outcome
    }
}

/// Turn an endpoint reply into the acknowledged payload, or the reason it
/// was not acknowledged.
pub(crate) fn acknowledged<T>(
    reply: Result<ApiResponse<T>, ApiError>,
) -> Result<Option<T>, MutationFailure> {
    reply?.into_result().map_err(MutationFailure::Rejected)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use store::MemoryStorage;

    use super::*;
    use crate::auth::Role;
    use crate::test_support::session_token;

    /// Adds one to a shared counter; the server answers after `latency`.
    struct Bump {
        value: Rc<Cell<i32>>,
        latency: Duration,
        reply: Result<(), MutationFailure>,
    }

    impl Mutation for Bump {
        type Snapshot = i32;
        type Output = ();

        fn key(&self) -> MutationKey {
            MutationKey::new(Target::Post(1), MutationKind::ToggleLike)
        }

        fn describe(&self) -> String {
            "bump".into()
        }

        fn capture(&self) -> Result<i32, MutationFailure> {
            Ok(self.value.get())
        }

        fn apply(&self, before: &i32) -> i32 {
            self.value.set(before + 1);
            before + 1
        }

        async fn dispatch(&self, _token: &str) -> Result<(), MutationFailure> {
            timer::sleep(self.latency).await;
            self.reply.clone()
        }

        fn rollback(&self, pending: &PendingMutation<i32>) {
            self.value.set(pending.before);
        }
    }

    fn controller(timeout_secs: u64) -> (MutationController, SessionStore, Notices) {
        let session = SessionStore::new(Rc::new(MemoryStorage::new()));
        session
            .establish(ApiResponse::success(session_token("1", Role::Patient, 3600)))
            .unwrap();
        let notices = Notices::new();
        let controller = MutationController::new(
            session.clone(),
            notices.clone(),
            ChangeNotifier::new(),
            Duration::from_secs(timeout_secs),
        );
        (controller, session, notices)
    }

    fn bump(value: &Rc<Cell<i32>>, latency_ms: u64, reply: Result<(), MutationFailure>) -> Bump {
        Bump {
            value: Rc::clone(value),
            latency: Duration::from_millis(latency_ms),
            reply,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_forces_rollback() {
        let (controller, _, notices) = controller(2);
        let value = Rc::new(Cell::new(10));

        let outcome = controller.submit(bump(&value, 60_000, Ok(()))).await;
        assert_eq!(
            outcome,
            MutationOutcome::RolledBack(MutationFailure::TimedOut(Duration::from_secs(2)))
        );
        assert_eq!(value.get(), 10);
        assert_eq!(notices.len(), 1);
        assert_eq!(controller.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_rolls_back_quietly() {
        let (controller, _, notices) = controller(30);
        let value = Rc::new(Cell::new(3));
        let key = MutationKey::new(Target::Post(1), MutationKind::ToggleLike);

        let (outcome, cancelled) = tokio::join!(controller.submit(bump(&value, 5_000, Ok(()))), async {
            timer::sleep(Duration::from_millis(10)).await;
            assert!(controller.is_pending(&key));
            assert_eq!(value.get(), 4);
            controller.cancel(&key)
        });

        assert!(cancelled);
        assert_eq!(outcome, MutationOutcome::RolledBack(MutationFailure::Cancelled));
        assert_eq!(value.get(), 3);
        assert!(notices.is_empty());
        assert!(!controller.is_pending(&key));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_submit_rolls_back_and_releases_key() {
        let (controller, _, notices) = controller(30);
        let value = Rc::new(Cell::new(0));
        let key = MutationKey::new(Target::Post(1), MutationKind::ToggleLike);

        let stalled = timer::with_timeout(
            Duration::from_millis(10),
            controller.submit(bump(&value, 5_000, Ok(()))),
        )
        .await;
        assert!(stalled.is_none());
        assert_eq!(value.get(), 0);
        assert!(!controller.is_pending(&key));
        assert!(notices.is_empty());

        let outcome = controller.submit(bump(&value, 0, Ok(()))).await;
        assert!(outcome.is_committed());
        assert_eq!(value.get(), 1);
    }

    #[tokio::test]
    async fn test_reconciled_submit_is_not_rolled_back_again() {
        let (controller, _, _) = controller(30);
        let value = Rc::new(Cell::new(5));

        assert!(controller.submit(bump(&value, 0, Ok(()))).await.is_committed());
        assert_eq!(value.get(), 6);

        let failed = controller
            .submit(bump(&value, 0, Err(MutationFailure::Rejected(None))))
            .await;
        assert_eq!(failed, MutationOutcome::RolledBack(MutationFailure::Rejected(None)));
        assert_eq!(value.get(), 6);
    }

    #[tokio::test]
    async fn test_signed_out_is_not_applied() {
        let (controller, session, notices) = controller(30);
        session.teardown();
        let value = Rc::new(Cell::new(0));

        let outcome = controller.submit(bump(&value, 0, Ok(()))).await;
        assert_eq!(
            outcome,
            MutationOutcome::NotApplied(MutationFailure::Unauthenticated)
        );
        assert_eq!(value.get(), 0);
        assert_eq!(notices.len(), 1);
    }

    #[test]
    fn test_acknowledged() {
        assert_eq!(acknowledged(Ok(ApiResponse::success(5))), Ok(Some(5)));
        assert_eq!(
            acknowledged::<()>(Ok(ApiResponse::failure("Post not found"))),
            Err(MutationFailure::Rejected(Some("Post not found".into())))
        );
        assert_eq!(
            acknowledged::<()>(Err(ApiError::Unauthenticated)),
            Err(MutationFailure::Unauthenticated)
        );
    }
}
