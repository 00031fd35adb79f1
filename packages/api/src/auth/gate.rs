//! Route and feature gating over [`SessionStore`].
//!
//! [`decide`] is the whole decision; [`AuthGate`] only feeds it the store's
//! state and performs the teardown a role mismatch demands.

use tracing::warn;

use super::session::{require_role, Role, Session};
use super::session_store::SessionStore;

/// What a gate tells its caller to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Restore has not finished: render nothing yet.
    Wait,
    /// No live session: go to the sign-in entry point.
    Redirect,
    /// Render the guarded subtree.
    Render,
    /// Live session with the wrong role: tear down, then redirect.
    RoleMismatch,
}

impl GateDecision {
    pub fn redirects(&self) -> bool {
        matches!(self, GateDecision::Redirect | GateDecision::RoleMismatch)
    }
}

/// Gate decision as a pure function of its inputs. Nothing renders before
/// `restore_complete`.
pub fn decide(
    restore_complete: bool,
    session: Option<&Session>,
    required: Option<Role>,
) -> GateDecision {
    if !restore_complete {
        return GateDecision::Wait;
    }
    let Some(session) = session else {
        return GateDecision::Redirect;
    };
    match required {
        Some(role) if !require_role(session, role) => GateDecision::RoleMismatch,
        _ => GateDecision::Render,
    }
}

/// A general gate (any live session) or a role gate (a specific role).
#[derive(Clone, PartialEq)]
pub struct AuthGate {
    store: SessionStore,
    required: Option<Role>,
    sign_in_path: String,
}

impl AuthGate {
    pub const DEFAULT_SIGN_IN_PATH: &'static str = "/sign-in";

    pub fn general(store: SessionStore) -> Self {
        Self {
            store,
            required: None,
            sign_in_path: Self::DEFAULT_SIGN_IN_PATH.to_string(),
        }
    }

    pub fn for_role(store: SessionStore, role: Role) -> Self {
        Self {
            required: Some(role),
            ..Self::general(store)
        }
    }

    pub fn with_sign_in_path(mut self, path: impl Into<String>) -> Self {
        self.sign_in_path = path.into();
        self
    }

    pub fn sign_in_path(&self) -> &str {
        &self.sign_in_path
    }

    pub fn required_role(&self) -> Option<Role> {
        self.required
    }

    /// Decide against the store's current state.
    ///
    /// On [`GateDecision::RoleMismatch`] the session has already been torn
    /// down when this returns, so the caller only has to redirect.
    pub fn evaluate(&self) -> GateDecision {
        let session = self.store.current();
        let decision = decide(self.store.is_restored(), session.as_ref(), self.required);

        if decision == GateDecision::RoleMismatch {
            if let (Some(session), Some(required)) = (session, self.required) {
                warn!(
                    role = %session.role,
                    required = %required,
                    "session role does not match gate, signing out"
                );
            }
            self.store.teardown();
        }
        decision
    }
}
