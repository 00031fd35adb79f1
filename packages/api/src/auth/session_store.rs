//! # SessionStore
//!
//! Owns the single live [`Session`] and its persisted record.
//!
//! Lifecycle: `restore()` on startup (restore-or-empty), then any number of
//! `establish()`/`sign_in()` calls, each replacing the previous session
//! wholesale, and `teardown()` on logout or detected expiry.
//!
//! The store is a cheap handle (`Rc` inside). Clone it into every component
//! that issues authenticated requests instead of reaching for a global.
//!
//! ## Logout racing sign-in
//!
//! Every teardown bumps a generation counter. [`SessionStore::sign_in`]
//! remembers the generation it started under and discards its result if a
//! teardown happened while the request was in flight, so a logout issued
//! during sign-in always leaves the client signed out.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use store::{ClientConfig, ClientStorage, SessionRecord, StorageError};
use tracing::{debug, info, warn};

use super::session::Session;
use crate::client::Backend;
use crate::error::{ApiError, AuthError, DecodeError};
use crate::models::ApiResponse;
use crate::timer;

#[derive(Default)]
struct SessionState {
    session: Option<Session>,
    restored: bool,
    generation: u64,
}

/// Handle to the client's session state.
#[derive(Clone)]
pub struct SessionStore {
    state: Rc<RefCell<SessionState>>,
    storage: Rc<dyn ClientStorage>,
    request_timeout: Duration,
}

impl PartialEq for SessionStore {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl SessionStore {
    pub fn new(storage: Rc<dyn ClientStorage>) -> Self {
        Self::with_config(storage, &ClientConfig::default())
    }

    pub fn with_config(storage: Rc<dyn ClientStorage>, config: &ClientConfig) -> Self {
        Self {
            state: Rc::new(RefCell::new(SessionState::default())),
            storage,
            request_timeout: config.request_timeout(),
        }
    }

    /// Load the persisted session, replacing whatever is in memory.
    ///
    /// An absent record yields `None`. A record that is corrupt, carries an
    /// unreadable credential, or has expired is purged and also yields `None`.
    /// Either way the restore phase is complete afterwards.
    pub fn restore(&self) -> Option<Session> {
        let restored = self.load_persisted();
        let mut state = self.state.borrow_mut();
        state.session = restored.clone();
        state.restored = true;
        restored
    }

    /// Whether the restore phase has finished. Gates render nothing before.
    pub fn is_restored(&self) -> bool {
        self.state.borrow().restored
    }

    /// The live session, if any. A session found expired is torn down.
    pub fn current(&self) -> Option<Session> {
        let session = self.state.borrow().session.clone()?;
        if session.is_live() {
            return Some(session);
        }
        info!(expired_at = %session.expires_at, "session expired");
        self.teardown();
        None
    }

    /// Bearer credential of the live session.
    pub fn credential(&self) -> Option<String> {
        self.current().map(|s| s.credential().to_string())
    }

    /// Turn a sign-in response into the live session.
    ///
    /// Only the raw credential is persisted. The new session replaces any
    /// previous one in a single step. A rejected response leaves the current
    /// state untouched.
    pub fn establish(&self, response: ApiResponse<String>) -> Result<Session, AuthError> {
        let credential = match response.into_result() {
            Ok(data) => data.unwrap_or_default(),
            Err(message) => {
                return Err(AuthError::InvalidCredentials {
                    message: message.unwrap_or_else(|| "Invalid email or password".to_string()),
                })
            }
        };

        let session = Session::from_credential(&credential)?;
        if !session.is_live() {
            return Err(DecodeError::InvalidExpiry(session.expires_at.timestamp()).into());
        }

        if let Err(e) = SessionRecord::new(credential).save(&*self.storage) {
            warn!(error = %e, "could not persist session; it will not survive a reload");
        }

        {
            let mut state = self.state.borrow_mut();
            state.session = Some(session.clone());
            state.restored = true;
        }
        info!(subject = %session.subject_id, role = %session.role, "session established");
        Ok(session)
    }

    /// Sign in against `backend` and establish the resulting session.
    ///
    /// Transport failures and timeouts are reported as
    /// [`AuthError::ServiceUnavailable`]; no session is created for them.
    pub async fn sign_in<B: Backend>(
        &self,
        backend: &B,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let generation = self.state.borrow().generation;

        let reply = timer::with_timeout(self.request_timeout, backend.sign_in(email, password)).await;

        if self.state.borrow().generation != generation {
            info!("discarding sign-in result: logged out while it was in flight");
            return Err(AuthError::Superseded);
        }

        match reply {
            None => Err(AuthError::ServiceUnavailable(
                ApiError::TimedOut(self.request_timeout).to_string(),
            )),
            Some(Ok(response)) => self.establish(response),
            Some(Err(e)) => Err(sign_in_failure(e)),
        }
    }

    /// Clear the in-memory session and the persisted record.
    ///
    /// Synchronous and idempotent: callers navigate only after it returns.
    pub fn teardown(&self) {
        let had_session = {
            let mut state = self.state.borrow_mut();
            state.generation += 1;
            state.session.take().is_some()
        };

        if let Err(e) = SessionRecord::clear(&*self.storage) {
            warn!(error = %e, "could not clear persisted session");
        }

        if had_session {
            info!("session torn down");
        } else {
            debug!("teardown with no live session");
        }
    }

    fn load_persisted(&self) -> Option<Session> {
        let record = match SessionRecord::load(&*self.storage) {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(e @ StorageError::Serialization(_)) => {
                warn!(error = %e, "purging corrupt session record");
                self.purge();
                return None;
            }
            Err(e) => {
                warn!(error = %e, "session storage unreadable, starting signed out");
                return None;
            }
        };

        match Session::from_credential(&record.token) {
            Ok(session) if session.is_live() => {
                info!(subject = %session.subject_id, role = %session.role, "session restored");
                Some(session)
            }
            Ok(session) => {
                warn!(expired_at = %session.expires_at, "purging expired session record");
                self.purge();
                None
            }
            Err(e) => {
                warn!(error = %e, "purging unreadable session record");
                self.purge();
                None
            }
        }
    }

    fn purge(&self) {
        if let Err(e) = SessionRecord::clear(&*self.storage) {
            warn!(error = %e, "could not purge session record");
        }
    }
}

fn sign_in_failure(err: ApiError) -> AuthError {
    if err.is_unavailable() {
        return AuthError::ServiceUnavailable(err.to_string());
    }
    let message = match err {
        ApiError::Rejected(Some(message)) => message,
        ApiError::Status { body, .. } if !body.trim().is_empty() => body,
        _ => "Invalid email or password".to_string(),
    };
    AuthError::InvalidCredentials { message }
}
