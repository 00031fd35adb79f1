//! # api — client core for the clinic community app
//!
//! Everything here is UI-agnostic; the `ui` crate only wires it into
//! components.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`auth`] | Credential decoding, [`Session`]/[`Role`], the [`SessionStore`], and route gating ([`AuthGate`]). |
//! | [`client`] | The [`Backend`] seam and its reqwest implementation, [`HttpBackend`]. |
//! | [`community`] | Post replica, optimistic likes, per-post comment threads, notices. |
//! | [`error`] | Error kinds for each layer. |
//! | [`models`] | Wire types: posts, comments and the response envelope. |
//! | [`timer`] | Sleep and deadlines on both native and wasm targets. |
//!
//! ## Threading
//!
//! The core runs on one cooperative thread. Shared state lives behind
//! `Rc<RefCell<_>>` and network calls are the only suspension points.

pub mod auth;
pub mod client;
pub mod community;
pub mod error;
pub mod models;
pub mod timer;

#[cfg(test)]
mod test_support;

pub use auth::{decide, require_role, AuthGate, GateDecision, Role, Session, SessionStore};
pub use client::{Backend, HttpBackend};
pub use community::{
    can_delete, ChangeNotifier, CommentThread, Community, Feed, MutationController,
    MutationOutcome, Notice, NoticeLevel, Notices, ThreadStatus,
};
pub use error::{ApiError, AuthError, DecodeError, MutationFailure};
pub use models::{ApiResponse, Comment, CommentId, Post, PostId};
pub use store::ClientConfig;
