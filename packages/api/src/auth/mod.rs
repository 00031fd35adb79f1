//! Session, role and gating.

mod gate;
mod session;
mod session_store;
pub mod token;

pub use gate::{decide, AuthGate, GateDecision};
pub use session::{require_role, Role, Session};
pub use session_store::SessionStore;
pub use token::Claims;
