//! Route guards over [`api::AuthGate`].
//!
//! Rendering follows the pure [`api::decide`]; the teardown and redirect
//! happen in an effect, never during render.

use api::{decide, AuthGate, GateDecision, Role};
use dioxus::prelude::*;

use crate::auth::{refresh, use_auth, use_session_store};
use crate::community::AppCommunity;

/// Render `children` only for a live session; otherwise redirect to sign-in.
#[component]
pub fn AuthGuard(
    #[props(default = AuthGate::DEFAULT_SIGN_IN_PATH.to_string())] sign_in_path: String,
    children: Element,
) -> Element {
    rsx! {
        GateView { required: None, sign_in_path, children }
    }
}

/// Render `children` only for a live session carrying `role`. A session with
/// another role is signed out before the redirect.
#[component]
pub fn RoleGuard(
    role: Role,
    #[props(default = AuthGate::DEFAULT_SIGN_IN_PATH.to_string())] sign_in_path: String,
    children: Element,
) -> Element {
    rsx! {
        GateView { required: Some(role), sign_in_path, children }
    }
}

#[component]
fn GateView(
    #[props(!optional)] required: Option<Role>,
    sign_in_path: String,
    children: Element,
) -> Element {
    let store = use_session_store();
    let community = try_use_context::<AppCommunity>();
    let mut auth = use_auth();
    let nav = use_navigator();

    let path = sign_in_path;
    use_effect(move || {
        let _ = auth.read();
        let gate = match required {
            Some(role) => AuthGate::for_role(store.clone(), role),
            None => AuthGate::general(store.clone()),
        }
        .with_sign_in_path(path.clone());

        let decision = gate.evaluate();
        if decision == GateDecision::RoleMismatch {
            if let Some(community) = &community {
                community.reset();
            }
        }
        if decision.redirects() {
            refresh(&mut auth, &store);
            nav.replace(gate.sign_in_path().to_string());
        }
    });

    let state = auth();
    match decide(!state.loading, state.session.as_ref(), required) {
        GateDecision::Render => rsx! {
            {children}
        },
        GateDecision::Wait | GateDecision::Redirect | GateDecision::RoleMismatch => rsx! {},
    }
}
