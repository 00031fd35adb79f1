//! Session context and hooks for the UI.

use std::rc::Rc;

use api::{AuthError, AuthGate, ClientConfig, HttpBackend, Session, SessionStore};
use dioxus::prelude::*;
use store::ClientStorage;

use crate::community::AppCommunity;

/// Session state as components see it.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    pub session: Option<Session>,
    /// True until the persisted session has been restored.
    pub loading: bool,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            session: None,
            loading: true,
        }
    }
}

/// Get the current authentication state.
/// Returns a signal that updates on sign-in, sign-out and expiry.
pub fn use_auth() -> Signal<AuthState> {
    use_context::<Signal<AuthState>>()
}

pub fn use_session_store() -> SessionStore {
    use_context::<SessionStore>()
}

pub fn use_client_config() -> ClientConfig {
    use_context::<ClientConfig>()
}

pub fn use_backend() -> Rc<HttpBackend> {
    use_context::<Rc<HttpBackend>>()
}

fn client_storage() -> Rc<dyn ClientStorage> {
    #[cfg(all(target_arch = "wasm32", feature = "web"))]
    {
        Rc::new(store::LocalStorage::new())
    }
    #[cfg(all(target_arch = "wasm32", not(feature = "web")))]
    {
        Rc::new(store::MemoryStorage::new())
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        Rc::new(store::FileStorage::default_location())
    }
}

/// Copy the store's state into the signal, writing only on change.
pub(crate) fn refresh(auth: &mut Signal<AuthState>, store: &SessionStore) {
    let next = AuthState {
        session: store.current(),
        loading: !store.is_restored(),
    };
    if *auth.peek() != next {
        auth.set(next);
    }
}

/// Provider component that owns the session.
/// Wrap your app with this component to enable authentication.
#[component]
pub fn AuthProvider(#[props(default)] config: ClientConfig, children: Element) -> Element {
    let store = use_hook(|| SessionStore::with_config(client_storage(), &config));
    let mut auth_state = use_signal(AuthState::default);
    let poll = config.expiry_poll();

    use_context_provider(|| store.clone());
    use_context_provider(|| config.clone());
    use_context_provider(|| Rc::new(HttpBackend::new(&config)));
    use_context_provider(|| auth_state);

    // Restore the persisted session on mount
    let restore_store = store.clone();
    use_effect(move || {
        restore_store.restore();
        refresh(&mut auth_state, &restore_store);
    });

    // Tear the session down as soon as it expires
    let watch_store = store.clone();
    use_future(move || {
        let store = watch_store.clone();
        async move {
            loop {
                let wait = store
                    .current()
                    .and_then(|s| s.time_until_expiry())
                    .map_or(poll, |left| left.min(poll));
                api::timer::sleep(wait).await;
                refresh(&mut auth_state, &store);
            }
        }
    });

    rsx! {
        {children}
    }
}

/// Email/password sign-in form.
#[component]
pub fn SignInForm(#[props(default = "/".to_string())] redirect: String) -> Element {
    let store = use_session_store();
    let backend = use_backend();
    let mut auth = use_auth();
    let nav = use_navigator();
    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut error = use_signal(|| Option::<String>::None);
    let mut loading = use_signal(|| false);

    let handle_sign_in = move |evt: FormEvent| {
        evt.prevent_default();
        let store = store.clone();
        let backend = backend.clone();
        let redirect = redirect.clone();
        spawn(async move {
            error.set(None);

            let e = email().trim().to_string();
            let p = password();

            if e.is_empty() {
                error.set(Some("Please enter your email".to_string()));
                return;
            }
            if p.is_empty() {
                error.set(Some("Please enter your password".to_string()));
                return;
            }

            loading.set(true);
            let result = store.sign_in(backend.as_ref(), &e, &p).await;
            loading.set(false);
            refresh(&mut auth, &store);

            match result {
                Ok(_) => {
                    nav.replace(redirect);
                }
                Err(AuthError::ServiceUnavailable(reason)) => {
                    tracing::warn!("sign-in unavailable: {reason}");
                    error.set(Some(
                        "The service is unreachable. Check your connection and try again."
                            .to_string(),
                    ));
                }
                Err(AuthError::Superseded) => {}
                Err(e) => error.set(Some(e.to_string())),
            }
        });
    };

    rsx! {
        form {
            class: "sign-in-form",
            onsubmit: handle_sign_in,

            if let Some(err) = error() {
                div { class: "sign-in-error", "{err}" }
            }

            input {
                r#type: "email",
                placeholder: "Email",
                value: "{email}",
                oninput: move |evt| email.set(evt.value()),
            }
            input {
                r#type: "password",
                placeholder: "Password",
                value: "{password}",
                oninput: move |evt| password.set(evt.value()),
            }
            button {
                r#type: "submit",
                disabled: loading(),
                if loading() { "Signing in..." } else { "Sign in" }
            }
        }
    }
}

/// Button to log out the current user.
///
/// Pending mutations are cancelled and the session is cleared before
/// navigating away.
#[component]
pub fn LogoutButton(
    #[props(default = "Sign out".to_string())] label: String,
    #[props(default = "".to_string())] class: String,
    #[props(default = AuthGate::DEFAULT_SIGN_IN_PATH.to_string())] redirect: String,
) -> Element {
    let store = use_session_store();
    let community = try_use_context::<AppCommunity>();
    let mut auth = use_auth();
    let nav = use_navigator();

    let onclick = move |_| {
        if let Some(community) = &community {
            community.reset();
        }
        store.teardown();
        refresh(&mut auth, &store);
        nav.replace(redirect.clone());
    };

    rsx! {
        button {
            class: "{class}",
            onclick: onclick,
            "{label}"
        }
    }
}
