//! Community context: one [`Community`] per app, re-rendering subscribers
//! whenever its replica changes.

use api::{Community, HttpBackend};
use dioxus::prelude::*;

use crate::auth::{use_backend, use_client_config, use_session_store};

pub type AppCommunity = Community<HttpBackend>;

/// Bumped on every replica change; reading it subscribes a component.
#[derive(Clone, Copy)]
struct CommunityRevision(Signal<u64>);

pub fn use_community() -> AppCommunity {
    use_context::<AppCommunity>()
}

/// Read inside a component body to re-render on replica changes.
pub fn use_community_revision() -> Signal<u64> {
    use_context::<CommunityRevision>().0
}

/// Must sit inside [`crate::AuthProvider`].
#[component]
pub fn CommunityProvider(children: Element) -> Element {
    let store = use_session_store();
    let config = use_client_config();
    let backend = use_backend();
    let community = use_hook(|| Community::new(backend, store, &config));
    let revision = use_signal(|| 0u64);

    let subscription = use_hook(|| {
        community.notifier().subscribe(move || {
            let mut revision = revision;
            // A rollback can land while this provider is being torn down.
            if let Ok(mut value) = revision.try_write() {
                *value += 1;
            };
        })
    });
    let notifier = community.notifier().clone();
    use_drop(move || notifier.unsubscribe(subscription));

    use_context_provider(|| community.clone());
    use_context_provider(|| CommunityRevision(revision));

    rsx! {
        {children}
    }
}
