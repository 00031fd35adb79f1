//! Like toggle for one post, disabled while its toggle is pending.

use api::PostId;
use dioxus::prelude::*;

use crate::community::{use_community, use_community_revision};

/// Like toggle for one post of the feed. Disabled while a toggle on the same
/// post is pending.
#[component]
pub fn LikeButton(post_id: PostId, #[props(default = "".to_string())] class: String) -> Element {
    let community = use_community();
    let revision = use_community_revision();
    let _ = revision();

    let Some(post) = community.feed().get(post_id) else {
        return rsx! {};
    };
    let pending = community.is_like_pending(post_id);
    let classes = if post.is_liked {
        format!("like-button liked {class}")
    } else {
        format!("like-button {class}")
    };

    let onclick = move |_| {
        let community = community.clone();
        spawn(async move {
            community.toggle_like(post_id).await;
        });
    };

    rsx! {
        button {
            class: "{classes}",
            disabled: pending,
            onclick: onclick,
            "aria-pressed": "{post.is_liked}",
            if post.is_liked { "Liked" } else { "Like" }
            span { class: "like-count", " {post.likes_count}" }
        }
    }
}
