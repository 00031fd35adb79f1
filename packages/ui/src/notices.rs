//! Dismissible tray listing the current notices.

use api::NoticeLevel;
use dioxus::prelude::*;

use crate::community::{use_community, use_community_revision};

/// Non-blocking list of failure notices, newest first.
#[component]
pub fn NoticeTray() -> Element {
    let community = use_community();
    let revision = use_community_revision();
    let _ = revision();

    let notices = community.notices().snapshot();
    if notices.is_empty() {
        return rsx! {};
    }

    let clear_community = community.clone();

    rsx! {
        div {
            class: "notice-tray",
            div {
                class: "notice-tray-header",
                button {
                    onclick: move |_| {
                        clear_community.notices().drain();
                        clear_community.notifier().notify();
                    },
                    "Clear"
                }
            }
            for notice in notices.into_iter().rev() {
                div {
                    key: "{notice.id}",
                    class: match notice.level {
                        NoticeLevel::Error => "notice error",
                        NoticeLevel::Warning => "notice warning",
                        NoticeLevel::Success => "notice success",
                        NoticeLevel::Info => "notice info",
                    },
                    span { class: "notice-time", "{notice.timestamp}" }
                    span { " {notice.message}" }
                    button {
                        class: "notice-dismiss",
                        onclick: {
                            let community = community.clone();
                            let id = notice.id;
                            move |_| {
                                community.notices().dismiss(id);
                                community.notifier().notify();
                            }
                        },
                        "Dismiss"
                    }
                }
            }
        }
    }
}
