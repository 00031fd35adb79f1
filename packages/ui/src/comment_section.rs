//! Comments under a post.

use api::{can_delete, CommentId, MutationOutcome, PostId, ThreadStatus};
use dioxus::prelude::*;

use crate::auth::use_auth;
use crate::community::{use_community, use_community_revision};

struct CommentRow {
    id: CommentId,
    author: String,
    content: String,
    pending: bool,
    deletable: bool,
    deleting: bool,
}

#[component]
pub fn CommentSection(post_id: PostId) -> Element {
    let community = use_community();
    let revision = use_community_revision();
    let auth = use_auth();
    let mut draft = use_signal(String::new);
    let _ = revision();

    let thread = community.thread(post_id);

    // Load on mount; the thread itself skips a reload once loaded
    let open_thread = thread.clone();
    use_effect(move || {
        let thread = open_thread.clone();
        spawn(async move {
            let _ = thread.open().await;
        });
    });

    let retry_thread = thread.clone();
    let retry = move |_| {
        let thread = retry_thread.clone();
        spawn(async move {
            let _ = thread.open().await;
        });
    };

    let add_thread = thread.clone();
    let submit = move |evt: FormEvent| {
        evt.prevent_default();
        let text = draft();
        if text.trim().is_empty() {
            return;
        }
        draft.set(String::new());
        let thread = add_thread.clone();
        spawn(async move {
            let outcome = thread.add_comment(&text).await;
            // Give the text back if it did not stick
            if matches!(outcome, MutationOutcome::RolledBack(_) | MutationOutcome::NotApplied(_)) {
                draft.set(text);
            }
        });
    };

    let delete_thread = thread.clone();
    let delete = move |comment_id: CommentId| {
        let thread = delete_thread.clone();
        spawn(async move {
            thread.delete_comment(comment_id).await;
        });
    };

    let viewer = auth().session;
    let adding = thread.is_adding();
    let rows: Vec<CommentRow> = thread
        .comments()
        .into_iter()
        .map(|comment| CommentRow {
            author: comment
                .author_name
                .clone()
                .unwrap_or_else(|| comment.author_id.clone()),
            deletable: can_delete(&comment, viewer.as_ref()),
            deleting: thread.is_deleting(comment.id),
            pending: comment.is_pending(),
            id: comment.id,
            content: comment.content,
        })
        .collect();

    rsx! {
        div {
            class: "comment-section",

            match thread.status() {
                ThreadStatus::Loading => rsx! {
                    p { class: "comment-status", "Loading comments..." }
                },
                ThreadStatus::Failed => rsx! {
                    p {
                        class: "comment-status error",
                        "Comments could not be loaded. "
                        button { onclick: retry, "Retry" }
                    }
                },
                ThreadStatus::Idle | ThreadStatus::Loaded => rsx! {},
            }

            ul {
                class: "comment-list",
                for row in rows {
                    li {
                        key: "{row.id}",
                        class: if row.pending { "comment pending" } else { "comment" },
                        span { class: "comment-author", "{row.author}" }
                        span { class: "comment-content", " {row.content}" }
                        if row.deletable {
                            button {
                                class: "comment-delete",
                                disabled: row.deleting,
                                onclick: {
                                    let delete = delete.clone();
                                    let id = row.id;
                                    move |_| delete(id)
                                },
                                "Delete"
                            }
                        }
                    }
                }
            }

            form {
                class: "comment-form",
                onsubmit: submit,
                input {
                    placeholder: "Write a comment",
                    value: "{draft}",
                    oninput: move |evt| draft.set(evt.value()),
                }
                button { r#type: "submit", disabled: adding, "Post" }
            }
        }
    }
}
