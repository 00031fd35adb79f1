//! Fixtures shared by the unit tests: credential builders and a scripted
//! in-process [`Backend`].

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Utc;
use serde_json::Value;

use crate::auth::Role;
use crate::client::Backend;
use crate::error::ApiError;
use crate::models::{ApiResponse, Comment, CommentId, Post, PostId};
use crate::timer;

/// Build an unsigned credential whose payload segment is `claims`.
pub(crate) fn token_with(claims: Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

/// Credential for `sub` with `role`, expiring `ttl_secs` from now (negative
/// for an already expired one).
pub(crate) fn session_token(sub: &str, role: Role, ttl_secs: i64) -> String {
    token_with(serde_json::json!({
        "sub": sub,
        "unique_name": format!("user-{sub}"),
        "email": format!("{sub}@clinic.test"),
        "role": role.as_str(),
        "exp": Utc::now().timestamp() + ttl_secs,
    }))
}

pub(crate) fn post(id: PostId, likes_count: u32, is_liked: bool) -> Post {
    Post {
        id,
        author_id: "author".into(),
        author_name: Some("Dr. Author".into()),
        content: format!("post {id}"),
        likes_count,
        comments_count: 0,
        is_liked,
        created_at: None,
    }
}

pub(crate) fn comment(id: CommentId, post_id: PostId, author_id: &str) -> Comment {
    Comment {
        id,
        post_id: Some(post_id),
        author_id: author_id.into(),
        author_name: None,
        content: format!("comment {id}"),
        created_at: None,
    }
}

/// A request the mock backend received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    SignIn { email: String },
    AddPostLike(PostId),
    AddComment(PostId, String),
    GetComments(PostId),
    DeleteComment(CommentId),
}

type Reply<T> = Result<ApiResponse<T>, ApiError>;

/// Scripted backend. Each endpoint answers from its queue, falling back to a
/// plain success once the queue is empty. Like replies are queued per post.
/// Every call first waits `latency`.
#[derive(Default)]
pub(crate) struct MockBackend {
    calls: RefCell<Vec<Call>>,
    latency: Cell<Duration>,
    sign_in: RefCell<VecDeque<Reply<String>>>,
    likes: RefCell<HashMap<PostId, VecDeque<Reply<Value>>>>,
    add_comment: RefCell<VecDeque<Reply<Value>>>,
    comments: RefCell<VecDeque<Reply<Vec<Comment>>>>,
    delete_comment: RefCell<VecDeque<Reply<Value>>>,
}

impl MockBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_latency(self, latency: Duration) -> Self {
        self.latency.set(latency);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub(crate) fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| pred(c)).count()
    }

    pub(crate) fn push_sign_in(&self, reply: Reply<String>) {
        self.sign_in.borrow_mut().push_back(reply);
    }

    pub(crate) fn push_like(&self, post_id: PostId, reply: Reply<Value>) {
        self.likes
            .borrow_mut()
            .entry(post_id)
            .or_default()
            .push_back(reply);
    }

    pub(crate) fn push_add_comment(&self, reply: Reply<Value>) {
        self.add_comment.borrow_mut().push_back(reply);
    }

    pub(crate) fn push_comments(&self, reply: Reply<Vec<Comment>>) {
        self.comments.borrow_mut().push_back(reply);
    }

    pub(crate) fn push_delete_comment(&self, reply: Reply<Value>) {
        self.delete_comment.borrow_mut().push_back(reply);
    }

    async fn answer<T>(
        &self,
        call: Call,
        queue: &RefCell<VecDeque<Reply<T>>>,
        fallback: impl FnOnce() -> Reply<T>,
    ) -> Reply<T> {
        self.answer_with(call, || queue.borrow_mut().pop_front(), fallback)
            .await
    }

    async fn answer_with<T>(
        &self,
        call: Call,
        scripted: impl FnOnce() -> Option<Reply<T>>,
        fallback: impl FnOnce() -> Reply<T>,
    ) -> Reply<T> {
        self.calls.borrow_mut().push(call);
        let latency = self.latency.get();
        if !latency.is_zero() {
            timer::sleep(latency).await;
        }
        scripted().unwrap_or_else(fallback)
    }
}

impl Backend for MockBackend {
    async fn sign_in(&self, email: &str, _password: &str) -> Reply<String> {
        self.answer(
            Call::SignIn {
                email: email.to_string(),
            },
            &self.sign_in,
            || Ok(ApiResponse::failure("no scripted sign-in")),
        )
        .await
    }

    async fn add_post_like(&self, _token: &str, post_id: PostId) -> Reply<Value> {
        self.answer_with(
            Call::AddPostLike(post_id),
            || {
                self.likes
                    .borrow_mut()
                    .get_mut(&post_id)
                    .and_then(VecDeque::pop_front)
            },
            || Ok(ApiResponse::success(Value::Null)),
        )
        .await
    }

    async fn add_comment(&self, _token: &str, post_id: PostId, content: &str) -> Reply<Value> {
        self.answer(
            Call::AddComment(post_id, content.to_string()),
            &self.add_comment,
            || Ok(ApiResponse::success(Value::Null)),
        )
        .await
    }

    async fn get_comments(&self, _token: &str, post_id: PostId) -> Reply<Vec<Comment>> {
        self.answer(Call::GetComments(post_id), &self.comments, || {
            Ok(ApiResponse::success(Vec::new()))
        })
        .await
    }

    async fn delete_comment(&self, _token: &str, comment_id: CommentId) -> Reply<Value> {
        self.answer(Call::DeleteComment(comment_id), &self.delete_comment, || {
            Ok(ApiResponse::success(Value::Null))
        })
        .await
    }
}
