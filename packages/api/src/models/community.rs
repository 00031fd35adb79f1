//! # Community models
//!
//! Read-mostly replicas of server-owned posts and comments, plus the
//! `{ succeeded, data, message }` envelope every endpoint answers with.
//!
//! Only [`Post::likes_count`], [`Post::comments_count`] and [`Post::is_liked`]
//! are ever changed locally ahead of server confirmation.

use serde::{Deserialize, Serialize};

pub type PostId = i64;
pub type CommentId = i64;

/// A community post as the client holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    #[serde(deserialize_with = "crate::models::id_string")]
    pub author_id: String,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub likes_count: u32,
    #[serde(default)]
    pub comments_count: u32,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A comment on a post.
///
/// Comments created locally carry a negative temporary id until the server
/// acknowledges them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    #[serde(default)]
    pub post_id: Option<PostId>,
    #[serde(deserialize_with = "crate::models::id_string")]
    pub author_id: String,
    #[serde(default)]
    pub author_name: Option<String>,
    pub content: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Comment {
    /// True for an optimistic comment the server has not acknowledged yet.
    pub fn is_pending(&self) -> bool {
        self.id < 0
    }
}

/// Response envelope shared by every backend endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub succeeded: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            succeeded: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            data: None,
            message: Some(message.into()),
        }
    }

    /// Split into the payload or the server's reason for refusing.
    pub fn into_result(self) -> Result<Option<T>, Option<String>> {
        if self.succeeded {
            Ok(self.data)
        } else {
            Err(self.message)
        }
    }
}
