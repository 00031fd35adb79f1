//! Like toggling on posts.

use std::rc::Rc;

use super::feed::Feed;
use super::mutation::{acknowledged, Mutation, MutationKey, MutationKind, PendingMutation, Target};
use crate::client::Backend;
use crate::error::MutationFailure;
use crate::models::PostId;

/// The like fields of a post: the only ones toggling touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeState {
    pub likes_count: u32,
    pub is_liked: bool,
}

impl LikeState {
    pub fn toggled(self) -> Self {
        if self.is_liked {
            Self {
                likes_count: self.likes_count.saturating_sub(1),
                is_liked: false,
            }
        } else {
            Self {
                likes_count: self.likes_count + 1,
                is_liked: true,
            }
        }
    }
}

/// Flip the viewer's like on one post.
pub struct ToggleLike<B> {
    pub(crate) backend: Rc<B>,
    pub(crate) feed: Feed,
    pub(crate) post_id: PostId,
}

impl<B> ToggleLike<B> {
    fn write(&self, state: LikeState) {
        self.feed.update(self.post_id, |post| {
            post.likes_count = state.likes_count;
            post.is_liked = state.is_liked;
        });
    }
}

impl<B: Backend> Mutation for ToggleLike<B> {
    type Snapshot = LikeState;
    type Output = ();

    fn key(&self) -> MutationKey {
        MutationKey::new(Target::Post(self.post_id), MutationKind::ToggleLike)
    }

    fn describe(&self) -> String {
        "update your like".to_string()
    }

    fn capture(&self) -> Result<LikeState, MutationFailure> {
        self.feed
            .get(self.post_id)
            .map(|post| LikeState {
                likes_count: post.likes_count,
                is_liked: post.is_liked,
            })
            .ok_or(MutationFailure::UnknownTarget)
    }

    fn apply(&self, before: &LikeState) -> LikeState {
        let after = before.toggled();
        self.write(after);
        after
    }

    async fn dispatch(&self, token: &str) -> Result<(), MutationFailure> {
        acknowledged(self.backend.add_post_like(token, self.post_id).await).map(|_| ())
    }

    fn rollback(&self, pending: &PendingMutation<LikeState>) {
        self.write(pending.before);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_is_an_involution() {
        let unliked = LikeState {
            likes_count: 10,
            is_liked: false,
        };
        let liked = unliked.toggled();
        assert_eq!(
            liked,
            LikeState {
                likes_count: 11,
                is_liked: true
            }
        );
        assert_eq!(liked.toggled(), unliked);
    }

    #[test]
    fn test_unlike_never_underflows() {
        let odd = LikeState {
            likes_count: 0,
            is_liked: true,
        };
        assert_eq!(odd.toggled().likes_count, 0);
    }
}
