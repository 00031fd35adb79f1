//! The post replica.

use std::cell::RefCell;
use std::rc::Rc;

use super::notify::ChangeNotifier;
use crate::models::{Post, PostId};

/// Client-side copy of the posts on screen, in display order.
#[derive(Clone)]
pub struct Feed {
    posts: Rc<RefCell<Vec<Post>>>,
    notifier: ChangeNotifier,
}

impl Feed {
    pub fn new(notifier: ChangeNotifier) -> Self {
        Self {
            posts: Rc::new(RefCell::new(Vec::new())),
            notifier,
        }
    }

    /// Swap in a freshly fetched page of posts.
    pub fn replace_all(&self, posts: Vec<Post>) {
        *self.posts.borrow_mut() = posts;
        self.notifier.notify();
    }

    pub fn get(&self, id: PostId) -> Option<Post> {
        self.posts.borrow().iter().find(|p| p.id == id).cloned()
    }

    /// Mutate one post in place. Returns false if it is not in the replica.
    pub fn update(&self, id: PostId, f: impl FnOnce(&mut Post)) -> bool {
        let found = {
            let mut posts = self.posts.borrow_mut();
            match posts.iter_mut().find(|p| p.id == id) {
                Some(post) => {
                    f(post);
                    true
                }
                None => false,
            }
        };
        if found {
            self.notifier.notify();
        }
        found
    }

    /// Forget every post, e.g. when the viewer changes.
    pub fn clear(&self) {
        self.posts.borrow_mut().clear();
        self.notifier.notify();
    }

    pub fn posts(&self) -> Vec<Post> {
        self.posts.borrow().clone()
    }
}
