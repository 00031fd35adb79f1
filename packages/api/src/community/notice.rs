//! User-visible notices raised by failed mutations.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::Utc;

/// Oldest notices are dropped past this many.
const MAX_NOTICES: usize = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub timestamp: String,
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Default)]
struct NoticeQueue {
    entries: Vec<Notice>,
    next_id: u64,
}

/// Non-blocking, user-visible notices (failed likes, rolled-back comments).
#[derive(Clone, Debug, Default)]
pub struct Notices {
    queue: Rc<RefCell<NoticeQueue>>,
}

impl Notices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, level: NoticeLevel, message: impl Into<String>) -> u64 {
        let mut queue = self.queue.borrow_mut();
        let id = queue.next_id;
        queue.next_id += 1;
        queue.entries.push(Notice {
            id,
            timestamp: Utc::now().format("%H:%M:%S").to_string(),
            level,
            message: message.into(),
        });
        if queue.entries.len() > MAX_NOTICES {
            let excess = queue.entries.len() - MAX_NOTICES;
            queue.entries.drain(..excess);
        }
        id
    }

    pub fn snapshot(&self) -> Vec<Notice> {
        self.queue.borrow().entries.clone()
    }

    pub fn dismiss(&self, id: u64) {
        self.queue.borrow_mut().entries.retain(|n| n.id != id);
    }

    pub fn drain(&self) -> Vec<Notice> {
        std::mem::take(&mut self.queue.borrow_mut().entries)
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_dismiss_drain() {
        let notices = Notices::new();
        let first = notices.push(NoticeLevel::Error, "Could not like post");
        notices.push(NoticeLevel::Info, "Signed out");
        assert_eq!(notices.len(), 2);

        notices.dismiss(first);
        let remaining = notices.snapshot();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].message, "Signed out");

        assert_eq!(notices.drain().len(), 1);
        assert!(notices.is_empty());
    }

    #[test]
    fn test_queue_is_bounded() {
        let notices = Notices::new();
        for i in 0..(MAX_NOTICES + 5) {
            notices.push(NoticeLevel::Warning, format!("n{i}"));
        }
        let all = notices.snapshot();
        assert_eq!(all.len(), MAX_NOTICES);
        assert_eq!(all[0].message, "n5");
    }
}
