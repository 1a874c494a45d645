use std::collections::VecDeque;

use radiolink_frame::Message;

/// Accepted text messages, oldest first.
#[derive(Debug, Default, Clone)]
pub struct MessageQueue {
    items: VecDeque<Message>,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return the new length.
    pub fn push(&mut self, message: Message) -> usize {
        self.items.push_back(message);
        self.items.len()
    }

    pub fn pop(&mut self) -> Option<Message> {
        self.items.pop_front()
    }

    pub fn peek(&self) -> Option<&Message> {
        self.items.front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
