//! Bounded window of verbatim recent messages.

use std::collections::VecDeque;

use banter_core::Message;

/// Chronologically ordered, capacity-bounded message buffer.
///
/// Capacity counts raw messages, not exchanges: a window configured for
/// `k` pairs holds at most `2k` messages, and once full every insert
/// evicts the single oldest message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationWindow {
    messages: VecDeque<Message>,
    capacity: usize,
}

impl ConversationWindow {
    /// Create an empty window holding at most `2 * pairs` messages.
    #[must_use]
    pub fn with_pairs(pairs: usize) -> Self {
        Self::with_capacity(pairs.saturating_mul(2))
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a message, evicting from the front beyond capacity.
    pub fn push(&mut self, message: Message) {
        if self.capacity == 0 {
            return;
        }
        while self.messages.len() >= self.capacity {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl Extend<Message> for ConversationWindow {
    fn extend<I: IntoIterator<Item = Message>>(&mut self, iter: I) {
        for message in iter {
            self.push(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(i: usize) -> [Message; 2] {
        [
            Message::human(format!("question {i}")),
            Message::assistant(format!("answer {i}")),
        ]
    }

    #[test]
    fn test_capacity_is_twice_the_pair_count() {
        assert_eq!(ConversationWindow::with_pairs(5).capacity(), 10);
        assert_eq!(ConversationWindow::with_pairs(1).capacity(), 2);
    }

    #[test]
    fn test_evicts_oldest_first() {
        let mut window = ConversationWindow::with_pairs(2);
        for i in 0..5 {
            window.extend(exchange(i));
        }

        assert_eq!(window.len(), 4);
        let contents: Vec<_> = window.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["question 3", "answer 3", "question 4", "answer 4"]
        );
    }

    #[test]
    fn test_eviction_is_per_message() {
        let mut window = ConversationWindow::with_capacity(3);
        window.extend(exchange(0));
        window.extend(exchange(1));

        // Odd capacity splits a pair: the oldest human message goes alone.
        let contents: Vec<_> = window.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["answer 0", "question 1", "answer 1"]);
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut window = ConversationWindow::with_pairs(0);
        window.extend(exchange(0));
        assert!(window.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut window = ConversationWindow::with_pairs(3);
        window.extend(exchange(0));
        window.clear();
        assert!(window.is_empty());
        assert_eq!(window.capacity(), 6);
    }
}
