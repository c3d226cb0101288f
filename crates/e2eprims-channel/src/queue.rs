use std::collections::{HashMap, VecDeque};

use bytes::Bytes;

use crate::traits::ByteChannel;

/// Lossless named queues.
///
/// Every entry is delivered exactly once, in the order it was enqueued.
#[derive(Debug, Default, Clone)]
pub struct QueueBus {
    queues: HashMap<String, VecDeque<Bytes>>,
}

impl QueueBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an already-owned buffer without copying it.
    pub fn push(&mut self, name: &str, data: Bytes) {
        match self.queues.get_mut(name) {
            Some(queue) => queue.push_back(data),
            None => {
                self.queues.insert(name.to_string(), VecDeque::from([data]));
            }
        }
    }

    /// Discard everything waiting on `name`. Returns how many entries were dropped.
    pub fn clear(&mut self, name: &str) -> usize {
        self.queues.remove(name).map_or(0, |queue| queue.len())
    }

    /// Names that currently hold at least one entry, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .queues
            .iter()
            .filter(|(_, queue)| !queue.is_empty())
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

impl ByteChannel for QueueBus {
    fn enqueue(&mut self, name: &str, data: &[u8]) {
        self.push(name, Bytes::copy_from_slice(data));
    }

    fn dequeue(&mut self, name: &str) -> Option<Bytes> {
        self.queues.get_mut(name)?.pop_front()
    }

    fn pending(&self, name: &str) -> usize {
        self.queues.get(name).map_or(0, VecDeque::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dequeue_returns_entries_in_order() {
        let mut bus = QueueBus::new();
        bus.enqueue("airbag", b"one");
        bus.enqueue("airbag", b"two");
        bus.enqueue("airbag", b"three");

        assert_eq!(bus.pending("airbag"), 3);
        assert_eq!(bus.dequeue("airbag").unwrap().as_ref(), b"one");
        assert_eq!(bus.dequeue("airbag").unwrap().as_ref(), b"two");
        assert_eq!(bus.dequeue("airbag").unwrap().as_ref(), b"three");
        assert!(bus.dequeue("airbag").is_none());
        assert!(bus.is_empty("airbag"));
    }

    #[test]
    fn names_are_independent() {
        let mut bus = QueueBus::new();
        bus.enqueue("left", b"l");
        bus.enqueue("right", b"r");

        assert_eq!(bus.dequeue("right").unwrap().as_ref(), b"r");
        assert_eq!(bus.pending("left"), 1);
        assert_eq!(bus.names(), vec!["left"]);
    }

    #[test]
    fn unknown_name_is_empty() {
        let mut bus = QueueBus::new();
        assert!(bus.is_empty("missing"));
        assert!(bus.dequeue("missing").is_none());
    }

    #[test]
    fn enqueue_copies_caller_buffer() {
        let mut bus = QueueBus::new();
        let mut data = vec![1u8, 2, 3];
        bus.enqueue("copy", &data);
        data[0] = 99;

        assert_eq!(bus.dequeue("copy").unwrap().as_ref(), &[1, 2, 3]);
    }

    #[test]
    fn clear_reports_discarded_entries() {
        let mut bus = QueueBus::new();
        bus.enqueue("x", b"a");
        bus.enqueue("x", b"b");

        assert_eq!(bus.clear("x"), 2);
        assert_eq!(bus.clear("x"), 0);
        assert!(bus.is_empty("x"));
    }

    #[test]
    fn works_through_mutable_reference() {
        fn fill<C: ByteChannel>(mut channel: C) {
            channel.enqueue("ref", b"via-ref");
        }

        let mut bus = QueueBus::new();
        fill(&mut bus);
        assert_eq!(bus.dequeue("ref").unwrap().as_ref(), b"via-ref");
    }
}
