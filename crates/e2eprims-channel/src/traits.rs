use bytes::Bytes;

/// A set of named FIFO queues of byte buffers.
///
/// Producers append with [`enqueue`](ByteChannel::enqueue); consumers drain
/// with [`dequeue`](ByteChannel::dequeue) until it returns `None`. Names that
/// were never written to behave as empty queues.
pub trait ByteChannel {
    /// Append a copy of `data` to the queue called `name`.
    fn enqueue(&mut self, name: &str, data: &[u8]);

    /// Remove and return the oldest entry of `name`, or `None` when empty.
    fn dequeue(&mut self, name: &str) -> Option<Bytes>;

    /// Number of entries currently waiting on `name`.
    fn pending(&self, name: &str) -> usize;

    /// Returns true if nothing is waiting on `name`.
    fn is_empty(&self, name: &str) -> bool {
        self.pending(name) == 0
    }
}

impl<T: ByteChannel + ?Sized> ByteChannel for &mut T {
    fn enqueue(&mut self, name: &str, data: &[u8]) {
        (**self).enqueue(name, data);
    }

    fn dequeue(&mut self, name: &str) -> Option<Bytes> {
        (**self).dequeue(name)
    }

    fn pending(&self, name: &str) -> usize {
        (**self).pending(name)
    }
}

impl<T: ByteChannel + ?Sized> ByteChannel for Box<T> {
    fn enqueue(&mut self, name: &str, data: &[u8]) {
        (**self).enqueue(name, data);
    }

    fn dequeue(&mut self, name: &str) -> Option<Bytes> {
        (**self).dequeue(name)
    }

    fn pending(&self, name: &str) -> usize {
        (**self).pending(name)
    }
}
