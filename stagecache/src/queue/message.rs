//! Single-use envelope around a queued payload.

/// A payload plus the bookkeeping a queue needs to route it.
///
/// The message id is an optional caller-assigned identifier (empty when
/// absent) used to pull a specific item out of arrival order. The cache index
/// records which memory tier the payload was placed in.
#[derive(Debug)]
pub struct Message<T> {
    data: T,
    cache_index: usize,
    message_id: String,
}

impl<T> Message<T> {
    pub fn new(data: T, cache_index: usize, message_id: impl Into<String>) -> Self {
        Self {
            data,
            cache_index,
            message_id: message_id.into(),
        }
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    pub fn cache_index(&self) -> usize {
        self.cache_index
    }

    /// Borrow the payload without releasing it.
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Move the payload out, consuming the envelope.
    pub fn release_data(self) -> T {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_accessors() {
        let message = Message::new(vec![1, 2, 3], 2, "join-left");

        assert_eq!(message.message_id(), "join-left");
        assert_eq!(message.cache_index(), 2);
        assert_eq!(message.data().len(), 3);
        assert_eq!(message.release_data(), vec![1, 2, 3]);
    }

    #[test]
    fn test_message_without_id() {
        let message = Message::new("payload", 0, "");
        assert!(message.message_id().is_empty());
    }
}
