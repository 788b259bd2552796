//! Change notifications for observers of the document model
//!
//! Documents and items push events into a shared queue; the UI (or any other
//! observer) drains it from the owning thread.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::document::{DocumentId, ItemId};
use crate::property::PropertyKey;

/// A change in the document model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    DocumentAdded(DocumentId),
    DocumentErased(DocumentId),
    ItemAdded {
        document: DocumentId,
        item: ItemId,
    },
    ItemErased {
        document: DocumentId,
        item: ItemId,
    },
    DocumentPropertyChanged {
        document: DocumentId,
        key: PropertyKey,
    },
    ItemPropertyChanged {
        document: DocumentId,
        item: ItemId,
        key: PropertyKey,
    },
}

/// Shared FIFO of pending events
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    inner: Arc<Mutex<VecDeque<AppEvent>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: AppEvent) {
        self.inner.lock().push_back(event);
    }

    /// Take all pending events, oldest first
    pub fn drain(&self) -> Vec<AppEvent> {
        self.inner.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_in_order() {
        let queue = EventQueue::new();
        let shared = queue.clone();
        let a = DocumentId::new();
        let b = DocumentId::new();
        queue.push(AppEvent::DocumentAdded(a));
        shared.push(AppEvent::DocumentErased(b));

        assert_eq!(queue.len(), 2);
        assert_eq!(
            queue.drain(),
            vec![AppEvent::DocumentAdded(a), AppEvent::DocumentErased(b)]
        );
        assert!(shared.is_empty());
    }
}
