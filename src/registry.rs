//! Shared registry of the forums being archived.
//!
//! Populated once from the forum index, then each worker writes only its own
//! slot. The archive writer snapshots every slot, either after all workers
//! finish or at the moment one of them fails.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::models::{Forum, ForumHandle};

/// One worker's forum. Lock briefly, never across an `.await`.
pub type ForumSlot = Arc<Mutex<Forum>>;

/// Lock a slot, recovering the data if a previous holder panicked.
pub fn lock_forum(slot: &ForumSlot) -> MutexGuard<'_, Forum> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
pub struct ForumRegistry {
    slots: Vec<ForumSlot>,
    abnormal: AtomicBool,
}

impl ForumRegistry {
    pub fn new(handles: Vec<ForumHandle>) -> Self {
        Self {
            slots: handles
                .into_iter()
                .map(|h| Arc::new(Mutex::new(Forum::from_handle(h))))
                .collect(),
            abnormal: AtomicBool::new(false),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, index: usize) -> Option<&ForumSlot> {
        self.slots.get(index)
    }

    pub fn slots(&self) -> &[ForumSlot] {
        &self.slots
    }

    /// Copy of every forum as it currently stands.
    pub fn snapshot(&self) -> Vec<Forum> {
        self.slots.iter().map(|s| lock_forum(s).clone()).collect()
    }

    /// Record that some worker terminated abnormally.
    pub fn mark_abnormal(&self) {
        self.abnormal.store(true, Ordering::SeqCst);
    }

    pub fn terminated_normally(&self) -> bool {
        !self.abnormal.load(Ordering::SeqCst)
    }
}
