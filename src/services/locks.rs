// src/services/locks.rs

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Serializes lifecycle operations per (student, quiz).
///
/// Starting, answering and closing all run their read-check-write sequence
/// while holding the pair's guard, so two racing starts cannot both pass the
/// "already passed" check and two racing closes cannot both score the attempt.
#[derive(Debug, Default)]
pub struct AttemptLocks {
    slots: Mutex<HashMap<(i64, i64), Arc<AsyncMutex<()>>>>,
}

impl AttemptLocks {
    pub async fn acquire(&self, student_id: i64, quiz_id: i64) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            // drop slots nobody holds or waits on
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            slots.entry((student_id, quiz_id)).or_default().clone()
        };
        slot.lock_owned().await
    }

    pub fn tracked(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
