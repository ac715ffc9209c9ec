//! Control mailbox between input threads and the render loop.
//!
//! Producers append under a mutex; the render loop swaps the whole pending
//! list out once per iteration and applies it after releasing the lock, so
//! a producer only ever waits for an append or a swap.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use control_protocol::ControlMessage;

struct SharedMailbox {
    pending: Mutex<Vec<ControlMessage>>,
    posted: AtomicU64,
    drained: AtomicU64,
}

impl SharedMailbox {
    fn lock_pending(&self) -> MutexGuard<'_, Vec<ControlMessage>> {
        // The list only ever holds whole `Copy` messages, so a panic while
        // the lock was held cannot leave it half-updated.
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Producer handle. Cheap to clone; every clone appends to the same list.
#[derive(Clone)]
pub struct MailboxSender {
    shared: Arc<SharedMailbox>,
}

impl MailboxSender {
    pub fn post(&self, message: ControlMessage) {
        self.shared.lock_pending().push(message);
        self.shared.posted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn posted_messages(&self) -> u64 {
        self.shared.posted.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for MailboxSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailboxSender")
            .field("posted", &self.posted_messages())
            .finish()
    }
}

/// Consumer handle owned by the render loop. Not `Clone`: there is exactly
/// one drain site.
pub struct MailboxReceiver {
    shared: Arc<SharedMailbox>,
}

impl MailboxReceiver {
    /// Replaces `batch` with every message posted since the previous drain,
    /// in posting order. The old contents of `batch` are discarded and its
    /// allocation becomes the new pending list.
    pub fn drain_into(&self, batch: &mut Vec<ControlMessage>) -> usize {
        batch.clear();
        {
            let mut pending = self.shared.lock_pending();
            std::mem::swap(&mut *pending, batch);
        }
        let drained = batch.len();
        if drained > 0 {
            self.shared
                .drained
                .fetch_add(drained as u64, Ordering::Relaxed);
        }
        drained
    }

    pub fn drained_messages(&self) -> u64 {
        self.shared.drained.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for MailboxReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailboxReceiver")
            .field("drained", &self.drained_messages())
            .finish()
    }
}

pub fn control_mailbox(initial_capacity: usize) -> (MailboxSender, MailboxReceiver) {
    let shared = Arc::new(SharedMailbox {
        pending: Mutex::new(Vec::with_capacity(initial_capacity)),
        posted: AtomicU64::new(0),
        drained: AtomicU64::new(0),
    });
    log::debug!("[mailbox] created with capacity {initial_capacity}");
    (
        MailboxSender {
            shared: Arc::clone(&shared),
        },
        MailboxReceiver { shared },
    )
}
