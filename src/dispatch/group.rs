//! The "modules" broadcast group.

use crate::message::Message;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::trace;

/// Mailbox sender for one module worker.
pub type Mailbox = mpsc::UnboundedSender<Arc<Message>>;

/// Every registered module's mailbox, by module name.
///
/// Broadcasting only clones the `Arc<Message>` into each mailbox; no state
/// is shared between workers.
///
/// Once [`ModuleGroup::close`] has run, the group takes no new members: a
/// mailbox that joins afterwards is dropped, so its worker sees the end of
/// its queue right away.
#[derive(Debug, Default)]
pub struct ModuleGroup {
    members: DashMap<Arc<str>, Mailbox>,
    closed: AtomicBool,
}

impl ModuleGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace `name`'s mailbox. Returns `false` if the group is closed.
    pub fn join(&self, name: Arc<str>, mailbox: Mailbox) -> bool {
        if self.closed.load(Ordering::SeqCst) {
            return false;
        }
        self.members.insert(Arc::clone(&name), mailbox);
        // Lost a race with close(): take ourselves back out.
        if self.closed.load(Ordering::SeqCst) {
            self.members.remove(&name);
            return false;
        }
        true
    }

    /// Stop accepting members and drop every mailbox sender.
    ///
    /// Workers keep reading whatever is already queued and then stop.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.members.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn leave(&self, name: &str) -> bool {
        self.members.remove(name).is_some()
    }

    /// Deliver `message` to every member, in call order per member.
    ///
    /// Returns how many mailboxes accepted it.
    pub fn broadcast(&self, message: &Arc<Message>) -> usize {
        let mut delivered = 0;
        for member in &self.members {
            if member.value().send(Arc::clone(message)).is_ok() {
                delivered += 1;
            } else {
                trace!(module = %member.key(), "Mailbox closed, skipping");
            }
        }
        delivered
    }

    pub fn members(&self) -> Vec<String> {
        self.members.iter().map(|e| e.key().to_string()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
