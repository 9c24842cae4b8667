//! Channel registry and channel actor supervision.
//!
//! The registry maps lowercased channel names to actor handles. Creation goes
//! through `DashMap::entry`, so concurrent joins for the same name resolve to
//! one actor. Each actor task is watched; an actor that panics is removed from
//! the registry and stays gone until someone joins again.

use super::actor::{ChannelActor, ChannelHandle, ChannelSettings};
use crate::metrics;
use crate::outbound::Outbound;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Registry key for a channel name.
pub fn channel_key(name: &str) -> String {
    name.to_lowercase()
}

/// Concurrent channel name → actor table.
pub struct ChannelRegistry {
    channels: DashMap<String, ChannelHandle>,
    next_id: AtomicU64,
    settings: ChannelSettings,
    outbound: Arc<dyn Outbound>,
    shutdown: CancellationToken,
}

impl ChannelRegistry {
    pub fn new(
        settings: ChannelSettings,
        outbound: Arc<dyn Outbound>,
        shutdown: CancellationToken,
    ) -> Arc<Self> {
        Arc::new(Self {
            channels: DashMap::new(),
            next_id: AtomicU64::new(1),
            settings,
            outbound,
            shutdown,
        })
    }

    /// Handle for `name` if an actor is live.
    pub fn lookup(&self, name: &str) -> Option<ChannelHandle> {
        self.channels
            .get(&channel_key(name))
            .map(|r| r.value().clone())
            .filter(|h| !h.is_terminated())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Return the live actor for `name`, spawning one (and sending JOIN) if absent.
    ///
    /// An entry whose actor already terminated is replaced.
    pub fn get_or_create(self: &Arc<Self>, name: &str) -> ChannelHandle {
        match self.channels.entry(channel_key(name)) {
            Entry::Occupied(entry) if !entry.get().is_terminated() => entry.get().clone(),
            Entry::Occupied(mut entry) => {
                let handle = self.spawn_actor(name);
                entry.insert(handle.clone());
                handle
            }
            Entry::Vacant(entry) => {
                let handle = self.spawn_actor(name);
                entry.insert(handle.clone());
                metrics::channel_opened();
                handle
            }
        }
    }

    fn spawn_actor(self: &Arc<Self>, name: &str) -> ChannelHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (handle, task) = ChannelActor::spawn(
            name,
            id,
            &self.settings,
            Arc::clone(&self.outbound),
            Arc::downgrade(self),
            self.shutdown.child_token(),
        );

        let registry = Arc::downgrade(self);
        let watched = name.to_string();
        tokio::spawn(async move {
            if let Err(e) = task.await
                && e.is_panic()
            {
                error!(channel = %watched, id, "Channel actor crashed");
                metrics::record_channel_crash();
                if let Some(registry) = registry.upgrade() {
                    registry.remove_actor(&watched, id);
                }
            }
        });

        debug!(channel = %name, id, "Spawned channel actor");
        handle
    }

    /// Remove the entry for `name` only if it still points at actor `id`.
    pub(crate) fn remove_actor(&self, name: &str, id: u64) -> bool {
        let removed = self
            .channels
            .remove_if(&channel_key(name), |_, handle| handle.id() == id)
            .is_some();
        if removed {
            metrics::channel_closed();
            debug!(channel = %name, id, "Removed channel actor");
        }
        removed
    }

    /// Stop `name`'s actor without a PART.
    ///
    /// The entry stays until the actor has worked through its queue and
    /// removed itself, so a join in the meantime reuses the old actor rather
    /// than racing it with a second one.
    pub async fn shutdown_channel(&self, name: &str) -> bool {
        let Some(handle) = self.lookup(name) else {
            return false;
        };
        handle.shutdown().await.is_ok()
    }

    /// Names of all live channels.
    pub fn names(&self) -> Vec<String> {
        self.handles()
            .iter()
            .map(|h| h.name().to_string())
            .collect()
    }

    /// Handles of all live channels. Guards are released before returning.
    pub fn handles(&self) -> Vec<ChannelHandle> {
        self.channels
            .iter()
            .map(|e| e.value().clone())
            .filter(|h| !h.is_terminated())
            .collect()
    }

    /// Number of live channels.
    pub fn len(&self) -> usize {
        self.channels
            .iter()
            .filter(|e| !e.value().is_terminated())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Settings every new actor is spawned with.
    pub fn settings(&self) -> &ChannelSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbound::{OutboundCommand, RecordingOutbound};
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn registry() -> (Arc<ChannelRegistry>, Arc<RecordingOutbound>) {
        let outbound = Arc::new(RecordingOutbound::new());
        let registry = ChannelRegistry::new(
            ChannelSettings::default(),
            outbound.clone(),
            CancellationToken::new(),
        );
        (registry, outbound)
    }

    #[tokio::test]
    async fn get_or_create_is_idempotent() {
        let (registry, outbound) = registry();
        let a = registry.get_or_create("#Rust");
        let b = registry.get_or_create("#rust");
        assert_eq!(a.id(), b.id());
        assert_eq!(registry.len(), 1);

        // Round trip so the actor has certainly run its JOIN.
        a.get_user_count().await.unwrap();
        assert_eq!(outbound.commands(), vec![OutboundCommand::Join("#Rust".into())]);
    }

    #[tokio::test]
    async fn part_removes_entry_before_replying() {
        let (registry, _) = registry();
        let handle = registry.get_or_create("#rust");
        handle.part().await.unwrap();
        assert!(registry.lookup("#rust").is_none());
        assert!(registry.is_empty());

        let again = registry.get_or_create("#rust");
        assert_ne!(again.id(), handle.id());
    }

    #[tokio::test]
    async fn stale_remove_does_not_evict_newer_actor() {
        let (registry, _) = registry();
        let first = registry.get_or_create("#rust");
        assert!(registry.shutdown_channel("#rust").await);
        let second = registry.get_or_create("#rust");

        assert!(!registry.remove_actor("#rust", first.id()));
        assert_eq!(registry.lookup("#rust").map(|h| h.id()), Some(second.id()));
    }

    #[tokio::test]
    async fn shutdown_channel_sends_no_part() {
        let (registry, outbound) = registry();
        let handle = registry.get_or_create("#rust");
        handle.get_user_count().await.unwrap();
        assert!(registry.shutdown_channel("#rust").await);
        assert!(!registry.shutdown_channel("#rust").await);
        assert!(
            !outbound
                .commands()
                .iter()
                .any(|c| matches!(c, OutboundCommand::Part(_)))
        );
    }

    #[tokio::test]
    async fn concurrent_joins_spawn_one_actor() {
        let (registry, _) = registry();
        let mut tasks = Vec::new();
        for _ in 0..16 {
            let registry = Arc::clone(&registry);
            tasks.push(tokio::spawn(async move { registry.get_or_create("#race").id() }));
        }
        let mut ids = Vec::new();
        for task in tasks {
            ids.push(task.await.unwrap());
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
        assert_eq!(registry.names(), vec!["#race".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn shutdown_keeps_the_entry_until_the_actor_stops() {
        let (registry, _) = registry();
        let handle = registry.get_or_create("#rust");

        let (started_tx, started_rx) = oneshot::channel();
        let busy = handle.clone();
        let query = tokio::spawn(async move {
            busy.get_buffer(move |_| {
                let _ = started_tx.send(());
                std::thread::sleep(Duration::from_millis(200));
            })
            .await
        });
        started_rx.await.unwrap();

        let closing = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.shutdown_channel("#rust").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // The old actor is still busy with the query; no second one appears.
        assert_eq!(registry.get_or_create("#rust").id(), handle.id());
        assert_eq!(registry.len(), 1);

        query.await.unwrap().unwrap();
        assert!(closing.await.unwrap());
        assert!(registry.lookup("#rust").is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn len_counts_only_live_actors() {
        let (registry, _) = registry();
        let live = registry.get_or_create("#live");
        let doomed = registry.get_or_create("#doomed");
        live.get_user_count().await.unwrap();

        let crashed = doomed.get_buffer(|_| -> usize { panic!("query blew up") }).await;
        assert!(crashed.is_err());

        // Whether or not the crash watcher has run yet, the counts agree.
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.len(), registry.handles().len());
        assert!(!registry.is_empty());
    }
}
