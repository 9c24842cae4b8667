//! Actor Model for Channel State Management.
//!
//! This module implements the `ChannelActor`, which owns the live state of one
//! joined IRC channel in an isolated Tokio task.
//!
//! # Architecture
//!
//! - **State Ownership**: The `ChannelActor` owns the member registry and scrollback.
//! - **Message Passing**: All interactions happen via `ChannelEvent` messages sent through
//!   a [`ChannelHandle`]; each event carries its own reply channel.
//! - **Concurrency**: Each channel runs on its own task. Events are processed one at a
//!   time, so the state needs no locking.
//!
//! # Lifecycle
//!
//! Spawning puts the actor in the joined state and issues a JOIN. PART, a
//! shutdown event or the global cancellation token moves it to terminated; the
//! task then exits and its registry entry is removed.

use crate::outbound::Outbound;
use crate::state::ChannelRegistry;
use crate::telemetry;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, trace};

mod buffer;
mod handle;
mod handlers;
mod types;

pub use buffer::{DEFAULT_BUFFER_CAPACITY, MessageBuffer};
pub use handle::ChannelHandle;
pub use types::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActorState {
    Joined,
    Terminated,
}

/// Per-actor limits.
#[derive(Debug, Clone)]
pub struct ChannelSettings {
    /// Scrollback entries kept per channel.
    pub buffer_capacity: usize,
    /// Pending events before senders wait.
    pub mailbox_capacity: usize,
    /// Bounded wait for every request/response round trip.
    pub reply_timeout: Duration,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            mailbox_capacity: 100,
            reply_timeout: Duration::from_secs(5),
        }
    }
}

/// The Channel Actor.
///
/// Owns the state of a single channel and processes events sequentially.
pub struct ChannelActor {
    pub name: String,
    id: u64,
    /// Members keyed by ASCII-lowercased nick.
    users: HashMap<String, User>,
    buffer: MessageBuffer,
    outbound: Arc<dyn Outbound>,
    registry: Weak<ChannelRegistry>,
    state: ActorState,
}

impl ChannelActor {
    pub(crate) fn new(
        name: &str,
        id: u64,
        settings: &ChannelSettings,
        outbound: Arc<dyn Outbound>,
        registry: Weak<ChannelRegistry>,
    ) -> Self {
        Self {
            name: name.to_string(),
            id,
            users: HashMap::new(),
            buffer: MessageBuffer::new(settings.buffer_capacity),
            outbound,
            registry,
            state: ActorState::Joined,
        }
    }

    /// Create a new Channel Actor and spawn it.
    ///
    /// The returned task handle completes when the actor terminates; it is
    /// what the registry supervises.
    pub fn spawn(
        name: &str,
        id: u64,
        settings: &ChannelSettings,
        outbound: Arc<dyn Outbound>,
        registry: Weak<ChannelRegistry>,
        shutdown: CancellationToken,
    ) -> (ChannelHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(settings.mailbox_capacity.max(1));
        let actor = Self::new(name, id, settings, outbound, registry);
        let span = telemetry::spans::channel(name, id);
        let task = tokio::spawn(actor.run(rx, shutdown).instrument(span));
        (ChannelHandle::new(name, id, tx, settings.reply_timeout), task)
    }

    /// The main actor loop.
    pub async fn run(mut self, mut rx: mpsc::Receiver<ChannelEvent>, shutdown: CancellationToken) {
        self.outbound.join_channel(&self.name);
        debug!("Channel actor joined");

        while self.state == ActorState::Joined {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => self.state = ActorState::Terminated,
                event = rx.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => self.state = ActorState::Terminated,
                },
            }
        }

        self.deregister();
        debug!("Channel actor terminated");
    }

    fn handle_event(&mut self, event: ChannelEvent) {
        trace!(event = event.kind(), "Channel event");
        match event {
            ChannelEvent::Send { text, reply_tx } => {
                self.handle_send(&text);
                let _ = reply_tx.send(());
            }
            ChannelEvent::SetUser { raw, reply_tx } => {
                let _ = reply_tx.send(self.handle_set_user(&raw));
            }
            ChannelEvent::RenameUser {
                old_nick,
                new_nick,
                reply_tx,
            } => {
                let _ = reply_tx.send(self.handle_rename_user(&old_nick, &new_nick));
            }
            ChannelEvent::GetUser { nick, reply_tx } => {
                let _ = reply_tx.send(self.user(&nick).cloned());
            }
            ChannelEvent::GetUsers { reply_tx } => {
                let _ = reply_tx.send(self.users.values().cloned().collect());
            }
            ChannelEvent::GetUserCount { reply_tx } => {
                let _ = reply_tx.send(self.users.len());
            }
            ChannelEvent::DelUser { nick, reply_tx } => {
                let _ = reply_tx.send(self.handle_del_user(&nick));
            }
            ChannelEvent::LogMessage { message, reply_tx } => {
                self.handle_log_message(message);
                let _ = reply_tx.send(());
            }
            ChannelEvent::QueryBuffer { query } => query(&self.buffer),
            ChannelEvent::Part { reply_tx } => {
                self.handle_part();
                let _ = reply_tx.send(());
            }
            ChannelEvent::Shutdown { reply_tx } => {
                self.handle_shutdown();
                let _ = reply_tx.send(());
            }
        }
    }

    /// Remove this actor's registry entry, if it is still ours.
    fn deregister(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove_actor(&self.name, self.id);
        }
    }
}
