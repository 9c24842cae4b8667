//! Caller-side handle to a channel actor.
//!
//! Every operation is a request/response round trip with a bounded wait. A
//! reply that never arrives is the actor's fault and surfaces as
//! [`ChannelError::Timeout`].

use super::buffer::MessageBuffer;
use super::types::{ChannelEvent, User};
use crate::error::ChannelError;
use crate::message::Message;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Cloneable address of one channel actor.
#[derive(Clone)]
pub struct ChannelHandle {
    name: Arc<str>,
    id: u64,
    tx: mpsc::Sender<ChannelEvent>,
    timeout: Duration,
}

impl ChannelHandle {
    pub(crate) fn new(
        name: &str,
        id: u64,
        tx: mpsc::Sender<ChannelEvent>,
        timeout: Duration,
    ) -> Self {
        Self {
            name: Arc::from(name),
            id,
            tx,
            timeout,
        }
    }

    /// Channel name as first joined.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identity of the actor behind this handle; unique per spawn.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// True once the actor has stopped reading its mailbox.
    pub fn is_terminated(&self) -> bool {
        self.tx.is_closed()
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> ChannelEvent,
    ) -> Result<T, ChannelError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let event = make(reply_tx);

        let round_trip = async {
            self.tx
                .send(event)
                .await
                .map_err(|_| ChannelError::Terminated(self.name.to_string()))?;
            reply_rx
                .await
                .map_err(|_| ChannelError::Terminated(self.name.to_string()))
        };

        tokio::time::timeout(self.timeout, round_trip)
            .await
            .map_err(|_| ChannelError::Timeout(self.name.to_string()))?
    }

    /// Say `text` in the channel.
    pub async fn send(&self, text: impl Into<String>) -> Result<(), ChannelError> {
        let text = text.into();
        self.request(|reply_tx| ChannelEvent::Send { text, reply_tx })
            .await
    }

    /// Upsert a member from a NAMES-style nick (`@alice`, `+bob`, `carol`).
    ///
    /// `None` if nothing is left once the role symbols are stripped.
    pub async fn set_user(&self, raw: impl Into<String>) -> Result<Option<User>, ChannelError> {
        let raw = raw.into();
        self.request(|reply_tx| ChannelEvent::SetUser { raw, reply_tx })
            .await
    }

    /// Move `old_nick`'s record to `new_nick`. Returns the renamed user, if any.
    pub async fn rename_user(
        &self,
        old_nick: impl Into<String>,
        new_nick: impl Into<String>,
    ) -> Result<Option<User>, ChannelError> {
        let old_nick = old_nick.into();
        let new_nick = new_nick.into();
        self.request(|reply_tx| ChannelEvent::RenameUser {
            old_nick,
            new_nick,
            reply_tx,
        })
        .await
    }

    pub async fn get_user(&self, nick: impl Into<String>) -> Result<Option<User>, ChannelError> {
        let nick = nick.into();
        self.request(|reply_tx| ChannelEvent::GetUser { nick, reply_tx })
            .await
    }

    pub async fn get_users(&self) -> Result<Vec<User>, ChannelError> {
        self.request(|reply_tx| ChannelEvent::GetUsers { reply_tx })
            .await
    }

    pub async fn get_user_count(&self) -> Result<usize, ChannelError> {
        self.request(|reply_tx| ChannelEvent::GetUserCount { reply_tx })
            .await
    }

    /// Remove a member. Returns the removed user, if any.
    pub async fn del_user(&self, nick: impl Into<String>) -> Result<Option<User>, ChannelError> {
        let nick = nick.into();
        self.request(|reply_tx| ChannelEvent::DelUser { nick, reply_tx })
            .await
    }

    pub async fn log_message(&self, message: Arc<Message>) -> Result<(), ChannelError> {
        self.request(|reply_tx| ChannelEvent::LogMessage { message, reply_tx })
            .await
    }

    /// Run `query` over the scrollback inside the actor and return its result.
    pub async fn get_buffer<R, F>(&self, query: F) -> Result<R, ChannelError>
    where
        F: FnOnce(&MessageBuffer) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.request(move |reply_tx| ChannelEvent::QueryBuffer {
            query: Box::new(move |buffer| {
                let _ = reply_tx.send(query(buffer));
            }),
        })
        .await
    }

    /// Leave the channel. The actor terminates after replying.
    pub async fn part(&self) -> Result<(), ChannelError> {
        self.request(|reply_tx| ChannelEvent::Part { reply_tx })
            .await
    }

    /// Stop the actor without a PART.
    ///
    /// Events queued ahead of this one are still handled. The actor removes
    /// its registry entry before replying.
    pub async fn shutdown(&self) -> Result<(), ChannelError> {
        self.request(|reply_tx| ChannelEvent::Shutdown { reply_tx })
            .await
    }
}

impl fmt::Debug for ChannelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelHandle")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("terminated", &self.is_terminated())
            .finish()
    }
}
