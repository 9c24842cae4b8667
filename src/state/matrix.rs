//! The Matrix - central shared state for the bot.
//!
//! Rule actions receive an `Arc<Matrix>` and reach every other part of the
//! core through it: the channel registry, the outbound writer and the
//! identity we are connected under.

use super::actor::ChannelHandle;
use super::registry::ChannelRegistry;
use crate::config::Config;
use crate::error::{ActionError, ChannelError};
use crate::message::Message;
use crate::outbound::Outbound;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Settings actions may consult.
#[derive(Debug, Clone)]
pub struct MatrixConfig {
    /// Channels to join on welcome.
    pub autojoin: Vec<String>,
}

/// The Matrix - Central shared state container.
pub struct Matrix {
    /// Live channel actors, indexed by lowercase name.
    pub channels: Arc<ChannelRegistry>,
    /// Writes toward the connection layer.
    pub outbound: Arc<dyn Outbound>,
    pub config: MatrixConfig,
    /// Cancelled on shutdown; every worker and actor listens on a child token.
    pub shutdown: CancellationToken,
    /// Our current nickname; changes when the server confirms a NICK.
    nick: RwLock<String>,
}

impl Matrix {
    pub fn new(config: &Config, outbound: Arc<dyn Outbound>) -> Arc<Self> {
        let shutdown = CancellationToken::new();
        let settings = config
            .channels
            .actor_settings(config.dispatch.reply_timeout());
        let channels =
            ChannelRegistry::new(settings, Arc::clone(&outbound), shutdown.child_token());

        Arc::new(Self {
            channels,
            outbound,
            config: MatrixConfig {
                autojoin: config.channels.autojoin.clone(),
            },
            shutdown,
            nick: RwLock::new(config.identity.nick.clone()),
        })
    }

    /// Our current nickname.
    pub fn nick(&self) -> String {
        self.nick.read().clone()
    }

    pub fn set_nick(&self, nick: &str) {
        *self.nick.write() = nick.to_string();
    }

    /// Whether `nick` is us (ASCII case-insensitive).
    pub fn is_me(&self, nick: &str) -> bool {
        self.nick.read().eq_ignore_ascii_case(nick)
    }

    /// Live actor for `name`, if joined.
    pub fn channel(&self, name: &str) -> Option<ChannelHandle> {
        self.channels.lookup(name)
    }

    /// Like [`Matrix::channel`], but absence is an action fault.
    pub fn joined(&self, name: &str) -> Result<ChannelHandle, ActionError> {
        self.channel(name)
            .ok_or_else(|| ActionError::NotJoined(name.to_string()))
    }

    /// Join `name`. Idempotent: an already-joined channel is returned as is.
    pub fn join_channel(&self, name: &str) -> ChannelHandle {
        self.channels.get_or_create(name)
    }

    /// Part `name` if joined. Returns whether anything was parted.
    pub async fn part_channel(&self, name: &str) -> Result<bool, ChannelError> {
        match self.channel(name) {
            Some(handle) => handle.part().await.map(|()| true),
            None => {
                debug!(channel = %name, "Part requested for channel not joined");
                Ok(false)
            }
        }
    }

    /// Answer `message` where it came from: the channel it was sent to, or
    /// privately to the sender.
    pub fn reply(&self, message: &Message, text: &str) -> Result<(), ActionError> {
        let target = match message.channel_target() {
            Some(channel) => channel,
            None => message.nick().ok_or(ActionError::MissingPrefix)?,
        };
        self.outbound.send_to_target(text, target);
        Ok(())
    }

    /// Stop every module worker and channel actor.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbound::{OutboundCommand, RecordingOutbound};

    fn matrix() -> (Arc<Matrix>, Arc<RecordingOutbound>) {
        let outbound = Arc::new(RecordingOutbound::new());
        (Matrix::new(&Config::default(), outbound.clone()), outbound)
    }

    #[test]
    fn reply_targets_channel_or_sender() {
        let (matrix, outbound) = matrix();
        let public = Message::parse(":alice!a@h PRIVMSG #rust :!hi").unwrap();
        let private = Message::parse(":alice!a@h PRIVMSG slircbot :!hi").unwrap();
        let anonymous = Message::parse("PRIVMSG slircbot :!hi").unwrap();

        matrix.reply(&public, "hello").unwrap();
        matrix.reply(&private, "hello").unwrap();
        assert!(matches!(matrix.reply(&anonymous, "hello"), Err(ActionError::MissingPrefix)));

        assert_eq!(
            outbound.take(),
            vec![
                OutboundCommand::Privmsg { target: "#rust".into(), text: "hello".into() },
                OutboundCommand::Privmsg { target: "alice".into(), text: "hello".into() },
            ]
        );
    }

    #[test]
    fn tracks_own_nick() {
        let (matrix, _) = matrix();
        assert!(matrix.is_me("SlircBot"));
        matrix.set_nick("other");
        assert!(!matrix.is_me("slircbot"));
        assert_eq!(matrix.nick(), "other");
    }

    #[tokio::test]
    async fn part_of_unjoined_channel_is_noop() {
        let (matrix, outbound) = matrix();
        assert!(!matrix.part_channel("#nowhere").await.unwrap());
        assert!(matches!(matrix.joined("#nowhere"), Err(ActionError::NotJoined(_))));
        assert!(outbound.commands().is_empty());
    }

    #[tokio::test]
    async fn shutdown_stops_channel_actors() {
        let (matrix, _) = matrix();
        let handle = matrix.join_channel("#rust");
        matrix.shutdown();
        tokio::time::timeout(std::time::Duration::from_secs(1), async {
            while !handle.is_terminated() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
    }
}
