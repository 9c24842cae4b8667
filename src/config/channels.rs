//! Channel actor configuration.

use crate::state::{ChannelSettings, DEFAULT_BUFFER_CAPACITY};
use serde::Deserialize;
use std::time::Duration;

/// Channel configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelsConfig {
    /// Channels joined once the server welcomes us.
    #[serde(default)]
    pub autojoin: Vec<String>,
    /// Scrollback entries kept per channel (default: 10000).
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
    /// Channel actor mailbox capacity (default: 100).
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            autojoin: Vec::new(),
            buffer_capacity: default_buffer_capacity(),
            mailbox_capacity: default_mailbox_capacity(),
        }
    }
}

impl ChannelsConfig {
    /// Actor settings, with the request timeout taken from the dispatch section.
    pub fn actor_settings(&self, reply_timeout: Duration) -> ChannelSettings {
        ChannelSettings {
            buffer_capacity: self.buffer_capacity,
            mailbox_capacity: self.mailbox_capacity,
            reply_timeout,
        }
    }
}

fn default_buffer_capacity() -> usize {
    DEFAULT_BUFFER_CAPACITY
}

fn default_mailbox_capacity() -> usize {
    100
}
