//! Module dispatch configuration.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// Bounded wait for channel actor replies, in milliseconds (default: 5000).
    #[serde(default = "default_reply_timeout_ms")]
    pub reply_timeout_ms: u64,
    /// Restarts allowed per module worker before it is given up on (default: 3).
    #[serde(default = "default_max_module_restarts")]
    pub max_module_restarts: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            reply_timeout_ms: default_reply_timeout_ms(),
            max_module_restarts: default_max_module_restarts(),
        }
    }
}

impl DispatchConfig {
    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }
}

fn default_reply_timeout_ms() -> u64 {
    5000
}

fn default_max_module_restarts() -> u32 {
    3
}
