//! Outbound side effects and termination.

use super::super::{ActorState, ChannelActor};
use tracing::info;

impl ChannelActor {
    pub(crate) fn handle_send(&self, text: &str) {
        self.outbound.send_to_target(text, &self.name);
    }

    /// PART, then deregister before the caller gets its reply so a lookup
    /// right after `part()` already misses.
    pub(crate) fn handle_part(&mut self) {
        self.outbound.part_channel(&self.name);
        self.deregister();
        self.state = ActorState::Terminated;
        info!(channel = %self.name, "Parted channel");
    }

    /// Like [`Self::handle_part`] minus the PART.
    pub(crate) fn handle_shutdown(&mut self) {
        self.deregister();
        self.state = ActorState::Terminated;
        info!(channel = %self.name, "Channel actor shut down");
    }
}
