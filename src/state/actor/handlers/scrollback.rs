use super::super::ChannelActor;
use crate::message::Message;
use std::sync::Arc;

impl ChannelActor {
    pub(crate) fn handle_log_message(&mut self, message: Arc<Message>) {
        self.buffer.push(message);
    }
}
