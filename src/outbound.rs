//! Outbound writes toward the connection layer.
//!
//! Everything the core asks the network to do goes through [`Outbound`]. The
//! calls are fire-and-forget: no acknowledgement ever flows back.

use parking_lot::Mutex;
use std::fmt;
use tokio::sync::mpsc;
use tracing::debug;

/// A single request to the connection layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundCommand {
    /// `PRIVMSG <target> :<text>`
    Privmsg { target: String, text: String },
    /// `JOIN <channel>`
    Join(String),
    /// `PART <channel>`
    Part(String),
    /// A preformatted protocol line.
    Raw(String),
}

impl fmt::Display for OutboundCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Privmsg { target, text } => write!(f, "PRIVMSG {target} :{text}"),
            Self::Join(channel) => write!(f, "JOIN {channel}"),
            Self::Part(channel) => write!(f, "PART {channel}"),
            Self::Raw(line) => f.write_str(line),
        }
    }
}

/// Sink for outbound protocol writes.
pub trait Outbound: Send + Sync {
    fn emit(&self, command: OutboundCommand);

    /// Deliver `text` to a channel or nick. Multi-line text becomes one message per line.
    fn send_to_target(&self, text: &str, target: &str) {
        for line in text.lines().filter(|l| !l.is_empty()) {
            self.emit(OutboundCommand::Privmsg {
                target: target.to_string(),
                text: line.to_string(),
            });
        }
    }

    fn join_channel(&self, channel: &str) {
        self.emit(OutboundCommand::Join(channel.to_string()));
    }

    fn part_channel(&self, channel: &str) {
        self.emit(OutboundCommand::Part(channel.to_string()));
    }

    fn send_raw(&self, line: &str) {
        self.emit(OutboundCommand::Raw(line.to_string()));
    }
}

/// Renders commands as wire lines into an unbounded queue.
///
/// The receiving half is drained by whatever owns the socket.
#[derive(Debug, Clone)]
pub struct LineWriter {
    tx: mpsc::UnboundedSender<String>,
}

impl LineWriter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Outbound for LineWriter {
    fn emit(&self, command: OutboundCommand) {
        let line = command.to_string();
        if self.tx.send(line).is_err() {
            debug!(%command, "Outbound writer closed, dropping line");
        }
    }
}

/// Keeps every emitted command in memory.
#[derive(Debug, Default)]
pub struct RecordingOutbound {
    commands: Mutex<Vec<OutboundCommand>>,
}

impl RecordingOutbound {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn commands(&self) -> Vec<OutboundCommand> {
        self.commands.lock().clone()
    }

    /// Remove and return everything emitted so far.
    pub fn take(&self) -> Vec<OutboundCommand> {
        std::mem::take(&mut *self.commands.lock())
    }
}

impl Outbound for RecordingOutbound {
    fn emit(&self, command: OutboundCommand) {
        self.commands.lock().push(command);
    }
}
