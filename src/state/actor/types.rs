use super::buffer::MessageBuffer;
use crate::message::Message;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Channel role, highest first.
///
/// `~`, `&` and `@` all map to [`Role::Op`]; `Owner` is never produced by
/// prefix parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Owner,
    Op,
    HalfOp,
    Voice,
    Normal,
}

impl Role {
    /// Role for a NAMES-style prefix symbol.
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '~' | '&' | '@' => Some(Self::Op),
            '%' => Some(Self::HalfOp),
            '+' => Some(Self::Voice),
            _ => None,
        }
    }

    pub fn is_op(self) -> bool {
        self <= Self::Op
    }
}

/// Split `@alice` into (`Op`, `alice`).
///
/// Several stacked symbols (`@+alice`, multi-prefix) are all stripped; the
/// first one decides the role.
pub fn parse_prefixed_nick(raw: &str) -> (Role, &str) {
    let nick = raw.trim_start_matches(|c| Role::from_symbol(c).is_some());
    let role = raw
        .chars()
        .next()
        .and_then(Role::from_symbol)
        .unwrap_or(Role::Normal);
    (role, nick)
}

/// A tracked channel member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub nick: String,
    pub role: Role,
}

/// Read-only buffer query shipped to the actor.
pub type BufferQuery = Box<dyn FnOnce(&MessageBuffer) + Send>;

/// Events that can be sent to a Channel Actor.
pub enum ChannelEvent {
    /// Say something in the channel.
    Send {
        text: String,
        reply_tx: oneshot::Sender<()>,
    },
    /// Upsert a member from a prefixed nick (`@alice`).
    SetUser {
        raw: String,
        reply_tx: oneshot::Sender<Option<User>>,
    },
    RenameUser {
        old_nick: String,
        new_nick: String,
        reply_tx: oneshot::Sender<Option<User>>,
    },
    GetUser {
        nick: String,
        reply_tx: oneshot::Sender<Option<User>>,
    },
    GetUsers {
        reply_tx: oneshot::Sender<Vec<User>>,
    },
    GetUserCount {
        reply_tx: oneshot::Sender<usize>,
    },
    DelUser {
        nick: String,
        reply_tx: oneshot::Sender<Option<User>>,
    },
    /// Append to scrollback.
    LogMessage {
        message: Arc<Message>,
        reply_tx: oneshot::Sender<()>,
    },
    /// Run a read-only query over scrollback. The query owns its reply channel.
    QueryBuffer { query: BufferQuery },
    /// Leave the channel and terminate.
    Part { reply_tx: oneshot::Sender<()> },
    /// Terminate without telling the server (we were already removed).
    Shutdown { reply_tx: oneshot::Sender<()> },
}

impl ChannelEvent {
    /// Event name for tracing.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Send { .. } => "send",
            Self::SetUser { .. } => "set_user",
            Self::RenameUser { .. } => "rename_user",
            Self::GetUser { .. } => "get_user",
            Self::GetUsers { .. } => "get_users",
            Self::GetUserCount { .. } => "get_user_count",
            Self::DelUser { .. } => "del_user",
            Self::LogMessage { .. } => "log_message",
            Self::QueryBuffer { .. } => "query_buffer",
            Self::Part { .. } => "part",
            Self::Shutdown { .. } => "shutdown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_symbols() {
        assert_eq!(parse_prefixed_nick("@alice"), (Role::Op, "alice"));
        assert_eq!(parse_prefixed_nick("~root"), (Role::Op, "root"));
        assert_eq!(parse_prefixed_nick("&admin"), (Role::Op, "admin"));
        assert_eq!(parse_prefixed_nick("%helper"), (Role::HalfOp, "helper"));
        assert_eq!(parse_prefixed_nick("+carol"), (Role::Voice, "carol"));
        assert_eq!(parse_prefixed_nick("bob"), (Role::Normal, "bob"));
    }

    #[test]
    fn stacked_symbols_take_the_first() {
        assert_eq!(parse_prefixed_nick("@+dave"), (Role::Op, "dave"));
        assert_eq!(parse_prefixed_nick("+%eve"), (Role::Voice, "eve"));
    }

    #[test]
    fn op_tier_ordering() {
        assert!(Role::Owner.is_op());
        assert!(Role::Op.is_op());
        assert!(!Role::HalfOp.is_op());
        assert!(Role::Voice < Role::Normal);
    }
}
