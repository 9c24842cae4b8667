//! Parsed IRC protocol messages.
//!
//! A [`Message`] is produced once by the connection layer and then shared
//! read-only (as `Arc<Message>`) between every module worker and channel actor.

use std::fmt;
use thiserror::Error;

/// Characters that introduce a channel name.
pub const CHANNEL_SIGILS: [char; 4] = ['#', '&', '+', '!'];

/// Message source, `nick!user@host`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prefix {
    pub nick: String,
    pub user: Option<String>,
    pub host: Option<String>,
}

impl Prefix {
    /// Parse a prefix without its leading `:`.
    pub fn parse(raw: &str) -> Self {
        let (nick_user, host) = match raw.split_once('@') {
            Some((left, host)) => (left, Some(host.to_string())),
            None => (raw, None),
        };
        let (nick, user) = match nick_user.split_once('!') {
            Some((nick, user)) => (nick, Some(user.to_string())),
            None => (nick_user, None),
        };
        Self {
            nick: nick.to_string(),
            user,
            host,
        }
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.nick)?;
        if let Some(user) = &self.user {
            write!(f, "!{user}")?;
        }
        if let Some(host) = &self.host {
            write!(f, "@{host}")?;
        }
        Ok(())
    }
}

/// Errors from [`Message::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty line")]
    Empty,
    #[error("missing command")]
    MissingCommand,
}

/// A parsed IRC message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub prefix: Option<Prefix>,
    pub command: String,
    /// Middle parameters, in wire order.
    pub args: Vec<String>,
    /// Trailing parameter; empty when the line had none.
    pub trailing: String,
}

impl Message {
    /// Build a message with no prefix.
    pub fn new(command: impl Into<String>, args: Vec<String>, trailing: impl Into<String>) -> Self {
        Self {
            prefix: None,
            command: command.into(),
            args,
            trailing: trailing.into(),
        }
    }

    /// Attach a source prefix.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(Prefix::parse(prefix));
        self
    }

    /// Parse one wire line (without CRLF). Message tags are skipped.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let mut rest = line.trim_end_matches(['\r', '\n']).trim_start();
        if rest.is_empty() {
            return Err(ParseError::Empty);
        }

        if rest.starts_with('@') {
            rest = rest.split_once(' ').map_or("", |(_, r)| r).trim_start();
        }

        let mut prefix = None;
        if let Some(stripped) = rest.strip_prefix(':') {
            let (raw, r) = stripped.split_once(' ').unwrap_or((stripped, ""));
            prefix = Some(Prefix::parse(raw));
            rest = r.trim_start();
        }

        let (head, trailing) = match rest.split_once(" :") {
            Some((head, trailing)) => (head, trailing.to_string()),
            None => match rest.strip_prefix(':') {
                Some(trailing) => ("", trailing.to_string()),
                None => (rest, String::new()),
            },
        };

        let mut words = head.split(' ').filter(|w| !w.is_empty());
        let command = words.next().ok_or(ParseError::MissingCommand)?;

        Ok(Self {
            prefix,
            command: command.to_ascii_uppercase(),
            args: words.map(str::to_string).collect(),
            trailing,
        })
    }

    /// Nick of the sender, if the message has a prefix.
    pub fn nick(&self) -> Option<&str> {
        self.prefix.as_ref().map(|p| p.nick.as_str())
    }

    /// Argument at `index`.
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// The first argument if it names a channel.
    pub fn channel_target(&self) -> Option<&str> {
        self.arg(0).filter(|a| is_channel_name(a))
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, ":{prefix} ")?;
        }
        f.write_str(&self.command)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        if !self.trailing.is_empty() {
            write!(f, " :{}", self.trailing)?;
        }
        Ok(())
    }
}

/// Whether `name` starts with a channel sigil.
pub fn is_channel_name(name: &str) -> bool {
    name.starts_with(CHANNEL_SIGILS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_privmsg_with_full_prefix() {
        let msg = Message::parse(":alice!al@host.example PRIVMSG #rust :hello there").unwrap();
        let prefix = msg.prefix.as_ref().unwrap();
        assert_eq!(prefix.nick, "alice");
        assert_eq!(prefix.user.as_deref(), Some("al"));
        assert_eq!(prefix.host.as_deref(), Some("host.example"));
        assert_eq!(msg.command, "PRIVMSG");
        assert_eq!(msg.args, vec!["#rust"]);
        assert_eq!(msg.trailing, "hello there");
        assert_eq!(msg.channel_target(), Some("#rust"));
    }

    #[test]
    fn parses_ping_without_prefix() {
        let msg = Message::parse("PING :irc.example.net\r\n").unwrap();
        assert!(msg.prefix.is_none());
        assert_eq!(msg.command, "PING");
        assert!(msg.args.is_empty());
        assert_eq!(msg.trailing, "irc.example.net");
    }

    #[test]
    fn parses_numeric_and_skips_tags() {
        let msg =
            Message::parse("@time=2024-01-01T00:00:00Z :srv 353 me = #rust :@alice +bob carol")
                .unwrap();
        assert_eq!(msg.nick(), Some("srv"));
        assert_eq!(msg.command, "353");
        assert_eq!(msg.args, vec!["me", "=", "#rust"]);
        assert_eq!(msg.trailing, "@alice +bob carol");
    }

    #[test]
    fn line_without_trailing_has_empty_trailing() {
        let msg = Message::parse(":bob!b@h JOIN #rust").unwrap();
        assert_eq!(msg.args, vec!["#rust"]);
        assert_eq!(msg.trailing, "");
    }

    #[test]
    fn rejects_empty_lines() {
        assert_eq!(Message::parse("  "), Err(ParseError::Empty));
        assert_eq!(Message::parse(":onlyprefix"), Err(ParseError::MissingCommand));
    }

    #[test]
    fn display_round_trips_common_shape() {
        let line = ":alice!al@h PRIVMSG #rust :hi all";
        assert_eq!(Message::parse(line).unwrap().to_string(), line);
    }
}
