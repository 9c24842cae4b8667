//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use crate::message::is_channel_name;
use std::collections::HashSet;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("identity.nick is required")]
    MissingNick,
    #[error("identity.nick must not contain spaces, got '{0}'")]
    InvalidNick(String),
    #[error("channels.buffer_capacity must be greater than 0")]
    ZeroBufferCapacity,
    #[error("channels.mailbox_capacity must be greater than 0")]
    ZeroMailboxCapacity,
    #[error("channels.autojoin entry is not a channel name: '{0}'")]
    InvalidAutojoin(String),
    #[error("dispatch.reply_timeout_ms must be greater than 0")]
    ZeroReplyTimeout,
    #[error("validator '{0}' is defined more than once")]
    DuplicateValidator(String),
    #[error("validator '{0}' lists no predicates")]
    EmptyValidator(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let nick = &config.identity.nick;
    if nick.is_empty() {
        errors.push(ValidationError::MissingNick);
    } else if nick.contains(char::is_whitespace) {
        errors.push(ValidationError::InvalidNick(nick.clone()));
    }

    if config.channels.buffer_capacity == 0 {
        errors.push(ValidationError::ZeroBufferCapacity);
    }
    if config.channels.mailbox_capacity == 0 {
        errors.push(ValidationError::ZeroMailboxCapacity);
    }
    for channel in &config.channels.autojoin {
        if !is_channel_name(channel) || channel.contains([' ', ',']) {
            errors.push(ValidationError::InvalidAutojoin(channel.clone()));
        }
    }

    if config.dispatch.reply_timeout_ms == 0 {
        errors.push(ValidationError::ZeroReplyTimeout);
    }

    let mut seen = HashSet::new();
    for block in &config.validators {
        if !seen.insert(block.name.as_str()) {
            errors.push(ValidationError::DuplicateValidator(block.name.clone()));
        }
        if block.predicates.is_empty() {
            errors.push(ValidationError::EmptyValidator(block.name.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidatorBlock;

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = Config::default();
        config.identity.nick = "two words".into();
        config.channels.buffer_capacity = 0;
        config.channels.autojoin = vec!["#ok".into(), "rust".into()];
        config.dispatch.reply_timeout_ms = 0;
        config.validators = vec![
            ValidatorBlock { name: "v".into(), predicates: vec!["has_prefix".into()] },
            ValidatorBlock { name: "v".into(), predicates: vec![] },
        ];

        let errors = validate(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidNick("two words".into()),
                ValidationError::ZeroBufferCapacity,
                ValidationError::InvalidAutojoin("rust".into()),
                ValidationError::ZeroReplyTimeout,
                ValidationError::DuplicateValidator("v".into()),
                ValidationError::EmptyValidator("v".into()),
            ]
        );
    }
}
