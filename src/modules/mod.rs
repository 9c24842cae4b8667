//! Built-in modules.
//!
//! - [`core`](self::core): keeps channel actors in step with the server (PING, welcome,
//!   membership changes, scrollback).
//! - [`commands`]: a few `!` commands answered from channel state.

pub mod commands;
pub mod core;

use crate::config::Config;
use crate::error::RuleError;
use crate::rules::{ModuleSpec, ValidatorSet};

/// Chain passing PRIVMSGs from a user to a channel.
pub const CHANNEL_MESSAGE: &str = "channel_message";
/// Chain passing PRIVMSGs from a user addressed to us directly.
pub const PRIVATE_MESSAGE: &str = "private_message";

/// Validator chains from `config`, plus the stock chains it does not redefine.
pub fn validators(config: &Config) -> Result<ValidatorSet, RuleError> {
    let mut set = ValidatorSet::with_builtins();
    for block in &config.validators {
        set.define(&block.name, &block.predicates)?;
    }
    if !set.contains(CHANNEL_MESSAGE) {
        set.define(CHANNEL_MESSAGE, &["has_prefix", "channel_target"])?;
    }
    if !set.contains(PRIVATE_MESSAGE) {
        set.define(PRIVATE_MESSAGE, &["has_prefix", "private_target"])?;
    }
    Ok(set)
}

/// Every built-in module, ready for registration.
pub fn builtin_modules(validators: &ValidatorSet) -> Result<Vec<ModuleSpec>, RuleError> {
    Ok(vec![self::core::module(validators)?, commands::module(validators)?])
}
