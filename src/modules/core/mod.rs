//! The core module.
//!
//! Mirrors what the server tells us into the channel actors: our own JOINs
//! and PARTs create and retire actors, other users' membership changes and
//! NAMES replies update the member tables, and channel PRIVMSGs land in
//! scrollback. It also answers PING.

mod connection;
mod membership;
mod scrollback;

use super::CHANNEL_MESSAGE;
use crate::error::RuleError;
use crate::rules::{ModuleBuilder, ModuleSpec, ValidatorSet};

/// NAMES reply numeric.
pub const RPL_NAMREPLY: &str = "353";
/// Welcome numeric; registration is complete.
pub const RPL_WELCOME: &str = "001";

pub fn module(validators: &ValidatorSet) -> Result<ModuleSpec, RuleError> {
    Ok(ModuleBuilder::new("core", validators)
        .handle("PING", |r| {
            r.always(connection::pong);
            Ok(())
        })?
        .handle(RPL_WELCOME, |r| {
            r.always(connection::welcome);
            Ok(())
        })?
        .handle("NICK", |r| {
            r.always(connection::nick);
            Ok(())
        })?
        .handle("JOIN", |r| {
            r.always(membership::join);
            Ok(())
        })?
        .handle("PART", |r| {
            r.always(membership::part);
            Ok(())
        })?
        .handle("KICK", |r| {
            r.always(membership::kick);
            Ok(())
        })?
        .handle("QUIT", |r| {
            r.always(membership::quit);
            Ok(())
        })?
        .handle(RPL_NAMREPLY, |r| {
            r.always(membership::names);
            Ok(())
        })?
        .handle("PRIVMSG", |r| {
            r.validate(CHANNEL_MESSAGE, |scoped| {
                scoped.always(scrollback::log);
                Ok(())
            })?;
            Ok(())
        })?
        .build())
}
