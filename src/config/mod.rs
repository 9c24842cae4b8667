//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Top-level [`Config`], identity, logging and validator blocks
//! - [`channels`]: Channel actor limits and autojoin list
//! - [`dispatch`]: Module worker and request/response settings
//! - [`validation`]: Startup checks over a loaded config

mod channels;
mod dispatch;
mod types;
pub mod validation;

pub use channels::ChannelsConfig;
pub use dispatch::DispatchConfig;
pub use types::{Config, ConfigError, IdentityConfig, LoggingConfig, ValidatorBlock};
