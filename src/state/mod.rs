//! State management module.
//!
//! Contains the Matrix (shared bot state), the channel registry and the
//! channel actors it supervises.

pub mod actor;
mod matrix;
mod registry;

pub use actor::{
    ChannelActor, ChannelEvent, ChannelHandle, ChannelSettings, DEFAULT_BUFFER_CAPACITY,
    MessageBuffer, Role, User, parse_prefixed_nick,
};
pub use matrix::Matrix;
pub use registry::{ChannelRegistry, channel_key};
