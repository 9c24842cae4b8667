//! slircbot - Straylight IRC Bot
//!
//! The message-routing and state core of an IRC client: a rule-driven
//! dispatcher that fans parsed protocol messages out to handler modules, and
//! one actor per joined channel owning that channel's members and scrollback.
//!
//! - [`rules`]: pattern compiler, validator chains, per-module rule tables
//! - [`dispatch`]: one supervised worker per module
//! - [`state`]: the [`Matrix`](state::Matrix), channel registry and actors
//! - [`modules`]: built-in modules

pub mod config;
pub mod dispatch;
pub mod error;
pub mod message;
pub mod metrics;
pub mod modules;
pub mod outbound;
pub mod rules;
pub mod state;
pub mod telemetry;

pub use dispatch::Dispatcher;
pub use message::Message;
pub use state::Matrix;
