//! Channel actor event handlers.
//!
//! Each submodule handles a category of [`ChannelEvent`](super::ChannelEvent)
//! messages processed by [`ChannelActor`](super::ChannelActor).

mod lifecycle;
mod members;
mod scrollback;
