use crate::error::ActionResult;
use crate::rules::ActionContext;
use std::sync::Arc;
use tracing::debug;

/// Append a channel PRIVMSG to that channel's scrollback.
pub async fn log(ctx: ActionContext) -> ActionResult {
    let Some(channel) = ctx.message.channel_target() else {
        return Ok(());
    };
    match ctx.matrix.channel(channel) {
        Some(handle) => handle.log_message(Arc::clone(&ctx.message)).await?,
        None => debug!(channel, "Message for channel we are not in"),
    }
    Ok(())
}
