//! Connection-level messages: PING, welcome and nick changes.

use crate::error::{ActionError, ActionResult};
use crate::rules::ActionContext;
use tracing::{debug, info};

/// PING → `PONG :<token>`.
pub async fn pong(ctx: ActionContext) -> ActionResult {
    let message = &ctx.message;
    let token = if message.trailing.is_empty() {
        message.arg(0).unwrap_or_default()
    } else {
        message.trailing.as_str()
    };
    ctx.matrix.outbound.send_raw(&format!("PONG :{token}"));
    Ok(())
}

/// 001 → record the nick the server gave us and join the autojoin list.
pub async fn welcome(ctx: ActionContext) -> ActionResult {
    if let Some(nick) = ctx.message.arg(0) {
        ctx.matrix.set_nick(nick);
    }
    info!(
        nick = %ctx.matrix.nick(),
        channels = ctx.matrix.config.autojoin.len(),
        "Registered with server"
    );
    for channel in &ctx.matrix.config.autojoin {
        ctx.matrix.join_channel(channel);
    }
    Ok(())
}

/// NICK → rename the user in every channel, tracking our own nick.
pub async fn nick(ctx: ActionContext) -> ActionResult {
    let old = ctx.message.nick().ok_or(ActionError::MissingPrefix)?;
    let new = match ctx.message.trailing.as_str() {
        "" => ctx.message.arg(0).ok_or(ActionError::MissingArg(0))?,
        trailing => trailing,
    };

    if ctx.matrix.is_me(old) {
        info!(old, new, "Our nick changed");
        ctx.matrix.set_nick(new);
    }

    for channel in ctx.matrix.channels.handles() {
        if let Err(e) = channel.rename_user(old, new).await {
            debug!(channel = %channel.name(), error = %e, "Rename skipped");
        }
    }
    Ok(())
}
