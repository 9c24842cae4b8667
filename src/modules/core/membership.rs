//! Channel membership: JOIN, PART, KICK, QUIT and NAMES replies.

use crate::error::{ActionError, ActionResult};
use crate::message::{Message, is_channel_name};
use crate::rules::ActionContext;
use crate::state::Matrix;
use tracing::{debug, info};

/// Channel named by a JOIN/PART, which some servers put in the trailing part.
fn channel_arg(message: &Message) -> Result<&str, ActionError> {
    message
        .arg(0)
        .or_else(|| Some(message.trailing.as_str()).filter(|t| !t.is_empty()))
        .ok_or(ActionError::MissingArg(0))
}

/// `nick` left `channel`: retire the actor if it was us, else drop the member.
async fn departed(matrix: &Matrix, channel: &str, nick: &str) -> ActionResult {
    if matrix.is_me(nick) {
        if matrix.channels.shutdown_channel(channel).await {
            info!(channel, "Left channel");
        }
        return Ok(());
    }

    match matrix.channel(channel) {
        Some(handle) => {
            handle.del_user(nick).await?;
        }
        None => debug!(channel, nick, "Departure from channel we are not in"),
    }
    Ok(())
}

pub async fn join(ctx: ActionContext) -> ActionResult {
    let nick = ctx.message.nick().ok_or(ActionError::MissingPrefix)?;
    let channel = channel_arg(&ctx.message)?;

    if ctx.matrix.is_me(nick) {
        ctx.matrix.join_channel(channel);
        return Ok(());
    }

    match ctx.matrix.channel(channel) {
        Some(handle) => {
            handle.set_user(nick).await?;
        }
        None => debug!(channel, nick, "Join seen for channel we are not in"),
    }
    Ok(())
}

pub async fn part(ctx: ActionContext) -> ActionResult {
    let nick = ctx.message.nick().ok_or(ActionError::MissingPrefix)?;
    let channel = channel_arg(&ctx.message)?;
    departed(&ctx.matrix, channel, nick).await
}

/// `KICK <channel> <victim> :<reason>`
pub async fn kick(ctx: ActionContext) -> ActionResult {
    let channel = ctx.message.arg(0).ok_or(ActionError::MissingArg(0))?;
    let victim = ctx.message.arg(1).ok_or(ActionError::MissingArg(1))?;
    departed(&ctx.matrix, channel, victim).await
}

pub async fn quit(ctx: ActionContext) -> ActionResult {
    let nick = ctx.message.nick().ok_or(ActionError::MissingPrefix)?;
    for channel in ctx.matrix.channels.handles() {
        if let Err(e) = channel.del_user(nick).await {
            debug!(channel = %channel.name(), error = %e, "Quit cleanup skipped");
        }
    }
    Ok(())
}

/// `353 <me> <type> <channel> :<prefixed nicks>`
pub async fn names(ctx: ActionContext) -> ActionResult {
    let channel = ctx
        .message
        .args
        .iter()
        .rev()
        .find(|a| is_channel_name(a))
        .ok_or(ActionError::MissingArg(2))?;

    let Some(handle) = ctx.matrix.channel(channel) else {
        debug!(channel = %channel, "NAMES for channel we are not in");
        return Ok(());
    };
    for raw in ctx.message.trailing.split_whitespace() {
        handle.set_user(raw).await?;
    }
    Ok(())
}
