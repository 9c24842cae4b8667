//! Channel `!` commands answered from channel state.
//!
//! | Command        | Reply                                       |
//! |----------------|---------------------------------------------|
//! | `!ping`        | `pong`                                      |
//! | `!users`       | member count of the channel                 |
//! | `!seen <nick>` | the last line `<nick>` said in the channel  |
//! | `!say ~text`   | repeats `text` (channel ops only)           |

use super::CHANNEL_MESSAGE;
use crate::error::{ActionError, ActionResult, RuleError};
use crate::rules::{ActionContext, ModuleBuilder, ModuleSpec, ValidatorSet};
use tracing::debug;

pub fn module(validators: &ValidatorSet) -> Result<ModuleSpec, RuleError> {
    Ok(ModuleBuilder::new("commands", validators)
        .handle("PRIVMSG", |r| {
            r.validate(CHANNEL_MESSAGE, |scoped| {
                scoped.literal("!ping", ping).literal("!users", users);
                scoped.pattern("!seen :nick", seen)?;
                scoped.pattern("!say ~text", say)?;
                Ok(())
            })?;
            Ok(())
        })?
        .build())
}

async fn ping(ctx: ActionContext) -> ActionResult {
    ctx.matrix.reply(&ctx.message, "pong")
}

async fn users(ctx: ActionContext) -> ActionResult {
    let channel = ctx.message.channel_target().ok_or(ActionError::MissingArg(0))?;
    let count = ctx.matrix.joined(channel)?.get_user_count().await?;
    ctx.matrix
        .reply(&ctx.message, &format!("{count} users in {channel}"))
}

async fn seen(ctx: ActionContext) -> ActionResult {
    let channel = ctx.message.channel_target().ok_or(ActionError::MissingArg(0))?;
    let nick = ctx.captures.require("nick")?.to_string();

    let handle = ctx.matrix.joined(channel)?;
    let wanted = nick.clone();
    let last = handle
        .get_buffer(move |buffer| buffer.last_from(&wanted).map(|m| m.trailing.clone()))
        .await?;

    let reply = match last {
        Some(text) => format!("{nick} last said: {text}"),
        None => format!("I have not seen {nick} say anything in {channel}"),
    };
    ctx.matrix.reply(&ctx.message, &reply)
}

/// Repeat text into the channel, for operators only.
async fn say(ctx: ActionContext) -> ActionResult {
    let channel = ctx.message.channel_target().ok_or(ActionError::MissingArg(0))?;
    let nick = ctx.message.nick().ok_or(ActionError::MissingPrefix)?;
    let text = ctx.captures.require("text")?;

    let handle = ctx.matrix.joined(channel)?;
    let is_op = handle
        .get_user(nick)
        .await?
        .is_some_and(|user| user.role.is_op());
    if !is_op {
        debug!(nick, channel, "Ignoring !say from a non-operator");
        return Ok(());
    }
    handle.send(text).await?;
    Ok(())
}
