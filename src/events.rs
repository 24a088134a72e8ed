//! Gateway event handling: song requests typed into music rooms, and
//! button interactions on the now-playing panel.

use crate::player::{PlayerError, controller};
use crate::ui::{embeds, handlers};
use crate::{resolver, rooms};
use poise::serenity_prelude as serenity;
use serenity::all::{ChannelId, CreateEmbed, CreateMessage, EditMessage, Message, MessageId};
use serenity::async_trait;
use serenity::model::application::Interaction;
use serenity::prelude::*;
use std::sync::Arc;
use tracing::{debug, error, warn};

pub struct Handler;

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, message: Message) {
        if message.author.bot || !rooms::is_room(message.channel_id) {
            return;
        }
        if let Err(e) = handle_room_message(&ctx, &message).await {
            error!(
                "Error handling song request in room {}: {}",
                message.channel_id, e
            );
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Component(mut component) = interaction {
            if component.data.custom_id.starts_with("music_") {
                if let Err(e) = handlers::handle_interaction(&ctx, &mut component).await {
                    error!("Error handling component interaction: {}", e);
                }
            }
        }
    }
}

/// Treat a message in a music room as a song request: resolve it, queue it
/// and start playback if the player was idle.
async fn handle_room_message(ctx: &Context, message: &Message) -> Result<(), crate::Error> {
    let guild_id = message.guild_id.ok_or(PlayerError::NotInGuild)?;

    // Keep the room clean; only the panel and transient notices stay.
    if let Err(e) = message.delete(&ctx.http).await {
        debug!("Could not delete request message: {}", e);
    }

    let voice_channel = match controller::user_voice_channel(ctx, guild_id, message.author.id) {
        Ok(channel) => channel,
        Err(_) => {
            transient_notice(
                ctx,
                message.channel_id,
                embeds::error_notice("Please join a voice channel first!"),
            )
            .await?;
            return Ok(());
        }
    };

    let notice = message
        .channel_id
        .send_message(
            &ctx.http,
            CreateMessage::new().embed(embeds::searching(&message.content)),
        )
        .await?;

    // Resolution runs on the blocking pool; other guilds keep handling
    // events while this request is looked up.
    let result_embed = match resolver::resolve(message.content.clone(), message.author.id).await {
        Ok(track) => {
            match controller::enqueue(
                ctx,
                guild_id,
                voice_channel,
                message.channel_id,
                track.clone(),
            )
            .await
            {
                Ok(position) => embeds::added_to_queue(&track, position),
                Err(e) => {
                    warn!("Failed to start playback for guild {}: {}", guild_id, e);
                    embeds::error_notice(format!("Could not start playback: {e}"))
                }
            }
        }
        Err(e) => {
            warn!("Error resolving '{}': {}", message.content, e);
            embeds::error_notice(
                "Could not load the song. Please try again with a different query.",
            )
        }
    };

    if let Err(e) = message
        .channel_id
        .edit_message(&ctx.http, notice.id, EditMessage::new().embed(result_embed))
        .await
    {
        debug!("Could not edit request notice: {}", e);
    }

    schedule_notice_cleanup(ctx.http.clone(), message.channel_id, notice.id);
    Ok(())
}

/// Send an embed that deletes itself shortly after.
async fn transient_notice(
    ctx: &Context,
    channel_id: ChannelId,
    embed: CreateEmbed,
) -> Result<(), crate::Error> {
    let notice = channel_id
        .send_message(&ctx.http, CreateMessage::new().embed(embed))
        .await?;
    schedule_notice_cleanup(ctx.http.clone(), channel_id, notice.id);
    Ok(())
}

fn schedule_notice_cleanup(
    http: Arc<serenity::Http>,
    channel_id: ChannelId,
    message_id: MessageId,
) {
    tokio::spawn(async move {
        tokio::time::sleep(embeds::NOTICE_TTL).await;
        if let Err(e) = http.delete_message(channel_id, message_id, None).await {
            debug!("Could not delete transient notice: {}", e);
        }
    });
}
