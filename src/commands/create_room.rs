//! The `/create_music_room` command: sets up a dedicated text channel that
//! acts as the guild's music player.

use crate::ui::embeds;
use crate::{CommandResult, Context, rooms};
use poise::{CreateReply, serenity_prelude as serenity};
use serenity::all::{ChannelId, ChannelType, CreateChannel, CreateMessage};
use tracing::info;

/// Category all music rooms are grouped under.
const ROOM_CATEGORY: &str = "🎵 MUSIC ROOMS";

/// Create a personal music room channel
#[poise::command(slash_command, guild_only, category = "Music")]
pub async fn create_music_room(ctx: Context<'_>) -> CommandResult {
    let guild_id = ctx
        .guild_id()
        .ok_or("create_music_room used outside a guild")?;

    ctx.defer_ephemeral().await?;

    // Find the music-rooms category, creating it on first use.
    let existing_category: Option<ChannelId> = ctx.guild().and_then(|guild| {
        guild
            .channels
            .values()
            .find(|channel| channel.kind == ChannelType::Category && channel.name == ROOM_CATEGORY)
            .map(|channel| channel.id)
    });

    let category_id = match existing_category {
        Some(id) => id,
        None => {
            guild_id
                .create_channel(
                    ctx.http(),
                    CreateChannel::new(ROOM_CATEGORY).kind(ChannelType::Category),
                )
                .await?
                .id
        }
    };

    let name = format!("🎵┃{}-music", ctx.author().display_name());
    let channel = guild_id
        .create_channel(
            ctx.http(),
            CreateChannel::new(name)
                .kind(ChannelType::Text)
                .category(category_id)
                .topic(format!("🎵 Music room for {}", ctx.author().display_name())),
        )
        .await?;

    rooms::register(channel.id, guild_id);

    channel
        .id
        .send_message(
            ctx.http(),
            CreateMessage::new().embed(embeds::room_welcome()),
        )
        .await?;

    info!("Created music room {} for guild {}", channel.name, guild_id);

    ctx.send(
        CreateReply::default()
            .embed(embeds::room_created(channel.id))
            .ephemeral(true),
    )
    .await?;

    Ok(())
}
