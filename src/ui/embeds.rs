//! Embed construction for the now-playing panel, room messages and
//! transient notices, plus the send-or-update logic for the panel message.

use super::{controls, format_count, format_duration, progress_bar};
use crate::player::registry;
use crate::player::state::PlayerSnapshot;
use crate::player::track::TrackRecord;
use poise::serenity_prelude as serenity;
use serenity::all::{
    ChannelId, CreateEmbed, CreateEmbedFooter, CreateMessage, EditMessage, GuildId, Mentionable,
    Timestamp,
};
use std::time::Duration;
use tracing::debug;

const PANEL_COLOR: u32 = 0x1db954;
const ERROR_COLOR: u32 = 0xff0000;
const NOTICE_COLOR: u32 = 0xffff00;
const SUCCESS_COLOR: u32 = 0x00ff00;

const PROGRESS_BAR_LENGTH: usize = 20;

/// Render the now-playing panel from a player snapshot.
pub fn now_playing_panel(snapshot: &PlayerSnapshot) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title("🎵 Now Playing")
        .color(PANEL_COLOR)
        .timestamp(Timestamp::now());

    let Some(current) = &snapshot.current else {
        return embed.description("*Nothing playing*");
    };

    if let Some(thumbnail) = &current.thumbnail {
        embed = embed.thumbnail(thumbnail.clone());
    }

    let duration_str = current
        .duration
        .map(format_duration)
        .unwrap_or_else(|| "Live".to_string());

    let song_info = format!(
        "**{}**\n👨‍🎤 **Artist:** {}\n⏱️ **Duration:** {}\n👁️ **Views:** {}\n🎧 **Requested by:** {}",
        current.title,
        current.uploader,
        duration_str,
        format_count(current.view_count),
        current.requested_by.mention(),
    );
    embed = embed.field("🎶 Track", song_info, false);

    let (bar, time_display) = match (snapshot.elapsed, current.duration) {
        (Some(elapsed), Some(total)) => (
            progress_bar(elapsed, total, PROGRESS_BAR_LENGTH),
            format!("{} / {}", format_duration(elapsed), format_duration(total)),
        ),
        (Some(elapsed), None) => (
            "━".repeat(PROGRESS_BAR_LENGTH),
            format!("{} / Live", format_duration(elapsed)),
        ),
        _ => ("━".repeat(PROGRESS_BAR_LENGTH), "00:00 / 00:00".to_string()),
    };
    embed = embed.field("📊 Progress", format!("```{bar}```\n{time_display}"), false);

    let status = format!(
        "📝 **Queue:** {} songs\n🔊 **Volume:** {}%\n🔂 **Loop:** {}\n🔀 **Shuffle:** {}",
        snapshot.queue_len,
        (snapshot.volume * 100.0).round() as u32,
        if snapshot.loop_enabled { "✅" } else { "❌" },
        if snapshot.shuffle_enabled { "✅" } else { "❌" },
    );
    embed = embed.field("⚙️ Player Status", status, true);

    let up_next = match &snapshot.next_up {
        Some(next) => format!("**{}**\nby {}", truncate(&next.title, 50), next.uploader),
        None => "*Queue is empty*".to_string(),
    };
    embed = embed.field("⏭️ Up Next", up_next, true);

    embed.footer(CreateEmbedFooter::new(
        "Type a song name or URL to add it to the queue",
    ))
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

/// Send the panel message, or edit the existing one in place.
///
/// The panel is re-rendered after every state transition; if the stored
/// message can no longer be edited a fresh one is sent and recorded.
pub async fn refresh_panel(
    ctx: &serenity::Context,
    guild_id: GuildId,
) -> Result<(), crate::Error> {
    let Some(player) = registry::get(guild_id) else {
        return Ok(());
    };

    let (snapshot, channel, panel) = {
        let state = player.lock().await;
        (state.snapshot(), state.text_channel(), state.panel_message())
    };

    let Some(channel_id) = channel else {
        return Ok(());
    };
    if snapshot.current.is_none() {
        // Session ended; panel deletion is handled by the controller.
        return Ok(());
    }

    let embed = now_playing_panel(&snapshot);
    let buttons = controls::panel_buttons(
        snapshot.paused,
        snapshot.loop_enabled,
        snapshot.shuffle_enabled,
    );

    let message_id = match panel {
        Some(message_id) => {
            let edit = EditMessage::new()
                .embed(embed.clone())
                .components(buttons.clone());
            match channel_id.edit_message(&ctx.http, message_id, edit).await {
                Ok(_) => message_id,
                Err(e) => {
                    debug!("Failed to edit panel message, sending a new one: {}", e);
                    send_panel(ctx, channel_id, embed, buttons).await?
                }
            }
        }
        None => send_panel(ctx, channel_id, embed, buttons).await?,
    };

    let mut state = player.lock().await;
    state.set_panel_message(Some(message_id));
    Ok(())
}

async fn send_panel(
    ctx: &serenity::Context,
    channel_id: ChannelId,
    embed: CreateEmbed,
    buttons: Vec<serenity::all::CreateActionRow>,
) -> Result<serenity::all::MessageId, crate::Error> {
    let message = channel_id
        .send_message(&ctx.http, CreateMessage::new().embed(embed).components(buttons))
        .await?;
    Ok(message.id)
}

/// Transient notice shown while a query is being resolved.
pub fn searching(query: &str) -> CreateEmbed {
    CreateEmbed::new()
        .title("🔍 Searching...")
        .description(format!("Looking for: **{}**", truncate(query, 100)))
        .color(NOTICE_COLOR)
}

/// Transient notice after a track has been queued.
pub fn added_to_queue(track: &TrackRecord, position: usize) -> CreateEmbed {
    let duration_str = track
        .duration
        .map(format_duration)
        .unwrap_or_else(|| "Live".to_string());

    let mut embed = CreateEmbed::new()
        .title(if position == 0 {
            "🎵 Now Playing"
        } else {
            "✅ Added to Queue"
        })
        .description(format!("**{}**\nby {}", track.title, track.uploader))
        .field("Duration", format!("`{duration_str}`"), true)
        .color(SUCCESS_COLOR);

    if position > 0 {
        embed = embed.field("Position in Queue", format!("`#{position}`"), true);
    }
    if let Some(thumbnail) = &track.thumbnail {
        embed = embed.thumbnail(thumbnail.clone());
    }
    embed
}

/// Transient user-facing error notice.
pub fn error_notice(description: impl Into<String>) -> CreateEmbed {
    CreateEmbed::new()
        .title("❌ Error")
        .description(description)
        .color(ERROR_COLOR)
}

/// Welcome message posted into a freshly created music room.
pub fn room_welcome() -> CreateEmbed {
    CreateEmbed::new()
        .title("🎵 Music Room")
        .description("**Type a song name or URL to start playing.**")
        .color(0x9932cc)
        .field(
            "🎛️ Control Panel",
            "⏹️ **Stop** - Stop music and disconnect\n\
             ⏸️ **Pause** - Pause current song\n\
             ⏭️ **Skip** - Skip to next song\n\
             ⏮️ **Previous** - Play previous song",
            true,
        )
        .field(
            "🔧 Advanced Controls",
            "🔀 **Shuffle** - Toggle shuffle mode\n\
             🔂 **Loop** - Toggle loop mode\n\
             🔉🔊 **Volume** - Adjust volume\n\
             🔇 **Mute** / 📢 **Max** - Volume shortcuts",
            true,
        )
        .field(
            "💡 Tips",
            "• Join a voice channel first\n\
             • Queue as many songs as you like\n\
             • Empty rooms are cleaned up automatically",
            false,
        )
        .timestamp(Timestamp::now())
}

/// Ephemeral confirmation after a music room was created.
pub fn room_created(channel: ChannelId) -> CreateEmbed {
    CreateEmbed::new()
        .title("✅ Music Room Created!")
        .description(format!(
            "🎵 Your music room {} is ready!\n🎧 Join a voice channel and start typing song names!",
            channel.mention()
        ))
        .color(SUCCESS_COLOR)
}

/// How long transient notices linger before they are deleted.
pub const NOTICE_TTL: Duration = Duration::from_secs(3);
