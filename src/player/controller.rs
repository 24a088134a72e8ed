//! The playback controller: the only component that talks to the voice
//! transport.
//!
//! It translates state-machine transitions into songbird calls and feeds
//! stream-completion events back into `GuildPlayer::advance`. Starting a
//! stream always stops the previous one first, so a guild never has two
//! overlapping streams. Completion notifications carry
//! the playback generation they were attached under; a notification whose
//! generation no longer matches (the stream was superseded by stop or
//! previous) is discarded.

use super::registry;
use super::state::GuildPlayer;
use super::track::TrackRecord;
use super::{PlayerError, PlayerResult};
use crate::HTTP_CLIENT;
use crate::ui::embeds;
use poise::serenity_prelude as serenity;
use serenity::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use serenity::prelude::Mutex as SerenityMutex;
use songbird::input::{Input, YoutubeDl};
use songbird::{Call, Songbird};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Get the Songbird voice client from the context
pub async fn get_songbird(ctx: &serenity::Context) -> PlayerResult<Arc<Songbird>> {
    songbird::get(ctx).await.ok_or(PlayerError::NoVoiceManager)
}

/// Get the current voice channel call handle
pub async fn get_call(
    ctx: &serenity::Context,
    guild_id: GuildId,
) -> PlayerResult<Arc<SerenityMutex<Call>>> {
    let songbird = get_songbird(ctx).await?;
    songbird.get(guild_id).ok_or(PlayerError::NotConnected)
}

/// Join a voice channel
pub async fn connect(
    ctx: &serenity::Context,
    guild_id: GuildId,
    channel_id: ChannelId,
) -> PlayerResult<Arc<SerenityMutex<Call>>> {
    let songbird = get_songbird(ctx).await?;
    songbird
        .join(guild_id, channel_id)
        .await
        .map_err(|e| PlayerError::JoinVoice(e.to_string()))
}

/// Leave the voice channel, releasing the transport
pub async fn disconnect(ctx: &serenity::Context, guild_id: GuildId) -> PlayerResult<()> {
    let songbird = get_songbird(ctx).await?;
    if songbird.get(guild_id).is_none() {
        return Err(PlayerError::NotConnected);
    }
    songbird
        .remove(guild_id)
        .await
        .map_err(|e| PlayerError::Stream(e.to_string()))
}

/// Get the voice channel the user is currently in
pub fn user_voice_channel(
    ctx: &serenity::Context,
    guild_id: GuildId,
    user_id: serenity::UserId,
) -> PlayerResult<ChannelId> {
    let guild = ctx.cache.guild(guild_id).ok_or(PlayerError::NotInGuild)?;
    guild
        .voice_states
        .get(&user_id)
        .and_then(|state| state.channel_id)
        .ok_or(PlayerError::UserNotInVoiceChannel)
}

/// Queue a resolved track for a guild, connecting to voice and starting
/// playback if the player is idle.
///
/// The voice connection is established before the queue is touched: a
/// connect failure propagates upward with the queue unchanged, so the user
/// can simply retry.
///
/// Returns the track's queue position (`0` = started playing immediately).
pub async fn enqueue(
    ctx: &serenity::Context,
    guild_id: GuildId,
    voice_channel: ChannelId,
    text_channel: ChannelId,
    track: TrackRecord,
) -> PlayerResult<usize> {
    if get_call(ctx, guild_id).await.is_err() {
        connect(ctx, guild_id, voice_channel).await?;
    }

    let player = registry::get_or_create(guild_id);
    let (position, next) = {
        let mut state = player.lock().await;
        state.set_text_channel(text_channel);
        // One critical section: two racing requests can never both see an
        // idle player and double-advance.
        state.enqueue_and_advance_if_idle(track)
    };

    if next.is_some() {
        start_current_or_abort(ctx, guild_id).await?;
        if let Err(e) = embeds::refresh_panel(ctx, guild_id).await {
            warn!("Failed to refresh panel for guild {}: {}", guild_id, e);
        }
    }

    Ok(position)
}

/// Start streaming the player's current track, stopping any previous
/// stream first so a guild never has two streams at once.
pub async fn start_current(ctx: &serenity::Context, guild_id: GuildId) -> PlayerResult<()> {
    let player = registry::get(guild_id).ok_or(PlayerError::NoPlayer)?;

    let (record, volume, epoch) = {
        let mut state = player.lock().await;
        let record = match state.current() {
            Some(track) => track.clone(),
            // Stopped between advance and start; nothing to play.
            None => return Ok(()),
        };
        let epoch = state.begin_stream();
        (record, state.volume(), epoch)
    };

    info!("Starting stream '{}' for guild {}", record.title, guild_id);

    let call = get_call(ctx, guild_id).await?;
    let input: Input = YoutubeDl::new(HTTP_CLIENT.clone(), record.url.clone()).into();
    let handle = {
        let mut handler = call.lock().await;
        // The previous stream, if any, must be fully stopped first.
        handler.stop();
        handler.play_input(input)
    };

    if let Err(e) = handle.set_volume(volume) {
        warn!("Failed to apply volume for guild {}: {}", guild_id, e);
    }

    for event in [
        songbird::Event::Track(songbird::TrackEvent::End),
        songbird::Event::Track(songbird::TrackEvent::Error),
    ] {
        let _ = handle.add_event(
            event,
            StreamEndNotifier {
                ctx: ctx.clone(),
                guild_id,
                epoch,
            },
        );
    }

    {
        let mut state = player.lock().await;
        state.set_track_handle(Some(handle));
    }

    Ok(())
}

/// `start_current`, rolling the state machine back to idle when the stream
/// cannot be started. The failed track returns to the queue front, so the
/// player never holds a current track with no stream behind it.
async fn start_current_or_abort(ctx: &serenity::Context, guild_id: GuildId) -> PlayerResult<()> {
    if let Err(e) = start_current(ctx, guild_id).await {
        if let Some(player) = registry::get(guild_id) {
            let mut state = player.lock().await;
            state.abort_current();
        }
        return Err(e);
    }
    Ok(())
}

/// Notifier attached to every started stream; fires on natural completion
/// and on stream errors alike, driving the queue forward either way.
struct StreamEndNotifier {
    ctx: serenity::Context,
    guild_id: GuildId,
    epoch: u64,
}

#[async_trait]
impl songbird::EventHandler for StreamEndNotifier {
    async fn act(&self, event_ctx: &songbird::EventContext<'_>) -> Option<songbird::Event> {
        if let songbird::EventContext::Track(_) = event_ctx {
            if let Err(e) = handle_stream_end(&self.ctx, self.guild_id, self.epoch).await {
                error!(
                    "Failed to advance after stream end for guild {}: {}",
                    self.guild_id, e
                );
            }
        }
        None
    }
}

/// Consume a stream-completion event: advance the state machine and either
/// start the next track or end the playback session.
async fn handle_stream_end(
    ctx: &serenity::Context,
    guild_id: GuildId,
    epoch: u64,
) -> Result<(), crate::Error> {
    let player = match registry::get(guild_id) {
        Some(player) => player,
        // Player already torn down (room reaped); nothing to do.
        None => return Ok(()),
    };

    let next = {
        let mut state = player.lock().await;
        if state.epoch() != epoch {
            // A stop or previous superseded this stream; its completion
            // must not advance the queue.
            return Ok(());
        }
        state.set_track_handle(None);
        state.advance()
    };

    match next {
        Some(track) => {
            info!("Advancing to '{}' for guild {}", track.title, guild_id);
            start_current_or_abort(ctx, guild_id).await?;
            embeds::refresh_panel(ctx, guild_id).await?;
        }
        None => {
            info!("Queue drained for guild {}, ending session", guild_id);
            end_session(ctx, guild_id).await;
        }
    }

    Ok(())
}

/// Tear down the playback session: delete the panel and release the
/// transport. Best-effort; failures are logged.
pub async fn end_session(ctx: &serenity::Context, guild_id: GuildId) {
    if let Some(player) = registry::get(guild_id) {
        let (channel, message) = {
            let mut state = player.lock().await;
            let panel = state.panel_message();
            state.set_panel_message(None);
            (state.text_channel(), panel)
        };
        if let (Some(channel_id), Some(message_id)) = (channel, message) {
            if let Err(e) = ctx.http.delete_message(channel_id, message_id, None).await {
                warn!(
                    "Failed to delete panel message {} in channel {}: {}",
                    message_id, channel_id, e
                );
            }
        }
    }

    if let Err(e) = disconnect(ctx, guild_id).await {
        warn!("Failed to disconnect voice for guild {}: {}", guild_id, e);
    }
}

/// Stop playback entirely: clear the current track, release the transport
/// and delete the panel. The pending queue is preserved.
pub async fn stop(ctx: &serenity::Context, guild_id: GuildId) -> PlayerResult<()> {
    let player = registry::get(guild_id).ok_or(PlayerError::NoPlayer)?;

    let handle = {
        let mut state = player.lock().await;
        let handle = state.track_handle().cloned();
        state.stop();
        handle
    };

    if let Some(handle) = handle {
        match handle.stop() {
            Ok(()) => (),
            Err(songbird::error::ControlError::Finished) => (),
            Err(e) => warn!("Error stopping stream for guild {}: {}", guild_id, e),
        }
    }

    end_session(ctx, guild_id).await;
    Ok(())
}

/// Stop the active stream; its completion notification drives `advance`,
/// so the queue keeps moving. No direct queue mutation.
pub async fn skip(guild_id: GuildId) -> PlayerResult<()> {
    let player = registry::get(guild_id).ok_or(PlayerError::NoPlayer)?;
    let handle = {
        let state = player.lock().await;
        state.track_handle().cloned()
    };

    if let Some(handle) = handle {
        match handle.stop() {
            Ok(()) => (),
            Err(songbird::error::ControlError::Finished) => (),
            Err(e) => warn!("Error skipping stream for guild {}: {}", guild_id, e),
        }
    }
    Ok(())
}

/// Step back to the previous track and restart streaming immediately.
/// Returns `false` (no-op) when there is no history.
pub async fn previous(ctx: &serenity::Context, guild_id: GuildId) -> PlayerResult<bool> {
    let player = registry::get(guild_id).ok_or(PlayerError::NoPlayer)?;

    let stepped = {
        let mut state = player.lock().await;
        state.previous().is_some()
    };

    if stepped {
        // start_current bumps the generation, so the interrupted stream's
        // completion event is recognized as stale. A start failure rolls
        // the step back rather than leaving a current track with no stream.
        start_current_or_abort(ctx, guild_id).await?;
    }
    Ok(stepped)
}

/// Pause or resume the current stream. Returns the new paused state.
pub async fn toggle_pause(guild_id: GuildId) -> PlayerResult<bool> {
    let player = registry::get(guild_id).ok_or(PlayerError::NoPlayer)?;
    let mut state = player.lock().await;

    let handle = state.track_handle().cloned().ok_or(PlayerError::NotConnected)?;
    let paused = if state.is_paused() {
        handle
            .play()
            .map_err(|e| PlayerError::Stream(e.to_string()))?;
        false
    } else {
        handle
            .pause()
            .map_err(|e| PlayerError::Stream(e.to_string()))?;
        true
    };
    state.set_paused(paused);
    Ok(paused)
}

/// Adjust the volume by a delta, clamped to the allowed range, and apply it
/// to the active stream if any. Returns the new volume.
pub async fn adjust_volume(guild_id: GuildId, delta: f32) -> PlayerResult<f32> {
    let player = registry::get(guild_id).ok_or(PlayerError::NoPlayer)?;
    let mut state = player.lock().await;

    let volume = state.adjust_volume(delta);
    apply_volume(&state, volume, guild_id);
    Ok(volume)
}

/// Set the volume to an absolute value, clamped to the allowed range, and
/// apply it to the active stream if any. Returns the new volume.
pub async fn set_volume(guild_id: GuildId, volume: f32) -> PlayerResult<f32> {
    let player = registry::get(guild_id).ok_or(PlayerError::NoPlayer)?;
    let mut state = player.lock().await;

    let volume = state.set_volume(volume);
    apply_volume(&state, volume, guild_id);
    Ok(volume)
}

fn apply_volume(state: &GuildPlayer, volume: f32, guild_id: GuildId) {
    if let Some(handle) = state.track_handle() {
        match handle.set_volume(volume) {
            Ok(()) => (),
            Err(songbird::error::ControlError::Finished) => (),
            Err(e) => warn!("Error setting volume for guild {}: {}", guild_id, e),
        }
    }
}

/// Flip the loop flag. Pure; no playback side effect.
pub async fn toggle_loop(guild_id: GuildId) -> PlayerResult<bool> {
    let player = registry::get(guild_id).ok_or(PlayerError::NoPlayer)?;
    let mut state = player.lock().await;
    Ok(state.toggle_loop())
}

/// Flip the shuffle flag. Pure; no playback side effect.
pub async fn toggle_shuffle(guild_id: GuildId) -> PlayerResult<bool> {
    let player = registry::get(guild_id).ok_or(PlayerError::NoPlayer)?;
    let mut state = player.lock().await;
    Ok(state.toggle_shuffle())
}
