//! Music-room tracking and idle-room reaping.
//!
//! Rooms are the dedicated text channels users type song requests into.
//! A periodic sweep tears down rooms whose channel has no (non-bot)
//! members left: the player is force-stopped, the channel deleted and the
//! guild's player entry dropped. The sweep is best-effort; an individual
//! teardown failing or hanging never aborts the rest of the pass.

use crate::player::{controller, registry};
use dashmap::DashMap;
use poise::serenity_prelude as serenity;
use serenity::model::id::{ChannelId, GuildId};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{info, warn};

static ROOMS: LazyLock<DashMap<ChannelId, GuildId>> = LazyLock::new(DashMap::new);

/// Upper bound on a single room teardown during the sweep.
const TEARDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Register a channel as a music room.
pub fn register(channel_id: ChannelId, guild_id: GuildId) {
    ROOMS.insert(channel_id, guild_id);
}

/// Forget a music room.
pub fn unregister(channel_id: ChannelId) {
    ROOMS.remove(&channel_id);
}

/// Whether messages in this channel are song requests.
pub fn is_room(channel_id: ChannelId) -> bool {
    ROOMS.contains_key(&channel_id)
}

fn all_rooms() -> Vec<(ChannelId, GuildId)> {
    ROOMS.iter().map(|entry| (*entry.key(), *entry.value())).collect()
}

/// Spawn the periodic idle-room sweep. Runs for the lifetime of the
/// process, independent of playback activity.
pub fn spawn_sweeper(ctx: serenity::Context, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; skip it so a fresh boot does
        // not race the cache warming up.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            sweep(&ctx).await;
        }
    });
}

/// One sweep pass over all registered rooms.
async fn sweep(ctx: &serenity::Context) {
    for (channel_id, guild_id) in all_rooms() {
        match tokio::time::timeout(TEARDOWN_TIMEOUT, reap_if_empty(ctx, channel_id, guild_id))
            .await
        {
            Ok(Ok(true)) => info!("Reaped idle music room {}", channel_id),
            Ok(Ok(false)) => (),
            Ok(Err(e)) => warn!("Failed to reap music room {}: {}", channel_id, e),
            Err(_) => warn!("Timed out tearing down music room {}", channel_id),
        }
    }
}

/// Tear down the room if its channel has no non-bot members. Returns
/// whether the room was reaped.
async fn reap_if_empty(
    ctx: &serenity::Context,
    channel_id: ChannelId,
    guild_id: GuildId,
) -> Result<bool, crate::Error> {
    let channel = {
        let Some(guild) = ctx.cache.guild(guild_id) else {
            return Ok(false);
        };
        guild.channels.get(&channel_id).cloned()
    };

    let Some(channel) = channel else {
        // Channel was deleted out from under us; just drop the room.
        unregister(channel_id);
        registry::remove(guild_id);
        return Ok(true);
    };

    let occupied = channel
        .members(&ctx.cache)?
        .iter()
        .any(|member| !member.user.bot);
    if occupied {
        return Ok(false);
    }

    if registry::get(guild_id).is_some() {
        if let Err(e) = controller::stop(ctx, guild_id).await {
            warn!("Failed to stop player while reaping guild {}: {}", guild_id, e);
        }
    }
    registry::remove(guild_id);

    channel_id.delete(&ctx.http).await?;
    unregister(channel_id);
    Ok(true)
}
