//! Process-wide guild → player association.
//!
//! The registry is the single source of truth for player lookup; event
//! handlers fetch the entry at the time of handling instead of caching
//! references. Each entry carries its own mutex so operations against one
//! guild serialize without ever blocking another guild.

use super::state::GuildPlayer;
use dashmap::DashMap;
use serenity::model::id::GuildId;
use std::sync::{Arc, LazyLock};
use tokio::sync::Mutex;

static PLAYERS: LazyLock<DashMap<GuildId, Arc<Mutex<GuildPlayer>>>> = LazyLock::new(DashMap::new);

/// Get the player for a guild, creating it lazily on first use.
pub fn get_or_create(guild_id: GuildId) -> Arc<Mutex<GuildPlayer>> {
    PLAYERS
        .entry(guild_id)
        .or_insert_with(|| Arc::new(Mutex::new(GuildPlayer::new())))
        .clone()
}

/// Get the player for a guild, if one has been created.
pub fn get(guild_id: GuildId) -> Option<Arc<Mutex<GuildPlayer>>> {
    PLAYERS.get(&guild_id).map(|entry| entry.clone())
}

/// Drop a guild's player entirely, e.g. when its room is reaped.
pub fn remove(guild_id: GuildId) {
    PLAYERS.remove(&guild_id);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_returns_the_same_entry() {
        let guild = GuildId::new(90_001);
        let first = get_or_create(guild);
        let second = get_or_create(guild);
        assert!(Arc::ptr_eq(&first, &second));
        remove(guild);
        assert!(get(guild).is_none());
    }
}
