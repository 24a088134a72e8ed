//! This module aggregates all the command modules for the bot.

/// The command for creating a dedicated music-room channel.
pub mod create_room;
