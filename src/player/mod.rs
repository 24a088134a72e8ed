//! Per-guild playback: track records, the queue state machine, the playback
//! controller, and the guild → player registry.

pub mod controller;
pub mod registry;
pub mod state;
pub mod track;

use thiserror::Error;

/// Errors that can occur during playback operations
#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("Not in a guild")]
    NotInGuild,

    #[error("Failed to join voice channel: {0}")]
    JoinVoice(String),

    #[error("Not connected to a voice channel")]
    NotConnected,

    #[error("Failed to get voice manager")]
    NoVoiceManager,

    #[error("User is not in a voice channel")]
    UserNotInVoiceChannel,

    #[error("Failed to resolve track: {0}")]
    Resolve(String),

    #[error("Stream control error: {0}")]
    Stream(String),

    #[error("No player registered for this guild")]
    NoPlayer,
}

/// Result type for playback operations
pub type PlayerResult<T> = Result<T, PlayerError>;
