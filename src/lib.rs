//! jukebot: a Discord bot that turns dedicated text channels into
//! per-guild music players.

use std::sync::LazyLock;

pub mod commands;
pub mod config;
pub mod events;
pub mod health;
pub mod player;
pub mod resolver;
pub mod rooms;
pub mod ui;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
pub type CommandResult = Result<(), Error>;

/// User data, which is stored and accessible in all command invocations
pub struct Data {}

/// Shared HTTP client, used to build streaming inputs.
pub static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(reqwest::Client::new);
