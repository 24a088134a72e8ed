//! Dispatches panel button interactions onto the guild's player.

use super::controls::ControlAction;
use super::embeds;
use crate::player::controller;
use poise::serenity_prelude::{self as serenity, Context};
use serenity::all::{ComponentInteraction, CreateInteractionResponseFollowup};
use tracing::{error, warn};

type InteractionResult = Result<(), crate::Error>;

/// Handle a button interaction from the now-playing panel.
///
/// All buttons funnel through the single `ControlAction` dispatch; each
/// action re-renders the panel afterwards, except stop (which deletes it)
/// and skip (whose re-render is driven by the completion event).
pub async fn handle_interaction(
    ctx: &Context,
    interaction: &mut ComponentInteraction,
) -> InteractionResult {
    let guild_id = interaction.guild_id.ok_or("Interaction outside a guild")?;

    // Defer immediately; the panel edit is the real response.
    interaction.defer(ctx).await?;

    let Some(action) = ControlAction::from_custom_id(&interaction.data.custom_id) else {
        error!("Unknown button ID: {}", interaction.data.custom_id);
        return error_followup(ctx, interaction, "Unknown button action.").await;
    };

    let outcome = match action {
        ControlAction::Stop => controller::stop(ctx, guild_id).await.map(|_| true),
        ControlAction::PauseResume => controller::toggle_pause(guild_id).await.map(|_| true),
        ControlAction::Skip => controller::skip(guild_id).await.map(|_| true),
        ControlAction::Previous => controller::previous(ctx, guild_id).await,
        ControlAction::ToggleShuffle => controller::toggle_shuffle(guild_id).await.map(|_| true),
        ControlAction::ToggleLoop => controller::toggle_loop(guild_id).await.map(|_| true),
        ControlAction::VolumeDown => controller::adjust_volume(guild_id, -0.1).await.map(|_| true),
        ControlAction::VolumeUp => controller::adjust_volume(guild_id, 0.1).await.map(|_| true),
        ControlAction::VolumeMute => controller::set_volume(guild_id, 0.0).await.map(|_| true),
        // Max restores full volume, not the boost ceiling.
        ControlAction::VolumeMax => controller::set_volume(guild_id, 1.0).await.map(|_| true),
    };

    match outcome {
        Ok(acted) => {
            if !acted {
                // Only previous reports a no-op (empty history).
                return error_followup(ctx, interaction, "No previous track to play.").await;
            }
            // Stop deletes the panel; skip's re-render comes from the
            // stream-completion event once the queue has advanced.
            if !matches!(action, ControlAction::Stop | ControlAction::Skip) {
                embeds::refresh_panel(ctx, guild_id).await?;
            }
            Ok(())
        }
        Err(e) => {
            warn!(
                "Button {:?} failed for guild {}: {}",
                action, guild_id, e
            );
            error_followup(ctx, interaction, "Nothing is playing right now.").await
        }
    }
}

/// Send an ephemeral error followup message for failed interactions
async fn error_followup(
    ctx: &Context,
    interaction: &ComponentInteraction,
    content: &str,
) -> InteractionResult {
    interaction
        .create_followup(
            &ctx.http,
            CreateInteractionResponseFollowup::new()
                .content(content)
                .ephemeral(true),
        )
        .await?;
    Ok(())
}
