//! The interactive control surface of the now-playing panel.
//!
//! Every button carries a stable custom id; presses come back as a
//! `ControlAction` and are dispatched through a single handler rather than
//! one callback object per button.

use serenity::all::{ButtonStyle, CreateActionRow, CreateButton, ReactionType};

/// Commands the panel can issue against a guild's player, one per button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Stop,
    PauseResume,
    Skip,
    Previous,
    ToggleShuffle,
    ToggleLoop,
    VolumeDown,
    VolumeUp,
    VolumeMute,
    VolumeMax,
}

impl ControlAction {
    /// Parse a component custom id back into an action.
    pub fn from_custom_id(id: &str) -> Option<Self> {
        match id {
            "music_stop" => Some(Self::Stop),
            "music_play_pause" => Some(Self::PauseResume),
            "music_skip" => Some(Self::Skip),
            "music_previous" => Some(Self::Previous),
            "music_shuffle" => Some(Self::ToggleShuffle),
            "music_loop" => Some(Self::ToggleLoop),
            "music_volume_down" => Some(Self::VolumeDown),
            "music_volume_up" => Some(Self::VolumeUp),
            "music_volume_mute" => Some(Self::VolumeMute),
            "music_volume_max" => Some(Self::VolumeMax),
            _ => None,
        }
    }

    pub fn custom_id(self) -> &'static str {
        match self {
            Self::Stop => "music_stop",
            Self::PauseResume => "music_play_pause",
            Self::Skip => "music_skip",
            Self::Previous => "music_previous",
            Self::ToggleShuffle => "music_shuffle",
            Self::ToggleLoop => "music_loop",
            Self::VolumeDown => "music_volume_down",
            Self::VolumeUp => "music_volume_up",
            Self::VolumeMute => "music_volume_mute",
            Self::VolumeMax => "music_volume_max",
        }
    }
}

/// Build the button rows of the now-playing panel.
pub fn panel_buttons(paused: bool, loop_enabled: bool, shuffle_enabled: bool) -> Vec<CreateActionRow> {
    let play_pause = CreateButton::new(ControlAction::PauseResume.custom_id())
        .emoji(ReactionType::Unicode(
            if paused { "▶️" } else { "⏸️" }.to_string(),
        ))
        .style(ButtonStyle::Primary)
        .label(if paused { "Resume" } else { "Pause" });

    let stop = CreateButton::new(ControlAction::Stop.custom_id())
        .emoji(ReactionType::Unicode("⏹️".to_string()))
        .style(ButtonStyle::Danger)
        .label("Stop");

    let skip = CreateButton::new(ControlAction::Skip.custom_id())
        .emoji(ReactionType::Unicode("⏭️".to_string()))
        .style(ButtonStyle::Secondary)
        .label("Skip");

    let previous = CreateButton::new(ControlAction::Previous.custom_id())
        .emoji(ReactionType::Unicode("⏮️".to_string()))
        .style(ButtonStyle::Secondary)
        .label("Previous");

    let shuffle = CreateButton::new(ControlAction::ToggleShuffle.custom_id())
        .emoji(ReactionType::Unicode("🔀".to_string()))
        .style(if shuffle_enabled {
            ButtonStyle::Success
        } else {
            ButtonStyle::Secondary
        })
        .label("Shuffle");

    let repeat = CreateButton::new(ControlAction::ToggleLoop.custom_id())
        .emoji(ReactionType::Unicode("🔂".to_string()))
        .style(if loop_enabled {
            ButtonStyle::Success
        } else {
            ButtonStyle::Secondary
        })
        .label("Loop");

    let volume_down = CreateButton::new(ControlAction::VolumeDown.custom_id())
        .emoji(ReactionType::Unicode("🔉".to_string()))
        .style(ButtonStyle::Secondary)
        .label("-10%");

    let volume_up = CreateButton::new(ControlAction::VolumeUp.custom_id())
        .emoji(ReactionType::Unicode("🔊".to_string()))
        .style(ButtonStyle::Secondary)
        .label("+10%");

    let mute = CreateButton::new(ControlAction::VolumeMute.custom_id())
        .emoji(ReactionType::Unicode("🔇".to_string()))
        .style(ButtonStyle::Danger)
        .label("Mute");

    let max = CreateButton::new(ControlAction::VolumeMax.custom_id())
        .emoji(ReactionType::Unicode("📢".to_string()))
        .style(ButtonStyle::Success)
        .label("Max");

    vec![
        CreateActionRow::Buttons(vec![play_pause, stop, skip, previous]),
        CreateActionRow::Buttons(vec![shuffle, repeat, volume_down, volume_up]),
        CreateActionRow::Buttons(vec![mute, max]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_ids_round_trip() {
        for action in [
            ControlAction::Stop,
            ControlAction::PauseResume,
            ControlAction::Skip,
            ControlAction::Previous,
            ControlAction::ToggleShuffle,
            ControlAction::ToggleLoop,
            ControlAction::VolumeDown,
            ControlAction::VolumeUp,
            ControlAction::VolumeMute,
            ControlAction::VolumeMax,
        ] {
            assert_eq!(ControlAction::from_custom_id(action.custom_id()), Some(action));
        }
    }

    #[test]
    fn unknown_ids_do_not_parse() {
        assert_eq!(ControlAction::from_custom_id("music_search"), None);
        assert_eq!(ControlAction::from_custom_id(""), None);
    }

    #[test]
    fn panel_carries_mute_and_max_shortcuts() {
        let rows = panel_buttons(false, false, false);
        assert_eq!(rows.len(), 3);
        let CreateActionRow::Buttons(volume_row) = &rows[2] else {
            panic!("third row must hold buttons");
        };
        assert_eq!(volume_row.len(), 2);
    }
}
