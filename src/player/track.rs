//! Defines the `TrackRecord` struct, the immutable description of one
//! resolved track shared between the queue, the playback controller and the
//! now-playing panel.

use serde::{Deserialize, Serialize};
use serenity::model::id::UserId;
use std::time::Duration;

/// Immutable metadata for a playable track.
///
/// The audio input itself is not held here; it is constructed from `url`
/// at the moment the track starts streaming.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackRecord {
    /// The title of the track.
    pub title: String,
    /// The duration of the track. `None` means a live or unknown-length stream.
    #[serde(with = "humantime_serde")]
    pub duration: Option<Duration>,
    /// URL to a thumbnail image for the track, if available.
    pub thumbnail: Option<String>,
    /// The channel or artist that published the track.
    pub uploader: String,
    /// View count as reported by the source.
    pub view_count: u64,
    /// The user who requested the track.
    pub requested_by: UserId,
    /// The source page URL the stream is created from.
    pub url: String,
}
