//! Resolution of a search query or URL into a `TrackRecord`.
//!
//! Uses the `yt-dlp` command-line tool. Resolution can block for seconds, so
//! it always runs on the blocking pool; the event path is never starved by a
//! slow lookup, and each attempt fails independently without touching any
//! player state.

use crate::player::{PlayerError, track::TrackRecord};
use serenity::model::id::UserId;
use std::process::Command;
use std::time::Duration;
use tracing::info;
use url::Url;

/// Resolve a query (search term or URL) into a playable track record.
pub async fn resolve(query: String, requested_by: UserId) -> Result<TrackRecord, PlayerError> {
    tokio::task::spawn_blocking(move || resolve_blocking(&query, requested_by))
        .await
        .map_err(|e| PlayerError::Resolve(format!("Resolver task failed: {e}")))?
}

fn resolve_blocking(query: &str, requested_by: UserId) -> Result<TrackRecord, PlayerError> {
    // Bare search terms go through yt-dlp's search shorthand.
    let target = if Url::parse(query).is_ok() {
        query.to_string()
    } else {
        format!("ytsearch:{query}")
    };

    info!("Resolving track for query: {}", target);

    let output = Command::new("yt-dlp")
        .args([
            "-j",            // Output as JSON
            "--no-playlist", // Don't process playlists
            &target,
        ])
        .output()
        .map_err(|e| PlayerError::Resolve(format!("Failed to run yt-dlp: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PlayerError::Resolve(format!(
            "yt-dlp exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    parse_track(&output.stdout, requested_by)
}

/// Convert yt-dlp's JSON dump into a `TrackRecord`.
fn parse_track(stdout: &[u8], requested_by: UserId) -> Result<TrackRecord, PlayerError> {
    let value: serde_json::Value = serde_json::from_slice(stdout)
        .map_err(|e| PlayerError::Resolve(format!("Failed to parse track metadata: {e}")))?;

    // Playlist-shaped output: take the first entry only.
    let info = value
        .get("entries")
        .and_then(|entries| entries.get(0))
        .unwrap_or(&value);

    let url = info["webpage_url"]
        .as_str()
        .or_else(|| info["url"].as_str())
        .ok_or_else(|| PlayerError::Resolve("Track metadata is missing a URL".to_string()))?
        .to_string();

    Ok(TrackRecord {
        title: info["title"].as_str().unwrap_or("Unknown Title").to_string(),
        duration: info["duration"].as_f64().map(Duration::from_secs_f64),
        thumbnail: info["thumbnail"].as_str().map(|s| s.to_string()),
        uploader: info["uploader"]
            .as_str()
            .unwrap_or("Unknown Artist")
            .to_string(),
        view_count: info["view_count"].as_u64().unwrap_or(0),
        requested_by,
        url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_a_plain_video_dump() {
        let json = br#"{
            "title": "Test Song",
            "duration": 245.0,
            "thumbnail": "https://img.example/t.jpg",
            "uploader": "Test Channel",
            "view_count": 1500000,
            "webpage_url": "https://youtube.example/watch?v=abc"
        }"#;

        let track = parse_track(json, UserId::new(7)).unwrap();
        assert_eq!(track.title, "Test Song");
        assert_eq!(track.duration, Some(Duration::from_secs(245)));
        assert_eq!(track.uploader, "Test Channel");
        assert_eq!(track.view_count, 1_500_000);
        assert_eq!(track.url, "https://youtube.example/watch?v=abc");
    }

    #[test]
    fn playlist_shaped_output_takes_the_first_entry() {
        let json = br#"{
            "entries": [
                {"title": "First", "webpage_url": "https://youtube.example/1", "uploader": "A"},
                {"title": "Second", "webpage_url": "https://youtube.example/2", "uploader": "B"}
            ]
        }"#;

        let track = parse_track(json, UserId::new(7)).unwrap();
        assert_eq!(track.title, "First");
        assert_eq!(track.url, "https://youtube.example/1");
    }

    #[test]
    fn live_streams_have_no_duration() {
        let json = br#"{"title": "Radio", "webpage_url": "https://youtube.example/live", "uploader": "C"}"#;
        let track = parse_track(json, UserId::new(7)).unwrap();
        assert_eq!(track.duration, None);
    }

    #[test]
    fn missing_url_is_an_error() {
        let json = br#"{"title": "No URL"}"#;
        assert!(parse_track(json, UserId::new(7)).is_err());
    }
}
