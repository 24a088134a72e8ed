//! The per-guild playback state machine.
//!
//! `GuildPlayer` owns the pending queue, the play history, the current track
//! slot and the mode flags for one guild. It is purely synchronous; all
//! transport side effects are driven by the playback controller from the
//! values these transitions return. Exactly one `GuildPlayer` exists per
//! guild, behind the registry's per-guild mutex.

use super::track::TrackRecord;
use rand::RngExt;
use serenity::model::id::{ChannelId, MessageId};
use songbird::tracks::TrackHandle;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::debug;

/// Lower and upper bounds for the playback volume.
pub const MIN_VOLUME: f32 = 0.0;
pub const MAX_VOLUME: f32 = 2.0;

/// Playback state for a single guild.
pub struct GuildPlayer {
    /// Pending tracks, FIFO unless shuffle is enabled.
    queue: VecDeque<TrackRecord>,
    /// Played tracks, most recent first.
    history: VecDeque<TrackRecord>,
    /// The track currently streaming (or paused), if any.
    current: Option<TrackRecord>,
    /// When the current track started streaming.
    started_at: Option<Instant>,
    /// Handle to the active stream, owned exclusively by this player.
    handle: Option<TrackHandle>,
    loop_enabled: bool,
    shuffle_enabled: bool,
    volume: f32,
    paused: bool,
    /// Playback generation. Bumped every time a stream starts or playback is
    /// stopped, so that completion notifications from a superseded stream
    /// can be recognized as stale and discarded.
    epoch: u64,
    /// The music room this player posts its panel into.
    text_channel: Option<ChannelId>,
    /// The now-playing panel message, if one has been sent.
    panel_message: Option<MessageId>,
}

/// Read-only view of a `GuildPlayer`, consumed by the presentation layer.
#[derive(Debug, Clone)]
pub struct PlayerSnapshot {
    pub current: Option<TrackRecord>,
    /// Time the current track has been playing, clamped to its duration.
    pub elapsed: Option<Duration>,
    pub queue_len: usize,
    /// The track that would play next with shuffle off.
    pub next_up: Option<TrackRecord>,
    pub volume: f32,
    pub loop_enabled: bool,
    pub shuffle_enabled: bool,
    pub paused: bool,
}

impl GuildPlayer {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            history: VecDeque::new(),
            current: None,
            started_at: None,
            handle: None,
            loop_enabled: false,
            shuffle_enabled: false,
            volume: 1.0,
            paused: false,
            epoch: 0,
            text_channel: None,
            panel_message: None,
        }
    }

    /// Append a track to the queue tail. Never touches playback.
    pub fn enqueue(&mut self, track: TrackRecord) {
        debug!("Queued '{}' at position {}", track.title, self.queue.len() + 1);
        self.queue.push_back(track);
    }

    /// Append a track and, when the player is idle, advance onto it in the
    /// same step. Position and start decision settle together, so two
    /// concurrent requests can never both observe an idle player.
    ///
    /// Returns the queue position (`0` = became current) and the track the
    /// caller must start streaming, if any.
    pub fn enqueue_and_advance_if_idle(
        &mut self,
        track: TrackRecord,
    ) -> (usize, Option<TrackRecord>) {
        self.enqueue(track);
        if self.current.is_none() {
            (0, self.advance())
        } else {
            (self.queue_len(), None)
        }
    }

    /// Retire the current track and select the next one.
    ///
    /// Invoked when the active stream completes (or errors), and indirectly
    /// by skip. Returns the track to start streaming, or `None` when the
    /// queue is drained and the session should end.
    ///
    /// With loop on, the current track re-enters the queue front *before*
    /// the empty check, so a lone looped track replays forever.
    pub fn advance(&mut self) -> Option<TrackRecord> {
        if self.loop_enabled {
            if let Some(track) = self.current.take() {
                self.queue.push_front(track);
            }
        }

        let next = if self.queue.is_empty() {
            None
        } else if self.shuffle_enabled {
            // Uniform over the remaining queue; removal keeps the relative
            // order of the untouched remainder.
            let index = rand::rng().random_range(0..self.queue.len());
            self.queue.remove(index)
        } else {
            self.queue.pop_front()
        };

        match next {
            Some(track) => {
                if let Some(finished) = self.current.take() {
                    self.history.push_front(finished);
                }
                self.current = Some(track.clone());
                self.started_at = Some(Instant::now());
                self.paused = false;
                Some(track)
            }
            None => {
                self.current = None;
                self.started_at = None;
                self.paused = false;
                None
            }
        }
    }

    /// Step back to the most recently played track.
    ///
    /// The displaced current track goes to the queue front so it is not
    /// lost. Returns the track to restart streaming, or `None` (no-op) when
    /// there is no history.
    pub fn previous(&mut self) -> Option<TrackRecord> {
        let track = self.history.pop_front()?;
        if let Some(displaced) = self.current.take() {
            self.queue.push_front(displaced);
        }
        self.current = Some(track.clone());
        self.started_at = Some(Instant::now());
        self.paused = false;
        Some(track)
    }

    /// Force idle: clear the current track and invalidate any in-flight
    /// completion notification. The pending queue is left intact so playback
    /// can resume quickly on the next request.
    pub fn stop(&mut self) {
        self.current = None;
        self.started_at = None;
        self.paused = false;
        self.handle = None;
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Demote the current track back to the queue front and go idle, for
    /// when a stream could not be started for it. The next request picks
    /// the track up again instead of finding a phantom current.
    pub fn abort_current(&mut self) {
        if let Some(track) = self.current.take() {
            self.queue.push_front(track);
        }
        self.started_at = None;
        self.paused = false;
        self.handle = None;
        self.epoch = self.epoch.wrapping_add(1);
    }

    pub fn toggle_loop(&mut self) -> bool {
        self.loop_enabled = !self.loop_enabled;
        self.loop_enabled
    }

    pub fn toggle_shuffle(&mut self) -> bool {
        self.shuffle_enabled = !self.shuffle_enabled;
        self.shuffle_enabled
    }

    /// Set the volume, clamped to `[0.0, 2.0]`.
    pub fn set_volume(&mut self, volume: f32) -> f32 {
        self.volume = volume.clamp(MIN_VOLUME, MAX_VOLUME);
        self.volume
    }

    /// Adjust the volume by a delta, clamped to `[0.0, 2.0]`.
    pub fn adjust_volume(&mut self, delta: f32) -> f32 {
        self.set_volume(self.volume + delta)
    }

    /// Mark the start of a new stream and return its generation. Completion
    /// notifications carrying an older generation are stale.
    pub fn begin_stream(&mut self) -> u64 {
        self.epoch = self.epoch.wrapping_add(1);
        self.epoch
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn current(&self) -> Option<&TrackRecord> {
        self.current.as_ref()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn track_handle(&self) -> Option<&TrackHandle> {
        self.handle.as_ref()
    }

    pub fn set_track_handle(&mut self, handle: Option<TrackHandle>) {
        self.handle = handle;
    }

    pub fn text_channel(&self) -> Option<ChannelId> {
        self.text_channel
    }

    pub fn set_text_channel(&mut self, channel: ChannelId) {
        self.text_channel = Some(channel);
    }

    pub fn panel_message(&self) -> Option<MessageId> {
        self.panel_message
    }

    pub fn set_panel_message(&mut self, message: Option<MessageId>) {
        self.panel_message = message;
    }

    /// Produce a read-only view for rendering the now-playing panel.
    pub fn snapshot(&self) -> PlayerSnapshot {
        let elapsed = self.started_at.map(|started| {
            let raw = started.elapsed();
            match self.current.as_ref().and_then(|t| t.duration) {
                Some(total) => raw.min(total),
                None => raw,
            }
        });

        PlayerSnapshot {
            current: self.current.clone(),
            elapsed,
            queue_len: self.queue.len(),
            next_up: self.queue.front().cloned(),
            volume: self.volume,
            loop_enabled: self.loop_enabled,
            shuffle_enabled: self.shuffle_enabled,
            paused: self.paused,
        }
    }
}

impl Default for GuildPlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serenity::model::id::UserId;
    use test_case::test_case;

    fn track(title: &str) -> TrackRecord {
        TrackRecord {
            title: title.to_string(),
            duration: Some(Duration::from_secs(180)),
            thumbnail: None,
            uploader: "Test Uploader".to_string(),
            view_count: 1234,
            requested_by: UserId::new(42),
            url: format!("https://example.com/{title}"),
        }
    }

    fn titles(player: &GuildPlayer) -> Vec<String> {
        player.queue.iter().map(|t| t.title.clone()).collect()
    }

    #[test]
    fn enqueue_preserves_call_order() {
        let mut player = GuildPlayer::new();
        for name in ["a", "b", "c", "d"] {
            player.enqueue(track(name));
        }
        assert_eq!(titles(&player), ["a", "b", "c", "d"]);
    }

    #[test]
    fn advance_on_empty_queue_goes_idle() {
        let mut player = GuildPlayer::new();
        assert_eq!(player.advance(), None);
        assert!(player.current().is_none());
        assert_eq!(player.queue_len(), 0);
    }

    #[test]
    fn plays_in_fifo_order_then_goes_idle() {
        let mut player = GuildPlayer::new();
        player.enqueue(track("a"));
        player.enqueue(track("b"));
        player.enqueue(track("c"));

        let mut played = Vec::new();
        while let Some(t) = player.advance() {
            played.push(t.title);
        }
        assert_eq!(played, ["a", "b", "c"]);
        assert!(player.current().is_none());
        assert_eq!(player.history_len(), 2, "a and b displaced into history");
    }

    #[test]
    fn loop_replays_a_single_track_forever() {
        let mut player = GuildPlayer::new();
        player.enqueue(track("a"));
        player.toggle_loop();

        for _ in 0..4 {
            let t = player.advance().expect("loop must never go idle");
            assert_eq!(t.title, "a");
            assert_eq!(player.queue_len(), 0);
            assert_eq!(player.current().unwrap().title, "a");
        }
    }

    #[test]
    fn loop_replays_current_before_queued_tracks() {
        let mut player = GuildPlayer::new();
        player.enqueue(track("a"));
        player.enqueue(track("b"));
        assert_eq!(player.advance().unwrap().title, "a");

        player.toggle_loop();
        // a re-enters at the queue front, ahead of b
        assert_eq!(player.advance().unwrap().title, "a");
        assert_eq!(titles(&player), ["b"]);
    }

    #[test]
    fn previous_restores_history_and_keeps_current() {
        let mut player = GuildPlayer::new();
        player.enqueue(track("a"));
        player.enqueue(track("b"));
        player.enqueue(track("c"));
        player.advance(); // playing a
        player.advance(); // playing b, a in history

        let t = player.previous().expect("history is non-empty");
        assert_eq!(t.title, "a");
        assert_eq!(player.current().unwrap().title, "a");
        // b was not lost: it replays before c
        assert_eq!(titles(&player), ["b", "c"]);
        assert_eq!(player.history_len(), 0);
    }

    #[test]
    fn previous_then_advance_restores_forward_progress() {
        let mut player = GuildPlayer::new();
        player.enqueue(track("a"));
        player.enqueue(track("b"));
        player.enqueue(track("c"));
        player.advance(); // a
        player.advance(); // b
        player.previous(); // back to a, b at queue front

        assert_eq!(player.advance().unwrap().title, "b");
        assert_eq!(player.advance().unwrap().title, "c");
    }

    #[test]
    fn previous_with_empty_history_is_a_noop() {
        let mut player = GuildPlayer::new();
        player.enqueue(track("a"));
        player.enqueue(track("b"));
        player.advance(); // playing a, history empty

        assert_eq!(player.previous(), None);
        assert_eq!(player.current().unwrap().title, "a");
        assert_eq!(titles(&player), ["b"]);
    }

    #[test]
    fn shuffle_removes_one_track_and_hits_every_index() {
        let names = ["a", "b", "c", "d"];
        let mut seen = std::collections::HashSet::new();

        for _ in 0..400 {
            let mut player = GuildPlayer::new();
            for name in names {
                player.enqueue(track(name));
            }
            player.toggle_shuffle();

            let picked = player.advance().expect("queue was non-empty");
            assert_eq!(player.queue_len(), names.len() - 1);
            // untouched remainder keeps its relative order
            let remaining = titles(&player);
            let expected: Vec<String> = names
                .iter()
                .filter(|n| **n != picked.title)
                .map(|n| n.to_string())
                .collect();
            assert_eq!(remaining, expected);
            seen.insert(picked.title);
        }

        assert_eq!(seen.len(), names.len(), "every index must be reachable");
    }

    #[test_case(0.0, -0.5, 0.0 ; "clamps at the floor")]
    #[test_case(2.0, 0.5, 2.0 ; "clamps at the ceiling")]
    #[test_case(1.0, 0.1, 1.1 ; "plain adjustment")]
    #[test_case(1.0, -0.1, 0.9 ; "plain reduction")]
    fn volume_adjustment_clamps(start: f32, delta: f32, expected: f32) {
        let mut player = GuildPlayer::new();
        player.set_volume(start);
        let got = player.adjust_volume(delta);
        assert!((got - expected).abs() < f32::EPSILON * 4.0);
    }

    #[test]
    fn set_volume_clamps_absolute_values() {
        let mut player = GuildPlayer::new();
        assert_eq!(player.set_volume(5.0), 2.0);
        assert_eq!(player.set_volume(-1.0), 0.0);
    }

    #[test]
    fn enqueue_and_advance_starts_only_when_idle() {
        let mut player = GuildPlayer::new();

        let (position, start) = player.enqueue_and_advance_if_idle(track("a"));
        assert_eq!(position, 0);
        assert_eq!(start.unwrap().title, "a");

        // a is already current; b must queue behind it, never displace it
        let (position, start) = player.enqueue_and_advance_if_idle(track("b"));
        assert_eq!(position, 1);
        assert_eq!(start, None);
        assert_eq!(player.current().unwrap().title, "a");
        assert_eq!(titles(&player), ["b"]);
    }

    #[test]
    fn abort_current_returns_the_track_to_the_queue_front() {
        let mut player = GuildPlayer::new();
        player.enqueue(track("a"));
        player.enqueue(track("b"));
        player.advance(); // playing a
        let generation = player.begin_stream();

        player.abort_current();
        assert!(player.current().is_none());
        assert!(!player.is_paused());
        assert_eq!(titles(&player), ["a", "b"]);
        assert_ne!(player.epoch(), generation);
    }

    #[test]
    fn abort_after_previous_keeps_both_tracks_queued() {
        let mut player = GuildPlayer::new();
        player.enqueue(track("a"));
        player.enqueue(track("b"));
        player.advance(); // a
        player.advance(); // b, a in history
        player.previous(); // back on a, b at queue front

        // the restart for a failed; the player must return to idle with
        // nothing lost
        player.abort_current();
        assert!(player.current().is_none());
        assert_eq!(titles(&player), ["a", "b"]);
        assert_eq!(player.advance().unwrap().title, "a");
    }

    #[test]
    fn stop_clears_current_but_keeps_the_queue() {
        let mut player = GuildPlayer::new();
        player.enqueue(track("a"));
        player.enqueue(track("b"));
        player.advance(); // playing a

        player.stop();
        assert!(player.current().is_none());
        assert!(!player.is_paused());
        assert_eq!(titles(&player), ["b"]);
    }

    #[test]
    fn stop_invalidates_outstanding_stream_generation() {
        let mut player = GuildPlayer::new();
        player.enqueue(track("a"));
        player.advance();
        let generation = player.begin_stream();

        player.stop();
        assert_ne!(player.epoch(), generation);
    }

    #[test]
    fn begin_stream_supersedes_the_previous_generation() {
        let mut player = GuildPlayer::new();
        let first = player.begin_stream();
        let second = player.begin_stream();
        assert_ne!(first, second);
        assert_eq!(player.epoch(), second);
    }

    #[test]
    fn toggles_flip_without_touching_the_queue() {
        let mut player = GuildPlayer::new();
        player.enqueue(track("a"));

        assert!(player.toggle_loop());
        assert!(player.toggle_shuffle());
        assert!(!player.toggle_loop());
        assert!(!player.toggle_shuffle());
        assert_eq!(titles(&player), ["a"]);
        assert!(player.current().is_none());
    }

    #[test]
    fn snapshot_reflects_queue_and_modes() {
        let mut player = GuildPlayer::new();
        player.enqueue(track("a"));
        player.enqueue(track("b"));
        player.enqueue(track("c"));
        player.advance(); // playing a
        player.toggle_loop();
        player.set_volume(0.5);

        let snapshot = player.snapshot();
        assert_eq!(snapshot.current.unwrap().title, "a");
        assert_eq!(snapshot.queue_len, 2);
        assert_eq!(snapshot.next_up.unwrap().title, "b");
        assert!(snapshot.loop_enabled);
        assert!(!snapshot.shuffle_enabled);
        assert_eq!(snapshot.volume, 0.5);
        assert!(snapshot.elapsed.is_some());
    }

    #[test]
    fn snapshot_elapsed_clamps_to_duration() {
        let mut player = GuildPlayer::new();
        let mut short = track("a");
        short.duration = Some(Duration::ZERO);
        player.enqueue(short);
        player.advance();

        let snapshot = player.snapshot();
        assert_eq!(snapshot.elapsed, Some(Duration::ZERO));
    }
}
