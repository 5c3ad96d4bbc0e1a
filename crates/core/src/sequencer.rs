//! Playback sequencing over the currently eligible media.
//!
//! [`eligible_ordered`] filters a media collection down to what may be shown
//! at an instant and orders it by priority. [`Sequencer`] is the explicit
//! rotation state object; every transition takes the current monotonic
//! [`Instant`] so callers (and tests) own the clock.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::error::CoreError;
use crate::media::{AdvanceTrigger, MediaKind};
use crate::scheduling::{effective_status, MediaStatus, ScheduledMedia, MIN_DURATION_SECS};
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Eligibility and ordering
// ---------------------------------------------------------------------------

/// Keep the media whose effective status is active at `now`, ordered by
/// ascending priority.
///
/// The sort is stable: equal priorities keep their input order, so callers
/// pass media in insertion order to get insertion-order tie-breaking.
pub fn eligible_ordered<M: ScheduledMedia>(media: &[M], now: Timestamp) -> Vec<&M> {
    let mut eligible: Vec<&M> = media
        .iter()
        .filter(|m| effective_status(*m, now) == MediaStatus::Active)
        .collect();
    eligible.sort_by_key(|m| m.priority());
    eligible
}

/// One entry of the rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceItem {
    pub asset_id: DbId,
    pub kind: MediaKind,
    pub duration_secs: i32,
}

impl SequenceItem {
    pub fn from_media<M: ScheduledMedia + ?Sized>(media: &M) -> Self {
        Self {
            asset_id: media.media_id(),
            kind: media.kind(),
            duration_secs: media.duration_secs(),
        }
    }

    /// Configured display time, never shorter than the minimum duration.
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs.max(MIN_DURATION_SECS) as u64)
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Rotation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No eligible media.
    Idle,
    /// Showing the item at the index; auto-advance is running.
    Showing(usize),
    /// Holding on the item at the index; no auto-advance.
    Paused(usize),
}

impl PlaybackState {
    pub fn index(self) -> Option<usize> {
        match self {
            Self::Idle => None,
            Self::Showing(i) | Self::Paused(i) => Some(i),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Showing(_) => "showing",
            Self::Paused(_) => "paused",
        }
    }

    /// Same variant, different index. `Idle` stays `Idle`.
    fn with_index(self, index: usize) -> Self {
        match self {
            Self::Idle => Self::Idle,
            Self::Showing(_) => Self::Showing(index),
            Self::Paused(_) => Self::Paused(index),
        }
    }
}

/// Elapsed time on the current item. Frozen while paused.
#[derive(Debug, Clone, Copy)]
struct ItemClock {
    banked: Duration,
    running_since: Option<Instant>,
}

impl ItemClock {
    fn running(now: Instant) -> Self {
        Self {
            banked: Duration::ZERO,
            running_since: Some(now),
        }
    }

    fn stopped() -> Self {
        Self {
            banked: Duration::ZERO,
            running_since: None,
        }
    }

    fn elapsed(&self, now: Instant) -> Duration {
        let running = self
            .running_since
            .map(|since| now.saturating_duration_since(since))
            .unwrap_or_default();
        self.banked + running
    }

    fn freeze(&mut self, now: Instant) {
        self.banked = self.elapsed(now);
        self.running_since = None;
    }

    fn run(&mut self, now: Instant) {
        if self.running_since.is_none() {
            self.running_since = Some(now);
        }
    }
}

/// Serializable view of the sequencer at an instant.
#[derive(Debug, Clone, Serialize)]
pub struct PlaybackSnapshot {
    pub state: &'static str,
    pub index: Option<usize>,
    pub len: usize,
    pub current: Option<SequenceItem>,
    pub elapsed_ms: u64,
    /// Fraction of the current item's duration already shown, in `[0, 1]`.
    pub progress: f64,
}

// ---------------------------------------------------------------------------
// Sequencer
// ---------------------------------------------------------------------------

/// Rotation through an ordered list of eligible media.
#[derive(Debug, Clone)]
pub struct Sequencer {
    items: Vec<SequenceItem>,
    state: PlaybackState,
    clock: ItemClock,
    /// Set when the list emptied while paused; the next refill starts paused.
    hold: bool,
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sequencer {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            state: PlaybackState::Idle,
            clock: ItemClock::stopped(),
            hold: false,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn items(&self) -> &[SequenceItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn current(&self) -> Option<&SequenceItem> {
        self.state.index().and_then(|i| self.items.get(i))
    }

    /// Replace the eligible set.
    ///
    /// An empty set moves to `Idle`. Leaving `Idle` starts at index 0, paused
    /// if playback was paused when the set emptied. An index that no longer
    /// fits is clamped to 0. The item clock restarts whenever a different
    /// item ends up under the index.
    pub fn load(&mut self, items: Vec<SequenceItem>, now: Instant) {
        let previous = self.current().map(|item| item.asset_id);
        self.items = items;

        if self.items.is_empty() {
            if matches!(self.state, PlaybackState::Paused(_)) {
                self.hold = true;
            }
            self.state = PlaybackState::Idle;
            self.clock = ItemClock::stopped();
            return;
        }

        match self.state {
            PlaybackState::Idle => {
                self.state = if std::mem::take(&mut self.hold) {
                    PlaybackState::Paused(0)
                } else {
                    PlaybackState::Showing(0)
                };
                self.restart_clock(now);
            }
            PlaybackState::Showing(i) | PlaybackState::Paused(i) => {
                let index = if i < self.items.len() { i } else { 0 };
                self.state = self.state.with_index(index);
                if previous != Some(self.items[index].asset_id) {
                    self.restart_clock(now);
                }
            }
        }
    }

    /// Move to the next item, wrapping around. Returns the new index, or
    /// `None` when idle. Keeps the paused flag.
    pub fn advance(&mut self, now: Instant) -> Option<usize> {
        let index = self.state.index()?;
        let next = (index + 1) % self.items.len();
        self.move_to(next, now);
        Some(next)
    }

    /// Move to the previous item, wrapping around.
    pub fn previous(&mut self, now: Instant) -> Option<usize> {
        let index = self.state.index()?;
        let len = self.items.len();
        let prev = (index + len - 1) % len;
        self.move_to(prev, now);
        Some(prev)
    }

    /// Jump to `index`, resetting the item clock.
    pub fn jump_to(&mut self, index: usize, now: Instant) -> Result<(), CoreError> {
        if index >= self.items.len() {
            return Err(CoreError::Validation(format!(
                "Index {index} is out of range for {} eligible item(s)",
                self.items.len()
            )));
        }
        self.move_to(index, now);
        Ok(())
    }

    /// Stop auto-advance, keeping the index and freezing elapsed time.
    pub fn pause(&mut self, now: Instant) -> bool {
        match self.state {
            PlaybackState::Showing(i) => {
                self.state = PlaybackState::Paused(i);
                self.clock.freeze(now);
                true
            }
            _ => false,
        }
    }

    /// Restart auto-advance from where the item was paused. While idle this
    /// only drops a pending hold.
    pub fn resume(&mut self, now: Instant) -> bool {
        match self.state {
            PlaybackState::Idle => std::mem::take(&mut self.hold),
            PlaybackState::Paused(i) => {
                self.state = PlaybackState::Showing(i);
                self.clock.run(now);
                true
            }
            _ => false,
        }
    }

    /// The player reports that video `asset_id` finished.
    ///
    /// Advances only when that video is the current item and playback is
    /// running. Late or duplicate reports are ignored.
    pub fn media_ended(&mut self, asset_id: DbId, now: Instant) -> bool {
        let is_current_video = matches!(self.state, PlaybackState::Showing(_))
            && self.current().is_some_and(|item| {
                item.asset_id == asset_id
                    && item.kind.advance_trigger() == AdvanceTrigger::MediaEnd
            });
        if is_current_video {
            self.advance(now);
        }
        is_current_video
    }

    /// Auto-advance if the current timed item has used up its duration.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.time_remaining(now) == Some(Duration::ZERO) {
            self.advance(now);
            true
        } else {
            false
        }
    }

    /// Time until the next automatic advance.
    ///
    /// `None` when idle, paused, or when the current item waits for a
    /// media-end report instead of a timer.
    pub fn time_remaining(&self, now: Instant) -> Option<Duration> {
        let PlaybackState::Showing(_) = self.state else {
            return None;
        };
        let item = self.current()?;
        match item.kind.advance_trigger() {
            AdvanceTrigger::Elapsed => {
                Some(item.duration().saturating_sub(self.clock.elapsed(now)))
            }
            AdvanceTrigger::MediaEnd => None,
        }
    }

    /// Time spent on the current item.
    pub fn elapsed(&self, now: Instant) -> Duration {
        match self.state {
            PlaybackState::Idle => Duration::ZERO,
            _ => self.clock.elapsed(now),
        }
    }

    /// `min(elapsed / duration, 1.0)`, or `0.0` when idle.
    pub fn progress(&self, now: Instant) -> f64 {
        match self.current() {
            Some(item) => {
                let ratio = self.elapsed(now).as_secs_f64() / item.duration().as_secs_f64();
                ratio.min(1.0)
            }
            None => 0.0,
        }
    }

    pub fn snapshot(&self, now: Instant) -> PlaybackSnapshot {
        PlaybackSnapshot {
            state: self.state.name(),
            index: self.state.index(),
            len: self.items.len(),
            current: self.current().cloned(),
            elapsed_ms: self.elapsed(now).as_millis() as u64,
            progress: self.progress(now),
        }
    }

    fn move_to(&mut self, index: usize, now: Instant) {
        self.state = self.state.with_index(index);
        self.restart_clock(now);
    }

    fn restart_clock(&mut self, now: Instant) {
        self.clock = match self.state {
            PlaybackState::Showing(_) => ItemClock::running(now),
            _ => ItemClock::stopped(),
        };
    }
}
