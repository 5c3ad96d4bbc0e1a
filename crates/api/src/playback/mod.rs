//! Server-side playback engine for kiosk screens.
//!
//! [`PlaybackEngine`] owns one [`Sequencer`] and one [`AdvanceTimer`] behind
//! a single mutex. After every transition the timer is re-armed from the
//! sequencer's remaining time (or cancelled when nothing should advance on
//! its own). Each arm bumps a generation counter so a callback that lost a
//! race with a manual transition is discarded.

pub mod timer;

use std::sync::{Arc, Weak};
use std::time::Instant;

use signage_core::error::CoreError;
use signage_core::scheduling::ScheduledMedia;
use signage_core::sequencer::{eligible_ordered, PlaybackSnapshot, SequenceItem, Sequencer};
use signage_core::types::{DbId, Timestamp};
use signage_db::repositories::MediaAssetRepo;
use signage_db::DbPool;
use tokio::sync::Mutex;

use self::timer::AdvanceTimer;

struct Inner {
    sequencer: Sequencer,
    timer: AdvanceTimer,
    generation: u64,
}

/// Rotation state shared by the playback routes and the refresh task.
pub struct PlaybackEngine {
    inner: Mutex<Inner>,
}

/// Current monotonic instant. Goes through tokio so paused test time applies.
fn monotonic_now() -> Instant {
    tokio::time::Instant::now().into_std()
}

impl PlaybackEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner {
                sequencer: Sequencer::new(),
                timer: AdvanceTimer::new(),
                generation: 0,
            }),
        })
    }

    /// Reload the eligible set from the store.
    pub async fn reload(self: &Arc<Self>, pool: &DbPool) -> Result<PlaybackSnapshot, sqlx::Error> {
        let media = MediaAssetRepo::list_in_insertion_order(pool).await?;
        Ok(self.load_media(&media, chrono::Utc::now()).await)
    }

    /// Replace the eligible set with the media eligible at `now`.
    ///
    /// `media` must be in insertion order for priority ties to break correctly.
    pub async fn load_media<M: ScheduledMedia>(
        self: &Arc<Self>,
        media: &[M],
        now: Timestamp,
    ) -> PlaybackSnapshot {
        let items = eligible_ordered(media, now)
            .into_iter()
            .map(SequenceItem::from_media)
            .collect();
        self.load_items(items).await
    }

    /// Replace the eligible set with an already ordered list.
    pub async fn load_items(self: &Arc<Self>, items: Vec<SequenceItem>) -> PlaybackSnapshot {
        let count = items.len();
        let snapshot = self.apply(|seq, now| seq.load(items, now)).await;
        tracing::debug!(count, state = snapshot.state, "Playlist loaded");
        snapshot
    }

    pub async fn snapshot(&self) -> PlaybackSnapshot {
        let inner = self.inner.lock().await;
        inner.sequencer.snapshot(monotonic_now())
    }

    pub async fn advance(self: &Arc<Self>) -> PlaybackSnapshot {
        self.apply(|seq, now| {
            seq.advance(now);
        })
        .await
    }

    pub async fn previous(self: &Arc<Self>) -> PlaybackSnapshot {
        self.apply(|seq, now| {
            seq.previous(now);
        })
        .await
    }

    /// Pause rotation. The pending advance is cancelled.
    pub async fn pause(self: &Arc<Self>) -> PlaybackSnapshot {
        self.apply(|seq, now| {
            seq.pause(now);
        })
        .await
    }

    pub async fn resume(self: &Arc<Self>) -> PlaybackSnapshot {
        self.apply(|seq, now| {
            seq.resume(now);
        })
        .await
    }

    pub async fn jump_to(self: &Arc<Self>, index: usize) -> Result<PlaybackSnapshot, CoreError> {
        let mut inner = self.inner.lock().await;
        let now = monotonic_now();
        inner.sequencer.jump_to(index, now)?;
        Ok(self.reschedule(&mut inner, now))
    }

    /// The player finished showing video `asset_id`.
    pub async fn media_ended(self: &Arc<Self>, asset_id: DbId) -> PlaybackSnapshot {
        self.apply(|seq, now| {
            if !seq.media_ended(asset_id, now) {
                tracing::debug!(asset_id, "Ignoring media-ended report for non-current item");
            }
        })
        .await
    }

    /// Cancel the pending advance. Used on shutdown.
    pub async fn shutdown(&self) {
        let mut inner = self.inner.lock().await;
        inner.generation += 1;
        if inner.timer.cancel() {
            tracing::info!("Playback timer cancelled");
        }
    }

    /// Whether an automatic advance is scheduled.
    pub async fn is_timer_armed(&self) -> bool {
        self.inner.lock().await.timer.is_armed()
    }

    /// Run `f` against the sequencer under the lock, then re-arm the timer.
    async fn apply<F>(self: &Arc<Self>, f: F) -> PlaybackSnapshot
    where
        F: FnOnce(&mut Sequencer, Instant),
    {
        let mut inner = self.inner.lock().await;
        let now = monotonic_now();
        f(&mut inner.sequencer, now);
        self.reschedule(&mut inner, now)
    }

    /// Arm the timer for the next automatic advance, or cancel it.
    fn reschedule(self: &Arc<Self>, inner: &mut Inner, now: Instant) -> PlaybackSnapshot {
        inner.generation += 1;
        match inner.sequencer.time_remaining(now) {
            Some(delay) => {
                let engine: Weak<Self> = Arc::downgrade(self);
                let generation = inner.generation;
                inner.timer.arm(delay, async move {
                    if let Some(engine) = engine.upgrade() {
                        engine.on_timer(generation).await;
                    }
                });
            }
            None => {
                inner.timer.cancel();
            }
        }
        inner.sequencer.snapshot(now)
    }

    async fn on_timer(self: &Arc<Self>, generation: u64) {
        let mut inner = self.inner.lock().await;
        // A manual transition re-armed the timer after this one fired.
        if inner.generation != generation {
            return;
        }
        let now = monotonic_now();
        if inner.sequencer.tick(now) {
            tracing::debug!(index = ?inner.sequencer.state().index(), "Auto-advanced");
        }
        self.reschedule(&mut inner, now);
    }
}
