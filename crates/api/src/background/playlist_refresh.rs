//! Keeps the playback engine's eligible set current.
//!
//! Reloads the playlist on a fixed interval so scheduling windows that open
//! or close are picked up, and immediately whenever a `media.*` event is
//! published on the bus.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use signage_db::DbPool;
use signage_events::PlatformEvent;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::playback::PlaybackEngine;

/// Run the playlist refresh loop until `cancel` is triggered or the bus closes.
pub async fn run(
    engine: Arc<PlaybackEngine>,
    pool: DbPool,
    events: broadcast::Receiver<PlatformEvent>,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(interval_secs = interval.as_secs(), "Playlist refresh task started");

    refresh_loop(events, interval, cancel, |reason| {
        let engine = Arc::clone(&engine);
        let pool = pool.clone();
        async move {
            match engine.reload(&pool).await {
                Ok(snapshot) => {
                    tracing::debug!(
                        reason = %reason,
                        len = snapshot.len,
                        state = snapshot.state,
                        "Playlist refreshed"
                    );
                }
                Err(e) => {
                    tracing::error!(error = %e, reason = %reason, "Playlist refresh failed");
                }
            }
        }
    })
    .await;
}

/// Call `refresh` on every interval tick, every media event, and after
/// falling behind the bus. The first tick is skipped; the caller has
/// already loaded once.
async fn refresh_loop<F, Fut>(
    mut events: broadcast::Receiver<PlatformEvent>,
    interval: Duration,
    cancel: CancellationToken,
    mut refresh: F,
) where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Playlist refresh task stopping");
                break;
            }
            _ = ticker.tick() => {
                refresh("interval".to_string()).await;
            }
            received = events.recv() => match received {
                Ok(event) if event.is_media_change() => {
                    refresh(event.event_type).await;
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Playlist refresh lagged behind the event bus");
                    refresh("lagged".to_string()).await;
                }
                Err(RecvError::Closed) => {
                    tracing::info!("Event bus closed, playlist refresh task stopping");
                    break;
                }
            },
        }
    }
}
