//! Initial load and periodic refresh of every series.
//!
//! `start` spawns one task per series. Each task fetches immediately, then
//! again after its own interval, and reports what happened as a
//! [`SyncEvent`] so the UI can re-render the panels bound to that series.
//! A series never waits on another one.
//!
//! `stop` bumps the active generation while holding the store lock. A task
//! whose fetch finishes after that sees a stale generation and drops the
//! result instead of writing it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::RefreshConfig;
use crate::error::FetchError;
use crate::model::SeriesId;
use crate::source::DataSource;
use crate::store::{self, SeriesState, SharedStore, UpdateOutcome};

/// Sent to the UI after every store update.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// A fetched value replaced the series
    Updated(SeriesId),
    /// The series has never loaded and is showing its fallback
    FellBack { series: SeriesId, error: FetchError },
    /// A refresh failed; the previous live value is still shown
    RefreshFailed {
        series: SeriesId,
        error: FetchError,
        streak: u32,
    },
}

impl SyncEvent {
    pub fn series(&self) -> SeriesId {
        match self {
            Self::Updated(series) => *series,
            Self::FellBack { series, .. } | Self::RefreshFailed { series, .. } => *series,
        }
    }
}

/// Delay before the next fetch, widened once `streak` reaches `threshold`.
pub fn backoff_delay(base: Duration, streak: u32, threshold: u32, max_factor: u32) -> Duration {
    if threshold == 0 || streak < threshold {
        return base;
    }
    let doublings = streak - threshold + 1;
    let factor = 2u32.saturating_pow(doublings).min(max_factor.max(1));
    base.saturating_mul(factor)
}

struct Running {
    shutdown: watch::Sender<bool>,
    refresh_now: Arc<Notify>,
    tasks: Vec<JoinHandle<()>>,
}

pub struct Scheduler {
    source: Arc<dyn DataSource>,
    store: SharedStore,
    refresh: RefreshConfig,
    events: mpsc::UnboundedSender<SyncEvent>,
    runtime: Handle,
    /// Generation allowed to write to the store; 0 while stopped
    active: Arc<AtomicU64>,
    next_generation: u64,
    running: Option<Running>,
}

impl Scheduler {
    pub fn new(
        source: Arc<dyn DataSource>,
        store: SharedStore,
        refresh: RefreshConfig,
        events: mpsc::UnboundedSender<SyncEvent>,
        runtime: Handle,
    ) -> Self {
        Self {
            source,
            store,
            refresh,
            events,
            runtime,
            active: Arc::new(AtomicU64::new(0)),
            next_generation: 0,
            running: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Fetch every series now and arm its timer. No-op while running.
    pub fn start(&mut self) {
        if self.running.is_some() {
            debug!("Scheduler already running");
            return;
        }

        self.next_generation += 1;
        let generation = self.next_generation;
        self.active.store(generation, Ordering::SeqCst);

        let (shutdown, shutdown_rx) = watch::channel(false);
        let refresh_now = Arc::new(Notify::new());

        let tasks = SeriesId::ALL
            .iter()
            .map(|&series| {
                let task = SeriesTask {
                    series,
                    generation,
                    interval: self.refresh.interval(series),
                    backoff_threshold: self.refresh.backoff_threshold,
                    max_backoff_factor: self.refresh.max_backoff_factor,
                    source: Arc::clone(&self.source),
                    store: Arc::clone(&self.store),
                    events: self.events.clone(),
                    active: Arc::clone(&self.active),
                    shutdown: shutdown_rx.clone(),
                    refresh_now: Arc::clone(&refresh_now),
                };
                self.runtime.spawn(task.run())
            })
            .collect();

        info!(
            generation,
            source = self.source.name(),
            market_secs = self.refresh.market_secs,
            portfolio_secs = self.refresh.portfolio_secs,
            "Sync scheduler started"
        );

        self.running = Some(Running {
            shutdown,
            refresh_now,
            tasks,
        });
    }

    /// Cancel all timers. Safe to call when already stopped.
    pub fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        {
            // Fence against tasks that are about to write
            let _guard = store::write(&self.store);
            self.active.store(0, Ordering::SeqCst);
        }
        let _ = running.shutdown.send(true);

        info!(
            generation = self.next_generation,
            tasks = running.tasks.len(),
            "Sync scheduler stopped"
        );
    }

    /// Wake every idle series task for an immediate refresh.
    pub fn refresh_now(&self) {
        if let Some(running) = &self.running {
            debug!("Manual refresh requested");
            running.refresh_now.notify_waiters();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

struct SeriesTask {
    series: SeriesId,
    generation: u64,
    interval: Duration,
    backoff_threshold: u32,
    max_backoff_factor: u32,
    source: Arc<dyn DataSource>,
    store: SharedStore,
    events: mpsc::UnboundedSender<SyncEvent>,
    active: Arc<AtomicU64>,
    shutdown: watch::Receiver<bool>,
    refresh_now: Arc<Notify>,
}

impl SeriesTask {
    async fn run(mut self) {
        let series = self.series;
        let mut streak = 0;
        let mut first = true;

        loop {
            if !first {
                let delay = backoff_delay(
                    self.interval,
                    streak,
                    self.backoff_threshold,
                    self.max_backoff_factor,
                );
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = self.refresh_now.notified() => {}
                    _ = self.shutdown.changed() => break,
                }
            }

            let result = self.source.fetch_series(series).await;
            let error = result.as_ref().err().cloned();

            let (outcome, was_pending) = {
                let mut store = store::write(&self.store);
                if self.active.load(Ordering::SeqCst) != self.generation {
                    debug!(%series, "Dropping fetch that finished after stop");
                    break;
                }
                let was_pending = store.status(series).state == SeriesState::Pending;
                let outcome = store.update(series, result);
                streak = store.status(series).failure_streak;
                (outcome, was_pending)
            };

            let event = match (outcome, error) {
                (UpdateOutcome::Replaced, _) => {
                    debug!(%series, "Series refreshed");
                    SyncEvent::Updated(series)
                }
                (UpdateOutcome::FellBack, Some(error)) => {
                    if was_pending {
                        warn!(%series, kind = error.kind(), error = %error, "First load failed, using fallback data");
                    } else {
                        warn!(%series, kind = error.kind(), error = %error, streak, "Series still unavailable");
                    }
                    SyncEvent::FellBack { series, error }
                }
                (UpdateOutcome::Retained, Some(error)) => {
                    warn!(%series, kind = error.kind(), error = %error, streak, "Refresh failed, keeping previous data");
                    SyncEvent::RefreshFailed {
                        series,
                        error,
                        streak,
                    }
                }
                // The store rejected a well-formed value for the wrong series
                (outcome, None) => {
                    let error = FetchError::Shape(format!("{series} update rejected"));
                    warn!(%series, ?outcome, "Source returned a value for another series");
                    if outcome == UpdateOutcome::Retained {
                        SyncEvent::RefreshFailed {
                            series,
                            error,
                            streak,
                        }
                    } else {
                        SyncEvent::FellBack { series, error }
                    }
                }
            };

            let _ = self.events.send(event);
            first = false;
        }

        debug!(%series, generation = self.generation, "Series task exited");
    }
}
