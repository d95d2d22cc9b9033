//! Integration tests for the sync pipeline.
//!
//! A scripted source feeds the scheduler; the tests watch the store, the
//! emitted events and the rendered panels.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, Semaphore};
use tokio::time::Instant;

use portfolio_dash::config::RefreshConfig;
use portfolio_dash::error::{FetchError, FetchResult};
use portfolio_dash::model::{fallback_portfolio, MarketQuote, SeriesId, SeriesValue};
use portfolio_dash::render::View;
use portfolio_dash::scheduler::{Scheduler, SyncEvent};
use portfolio_dash::source::DataSource;
use portfolio_dash::store::{self, DataStore, SeriesState, SharedStore};
use portfolio_dash::views;

// ============================================================================
// Scripted source
// ============================================================================

/// Replays queued results per series, then serves the series' fallback.
#[derive(Default)]
struct ScriptedSource {
    script: Mutex<HashMap<SeriesId, Vec<FetchResult<SeriesValue>>>>,
    calls: AtomicU32,
    /// When set, every fetch waits for a permit before answering
    gate: Option<Arc<Semaphore>>,
    /// When set, every fetch without a scripted result fails
    unreachable: bool,
    market_fetches: Mutex<Vec<Instant>>,
}

impl ScriptedSource {
    fn new() -> Self {
        Self::default()
    }

    fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    /// A backend that refuses every connection.
    fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    fn then(self, series: SeriesId, result: FetchResult<SeriesValue>) -> Self {
        self.script
            .lock()
            .unwrap()
            .entry(series)
            .or_default()
            .push(result);
        self
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Seconds after `start` at which each market fetch happened.
    fn market_fetch_offsets(&self, start: Instant) -> Vec<u64> {
        self.market_fetches
            .lock()
            .unwrap()
            .iter()
            .map(|at| at.duration_since(start).as_secs())
            .collect()
    }
}

#[async_trait]
impl DataSource for ScriptedSource {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn fetch_series(&self, series: SeriesId) -> FetchResult<SeriesValue> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if series == SeriesId::Market {
            self.market_fetches.lock().unwrap().push(Instant::now());
        }
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.unwrap();
        }
        let mut script = self.script.lock().unwrap();
        match script.get_mut(&series) {
            Some(queue) if !queue.is_empty() => queue.remove(0),
            _ if self.unreachable => Err(FetchError::Transport("connection refused".into())),
            _ => Ok(series.fallback()),
        }
    }
}

fn six_quotes() -> Vec<MarketQuote> {
    ["AAPL", "GOOGL", "MSFT", "TSLA", "AMZN", "NVDA"]
        .iter()
        .enumerate()
        .map(|(i, s)| MarketQuote::new(s, 100.0 + i as f64, 1.0, 0.5))
        .collect()
}

struct Harness {
    scheduler: Scheduler,
    store: SharedStore,
    events: mpsc::UnboundedReceiver<SyncEvent>,
}

fn harness(source: Arc<dyn DataSource>) -> Harness {
    let store = DataStore::shared();
    let (tx, events) = mpsc::unbounded_channel();
    let scheduler = Scheduler::new(
        source,
        Arc::clone(&store),
        RefreshConfig::default(),
        tx,
        Handle::current(),
    );
    Harness {
        scheduler,
        store,
        events,
    }
}

async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

/// Collect events until one per series has arrived.
async fn initial_events(events: &mut mpsc::UnboundedReceiver<SyncEvent>) -> HashMap<SeriesId, SyncEvent> {
    let mut seen = HashMap::new();
    while seen.len() < SeriesId::ALL.len() {
        let event = events.recv().await.expect("scheduler dropped its sender");
        seen.insert(event.series(), event);
    }
    seen
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_every_series_is_populated_after_start() {
    let source = ScriptedSource::new().then(SeriesId::Market, Ok(SeriesValue::Market(six_quotes())));
    let mut h = harness(Arc::new(source));

    h.scheduler.start();
    let seen = initial_events(&mut h.events).await;

    for id in SeriesId::ALL {
        assert_eq!(seen[&id], SyncEvent::Updated(id));
        assert_eq!(store::read(&h.store).status(id).state, SeriesState::Live);
    }
    assert_eq!(store::read(&h.store).market(), six_quotes().as_slice());
}

#[tokio::test(start_paused = true)]
async fn test_first_load_failure_shows_fallback_portfolio() {
    let source = ScriptedSource::new().then(
        SeriesId::Portfolio,
        Err(FetchError::Transport("connection refused".into())),
    );
    let mut h = harness(Arc::new(source));

    h.scheduler.start();
    let seen = initial_events(&mut h.events).await;

    assert!(matches!(
        seen[&SeriesId::Portfolio],
        SyncEvent::FellBack { series: SeriesId::Portfolio, error: FetchError::Transport(_) }
    ));
    let store = store::read(&h.store);
    assert_eq!(store.portfolio().total_value, 125420.50);
    assert_eq!(store.status(SeriesId::Portfolio).state, SeriesState::Fallback);
    // Other series were not held back by the failure
    assert_eq!(store.status(SeriesId::Market).state, SeriesState::Live);

    let mut dispatcher = views::dashboard_dispatcher();
    dispatcher.render_all(SeriesId::Portfolio, &store);
    let lines = dispatcher.view(views::PORTFOLIO).unwrap().plain_lines();
    assert_eq!(lines[0], "Total Value:   $125,420.50");
}

#[tokio::test(start_paused = true)]
async fn test_refresh_failure_keeps_previous_market_data() {
    let source = ScriptedSource::new()
        .then(SeriesId::Market, Ok(SeriesValue::Market(six_quotes())))
        .then(
            SeriesId::Market,
            Err(FetchError::Http {
                status: 503,
                body: "unavailable".into(),
            }),
        );
    let mut h = harness(Arc::new(source));

    h.scheduler.start();
    initial_events(&mut h.events).await;

    // The paused clock jumps to the next market tick
    let event = loop {
        let event = h.events.recv().await.unwrap();
        if event.series() == SeriesId::Market {
            break event;
        }
    };
    assert!(matches!(
        event,
        SyncEvent::RefreshFailed { series: SeriesId::Market, streak: 1, .. }
    ));

    let store = store::read(&h.store);
    assert_eq!(store.market().len(), 6);
    assert_eq!(store.market(), six_quotes().as_slice());
    assert!(store.status(SeriesId::Market).is_stale());
}

#[tokio::test(start_paused = true)]
async fn test_rendering_twice_gives_identical_views() {
    let source = ScriptedSource::new().then(SeriesId::Market, Ok(SeriesValue::Market(six_quotes())));
    let mut h = harness(Arc::new(source));
    h.scheduler.start();
    initial_events(&mut h.events).await;

    let store = store::read(&h.store);
    let mut dispatcher = views::dashboard_dispatcher();
    dispatcher.render_everything(&store);
    let first: Vec<View> = dispatcher
        .target_names()
        .iter()
        .map(|name| dispatcher.view(name).unwrap().clone())
        .collect();

    for id in SeriesId::ALL {
        dispatcher.render_all(id, &store);
    }
    let second: Vec<View> = dispatcher
        .target_names()
        .iter()
        .map(|name| dispatcher.view(name).unwrap().clone())
        .collect();

    assert_eq!(first, second);
}

#[tokio::test(start_paused = true)]
async fn test_stop_discards_fetches_still_in_flight() {
    let gate = Arc::new(Semaphore::new(0));
    let source = Arc::new(ScriptedSource::gated(Arc::clone(&gate)));
    let mut h = harness(source.clone());

    h.scheduler.start();
    settle().await;
    assert_eq!(source.calls(), 4);

    h.scheduler.stop();
    gate.add_permits(SeriesId::ALL.len());
    settle().await;

    let store = store::read(&h.store);
    for id in SeriesId::ALL {
        assert_eq!(store.status(id).state, SeriesState::Pending);
    }
    assert_eq!(store.portfolio(), &fallback_portfolio());
    assert!(h.events.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_no_fetches_after_stop() {
    let source = Arc::new(ScriptedSource::new());
    let mut h = harness(source.clone());

    h.scheduler.start();
    initial_events(&mut h.events).await;
    h.scheduler.stop();
    h.scheduler.stop();
    assert!(!h.scheduler.is_running());

    let calls = source.calls();
    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(source.calls(), calls);
    assert!(h.events.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_start_twice_does_not_duplicate_tasks() {
    let source = Arc::new(ScriptedSource::new());
    let mut h = harness(source.clone());

    h.scheduler.start();
    h.scheduler.start();
    initial_events(&mut h.events).await;
    settle().await;

    assert_eq!(source.calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_restart_after_stop_loads_again() {
    let source = Arc::new(ScriptedSource::new());
    let mut h = harness(source.clone());

    h.scheduler.start();
    initial_events(&mut h.events).await;
    h.scheduler.stop();

    h.scheduler.start();
    let seen = initial_events(&mut h.events).await;
    assert_eq!(seen.len(), 4);
    assert_eq!(source.calls(), 8);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_now_fetches_without_waiting_for_timers() {
    let source = Arc::new(ScriptedSource::new());
    let mut h = harness(source.clone());

    h.scheduler.start();
    initial_events(&mut h.events).await;
    settle().await;

    let before = tokio::time::Instant::now();
    h.scheduler.refresh_now();
    initial_events(&mut h.events).await;

    assert_eq!(source.calls(), 8);
    assert!(before.elapsed() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_repeated_failures_back_off_market_refresh() {
    let source = Arc::new(ScriptedSource::unreachable());
    let mut h = harness(source.clone());
    let start = Instant::now();

    h.scheduler.start();
    tokio::time::sleep(Duration::from_secs(600)).await;
    settle().await;

    // 30 s base, widened after the third failure, capped at 8x
    assert_eq!(source.market_fetch_offsets(start), vec![0, 30, 60, 120, 240, 480]);

    let mut market_events = Vec::new();
    while let Ok(event) = h.events.try_recv() {
        if event.series() == SeriesId::Market {
            market_events.push(event);
        }
    }
    assert_eq!(market_events.len(), 6);
    assert!(market_events.iter().all(|e| matches!(
        e,
        SyncEvent::FellBack { series: SeriesId::Market, error: FetchError::Transport(_) }
    )));

    let store = store::read(&h.store);
    assert_eq!(store.status(SeriesId::Market).failure_streak, 6);
    assert_eq!(store.market().len(), 6);
}
