//! Latest known-good value of every series.
//!
//! The store is created with each series' fallback already installed, so a
//! read never comes back empty. Only successful fetches replace a value; a
//! failure is recorded next to the value and leaves it alone.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Local};
use tracing::debug;

use crate::error::{FetchError, FetchResult};
use crate::model::{MarketQuote, NewsItem, PortfolioSummary, SeriesId, SeriesValue, TeamMember};

/// Store handle shared by the scheduler tasks and the UI thread.
pub type SharedStore = Arc<RwLock<DataStore>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesState {
    /// Never updated; holding the fallback
    Pending,
    /// First load failed; holding the fallback
    Fallback,
    /// Holding a fetched value
    Live,
}

/// What an update did to the stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Success replaced the value
    Replaced,
    /// Failure on a series that has never been live
    FellBack,
    /// Failure after a live value; the value was kept
    Retained,
}

/// Everything about a series except its value.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesStatus {
    pub state: SeriesState,
    pub updated_at: Option<DateTime<Local>>,
    pub last_error: Option<FetchError>,
    pub failure_streak: u32,
}

impl SeriesStatus {
    fn new() -> Self {
        Self {
            state: SeriesState::Pending,
            updated_at: None,
            last_error: None,
            failure_streak: 0,
        }
    }

    /// Live value whose most recent refresh failed.
    pub fn is_stale(&self) -> bool {
        self.state == SeriesState::Live && self.failure_streak > 0
    }
}

#[derive(Debug, Clone)]
struct Series<T> {
    value: T,
    status: SeriesStatus,
}

impl<T> Series<T> {
    fn new(fallback: T) -> Self {
        Self {
            value: fallback,
            status: SeriesStatus::new(),
        }
    }

    fn replace(&mut self, value: T) -> UpdateOutcome {
        self.value = value;
        self.status = SeriesStatus {
            state: SeriesState::Live,
            updated_at: Some(Local::now()),
            last_error: None,
            failure_streak: 0,
        };
        UpdateOutcome::Replaced
    }

    fn fail(&mut self, error: FetchError, fallback: impl FnOnce() -> T) -> UpdateOutcome {
        self.status.failure_streak += 1;
        self.status.last_error = Some(error);
        match self.status.state {
            SeriesState::Live => UpdateOutcome::Retained,
            SeriesState::Pending | SeriesState::Fallback => {
                self.value = fallback();
                self.status.state = SeriesState::Fallback;
                UpdateOutcome::FellBack
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct DataStore {
    portfolio: Series<PortfolioSummary>,
    market: Series<Vec<MarketQuote>>,
    team: Series<Vec<TeamMember>>,
    news: Series<Vec<NewsItem>>,
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DataStore {
    pub fn new() -> Self {
        Self {
            portfolio: Series::new(crate::model::fallback_portfolio()),
            market: Series::new(crate::model::fallback_market()),
            team: Series::new(Vec::new()),
            news: Series::new(Vec::new()),
        }
    }

    pub fn shared() -> SharedStore {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Current value of `series`, fetched or fallback.
    pub fn get(&self, series: SeriesId) -> SeriesValue {
        match series {
            SeriesId::Portfolio => SeriesValue::Portfolio(self.portfolio.value.clone()),
            SeriesId::Market => SeriesValue::Market(self.market.value.clone()),
            SeriesId::Team => SeriesValue::Team(self.team.value.clone()),
            SeriesId::News => SeriesValue::News(self.news.value.clone()),
        }
    }

    pub fn portfolio(&self) -> &PortfolioSummary {
        &self.portfolio.value
    }

    pub fn market(&self) -> &[MarketQuote] {
        &self.market.value
    }

    pub fn team(&self) -> &[TeamMember] {
        &self.team.value
    }

    pub fn news(&self) -> &[NewsItem] {
        &self.news.value
    }

    pub fn status(&self, series: SeriesId) -> &SeriesStatus {
        match series {
            SeriesId::Portfolio => &self.portfolio.status,
            SeriesId::Market => &self.market.status,
            SeriesId::Team => &self.team.status,
            SeriesId::News => &self.news.status,
        }
    }

    /// Merge one fetch outcome into `series`.
    pub fn update(&mut self, series: SeriesId, result: FetchResult<SeriesValue>) -> UpdateOutcome {
        let outcome = match (series, result) {
            (SeriesId::Portfolio, Ok(SeriesValue::Portfolio(v))) => self.portfolio.replace(v),
            (SeriesId::Market, Ok(SeriesValue::Market(v))) => self.market.replace(v),
            (SeriesId::Team, Ok(SeriesValue::Team(v))) => self.team.replace(v),
            (SeriesId::News, Ok(SeriesValue::News(v))) => self.news.replace(v),
            (series, Ok(other)) => {
                let err = FetchError::Shape(format!(
                    "{} value delivered for {series}",
                    other.series()
                ));
                self.fail(series, err)
            }
            (series, Err(err)) => self.fail(series, err),
        };
        debug!(%series, ?outcome, "Store updated");
        outcome
    }

    fn fail(&mut self, series: SeriesId, err: FetchError) -> UpdateOutcome {
        match series {
            SeriesId::Portfolio => self.portfolio.fail(err, crate::model::fallback_portfolio),
            SeriesId::Market => self.market.fail(err, crate::model::fallback_market),
            SeriesId::Team => self.team.fail(err, Vec::new),
            SeriesId::News => self.news.fail(err, Vec::new),
        }
    }
}

/// Read access that survives a panicked writer.
pub fn read(store: &SharedStore) -> RwLockReadGuard<'_, DataStore> {
    store.read().unwrap_or_else(PoisonError::into_inner)
}

pub fn write(store: &SharedStore) -> RwLockWriteGuard<'_, DataStore> {
    store.write().unwrap_or_else(PoisonError::into_inner)
}
