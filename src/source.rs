//! Where series values come from.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use crate::error::FetchResult;
use crate::model::{self, MarketQuote, NewsItem, SeriesId, SeriesValue, TeamMember};

/// Anything the scheduler can pull a series value from.
#[async_trait]
pub trait DataSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_series(&self, series: SeriesId) -> FetchResult<SeriesValue>;
}

/// Offline source used with `DEMO=1`: serves the built-in dataset with
/// market prices drifting a little on every fetch.
#[derive(Debug, Default)]
pub struct DemoSource {
    ticks: AtomicU64,
}

impl DemoSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn drifted_market(tick: u64) -> Vec<MarketQuote> {
        model::fallback_market()
            .into_iter()
            .enumerate()
            .map(|(i, q)| {
                // Deterministic wobble in [-1%, +1%] so repeated runs look alike
                let phase = (tick as f64 + i as f64 * 1.7).sin() * 0.01;
                let prev = q.price - q.change.unwrap_or(0.0);
                let price = (q.price * (1.0 + phase) * 100.0).round() / 100.0;
                let change = price - prev;
                let change_percent = if prev != 0.0 { change / prev * 100.0 } else { 0.0 };
                MarketQuote::new(&q.symbol, price, change, change_percent)
            })
            .collect()
    }

    fn team() -> Vec<TeamMember> {
        let member = |name: &str, role: &str, description: &str, expertise: &[&str]| TeamMember {
            name: name.to_string(),
            role: role.to_string(),
            description: description.to_string(),
            expertise: expertise.iter().map(|e| e.to_string()).collect(),
            linkedin: String::new(),
            image: String::new(),
        };
        vec![
            member(
                "Demo Lead",
                "Team Lead",
                "Sets direction for the quant research roadmap.",
                &["Quantitative Finance", "Algorithmic Trading"],
            ),
            member(
                "Demo Engineer",
                "Backend Engineer",
                "Runs the data APIs behind the dashboard.",
                &["Python", "APIs"],
            ),
        ]
    }

    fn news() -> Vec<NewsItem> {
        vec![
            NewsItem {
                title: "Tech shares lead broad rally".into(),
                summary: "Large caps climbed as yields eased.".into(),
                sentiment: "positive".into(),
                time: "demo".into(),
                url: None,
            },
            NewsItem {
                title: "Oil slips on supply outlook".into(),
                summary: "Energy names lagged the wider market.".into(),
                sentiment: "negative".into(),
                time: "demo".into(),
                url: None,
            },
        ]
    }
}

#[async_trait]
impl DataSource for DemoSource {
    fn name(&self) -> &'static str {
        "demo"
    }

    async fn fetch_series(&self, series: SeriesId) -> FetchResult<SeriesValue> {
        let value = match series {
            SeriesId::Market => {
                let tick = self.ticks.fetch_add(1, Ordering::Relaxed);
                SeriesValue::Market(Self::drifted_market(tick))
            }
            SeriesId::Team => SeriesValue::Team(Self::team()),
            SeriesId::News => SeriesValue::News(Self::news()),
            SeriesId::Portfolio => SeriesId::Portfolio.fallback(),
        };
        Ok(value)
    }
}
