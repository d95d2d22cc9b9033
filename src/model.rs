//! Dashboard data shapes as the backend sends them, plus the static
//! fallback dataset shown until a series loads for the first time.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::FetchError;

/// A named logical data feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesId {
    Portfolio,
    Market,
    Team,
    News,
}

impl SeriesId {
    pub const ALL: [SeriesId; 4] = [
        SeriesId::Portfolio,
        SeriesId::Market,
        SeriesId::Team,
        SeriesId::News,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Portfolio => "portfolio",
            Self::Market => "market",
            Self::Team => "team",
            Self::News => "news",
        }
    }

    /// Backend path the series is read from.
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Portfolio => "/api/portfolio",
            Self::Market => "/api/market-data",
            Self::Team => "/api/team",
            Self::News => "/api/news",
        }
    }

    pub fn fallback(self) -> SeriesValue {
        match self {
            Self::Portfolio => SeriesValue::Portfolio(fallback_portfolio()),
            Self::Market => SeriesValue::Market(fallback_market()),
            Self::Team => SeriesValue::Team(Vec::new()),
            Self::News => SeriesValue::News(Vec::new()),
        }
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub total_value: f64,
    pub daily_change: f64,
    pub daily_change_percent: f64,
    pub total_return: f64,
    pub total_return_percent: f64,
    pub allocation: Allocation,
}

/// Asset class weights in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub stocks: f64,
    pub bonds: f64,
    pub crypto: f64,
    pub cash: f64,
}

impl Allocation {
    pub fn entries(&self) -> [(&'static str, f64); 4] {
        [
            ("Stocks", self.stocks),
            ("Bonds", self.bonds),
            ("Crypto", self.crypto),
            ("Cash", self.cash),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketQuote {
    pub symbol: String,
    pub price: f64,
    #[serde(default)]
    pub change: Option<f64>,
    #[serde(default)]
    pub change_percent: Option<f64>,
}

impl MarketQuote {
    pub fn new(symbol: &str, price: f64, change: f64, change_percent: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            price,
            change: Some(change),
            change_percent: Some(change_percent),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub name: String,
    pub role: String,
    pub description: String,
    #[serde(default)]
    pub expertise: Vec<String>,
    #[serde(default)]
    pub linkedin: String,
    #[serde(default)]
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default = "neutral")]
    pub sentiment: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub url: Option<String>,
}

fn neutral() -> String {
    "neutral".to_string()
}

/// Current value of one series, tagged with the series it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesValue {
    Portfolio(PortfolioSummary),
    Market(Vec<MarketQuote>),
    Team(Vec<TeamMember>),
    News(Vec<NewsItem>),
}

impl SeriesValue {
    pub fn series(&self) -> SeriesId {
        match self {
            Self::Portfolio(_) => SeriesId::Portfolio,
            Self::Market(_) => SeriesId::Market,
            Self::Team(_) => SeriesId::Team,
            Self::News(_) => SeriesId::News,
        }
    }

    /// Decode and validate a raw backend payload for `series`.
    pub fn parse(series: SeriesId, json: serde_json::Value) -> Result<Self, FetchError> {
        let value = match series {
            SeriesId::Portfolio => Self::Portfolio(decode(series, json)?),
            SeriesId::Market => Self::Market(decode(series, json)?),
            SeriesId::Team => Self::Team(decode(series, json)?),
            SeriesId::News => Self::News(decode(series, json)?),
        };
        value.validate()?;
        Ok(value)
    }

    /// Checks that decoding alone cannot express.
    pub fn validate(&self) -> Result<(), FetchError> {
        match self {
            Self::Portfolio(p) => {
                let numbers = [
                    ("totalValue", p.total_value),
                    ("dailyChange", p.daily_change),
                    ("dailyChangePercent", p.daily_change_percent),
                    ("totalReturn", p.total_return),
                    ("totalReturnPercent", p.total_return_percent),
                ];
                for (field, v) in numbers {
                    if !v.is_finite() {
                        return Err(shape(format!("portfolio {field} is not a finite number")));
                    }
                }
                for (label, weight) in p.allocation.entries() {
                    if !weight.is_finite() || weight < 0.0 {
                        return Err(shape(format!("allocation {label} is {weight}")));
                    }
                }
                Ok(())
            }
            Self::Market(quotes) => {
                if quotes.is_empty() {
                    return Err(shape("market snapshot is empty"));
                }
                for q in quotes {
                    if q.symbol.trim().is_empty() {
                        return Err(shape("market quote without a symbol"));
                    }
                    let fields = [Some(q.price), q.change, q.change_percent];
                    if fields.iter().flatten().any(|v| !v.is_finite()) {
                        return Err(shape(format!("{} has a non-finite price field", q.symbol)));
                    }
                }
                Ok(())
            }
            Self::Team(members) => {
                if members.iter().any(|m| m.name.trim().is_empty()) {
                    return Err(shape("team member without a name"));
                }
                Ok(())
            }
            Self::News(items) => {
                if items.iter().any(|n| n.title.trim().is_empty()) {
                    return Err(shape("news item without a title"));
                }
                Ok(())
            }
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(
    series: SeriesId,
    json: serde_json::Value,
) -> Result<T, FetchError> {
    serde_json::from_value(json).map_err(|e| shape(format!("{series}: {e}")))
}

fn shape(message: impl Into<String>) -> FetchError {
    FetchError::Shape(message.into())
}

pub fn fallback_portfolio() -> PortfolioSummary {
    PortfolioSummary {
        total_value: 125420.50,
        daily_change: 2840.25,
        daily_change_percent: 2.32,
        total_return: 25420.50,
        total_return_percent: 25.42,
        allocation: Allocation {
            stocks: 65.2,
            bonds: 15.8,
            crypto: 12.5,
            cash: 6.5,
        },
    }
}

pub fn fallback_market() -> Vec<MarketQuote> {
    vec![
        MarketQuote::new("AAPL", 195.84, 2.34, 1.21),
        MarketQuote::new("GOOGL", 142.56, -1.23, -0.85),
        MarketQuote::new("MSFT", 378.91, 4.67, 1.25),
        MarketQuote::new("TSLA", 248.73, -3.21, -1.27),
        MarketQuote::new("NVDA", 567.12, 12.45, 2.24),
        MarketQuote::new("BTC-USD", 67234.56, 1823.45, 2.78),
    ]
}

/// Reply from the chat endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRequest {
    pub ticker: String,
    pub days: u32,
    pub currency: String,
}

/// One forecast bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub ticker: String,
    pub candles: Vec<Candle>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SentimentCounts {
    #[serde(default)]
    pub positive: u32,
    #[serde(default)]
    pub neutral: u32,
    #[serde(default)]
    pub negative: u32,
}

/// Target mix for the stock/bond/cash split, in percent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SuggestedMix {
    #[serde(default)]
    pub stocks: f64,
    #[serde(default)]
    pub bonds: f64,
    #[serde(default)]
    pub cash: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AllocationSuggestion {
    pub strategy: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub allocation: SuggestedMix,
}

/// A scored news headline.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScoredHeadline {
    pub label: String,
    pub score: f64,
    pub text: String,
}

/// News sentiment for one ticker and the allocation it suggests.
#[derive(Debug, Clone, PartialEq)]
pub struct SentimentReport {
    pub ticker: String,
    pub counts: SentimentCounts,
    pub average_score: f64,
    pub suggestion: AllocationSuggestion,
    pub headlines: Vec<ScoredHeadline>,
}

impl SentimentReport {
    /// Headlines shown in the report.
    pub const HEADLINES_SHOWN: usize = 5;

    /// `[POSITIVE | 0.93] Apple beats estimates`
    pub fn headline_lines(&self) -> Vec<String> {
        self.headlines
            .iter()
            .take(Self::HEADLINES_SHOWN)
            .map(|h| format!("[{} | {:.2}] {}", h.label.to_uppercase(), h.score, h.text))
            .collect()
    }
}

/// Total portfolio value at the close of one day.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PerformancePoint {
    pub date: String,
    pub total_value: f64,
}
