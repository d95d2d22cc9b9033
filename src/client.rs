//! HTTP client for the dashboard backend.
//!
//! Every call ends in a [`FetchResult`]: transport problems, non-2xx
//! statuses and malformed payloads come back as [`FetchError`] values and
//! are never retried here. Retry policy belongs to the scheduler.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};
use crate::model::{
    AllocationSuggestion, Candle, ChatReply, Forecast, ForecastRequest, PerformancePoint,
    ScoredHeadline, SentimentCounts, SentimentReport, SeriesId, SeriesValue,
};
use crate::source::DataSource;

/// Optional parts of a request. Defaults to a bodiless GET.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn post(body: Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn query(mut self, name: &str, value: &str) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }
}

pub struct FetchClient {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl FetchClient {
    pub fn new(base_url: &str, timeout: Duration) -> FetchResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("portfolio-dash/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FetchError::from_reqwest)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Bearer token sent with every request; `None` after sign-out.
    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    fn bearer(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub async fn fetch(&self, endpoint: &str, options: RequestOptions) -> FetchResult<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(method = %options.method, %url, "API request");

        let mut request = self
            .http
            .request(options.method, &url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(token) = self.bearer() {
            request = request.bearer_auth(token);
        }
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if !options.query.is_empty() {
            request = request.query(&options.query);
        }
        if let Some(body) = &options.body {
            request = request.body(body.to_string());
        }

        let response = request.send().await.map_err(|e| {
            warn!(endpoint, error = %e, "API request failed");
            FetchError::from_reqwest(e)
        })?;

        let status = response.status();
        debug!(endpoint, status = status.as_u16(), "API response");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(endpoint, status = status.as_u16(), %body, "API error status");
            return Err(FetchError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await.map_err(FetchError::from_reqwest)?;
        serde_json::from_str(&text)
            .map_err(|e| FetchError::Transport(format!("response from {endpoint} is not JSON: {e}")))
    }

    pub async fn send_chat(&self, message: &str) -> FetchResult<ChatReply> {
        let raw = self
            .fetch("/api/chat", RequestOptions::post(json!({ "message": message })))
            .await?;
        serde_json::from_value(raw).map_err(|e| FetchError::Shape(format!("chat reply: {e}")))
    }

    pub async fn request_forecast(&self, request: &ForecastRequest) -> FetchResult<Forecast> {
        let body = serde_json::to_value(request)
            .map_err(|e| FetchError::Shape(format!("forecast request: {e}")))?;
        let raw = self.fetch("/api/forecast", RequestOptions::post(body)).await?;
        parse_forecast(&request.ticker, raw)
    }

    /// Exchange credentials for a session token.
    pub async fn login(&self, username: &str, password: &str) -> FetchResult<String> {
        let raw = self
            .fetch(
                "/api/login",
                RequestOptions::post(json!({ "username": username, "password": password })),
            )
            .await?;
        raw.get("token")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| FetchError::Shape("login response has no token".into()))
    }

    /// News sentiment for `ticker` and the allocation it suggests.
    pub async fn sentiment(&self, ticker: &str) -> FetchResult<SentimentReport> {
        let ticker = ticker.trim().to_uppercase();
        let raw = self
            .fetch(
                "/api/sentiment-analysis/",
                RequestOptions::default().query("ticker", &ticker),
            )
            .await?;
        parse_sentiment(&ticker, raw)
    }

    /// Daily total portfolio value, oldest first.
    pub async fn portfolio_history(&self) -> FetchResult<Vec<PerformancePoint>> {
        let raw = self.fetch("/api/portfolio/history", RequestOptions::default()).await?;
        parse_history(raw)
    }
}

#[async_trait]
impl DataSource for FetchClient {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch_series(&self, series: SeriesId) -> FetchResult<SeriesValue> {
        let raw = self.fetch(series.endpoint(), RequestOptions::default()).await?;
        SeriesValue::parse(series, raw)
    }
}

#[derive(Debug, Deserialize)]
struct ForecastEnvelope {
    status: String,
    #[serde(default)]
    results: BTreeMap<String, ForecastEntry>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastEntry {
    #[serde(default)]
    forecast: Option<OhlcColumns>,
    #[serde(default)]
    message: Option<String>,
}

/// Column-major OHLC keyed by date, as the backend serializes a frame.
#[derive(Debug, Deserialize)]
struct OhlcColumns {
    open: BTreeMap<String, f64>,
    high: BTreeMap<String, f64>,
    low: BTreeMap<String, f64>,
    close: BTreeMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct SentimentEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    sentiment_counts: Option<SentimentCounts>,
    average_score: Option<f64>,
    allocation_suggestion: Option<AllocationSuggestion>,
    #[serde(default)]
    headlines: Vec<ScoredHeadline>,
}

pub fn parse_sentiment(ticker: &str, raw: Value) -> FetchResult<SentimentReport> {
    let envelope: SentimentEnvelope =
        serde_json::from_value(raw).map_err(|e| FetchError::Shape(format!("sentiment: {e}")))?;

    if !envelope.success {
        let reason = envelope.message.unwrap_or_default();
        return Err(FetchError::Shape(format!(
            "no sentiment data found for {ticker}: {reason}"
        )));
    }

    let (Some(counts), Some(average_score), Some(suggestion)) = (
        envelope.sentiment_counts,
        envelope.average_score,
        envelope.allocation_suggestion,
    ) else {
        return Err(FetchError::Shape(format!("sentiment for {ticker} is incomplete")));
    };
    if !average_score.is_finite() {
        return Err(FetchError::Shape("sentiment average_score is not finite".into()));
    }

    Ok(SentimentReport {
        ticker: ticker.to_string(),
        counts,
        average_score,
        suggestion,
        headlines: envelope.headlines,
    })
}

/// Validate a performance history and order it by date.
pub fn parse_history(raw: Value) -> FetchResult<Vec<PerformancePoint>> {
    let mut points: Vec<PerformancePoint> =
        serde_json::from_value(raw).map_err(|e| FetchError::Shape(format!("history: {e}")))?;
    if points.is_empty() {
        return Err(FetchError::Shape("portfolio history is empty".into()));
    }
    if let Some(bad) = points.iter().find(|p| !p.total_value.is_finite()) {
        return Err(FetchError::Shape(format!(
            "history value for {} is not finite",
            bad.date
        )));
    }
    points.sort_by(|a, b| a.date.cmp(&b.date));
    Ok(points)
}

/// Normalize a forecast response into date-ordered candles.
pub fn parse_forecast(ticker: &str, raw: Value) -> FetchResult<Forecast> {
    let envelope: ForecastEnvelope =
        serde_json::from_value(raw).map_err(|e| FetchError::Shape(format!("forecast: {e}")))?;

    let entry = envelope.results.get(ticker).or_else(|| {
        envelope
            .results
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(ticker))
            .map(|(_, v)| v)
    });

    if envelope.status != "success" {
        let reason = entry
            .and_then(|e| e.message.clone())
            .or(envelope.message)
            .unwrap_or_else(|| format!("status {}", envelope.status));
        return Err(FetchError::Shape(format!("forecast failed: {reason}")));
    }

    let Some(entry) = entry else {
        return Err(FetchError::Shape(format!("no forecast returned for {ticker}")));
    };
    let Some(columns) = &entry.forecast else {
        let reason = entry.message.clone().unwrap_or_else(|| "Unknown error".into());
        return Err(FetchError::Shape(format!("forecast failed: {reason}")));
    };

    let mut candles = Vec::with_capacity(columns.close.len());
    for (date, &close) in &columns.close {
        let column = |name: &str, map: &BTreeMap<String, f64>| {
            map.get(date)
                .copied()
                .ok_or_else(|| FetchError::Shape(format!("forecast {name} missing for {date}")))
        };
        candles.push(Candle {
            date: date.clone(),
            open: column("open", &columns.open)?,
            high: column("high", &columns.high)?,
            low: column("low", &columns.low)?,
            close,
        });
    }

    Ok(Forecast {
        ticker: ticker.to_uppercase(),
        candles,
    })
}
