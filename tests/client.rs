//! HTTP client behaviour against a mock backend.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use portfolio_dash::client::{FetchClient, RequestOptions};
use portfolio_dash::error::FetchError;
use portfolio_dash::model::{ForecastRequest, SeriesId, SeriesValue};
use portfolio_dash::source::DataSource;

fn client(server: &MockServer) -> FetchClient {
    FetchClient::new(&server.uri(), Duration::from_secs(2)).unwrap()
}

fn portfolio_json() -> serde_json::Value {
    json!({
        "totalValue": 98000.0,
        "dailyChange": -120.5,
        "dailyChangePercent": -0.12,
        "totalReturn": 8000.0,
        "totalReturnPercent": 8.9,
        "allocation": { "stocks": 60.0, "bonds": 20.0, "crypto": 10.0, "cash": 10.0 }
    })
}

#[tokio::test]
async fn test_portfolio_payload_is_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/portfolio"))
        .respond_with(ResponseTemplate::new(200).set_body_json(portfolio_json()))
        .mount(&server)
        .await;

    let value = client(&server).fetch_series(SeriesId::Portfolio).await.unwrap();
    let SeriesValue::Portfolio(p) = value else {
        panic!("expected a portfolio value");
    };
    assert_eq!(p.total_value, 98000.0);
    assert_eq!(p.allocation.bonds, 20.0);
}

#[tokio::test]
async fn test_market_payload_keeps_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/market-data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "symbol": "MSFT", "price": 378.85, "change": 4.12, "changePercent": 1.10 },
            { "symbol": "TSLA", "price": 248.42, "change": -3.21, "changePercent": -1.27 }
        ])))
        .mount(&server)
        .await;

    let value = client(&server).fetch_series(SeriesId::Market).await.unwrap();
    let SeriesValue::Market(quotes) = value else {
        panic!("expected market quotes");
    };
    let symbols: Vec<&str> = quotes.iter().map(|q| q.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["MSFT", "TSLA"]);
    assert_eq!(quotes[1].change_percent, Some(-1.27));
}

#[tokio::test]
async fn test_server_error_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/news"))
        .respond_with(ResponseTemplate::new(500).set_body_string("News API error"))
        .mount(&server)
        .await;

    let err = client(&server).fetch_series(SeriesId::News).await.unwrap_err();
    assert_eq!(
        err,
        FetchError::Http {
            status: 500,
            body: "News API error".into()
        }
    );
}

#[tokio::test]
async fn test_missing_fields_are_shape_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/portfolio"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "totalValue": 1.0 })))
        .mount(&server)
        .await;

    let err = client(&server).fetch_series(SeriesId::Portfolio).await.unwrap_err();
    assert!(matches!(err, FetchError::Shape(_)), "got {err:?}");
}

#[tokio::test]
async fn test_empty_market_is_a_shape_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/market-data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let err = client(&server).fetch_series(SeriesId::Market).await.unwrap_err();
    assert!(matches!(err, FetchError::Shape(_)));
}

#[tokio::test]
async fn test_non_json_body_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/team"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client(&server).fetch_series(SeriesId::Team).await.unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)));
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    let client = FetchClient::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
    let err = client.fetch_series(SeriesId::Market).await.unwrap_err();
    assert_eq!(err.kind(), "transport");
}

#[tokio::test]
async fn test_chat_posts_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_json(json!({ "message": "How is AAPL doing?" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "response": "Up 1.2% today.", "type": "text" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let reply = client(&server).send_chat("How is AAPL doing?").await.unwrap();
    assert_eq!(reply.response, "Up 1.2% today.");
    assert_eq!(reply.kind, "text");
}

#[tokio::test]
async fn test_forecast_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/forecast"))
        .and(body_json(json!({ "ticker": "AAPL", "days": 2, "currency": "USD" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "results": { "AAPL": { "forecast": {
                "open":  { "2025-07-02": 197.0, "2025-07-01": 195.0 },
                "high":  { "2025-07-02": 199.0, "2025-07-01": 197.0 },
                "low":   { "2025-07-02": 196.0, "2025-07-01": 194.0 },
                "close": { "2025-07-02": 198.0, "2025-07-01": 196.5 }
            } } }
        })))
        .mount(&server)
        .await;

    let request = ForecastRequest {
        ticker: "AAPL".into(),
        days: 2,
        currency: "USD".into(),
    };
    let forecast = client(&server).request_forecast(&request).await.unwrap();
    let dates: Vec<&str> = forecast.candles.iter().map(|c| c.date.as_str()).collect();
    assert_eq!(dates, vec!["2025-07-01", "2025-07-02"]);
    assert_eq!(forecast.candles[1].close, 198.0);
}

#[tokio::test]
async fn test_login_token_is_sent_as_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "abc123" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/portfolio"))
        .and(header("authorization", "Bearer abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(portfolio_json()))
        .mount(&server)
        .await;

    let client = client(&server);
    let token = client.login("ada", "secret").await.unwrap();
    assert_eq!(token, "abc123");

    client.set_token(Some(token));
    assert!(client.fetch_series(SeriesId::Portfolio).await.is_ok());

    client.set_token(None);
    let err = client.fetch_series(SeriesId::Portfolio).await.unwrap_err();
    assert!(matches!(err, FetchError::Http { status: 404, .. }));
}

#[tokio::test]
async fn test_custom_headers_are_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/team"))
        .and(header("x-request-source", "dashboard"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let raw = client(&server)
        .fetch("/api/team", RequestOptions::default().header("x-request-source", "dashboard"))
        .await
        .unwrap();
    assert_eq!(raw, json!([]));
}

#[tokio::test]
async fn test_slow_response_times_out_as_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/market-data"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{ "symbol": "AAPL", "price": 195.84 }]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = FetchClient::new(&server.uri(), Duration::from_millis(300)).unwrap();
    let err = client.fetch_series(SeriesId::Market).await.unwrap_err();
    let FetchError::Transport(message) = err else {
        panic!("expected a transport error, got {err:?}");
    };
    assert!(message.contains("timed out"), "{message}");
}

#[tokio::test]
async fn test_sentiment_report_is_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/sentiment-analysis/"))
        .and(query_param("ticker", "TSLA"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "sentiment_counts": { "positive": 2, "neutral": 3, "negative": 5 },
            "average_score": -0.31,
            "allocation_suggestion": {
                "strategy": "Defensive",
                "description": "Trim equities until sentiment recovers",
                "allocation": { "stocks": 40, "bonds": 40, "cash": 20 }
            },
            "headlines": [
                { "label": "negative", "score": 0.91, "text": "Deliveries miss" },
                { "label": "neutral", "score": 0.55, "text": "New plant opens" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let report = client(&server).sentiment(" tsla ").await.unwrap();
    assert_eq!(report.ticker, "TSLA");
    assert_eq!(report.counts.negative, 5);
    assert_eq!(report.average_score, -0.31);
    assert_eq!(report.suggestion.strategy, "Defensive");
    assert_eq!(report.suggestion.allocation.cash, 20.0);
    assert_eq!(report.headline_lines()[0], "[NEGATIVE | 0.91] Deliveries miss");
}

#[tokio::test]
async fn test_sentiment_without_data_is_shape_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/sentiment-analysis/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": false, "message": "No news for ticker" })),
        )
        .mount(&server)
        .await;

    let err = client(&server).sentiment("QQQQ").await.unwrap_err();
    assert_eq!(
        err,
        FetchError::Shape("no sentiment data found for QQQQ: No news for ticker".into())
    );
}

#[tokio::test]
async fn test_portfolio_history_is_parsed_in_date_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/portfolio/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "date": "2025-07-02", "total_value": 100500.0 },
            { "date": "2025-07-01", "total_value": 100000.0 },
            { "date": "2025-07-03", "total_value": 101000.0 }
        ])))
        .mount(&server)
        .await;

    let points = client(&server).portfolio_history().await.unwrap();
    let dates: Vec<&str> = points.iter().map(|p| p.date.as_str()).collect();
    assert_eq!(dates, vec!["2025-07-01", "2025-07-02", "2025-07-03"]);
    assert_eq!(points[2].total_value, 101000.0);
}

#[tokio::test]
async fn test_portfolio_history_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/portfolio/history"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "detail": "Unable to get portfolio history"
        })))
        .mount(&server)
        .await;

    let err = client(&server).portfolio_history().await.unwrap_err();
    assert!(matches!(err, FetchError::Http { status: 500, .. }));
}
