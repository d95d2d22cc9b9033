//! The dashboard panels.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::error::RenderError;
use crate::model::{MarketQuote, SeriesId};
use crate::render::{Bar, RenderDispatcher, RenderTarget, View};
use crate::store::{DataStore, SeriesState};

pub const TICKER: &str = "ticker";
pub const WATCHLIST: &str = "watchlist";
pub const PORTFOLIO: &str = "portfolio";
pub const ALLOCATION: &str = "allocation";
pub const TEAM: &str = "team";
pub const NEWS: &str = "news";

/// Watchlist shows at most this many quotes.
pub const WATCHLIST_LEN: usize = 6;

/// Dispatcher with every dashboard panel registered.
pub fn dashboard_dispatcher() -> RenderDispatcher {
    RenderDispatcher::new()
        .with_target(Box::new(Ticker))
        .with_target(Box::new(Watchlist))
        .with_target(Box::new(PortfolioSummaryView))
        .with_target(Box::new(AllocationChart))
        .with_target(Box::new(TeamRoster))
        .with_target(Box::new(NewsFeed))
}

/// `$125,420.50`, with a leading minus for negatives.
pub fn format_money(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}

/// `+$2,840.25` / `-$12.00`
pub fn format_signed_money(value: f64) -> String {
    if value >= 0.0 {
        format!("+{}", format_money(value))
    } else {
        format_money(value)
    }
}

fn change_color(change: f64) -> Color {
    if change >= 0.0 {
        Color::Green
    } else {
        Color::Red
    }
}

/// `AAPL $195.84 +2.34 (+1.21%)`, split into styled spans.
fn quote_spans(quote: &MarketQuote) -> Vec<Span<'static>> {
    let change = quote.change.unwrap_or(0.0);
    let change_percent = quote.change_percent.unwrap_or(0.0);
    let color = change_color(change);
    // One sign for both numbers; `{:+}` would print `-0.00` for -0.0
    let sign = if change >= 0.0 { '+' } else { '-' };
    vec![
        Span::styled(
            quote.symbol.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" ${:.2} ", quote.price)),
        Span::styled(
            format!(
                "{sign}{:.2} ({sign}{:.2}%)",
                change.abs(),
                change_percent.abs()
            ),
            Style::default().fg(color),
        ),
    ]
}

fn placeholder(text: &str) -> View {
    View::Lines(vec![Line::styled(
        text.to_string(),
        Style::default().fg(Color::DarkGray),
    )])
}

/// Scrolling strip of every quote.
pub struct Ticker;

impl RenderTarget for Ticker {
    fn name(&self) -> &'static str {
        TICKER
    }

    fn series(&self) -> &[SeriesId] {
        &[SeriesId::Market]
    }

    fn render(&self, store: &DataStore) -> Result<View, RenderError> {
        let quotes = store.market();
        if quotes.is_empty() {
            return Ok(placeholder("No market data available"));
        }
        let mut spans = Vec::with_capacity(quotes.len() * 4);
        for (i, quote) in quotes.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled("  │  ", Style::default().fg(Color::DarkGray)));
            }
            spans.extend(quote_spans(quote));
        }
        Ok(View::Lines(vec![Line::from(spans)]))
    }
}

pub struct Watchlist;

impl RenderTarget for Watchlist {
    fn name(&self) -> &'static str {
        WATCHLIST
    }

    fn series(&self) -> &[SeriesId] {
        &[SeriesId::Market]
    }

    fn render(&self, store: &DataStore) -> Result<View, RenderError> {
        let quotes = store.market();
        if quotes.is_empty() {
            return Ok(placeholder("No market data available"));
        }
        let lines = quotes
            .iter()
            .take(WATCHLIST_LEN)
            .map(|q| Line::from(quote_spans(q)))
            .collect();
        Ok(View::Lines(lines))
    }
}

pub struct PortfolioSummaryView;

impl RenderTarget for PortfolioSummaryView {
    fn name(&self) -> &'static str {
        PORTFOLIO
    }

    fn series(&self) -> &[SeriesId] {
        &[SeriesId::Portfolio]
    }

    fn render(&self, store: &DataStore) -> Result<View, RenderError> {
        let p = store.portfolio();
        let status = store.status(SeriesId::Portfolio);
        let daily_color = change_color(p.daily_change);
        let return_color = change_color(p.total_return);

        let source = match (status.state, status.updated_at) {
            (SeriesState::Live, Some(at)) => format!("Updated {}", at.format("%H:%M:%S")),
            (SeriesState::Fallback, _) => "Showing fallback data".to_string(),
            _ => "Loading…".to_string(),
        };

        Ok(View::Lines(vec![
            Line::from(vec![
                Span::raw("Total Value:   "),
                Span::styled(
                    format_money(p.total_value),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(vec![
                Span::raw("Daily Change:  "),
                Span::styled(
                    format!(
                        "{} ({:+.2}%)",
                        format_signed_money(p.daily_change),
                        p.daily_change_percent
                    ),
                    Style::default().fg(daily_color),
                ),
            ]),
            Line::from(vec![
                Span::raw("Total Return:  "),
                Span::styled(
                    format!(
                        "{} ({:+.2}%)",
                        format_money(p.total_return),
                        p.total_return_percent
                    ),
                    Style::default().fg(return_color),
                ),
            ]),
            Line::from(""),
            Line::styled(source, Style::default().fg(Color::DarkGray)),
        ]))
    }
}

/// Allocation percentages for the bar chart.
pub struct AllocationChart;

impl RenderTarget for AllocationChart {
    fn name(&self) -> &'static str {
        ALLOCATION
    }

    fn series(&self) -> &[SeriesId] {
        &[SeriesId::Portfolio]
    }

    fn render(&self, store: &DataStore) -> Result<View, RenderError> {
        let allocation = &store.portfolio().allocation;
        let mut bars = Vec::with_capacity(4);
        for (label, pct) in allocation.entries() {
            if !pct.is_finite() || pct < 0.0 {
                return Err(RenderError::new(ALLOCATION, format!("{label} weight is {pct}")));
            }
            bars.push(Bar {
                label: label.to_string(),
                value: (pct * 10.0).round() as u64,
            });
        }
        if bars.iter().all(|b| b.value == 0) {
            return Err(RenderError::new(ALLOCATION, "portfolio has no allocation"));
        }
        Ok(View::Bars(bars))
    }
}

pub struct TeamRoster;

impl RenderTarget for TeamRoster {
    fn name(&self) -> &'static str {
        TEAM
    }

    fn series(&self) -> &[SeriesId] {
        &[SeriesId::Team]
    }

    fn render(&self, store: &DataStore) -> Result<View, RenderError> {
        let team = store.team();
        if team.is_empty() {
            return Ok(placeholder("No team members loaded"));
        }
        let mut lines = Vec::with_capacity(team.len() * 4);
        for member in team {
            lines.push(Line::from(vec![
                Span::styled(
                    member.name.clone(),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!(" · {}", member.role)),
            ]));
            lines.push(Line::from(format!("  {}", member.description)));
            if !member.expertise.is_empty() {
                lines.push(Line::styled(
                    format!("  {}", member.expertise.join(", ")),
                    Style::default().fg(Color::Yellow),
                ));
            }
            if !member.linkedin.is_empty() {
                lines.push(Line::styled(
                    format!("  {}", member.linkedin),
                    Style::default().fg(Color::DarkGray),
                ));
            }
        }
        Ok(View::Lines(lines))
    }
}

pub struct NewsFeed;

impl RenderTarget for NewsFeed {
    fn name(&self) -> &'static str {
        NEWS
    }

    fn series(&self) -> &[SeriesId] {
        &[SeriesId::News]
    }

    fn render(&self, store: &DataStore) -> Result<View, RenderError> {
        let news = store.news();
        if news.is_empty() {
            return Ok(match store.status(SeriesId::News).state {
                SeriesState::Fallback => placeholder("Could not load latest news."),
                _ => placeholder("No news available"),
            });
        }
        let mut lines = Vec::with_capacity(news.len() * 3);
        for item in news {
            let sentiment_color = match item.sentiment.as_str() {
                "positive" => Color::Green,
                "negative" => Color::Red,
                _ => Color::Gray,
            };
            lines.push(Line::from(vec![
                Span::styled(
                    format!("[{}] ", item.sentiment),
                    Style::default().fg(sentiment_color),
                ),
                Span::styled(
                    item.title.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ]));
            if !item.time.is_empty() {
                lines.push(Line::styled(
                    format!("  {}", item.time),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            if !item.summary.is_empty() {
                lines.push(Line::from(format!("  {}", item.summary)));
            }
            if let Some(url) = item.url.as_deref().filter(|u| !u.is_empty()) {
                lines.push(Line::styled(
                    format!("  {url}"),
                    Style::default().fg(Color::Blue),
                ));
            }
        }
        Ok(View::Lines(lines))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::model::{NewsItem, SeriesValue};

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(125420.50), "$125,420.50");
        assert_eq!(format_money(999.999), "$1,000.00");
        assert_eq!(format_money(0.0), "$0.00");
        assert_eq!(format_money(-1234567.8), "-$1,234,567.80");
        assert_eq!(format_signed_money(2840.25), "+$2,840.25");
        assert_eq!(format_signed_money(-12.0), "-$12.00");
    }

    #[test]
    fn test_single_quote_renders_identically_in_ticker_and_watchlist() {
        let mut store = DataStore::new();
        store.update(
            SeriesId::Market,
            Ok(SeriesValue::Market(vec![MarketQuote::new("AAPL", 195.84, 2.34, 1.21)])),
        );

        let ticker = Ticker.render(&store).unwrap().plain_lines();
        let watchlist = Watchlist.render(&store).unwrap().plain_lines();
        assert_eq!(ticker, vec!["AAPL $195.84 +2.34 (+1.21%)".to_string()]);
        assert_eq!(watchlist, ticker);
    }

    #[test]
    fn test_negative_change_and_missing_fields() {
        let mut store = DataStore::new();
        let mut flat = MarketQuote::new("SPY", 500.0, 0.0, 0.0);
        flat.change = None;
        flat.change_percent = None;
        store.update(
            SeriesId::Market,
            Ok(SeriesValue::Market(vec![
                MarketQuote::new("GOOGL", 142.56, -1.23, -0.85),
                flat,
            ])),
        );
        let lines = Watchlist.render(&store).unwrap().plain_lines();
        assert_eq!(lines[0], "GOOGL $142.56 -1.23 (-0.85%)");
        assert_eq!(lines[1], "SPY $500.00 +0.00 (+0.00%)");
    }

    #[test]
    fn test_negative_zero_change_renders_as_unchanged() {
        let mut store = DataStore::new();
        store.update(
            SeriesId::Market,
            Ok(SeriesValue::Market(vec![MarketQuote::new(
                "AAPL", 195.84, -0.0, -0.0,
            )])),
        );
        let lines = Watchlist.render(&store).unwrap().plain_lines();
        assert_eq!(lines[0], "AAPL $195.84 +0.00 (+0.00%)");
        assert_eq!(change_color(-0.0), Color::Green);
    }

    #[test]
    fn test_watchlist_caps_at_six() {
        let mut store = DataStore::new();
        let quotes = (0..9)
            .map(|i| MarketQuote::new(&format!("S{i}"), 10.0, 0.1, 1.0))
            .collect();
        store.update(SeriesId::Market, Ok(SeriesValue::Market(quotes)));
        assert_eq!(Watchlist.render(&store).unwrap().plain_lines().len(), WATCHLIST_LEN);
        let ticker = Ticker.render(&store).unwrap().plain_lines();
        assert!(ticker[0].contains("S8"));
    }

    #[test]
    fn test_portfolio_fallback_renders_value() {
        let mut store = DataStore::new();
        store.update(
            SeriesId::Portfolio,
            Err(FetchError::Transport("offline".into())),
        );
        let lines = PortfolioSummaryView.render(&store).unwrap().plain_lines();
        assert_eq!(lines[0], "Total Value:   $125,420.50");
        assert_eq!(lines[1], "Daily Change:  +$2,840.25 (+2.32%)");
        assert_eq!(lines[4], "Showing fallback data");
    }

    #[test]
    fn test_allocation_bars() {
        let store = DataStore::new();
        let View::Bars(bars) = AllocationChart.render(&store).unwrap() else {
            panic!("expected bars");
        };
        let values: Vec<u64> = bars.iter().map(|b| b.value).collect();
        assert_eq!(values, vec![652, 158, 125, 65]);
    }

    #[test]
    fn test_zero_allocation_is_a_render_error() {
        let mut store = DataStore::new();
        let mut p = crate::model::fallback_portfolio();
        p.allocation.stocks = 0.0;
        p.allocation.bonds = 0.0;
        p.allocation.crypto = 0.0;
        p.allocation.cash = 0.0;
        store.update(SeriesId::Portfolio, Ok(SeriesValue::Portfolio(p)));
        assert!(AllocationChart.render(&store).is_err());
    }

    #[test]
    fn test_news_placeholders() {
        let mut store = DataStore::new();
        assert_eq!(
            NewsFeed.render(&store).unwrap().plain_lines(),
            vec!["No news available".to_string()]
        );
        store.update(SeriesId::News, Err(FetchError::Http { status: 500, body: String::new() }));
        assert_eq!(
            NewsFeed.render(&store).unwrap().plain_lines(),
            vec!["Could not load latest news.".to_string()]
        );
    }

    #[test]
    fn test_news_item_lines() {
        let mut store = DataStore::new();
        store.update(
            SeriesId::News,
            Ok(SeriesValue::News(vec![NewsItem {
                title: "Fed holds rates".into(),
                summary: "Markets steady".into(),
                sentiment: "neutral".into(),
                time: "2025-07-01T10:00:00Z".into(),
                url: Some("https://news.example/fed".into()),
            }])),
        );
        let lines = NewsFeed.render(&store).unwrap().plain_lines();
        assert_eq!(lines[0], "[neutral] Fed holds rates");
        assert_eq!(lines[3], "  https://news.example/fed");
    }

    #[test]
    fn test_dashboard_dispatcher_registers_all_panels() {
        let dispatcher = dashboard_dispatcher();
        assert_eq!(
            dispatcher.target_names(),
            vec![TICKER, WATCHLIST, PORTFOLIO, ALLOCATION, TEAM, NEWS]
        );
    }
}
