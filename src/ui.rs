//! Terminal drawing. Panels paint the views the dispatcher already built;
//! dialogs read the app state directly.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Bar as BarWidget, BarChart, BarGroup, Block, Borders, Cell, Chart, Clear, Dataset,
        GraphType, Paragraph, Row, Table, Tabs, Wrap,
    },
    Frame,
};

use crate::app::{App, ChatLine, ForecastForm, InputMode, LoginForm, NoticeLevel, Speaker, Tab};
use crate::model::{Forecast, PerformancePoint, SentimentReport, SeriesId};
use crate::render::View;
use crate::store;
use crate::views;

/// Rows of the forecast table under the chart.
const FORECAST_TABLE_ROWS: usize = 5;

pub fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Ticker
            Constraint::Min(12),   // Panels
            Constraint::Length(1), // Notice
            Constraint::Length(1), // Footer
        ])
        .split(f.area());

    render_panel(f, app, views::TICKER, "Market", SeriesId::Market, chunks[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(chunks[1]);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(6)])
        .split(columns[0]);
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(6)])
        .split(columns[1]);

    render_panel(f, app, views::PORTFOLIO, "Portfolio", SeriesId::Portfolio, left[0]);
    render_panel(f, app, views::ALLOCATION, "Allocation", SeriesId::Portfolio, left[1]);
    render_panel(f, app, views::WATCHLIST, "Watchlist", SeriesId::Market, right[0]);
    render_team_news(f, app, right[1]);

    render_notice(f, app, chunks[2]);
    render_footer(f, app, chunks[3]);

    match &app.input_mode {
        InputMode::Chat(input) => render_chat_dialog(f, app, input),
        InputMode::Forecast(form) => render_forecast_dialog(f, app, form),
        InputMode::ForecastView(forecast) => render_forecast_view(f, forecast),
        InputMode::Sentiment(input) => render_sentiment_dialog(f, app, input),
        InputMode::SentimentView(report) => render_sentiment_view(f, report),
        InputMode::History(points) => render_history_view(f, app, points.as_deref()),
        InputMode::Login(form) => render_login_dialog(f, app, form),
        InputMode::Normal => {}
    }
}

/// Panel title with a marker when the shown value outlived a failed refresh.
fn panel_title(app: &App, title: &str, series: SeriesId) -> Line<'static> {
    let store = store::read(&app.store);
    let status = store.status(series);
    if status.is_stale() {
        Line::from(vec![
            Span::raw(format!(" {title} ")),
            Span::styled("(stale) ", Style::default().fg(Color::Yellow)),
        ])
    } else {
        Line::from(format!(" {title} "))
    }
}

fn render_panel(f: &mut Frame, app: &App, target: &str, title: &str, series: SeriesId, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(panel_title(app, title, series));
    render_view(f, app.dispatcher.view(target), block, area);
}

fn render_view(f: &mut Frame, view: Option<&View>, block: Block, area: Rect) {
    match view {
        Some(View::Lines(lines)) => {
            let paragraph = Paragraph::new(lines.clone())
                .block(block)
                .wrap(Wrap { trim: false });
            f.render_widget(paragraph, area);
        }
        Some(View::Bars(bars)) => {
            let widgets: Vec<BarWidget> = bars
                .iter()
                .map(|b| {
                    BarWidget::default()
                        .value(b.value)
                        .label(Line::from(b.label.clone()))
                        .text_value(format!("{:.1}%", b.value as f64 / 10.0))
                })
                .collect();
            let chart = BarChart::default()
                .block(block)
                .data(BarGroup::default().bars(&widgets))
                .bar_width(9)
                .bar_gap(2)
                .max(1000)
                .bar_style(Style::default().fg(Color::Cyan))
                .value_style(Style::default().fg(Color::Black).bg(Color::Cyan));
            f.render_widget(chart, area);
        }
        Some(View::Failed(message)) => {
            let paragraph = Paragraph::new(format!("  Cannot display: {message}"))
                .block(block)
                .style(Style::default().fg(Color::Red));
            f.render_widget(paragraph, area);
        }
        None => {
            let paragraph = Paragraph::new("  Loading…")
                .block(block)
                .style(Style::default().fg(Color::DarkGray));
            f.render_widget(paragraph, area);
        }
    }
}

fn render_team_news(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    let (series, target) = match app.tab {
        Tab::Team => (SeriesId::Team, views::TEAM),
        Tab::News => (SeriesId::News, views::NEWS),
    };

    let titles: Vec<Line> = [Tab::Team, Tab::News]
        .iter()
        .map(|&tab| {
            let name = if tab == Tab::Team { " Team " } else { " News " };
            if tab == app.tab {
                Line::from(name).cyan().bold()
            } else {
                Line::from(name).dark_gray()
            }
        })
        .collect();
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title(panel_title(app, "Team / News", series)))
        .divider("|");
    f.render_widget(tabs, chunks[0]);

    let block = Block::default().borders(Borders::LEFT | Borders::RIGHT | Borders::BOTTOM);
    render_view(f, app.dispatcher.view(target), block, chunks[1]);
}

fn render_notice(f: &mut Frame, app: &App, area: Rect) {
    let line = match app.notices.latest() {
        Some(notice) => {
            let color = match notice.level {
                NoticeLevel::Info => Color::Cyan,
                NoticeLevel::Warning => Color::Yellow,
                NoticeLevel::Error => Color::Red,
            };
            Line::from(Span::styled(
                format!(" {}", notice.text),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ))
        }
        None => {
            let status = match (&app.last_sync, app.is_syncing()) {
                (Some(at), true) => format!(" Last update {}", at.format("%H:%M:%S")),
                (None, true) => " Loading…".to_string(),
                (_, false) => " Sync paused · sign in to load live data".to_string(),
            };
            Line::from(Span::styled(status, Style::default().fg(Color::DarkGray)))
        }
    };
    f.render_widget(Paragraph::new(line), area);
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let session_key = if app.user().is_some() {
        "o=Sign out"
    } else {
        "l=Login"
    };
    let keys = format!(
        " r=Refresh | c=Chat | f=Forecast | s=Sentiment | h=History | t=Team/News | {session_key} | q=Quit "
    );

    let mut spans = vec![Span::styled(keys, Style::default().fg(Color::Yellow))];
    if let Some(user) = app.user() {
        spans.push(Span::styled(
            format!(" {user} "),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ));
    }
    if app.demo {
        spans.push(Span::styled(
            " DEMO ",
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        ));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn chat_line(line: &ChatLine) -> Line<'static> {
    let (who, color) = match line.from {
        Speaker::User => ("You", Color::Cyan),
        Speaker::Assistant => ("AI", Color::Green),
    };
    Line::from(vec![
        Span::styled(format!("  {who}: "), Style::default().fg(color).bold()),
        Span::raw(line.text.clone()),
    ])
}

fn render_chat_dialog(f: &mut Frame, app: &App, input: &str) {
    let area = centered_rect(60, 60, f.area());
    f.render_widget(Clear, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(area);

    let mut lines: Vec<Line> = vec![Line::from("")];
    if app.chat.is_empty() {
        lines.push(
            Line::from("  Ask about your portfolio or the markets.")
                .style(Style::default().fg(Color::DarkGray)),
        );
    }
    lines.extend(app.chat.iter().map(chat_line));
    if let Some(waiting) = &app.waiting {
        lines.push(Line::from(format!("  {waiting}")).style(Style::default().fg(Color::DarkGray)));
    }

    // Keep the newest messages in view
    let visible = chunks[0].height.saturating_sub(2) as usize;
    let scroll = lines.len().saturating_sub(visible) as u16;

    let history = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Assistant ")
                .border_style(Style::default().fg(Color::Green)),
        )
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    f.render_widget(history, chunks[0]);

    let prompt = Paragraph::new(Line::from(vec![
        Span::raw("  > "),
        Span::styled(format!("{input}█"), Style::default().fg(Color::Yellow)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Enter=Send, Esc=Close ")
            .border_style(Style::default().fg(Color::Green)),
    );
    f.render_widget(prompt, chunks[1]);
}

fn render_forecast_dialog(f: &mut Frame, app: &App, form: &ForecastForm) {
    let area = centered_rect(50, 40, f.area());
    f.render_widget(Clear, area);

    let prompts = ["Ticker:", "Days:", "Currency:"];
    let values = [&form.ticker, &form.days, &form.currency];

    let mut lines: Vec<Line> = vec![Line::from("")];
    for (i, (prompt, value)) in prompts.iter().zip(values.iter()).enumerate() {
        let style = if i == form.step {
            Style::default().fg(Color::Yellow).bold()
        } else {
            Style::default().fg(Color::Green)
        };
        let cursor = if i == form.step { "█" } else { "" };
        lines.push(Line::from(vec![
            Span::styled(format!("  {prompt:<10}"), style),
            Span::styled(format!("{value}{cursor}"), style),
        ]));
    }

    lines.push(Line::from(""));
    if let Some(waiting) = &app.waiting {
        lines.push(Line::from(format!("  {waiting}")).style(Style::default().fg(Color::Cyan)));
    } else if let Some(hint) = App::forecast_hint(form) {
        lines.push(Line::from(format!("  {hint}")).style(Style::default().fg(Color::DarkGray)));
    }
    lines.push(
        Line::from("  Enter=Next/Submit, Tab=Field, Esc=Cancel")
            .style(Style::default().fg(Color::DarkGray)),
    );

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Price Forecast ")
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(paragraph, area);
}

/// Direction of a forecast: average of the first three closes against the
/// last three.
pub fn forecast_trend(closes: &[f64]) -> (&'static str, Color) {
    if closes.len() < 2 {
        return ("→", Color::Gray);
    }
    let window = (closes.len() / 2).min(3);
    let first_avg = closes.iter().take(window).sum::<f64>() / window as f64;
    let last_avg = closes.iter().rev().take(window).sum::<f64>() / window as f64;
    if first_avg == 0.0 {
        return ("→", Color::Gray);
    }
    let change_pct = (last_avg - first_avg) / first_avg * 100.0;

    if change_pct > 1.0 {
        ("⬆", Color::Green)
    } else if change_pct < -1.0 {
        ("⬇", Color::Red)
    } else {
        ("→", Color::Gray)
    }
}

fn render_forecast_view(f: &mut Frame, forecast: &Forecast) {
    let area = centered_rect(80, 75, f.area());
    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} Forecast ", forecast.ticker))
        .border_style(Style::default().fg(Color::Cyan));
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),                                // Summary
            Constraint::Min(8),                                   // Chart
            Constraint::Length(FORECAST_TABLE_ROWS as u16 + 1),   // Table
            Constraint::Length(1),                                // Footer
        ])
        .margin(1)
        .split(area);

    let closes: Vec<f64> = forecast.candles.iter().map(|c| c.close).collect();
    let (Some(first), Some(last)) = (forecast.candles.first(), forecast.candles.last()) else {
        let empty = Paragraph::new("  No forecast data returned")
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(empty, chunks[1]);
        return;
    };

    let (trend, trend_color) = forecast_trend(&closes);
    let high = forecast.candles.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
    let low = forecast.candles.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
    let summary = Line::from(vec![
        Span::raw(format!("  {} → {}  |  ", first.date, last.date)),
        Span::styled(format!("Trend {trend}"), Style::default().fg(trend_color).bold()),
        Span::raw("  |  "),
        Span::styled(format!("High: {high:.2}"), Style::default().fg(Color::Green)),
        Span::raw("  |  "),
        Span::styled(format!("Low: {low:.2}"), Style::default().fg(Color::Red)),
    ]);
    f.render_widget(Paragraph::new(summary), chunks[0]);

    let data: Vec<(f64, f64)> = closes
        .iter()
        .enumerate()
        .map(|(i, &p)| (i as f64, p))
        .collect();
    let min_y = closes.iter().cloned().fold(f64::INFINITY, f64::min) * 0.98;
    let max_y = closes.iter().cloned().fold(f64::NEG_INFINITY, f64::max) * 1.02;
    let max_x = (closes.len().saturating_sub(1)).max(1) as f64;

    let datasets = vec![Dataset::default()
        .name("Close")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&data)];

    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title(" Forecast Close "))
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, max_x])
                .labels(vec![Span::raw(first.date.clone()), Span::raw(last.date.clone())]),
        )
        .y_axis(
            Axis::default()
                .title("Price")
                .style(Style::default().fg(Color::Gray))
                .bounds([min_y, max_y])
                .labels(vec![
                    Span::raw(format!("{min_y:.1}")),
                    Span::raw(format!("{max_y:.1}")),
                ]),
        );
    f.render_widget(chart, chunks[1]);

    let header = Row::new(["Date", "Open", "High", "Low", "Close"])
        .style(Style::default().fg(Color::Yellow).bold());
    let skip = forecast.candles.len().saturating_sub(FORECAST_TABLE_ROWS);
    let rows: Vec<Row> = forecast
        .candles
        .iter()
        .skip(skip)
        .map(|c| {
            Row::new(vec![
                Cell::from(c.date.clone()),
                Cell::from(format!("{:.2}", c.open)),
                Cell::from(format!("{:.2}", c.high)),
                Cell::from(format!("{:.2}", c.low)),
                Cell::from(format!("{:.2}", c.close)),
            ])
        })
        .collect();
    let widths = [
        Constraint::Length(12),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(10),
    ];
    f.render_widget(Table::new(rows, widths).header(header), chunks[2]);

    let footer = Paragraph::new("  Esc/Enter=Close, f=New forecast")
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(footer, chunks[3]);
}

fn render_sentiment_dialog(f: &mut Frame, app: &App, input: &str) {
    let area = centered_rect(50, 30, f.area());
    f.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Ticker: ", Style::default().fg(Color::Yellow).bold()),
            Span::styled(format!("{input}█"), Style::default().fg(Color::Yellow)),
        ]),
        Line::from(""),
    ];
    if let Some(waiting) = &app.waiting {
        lines.push(Line::from(format!("  {waiting}")).style(Style::default().fg(Color::Cyan)));
    }
    lines.push(
        Line::from("  Enter=Analyze, Esc=Cancel").style(Style::default().fg(Color::DarkGray)),
    );

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" News Sentiment ")
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(paragraph, area);
}

fn sentiment_color(label: &str) -> Color {
    match label.to_ascii_lowercase().as_str() {
        "positive" => Color::Green,
        "negative" => Color::Red,
        _ => Color::Gray,
    }
}

/// Body of the sentiment report dialog.
pub fn sentiment_lines(report: &SentimentReport) -> Vec<Line<'static>> {
    let counts = &report.counts;
    let suggestion = &report.suggestion;
    let mix = &suggestion.allocation;

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(
                format!("  Positive: {}", counts.positive),
                Style::default().fg(Color::Green),
            ),
            Span::raw(" | "),
            Span::styled(
                format!("Neutral: {}", counts.neutral),
                Style::default().fg(Color::Gray),
            ),
            Span::raw(" | "),
            Span::styled(
                format!("Negative: {}", counts.negative),
                Style::default().fg(Color::Red),
            ),
        ]),
        Line::from(vec![
            Span::raw("  Average score: "),
            Span::styled(format!("{:.2}", report.average_score), Style::default().bold()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::raw("  Allocation suggestion: "),
            Span::styled(suggestion.strategy.clone(), Style::default().fg(Color::Yellow).bold()),
        ]),
        Line::from(format!(
            "    Stocks {}% | Bonds {}% | Cash {}%",
            mix.stocks, mix.bonds, mix.cash
        )),
    ];
    if !suggestion.description.is_empty() {
        lines.push(
            Line::from(format!("    {}", suggestion.description))
                .style(Style::default().add_modifier(Modifier::ITALIC)),
        );
    }

    lines.push(Line::from(""));
    lines.push(Line::from("  Sample headlines:").style(Style::default().bold()));
    for (headline, text) in report.headlines.iter().zip(report.headline_lines()) {
        lines.push(
            Line::from(format!("  {text}")).style(Style::default().fg(sentiment_color(&headline.label))),
        );
    }
    lines
}

fn render_sentiment_view(f: &mut Frame, report: &SentimentReport) {
    let area = centered_rect(70, 60, f.area());
    f.render_widget(Clear, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(1)])
        .margin(1)
        .split(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} Sentiment ", report.ticker))
        .border_style(Style::default().fg(Color::Cyan));
    f.render_widget(block, area);

    let body = Paragraph::new(sentiment_lines(report)).wrap(Wrap { trim: false });
    f.render_widget(body, chunks[0]);

    let footer = Paragraph::new("  Esc/Enter=Close, s=Another ticker")
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(footer, chunks[1]);
}

/// Change across the whole history, in dollars and percent of the first value.
pub fn history_change(points: &[PerformancePoint]) -> Option<(f64, f64)> {
    let (first, last) = (points.first()?, points.last()?);
    let change = last.total_value - first.total_value;
    let percent = if first.total_value == 0.0 {
        0.0
    } else {
        change / first.total_value * 100.0
    };
    Some((change, percent))
}

fn render_history_view(f: &mut Frame, app: &App, points: Option<&[PerformancePoint]>) {
    let area = centered_rect(80, 70, f.area());
    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Portfolio Performance ")
        .border_style(Style::default().fg(Color::Cyan));
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Summary
            Constraint::Min(8),    // Chart
            Constraint::Length(1), // Footer
        ])
        .margin(1)
        .split(area);

    let footer = Paragraph::new("  Esc/Enter=Close").style(Style::default().fg(Color::DarkGray));
    f.render_widget(footer, chunks[2]);

    let (Some(points), Some((change, percent))) = (points, points.and_then(history_change)) else {
        let text = app.waiting.as_deref().unwrap_or("Loading…");
        let pending = Paragraph::new(format!("  {text}")).style(Style::default().fg(Color::DarkGray));
        f.render_widget(pending, chunks[1]);
        return;
    };
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return;
    };

    let color = if change >= 0.0 { Color::Green } else { Color::Red };
    let sign = if change >= 0.0 { '+' } else { '-' };
    let summary = Line::from(vec![
        Span::raw(format!("  {} → {}  |  ", first.date, last.date)),
        Span::styled(
            format!(
                "Change: {} ({sign}{:.2}%)",
                views::format_signed_money(change),
                percent.abs()
            ),
            Style::default().fg(color).bold(),
        ),
    ]);
    f.render_widget(Paragraph::new(summary), chunks[0]);

    let data: Vec<(f64, f64)> = points
        .iter()
        .enumerate()
        .map(|(i, p)| (i as f64, p.total_value))
        .collect();
    let min_y = points.iter().map(|p| p.total_value).fold(f64::INFINITY, f64::min) * 0.98;
    let max_y = points.iter().map(|p| p.total_value).fold(f64::NEG_INFINITY, f64::max) * 1.02;
    let max_x = (points.len().saturating_sub(1)).max(1) as f64;

    let datasets = vec![Dataset::default()
        .name("Total value")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(&data)];

    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title(" Total Value "))
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, max_x])
                .labels(vec![Span::raw(first.date.clone()), Span::raw(last.date.clone())]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([min_y, max_y])
                .labels(vec![
                    Span::raw(views::format_money(min_y)),
                    Span::raw(views::format_money(max_y)),
                ]),
        );
    f.render_widget(chart, chunks[1]);
}

fn render_login_dialog(f: &mut Frame, app: &App, form: &LoginForm) {
    let area = centered_rect(40, 30, f.area());
    f.render_widget(Clear, area);

    let field_style = |step: usize| {
        if form.step == step {
            Style::default().fg(Color::Yellow).bold()
        } else {
            Style::default().fg(Color::Green)
        }
    };
    let cursor = |step: usize| if form.step == step { "█" } else { "" };
    let masked = "*".repeat(form.password.chars().count());

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Username: ", field_style(0)),
            Span::styled(format!("{}{}", form.username, cursor(0)), field_style(0)),
        ]),
        Line::from(vec![
            Span::styled("  Password: ", field_style(1)),
            Span::styled(format!("{masked}{}", cursor(1)), field_style(1)),
        ]),
        Line::from(""),
    ];
    if let Some(waiting) = &app.waiting {
        lines.push(Line::from(format!("  {waiting}")).style(Style::default().fg(Color::Cyan)));
    }
    lines.push(
        Line::from("  Enter=Next/Sign in, Esc=Cancel").style(Style::default().fg(Color::DarkGray)),
    );

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Sign In ")
            .border_style(Style::default().fg(Color::Magenta)),
    );
    f.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
