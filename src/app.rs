//! Dashboard state driven by the terminal loop.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use crossterm::event::KeyCode;
use tokio::runtime::Handle;
use tokio::sync::{mpsc as tokio_mpsc, watch};
use tracing::{debug, info, warn};

use crate::client::FetchClient;
use crate::config::Config;
use crate::error::FetchResult;
use crate::model::{ChatReply, Forecast, ForecastRequest, PerformancePoint, SentimentReport};
use crate::render::RenderDispatcher;
use crate::scheduler::{Scheduler, SyncEvent};
use crate::session::{auth_channel, AuthEvent, Session};
use crate::source::DataSource;
use crate::store::{self, DataStore, SharedStore};
use crate::views;

/// How long a notice stays on screen.
pub const NOTICE_TTL: Duration = Duration::from_secs(5);

const DEFAULT_FORECAST_DAYS: &str = "7";
const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    pub level: NoticeLevel,
    posted: Instant,
}

/// Short-lived status messages, newest last.
#[derive(Debug)]
pub struct Notices {
    items: VecDeque<Notice>,
    ttl: Duration,
}

impl Default for Notices {
    fn default() -> Self {
        Self::new(NOTICE_TTL)
    }
}

impl Notices {
    pub fn new(ttl: Duration) -> Self {
        Self {
            items: VecDeque::new(),
            ttl,
        }
    }

    pub fn push(&mut self, level: NoticeLevel, text: impl Into<String>) {
        self.push_at(level, text, Instant::now());
    }

    pub fn push_at(&mut self, level: NoticeLevel, text: impl Into<String>, now: Instant) {
        self.items.push_back(Notice {
            text: text.into(),
            level,
            posted: now,
        });
    }

    /// Drop every notice older than the time-to-live.
    pub fn expire(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.items
            .retain(|n| now.saturating_duration_since(n.posted) < ttl);
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.items.back()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Team,
    News,
}

impl Tab {
    pub fn toggle(self) -> Self {
        match self {
            Self::Team => Self::News,
            Self::News => Self::Team,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    pub from: Speaker,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastForm {
    pub step: usize,
    pub ticker: String,
    pub days: String,
    pub currency: String,
}

impl Default for ForecastForm {
    fn default() -> Self {
        Self {
            step: 0,
            ticker: String::new(),
            days: DEFAULT_FORECAST_DAYS.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

impl ForecastForm {
    pub const FIELDS: usize = 3;

    fn field_mut(&mut self) -> &mut String {
        match self.step {
            0 => &mut self.ticker,
            1 => &mut self.days,
            _ => &mut self.currency,
        }
    }

    /// Validated request, or the reason the form is not ready.
    pub fn request(&self) -> Result<ForecastRequest, String> {
        let ticker = self.ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err("Enter a ticker symbol".into());
        }
        let days = match self.days.trim().parse::<u32>() {
            Ok(d) if d >= 1 => d,
            _ => return Err("Days must be a whole number of at least 1".into()),
        };
        let currency = match self.currency.trim() {
            "" => DEFAULT_CURRENCY.to_string(),
            c => c.to_uppercase(),
        };
        Ok(ForecastRequest {
            ticker,
            days,
            currency,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub step: usize,
    pub username: String,
    pub password: String,
}

#[derive(Debug)]
pub enum InputMode {
    Normal,
    Chat(String),
    Forecast(ForecastForm),
    ForecastView(Forecast),
    /// Ticker being typed for sentiment analysis
    Sentiment(String),
    SentimentView(SentimentReport),
    /// Performance chart; `None` until the history arrives
    History(Option<Vec<PerformancePoint>>),
    Login(LoginForm),
}

#[derive(Debug, PartialEq)]
pub enum Action {
    None,
    Quit,
    Refresh,
    SendChat(String),
    RequestForecast(ForecastRequest),
    AnalyzeSentiment(String),
    LoadHistory,
    Login { username: String, password: String },
    SignOut,
}

/// Result of a one-off request made from a dialog.
#[derive(Debug)]
enum Reply {
    Chat(FetchResult<ChatReply>),
    Forecast(FetchResult<Forecast>),
    Sentiment(FetchResult<SentimentReport>),
    History(FetchResult<Vec<PerformancePoint>>),
    Login {
        user: String,
        result: FetchResult<String>,
    },
}

pub struct App {
    pub store: SharedStore,
    pub dispatcher: RenderDispatcher,
    pub notices: Notices,
    pub input_mode: InputMode,
    pub tab: Tab,
    pub chat: Vec<ChatLine>,
    /// Set while a dialog request is in flight
    pub waiting: Option<String>,
    pub last_sync: Option<DateTime<Local>>,
    pub demo: bool,
    session: Session,
    auth: watch::Sender<AuthEvent>,
    client: Arc<FetchClient>,
    runtime: Handle,
    sync_events: tokio_mpsc::UnboundedReceiver<SyncEvent>,
    reply_sender: Sender<Reply>,
    reply_receiver: Receiver<Reply>,
}

impl App {
    pub fn new(
        config: &Config,
        source: Arc<dyn DataSource>,
        client: Arc<FetchClient>,
        runtime: Handle,
    ) -> Self {
        let store = DataStore::shared();
        let (events_tx, sync_events) = tokio_mpsc::unbounded_channel();
        let scheduler = Scheduler::new(
            source,
            Arc::clone(&store),
            config.refresh.clone(),
            events_tx,
            runtime.clone(),
        );
        let (auth, auth_rx) = auth_channel();
        let session = Session::new(auth_rx, scheduler, Arc::clone(&client), Arc::clone(&store));
        let (reply_sender, reply_receiver) = mpsc::channel();

        let mut app = Self {
            store,
            dispatcher: views::dashboard_dispatcher(),
            notices: Notices::default(),
            input_mode: InputMode::Normal,
            tab: Tab::Team,
            chat: Vec::new(),
            waiting: None,
            last_sync: None,
            demo: config.demo,
            session,
            auth,
            client,
            runtime,
            sync_events,
            reply_sender,
            reply_receiver,
        };
        app.render_everything();

        if !config.auth.required {
            app.sign_in_guest();
        }
        app
    }

    pub fn user(&self) -> Option<&str> {
        self.session.user()
    }

    pub fn is_syncing(&self) -> bool {
        self.session.scheduler().is_running()
    }

    fn render_everything(&mut self) {
        let store = store::read(&self.store);
        self.dispatcher.render_everything(&store);
    }

    pub fn sign_in_guest(&mut self) {
        self.auth.send_replace(AuthEvent::SignedIn {
            user: "guest".into(),
            token: None,
        });
    }

    pub fn sign_out(&mut self) {
        self.auth.send_replace(AuthEvent::SignedOut);
    }

    /// One pass of background bookkeeping. Returns true if anything changed.
    pub fn tick(&mut self) -> bool {
        let mut changed = self.process_auth();
        changed |= self.process_sync_events();
        changed |= self.process_replies();
        self.notices.expire(Instant::now());
        changed
    }

    fn process_auth(&mut self) -> bool {
        let Some(event) = self.session.poll() else {
            return false;
        };
        match event {
            AuthEvent::SignedIn { user, .. } => {
                self.notices
                    .push(NoticeLevel::Info, format!("Signed in as {user}"));
            }
            AuthEvent::SignedOut => {
                self.discard_sync_events();
                self.last_sync = None;
                self.notices.push(NoticeLevel::Info, "Signed out");
                // The store was reset; every panel is out of date
                self.render_everything();
            }
        }
        true
    }

    /// Drop events queued by a scheduler that has since been stopped.
    fn discard_sync_events(&mut self) {
        let mut dropped = 0;
        while self.sync_events.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            debug!(dropped, "Discarded sync events from a stopped session");
        }
    }

    /// Re-render the panels bound to each series that changed.
    pub fn process_sync_events(&mut self) -> bool {
        // A task may report after the drain on sign-out; nothing it says
        // applies once the store was reset
        if !self.is_syncing() {
            self.discard_sync_events();
            return false;
        }

        let mut updated = false;

        while let Ok(event) = self.sync_events.try_recv() {
            let series = event.series();
            {
                let store = store::read(&self.store);
                self.dispatcher.render_all(series, &store);
            }
            match event {
                SyncEvent::Updated(_) => {
                    self.last_sync = Some(Local::now());
                }
                SyncEvent::FellBack { error, .. } => {
                    self.notices.push(
                        NoticeLevel::Warning,
                        format!("Could not load {series} ({error}); showing fallback data"),
                    );
                }
                SyncEvent::RefreshFailed { error, .. } => {
                    self.notices.push(
                        NoticeLevel::Warning,
                        format!("{series} refresh failed: {error}"),
                    );
                }
            }
            updated = true;
        }

        updated
    }

    fn process_replies(&mut self) -> bool {
        let mut updated = false;

        while let Ok(reply) = self.reply_receiver.try_recv() {
            self.waiting = None;
            match reply {
                Reply::Chat(Ok(reply)) => self.chat.push(ChatLine {
                    from: Speaker::Assistant,
                    text: reply.response,
                }),
                Reply::Chat(Err(e)) => {
                    warn!(error = %e, "Chat request failed");
                    self.chat.push(ChatLine {
                        from: Speaker::Assistant,
                        text: "Sorry, I encountered an error. Please try again later.".into(),
                    });
                }
                Reply::Forecast(Ok(forecast)) => {
                    info!(ticker = %forecast.ticker, candles = forecast.candles.len(), "Forecast received");
                    if matches!(self.input_mode, InputMode::Forecast(_)) {
                        self.input_mode = InputMode::ForecastView(forecast);
                    }
                }
                Reply::Forecast(Err(e)) => {
                    warn!(error = %e, "Forecast request failed");
                    self.notices
                        .push(NoticeLevel::Error, format!("Forecast failed: {e}"));
                }
                Reply::Sentiment(Ok(report)) => {
                    info!(ticker = %report.ticker, headlines = report.headlines.len(), "Sentiment received");
                    if matches!(self.input_mode, InputMode::Sentiment(_)) {
                        self.input_mode = InputMode::SentimentView(report);
                    }
                }
                Reply::Sentiment(Err(e)) => {
                    warn!(error = %e, "Sentiment request failed");
                    self.notices
                        .push(NoticeLevel::Error, format!("Sentiment analysis failed: {e}"));
                }
                Reply::History(Ok(points)) => {
                    info!(points = points.len(), "Performance history received");
                    if matches!(self.input_mode, InputMode::History(_)) {
                        self.input_mode = InputMode::History(Some(points));
                    }
                }
                Reply::History(Err(e)) => {
                    warn!(error = %e, "History request failed");
                    self.notices
                        .push(NoticeLevel::Error, format!("Performance history failed: {e}"));
                    if matches!(self.input_mode, InputMode::History(None)) {
                        self.input_mode = InputMode::Normal;
                    }
                }
                Reply::Login { user, result } => match result {
                    Ok(token) => {
                        self.auth.send_replace(AuthEvent::SignedIn {
                            user,
                            token: Some(token),
                        });
                        if matches!(self.input_mode, InputMode::Login(_)) {
                            self.input_mode = InputMode::Normal;
                        }
                    }
                    Err(e) => {
                        warn!(%user, error = %e, "Login failed");
                        self.notices
                            .push(NoticeLevel::Error, format!("Login failed: {e}"));
                    }
                },
            }
            updated = true;
        }

        updated
    }

    pub fn refresh_now(&mut self) {
        if self.is_syncing() {
            self.session.scheduler().refresh_now();
            self.notices.push(NoticeLevel::Info, "Refreshing…");
        } else {
            self.notices
                .push(NoticeLevel::Warning, "Sign in to load live data");
        }
    }

    pub fn send_chat(&mut self, message: String) {
        self.chat.push(ChatLine {
            from: Speaker::User,
            text: message.clone(),
        });
        self.waiting = Some("AI is thinking...".into());
        let client = Arc::clone(&self.client);
        let sender = self.reply_sender.clone();
        self.runtime.spawn(async move {
            let result = client.send_chat(&message).await;
            let _ = sender.send(Reply::Chat(result));
        });
    }

    pub fn request_forecast(&mut self, request: ForecastRequest) {
        self.waiting = Some("Generating forecast...".into());
        let client = Arc::clone(&self.client);
        let sender = self.reply_sender.clone();
        self.runtime.spawn(async move {
            let result = client.request_forecast(&request).await;
            let _ = sender.send(Reply::Forecast(result));
        });
    }

    pub fn analyze_sentiment(&mut self, ticker: String) {
        self.waiting = Some(format!("Analyzing sentiment for {ticker}..."));
        let client = Arc::clone(&self.client);
        let sender = self.reply_sender.clone();
        self.runtime.spawn(async move {
            let result = client.sentiment(&ticker).await;
            let _ = sender.send(Reply::Sentiment(result));
        });
    }

    pub fn load_history(&mut self) {
        self.waiting = Some("Loading performance history...".into());
        let client = Arc::clone(&self.client);
        let sender = self.reply_sender.clone();
        self.runtime.spawn(async move {
            let result = client.portfolio_history().await;
            let _ = sender.send(Reply::History(result));
        });
    }

    pub fn login(&mut self, username: String, password: String) {
        self.waiting = Some("Signing in...".into());
        let client = Arc::clone(&self.client);
        let sender = self.reply_sender.clone();
        self.runtime.spawn(async move {
            let result = client.login(&username, &password).await;
            let _ = sender.send(Reply::Login {
                user: username,
                result,
            });
        });
    }

    /// Stop syncing before the terminal is torn down.
    pub fn shutdown(&mut self) {
        self.session.shutdown();
    }

    /// Status of the forecast form, shown under its fields.
    pub fn forecast_hint(form: &ForecastForm) -> Option<String> {
        form.request().err()
    }
}

pub fn handle_input(app: &mut App, key: KeyCode) -> Action {
    let signed_in = app.user().is_some();
    match &mut app.input_mode {
        InputMode::Normal => match key {
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Char('r') => Action::Refresh,
            KeyCode::Char('t') | KeyCode::Tab => {
                app.tab = app.tab.toggle();
                Action::None
            }
            KeyCode::Char('c') => {
                app.input_mode = InputMode::Chat(String::new());
                Action::None
            }
            KeyCode::Char('f') => {
                app.input_mode = InputMode::Forecast(ForecastForm::default());
                Action::None
            }
            KeyCode::Char('s') => {
                app.input_mode = InputMode::Sentiment(String::new());
                Action::None
            }
            KeyCode::Char('h') => {
                app.input_mode = InputMode::History(None);
                if app.waiting.is_some() {
                    return Action::None;
                }
                Action::LoadHistory
            }
            KeyCode::Char('l') if !signed_in => {
                app.input_mode = InputMode::Login(LoginForm::default());
                Action::None
            }
            KeyCode::Char('o') if signed_in => Action::SignOut,
            _ => Action::None,
        },
        InputMode::Chat(input) => match key {
            KeyCode::Esc => {
                app.input_mode = InputMode::Normal;
                Action::None
            }
            KeyCode::Enter => {
                let message = input.trim().to_string();
                if message.is_empty() || app.waiting.is_some() {
                    return Action::None;
                }
                input.clear();
                Action::SendChat(message)
            }
            KeyCode::Backspace => {
                input.pop();
                Action::None
            }
            KeyCode::Char(c) => {
                input.push(c);
                Action::None
            }
            _ => Action::None,
        },
        InputMode::Forecast(form) => match key {
            KeyCode::Esc => {
                app.input_mode = InputMode::Normal;
                Action::None
            }
            KeyCode::Tab | KeyCode::Down => {
                form.step = (form.step + 1) % ForecastForm::FIELDS;
                Action::None
            }
            KeyCode::Up => {
                form.step = (form.step + ForecastForm::FIELDS - 1) % ForecastForm::FIELDS;
                Action::None
            }
            KeyCode::Enter if form.step + 1 < ForecastForm::FIELDS => {
                form.step += 1;
                Action::None
            }
            KeyCode::Enter => match form.request() {
                Ok(request) if app.waiting.is_none() => Action::RequestForecast(request),
                _ => Action::None,
            },
            KeyCode::Backspace => {
                form.field_mut().pop();
                Action::None
            }
            KeyCode::Char(c) => {
                form.field_mut().push(c);
                Action::None
            }
            _ => Action::None,
        },
        InputMode::ForecastView(_) => match key {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => {
                app.input_mode = InputMode::Normal;
                Action::None
            }
            KeyCode::Char('f') => {
                app.input_mode = InputMode::Forecast(ForecastForm::default());
                Action::None
            }
            _ => Action::None,
        },
        InputMode::Sentiment(input) => match key {
            KeyCode::Esc => {
                app.input_mode = InputMode::Normal;
                Action::None
            }
            KeyCode::Enter => {
                let ticker = input.trim().to_uppercase();
                if ticker.is_empty() || app.waiting.is_some() {
                    return Action::None;
                }
                Action::AnalyzeSentiment(ticker)
            }
            KeyCode::Backspace => {
                input.pop();
                Action::None
            }
            KeyCode::Char(c) => {
                input.push(c);
                Action::None
            }
            _ => Action::None,
        },
        InputMode::SentimentView(_) => match key {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => {
                app.input_mode = InputMode::Normal;
                Action::None
            }
            KeyCode::Char('s') => {
                app.input_mode = InputMode::Sentiment(String::new());
                Action::None
            }
            _ => Action::None,
        },
        InputMode::History(_) => match key {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => {
                app.input_mode = InputMode::Normal;
                Action::None
            }
            _ => Action::None,
        },
        InputMode::Login(form) => match key {
            KeyCode::Esc => {
                app.input_mode = InputMode::Normal;
                Action::None
            }
            KeyCode::Tab => {
                form.step = (form.step + 1) % 2;
                Action::None
            }
            KeyCode::Enter if form.step == 0 => {
                form.step = 1;
                Action::None
            }
            KeyCode::Enter => {
                if form.username.trim().is_empty() || app.waiting.is_some() {
                    return Action::None;
                }
                Action::Login {
                    username: form.username.trim().to_string(),
                    password: form.password.clone(),
                }
            }
            KeyCode::Backspace => {
                if form.step == 0 {
                    form.username.pop();
                } else {
                    form.password.pop();
                }
                Action::None
            }
            KeyCode::Char(c) => {
                if form.step == 0 {
                    form.username.push(c);
                } else {
                    form.password.push(c);
                }
                Action::None
            }
            _ => Action::None,
        },
    }
}
