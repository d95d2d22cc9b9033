use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info};

use portfolio_dash::app::{handle_input, Action, App};
use portfolio_dash::client::FetchClient;
use portfolio_dash::config::Config;
use portfolio_dash::logging::init_logging;
use portfolio_dash::source::{DataSource, DemoSource};
use portfolio_dash::ui::ui;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

fn main() -> Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    init_logging(&config.log)?;
    info!(
        base_url = %config.api.base_url,
        demo = config.demo,
        auth_required = config.auth.required,
        "Starting portfolio-dash"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("portfolio-sync")
        .build()
        .context("failed to start async runtime")?;

    let client = Arc::new(FetchClient::new(&config.api.base_url, config.timeout())?);
    let source: Arc<dyn DataSource> = if config.demo {
        Arc::new(DemoSource::new()) as Arc<dyn DataSource>
    } else {
        Arc::clone(&client) as Arc<dyn DataSource>
    };

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(&config, source, client, runtime.handle().clone());
    let res = run_app(&mut terminal, &mut app);
    app.shutdown();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    drop(app);
    runtime.shutdown_timeout(Duration::from_secs(1));

    if let Err(err) = res {
        error!(error = ?err, "Dashboard exited with an error");
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        // Pull in auth changes, series updates and dialog replies (non-blocking)
        app.tick();

        terminal.draw(|f| ui(f, app))?;

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }

        let action = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    Action::Quit
                } else {
                    handle_input(app, key.code)
                }
            }
            _ => Action::None,
        };

        match action {
            Action::Quit => return Ok(()),
            Action::Refresh => app.refresh_now(),
            Action::SendChat(message) => app.send_chat(message),
            Action::RequestForecast(request) => app.request_forecast(request),
            Action::AnalyzeSentiment(ticker) => app.analyze_sentiment(ticker),
            Action::LoadHistory => app.load_history(),
            Action::Login { username, password } => app.login(username, password),
            Action::SignOut => app.sign_out(),
            Action::None => {}
        }
    }
}
