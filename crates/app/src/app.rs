// Composition root: builds the store, backend, page and terminal and runs
// the main loop.

use anyhow::Result;
use crossterm::{
    event::{self, Event as TermEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use scoreday_core::domain::Event;
use scoreday_core::ports::ScoreStore;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::adapters::{JsonFileScoreStore, LocalBackend};
use crate::cli::CliArgs;
use crate::config::Config;
use crate::services::{PageCommand, PageService};
use crate::tui::{TuiMessage, TuiModel, TuiUpdate, TuiView};

pub struct ScoredayApp {
    page: PageService,
    tui_model: TuiModel,
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    /// Replies from the backend
    inbound_rx: mpsc::UnboundedReceiver<Event>,
    backend: JoinHandle<()>,
}

impl ScoredayApp {
    pub async fn new(cli_args: CliArgs) -> Result<Self> {
        info!("Initializing Scoreday");

        let config = Config::from_cli_and_file(&cli_args)?;
        let store_path = config.store_path()?;
        info!("Using score store {}", store_path.display());

        let store: Arc<dyn ScoreStore> = Arc::new(JsonFileScoreStore::with_path(store_path));

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let backend = LocalBackend::new(Arc::clone(&store), config.sheet.clone(), &config.backend)
            .spawn(outbound_rx, inbound_tx);

        let query = cli_args.query.as_deref().unwrap_or("");
        let page = PageService::new(config.sheet.clone(), store, outbound_tx, query)?;

        let mut tui_model = TuiModel::with_config(&config.ui);
        tui_model.sync(page.snapshot());

        let terminal = setup_terminal()?;

        Ok(Self {
            page,
            tui_model,
            terminal,
            inbound_rx,
            backend,
        })
    }

    pub async fn run(self) -> Result<()> {
        let ScoredayApp {
            mut page,
            mut tui_model,
            mut terminal,
            mut inbound_rx,
            backend,
        } = self;

        let result = run_main_loop(&mut page, &mut tui_model, &mut terminal, &mut inbound_rx).await;

        shutdown(&mut terminal)?;

        // Dropping the page closes the submission channel, which stops the backend
        drop(page);
        if let Err(e) = backend.await {
            error!("Backend task failed: {:?}", e);
        }

        result
    }
}

async fn run_main_loop(
    page: &mut PageService,
    tui_model: &mut TuiModel,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    inbound_rx: &mut mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    let mut last_render = Instant::now();
    let render_interval = Duration::from_millis(16);
    let mut needs_redraw = true;

    loop {
        let mut page_changed = false;
        while let Ok(event) = inbound_rx.try_recv() {
            info!("Received {} from backend", event.name());
            if let Err(e) = page.handle_inbound(event) {
                error!("Failed to apply backend event: {:#}", e);
                tui_model.add_error(format!("{:#}", e));
            }
            page_changed = true;
        }

        if event::poll(Duration::from_millis(10))? {
            if let TermEvent::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press {
                    let message = TuiUpdate::handle_key(tui_model, key_event.code, key_event.modifiers)?;

                    match message {
                        TuiMessage::Command(PageCommand::Quit) => {
                            tui_model.should_quit = true;
                        }
                        TuiMessage::Command(cmd) => {
                            info!("Executing {:?}", cmd);
                            if let Err(e) = page.execute(cmd) {
                                error!("Command failed: {:#}", e);
                                tui_model.add_error(format!("{:#}", e));
                            }
                            page_changed = true;
                        }
                        TuiMessage::None => {}
                    }

                    needs_redraw = true;
                }
            }
        }

        if page_changed {
            tui_model.sync(page.snapshot());
            needs_redraw = true;
        }

        if let Ok(size) = terminal.size() {
            TuiUpdate::handle_resize(tui_model, size.width, size.height)?;
        }

        if tui_model.should_quit {
            info!("Quit requested, exiting main loop");
            break;
        }

        if needs_redraw || last_render.elapsed() >= render_interval {
            terminal.draw(|frame| TuiView::render(tui_model, frame))?;
            last_render = Instant::now();
            needs_redraw = false;
        }

        // Let the backend task run
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let terminal = restore_on_error(
        || -> Result<_> {
            let mut stdout = io::stdout();
            execute!(stdout, EnterAlternateScreen)?;
            Ok(Terminal::new(CrosstermBackend::new(stdout))?)
        },
        restore_terminal,
    )?;
    Ok(terminal)
}

/// Run `setup` and call `restore` only if it fails, so a half-initialised
/// terminal is not left in raw mode
fn restore_on_error<T>(setup: impl FnOnce() -> Result<T>, restore: impl FnOnce()) -> Result<T> {
    let result = setup();
    if let Err(e) = &result {
        error!("Terminal setup failed: {:#}", e);
        restore();
    }
    result
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

fn shutdown(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    info!("Shutting down Scoreday");

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    Ok(())
}

pub async fn run(cli_args: CliArgs) -> Result<()> {
    let app = ScoredayApp::new(cli_args).await?;
    app.run().await?;

    info!("Scoreday shut down cleanly");
    Ok(())
}
