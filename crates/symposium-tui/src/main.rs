use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use symposium_core::{ChatController, Config, HttpCompletionClient};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let config = Config::load().unwrap_or_else(|_| Config::new());
    tracing::debug!(backend = config.backend_url(), "starting assistant");
    let client = Arc::new(HttpCompletionClient::new(config.backend_url()));

    let (turn_tx, mut turn_rx) = mpsc::unbounded_channel();
    let controller = ChatController::new(client, config.turn_timeout(), turn_tx);
    let mut app = App::new(controller);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        tokio::select! {
            maybe_event = events.next() => {
                match maybe_event {
                    Some(event) => handler::handle_event(&mut app, event),
                    None => break,
                }
            }
            Some(event) = turn_rx.recv() => {
                app.on_turn_event(event);
            }
        }
    }

    tui::restore()?;
    Ok(())
}

/// Log to a file so the alternate screen stays clean. Filtering comes from
/// RUST_LOG as usual.
fn init_logging() -> Result<()> {
    let Some(dir) = dirs::data_local_dir() else {
        return Ok(());
    };
    let dir = dir.join("symposium");
    std::fs::create_dir_all(&dir)?;
    let file = std::fs::File::create(dir.join("symposium.log"))?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
        .try_init();
    Ok(())
}
