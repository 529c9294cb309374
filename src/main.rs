/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use config::{GameConfig, LayoutConfig, Rect};
use domain::coin::FairCoin;
use sim::save::SaveStore;
use sim::session::{GameSession, SessionData};
use ui::input::TerminalInput;
use ui::renderer::{Frame, Renderer};
use ui::surface::{Surface, Window};

const INPUT_PROMPT: &str = "> ";

fn main() {
    let config = GameConfig::load();

    if let Err(e) = init_logging(&config.log_file) {
        eprintln!("Logging disabled ({}): {e}", config.log_file.display());
    }
    config.log_source();
    info!(save_file = %config.save_file.display(), "starting");

    let store = SaveStore::new(&config.save_file);
    let mut session = match GameSession::new(config, store, Box::new(FairCoin::new())) {
        Ok(s) => s,
        Err(e) => {
            error!("{e}");
            eprintln!("Failed to load animations: {e}");
            std::process::exit(1);
        }
    };

    let mut renderer = Renderer::new(&session.config().layout);
    if let Err(e) = renderer.init() {
        error!("{e}");
        eprintln!("Terminal init failed: {e}");
        std::process::exit(1);
    }

    let result = game_loop(&mut session, &mut renderer);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        error!("{e}");
        eprintln!("Game error: {e}");
        std::process::exit(1);
    }
    info!("bye");
}

/// Log to a file; the terminal belongs to the game. `RUST_LOG` overrides
/// the default `debug` level.
fn init_logging(path: &Path) -> std::io::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let file = File::create(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn game_loop(session: &mut GameSession, renderer: &mut Renderer) -> Result<(), Box<dyn std::error::Error>> {
    let layout: LayoutConfig = session.config().layout.clone();
    let tick_rate = session.config().timing.tick_rate;

    let mut main_win = Window::new(layout.main_window);
    let mut balance_win = Window::new(layout.balance_window);
    let mut input_win = Window::new(layout.input_window);
    let input_room = input_win.interior().width.saturating_sub(INPUT_PROMPT.len() + 1);
    let mut input = TerminalInput::new(input_room);

    while session.is_running() {
        let started = Instant::now();
        input.drain_events();

        fit_balance_window(&mut balance_win, layout.balance_window, &session.data);
        session.tick(started, &mut main_win, &mut balance_win, &mut input);

        input_win.clear();
        input_win.write_line(0, 0, &format!("{INPUT_PROMPT}{}", input.buffer()));
        let inner = input_win.interior();
        let cursor = (inner.x + INPUT_PROMPT.len() + input.buffer().len(), inner.y);

        renderer.render(&Frame { windows: [&main_win, &balance_win, &input_win], cursor })?;
        std::thread::sleep(tick_rate.saturating_sub(started.elapsed()));
    }

    Ok(())
}

/// The balance panel grows a row while loans are on. Must run before the
/// session writes into it.
fn fit_balance_window(win: &mut Window, base: Rect, data: &SessionData) {
    win.resize(base.width, base.height.max(data.balance_panel_rows() + 2));
}
