/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
///
/// The resolved `GameConfig` is built once at startup and handed to the
/// session by reference: prompts, modes, answer phrases, timings and the
/// screen layout all live here.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use crate::domain::mode::ModeTable;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub layout: LayoutConfig,
    pub save_file: PathBuf,
    pub animations_dir: PathBuf,
    pub log_file: PathBuf,
    pub prompts: Prompts,
    pub modes: ModeTable,
    pub positive_phrases: Vec<String>,
    pub negative_phrases: Vec<String>,
    /// Where the settings came from, for the log.
    pub source: ConfigSource,
}

/// Outcome of the config file search. Logging is not up while the file is
/// read, so this is kept and reported by `log_source` later.
#[derive(Clone, Debug, Default)]
pub struct ConfigSource {
    pub file: Option<PathBuf>,
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub tick_rate: Duration,
    pub animation_fps: u32,
    pub welcome_timeout: Duration,
    pub exit_delay: Duration,
}

/// A rectangle in terminal cells. For windows this is the outer size,
/// border included. For animations it is relative to the main window's
/// interior.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Rect {
    pub const fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Rect { x, y, width, height }
    }

    pub fn right(&self) -> usize {
        self.x + self.width
    }

    pub fn bottom(&self) -> usize {
        self.y + self.height
    }
}

#[derive(Clone, Debug)]
pub struct LayoutConfig {
    pub main_window: Rect,
    pub balance_window: Rect,
    pub input_window: Rect,
    pub coin_animation: Rect,
    pub idle_animation: Rect,
}

impl LayoutConfig {
    /// Smallest terminal (columns, rows) that fits every window.
    pub fn required_size(&self) -> (usize, usize) {
        // The balance panel grows by one row in loan mode.
        let balance_bottom = self.balance_window.bottom() + 1;
        let windows = [self.main_window, self.balance_window, self.input_window];
        let w = windows.iter().map(Rect::right).max().unwrap_or(0);
        let h = windows.iter().map(Rect::bottom).max().unwrap_or(0).max(balance_bottom);
        (w, h)
    }
}

/// Every line the game says to the player.
#[derive(Clone, Debug)]
pub struct Prompts {
    pub welcome: String,
    pub money_input: String,
    pub easy_mode_intro: String,
    pub moderate_mode_intro: String,
    pub hard_mode_intro: String,
    pub intense_mode_intro: String,
    pub poor_player_intro: String,
    pub rich_player_intro: String,
    pub invalid_input: String,
    pub ask_choice: String,
    pub lucky_winner: String,
    pub loss_message: String,
    pub retry_input: String,
    pub coin_flip: String,
    pub continue_game: String,
    pub how_much: String,
    pub leave_game: String,
    pub game_over: String,
    pub ask_loan_choice: String,
    pub loans_enabled: String,
    pub select_mode: String,
    pub mode_help_hint: String,
    pub mode_info: String,
    pub game_won: String,
}

impl Default for Prompts {
    fn default() -> Self {
        Prompts {
            welcome: "Welcome to Double or Nothing, this is a game of luck and self-control. I hope you are ready to restrain your animalistic instincts...".into(),
            money_input: "Now let's see how rich you are, how much money do you want to play with: (in $)".into(),
            easy_mode_intro: "Ohh you poor little coward. Anyway let's get tossin the coins!".into(),
            moderate_mode_intro: "Okay, we're playing it safe. Anyway let's get tossin the coins!".into(),
            hard_mode_intro: "It's gonna be a challenge, be ready my boy. Anyway let's get tossin the coins!".into(),
            intense_mode_intro: "INTENSE is no joke my boy, but it's your choice. Anyway let's get tossin the coins!".into(),
            poor_player_intro: "Not much of a bankroll, huh? Every legend starts somewhere. Let's get tossin the coins!".into(),
            rich_player_intro: "Look at the big spender over here! Let's see how long that fortune lasts.".into(),
            invalid_input: "You can't trick me you little prick.".into(),
            ask_choice: "Heads or tails son: [H/T]".into(),
            lucky_winner: "You lucky little son of a gun. Promise is promise I am doubling your money now.".into(),
            loss_message: "Ops, looks like somebody has lost the bet.".into(),
            retry_input: "I didn't understand that. Please type yes/y or no/n.".into(),
            coin_flip: "Oki Doki time for flippin!".into(),
            continue_game: "Welcome back sir, let's continue playing shall we!".into(),
            how_much: "How much money do you want to double or nothing with?".into(),
            leave_game: "Leaving the game with a current balance of ${balance}, this amount will automatically be saved for your next game.".into(),
            game_over: "Unfortunately the saga ends here my guy, come again when you have money.".into(),
            ask_loan_choice: "Looks like someone's broooke, would you like to continue on playing with loans or leave with your honor?".into(),
            loans_enabled: "Ho hooo, we have a real gambling addict over here. Let's continue tossing 'em coins then!".into(),
            select_mode: "What mode do you want to play in? [Easy, Moderate, Hard, Intense]".into(),
            mode_help_hint: "Write 'help' if you want additional information about the modes.".into(),
            mode_info: "{name}: Initial Balance = {initialBalance}, Goal Money = {goalMoney}".into(),
            game_won: "Holy moly, that was a good run, you have completed the {mode} level. I am proud of you son. Hope to see you again one time!".into(),
        }
    }
}

/// Fill `{key}` placeholders in a prompt template.
pub fn fill(template: &str, values: &[(&str, String)]) -> String {
    let mut out = template.to_string();
    for (key, value) in values {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    out
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    layout: TomlLayout,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_save_file")]
    save_file: String,
    #[serde(default = "default_animations_dir")]
    animations_dir: String,
    #[serde(default = "default_log_file")]
    log_file: String,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_animation_fps")]
    animation_fps: u32,
    #[serde(default = "default_welcome_secs")]
    welcome_secs: f64,
    #[serde(default = "default_exit_secs")]
    exit_secs: f64,
}

#[derive(Deserialize, Debug)]
struct TomlLayout {
    #[serde(default = "default_main_window")]
    main_window: Rect,
    #[serde(default = "default_balance_window")]
    balance_window: Rect,
    #[serde(default = "default_input_window")]
    input_window: Rect,
    #[serde(default = "default_coin_animation")]
    coin_animation: Rect,
    #[serde(default = "default_idle_animation")]
    idle_animation: Rect,
}

// ── Defaults ──

fn default_save_file() -> String { "data/database.json".into() }
fn default_animations_dir() -> String { "animations".into() }
fn default_log_file() -> String { "debug.log".into() }

fn default_tick_rate() -> u64 { 16 }     // ~60 Hz
fn default_animation_fps() -> u32 { 15 }
fn default_welcome_secs() -> f64 { 5.0 }
fn default_exit_secs() -> f64 { 2.0 }

fn default_main_window() -> Rect { Rect::new(0, 0, 90, 36) }
fn default_balance_window() -> Rect { Rect::new(91, 0, 30, 3) }
fn default_input_window() -> Rect { Rect::new(0, 36, 90, 3) }
fn default_coin_animation() -> Rect { Rect::new(8, 4, 72, 29) }
fn default_idle_animation() -> Rect { Rect::new(12, 6, 64, 26) }

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            save_file: default_save_file(),
            animations_dir: default_animations_dir(),
            log_file: default_log_file(),
        }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            tick_rate_ms: default_tick_rate(),
            animation_fps: default_animation_fps(),
            welcome_secs: default_welcome_secs(),
            exit_secs: default_exit_secs(),
        }
    }
}

impl Default for TomlLayout {
    fn default() -> Self {
        TomlLayout {
            main_window: default_main_window(),
            balance_window: default_balance_window(),
            input_window: default_input_window(),
            coin_animation: default_coin_animation(),
            idle_animation: default_idle_animation(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    /// Relative paths resolve against the directory the file was found in,
    /// or the CWD when no file exists.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let (toml_cfg, base, source) = load_toml(&search_dirs);
        let mut rng = fastrand::Rng::new();
        let mut cfg = Self::resolve(toml_cfg, base, ModeTable::roll(&mut rng));
        cfg.source = source;
        cfg
    }

    /// Report the config file search. Call once the subscriber is installed.
    pub fn log_source(&self) {
        match &self.source.file {
            Some(path) => info!(path = %path.display(), "loaded config"),
            None => info!("no config.toml found, using defaults"),
        }
        for w in &self.source.warnings {
            warn!("{w}");
        }
    }

    /// Parse a config document directly (no file search).
    #[allow(dead_code)]
    pub fn from_toml_str(text: &str, modes: ModeTable) -> Result<Self, toml::de::Error> {
        let toml_cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(Self::resolve(toml_cfg, None, modes))
    }

    /// Defaults with an explicit mode table.
    #[allow(dead_code)]
    pub fn with_modes(modes: ModeTable) -> Self {
        Self::resolve(TomlConfig::default(), None, modes)
    }

    fn resolve(toml_cfg: TomlConfig, base: Option<PathBuf>, modes: ModeTable) -> Self {
        let resolve_path = |s: &str| {
            let p = PathBuf::from(s);
            match &base {
                Some(dir) if p.is_relative() => dir.join(p),
                _ => p,
            }
        };

        let t = &toml_cfg.timing;
        GameConfig {
            timing: TimingConfig {
                tick_rate: Duration::from_millis(t.tick_rate_ms.max(1)),
                animation_fps: t.animation_fps.max(1),
                welcome_timeout: Duration::from_secs_f64(t.welcome_secs.max(0.0)),
                exit_delay: Duration::from_secs_f64(t.exit_secs.max(0.0)),
            },
            layout: LayoutConfig {
                main_window: toml_cfg.layout.main_window,
                balance_window: toml_cfg.layout.balance_window,
                input_window: toml_cfg.layout.input_window,
                coin_animation: toml_cfg.layout.coin_animation,
                idle_animation: toml_cfg.layout.idle_animation,
            },
            save_file: resolve_path(&toml_cfg.general.save_file),
            animations_dir: resolve_path(&toml_cfg.general.animations_dir),
            log_file: resolve_path(&toml_cfg.general.log_file),
            prompts: Prompts::default(),
            modes,
            positive_phrases: ["yes", "y"].map(String::from).to_vec(),
            negative_phrases: ["exit", "no", "n", "q", "quit"].map(String::from).to_vec(),
            source: ConfigSource::default(),
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
/// Logging is not up yet when this runs: problems go to stderr and are
/// collected in the returned `ConfigSource`.
fn load_toml(search_dirs: &[PathBuf]) -> (TomlConfig, Option<PathBuf>, ConfigSource) {
    let mut source = ConfigSource::default();
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                source.file = Some(path.clone());
                return match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => (cfg, Some(dir.clone()), source),
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        source.warnings.push(format!("{} parse error, using defaults: {e}", path.display()));
                        (TomlConfig::default(), Some(dir.clone()), source)
                    }
                };
            }
            Err(e) => {
                eprintln!("Warning: could not read {}: {e}", path.display());
                source.warnings.push(format!("could not read {}: {e}", path.display()));
            }
        }
    }
    (TomlConfig::default(), None, source)
}
