/// GameSession: the running game.
///
/// Holds the player's data, the current state, both animations and the save
/// store, and advances everything one tick at a time:
///
///   1. clear surfaces
///   2. `state.process`  (timers, animations; may switch state)
///   3. `state.render`   (sees a switch made in step 2 this same tick)
///   4. balance panel
///   5. exit signal → Exit state
///   6. committed line → `state.handle_input` (switch visible next tick)
///
/// The loop itself (sleeping, presenting frames) lives in `main`.

use std::time::Instant;

use tracing::{debug, info};

use crate::config::GameConfig;
use crate::domain::coin::CoinToss;
use crate::domain::mode::GameMode;
use crate::sim::animation::{self, AnimationError, AnimationPlayer};
use crate::sim::save::{SaveData, SaveStore};
use crate::sim::state::{GameState, Stage, Step};
use crate::ui::input::LineSource;
use crate::ui::surface::Surface;

/// Range of the per-session debt threshold.
const SESSION_THRESHOLD_MIN: i64 = -10_000;
const SESSION_THRESHOLD_MAX: i64 = -5_000;

/// Player data that survives state changes.
#[derive(Clone, Debug)]
pub struct SessionData {
    /// `None` until the player has picked a mode or a starting balance.
    pub player_balance: Option<i64>,
    pub bet_amount: i64,
    pub game_mode: Option<GameMode>,
    pub loan_mode: bool,
    /// Rolled once per process. Only used when no mode is selected; a
    /// selected mode's own threshold takes precedence.
    pub debt_threshold: i64,
    pub running: bool,
    pub game_over: bool,
}

impl SessionData {
    pub fn new(debt_threshold: i64) -> Self {
        SessionData {
            player_balance: None,
            bet_amount: 0,
            game_mode: None,
            loan_mode: false,
            debt_threshold,
            running: true,
            game_over: false,
        }
    }

    pub fn restore(&mut self, save: SaveData) {
        self.player_balance = save.player_balance;
        self.game_mode = save.game_mode;
        self.set_loan_mode(save.loan_mode);
    }

    pub fn snapshot(&self) -> SaveData {
        SaveData {
            player_balance: self.player_balance,
            loan_mode: self.loan_mode,
            game_mode: self.game_mode.clone(),
        }
    }

    /// The threshold that limits bets and ends loan-mode games.
    pub fn effective_debt_threshold(&self) -> i64 {
        self.game_mode.as_ref().map(|m| m.debt_threshold).unwrap_or(self.debt_threshold)
    }

    pub fn set_loan_mode(&mut self, on: bool) {
        if on != self.loan_mode {
            info!(on, threshold = self.effective_debt_threshold(), "loan mode changed");
        }
        self.loan_mode = on;
    }

    /// Start a new game in `mode`.
    pub fn select_mode(&mut self, mode: GameMode) {
        info!(mode = %mode.name, "mode selected");
        self.player_balance = mode.initial_balance;
        self.game_mode = Some(mode);
        self.bet_amount = 0;
        self.set_loan_mode(false);
    }

    /// Drop the saved progress and start over.
    pub fn start_fresh(&mut self) {
        self.player_balance = None;
        self.game_mode = None;
        self.bet_amount = 0;
        self.set_loan_mode(false);
    }

    /// Return an unresolved bet to the balance.
    pub fn refund_bet(&mut self) {
        if self.bet_amount != 0 {
            self.player_balance = Some(self.player_balance.unwrap_or(0).saturating_add(self.bet_amount));
            self.bet_amount = 0;
        }
    }

    /// Interior rows the balance panel needs.
    pub fn balance_panel_rows(&self) -> usize {
        if self.loan_mode { 2 } else { 1 }
    }
}

pub struct GameSession {
    pub data: SessionData,
    state: GameState,
    config: GameConfig,
    idle: AnimationPlayer,
    coin: AnimationPlayer,
    tosser: Box<dyn CoinToss>,
    store: SaveStore,
}

impl GameSession {
    /// Build a session: load both animations (fatal on bad assets) and the
    /// save file (best effort).
    pub fn new(config: GameConfig, store: SaveStore, tosser: Box<dyn CoinToss>) -> Result<Self, AnimationError> {
        let fps = config.timing.animation_fps;
        let idle_frames = animation::load_asset(&config.animations_dir, animation::IDLE_ANIMATION_FILE)?;
        let coin_frames = animation::load_asset(&config.animations_dir, animation::COIN_ANIMATION_FILE)?;
        let idle = AnimationPlayer::new(idle_frames, config.layout.idle_animation, true, fps)?;
        let coin = AnimationPlayer::new(coin_frames, config.layout.coin_animation, false, fps)?;
        info!(idle_frames = idle.frame_count(), coin_frames = coin.frame_count(), "animations ready");
        Ok(Self::with_players(config, store, tosser, idle, coin))
    }

    pub fn with_players(
        config: GameConfig,
        store: SaveStore,
        tosser: Box<dyn CoinToss>,
        idle: AnimationPlayer,
        coin: AnimationPlayer,
    ) -> Self {
        let threshold = fastrand::i64(SESSION_THRESHOLD_MIN..=SESSION_THRESHOLD_MAX);
        let mut data = SessionData::new(threshold);
        if let Some(save) = store.load() {
            data.restore(save);
        }
        GameSession {
            data,
            state: GameState::Welcome { entered: Instant::now() },
            config,
            idle,
            coin,
            tosser,
            store,
        }
    }

    #[allow(dead_code)]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.data.running
    }

    /// Advance the game by one tick.
    pub fn tick(&mut self, now: Instant, main: &mut dyn Surface, balance: &mut dyn Surface, input: &mut dyn LineSource) {
        main.clear();
        balance.clear();

        let step = {
            let mut stage = Stage {
                idle: &mut self.idle,
                coin: &mut self.coin,
                tosser: &mut *self.tosser,
                surface: &mut *main,
            };
            self.state.process(&mut self.data, &self.config, &mut stage, now)
        };
        self.apply(step);

        self.state.render(&self.data, &self.config, main);
        self.render_balance(balance);

        if input.take_exit_signal() {
            self.request_exit(now);
        }
        if let Some(line) = input.take_latest_line() {
            debug!(state = self.state.name(), line = %line, "input");
            let step = self.state.handle_input(&mut self.data, &self.config, &line, now);
            self.apply(step);
        }
    }

    fn apply(&mut self, step: Option<Step>) {
        match step {
            Some(Step::Goto(next)) => {
                debug!(from = self.state.name(), to = next.name(), "state change");
                self.state = next;
            }
            Some(Step::EndGame) => self.end_game(),
            Some(Step::GotoThenEnd(next)) => {
                self.state = next;
                self.end_game();
            }
            None => {}
        }
    }

    /// Leave through the Exit state so the save still happens.
    pub fn request_exit(&mut self, now: Instant) {
        if self.state.is_exit() || !self.data.running {
            return;
        }
        if matches!(self.state, GameState::Prediction | GameState::CoinFlip { .. }) {
            self.data.refund_bet();
        }
        info!(from = self.state.name(), "exit requested");
        self.state = GameState::Exit { entered: now };
    }

    /// Stop the loop. A paused game is saved; a finished one wipes the save.
    pub fn end_game(&mut self) {
        if self.data.game_over {
            self.store.clear();
        } else {
            self.store.save(&self.data.snapshot());
        }
        self.data.running = false;
        info!(game_over = self.data.game_over, balance = ?self.data.player_balance, "game ended");
    }

    fn render_balance(&self, surface: &mut dyn Surface) {
        let balance = self.data.player_balance.unwrap_or(0);
        surface.write_text(0, 0, &format!("Current Balance: ${balance}"));
        if self.data.loan_mode {
            surface.write_text(0, 1, &format!("Debt Threshold: ${}", self.data.effective_debt_threshold()));
        }
    }
}
