/// The game's phases as a closed state machine.
///
/// Each variant can:
///   - `render`: write its prompts to the main surface
///   - `handle_input`: react to one committed line
///   - `process`: per-tick background work (timers, animations)
///
/// None of them mutate the session's current state directly. They return a
/// `Step` and the session applies it, so a state's transition table can be
/// tested without a terminal, an input source, or a running loop.
///
/// `CutScene` is the generic "show some lines, then move on" primitive:
/// after a timer, or after any input, it hands over to its scheduled state
/// and/or ends the game.

use std::time::{Duration, Instant};

use crate::config::{fill, GameConfig};
use crate::domain::coin::{CoinSide, CoinToss};
use crate::domain::mode::{GameMode, ModeKey};
use crate::domain::rules::{self, Answer, BalanceTier, FlipContext, FlipOutcome};
use crate::sim::animation::AnimationPlayer;
use crate::sim::session::SessionData;
use crate::ui::surface::Surface;

/// Result of a state reacting to input or time.
#[derive(Debug)]
pub enum Step {
    Goto(GameState),
    EndGame,
    /// Switch to the state, then end the game.
    GotoThenEnd(GameState),
}

/// What a cutscene does when it finishes, besides switching state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneEnd {
    EndGame,
}

/// Everything `process` may drive besides the session data.
pub struct Stage<'a> {
    pub idle: &'a mut AnimationPlayer,
    pub coin: &'a mut AnimationPlayer,
    pub tosser: &'a mut dyn CoinToss,
    pub surface: &'a mut dyn Surface,
}

#[derive(Debug)]
pub struct CutScene {
    pub prompts: Vec<String>,
    pub next: Option<Box<GameState>>,
    pub timer: Option<Duration>,
    pub wait_for_input: bool,
    pub on_end: Option<SceneEnd>,
    pub plays_idle_animation: bool,
    pub entered: Instant,
}

impl CutScene {
    /// Show `prompts` for `secs`, then go to `next`.
    pub fn timed(prompts: Vec<String>, secs: f64, next: GameState, now: Instant) -> Self {
        CutScene {
            prompts,
            next: Some(Box::new(next)),
            timer: Some(Duration::from_secs_f64(secs)),
            wait_for_input: false,
            on_end: None,
            plays_idle_animation: false,
            entered: now,
        }
    }

    /// Show `prompts` until the player enters any line, then go to `next`.
    pub fn until_input(prompts: Vec<String>, next: GameState, now: Instant) -> Self {
        CutScene {
            prompts,
            next: Some(Box::new(next)),
            timer: None,
            wait_for_input: true,
            on_end: None,
            plays_idle_animation: false,
            entered: now,
        }
    }

    /// Final message: shown for `secs`, then the game ends.
    pub fn finale(prompt: String, secs: f64, now: Instant) -> Self {
        CutScene {
            prompts: vec![prompt],
            next: None,
            timer: Some(Duration::from_secs_f64(secs)),
            wait_for_input: false,
            on_end: Some(SceneEnd::EndGame),
            plays_idle_animation: false,
            entered: now,
        }
    }

    /// Hand over to the scheduled state and fire `on_end`. Both happen
    /// when both are set.
    fn finish(&mut self) -> Option<Step> {
        match (self.next.take(), self.on_end) {
            (Some(next), Some(SceneEnd::EndGame)) => Some(Step::GotoThenEnd(*next)),
            (None, Some(SceneEnd::EndGame)) => Some(Step::EndGame),
            (Some(next), None) => Some(Step::Goto(*next)),
            (None, None) => None,
        }
    }
}

#[derive(Debug)]
pub enum GameState {
    Welcome { entered: Instant },
    ModeSelect,
    InitialBalance,
    GameMenu,
    Prediction,
    CoinFlip { prediction: CoinSide },
    LoanOffer,
    CutScene(CutScene),
    Exit { entered: Instant },
}

fn cut(scene: CutScene) -> Option<Step> {
    Some(Step::Goto(GameState::CutScene(scene)))
}

fn goto(state: GameState) -> Option<Step> {
    Some(Step::Goto(state))
}

fn elapsed_past(entered: Instant, now: Instant, limit: Duration) -> bool {
    now.saturating_duration_since(entered) > limit
}

impl GameState {
    pub fn name(&self) -> &'static str {
        match self {
            GameState::Welcome { .. } => "Welcome",
            GameState::ModeSelect => "ModeSelect",
            GameState::InitialBalance => "InitialBalance",
            GameState::GameMenu => "GameMenu",
            GameState::Prediction => "Prediction",
            GameState::CoinFlip { .. } => "CoinFlip",
            GameState::LoanOffer => "LoanOffer",
            GameState::CutScene(_) => "CutScene",
            GameState::Exit { .. } => "Exit",
        }
    }

    pub fn is_exit(&self) -> bool {
        matches!(self, GameState::Exit { .. })
    }

    fn plays_idle_animation(&self) -> bool {
        match self {
            GameState::CutScene(scene) => scene.plays_idle_animation,
            GameState::CoinFlip { .. } | GameState::Exit { .. } => false,
            _ => true,
        }
    }

    // ══════════════════════════════════════════════════════════
    // Render
    // ══════════════════════════════════════════════════════════

    pub fn render(&self, data: &SessionData, config: &GameConfig, surface: &mut dyn Surface) {
        let p = &config.prompts;
        let lines: Vec<String> = match self {
            GameState::Welcome { .. } => {
                let mut v = vec![p.welcome.clone()];
                if data.player_balance.is_some() {
                    v.push(p.continue_game.clone());
                }
                v
            }
            GameState::ModeSelect => vec![p.welcome.clone(), p.select_mode.clone(), p.mode_help_hint.clone()],
            GameState::InitialBalance => vec![p.welcome.clone(), p.money_input.clone()],
            GameState::GameMenu => vec![p.how_much.clone()],
            GameState::Prediction => vec![p.ask_choice.clone()],
            GameState::CoinFlip { .. } => vec![p.coin_flip.clone()],
            GameState::LoanOffer => vec![p.ask_loan_choice.clone()],
            GameState::CutScene(scene) => scene.prompts.clone(),
            GameState::Exit { .. } => {
                let balance = data.player_balance.unwrap_or(0);
                vec![fill(&p.leave_game, &[("balance", balance.to_string())])]
            }
        };
        for (row, line) in lines.iter().enumerate() {
            surface.write_text(0, row, line);
        }
    }

    // ══════════════════════════════════════════════════════════
    // Process (once per tick, before render)
    // ══════════════════════════════════════════════════════════

    pub fn process(&mut self, data: &mut SessionData, config: &GameConfig, stage: &mut Stage, now: Instant) -> Option<Step> {
        if self.plays_idle_animation() {
            stage.idle.play(stage.surface);
        }

        match self {
            GameState::Welcome { entered } => {
                if data.player_balance.is_none() || data.game_mode.is_none() {
                    return goto(GameState::ModeSelect);
                }
                if elapsed_past(*entered, now, config.timing.welcome_timeout) {
                    return goto(GameState::GameMenu);
                }
                None
            }
            GameState::CoinFlip { prediction } => {
                stage.coin.play(stage.surface);
                if !stage.coin.is_finished() {
                    return None;
                }
                let result = stage.tosser.toss();
                stage.coin.reset();
                resolve_flip(data, config, *prediction, result, now)
            }
            GameState::CutScene(scene) => match scene.timer {
                Some(limit) if !scene.wait_for_input && elapsed_past(scene.entered, now, limit) => scene.finish(),
                _ => None,
            },
            GameState::Exit { entered } => {
                if elapsed_past(*entered, now, config.timing.exit_delay) {
                    return Some(Step::EndGame);
                }
                None
            }
            _ => None,
        }
    }

    // ══════════════════════════════════════════════════════════
    // Input
    // ══════════════════════════════════════════════════════════

    pub fn handle_input(&mut self, data: &mut SessionData, config: &GameConfig, input: &str, now: Instant) -> Option<Step> {
        let p = &config.prompts;
        let invalid = |next: GameState| cut(CutScene::timed(vec![p.invalid_input.clone()], 1.0, next, now));

        match self {
            GameState::Welcome { .. } => {
                if input.trim().is_empty() {
                    return None;
                }
                match rules::classify_answer(input, &config.positive_phrases, &config.negative_phrases) {
                    Answer::Positive => goto(GameState::GameMenu),
                    Answer::Negative => {
                        data.start_fresh();
                        goto(GameState::ModeSelect)
                    }
                    Answer::Other => goto(GameState::Welcome { entered: now }),
                }
            }

            GameState::ModeSelect => {
                if let Some(key) = ModeKey::parse(input) {
                    let mode = config.modes.get(key).clone();
                    let intro = match key {
                        ModeKey::Easy => &p.easy_mode_intro,
                        ModeKey::Moderate => &p.moderate_mode_intro,
                        ModeKey::Hard => &p.hard_mode_intro,
                        ModeKey::Intense => &p.intense_mode_intro,
                    };
                    let next = if mode.initial_balance.is_some() { GameState::GameMenu } else { GameState::InitialBalance };
                    data.select_mode(mode);
                    return cut(CutScene::timed(vec![intro.clone()], 2.0, next, now));
                }
                if input.trim().eq_ignore_ascii_case("help") {
                    let info = config.modes.iter().map(|m| mode_info(config, m)).collect();
                    return cut(CutScene::until_input(info, GameState::ModeSelect, now));
                }
                invalid(GameState::ModeSelect)
            }

            GameState::InitialBalance => match rules::parse_positive_int(input) {
                Some(balance) => {
                    data.player_balance = Some(balance);
                    let intro = match rules::balance_tier(balance) {
                        BalanceTier::Poor => &p.poor_player_intro,
                        BalanceTier::Rich => &p.rich_player_intro,
                    };
                    cut(CutScene::timed(vec![intro.clone()], 2.0, GameState::GameMenu, now))
                }
                None => invalid(GameState::InitialBalance),
            },

            GameState::GameMenu => {
                let balance = data.player_balance.unwrap_or(0);
                let threshold = data.effective_debt_threshold();
                match rules::parse_positive_int(input) {
                    Some(bet) if rules::is_valid_bet(bet, balance, data.loan_mode, threshold) => {
                        data.player_balance = Some(balance.saturating_sub(bet));
                        data.bet_amount = bet;
                        goto(GameState::Prediction)
                    }
                    _ => invalid(GameState::GameMenu),
                }
            }

            // A bad prediction forfeits the stake.
            GameState::Prediction => match CoinSide::parse(input) {
                Some(prediction) => goto(GameState::CoinFlip { prediction }),
                None => {
                    data.bet_amount = 0;
                    invalid(GameState::GameMenu)
                }
            },

            GameState::LoanOffer => match rules::classify_answer(input, &config.positive_phrases, &config.negative_phrases) {
                Answer::Negative => {
                    data.game_over = true;
                    cut(CutScene::finale(p.game_over.clone(), 1.5, now))
                }
                Answer::Positive => {
                    data.set_loan_mode(true);
                    cut(CutScene::timed(vec![p.loans_enabled.clone()], 1.5, GameState::GameMenu, now))
                }
                Answer::Other => cut(CutScene::timed(vec![p.retry_input.clone()], 1.5, GameState::LoanOffer, now)),
            },

            GameState::CutScene(scene) if scene.wait_for_input => scene.finish(),

            _ => None,
        }
    }
}

fn mode_info(config: &GameConfig, mode: &GameMode) -> String {
    let initial = mode.initial_balance.map(|b| b.to_string()).unwrap_or_else(|| "your choice".into());
    fill(&config.prompts.mode_info, &[
        ("name", mode.name.clone()),
        ("initialBalance", initial),
        ("goalMoney", mode.goal_money_amount.to_string()),
    ])
}

/// Apply a finished flip to the session and pick the follow-up state.
pub fn resolve_flip(data: &mut SessionData, config: &GameConfig, prediction: CoinSide, result: CoinSide, now: Instant) -> Option<Step> {
    let p = &config.prompts;
    let ctx = FlipContext {
        balance: data.player_balance.unwrap_or(0),
        bet: data.bet_amount,
        loan_mode: data.loan_mode,
        debt_threshold: data.effective_debt_threshold(),
        goal: data.game_mode.as_ref().map(|m| m.goal_money_amount).unwrap_or(i64::MAX),
    };
    let (balance, outcome) = rules::resolve_flip(ctx, prediction, result);
    data.player_balance = Some(balance);
    data.bet_amount = 0;
    tracing::info!(
        prediction = prediction.label(),
        result = result.label(),
        balance,
        ?outcome,
        "coin flip resolved"
    );

    match outcome {
        FlipOutcome::GoalReached => {
            data.game_over = true;
            let mode = data.game_mode.as_ref().map(|m| m.name.clone()).unwrap_or_default();
            cut(CutScene::finale(fill(&p.game_won, &[("mode", mode)]), 3.0, now))
        }
        FlipOutcome::Doubled => cut(CutScene::timed(vec![p.lucky_winner.clone()], 1.5, GameState::GameMenu, now)),
        FlipOutcome::Lost => cut(CutScene::timed(vec![p.loss_message.clone()], 1.5, GameState::GameMenu, now)),
        FlipOutcome::Bankrupt => {
            data.game_over = true;
            cut(CutScene::finale(p.game_over.clone(), 3.0, now))
        }
        FlipOutcome::OutOfMoney => goto(GameState::LoanOffer),
    }
}
