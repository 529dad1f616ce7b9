//! Game session state machine: lobby → playing → finished → lobby.
//!
//! [`Game`] owns everything that outlives a single game (catalog, formula
//! pool, RNG, clock) and at most one [`GameSession`]. All mutation goes
//! through three intents and the clock:
//!
//! | Call | Effect |
//! |------|--------|
//! | [`Game::start`] | validate, pick compounds, seat players, schedule round 1 |
//! | [`Game::grab`] | score the live card for one player |
//! | [`Game::restart`] | drop the session, back to the lobby |
//! | [`Game::advance`] | move game time forward, firing due timers |
//!
//! Each call returns the [`GameEvent`]s it produced.

use std::time::Duration;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::catalog::{Catalog, Compound};
use crate::constants::MAX_PLAYERS;
use crate::env_config::GameConfig;
use crate::error::{CatalogError, SessionError, ValidationError};
use crate::events::{GameEvent, GameView, Stage};
use crate::pool::FormulaPool;
use crate::round::{select_round_compound, Round, RoundPlan, ShowResult};
use crate::scoring::{FinalResult, GrabOutcome, Player};
use crate::timeline::{Timeline, Wake};

/// Availability of the compound catalog. Start is blocked unless `Ready`.
#[derive(Clone, Debug)]
pub enum CatalogStatus {
    Loading,
    Ready(Catalog),
    Failed(String),
}

/// State of one game, from start until restart.
#[derive(Clone, Debug)]
pub struct GameSession {
    pub players: Vec<Player>,
    /// 1-based number of the current round, 0 before the first one.
    pub round_index: usize,
    pub total_rounds: usize,
    /// Compounds for rounds 1..=total_rounds, in play order.
    pub selected: Vec<Compound>,
    pub single_player: bool,
    round: Option<Round>,
}

/// Borrowed game-wide resources a session needs to make progress.
struct Ctx<'a> {
    timeline: &'a mut Timeline,
    rng: &'a mut SmallRng,
    pool: &'a FormulaPool,
    config: &'a GameConfig,
}

/// What the session asks its owner to do after a step.
enum Next {
    Continue,
    Finish,
    Abort(SessionError),
}

impl GameSession {
    pub fn current_round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    fn scores(&self) -> GameEvent {
        GameEvent::ScoresUpdated {
            scores: self.players.iter().map(|p| (p.id.clone(), p.score)).collect(),
        }
    }

    fn on_wake(&mut self, wake: Wake, ctx: &mut Ctx, events: &mut Vec<GameEvent>) -> Next {
        match wake {
            Wake::StartRound => self.advance_round(ctx, events),
            Wake::ShowCard => self.show_card(ctx, events),
            Wake::HideCard => {
                let Some(round) = self.round.as_mut() else {
                    return Next::Abort(SessionError::MissingRoundData {
                        round: self.round_index,
                    });
                };
                let more = round.hide();
                events.push(GameEvent::CardHidden);
                log::debug!("[ROUND] card timed out, {} more", if more { "showing" } else { "no" });
                if more {
                    ctx.timeline.schedule(ctx.config.timings.card_gap, Wake::ShowCard);
                    Next::Continue
                } else {
                    self.show_card(ctx, events)
                }
            }
            Wake::GrabSettled(outcome) => {
                if let Some(round) = self.round.as_mut() {
                    round.settle();
                }
                match outcome {
                    GrabOutcome::Correct => self.advance_round(ctx, events),
                    GrabOutcome::Incorrect => self.show_card(ctx, events),
                }
            }
        }
    }

    /// Move to the next round, or ask to finish after the last one.
    fn advance_round(&mut self, ctx: &mut Ctx, events: &mut Vec<GameEvent>) -> Next {
        self.round_index += 1;
        if self.round_index > self.total_rounds {
            return Next::Finish;
        }
        let target = match select_round_compound(&self.selected, self.round_index) {
            Ok(compound) => compound.clone(),
            Err(err) => return Next::Abort(err),
        };
        log::info!(
            "[ROUND] round {}/{}: {} ({})",
            self.round_index,
            self.total_rounds,
            target.name,
            target.formula
        );
        events.push(GameEvent::RoundStarted {
            round: self.round_index,
            total_rounds: self.total_rounds,
            compound_name: target.name.clone(),
        });
        let plan = RoundPlan::new(target, ctx.pool, ctx.config.cards_per_round, ctx.rng);
        self.round = Some(Round::new(plan));
        self.show_card(ctx, events)
    }

    /// Show the card at the cursor, or close out an exhausted round.
    fn show_card(&mut self, ctx: &mut Ctx, events: &mut Vec<GameEvent>) -> Next {
        let Some(round) = self.round.as_mut() else {
            return Next::Abort(SessionError::MissingRoundData {
                round: self.round_index,
            });
        };
        match round.show_next() {
            ShowResult::Shown(formula) => {
                log::debug!("[ROUND] showing card {formula}");
                events.push(GameEvent::CardShown { formula });
                ctx.timeline.schedule(ctx.config.timings.card_dwell, Wake::HideCard);
            }
            ShowResult::Exhausted => {
                log::info!(
                    "[ROUND] round {} exhausted, nobody grabbed the answer",
                    self.round_index
                );
                events.push(GameEvent::RoundExhausted {
                    round: self.round_index,
                });
                ctx.timeline.schedule(ctx.config.timings.round_gap, Wake::StartRound);
            }
        }
        Next::Continue
    }
}

enum State {
    Lobby,
    Playing(GameSession),
    Finished {
        session: GameSession,
        result: FinalResult,
    },
}

pub struct Game {
    config: GameConfig,
    catalog: CatalogStatus,
    pool: FormulaPool,
    rng: SmallRng,
    timeline: Timeline,
    state: State,
    message: Option<String>,
}

impl Game {
    /// A game waiting for its catalog; see [`Game::set_catalog`].
    pub fn new(config: GameConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        Self {
            config,
            catalog: CatalogStatus::Loading,
            pool: FormulaPool::default(),
            rng,
            timeline: Timeline::new(),
            state: State::Lobby,
            message: None,
        }
    }

    pub fn with_catalog(catalog: Catalog, config: GameConfig) -> Self {
        let mut game = Self::new(config);
        game.set_catalog(Ok(catalog));
        game
    }

    /// Install the outcome of the one-shot catalog load. A failure blocks
    /// [`Game::start`] with a user-facing message; it never panics.
    pub fn set_catalog(&mut self, loaded: Result<Catalog, CatalogError>) {
        match loaded {
            Ok(catalog) => {
                self.pool = FormulaPool::build(&catalog);
                log::info!(
                    "[SESSION] catalog ready: {} compounds, {} formulas in pool",
                    catalog.len(),
                    self.pool.len()
                );
                self.catalog = CatalogStatus::Ready(catalog);
                self.message = None;
            }
            Err(err) => {
                log::error!("[SESSION] catalog load failed: {err}");
                let blocked = ValidationError::CatalogUnavailable(err.to_string());
                self.message = Some(blocked.to_string());
                self.catalog = CatalogStatus::Failed(err.to_string());
            }
        }
    }

    pub fn catalog_status(&self) -> &CatalogStatus {
        &self.catalog
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn stage(&self) -> Stage {
        match self.state {
            State::Lobby => Stage::Lobby,
            State::Playing(_) => Stage::Playing,
            State::Finished { .. } => Stage::Finished,
        }
    }

    /// The running or just-finished session.
    pub fn session(&self) -> Option<&GameSession> {
        match &self.state {
            State::Lobby => None,
            State::Playing(session) | State::Finished { session, .. } => Some(session),
        }
    }

    pub fn result(&self) -> Option<&FinalResult> {
        match &self.state {
            State::Finished { result, .. } => Some(result),
            _ => None,
        }
    }

    /// Game time elapsed so far.
    pub fn now(&self) -> Duration {
        self.timeline.now()
    }

    /// Time until the next timer fires, `None` if nothing is scheduled.
    pub fn time_until_next(&self) -> Option<Duration> {
        self.timeline.time_until_next()
    }

    /// Start a game for `player_count` players over the union of `categories`.
    /// Only accepted in the lobby; a finished game needs [`Game::restart`]
    /// first. On error nothing changes and the message is kept for
    /// [`Game::view`].
    pub fn start<S: AsRef<str>>(
        &mut self,
        player_count: usize,
        categories: &[S],
    ) -> Result<Vec<GameEvent>, ValidationError> {
        match self.prepare(player_count, categories) {
            Ok(session) => {
                let events = vec![GameEvent::GameStarted {
                    players: session.players.clone(),
                    single_player: session.single_player,
                    total_rounds: session.total_rounds,
                }];
                log::info!(
                    "[SESSION] started: {} player(s), {} rounds",
                    session.players.len(),
                    session.total_rounds
                );
                self.message = None;
                self.state = State::Playing(session);
                self.timeline
                    .schedule(self.config.timings.start_delay, Wake::StartRound);
                Ok(events)
            }
            Err(err) => {
                log::info!("[SESSION] start rejected: {err}");
                self.message = Some(err.to_string());
                Err(err)
            }
        }
    }

    fn prepare<S: AsRef<str>>(
        &mut self,
        player_count: usize,
        categories: &[S],
    ) -> Result<GameSession, ValidationError> {
        let catalog = match &self.catalog {
            CatalogStatus::Ready(catalog) => catalog,
            CatalogStatus::Loading => {
                return Err(ValidationError::CatalogUnavailable(
                    "Spieldaten werden noch geladen".to_string(),
                ))
            }
            CatalogStatus::Failed(reason) => {
                return Err(ValidationError::CatalogUnavailable(reason.clone()))
            }
        };
        match self.state {
            State::Lobby => {}
            State::Playing(_) => return Err(ValidationError::AlreadyPlaying),
            State::Finished { .. } => return Err(ValidationError::NotInLobby),
        }
        if player_count == 0 || player_count > MAX_PLAYERS {
            return Err(ValidationError::InvalidPlayerCount {
                requested: player_count,
                max: MAX_PLAYERS,
            });
        }
        if categories.is_empty() {
            return Err(ValidationError::NoCategorySelected);
        }

        let mut active = catalog.union_of(categories);
        let required = self.config.total_rounds;
        if active.len() < required {
            return Err(ValidationError::InsufficientCompounds {
                available: active.len(),
                required,
            });
        }
        active.shuffle(&mut self.rng);
        active.truncate(required);

        Ok(GameSession {
            players: Player::seat(player_count),
            round_index: 0,
            total_rounds: required,
            selected: active,
            single_player: player_count == 1,
            round: None,
        })
    }

    /// A player grabs at the card. Ignored (no events) unless a card is live
    /// and no other grab is being settled; the first grab on a card wins.
    pub fn grab(&mut self, player_id: &str) -> Vec<GameEvent> {
        let State::Playing(session) = &mut self.state else {
            log::debug!("[GRAB] {player_id} ignored: no game running");
            return Vec::new();
        };
        let Some(player) = session.players.iter_mut().find(|p| p.id == player_id) else {
            log::warn!("[GRAB] unknown player {player_id}");
            return Vec::new();
        };
        let Some(round) = session.round.as_mut() else {
            log::debug!("[GRAB] {player_id} ignored: round not started");
            return Vec::new();
        };
        let Some((formula, outcome)) = round.grab(player) else {
            log::debug!("[GRAB] {player_id} ignored: no live card");
            return Vec::new();
        };
        let score = player.score;

        // The dwell timer of the grabbed card must die before anything else is scheduled.
        self.timeline.cancel();
        log::info!("[GRAB] {player_id} grabbed {formula}: {outcome:?}, score {score}");
        let events = vec![
            GameEvent::CardHidden,
            GameEvent::GrabResolved {
                player: player_id.to_string(),
                formula,
                outcome,
                score,
            },
            GameEvent::FeedbackShown {
                outcome,
                duration: self.config.timings.feedback_message,
            },
            session.scores(),
        ];
        self.timeline
            .schedule(self.config.timings.grab_feedback, Wake::GrabSettled(outcome));
        events
    }

    /// Move game time forward by `elapsed`, firing every timer that falls due.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<GameEvent> {
        let deadline = self.timeline.now() + elapsed;
        let mut events = Vec::new();
        while let Some(wake) = self.timeline.pop_due(deadline) {
            self.fire(wake, &mut events);
        }
        self.timeline.settle_at(deadline);
        events
    }

    /// Jump straight to the next timer and fire it. Returns no events when
    /// nothing is scheduled.
    pub fn advance_to_next(&mut self) -> Vec<GameEvent> {
        match self.timeline.time_until_next() {
            Some(wait) => self.advance(wait),
            None => Vec::new(),
        }
    }

    fn fire(&mut self, wake: Wake, events: &mut Vec<GameEvent>) {
        let Game {
            state,
            timeline,
            rng,
            pool,
            config,
            ..
        } = &mut *self;
        let State::Playing(session) = state else {
            log::debug!("[TIMER] stale {wake:?} ignored");
            return;
        };
        let mut ctx = Ctx {
            timeline,
            rng,
            pool,
            config,
        };
        match session.on_wake(wake, &mut ctx, events) {
            Next::Continue => {}
            Next::Finish => self.finish(events),
            Next::Abort(err) => self.abort(err, events),
        }
    }

    fn finish(&mut self, events: &mut Vec<GameEvent>) {
        self.timeline.cancel();
        let State::Playing(session) = std::mem::replace(&mut self.state, State::Lobby) else {
            return;
        };
        let result = FinalResult::from_players(&session.players, session.single_player);
        log::info!("[SESSION] game over: {result:?}");
        events.push(GameEvent::GameFinished {
            result: result.clone(),
        });
        self.state = State::Finished { session, result };
    }

    /// A broken invariant ends the session outright; it is not retried.
    fn abort(&mut self, err: SessionError, events: &mut Vec<GameEvent>) {
        log::error!("[SESSION] aborting session: {err}");
        self.timeline.cancel();
        self.state = State::Lobby;
        self.message = Some(err.to_string());
        events.push(GameEvent::Aborted {
            reason: err.to_string(),
        });
    }

    /// Discard the session and return to the lobby.
    pub fn restart(&mut self) -> Vec<GameEvent> {
        self.timeline.cancel();
        if !matches!(self.state, State::Lobby) {
            log::info!("[SESSION] restart, session discarded");
        }
        self.state = State::Lobby;
        if matches!(self.catalog, CatalogStatus::Ready(_)) {
            self.message = None;
        }
        vec![GameEvent::ReturnedToLobby]
    }

    pub fn view(&self) -> GameView {
        let session = self.session();
        let round = session.and_then(GameSession::current_round);
        let playing = matches!(self.state, State::Playing(_));
        GameView {
            stage: self.stage(),
            round: session.map_or(0, |s| s.round_index.min(s.total_rounds)),
            total_rounds: session.map_or(self.config.total_rounds, |s| s.total_rounds),
            compound_name: round
                .filter(|_| playing)
                .map(|r| r.target().name.clone()),
            visible_card: round
                .filter(|_| playing)
                .and_then(|r| r.live_card())
                .map(str::to_string),
            players: session.map(|s| s.players.clone()).unwrap_or_default(),
            single_player: session.is_some_and(|s| s.single_player),
            result: self.result().cloned(),
            message: self.message.clone(),
        }
    }

    #[cfg(test)]
    fn force_selected(&mut self, selected: Vec<Compound>) {
        if let State::Playing(session) = &mut self.state {
            session.selected = selected;
        }
    }
}
