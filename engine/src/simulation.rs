//! Bot games for balancing: how often do rounds go unanswered, how far
//! apart do scores end up for players of different skill?
//!
//! Each bot looks at every shown card and decides whether to grab it: a
//! correct card with probability `knowledge`, a wrong one with probability
//! `recklessness`, after a reaction time drawn from `reaction`. The fastest
//! bot that decides to grab before the card's dwell time runs out gets it.
//! Games run on the virtual clock, so a whole game takes microseconds.

use std::ops::Range;
use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::catalog::Catalog;
use crate::env_config::GameConfig;
use crate::error::SimulationError;
use crate::events::{GameEvent, Stage};
use crate::scoring::{FinalResult, GrabOutcome};
use crate::session::Game;

/// Salt for the bots' RNG so it does not mirror the game's own stream.
const BOT_SEED_SALT: u64 = 0x0B07_5EED;

#[derive(Clone, Debug, PartialEq)]
pub struct BotProfile {
    /// Probability of grabbing a card that shows the answer.
    pub knowledge: f64,
    /// Probability of grabbing a card that does not.
    pub recklessness: f64,
    /// Reaction time in milliseconds.
    pub reaction: Range<u64>,
}

impl BotProfile {
    pub fn new(knowledge: f64, recklessness: f64, reaction: Range<u64>) -> Self {
        Self {
            knowledge,
            recklessness,
            reaction,
        }
    }

    /// Never wrong, always in time.
    pub fn perfect() -> Self {
        Self::new(1.0, 0.0, 200..400)
    }

    /// Never grabs.
    pub fn idle() -> Self {
        Self::new(0.0, 0.0, 200..400)
    }

    fn reaction_time(&self, rng: &mut SmallRng) -> Duration {
        let ms = if self.reaction.is_empty() {
            self.reaction.start
        } else {
            rng.random_range(self.reaction.clone())
        };
        Duration::from_millis(ms)
    }
}

/// Outcome of one bot game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameSummary {
    pub scores: Vec<i32>,
    /// Seats (0-based) holding rank 1.
    pub winners: Vec<usize>,
    pub rounds_won: usize,
    pub rounds_exhausted: usize,
    pub wrong_grabs: usize,
    pub game_time: Duration,
}

/// Results of a batch of bot games.
pub struct SimulationResult {
    pub games: Vec<GameSummary>,
    pub mean_scores: Vec<f64>,
    pub min_scores: Vec<i32>,
    pub max_scores: Vec<i32>,
    /// Games won per seat; shared first places count for every tied seat.
    pub wins: Vec<usize>,
    pub mean_exhausted: f64,
    pub elapsed: std::time::Duration,
}

/// Play one game with one bot per seat.
pub fn simulate_game(
    catalog: &Catalog,
    categories: &[String],
    bots: &[BotProfile],
    config: &GameConfig,
    seed: u64,
) -> Result<GameSummary, SimulationError> {
    let mut game = Game::with_catalog(catalog.clone(), config.clone().with_seed(seed));
    let mut rng = SmallRng::seed_from_u64(seed ^ BOT_SEED_SALT);
    let mut summary = GameSummary {
        scores: Vec::new(),
        winners: Vec::new(),
        rounds_won: 0,
        rounds_exhausted: 0,
        wrong_grabs: 0,
        game_time: Duration::ZERO,
    };

    game.start(bots.len(), categories)?;
    loop {
        match game.stage() {
            Stage::Finished => break,
            Stage::Lobby => {
                let reason = game.view().message.unwrap_or_default();
                return Err(SimulationError::Aborted(reason));
            }
            Stage::Playing => {}
        }

        let events = match fastest_grab(&game, bots, config, &mut rng) {
            Some((delay, seat)) => {
                let mut events = game.advance(delay);
                events.extend(game.grab(&format!("p{}", seat + 1)));
                events
            }
            None => game.advance_to_next(),
        };
        tally(&events, &mut summary);
    }

    if let Some(session) = game.session() {
        summary.scores = session.players.iter().map(|p| p.score).collect();
    }
    summary.winners = match game.result() {
        Some(FinalResult::Podium(podium)) => podium.winners().map(|p| p.number() - 1).collect(),
        _ => vec![0],
    };
    summary.game_time = game.now();
    Ok(summary)
}

/// Which bot, if any, grabs the live card, and after how long.
fn fastest_grab(
    game: &Game,
    bots: &[BotProfile],
    config: &GameConfig,
    rng: &mut SmallRng,
) -> Option<(Duration, usize)> {
    let round = game.session()?.current_round()?;
    let card = round.live_card()?;
    let is_answer = card == round.target().formula;

    let mut best: Option<(Duration, usize)> = None;
    for (seat, bot) in bots.iter().enumerate() {
        let p = if is_answer { bot.knowledge } else { bot.recklessness };
        if !rng.random_bool(p.clamp(0.0, 1.0)) {
            continue;
        }
        let reaction = bot.reaction_time(rng);
        if reaction >= config.timings.card_dwell {
            continue;
        }
        if best.map_or(true, |(fastest, _)| reaction < fastest) {
            best = Some((reaction, seat));
        }
    }
    best
}

fn tally(events: &[GameEvent], summary: &mut GameSummary) {
    for event in events {
        match event {
            GameEvent::GrabResolved { outcome, .. } => match outcome {
                GrabOutcome::Correct => summary.rounds_won += 1,
                GrabOutcome::Incorrect => summary.wrong_grabs += 1,
            },
            GameEvent::RoundExhausted { .. } => summary.rounds_exhausted += 1,
            _ => {}
        }
    }
}

/// Play `num_games` games in parallel. Game `i` is seeded with `seed + i`.
pub fn simulate_batch(
    catalog: &Catalog,
    categories: &[String],
    bots: &[BotProfile],
    config: &GameConfig,
    num_games: usize,
    seed: u64,
) -> Result<SimulationResult, SimulationError> {
    let start = Instant::now();

    let games: Vec<GameSummary> = (0..num_games)
        .into_par_iter()
        .map(|i| simulate_game(catalog, categories, bots, config, seed.wrapping_add(i as u64)))
        .collect::<Result<Vec<_>, SimulationError>>()?;

    let elapsed = start.elapsed();
    let seats = bots.len();
    let n = games.len().max(1) as f64;

    let mut mean_scores = vec![0.0f64; seats];
    let mut min_scores = vec![i32::MAX; seats];
    let mut max_scores = vec![i32::MIN; seats];
    let mut wins = vec![0usize; seats];
    let mut exhausted = 0usize;
    for g in &games {
        for (seat, &score) in g.scores.iter().enumerate() {
            mean_scores[seat] += score as f64;
            min_scores[seat] = min_scores[seat].min(score);
            max_scores[seat] = max_scores[seat].max(score);
        }
        for &seat in &g.winners {
            wins[seat] += 1;
        }
        exhausted += g.rounds_exhausted;
    }
    for m in &mut mean_scores {
        *m /= n;
    }
    if games.is_empty() {
        min_scores.fill(0);
        max_scores.fill(0);
    }

    log::info!(
        "[SIM] {} games with {} bots in {:.2?}",
        games.len(),
        seats,
        elapsed
    );

    Ok(SimulationResult {
        mean_exhausted: exhausted as f64 / n,
        games,
        mean_scores,
        min_scores,
        max_scores,
        wins,
        elapsed,
    })
}
