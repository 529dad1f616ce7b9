//! Observable state changes, handed to the presentation adapter.
//!
//! Every intent and every timer step returns the events it caused, in order.
//! The adapter renders them; the engine never touches the screen.

use std::time::Duration;

use serde::Serialize;

use crate::scoring::{FinalResult, GrabOutcome, Player};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    GameStarted {
        players: Vec<Player>,
        single_player: bool,
        total_rounds: usize,
    },
    RoundStarted {
        round: usize,
        total_rounds: usize,
        compound_name: String,
    },
    CardShown {
        formula: String,
    },
    CardHidden,
    GrabResolved {
        player: String,
        formula: String,
        outcome: GrabOutcome,
        score: i32,
    },
    /// ✅ or ❌ overlay, shown for `duration`.
    FeedbackShown {
        outcome: GrabOutcome,
        duration: Duration,
    },
    ScoresUpdated {
        scores: Vec<(String, i32)>,
    },
    /// Every card went by without a correct grab.
    RoundExhausted {
        round: usize,
    },
    GameFinished {
        result: FinalResult,
    },
    /// The session hit a broken invariant and was ended.
    Aborted {
        reason: String,
    },
    ReturnedToLobby,
}

/// Where the game is, from the outside.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Lobby,
    Playing,
    Finished,
}

/// Snapshot of everything the adapter may display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GameView {
    pub stage: Stage,
    pub round: usize,
    pub total_rounds: usize,
    pub compound_name: Option<String>,
    pub visible_card: Option<String>,
    pub players: Vec<Player>,
    pub single_player: bool,
    pub result: Option<FinalResult>,
    /// User-facing message from a failed start or catalog load.
    pub message: Option<String>,
}

impl GameView {
    /// Round counter text, e.g. `Runde: 3 / 10`.
    pub fn round_label(&self) -> String {
        format!("Runde: {} / {}", self.round, self.total_rounds)
    }

    pub fn score_labels(&self) -> Vec<(String, String)> {
        self.players
            .iter()
            .map(|p| (p.id.clone(), p.score_label(self.single_player)))
            .collect()
    }
}
