//! Game constants: round structure, timings and the decoy formula list.
//!
//! Timings are in milliseconds of game time. The engine never reads the wall
//! clock itself; see [`crate::timeline`] for how time advances.

/// Rounds per game. Each round uses one distinct compound.
pub const TOTAL_ROUNDS: usize = 10;

/// Cards shown per round: the correct formula plus four distractors.
pub const CARDS_PER_ROUND: usize = 5;

/// Upper bound on distinct-distractor draws before duplicates are allowed.
/// Keeps card generation finite on a tiny formula pool.
pub const MAX_DISTRACTOR_ATTEMPTS: usize = 100;

/// Maximum number of players in one game (one per screen corner).
pub const MAX_PLAYERS: usize = 4;

/// Ranks materialized for the end-of-game podium.
pub const PODIUM_SIZE: usize = 3;

/// Delay between a successful start and the first round.
pub const START_DELAY_MS: u64 = 500;

/// How long a card stays visible if nobody grabs it.
pub const CARD_DWELL_MS: u64 = 3000;

/// Gap between a card timing out and the next card appearing.
pub const CARD_GAP_MS: u64 = 1000;

/// Pause after a grab before the game moves on.
pub const GRAB_FEEDBACK_MS: u64 = 500;

/// Pause between an exhausted card sequence and the next round.
pub const ROUND_GAP_MS: u64 = 500;

/// How long the ✅/❌ feedback message is displayed by the adapter.
pub const FEEDBACK_MESSAGE_MS: u64 = 1000;

/// Well-known formulas always present in the distractor pool, so that sparse
/// category selections still produce full card sequences.
pub const DECOY_FORMULAS: [&str; 11] = [
    "H₂O", "O₂", "N₂", "H₂", "C₆H₁₂O₆", "FeCl₂", "AgNO₃", "H₂O₂", "SO₂", "P₄O₁₀", "NO₂",
];

/// Default catalog location, relative to the working directory.
pub const DEFAULT_CATALOG_PATH: &str = "data/compounds.json";
