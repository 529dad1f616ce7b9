//! # Formula Grab: reflex chemistry quiz engine
//!
//! Players see a compound name ("Natriumchlorid") while formula cards flash
//! by one at a time. Whoever grabs the card with the matching formula first
//! scores a point; grabbing a wrong card costs one. Ten rounds, then a
//! ranking.
//!
//! The crate is the game core only. A presentation adapter renders
//! [`events::GameEvent`]s and forwards input as intents; nothing here touches
//! a screen.
//!
//! ## Components
//!
//! | Component | Module | Description |
//! |-----------|--------|-------------|
//! | Compound catalog | [`catalog`] | `{category: [{name, formula}]}` from JSON or delimited text; bad entries skipped |
//! | Formula pool | [`pool`] | Deduplicated catalog formulas plus decoys, source of distractors |
//! | Round scheduler | [`round`] | Target lookup, 5-card sequence generation, per-round card state machine |
//! | Scoring & ranking | [`scoring`] | ±1 per grab, competition ranking, podium |
//! | Session state machine | [`session`] | Lobby → Playing → Finished, intents and timers |
//! | Clock | [`timeline`] | Virtual game time with a single pending wake-up |
//! | Async driver | [`runtime`] | Runs a game on tokio time behind intent/update channels |
//! | Bot simulation | [`simulation`] | Parallel bot games for balancing |
//!
//! ## Timing
//!
//! | Delay | Default | Constant |
//! |-------|---------|----------|
//! | start → round 1 | 500 ms | [`constants::START_DELAY_MS`] |
//! | card visible | 3000 ms | [`constants::CARD_DWELL_MS`] |
//! | gap between cards | 1000 ms | [`constants::CARD_GAP_MS`] |
//! | after a grab | 500 ms | [`constants::GRAB_FEEDBACK_MS`] |
//! | exhausted round → next | 500 ms | [`constants::ROUND_GAP_MS`] |
//!
//! The engine is single-threaded and deterministic for a given seed: all
//! delays are registered on a [`timeline::Timeline`] that the caller advances,
//! so tests run whole games without sleeping.

pub mod catalog;
pub mod constants;
pub mod env_config;
pub mod error;
pub mod events;
pub mod pool;
pub mod round;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod simulation;
pub mod timeline;

pub use catalog::{Catalog, CatalogLoad, Compound};
pub use env_config::{GameConfig, Timings};
pub use error::{CatalogError, SessionError, SimulationError, ValidationError};
pub use events::{GameEvent, GameView, Stage};
pub use pool::FormulaPool;
pub use round::{generate_card_sequence, select_round_compound, CardPhase, Round, RoundPlan};
pub use scoring::{
    apply_grab, rank_players, FinalResult, GrabOutcome, Player, PlayerSlot, Podium, RankedPlayer,
};
pub use session::{CatalogStatus, Game, GameSession};
