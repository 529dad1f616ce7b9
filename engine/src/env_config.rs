//! Game configuration with environment overrides.
//!
//! Defaults come from [`crate::constants`]. `GameConfig::from_env` reads
//! `FORMULA_GRAB_CATALOG`, `FORMULA_GRAB_SEED`, `FORMULA_GRAB_CARD_DWELL_MS`
//! and `FORMULA_GRAB_CARD_GAP_MS`; unparsable values fall back to the default.

use std::path::PathBuf;
use std::time::Duration;

use crate::constants::*;

/// All delays of a game, in game time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timings {
    pub start_delay: Duration,
    pub card_dwell: Duration,
    pub card_gap: Duration,
    pub grab_feedback: Duration,
    pub round_gap: Duration,
    pub feedback_message: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            start_delay: Duration::from_millis(START_DELAY_MS),
            card_dwell: Duration::from_millis(CARD_DWELL_MS),
            card_gap: Duration::from_millis(CARD_GAP_MS),
            grab_feedback: Duration::from_millis(GRAB_FEEDBACK_MS),
            round_gap: Duration::from_millis(ROUND_GAP_MS),
            feedback_message: Duration::from_millis(FEEDBACK_MESSAGE_MS),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameConfig {
    pub total_rounds: usize,
    pub cards_per_round: usize,
    pub timings: Timings,
    /// Fixed RNG seed; `None` seeds from the OS.
    pub seed: Option<u64>,
    pub catalog_path: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            total_rounds: TOTAL_ROUNDS,
            cards_per_round: CARDS_PER_ROUND,
            timings: Timings::default(),
            seed: None,
            catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
        }
    }
}

impl GameConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = std::env::var("FORMULA_GRAB_CATALOG") {
            config.catalog_path = PathBuf::from(path);
        }
        config.seed = env_parse("FORMULA_GRAB_SEED");
        if let Some(ms) = env_parse::<u64>("FORMULA_GRAB_CARD_DWELL_MS") {
            config.timings.card_dwell = Duration::from_millis(ms);
        }
        if let Some(ms) = env_parse::<u64>("FORMULA_GRAB_CARD_GAP_MS") {
            config.timings.card_gap = Duration::from_millis(ms);
        }
        log::info!(
            "[CONFIG] catalog={} seed={:?} dwell={:?} gap={:?}",
            config.catalog_path.display(),
            config.seed,
            config.timings.card_dwell,
            config.timings.card_gap
        );
        config
    }

    /// Same config with a fixed seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("[CONFIG] ignoring unparsable {key}={raw:?}");
            None
        }
    }
}

/// Read `RAYON_NUM_THREADS` (default 8) and build the global rayon pool.
/// Tolerates an already-initialized pool. Returns the thread count.
pub fn init_rayon_threads_lenient() -> usize {
    let num_threads = env_parse("RAYON_NUM_THREADS").unwrap_or(8);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
        .ok(); // May fail if already initialized
    log::info!("[CONFIG] rayon threads: {num_threads}");
    num_threads
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = GameConfig::default();
        assert_eq!(config.total_rounds, 10);
        assert_eq!(config.cards_per_round, 5);
        assert_eq!(config.timings.card_dwell, Duration::from_millis(3000));
        assert_eq!(config.timings.card_gap, Duration::from_millis(1000));
        assert_eq!(config.timings.start_delay, Duration::from_millis(500));
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_with_seed() {
        assert_eq!(GameConfig::default().with_seed(7).seed, Some(7));
    }

    #[test]
    fn test_env_parse_falls_back_on_garbage() {
        std::env::set_var("FORMULA_GRAB_TEST_PARSE_OK", " 250 ");
        std::env::set_var("FORMULA_GRAB_TEST_PARSE_BAD", "viel");
        assert_eq!(env_parse::<u64>("FORMULA_GRAB_TEST_PARSE_OK"), Some(250));
        assert_eq!(env_parse::<u64>("FORMULA_GRAB_TEST_PARSE_BAD"), None);
        assert_eq!(env_parse::<u64>("FORMULA_GRAB_TEST_PARSE_UNSET"), None);
    }

    #[test]
    fn test_rayon_init_is_lenient() {
        let first = init_rayon_threads_lenient();
        // a second call finds the pool already built and must not panic
        assert_eq!(init_rayon_threads_lenient(), first);
        assert!(first >= 1);
    }
}
