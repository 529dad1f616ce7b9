//! Error types.
//!
//! Three families with different blast radius:
//! - [`CatalogError`]: loading the compound catalog. Whole-document failures
//!   block game start; per-entry failures are collected and skipped.
//! - [`ValidationError`]: a rejected `start` intent. Recoverable, the game
//!   stays in the lobby and the message is shown to the user.
//! - [`SessionError`]: a broken internal invariant during play. Ends the
//!   current session.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("catalog is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("catalog must map category names to compound lists, found {0}")]
    Shape(&'static str),
    #[error("category {category:?}, entry {index}: {reason}")]
    Entry {
        category: String,
        index: usize,
        reason: String,
    },
}

impl CatalogError {
    pub fn entry(category: &str, index: usize, reason: impl Into<String>) -> Self {
        CatalogError::Entry {
            category: category.to_string(),
            index,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Fehler beim Laden der Spieldaten. Bitte die Seite neu laden. ({0})")]
    CatalogUnavailable(String),
    #[error("Bitte wähle mindestens ein Thema aus!")]
    NoCategorySelected,
    #[error(
        "Nicht genügend Verbindungen ({available}) für {required} Runden in den gewählten Themen. Bitte mehr Themen wählen."
    )]
    InsufficientCompounds { available: usize, required: usize },
    #[error("Ungültige Spielerzahl {requested} (erlaubt: 1 bis {max})")]
    InvalidPlayerCount { requested: usize, max: usize },
    #[error("Es läuft bereits ein Spiel")]
    AlreadyPlaying,
    #[error("Das Spiel ist beendet. Zurück zum Startbildschirm, um neu zu starten.")]
    NotInLobby,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("round {round} is outside the selected compounds (have {available})")]
    RoundOutOfRange { round: usize, available: usize },
    #[error("no round plan for round {round}")]
    MissingRoundData { round: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    #[error("game could not start: {0}")]
    Rejected(#[from] ValidationError),
    #[error("game aborted: {0}")]
    Aborted(String),
}
