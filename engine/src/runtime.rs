//! Async driver: runs a [`Game`] against real (tokio) time.
//!
//! The presentation adapter talks to the driver over two channels: it sends
//! [`Intent`]s and receives [`Update`]s. The driver sleeps until the game's
//! next timer, and before handling any intent it first advances the game by
//! the time that actually passed, so timers and input stay ordered.
//!
//! Everything runs on one task; there is no locking around game state.

use std::path::Path;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::catalog::{Catalog, CatalogLoad};
use crate::env_config::GameConfig;
use crate::error::CatalogError;
use crate::events::GameEvent;
use crate::session::Game;

/// Input from the presentation adapter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    Start {
        players: usize,
        categories: Vec<String>,
    },
    Grab {
        player: String,
    },
    Restart,
}

/// Output to the presentation adapter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Update {
    Event(GameEvent),
    /// A `Start` was refused; the message is meant for the user.
    Rejected(String),
}

/// Read and parse a catalog file without blocking the runtime.
pub async fn load_catalog_file(path: impl AsRef<Path>) -> Result<CatalogLoad, CatalogError> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
    Catalog::parse_for_path(path, &text)
}

/// Create a game and perform the one-shot catalog load from
/// `config.catalog_path`. A failed load leaves the game unable to start.
pub async fn boot(config: GameConfig) -> Game {
    let path = config.catalog_path.clone();
    let mut game = Game::new(config);
    let loaded = load_catalog_file(&path).await.map(|load| load.catalog);
    game.set_catalog(loaded);
    game
}

pub struct Driver {
    game: Game,
    intents: mpsc::UnboundedReceiver<Intent>,
    updates: mpsc::UnboundedSender<Update>,
}

/// Handles kept by the adapter.
pub struct DriverHandle {
    pub intents: mpsc::UnboundedSender<Intent>,
    pub updates: mpsc::UnboundedReceiver<Update>,
    /// Resolves to the final game once the intent sender is dropped.
    pub task: JoinHandle<Game>,
}

impl Driver {
    pub fn new(
        game: Game,
    ) -> (
        Self,
        mpsc::UnboundedSender<Intent>,
        mpsc::UnboundedReceiver<Update>,
    ) {
        let (intent_tx, intent_rx) = mpsc::unbounded_channel();
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let driver = Self {
            game,
            intents: intent_rx,
            updates: update_tx,
        };
        (driver, intent_tx, update_rx)
    }

    /// Spawn the driver on the current runtime.
    pub fn spawn(game: Game) -> DriverHandle {
        let (driver, intents, updates) = Self::new(game);
        let task = tokio::spawn(driver.run());
        DriverHandle {
            intents,
            updates,
            task,
        }
    }

    /// Run until the intent channel closes or the adapter stops listening.
    pub async fn run(mut self) -> Game {
        let mut synced = Instant::now();
        loop {
            let deadline = self.game.time_until_next().map(|wait| synced + wait);
            tokio::select! {
                intent = self.intents.recv() => {
                    let Some(intent) = intent else {
                        log::info!("[DRIVER] intent channel closed");
                        break;
                    };
                    let now = Instant::now();
                    let due = self.game.advance(now - synced);
                    synced = now;
                    if !self.publish(due) {
                        break;
                    }
                    let updates = self.handle(intent);
                    if !self.send_all(updates) {
                        break;
                    }
                }
                _ = wait_for(deadline) => {
                    let now = Instant::now();
                    let due = self.game.advance(now - synced);
                    synced = now;
                    if !self.publish(due) {
                        break;
                    }
                }
            }
        }
        self.game
    }

    fn handle(&mut self, intent: Intent) -> Vec<Update> {
        match intent {
            Intent::Start {
                players,
                categories,
            } => match self.game.start(players, categories.as_slice()) {
                Ok(events) => events.into_iter().map(Update::Event).collect(),
                Err(err) => vec![Update::Rejected(err.to_string())],
            },
            Intent::Grab { player } => self
                .game
                .grab(&player)
                .into_iter()
                .map(Update::Event)
                .collect(),
            Intent::Restart => self.game.restart().into_iter().map(Update::Event).collect(),
        }
    }

    fn publish(&self, events: Vec<GameEvent>) -> bool {
        self.send_all(events.into_iter().map(Update::Event).collect())
    }

    fn send_all(&self, updates: Vec<Update>) -> bool {
        for update in updates {
            if self.updates.send(update).is_err() {
                log::info!("[DRIVER] adapter went away, stopping");
                return false;
            }
        }
        true
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
