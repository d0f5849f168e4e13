//! The state file shared by every command.

use std::path::Path;

use pl_core::{BookSnapshot, DocumentStore, ExpenseBook, JsonFileStore, LedgerConfig};
use pl_game::{DebtTable, GameBoard, GameConfig};
use pl_wheel::{Planner, WheelConfig};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Everything Potluck remembers between runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    /// Users, groups, expenses and settlements.
    #[serde(default)]
    pub book: BookSnapshot,
    /// Debt challenges.
    #[serde(default)]
    pub games: GameBoard,
    /// Events and spin history.
    #[serde(default)]
    pub planner: Planner,
}

/// A loaded state file, ready to be worked on and saved back.
pub struct Session {
    store: JsonFileStore<Document>,
    /// Expense book plus challenge board.
    pub table: DebtTable,
    /// Events and the wheel.
    pub planner: Planner,
    /// Randomness for games and spins.
    pub rng: StdRng,
}

impl Session {
    /// Load `path`, or start empty if it does not exist yet.
    pub fn open(path: &Path, seed: Option<u64>) -> Result<Self, String> {
        let store = JsonFileStore::new(path);
        let doc: Document = store
            .load()
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?
            .unwrap_or_default();

        let book = ExpenseBook::restore(doc.book, LedgerConfig::default())
            .map_err(|e| format!("{} is inconsistent: {e}", path.display()))?;
        let mut games = doc.games;
        games.set_config(GameConfig::default());

        let mut wheel = WheelConfig::default();
        if let Some(seed) = seed {
            wheel = wheel.with_seed(seed);
        }
        let mut planner = doc.planner;
        planner.set_config(wheel);

        tracing::debug!(path = %path.display(), "state loaded");
        Ok(Self {
            store,
            table: DebtTable::new(book, games),
            planner,
            rng: wheel.rng(),
        })
    }

    /// Write the current state back to the file.
    pub fn save(&self) -> Result<(), String> {
        let doc = Document {
            book: self.table.book().snapshot(),
            games: self.table.board().clone(),
            planner: self.planner.clone(),
        };
        self.store
            .save(&doc)
            .map_err(|e| format!("cannot write {}: {e}", self.store.path().display()))
    }
}
