//! Core types for Potluck: users, expenses, settlements, and the shared ledger.
//!
//! Balances are never authored directly. They are derived from the full
//! expense and settlement history by [`ledger::recompute_balances`] every
//! time the [`ExpenseBook`] changes, including when a remote snapshot
//! arrives through a [`store::DocumentStore`].

/// The expense book: the single state object behind the bookkeeping app.
pub mod book;
/// Configuration for karma and streak bookkeeping.
pub mod config;
/// Error types used throughout the crate.
pub mod error;
/// Expense records and their even split.
pub mod expense;
/// Groups of users sharing expenses.
pub mod group;
/// Typed identifiers.
pub mod id;
/// Balance computation from expense and settlement history.
pub mod ledger;
/// Karma and payment streak rules.
pub mod reputation;
/// Settlement records, including game outcomes.
pub mod settlement;
/// Sync document store collaborator.
pub mod store;
/// Spending summaries.
pub mod summary;
/// User records.
pub mod user;

/// Re-export the expense book and its snapshot.
pub use book::{BookSnapshot, ExpenseBook};
/// Re-export configuration.
pub use config::LedgerConfig;
/// Re-export error types.
pub use error::{LedgerError, LedgerResult, StoreError, StoreResult};
/// Re-export expense types.
pub use expense::{Expense, NewExpense};
/// Re-export group types.
pub use group::Group;
/// Re-export identifiers.
pub use id::{ExpenseId, GroupId, SettlementId, UserId};
/// Re-export ledger types.
pub use ledger::{Balance, Balances, recompute_balances};
/// Re-export the reputation tracker.
pub use reputation::{KarmaPenalty, ReputationTracker};
/// Re-export settlement types.
pub use settlement::{Choice, GameAction, GameResultInfo, Settlement, SettlementMethod};
/// Re-export the document stores.
pub use store::{DocumentStore, JsonFileStore, MemoryStore};
/// Re-export the summary type.
pub use summary::ExpenseSummary;
/// Re-export the user type.
pub use user::User;
