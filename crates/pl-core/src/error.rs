use crate::id::{GroupId, UserId};

/// Alias for `Result<T, LedgerError>`.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Alias for `Result<T, StoreError>`.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur when mutating the expense book.
///
/// Every error is a local validation failure. The book is left exactly as
/// it was before the failing call.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The expense has no participants, a non-positive amount, or
    /// duplicate participants.
    #[error("invalid expense: {0}")]
    InvalidExpense(String),

    /// The settlement is malformed (self-settlement, non-finite amount, or a
    /// non-positive amount on a normal payment).
    #[error("invalid settlement: {0}")]
    InvalidSettlement(String),

    /// An operation referenced a user that is not in the user table.
    #[error("unknown user: {0}")]
    UnknownUser(UserId),

    /// An operation referenced a group that does not exist.
    #[error("unknown group: {0}")]
    UnknownGroup(GroupId),

    /// The sync document store failed.
    #[error("{0}")]
    Store(#[from] StoreError),
}

/// Errors raised by a [`DocumentStore`](crate::store::DocumentStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("store i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored document could not be encoded or decoded.
    #[error("store document is malformed: {0}")]
    Json(#[from] serde_json::Error),
}
