//! Invariant violations — spec.md §7's "programming errors" channel,
//! distinct from the `(bool, String)` validation-failure channel used by
//! `is_valid`/`process`/`undo`. These are bugs in the caller, not data the
//! store rejects; they propagate as typed errors rather than aborting the
//! process, per the REDESIGN FLAG in spec.md §9.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TxInfoError {
    #[error("Database view already has a transaction")]
    TransactionAlreadyOpen,

    #[error("Only unique-type keys can have a unique address for a given value")]
    NotAUniqueKeyType,

    #[error("Unique key has multiple addresses for one value!")]
    MultipleAddressesForUniqueValue,

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}
