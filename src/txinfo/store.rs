//! Transactional, address-keyed metadata store. Grounded on
//! original_source/src/txinfo.cpp's `CTxInfoStore` — the query shapes,
//! reject reasons, and undo/redo ordering are carried over exactly (spec.md
//! §4.5), backed here by `rusqlite` instead of SQLiteCpp.

use std::ops::{Deref, DerefMut};
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use super::error::TxInfoError;
use super::key::{CTxInfo, TxInfoKey, TxInfoType, TxInfoValue};

pub struct TxInfoStore {
    conn: Connection,
    in_transaction: bool,
    byte_estimate: u32,
}

impl TxInfoStore {
    /// Opens (creating if absent) the backing database at `path` and
    /// ensures the `TxDbEntry` table and its indexes exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).context("opening TxInfo database")?;
        let mut store = TxInfoStore { conn, in_transaction: false, byte_estimate: 0 };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&mut self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS TxDbEntry (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    is_latest INTEGER,
                    address TEXT,
                    key_type INTEGER,
                    key TEXT,
                    value TEXT
                );
                CREATE INDEX IF NOT EXISTS address_index ON TxDbEntry (address);
                CREATE INDEX IF NOT EXISTS key_index ON TxDbEntry (key_type, key);
                CREATE INDEX IF NOT EXISTS value_index ON TxDbEntry (value);",
            )
            .context("creating TxDbEntry schema")?;
        Ok(())
    }

    /// Drops and recreates the table, discarding all history.
    pub fn reset(&mut self) -> Result<()> {
        self.conn.execute("DROP TABLE TxDbEntry", []).context("dropping TxDbEntry")?;
        self.initialize()
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// Opens a new transaction, returning a guard that commits on
    /// `.commit()` or rolls back on drop. Rejects re-entry: a store already
    /// `IN_TXN` cannot open a second transaction (spec.md §5 — transactions
    /// are non-reentrant).
    pub fn begin_transaction(&mut self) -> Result<TxGuard<'_>, TxInfoError> {
        if self.in_transaction {
            return Err(TxInfoError::TransactionAlreadyOpen);
        }
        self.conn.execute_batch("BEGIN")?;
        self.in_transaction = true;
        self.byte_estimate = 0;
        Ok(TxGuard { store: self, committed: false })
    }

    /// Running byte estimate for the current transaction, reset on
    /// commit/rollback. `0` outside a transaction.
    pub fn commit_byte_estimate(&self) -> u32 {
        if self.in_transaction {
            self.byte_estimate
        } else {
            0
        }
    }

    /// Checks `info` against key/value validity plus the store-level
    /// uniqueness and write-once constraints, without mutating anything.
    pub fn is_valid(&self, addr: &str, info: &CTxInfo) -> (bool, String) {
        let mut reason = String::new();
        if !info.is_valid(&mut reason) {
            return (false, reason);
        }

        if info.key.key_type.is_globally_unique() {
            let existing = self
                .unique_address_with_value(&info.key, &info.value)
                .expect("key type checked above; query cannot fail in a healthy store");
            if existing.is_some() {
                return (false, "Unique value is already set".to_string());
            }
        }

        if info.key.key_type.is_write_once_ever() {
            let count: i64 = self
                .conn
                .query_row(
                    "SELECT COUNT(*) FROM TxDbEntry WHERE address=?1 AND key_type=?2 AND key=?3",
                    params![addr, info.key.key_type as u8, info.key.key_string],
                    |row| row.get(0),
                )
                .expect("counting TxDbEntry rows");
            if count > 0 {
                return (false, "A non-overwritable value has already been set".to_string());
            }
        }

        (true, String::new())
    }

    /// Validates and stores `info` under `addr`. For `Normal` keys this
    /// supersedes the previous latest entry (preserved, `is_latest=0`, for
    /// undo); for `WriteOnce`/`Unique`/`Id` keys it is rejected outright if
    /// any prior entry exists. Wraps itself in an auto-commit transaction
    /// unless one is already open.
    pub fn process(&mut self, addr: &str, info: &CTxInfo) -> Result<(bool, String), TxInfoError> {
        if self.in_transaction {
            return Ok(self.process_locked(addr, info));
        }

        self.conn.execute_batch("BEGIN")?;
        let result = self.process_locked(addr, info);
        self.conn.execute_batch(if result.0 { "COMMIT" } else { "ROLLBACK" })?;
        self.byte_estimate = 0;
        Ok(result)
    }

    /// Removes the most recently inserted latest entry matching
    /// `(addr, info.key, info.value)` exactly and re-promotes the prior
    /// entry for that slot, if any. Strict LIFO per `(address, key_type,
    /// keyString)`.
    pub fn undo(&mut self, addr: &str, info: &CTxInfo) -> Result<(bool, String), TxInfoError> {
        if self.in_transaction {
            return Ok(self.undo_locked(addr, info));
        }

        self.conn.execute_batch("BEGIN")?;
        let result = self.undo_locked(addr, info);
        self.conn.execute_batch(if result.0 { "COMMIT" } else { "ROLLBACK" })?;
        self.byte_estimate = 0;
        Ok(result)
    }

    fn process_locked(&mut self, addr: &str, info: &CTxInfo) -> (bool, String) {
        let (ok, reason) = self.is_valid(addr, info);
        if !ok {
            return (false, reason);
        }

        self.conn
            .execute(
                "UPDATE TxDbEntry SET is_latest=0 WHERE address=?1 AND key_type=?2 AND key=?3",
                params![addr, info.key.key_type as u8, info.key.key_string],
            )
            .expect("demoting prior TxDbEntry rows");

        self.conn
            .execute(
                "INSERT INTO TxDbEntry (is_latest, address, key_type, key, value) VALUES (1, ?1, ?2, ?3, ?4)",
                params![addr, info.key.key_type as u8, info.key.key_string, info.value],
            )
            .expect("inserting TxDbEntry row");

        self.byte_estimate +=
            4 + 1 + addr.len() as u32 + 1 + info.key.key_string.len() as u32 + info.value.len() as u32;

        (true, String::new())
    }

    fn undo_locked(&mut self, addr: &str, info: &CTxInfo) -> (bool, String) {
        let rows_changed = self
            .conn
            .execute(
                "DELETE FROM TxDbEntry WHERE is_latest=1 AND address=?1 AND key_type=?2 AND key=?3 AND value=?4",
                params![addr, info.key.key_type as u8, info.key.key_string, info.value],
            )
            .expect("deleting TxDbEntry row");

        if rows_changed == 0 {
            return (false, "Nothing to undo".to_string());
        }

        self.conn
            .execute(
                "UPDATE TxDbEntry SET is_latest=1 WHERE id=(SELECT MAX(id) FROM TxDbEntry WHERE address=?1 AND key_type=?2 AND key=?3)",
                params![addr, info.key.key_type as u8, info.key.key_string],
            )
            .expect("re-promoting prior TxDbEntry row");

        (true, String::new())
    }

    /// The value of the latest entry for `(addr, key)`, if any.
    pub fn get(&self, addr: &str, key: &TxInfoKey) -> Result<Option<TxInfoValue>> {
        self.conn
            .query_row(
                "SELECT value FROM TxDbEntry WHERE id=(SELECT MAX(id) FROM TxDbEntry WHERE address=?1 AND key_type=?2 AND key=?3)",
                params![addr, key.key_type as u8, key.key_string],
                |row| row.get(0),
            )
            .optional()
            .context("querying TxDbEntry")
    }

    /// All addresses with a current (`is_latest=1`) entry matching
    /// `(key, value)`.
    pub fn addresses_with_value(&self, key: &TxInfoKey, value: &str) -> Result<Vec<String>> {
        self.addresses_with_value_raw(key, value).context("querying addresses_with_value")
    }

    /// Same query as `addresses_with_value`, but keeping the raw
    /// `rusqlite::Error` so `unique_address_with_value` can fold it into
    /// `TxInfoError::Sqlite` via `?` instead of going through `anyhow`.
    fn addresses_with_value_raw(&self, key: &TxInfoKey, value: &str) -> rusqlite::Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT address FROM TxDbEntry WHERE key_type=?1 AND key=?2 AND value=?3 AND is_latest=1")?;
        let rows = stmt.query_map(params![key.key_type as u8, key.key_string, value], |row| row.get(0))?;
        rows.collect()
    }

    /// The sole address bound to `(key, value)` for a `Unique`/`Id` key, if
    /// any. Fails with `NotAUniqueKeyType` for other key types, and with
    /// `MultipleAddressesForUniqueValue` if the uniqueness invariant has
    /// somehow been violated — both are programming errors, never expected
    /// in a correctly operated store.
    pub fn unique_address_with_value(
        &self,
        key: &TxInfoKey,
        value: &str,
    ) -> Result<Option<String>, TxInfoError> {
        if !key.key_type.is_globally_unique() {
            return Err(TxInfoError::NotAUniqueKeyType);
        }

        let mut addresses = self.addresses_with_value_raw(key, value)?;
        match addresses.len() {
            0 => Ok(None),
            1 => Ok(addresses.pop()),
            _ => Err(TxInfoError::MultipleAddressesForUniqueValue),
        }
    }

    /// Diagnostic dump of every current entry, sorted by address. No
    /// stronger contract than that.
    pub fn dump_latest_infos(&self) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare("SELECT address, key_type, key, value FROM TxDbEntry WHERE is_latest=1 ORDER BY address")
            .context("preparing dump query")?;
        let rows = stmt
            .query_map([], |row| {
                let address: String = row.get(0)?;
                let key_type: u8 = row.get(1)?;
                let key_string: String = row.get(2)?;
                let value: String = row.get(3)?;
                Ok((address, key_type, key_string, value))
            })
            .context("querying TxDbEntry")?;

        for row in rows {
            let (address, key_type, key_string, value) = row.context("reading TxDbEntry row")?;
            let key = TxInfoKey::new(TxInfoType::from_u8(key_type).expect("valid key_type column"), key_string);
            println!("{}: {}", address, CTxInfo::new(key, value));
        }
        Ok(())
    }
}

/// Scoped transaction handle: acquired by `TxInfoStore::begin_transaction`,
/// released on `.commit()` or, if never committed, on drop (rollback).
/// Replaces the original's nullable transaction pointer per spec.md §9 —
/// re-entry is rejected because a second `begin_transaction` call can't
/// happen while this guard still holds the store's `&mut` borrow.
pub struct TxGuard<'a> {
    store: &'a mut TxInfoStore,
    committed: bool,
}

impl<'a> TxGuard<'a> {
    pub fn commit(mut self) -> Result<(), TxInfoError> {
        self.store.conn.execute_batch("COMMIT")?;
        self.store.in_transaction = false;
        self.store.byte_estimate = 0;
        self.committed = true;
        Ok(())
    }

    pub fn rollback(mut self) -> Result<(), TxInfoError> {
        self.store.conn.execute_batch("ROLLBACK")?;
        self.store.in_transaction = false;
        self.store.byte_estimate = 0;
        self.committed = true;
        Ok(())
    }
}

impl<'a> Deref for TxGuard<'a> {
    type Target = TxInfoStore;
    fn deref(&self) -> &TxInfoStore {
        self.store
    }
}

impl<'a> DerefMut for TxGuard<'a> {
    fn deref_mut(&mut self) -> &mut TxInfoStore {
        self.store
    }
}

impl<'a> Drop for TxGuard<'a> {
    fn drop(&mut self) {
        if !self.committed {
            let _ = self.store.conn.execute_batch("ROLLBACK");
            self.store.in_transaction = false;
            self.store.byte_estimate = 0;
        }
    }
}
