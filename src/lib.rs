//! RamHog memory-hard hash and the TxInfo metadata store, as a library.
//!
//! The `ramhog-txinfo` binary is a thin CLI wrapper around these two modules.

pub mod config;
pub mod ramhog;
pub mod txinfo;
