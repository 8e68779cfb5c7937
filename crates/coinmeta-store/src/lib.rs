//! Record store clients for coinmeta.
//!
//! The resolver never talks to the ledger directly. It goes through the
//! [`RecordStore`] trait, which answers two questions: which records were
//! ever locked to a puzzle hash, and what payload a given record's spend
//! carried at a given height.
//!
//! # Backends
//!
//! - [`InMemoryRecordStore`] -- `HashMap`-based store for tests and embedding
//! - [`RpcRecordStore`] -- JSON-over-HTTPS client for a full node's RPC port
//!
//! Stores are read-only lookup services. They hold no resolver state, and a
//! missing record or payload is `Ok(None)` (or an empty map), never an error.

pub mod coin;
pub mod config;
pub mod error;
pub mod memory;
pub mod rpc;
pub mod traits;

pub use coin::{Coin, CoinRecord, CoinSpend};
pub use config::RpcConfig;
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryRecordStore;
pub use rpc::RpcRecordStore;
pub use traits::RecordStore;
