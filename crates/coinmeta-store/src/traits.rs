use std::collections::HashMap;

use async_trait::async_trait;
use coinmeta_types::Identifier;

use crate::coin::{CoinRecord, CoinSpend};
use crate::error::StoreResult;

/// Read-only lookup service over the ledger's records.
///
/// Implementations must satisfy:
/// - Absence is not an error: no records is an empty map, no spend is `Ok(None)`.
/// - `Err` means the request itself failed (connection, timeout, bad response).
/// - Record maps are keyed by [`CoinRecord::name`]. Their iteration order is
///   unspecified.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All records ever locked to `puzzle_hash`; spent ones only when
    /// `include_spent` is set.
    async fn records_by_identifier(
        &self,
        puzzle_hash: &Identifier,
        include_spent: bool,
    ) -> StoreResult<HashMap<Identifier, CoinRecord>>;

    /// The spend of `coin_id` included at `height`.
    async fn spend_payload(&self, coin_id: &Identifier, height: u32)
        -> StoreResult<Option<CoinSpend>>;

    /// A single record by its own identity.
    async fn record_by_name(&self, coin_id: &Identifier) -> StoreResult<Option<CoinRecord>>;

    /// All records created by `parent_id`.
    async fn records_by_parent(
        &self,
        parent_id: &Identifier,
        include_spent: bool,
    ) -> StoreResult<HashMap<Identifier, CoinRecord>>;
}
