use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use coinmeta_codec::SerializedProgram;
use coinmeta_types::Identifier;

use crate::coin::{Coin, CoinRecord, CoinSpend};
use crate::error::{StoreError, StoreResult};
use crate::traits::RecordStore;

/// In-memory, HashMap-based record store.
///
/// Intended for tests and embedding. Besides the lookup surface it counts
/// calls per identifier and can be told to fail listings for chosen puzzle
/// hashes or payload requests for chosen coins, which lets callers observe
/// how often and how gracefully the ledger is consulted.
pub struct InMemoryRecordStore {
    inner: RwLock<StoreState>,
}

#[derive(Default)]
struct StoreState {
    records: HashMap<Identifier, CoinRecord>,
    spends: HashMap<(Identifier, u32), CoinSpend>,
    unavailable: HashSet<Identifier>,
    payload_unavailable: HashSet<Identifier>,
    listing_calls: HashMap<Identifier, usize>,
    payload_calls: HashMap<Identifier, usize>,
}

impl InMemoryRecordStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreState::default()),
        }
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.inner.read().expect("lock poisoned").records.len()
    }

    /// Returns `true` if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert (or replace) a record. Returns its name.
    pub fn insert_record(&self, record: CoinRecord) -> Identifier {
        let name = record.name();
        self.inner
            .write()
            .expect("lock poisoned")
            .records
            .insert(name, record);
        name
    }

    /// Register the spend of `spend.coin` at `height`.
    pub fn insert_spend(&self, height: u32, spend: CoinSpend) {
        let name = spend.coin.name();
        self.inner
            .write()
            .expect("lock poisoned")
            .spends
            .insert((name, height), spend);
    }

    /// Add a coin spent at `spent_height` whose solution is `solution`.
    /// Returns the coin's name.
    pub fn record_spend(
        &self,
        coin: Coin,
        confirmed_height: u32,
        spent_height: u32,
        solution: SerializedProgram,
    ) -> Identifier {
        let name = self.insert_record(CoinRecord::spent_at(
            coin.clone(),
            confirmed_height,
            spent_height,
        ));
        // Nil puzzle: the resolver never inspects the reveal.
        let puzzle_reveal = SerializedProgram::from_bytes(vec![0x80]);
        self.insert_spend(
            spent_height,
            CoinSpend {
                coin,
                puzzle_reveal,
                solution,
            },
        );
        name
    }

    /// Make every listing for `puzzle_hash` fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, puzzle_hash: Identifier) {
        self.inner
            .write()
            .expect("lock poisoned")
            .unavailable
            .insert(puzzle_hash);
    }

    /// Make every payload request for `coin_id` fail with [`StoreError::Unavailable`].
    pub fn set_payload_unavailable(&self, coin_id: Identifier) {
        self.inner
            .write()
            .expect("lock poisoned")
            .payload_unavailable
            .insert(coin_id);
    }

    /// How many times records were listed for `puzzle_hash`.
    pub fn listing_calls(&self, puzzle_hash: &Identifier) -> usize {
        let state = self.inner.read().expect("lock poisoned");
        state.listing_calls.get(puzzle_hash).copied().unwrap_or(0)
    }

    /// How many times a payload was requested for `coin_id`, at any height.
    pub fn payload_calls(&self, coin_id: &Identifier) -> usize {
        let state = self.inner.read().expect("lock poisoned");
        state.payload_calls.get(coin_id).copied().unwrap_or(0)
    }

    /// Total payload requests across all coins.
    pub fn total_payload_calls(&self) -> usize {
        let state = self.inner.read().expect("lock poisoned");
        state.payload_calls.values().sum()
    }

    fn collect(
        state: &StoreState,
        include_spent: bool,
        matches: impl Fn(&Coin) -> bool,
    ) -> HashMap<Identifier, CoinRecord> {
        state
            .records
            .iter()
            .filter(|(_, r)| matches(&r.coin) && (include_spent || !r.is_spent()))
            .map(|(name, r)| (*name, r.clone()))
            .collect()
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn records_by_identifier(
        &self,
        puzzle_hash: &Identifier,
        include_spent: bool,
    ) -> StoreResult<HashMap<Identifier, CoinRecord>> {
        let mut state = self.inner.write().expect("lock poisoned");
        *state.listing_calls.entry(*puzzle_hash).or_default() += 1;
        if state.unavailable.contains(puzzle_hash) {
            return Err(StoreError::Unavailable(format!(
                "listing for {} refused",
                puzzle_hash.short_hex()
            )));
        }
        Ok(Self::collect(&state, include_spent, |c| {
            c.puzzle_hash == *puzzle_hash
        }))
    }

    async fn spend_payload(
        &self,
        coin_id: &Identifier,
        height: u32,
    ) -> StoreResult<Option<CoinSpend>> {
        let mut state = self.inner.write().expect("lock poisoned");
        *state.payload_calls.entry(*coin_id).or_default() += 1;
        if state.payload_unavailable.contains(coin_id) {
            return Err(StoreError::Unavailable(format!(
                "payload for {} refused",
                coin_id.short_hex()
            )));
        }
        Ok(state.spends.get(&(*coin_id, height)).cloned())
    }

    async fn record_by_name(&self, coin_id: &Identifier) -> StoreResult<Option<CoinRecord>> {
        let state = self.inner.read().expect("lock poisoned");
        Ok(state.records.get(coin_id).cloned())
    }

    async fn records_by_parent(
        &self,
        parent_id: &Identifier,
        include_spent: bool,
    ) -> StoreResult<HashMap<Identifier, CoinRecord>> {
        let state = self.inner.read().expect("lock poisoned");
        Ok(Self::collect(&state, include_spent, |c| {
            c.parent_coin_info == *parent_id
        }))
    }
}

impl std::fmt::Debug for InMemoryRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRecordStore")
            .field("record_count", &self.len())
            .finish()
    }
}
