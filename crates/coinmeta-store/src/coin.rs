use coinmeta_codec::SerializedProgram;
use coinmeta_types::{int_to_bytes, Identifier};
use serde::{Deserialize, Serialize};

/// An immutable ledger record.
///
/// A coin is locked to a puzzle hash (the identifier metadata lives under)
/// and was created by a parent coin. Its own identity is [`Coin::name`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub parent_coin_info: Identifier,
    pub puzzle_hash: Identifier,
    pub amount: u64,
}

impl Coin {
    pub fn new(parent_coin_info: Identifier, puzzle_hash: Identifier, amount: u64) -> Self {
        Self {
            parent_coin_info,
            puzzle_hash,
            amount,
        }
    }

    /// The record identity: `sha256(parent || puzzle_hash || amount)`, with
    /// the amount in its minimal two's-complement form.
    pub fn name(&self) -> Identifier {
        let mut preimage = Vec::with_capacity(32 + 32 + 9);
        preimage.extend_from_slice(self.parent_coin_info.as_bytes());
        preimage.extend_from_slice(self.puzzle_hash.as_bytes());
        preimage.extend_from_slice(&int_to_bytes(i128::from(self.amount)));
        Identifier::sha256(&preimage)
    }
}

/// A coin plus its lifecycle heights as reported by the node.
///
/// `spent_block_index` is zero while the coin is unspent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinRecord {
    pub coin: Coin,
    pub confirmed_block_index: u32,
    #[serde(default)]
    pub spent_block_index: u32,
    #[serde(default)]
    pub spent: bool,
    #[serde(default)]
    pub coinbase: bool,
    #[serde(default)]
    pub timestamp: u64,
}

impl CoinRecord {
    pub fn unspent(coin: Coin, confirmed_block_index: u32) -> Self {
        Self {
            coin,
            confirmed_block_index,
            spent_block_index: 0,
            spent: false,
            coinbase: false,
            timestamp: 0,
        }
    }

    pub fn spent_at(coin: Coin, confirmed_block_index: u32, spent_block_index: u32) -> Self {
        Self {
            spent_block_index,
            spent: spent_block_index > 0,
            ..Self::unspent(coin, confirmed_block_index)
        }
    }

    pub fn name(&self) -> Identifier {
        self.coin.name()
    }

    pub fn is_spent(&self) -> bool {
        self.spent_block_index > 0
    }
}

/// The spend of a coin: the puzzle it revealed and the solution it ran with.
/// Metadata is carried in the solution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinSpend {
    pub coin: Coin,
    pub puzzle_reveal: SerializedProgram,
    pub solution: SerializedProgram,
}
