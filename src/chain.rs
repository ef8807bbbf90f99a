// This file is part of ubq-consensus.
//
// ubq-consensus is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// ubq-consensus is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with ubq-consensus.  If not, see <http://www.gnu.org/licenses/>.

//! External collaborator contracts (spec §6): chain reader, state DB, and
//! the Ethash-family cache/DAG provider. The core only borrows these; it
//! never owns header storage, state, or the DAG.

use std::ops::Deref;
use std::sync::Arc;

use ethereum_types::{Address, H256, H64, U256};

use crate::params::UbqhashParams;
use crate::types::{Block, BlockNumber, Header};

/// Random-access lookup of ancestor headers/blocks, chain-config access,
/// and the median-time-of-past oracle (spec §6 "Consumed — Chain Reader").
pub trait ChainReader: Send + Sync {
    /// Looks up a header by hash and number. `None` means unknown.
    fn get_header(&self, hash: H256, number: BlockNumber) -> Option<Header>;

    /// Looks up a full block by hash and number.
    fn get_block(&self, hash: H256, number: BlockNumber) -> Option<Block>;

    /// The chain's consensus configuration.
    fn config(&self) -> &UbqhashParams;

    /// Median of the most recent N block times ending at `number`,
    /// traversing back through `context_header`'s ancestry. `N` is owned
    /// by the collaborator, not the core (spec §6).
    ///
    /// Returned as a signed value per SPEC_FULL.md §4.A: UNIX-second
    /// timestamps and their differences always fit in `i64`.
    fn calc_past_median_time(&self, number: BlockNumber, context_header: &Header) -> i64;
}

/// Additive balance ledger and state-root commitment (spec §6 "Consumed —
/// State DB"). Mutated only during finalization (spec §3 lifecycle).
pub trait StateDb {
    /// Credits `address` with `amount`. Never goes negative: consensus
    /// rewards are always non-negative additive credits.
    fn add_balance(&mut self, address: Address, amount: U256);

    /// Commits pending balance changes and returns the resulting state
    /// root.
    fn intermediate_root(&mut self, eip158: bool) -> H256;
}

/// Marker for a generated (or still-generating) full Ethash-family
/// dataset.
pub trait DatasetLike {
    /// Whether the dataset has finished generating and is safe to use for
    /// `hashimotoFull`.
    fn generated(&self) -> bool;
}

/// RAII guard keeping a cache or dataset alive for the duration of a
/// hashimoto call. Release happens on `Drop`, on every exit path
/// (including panics unwinding through the seal verifier), preventing a
/// concurrent unmap while a hash is in flight (spec §4.E, §5 "Shared
/// resources").
pub struct ResourceGuard<T>(Arc<T>);

impl<T> ResourceGuard<T> {
    pub fn new(resource: Arc<T>) -> Self {
        ResourceGuard(resource)
    }
}

impl<T> Deref for ResourceGuard<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> Drop for ResourceGuard<T> {
    fn drop(&mut self) {
        log::trace!("releasing ethash cache/dataset handle");
    }
}

/// Produces light caches and full datasets for a given block epoch, and
/// runs the hashimoto mixing function over them (spec §6 "Consumed —
/// Hashimoto provider"). The mixing function itself is standard Ethash and
/// is not redefined here.
pub trait HashimotoProvider: Send + Sync {
    /// Opaque light-cache handle.
    type Cache: Send + Sync;
    /// Opaque full-dataset handle.
    type Dataset: Send + Sync + DatasetLike;

    /// Acquires the light cache for `number`'s epoch, keeping it live for
    /// as long as the returned guard is held.
    fn cache(&self, number: BlockNumber) -> ResourceGuard<Self::Cache>;

    /// Acquires the full dataset for `number`'s epoch. If `wait` is false
    /// and generation is still in progress, the returned guard's
    /// `generated()` will report `false`.
    fn dataset(&self, number: BlockNumber, wait: bool) -> ResourceGuard<Self::Dataset>;

    /// The full dataset size for `number`'s epoch, in bytes. Overridden to
    /// 32 KiB by the *test* PoW mode (spec §4.E step 2).
    fn dataset_size(&self, number: BlockNumber) -> u64;

    /// `hashimotoLight`: mixes `seal_hash`/`nonce` against a
    /// size-bounded view of `cache`. Returns `(mix_digest, result)`.
    fn hashimoto_light(
        &self,
        size: u64,
        cache: &Self::Cache,
        seal_hash: H256,
        nonce: H64,
    ) -> (H256, [u8; 32]);

    /// `hashimotoFull`: mixes `seal_hash`/`nonce` against the full
    /// dataset. Returns `(mix_digest, result)`.
    fn hashimoto_full(&self, dataset: &Self::Dataset, seal_hash: H256, nonce: H64) -> (H256, [u8; 32]);
}

/// `datasetSize` override used by the *test* PoW mode (spec §4.E step 2).
pub const TEST_DATASET_SIZE: u64 = 32 * 1024;

/// A trivial [`DatasetLike`] handle for test collaborators that never
/// generate a real full dataset, so they can still satisfy
/// `HashimotoProvider::Dataset` without pulling in real DAG generation.
pub struct TestDataset {
    generated: bool,
}

impl TestDataset {
    pub fn new(generated: bool) -> Self {
        TestDataset { generated }
    }
}

impl DatasetLike for TestDataset {
    fn generated(&self) -> bool {
        self.generated
    }
}
