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

//! Seal verification (spec §4.E): runs hashimoto (light or full), matches
//! the digest, and checks the result against the difficulty-derived
//! target.

use crate::arith::{be_u256, target_for_difficulty};
use crate::chain::{DatasetLike, HashimotoProvider, TEST_DATASET_SIZE};
use crate::error::ConsensusError;
use crate::sealhash::seal_hash;
use crate::types::Header;

/// Whether `dataset_size` should be overridden to the 32 KiB *test* size
/// (spec §4.E step 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetSizing {
    /// Use the provider's real, epoch-derived dataset size.
    Full,
    /// Use the fixed 32 KiB test size, bypassing real DAG generation.
    Test,
}

/// `VerifySeal(header)`.
///
/// Tries a full dataset first (if one is generated and available for the
/// header's epoch); falls back to the light cache otherwise. Both paths
/// hold their cache/dataset guard for the duration of the hashimoto call
/// only, releasing it as soon as this function returns (spec §4.E, §5).
pub fn verify_seal<P: HashimotoProvider>(provider: &P, header: &Header, sizing: DatasetSizing) -> Result<(), ConsensusError> {
    if header.difficulty.is_zero() {
        return Err(ConsensusError::ZeroDifficulty(header.difficulty));
    }

    let hash = seal_hash(header);

    let dataset_guard = provider.dataset(header.number, false);
    let (digest, result) = if dataset_guard.generated() {
        provider.hashimoto_full(&dataset_guard, hash, header.nonce)
    } else {
        drop(dataset_guard);
        let cache_guard = provider.cache(header.number);
        let size = match sizing {
            DatasetSizing::Full => provider.dataset_size(header.number),
            DatasetSizing::Test => TEST_DATASET_SIZE,
        };
        provider.hashimoto_light(size, &cache_guard, hash, header.nonce)
    };

    if digest != header.mix_digest {
        return Err(ConsensusError::InvalidMixDigest { expected: digest, found: header.mix_digest });
    }

    let target = target_for_difficulty(header.difficulty);
    let result = be_u256(&result);
    if result > target {
        return Err(ConsensusError::InvalidPoW { found: result, target, difficulty: header.difficulty });
    }

    log::trace!(target: "seal", "header #{} passed seal verification", header.number);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethereum_types::{H256, H64};
    use std::sync::Arc;

    struct StubDataset {
        generated: bool,
    }

    impl DatasetLike for StubDataset {
        fn generated(&self) -> bool {
            self.generated
        }
    }

    struct StubProvider {
        digest: H256,
        result: [u8; 32],
        dataset_generated: bool,
    }

    impl HashimotoProvider for StubProvider {
        type Cache = ();
        type Dataset = StubDataset;

        fn cache(&self, _number: u64) -> crate::chain::ResourceGuard<Self::Cache> {
            crate::chain::ResourceGuard::new(Arc::new(()))
        }

        fn dataset(&self, _number: u64, _wait: bool) -> crate::chain::ResourceGuard<Self::Dataset> {
            crate::chain::ResourceGuard::new(Arc::new(StubDataset { generated: self.dataset_generated }))
        }

        fn dataset_size(&self, _number: u64) -> u64 {
            1024
        }

        fn hashimoto_light(&self, _size: u64, _cache: &Self::Cache, _seal_hash: H256, _nonce: H64) -> (H256, [u8; 32]) {
            (self.digest, self.result)
        }

        fn hashimoto_full(&self, _dataset: &Self::Dataset, _seal_hash: H256, _nonce: H64) -> (H256, [u8; 32]) {
            (self.digest, self.result)
        }
    }

    fn header_with_difficulty(difficulty: u64, mix_digest: H256) -> Header {
        Header { difficulty: difficulty.into(), mix_digest, ..Header::default() }
    }

    #[test]
    fn accepts_matching_digest_under_target() {
        let digest = H256::repeat_byte(0x42);
        let mut result = [0u8; 32];
        result[31] = 1; // result = 1, trivially under any positive-difficulty target

        let provider = StubProvider { digest, result, dataset_generated: false };
        let header = header_with_difficulty(1_000, digest);

        assert!(verify_seal(&provider, &header, DatasetSizing::Full).is_ok());
    }

    #[test]
    fn rejects_mismatched_mix_digest() {
        let provider = StubProvider { digest: H256::repeat_byte(0x11), result: [0u8; 32], dataset_generated: false };
        let header = header_with_difficulty(1_000, H256::repeat_byte(0x99));

        let err = verify_seal(&provider, &header, DatasetSizing::Full).unwrap_err();
        assert!(matches!(err, ConsensusError::InvalidMixDigest { .. }));
    }

    #[test]
    fn rejects_result_above_target() {
        let digest = H256::repeat_byte(0x42);
        let result = [0xff; 32]; // maximal result, exceeds any finite-difficulty target

        let provider = StubProvider { digest, result, dataset_generated: false };
        let header = header_with_difficulty(2, digest);

        let err = verify_seal(&provider, &header, DatasetSizing::Full).unwrap_err();
        assert!(matches!(err, ConsensusError::InvalidPoW { .. }));
    }

    #[test]
    fn rejects_zero_difficulty() {
        let provider = StubProvider { digest: H256::zero(), result: [0u8; 32], dataset_generated: false };
        let header = header_with_difficulty(0, H256::zero());

        let err = verify_seal(&provider, &header, DatasetSizing::Full).unwrap_err();
        assert!(matches!(err, ConsensusError::ZeroDifficulty(_)));
    }

    #[test]
    fn prefers_full_dataset_when_generated() {
        let digest = H256::repeat_byte(0x7);
        let mut result = [0u8; 32];
        result[31] = 2;

        let provider = StubProvider { digest, result, dataset_generated: true };
        let header = header_with_difficulty(10, digest);

        assert!(verify_seal(&provider, &header, DatasetSizing::Full).is_ok());
    }
}
