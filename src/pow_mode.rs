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

//! PoW-mode gating (spec §4.H): controls how expensive seal verification
//! runs, independent of header/uncle validation which always runs in full.
//!
//! `Shared` reuses the same provider type as `Normal` behind an `Arc`,
//! letting multiple engine facades delegate seal verification to one
//! cache/dataset-holding instance (design notes §9) without erasing it
//! behind a trait object — a trait object would have to commit to one
//! concrete `Dataset`/`Cache` pair up front, which is exactly what made the
//! earlier `Shared` design unable to do real hashimoto verification.
//!
//! The 32 KiB test dataset-size override (spec §4.E step 2) is an
//! orthogonal `test_mode` flag on `Normal`/`Shared`, not a property of which
//! mode is selected: a production deployment can run `Shared` against the
//! real per-epoch dataset size just as `Normal` does.

use std::sync::Arc;
use std::time::Duration;

use crate::chain::HashimotoProvider;
use crate::error::ConsensusError;
use crate::seal::{verify_seal, DatasetSizing};
use crate::types::{BlockNumber, Header};

/// How a block's seal is to be checked.
pub enum PowMode<P: HashimotoProvider> {
    /// Every check runs, including the full hashimoto seal verification.
    /// `test_mode` overrides the dataset size to the fixed 32 KiB test size
    /// (spec §4.E step 2) instead of the provider's real per-epoch size.
    Normal { provider: P, test_mode: bool },
    /// Seal verification is delegated to a shared provider instance,
    /// letting multiple engine facades reuse one cache/dataset without
    /// each owning its own (design notes §9). Same `test_mode` override as
    /// `Normal`.
    Shared { provider: Arc<P>, test_mode: bool },
    /// Header/uncle rules still apply; seal verification sleeps
    /// `fake_delay` and succeeds unless `header.number == fake_fail`.
    Fake { fake_delay: Duration, fake_fail: Option<BlockNumber> },
    /// All header, uncle and seal checks unconditionally succeed. Used in
    /// tests that don't care about consensus rules at all.
    FullFake,
}

impl<P: HashimotoProvider> PowMode<P> {
    /// Runs seal verification per this mode's gating rules. Header/uncle
    /// validation is unaffected by `PowMode` and must be invoked
    /// separately by the caller (except under `FullFake`, spec §4.H).
    pub fn verify_seal(&self, header: &Header) -> Result<(), ConsensusError> {
        match self {
            PowMode::Normal { provider, test_mode } => verify_seal(provider, header, dataset_sizing(*test_mode)),
            PowMode::Shared { provider, test_mode } => {
                verify_seal(provider.as_ref(), header, dataset_sizing(*test_mode))
            }
            PowMode::Fake { fake_delay, fake_fail } => {
                if !fake_delay.is_zero() {
                    std::thread::sleep(*fake_delay);
                }
                if *fake_fail == Some(header.number) {
                    return Err(ConsensusError::InvalidPoW {
                        found: header.difficulty,
                        target: ethereum_types::U256::zero(),
                        difficulty: header.difficulty,
                    });
                }
                Ok(())
            }
            PowMode::FullFake => Ok(()),
        }
    }

    /// Whether header/uncle structural checks should still run. Only
    /// `FullFake` skips them entirely (spec §4.H).
    pub fn skips_header_checks(&self) -> bool {
        matches!(self, PowMode::FullFake)
    }
}

fn dataset_sizing(test_mode: bool) -> DatasetSizing {
    if test_mode {
        DatasetSizing::Test
    } else {
        DatasetSizing::Full
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethereum_types::{H256, H64};

    struct NullProvider;

    impl HashimotoProvider for NullProvider {
        type Cache = ();
        type Dataset = crate::chain::TestDataset;

        fn cache(&self, _number: BlockNumber) -> crate::chain::ResourceGuard<Self::Cache> {
            crate::chain::ResourceGuard::new(Arc::new(()))
        }
        fn dataset(&self, _number: BlockNumber, _wait: bool) -> crate::chain::ResourceGuard<Self::Dataset> {
            crate::chain::ResourceGuard::new(Arc::new(crate::chain::TestDataset::new(false)))
        }
        fn dataset_size(&self, _number: BlockNumber) -> u64 {
            1024
        }
        fn hashimoto_light(&self, _size: u64, _cache: &Self::Cache, _seal_hash: H256, _nonce: H64) -> (H256, [u8; 32]) {
            (H256::zero(), [0u8; 32])
        }
        fn hashimoto_full(&self, _dataset: &Self::Dataset, _seal_hash: H256, _nonce: H64) -> (H256, [u8; 32]) {
            (H256::zero(), [0u8; 32])
        }
    }

    #[test]
    fn full_fake_always_succeeds() {
        let mode: PowMode<NullProvider> = PowMode::FullFake;
        let header = Header { difficulty: ethereum_types::U256::zero(), ..Header::default() };
        assert!(mode.verify_seal(&header).is_ok());
        assert!(mode.skips_header_checks());
    }

    #[test]
    fn fake_mode_fails_only_the_designated_height() {
        let mode: PowMode<NullProvider> =
            PowMode::Fake { fake_delay: Duration::from_millis(0), fake_fail: Some(7) };

        let ok_header = Header { number: 6, ..Header::default() };
        let bad_header = Header { number: 7, ..Header::default() };

        assert!(mode.verify_seal(&ok_header).is_ok());
        assert!(mode.verify_seal(&bad_header).is_err());
        assert!(!mode.skips_header_checks());
    }

    #[test]
    fn normal_mode_runs_real_seal_verification() {
        let mode = PowMode::Normal { provider: NullProvider, test_mode: false };
        // Zero difficulty is rejected even before hashimoto runs.
        let header = Header { difficulty: ethereum_types::U256::zero(), ..Header::default() };
        let err = mode.verify_seal(&header).unwrap_err();
        assert!(matches!(err, ConsensusError::ZeroDifficulty(_)));
    }

    struct RecordingProvider {
        size_sent: std::cell::Cell<u64>,
    }

    impl HashimotoProvider for RecordingProvider {
        type Cache = ();
        type Dataset = crate::chain::TestDataset;

        fn cache(&self, _number: BlockNumber) -> crate::chain::ResourceGuard<Self::Cache> {
            crate::chain::ResourceGuard::new(Arc::new(()))
        }
        fn dataset(&self, _number: BlockNumber, _wait: bool) -> crate::chain::ResourceGuard<Self::Dataset> {
            crate::chain::ResourceGuard::new(Arc::new(crate::chain::TestDataset::new(false)))
        }
        fn dataset_size(&self, _number: BlockNumber) -> u64 {
            999_999
        }
        fn hashimoto_light(&self, size: u64, _cache: &Self::Cache, _seal_hash: H256, _nonce: H64) -> (H256, [u8; 32]) {
            self.size_sent.set(size);
            (H256::zero(), [0u8; 32])
        }
        fn hashimoto_full(&self, _dataset: &Self::Dataset, _seal_hash: H256, _nonce: H64) -> (H256, [u8; 32]) {
            (H256::zero(), [0u8; 32])
        }
    }

    /// Regression for the `Shared` variant conflating cache-sharing with
    /// test-mode dataset sizing: with `test_mode: false`, `Shared` must hash
    /// against the provider's real per-epoch dataset size, not the fixed
    /// 32 KiB test size.
    #[test]
    fn shared_mode_uses_real_dataset_size_by_default() {
        let provider = Arc::new(RecordingProvider { size_sent: std::cell::Cell::new(0) });
        let mode: PowMode<RecordingProvider> =
            PowMode::Shared { provider: Arc::clone(&provider), test_mode: false };
        let header = Header { difficulty: ethereum_types::U256::from(1u64), mix_digest: H256::zero(), ..Header::default() };

        assert!(mode.verify_seal(&header).is_ok());
        assert_eq!(provider.size_sent.get(), 999_999);
    }

    #[test]
    fn shared_mode_honors_test_mode_override() {
        let provider = Arc::new(RecordingProvider { size_sent: std::cell::Cell::new(0) });
        let mode: PowMode<RecordingProvider> =
            PowMode::Shared { provider: Arc::clone(&provider), test_mode: true };
        let header = Header { difficulty: ethereum_types::U256::from(1u64), mix_digest: H256::zero(), ..Header::default() };

        assert!(mode.verify_seal(&header).is_ok());
        assert_eq!(provider.size_sent.get(), crate::chain::TEST_DATASET_SIZE);
    }
}
