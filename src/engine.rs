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

//! The public engine facade (spec §6 "Exposed"): ties header validation,
//! uncle validation, seal verification, difficulty calculation, reward
//! accumulation and PoW-mode gating into the single surface a chain
//! implementation drives block-by-block.

use std::sync::Arc;

use ethereum_types::{Address, H256, U256};

use crate::batch::{verify_headers, BatchHandle};
use crate::chain::{ChainReader, HashimotoProvider, StateDb};
use crate::difficulty::calc_difficulty;
use crate::error::ConsensusError;
use crate::pow_mode::PowMode;
use crate::reward::finalize;
use crate::sealhash::seal_hash;
use crate::types::{Block, Header};
use crate::uncles::verify_uncles;
use crate::validator::{verify_header_entry, HeaderOutcome};

/// The Ubqhash consensus engine: a thin facade over the free functions in
/// the other modules, parameterized by the hashimoto provider used for
/// seal verification.
pub struct Engine<P: HashimotoProvider> {
    chain: Arc<dyn ChainReader>,
    mode: PowMode<P>,
}

impl<P: HashimotoProvider> Engine<P> {
    pub fn new(chain: Arc<dyn ChainReader>, mode: PowMode<P>) -> Self {
        Engine { chain, mode }
    }

    /// `Author(header) → address`.
    pub fn author(&self, header: &Header) -> Address {
        header.author()
    }

    /// `SealHash(header)`.
    pub fn seal_hash(&self, header: &Header) -> H256 {
        seal_hash(header)
    }

    /// `CalcDifficulty(chain, header_time, parent)`.
    pub fn calc_difficulty(&self, header_time: u64, parent: &Header) -> U256 {
        calc_difficulty(self.chain.as_ref(), header_time, parent)
    }

    /// `Prepare(header)`: sets `header.difficulty` from its soon-to-be
    /// parent, ahead of mining.
    pub fn prepare(&self, header: &mut Header, parent: &Header) {
        header.difficulty = self.calc_difficulty(header.time, parent);
    }

    /// `VerifyHeader(header, seal)`: structural/temporal/gas/ancestry and
    /// difficulty checks, plus seal verification gated by the configured
    /// `PowMode` when `check_seal` is set.
    ///
    /// Under `PowMode::FullFake` every check (including the ones this
    /// function would otherwise run) unconditionally succeeds (spec §4.H).
    /// A header already known to the chain reader short-circuits
    /// successfully without running anything at all, seal included (spec
    /// §4.C) — `check_seal` is only consulted when the pipeline actually
    /// ran.
    pub fn verify_header(&self, header: &Header, now: u64, check_seal: bool) -> Result<(), ConsensusError> {
        if self.mode.skips_header_checks() {
            return Ok(());
        }

        let outcome = verify_header_entry(self.chain.as_ref(), header, now)?;

        if check_seal && outcome == HeaderOutcome::Verified {
            self.mode.verify_seal(header)?;
        }

        Ok(())
    }

    /// `VerifyHeaders(headers)`: batch entry point, see `batch.rs`.
    pub fn verify_headers(&self, headers: Vec<Header>, now: u64) -> BatchHandle {
        verify_headers(Arc::clone(&self.chain), headers, now)
    }

    /// `VerifyUncles(block)`.
    pub fn verify_uncles(&self, block_header: &Header, uncles: &[Header]) -> Result<(), ConsensusError> {
        if self.mode.skips_header_checks() {
            return Ok(());
        }
        verify_uncles(self.chain.as_ref(), block_header, uncles, &self.mode)
    }

    /// `VerifySeal(header)`, run independent of `VerifyHeader`'s own
    /// `check_seal` gate (e.g. for lazily re-checking a previously admitted
    /// header).
    pub fn verify_seal(&self, header: &Header) -> Result<(), ConsensusError> {
        if self.mode.skips_header_checks() {
            return Ok(());
        }
        self.mode.verify_seal(header)
    }

    /// `Finalize(header, uncles, state)` (spec §4.G).
    pub fn finalize(&self, header: &mut Header, uncles: &[Header], state: &mut dyn StateDb) {
        finalize(self.chain.config(), header, uncles, state);
    }

    /// `FinalizeAndAssemble(header, uncles, state) → Block`: `Finalize`
    /// followed by packaging the header and its uncles into a `Block`.
    pub fn finalize_and_assemble(&self, mut header: Header, uncles: Vec<Header>, state: &mut dyn StateDb) -> Block {
        self.finalize(&mut header, &uncles, state);
        Block::new(header, uncles)
    }
}
