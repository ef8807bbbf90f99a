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

//! Header validation pipeline (spec §4.C): structural, temporal, gas,
//! ancestry and difficulty-match checks, in the exact order spec.md lists
//! them (observable through which error is returned first).

use ethereum_types::U256;

use crate::chain::ChainReader;
use crate::difficulty::calc_difficulty;
use crate::error::ConsensusError;
use crate::types::Header;

/// `verify_header(chain, header, parent, is_uncle, now)`.
///
/// Seal verification is not performed here: the gating between "check the
/// seal" and "skip it" belongs to the PoW-mode layer (`pow_mode.rs`). Every
/// uncle is seal-checked unconditionally by the uncle validator (`uncles.rs`,
/// spec §4.D step 4) right after this function returns `Ok`; a plain
/// successor header's seal is checked by the engine facade only when its
/// caller asks for it (`VerifyHeader`'s `check_seal` flag).
pub fn verify_header(
    chain: &dyn ChainReader,
    header: &Header,
    parent: &Header,
    is_uncle: bool,
    now: u64,
) -> Result<(), ConsensusError> {
    let config = chain.config();

    if header.extra.len() > config.max_extra_data {
        return Err(ConsensusError::ExtraTooLong {
            found: header.extra.len(),
            max: config.max_extra_data,
        });
    }

    if !is_uncle {
        let limit = now + config.allowed_future_block_time;
        if header.time > limit {
            return Err(ConsensusError::FutureBlock { found: header.time, limit });
        }
    }

    if header.time <= parent.time {
        return Err(ConsensusError::ZeroBlockTime { found: header.time, parent: parent.time });
    }

    let expected_difficulty = calc_difficulty(chain, header.time, parent);
    if header.difficulty != expected_difficulty {
        return Err(ConsensusError::InvalidDifficulty {
            expected: expected_difficulty,
            found: header.difficulty,
        });
    }

    let max_gas_limit: U256 = U256::from(u64::MAX >> 1);
    if header.gas_limit > max_gas_limit {
        return Err(ConsensusError::InvalidGasLimit {
            min: None,
            max: Some(max_gas_limit),
            found: header.gas_limit,
        });
    }

    if header.gas_used > header.gas_limit {
        return Err(ConsensusError::InvalidGasUsed { found: header.gas_used, limit: header.gas_limit });
    }

    let bound_divisor = config.gas_limit_bound_divisor;
    let gas_delta = if header.gas_limit > parent.gas_limit {
        header.gas_limit - parent.gas_limit
    } else {
        parent.gas_limit - header.gas_limit
    };
    let bound = parent.gas_limit / bound_divisor;
    if gas_delta >= bound || header.gas_limit < config.min_gas_limit {
        return Err(ConsensusError::InvalidGasLimit {
            min: Some(config.min_gas_limit),
            max: Some(parent.gas_limit + bound),
            found: header.gas_limit,
        });
    }

    if header.number != parent.number + 1 {
        return Err(ConsensusError::InvalidNumber { expected: parent.number + 1, found: header.number });
    }

    log::trace!(target: "validator", "header {} at #{} passed structural/temporal/gas/difficulty checks", header.number, header.number);
    Ok(())
}

/// Whether [`verify_header_entry`] ran the full validation pipeline or
/// short-circuited because the header was already known to the chain
/// reader. Callers must skip seal verification too in the
/// [`HeaderOutcome::AlreadyKnown`] case (spec §4.C: the short circuit
/// covers the entire pipeline, seal included).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderOutcome {
    /// The chain reader already holds this exact header; no check ran.
    AlreadyKnown,
    /// The full structural/temporal/gas/difficulty pipeline ran and passed.
    Verified,
}

/// Public `VerifyHeader(chain, header, seal)` entry point: reports
/// [`HeaderOutcome::AlreadyKnown`] without running any check (short-circuit
/// success, spec §4.C) if the header is already known to the chain reader,
/// fails `UnknownAncestor` if the parent is absent, otherwise delegates to
/// [`verify_header`] with `is_uncle = false` and reports
/// [`HeaderOutcome::Verified`].
///
/// `verify_seal` is left to the caller (see [`verify_header`]'s doc
/// comment) since it depends on the PoW-mode gating in `pow_mode.rs`; the
/// returned [`HeaderOutcome`] tells the caller whether it still needs to
/// run it.
pub fn verify_header_entry(
    chain: &dyn ChainReader,
    header: &Header,
    now: u64,
) -> Result<HeaderOutcome, ConsensusError> {
    // Known-header short circuit: if the chain reader already has this
    // exact header under its own hash, admit it without re-verifying.
    let hash = header_hash(header);
    if chain.get_header(hash, header.number).is_some() {
        return Ok(HeaderOutcome::AlreadyKnown);
    }

    let parent = chain
        .get_header(header.parent_hash, header.number.saturating_sub(1))
        .ok_or(ConsensusError::UnknownAncestor { parent_hash: header.parent_hash })?;

    verify_header(chain, header, &parent, false, now)?;
    Ok(HeaderOutcome::Verified)
}

/// The hash identifying a header to the chain reader (includes the seal
/// fields, unlike `SealHash`, since this is the header's on-chain identity
/// rather than its PoW input).
pub fn header_hash(header: &Header) -> ethereum_types::H256 {
    let mut stream = rlp::RlpStream::new_list(15);
    stream
        .append(&header.parent_hash)
        .append(&header.uncle_hash)
        .append(&header.coinbase)
        .append(&header.state_root)
        .append(&header.tx_root)
        .append(&header.receipt_root)
        .append(&header.bloom)
        .append(&header.difficulty)
        .append(&header.number)
        .append(&header.gas_limit)
        .append(&header.gas_used)
        .append(&header.time)
        .append(&header.extra)
        .append(&header.mix_digest)
        .append(&header.nonce);
    crate::sealhash::keccak256(stream.out().as_ref())
}
