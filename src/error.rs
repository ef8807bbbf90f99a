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

//! Consensus error kinds.
//!
//! Every validation entry point returns the *first* detected violation; later
//! checks are never performed. Errors are never retried: a deterministic
//! consensus rule either holds for a given input or it doesn't.

use ethereum_types::{H256, U256};
use thiserror::Error;

use crate::types::BlockNumber;

/// First-detected violation of a consensus rule, or a collaborator failure.
#[derive(Debug, Error)]
pub enum ConsensusError {
    /// The parent of a submitted header is not known to the chain reader.
    #[error("unknown ancestor (parent {parent_hash})")]
    UnknownAncestor {
        /// Hash of the missing parent.
        parent_hash: H256,
    },

    /// `header.time` is further in the future than the tolerated skew.
    #[error("block timestamp {found} is too far in the future (now + 15s = {limit})")]
    FutureBlock {
        /// The header's timestamp.
        found: u64,
        /// `now + 15`.
        limit: u64,
    },

    /// `header.time` does not strictly exceed `parent.time`.
    #[error("block timestamp {found} does not exceed parent timestamp {parent}")]
    ZeroBlockTime {
        /// The header's timestamp.
        found: u64,
        /// The parent's timestamp.
        parent: u64,
    },

    /// `header.difficulty` does not match the value computed by the
    /// difficulty engine.
    #[error("invalid difficulty: expected {expected}, found {found}")]
    InvalidDifficulty {
        /// The expected difficulty, per the difficulty engine.
        expected: U256,
        /// The difficulty actually present on the header.
        found: U256,
    },

    /// `header.gas_limit` is out of the protocol-wide or parent-relative
    /// bounds.
    #[error("invalid gas limit {found} (bounds: {min:?}..{max:?})")]
    InvalidGasLimit {
        /// Lower bound, if applicable to the failed check.
        min: Option<U256>,
        /// Upper bound, if applicable to the failed check.
        max: Option<U256>,
        /// The gas limit actually present on the header.
        found: U256,
    },

    /// `header.gas_used` exceeds `header.gas_limit`.
    #[error("gas used {found} exceeds gas limit {limit}")]
    InvalidGasUsed {
        /// Gas used on the header.
        found: U256,
        /// Gas limit on the header.
        limit: U256,
    },

    /// `header.number` is not `parent.number + 1`.
    #[error("invalid block number: expected {expected}, found {found}")]
    InvalidNumber {
        /// `parent.number + 1`.
        expected: BlockNumber,
        /// The header's own number.
        found: BlockNumber,
    },

    /// `header.extra` exceeds `MAX_EXTRA_DATA`.
    #[error("extra data is {found} bytes, exceeding the {max} byte limit")]
    ExtraTooLong {
        /// Length of `header.extra`.
        found: usize,
        /// `MAX_EXTRA_DATA`.
        max: usize,
    },

    /// A block declares more than two uncles.
    #[error("block declares {found} uncles, more than the maximum of {max}")]
    TooManyUncles {
        /// Number of uncles declared.
        found: usize,
        /// Maximum permitted (2).
        max: usize,
    },

    /// An uncle hash was already referenced by an earlier-included uncle
    /// (in this block or an ancestor).
    #[error("duplicate uncle {0}")]
    DuplicateUncle(H256),

    /// An uncle is itself an ancestor of the containing block.
    #[error("uncle {0} is an ancestor of the containing block")]
    UncleIsAncestor(H256),

    /// An uncle's parent is not within the recency window, or is the
    /// containing block's own parent.
    #[error("uncle {0} is not related to the containing block within the uncle window")]
    DanglingUncle(H256),

    /// The hashimoto mix digest does not match `header.mix_digest`.
    #[error("invalid mix digest: expected {expected}, found {found}")]
    InvalidMixDigest {
        /// Digest computed by hashimoto.
        expected: H256,
        /// Digest present on the header.
        found: H256,
    },

    /// The hashimoto result exceeds the target derived from the header's
    /// difficulty.
    #[error("hashimoto result {found} exceeds target {target} for difficulty {difficulty}")]
    InvalidPoW {
        /// `be_u256(hashimoto.result)`.
        found: U256,
        /// `floor(2**256 / difficulty)`.
        target: U256,
        /// The header's declared difficulty.
        difficulty: U256,
    },

    /// `header.difficulty` is not strictly positive.
    #[error("difficulty must be positive, found {0}")]
    ZeroDifficulty(U256),

    /// The chain reader or state DB collaborator failed.
    #[error("collaborator error: {0}")]
    Collaborator(String),
}
