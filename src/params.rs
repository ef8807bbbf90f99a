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

//! Chain-config constants consumed by the consensus core (spec §6).
//!
//! Mirrors the teacher's split between `CommonParams` (protocol-wide
//! constants) and `EthashParams` (engine-specific constants) in
//! `ethereum/ethash.rs`, collapsed into a single `UbqhashParams` since this
//! crate has only the one engine family to parameterize.

use ethereum_types::U256;

use crate::types::BlockNumber;

/// A single `(height, reward)` step in the monetary-policy schedule
/// (spec §4.G step 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonetaryPolicyStep {
    /// First block height at which `reward` applies.
    pub height: BlockNumber,
    /// Base block reward from `height` onward, in wei.
    pub reward: U256,
}

/// Chain-wide parameters the consensus core consults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UbqhashParams {
    /// `MAX_EXTRA_DATA`.
    pub max_extra_data: usize,
    /// `MIN_GAS_LIMIT`.
    pub min_gas_limit: U256,
    /// `GAS_LIMIT_BOUND_DIVISOR`.
    pub gas_limit_bound_divisor: U256,
    /// `MIN_DIFFICULTY`.
    pub min_difficulty: U256,
    /// Height at which `DigishieldV3` switches from config A to config B.
    pub digishield_mod_block: BlockNumber,
    /// Height at which difficulty retargeting switches to `Flux`.
    pub flux_block: BlockNumber,
    /// Height at which Byzantium-era uncle-reward rules (`ufixReward`)
    /// take effect.
    pub byzantium_transition: BlockNumber,
    /// Height at which EIP-158 (uncle-reward underflow clamp) takes
    /// effect.
    pub eip158_transition: BlockNumber,
    /// Ordered monetary-policy steps; must be sorted by ascending height
    /// and non-empty.
    pub monetary_policy: Vec<MonetaryPolicyStep>,
    /// Tolerated clock skew for `FutureBlock`, in seconds (spec invariant 3).
    pub allowed_future_block_time: u64,
    /// Number of ancestor generations an uncle's parent may be found in
    /// (spec §4.D step 2).
    pub max_uncle_generations: usize,
    /// Maximum uncles per block (spec §3 uncle-set invariants).
    pub max_uncles: usize,
}

impl UbqhashParams {
    pub fn is_byzantium(&self, number: BlockNumber) -> bool {
        number >= self.byzantium_transition
    }

    pub fn is_eip158(&self, number: BlockNumber) -> bool {
        number >= self.eip158_transition
    }
}

impl Default for UbqhashParams {
    /// Ubiq-mainnet-shaped defaults, analogous to the teacher's
    /// `get_default_ethash_params()` test helper. Activation heights below
    /// are illustrative chain parameters, not a claim of exact mainnet
    /// values; callers targeting a specific deployment should override
    /// them explicitly.
    fn default() -> Self {
        UbqhashParams {
            max_extra_data: 32,
            min_gas_limit: U256::from(5_000),
            gas_limit_bound_divisor: U256::from(2_048),
            min_difficulty: U256::from(131_072),
            digishield_mod_block: 130_000,
            flux_block: 358_363,
            byzantium_transition: 700_000,
            eip158_transition: 700_000,
            monetary_policy: vec![
                MonetaryPolicyStep { height: 0, reward: U256::from(8_000_000_000_000_000_000u64) },
                MonetaryPolicyStep { height: 358_363, reward: U256::from(7_000_000_000_000_000_000u64) },
                MonetaryPolicyStep { height: 716_727, reward: U256::from(6_000_000_000_000_000_000u64) },
            ],
            allowed_future_block_time: 15,
            max_uncle_generations: 7,
            max_uncles: 2,
        }
    }
}
