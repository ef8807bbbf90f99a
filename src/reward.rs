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

//! Reward accumulation at finalization (spec §4.G): monetary-policy lookup,
//! the Byzantium `ufixReward` fix, per-uncle rewards with the EIP-158
//! underflow clamp, and the inclusion bonus.

use ethereum_types::U256;

use crate::chain::StateDb;
use crate::params::UbqhashParams;
use crate::types::Header;

/// `currentReward`/`initialReward` per the monetary-policy schedule (spec
/// §4.G step 1): `currentReward` is the last step with `height < number`;
/// `initialReward` is the first step's reward.
fn schedule_rewards(params: &UbqhashParams, number: u64) -> (U256, U256) {
    let initial_reward = params
        .monetary_policy
        .first()
        .expect("monetary policy schedule must be non-empty")
        .reward;

    let current_reward = params
        .monetary_policy
        .iter()
        .filter(|step| step.height < number)
        .last()
        .map(|step| step.reward)
        .unwrap_or(initial_reward);

    (current_reward, initial_reward)
}

/// Applies the block reward, uncle rewards and inclusion bonus to `state`,
/// then commits `header.state_root`.
///
/// This is `Finalize`: it assumes every uncle in `uncles` has already
/// passed `verify_uncles`. Reward credits happen in a fixed order (uncles,
/// then the block miner) so that repeated runs over the same input are
/// byte-identical regardless of map iteration order elsewhere in the
/// caller.
pub fn finalize(params: &UbqhashParams, header: &mut Header, uncles: &[Header], state: &mut dyn StateDb) {
    let (current_reward, initial_reward) = schedule_rewards(params, header.number);
    let ufix_reward = if params.is_byzantium(header.number) { current_reward } else { initial_reward };

    let mut current_reward = current_reward;

    for uncle in uncles {
        let uncle_reward = uncle_reward(params, header.number, uncle.number, ufix_reward);
        state.add_balance(uncle.coinbase, uncle_reward);
        current_reward += ufix_reward / U256::from(32);
    }

    state.add_balance(header.coinbase, current_reward);
    header.state_root = state.intermediate_root(params.is_eip158(header.number));
}

/// `uncleReward = ((U.number + 2 − block.number) · ufixReward) / 2`,
/// clamped to zero post-EIP-158 to fix the legacy underflow (spec §4.G
/// step 3). Pre-EIP-158, a non-positive depth term is left to wrap as
/// unsigned `U256` arithmetic, reproducing the original bug rather than
/// papering over it.
fn uncle_reward(params: &UbqhashParams, block_number: u64, uncle_number: u64, ufix_reward: U256) -> U256 {
    let depth_term = uncle_number as i128 + 2 - block_number as i128;
    if depth_term > 0 {
        return U256::from(depth_term as u64) * ufix_reward / U256::from(2);
    }
    if params.is_eip158(block_number) {
        return U256::zero();
    }
    let (wrapped, _) = (U256::from(uncle_number) + U256::from(2u64)).overflowing_sub(U256::from(block_number));
    wrapped * ufix_reward / U256::from(2)
}
