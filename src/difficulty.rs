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

//! Difficulty retargeting (spec §4.B): selects DigishieldV3 (config A or B)
//! or Flux by parent height, then computes the next difficulty from the
//! parent and the chain's median-time-past oracle.

use ethereum_types::U256;

use crate::arith::floor_div_i64;
use crate::chain::ChainReader;
use crate::types::{BlockNumber, Header};

/// Ubiq's target block time, in seconds. The averaging window's target
/// timespan is `averaging_window * BLOCK_TIME_SECONDS`.
pub const BLOCK_TIME_SECONDS: i64 = 88;

/// Tunable parameters for one retargeting algorithm variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlgoConfig {
    /// Averaging window, in blocks.
    pub averaging_window: i64,
    /// Upward clamp numerator, in units of `1 / factor`.
    pub max_up: i64,
    /// Downward clamp numerator, in units of `1 / factor`.
    pub max_down: i64,
    /// Flux's soft-clamp dampener numerator; unused (zero) by the two
    /// Digishield configs.
    pub dampen: i64,
    /// Denominator shared by `max_up`/`max_down`/`dampen`.
    pub factor: i64,
}

impl AlgoConfig {
    /// `T(cfg) = averaging_window * BLOCK_TIME_SECONDS`.
    pub const fn target_timespan(&self) -> i64 {
        self.averaging_window * BLOCK_TIME_SECONDS
    }
}

/// Original Digishield-v3 tuning, used while `parent.number < DIGISHIELD_MOD_BLOCK`.
pub const DIGISHIELD_V3_CONFIG_A: AlgoConfig = AlgoConfig {
    averaging_window: 21,
    max_up: 8,
    max_down: 16,
    dampen: 0,
    factor: 100,
};

/// Modified Digishield-v3 tuning, used while
/// `DIGISHIELD_MOD_BLOCK <= parent.number < FLUX_BLOCK`.
pub const DIGISHIELD_V3_CONFIG_B: AlgoConfig = AlgoConfig {
    averaging_window: 88,
    max_up: 2,
    max_down: 3,
    dampen: 0,
    factor: 100,
};

/// Flux tuning, used while `parent.number >= FLUX_BLOCK`.
pub const FLUX_CONFIG: AlgoConfig = AlgoConfig {
    averaging_window: 88,
    max_up: 3,
    max_down: 5,
    dampen: 1,
    factor: 1000,
};

/// Which retargeting algorithm applies to a given parent height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    DigishieldV3(AlgoConfig),
    Flux,
}

/// Selects the retargeting algorithm for `parent.number` (spec §4.B
/// "Selection by height").
pub fn select_algorithm(parent_number: BlockNumber, chain: &dyn ChainReader) -> Algorithm {
    let config = chain.config();
    if parent_number < config.digishield_mod_block {
        Algorithm::DigishieldV3(DIGISHIELD_V3_CONFIG_A)
    } else if parent_number < config.flux_block {
        Algorithm::DigishieldV3(DIGISHIELD_V3_CONFIG_B)
    } else {
        Algorithm::Flux
    }
}

/// `CalcDifficulty(chain, header.time, parent)`: the difficulty a header
/// extending `parent` at `header_time` must declare.
///
/// Pure over its inputs (testable property 1): the same
/// `(chain.config(), chain.calc_past_median_time(..), header_time, parent)`
/// always yields the same result.
pub fn calc_difficulty(chain: &dyn ChainReader, header_time: u64, parent: &Header) -> U256 {
    let min_difficulty = chain.config().min_difficulty;

    match select_algorithm(parent.number, chain) {
        Algorithm::DigishieldV3(cfg) => digishield_v3(chain, parent, &cfg, min_difficulty),
        Algorithm::Flux => flux(chain, header_time, parent, &FLUX_CONFIG, min_difficulty),
    }
}

/// Computes the dampened, clamped `actual` timespan shared by steps 1-5 of
/// both DigishieldV3 and Flux (spec §4.B).
fn dampened_actual_timespan(chain: &dyn ChainReader, parent: &Header, cfg: &AlgoConfig) -> i64 {
    let aw = cfg.averaging_window as u64;
    let first = parent.number - aw;
    let last_median = chain.calc_past_median_time(parent.number, parent);
    let first_median = chain.calc_past_median_time(first, parent);
    let actual = last_median - first_median;
    let t = cfg.target_timespan();
    t + floor_div_i64(actual - t, 4)
}

fn clamp_bounds(cfg: &AlgoConfig) -> (i64, i64) {
    let t = cfg.target_timespan();
    let min = floor_div_i64(t * (cfg.factor - cfg.max_up), cfg.factor);
    let max = floor_div_i64(t * (cfg.factor + cfg.max_down), cfg.factor);
    (min, max)
}

fn digishield_v3(chain: &dyn ChainReader, parent: &Header, cfg: &AlgoConfig, min_difficulty: U256) -> U256 {
    if parent.number <= cfg.averaging_window as u64 {
        return parent.difficulty;
    }

    let mut actual = dampened_actual_timespan(chain, parent, cfg);
    let (min, max) = clamp_bounds(cfg);
    if actual < min {
        actual = min;
    } else if actual > max {
        actual = max;
    }

    let t = cfg.target_timespan();
    finalize_difficulty(parent.difficulty, t, actual, min_difficulty)
}

fn flux(chain: &dyn ChainReader, header_time: u64, parent: &Header, cfg: &AlgoConfig, min_difficulty: U256) -> U256 {
    if parent.number <= cfg.averaging_window as u64 {
        return parent.difficulty;
    }

    let actual_raw = dampened_actual_timespan(chain, parent, cfg);
    let t = cfg.target_timespan();
    let min_hard = floor_div_i64(t * (cfg.factor - cfg.max_up), cfg.factor);
    let min_soft = floor_div_i64(t * (cfg.factor - cfg.dampen), cfg.factor);
    let max_hard = floor_div_i64(t * (cfg.factor + cfg.max_down), cfg.factor);
    let max_soft = floor_div_i64(t * (cfg.factor + cfg.dampen), cfg.factor);

    let diff_time = header_time as i64 - parent.time as i64;

    let actual = if actual_raw < min_hard {
        if diff_time > 2 * BLOCK_TIME_SECONDS {
            min_soft
        } else {
            min_hard
        }
    } else if actual_raw > max_hard {
        if diff_time < BLOCK_TIME_SECONDS / 2 {
            max_soft
        } else {
            max_hard
        }
    } else {
        actual_raw
    };

    finalize_difficulty(parent.difficulty, t, actual, min_difficulty)
}

fn finalize_difficulty(parent_difficulty: U256, target_timespan: i64, actual: i64, min_difficulty: U256) -> U256 {
    debug_assert!(actual > 0, "actual timespan must be positive after clamping");
    let t = U256::from(target_timespan as u64);
    let actual = U256::from(actual as u64);
    let new_difficulty = parent_difficulty * t / actual;
    if new_difficulty < min_difficulty {
        min_difficulty
    } else {
        new_difficulty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::UbqhashParams;

    struct FakeChain {
        params: UbqhashParams,
        last_median: i64,
        first_median: i64,
    }

    impl ChainReader for FakeChain {
        fn get_header(&self, _hash: ethereum_types::H256, _number: BlockNumber) -> Option<Header> {
            None
        }
        fn get_block(&self, _hash: ethereum_types::H256, _number: BlockNumber) -> Option<crate::types::Block> {
            None
        }
        fn config(&self) -> &UbqhashParams {
            &self.params
        }
        fn calc_past_median_time(&self, number: BlockNumber, context: &Header) -> i64 {
            if number == context.number {
                self.last_median
            } else {
                self.first_median
            }
        }
    }

    /// S3: Digishield clamp scenario from spec §8.
    #[test]
    fn digishield_clamp_scenario_s3() {
        let mut params = UbqhashParams::default();
        params.digishield_mod_block = BlockNumber::MAX;
        params.flux_block = BlockNumber::MAX;
        params.min_difficulty = U256::from(1);

        let chain = FakeChain {
            params,
            last_median: 5000,
            first_median: 0,
        };

        let mut parent = Header::default();
        parent.number = 1_000;
        parent.difficulty = U256::from(1_000_000u64);

        let difficulty = calc_difficulty(&chain, parent.time + 1, &parent);
        assert_eq!(difficulty, U256::from(862_342u64));
    }

    /// S7: Flux asymmetric clamp scenario from spec §8.
    #[test]
    fn flux_asymmetric_clamp_scenario_s7() {
        let mut params = UbqhashParams::default();
        params.digishield_mod_block = 0;
        params.flux_block = 0;
        params.min_difficulty = U256::from(1);

        // Force actual_raw below min_hard = 1848 * 997 / 1000 = 1842.
        let chain = FakeChain {
            params,
            last_median: 0,
            first_median: 100_000,
        };

        let mut parent = Header::default();
        parent.number = 1_000;
        parent.difficulty = U256::from(1_000_000u64);
        parent.time = 1_000_000;

        let header_time = parent.time + 200; // diffTime = 200 > 176
        let (min, _) = clamp_bounds(&FLUX_CONFIG);
        let actual_raw = dampened_actual_timespan(&chain, &parent, &FLUX_CONFIG);
        assert!(actual_raw < min, "fixture must exercise the below-min_hard branch");

        let difficulty = calc_difficulty(&chain, header_time, &parent);
        let min_soft = floor_div_i64(
            FLUX_CONFIG.target_timespan() * (FLUX_CONFIG.factor - FLUX_CONFIG.dampen),
            FLUX_CONFIG.factor,
        );
        let expected = finalize_difficulty(parent.difficulty, FLUX_CONFIG.target_timespan(), min_soft, U256::from(1));
        assert_eq!(difficulty, expected);
    }

    #[test]
    fn determinism() {
        let mut params = UbqhashParams::default();
        params.digishield_mod_block = BlockNumber::MAX;
        params.flux_block = BlockNumber::MAX;

        let chain = FakeChain { params, last_median: 3000, first_median: 500 };
        let mut parent = Header::default();
        parent.number = 500;
        parent.difficulty = U256::from(500_000u64);

        let a = calc_difficulty(&chain, 1000, &parent);
        let b = calc_difficulty(&chain, 1000, &parent);
        assert_eq!(a, b);
    }

    #[test]
    fn floor_bound_never_violated() {
        let mut params = UbqhashParams::default();
        params.digishield_mod_block = BlockNumber::MAX;
        params.flux_block = BlockNumber::MAX;
        params.min_difficulty = U256::from(131_072);

        let chain = FakeChain { params: params.clone(), last_median: 0, first_median: 1_000_000 };
        let mut parent = Header::default();
        parent.number = 1_000;
        parent.difficulty = U256::from(200_000u64);

        let difficulty = calc_difficulty(&chain, 1, &parent);
        assert!(difficulty >= params.min_difficulty);
    }
}
