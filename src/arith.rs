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

//! Arithmetic primitives shared by the difficulty engine and seal verifier
//! (spec §4.A).
//!
//! Intermediate timespan math (dampening, clamping) is signed and may go
//! negative before clamping; see SPEC_FULL.md §4.A for why this is done in
//! `i64` rather than a signed arbitrary-precision type. Difficulty/target
//! math stays in `U256` throughout.

use ethereum_types::{H256, U256};

/// Floor division (rounds toward negative infinity), matching the
/// reference chain's big-integer division semantics for a possibly
/// negative dividend and a strictly positive divisor.
///
/// `i64::div_euclid` already rounds toward negative infinity whenever the
/// divisor is positive, which is the only case the difficulty engine ever
/// divides by (4 for dampening, or a positive `Factor`-derived denominator).
pub fn floor_div_i64(dividend: i64, divisor: i64) -> i64 {
    debug_assert!(divisor > 0, "difficulty-engine divisors are always positive");
    dividend.div_euclid(divisor)
}

/// `floor(2**256 / x)`, the self-inverse boundary/difficulty/target
/// conversion used by both the difficulty engine's minimum-difficulty floor
/// and the seal verifier's target check.
///
/// By convention (matching the reference chain), `x <= 1` maps to
/// `U256::max_value()` rather than overflowing.
pub fn two_pow_256_div(x: U256) -> U256 {
    if x <= U256::one() {
        U256::max_value()
    } else {
        ((U256::one() << 255) / x) << 1
    }
}

/// Reads a 32-byte hashimoto result as a big-endian `U256` (`be_u256`).
pub fn be_u256(bytes: &[u8; 32]) -> U256 {
    U256::from_big_endian(bytes)
}

/// `floor(2**256 / difficulty)`, the PoW target a sealed header's hashimoto
/// result must not exceed (spec §4.E step 4).
pub fn target_for_difficulty(difficulty: U256) -> U256 {
    two_pow_256_div(difficulty)
}

/// Converts a hashimoto boundary digest back to the difficulty it
/// satisfies; used by quick/basic verification paths that only have the
/// boundary, not the full light/full hashimoto result.
pub fn boundary_to_difficulty(boundary: &H256) -> U256 {
    two_pow_256_div(U256::from(boundary.as_bytes()))
}
