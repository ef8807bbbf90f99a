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

//! Uncle-set validation (spec §4.D): recency, uniqueness, non-ancestry, and
//! recursive header validity.

use std::collections::{HashMap, HashSet};

use ethereum_types::H256;

use crate::chain::{ChainReader, HashimotoProvider};
use crate::error::ConsensusError;
use crate::pow_mode::PowMode;
use crate::types::Header;
use crate::validator::{header_hash, verify_header};

/// `VerifyUncles(chain, block)`.
///
/// Uncles are processed in the order they appear in `block.uncles`
/// (spec §5 ordering guarantee); `DuplicateUncle` refers to the first
/// earlier occurrence found by insertion order, including past blocks'
/// uncles already folded into `past_uncles`. Every uncle's seal is
/// re-verified unconditionally through `mode` (spec §4.D step 4): the
/// recursive header check, including the seal, is what makes cheap uncle
/// forgery impossible — an uncle with a bogus `mix_digest`/`nonce` is
/// rejected here even though it would otherwise pass every structural and
/// ancestry check.
pub fn verify_uncles<P: HashimotoProvider>(
    chain: &dyn ChainReader,
    block_header: &Header,
    uncles: &[Header],
    mode: &PowMode<P>,
) -> Result<(), ConsensusError> {
    let config = chain.config();
    if uncles.len() > config.max_uncles {
        return Err(ConsensusError::TooManyUncles { found: uncles.len(), max: config.max_uncles });
    }

    let block_hash = header_hash(block_header);
    let (ancestors, mut past_uncles) = collect_ancestry(chain, block_header, block_hash, config.max_uncle_generations);

    for uncle in uncles {
        let uncle_hash = header_hash(uncle);

        if past_uncles.contains(&uncle_hash) {
            return Err(ConsensusError::DuplicateUncle(uncle_hash));
        }
        past_uncles.insert(uncle_hash);

        if ancestors.contains_key(&uncle_hash) {
            return Err(ConsensusError::UncleIsAncestor(uncle_hash));
        }

        // Preserved verbatim from the reference chain (see DESIGN.md Open
        // Questions): an uncle whose parent is the containing block's own
        // parent is rejected as "dangling" even though it would otherwise
        // pass the ancestry check, forbidding siblings of the containing
        // block from being claimed as its uncles.
        let parent = match ancestors.get(&uncle.parent_hash) {
            Some(_) if uncle.parent_hash == block_header.parent_hash => None,
            Some(parent) => Some(parent),
            None => None,
        };
        let parent = match parent {
            Some(p) => p,
            None => return Err(ConsensusError::DanglingUncle(uncle_hash)),
        };

        verify_header(chain, uncle, parent, true, 0)?;
        mode.verify_seal(uncle)?;
    }

    Ok(())
}

/// Builds the `hash -> header` map of up to `max_generations` ancestors of
/// `block_header` (plus `block_header` itself), and the set of uncle
/// hashes already referenced by any of those ancestors (plus the
/// containing block's own hash).
fn collect_ancestry(
    chain: &dyn ChainReader,
    block_header: &Header,
    block_hash: H256,
    max_generations: usize,
) -> (HashMap<H256, Header>, HashSet<H256>) {
    let mut ancestors = HashMap::new();
    let mut past_uncles = HashSet::new();

    ancestors.insert(block_hash, block_header.clone());
    past_uncles.insert(block_hash);

    let mut current_hash = block_header.parent_hash;
    let mut current_number = block_header.number.saturating_sub(1);

    for _ in 0..max_generations {
        let ancestor = match chain.get_header(current_hash, current_number) {
            Some(h) => h,
            None => break,
        };
        if let Some(block) = chain.get_block(current_hash, current_number) {
            for uncle in &block.uncles {
                past_uncles.insert(header_hash(uncle));
            }
        }

        let ancestor_hash = current_hash;
        let parent_hash = ancestor.parent_hash;
        let parent_number = ancestor.number.saturating_sub(1);
        ancestors.insert(ancestor_hash, ancestor);

        if current_number == 0 {
            break;
        }
        current_hash = parent_hash;
        current_number = parent_number;
    }

    (ancestors, past_uncles)
}
