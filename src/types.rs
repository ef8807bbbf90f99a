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

//! The header/block data model (spec §3).

use ethereum_types::{Address, Bloom, H256, H64, U256};

/// Block height. Ubiq, like Ethereum, indexes blocks by a 64-bit height.
pub type BlockNumber = u64;

/// A block header, restricted to the fields the consensus core consumes.
///
/// Headers are immutable once constructed; use [`HeaderBuilder`] to build
/// one, or `.clone()` an existing header and rebuild via the builder for
/// test fixtures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub parent_hash: H256,
    pub uncle_hash: H256,
    pub coinbase: Address,
    pub state_root: H256,
    pub tx_root: H256,
    pub receipt_root: H256,
    pub bloom: Bloom,
    pub difficulty: U256,
    pub number: BlockNumber,
    pub gas_limit: U256,
    pub gas_used: U256,
    pub time: u64,
    pub extra: Vec<u8>,
    pub mix_digest: H256,
    pub nonce: H64,
}

impl Header {
    /// Returns a builder seeded with this header's current field values.
    pub fn rebuild(&self) -> HeaderBuilder {
        HeaderBuilder { header: self.clone() }
    }

    /// The miner address credited with block/uncle rewards (`Author`).
    pub fn author(&self) -> Address {
        self.coinbase
    }
}

impl Default for Header {
    fn default() -> Self {
        Header {
            parent_hash: H256::zero(),
            uncle_hash: H256::zero(),
            coinbase: Address::zero(),
            state_root: H256::zero(),
            tx_root: H256::zero(),
            receipt_root: H256::zero(),
            bloom: Bloom::zero(),
            difficulty: U256::zero(),
            number: 0,
            gas_limit: U256::zero(),
            gas_used: U256::zero(),
            time: 0,
            extra: Vec::new(),
            mix_digest: H256::zero(),
            nonce: H64::zero(),
        }
    }
}

/// Builder for [`Header`]; used by block preparation (`Prepare`) and by
/// test fixtures, mirroring the teacher's setter-style `Header::new()` +
/// `set_*` construction without carrying over its mutable-cache/dirty-bit
/// machinery (this crate has no RLP-framed header cache to invalidate).
#[derive(Debug, Clone, Default)]
pub struct HeaderBuilder {
    header: Header,
}

impl HeaderBuilder {
    pub fn new() -> Self {
        HeaderBuilder::default()
    }

    pub fn parent_hash(mut self, v: H256) -> Self {
        self.header.parent_hash = v;
        self
    }

    pub fn uncle_hash(mut self, v: H256) -> Self {
        self.header.uncle_hash = v;
        self
    }

    pub fn coinbase(mut self, v: Address) -> Self {
        self.header.coinbase = v;
        self
    }

    pub fn state_root(mut self, v: H256) -> Self {
        self.header.state_root = v;
        self
    }

    pub fn tx_root(mut self, v: H256) -> Self {
        self.header.tx_root = v;
        self
    }

    pub fn receipt_root(mut self, v: H256) -> Self {
        self.header.receipt_root = v;
        self
    }

    pub fn bloom(mut self, v: Bloom) -> Self {
        self.header.bloom = v;
        self
    }

    pub fn difficulty(mut self, v: U256) -> Self {
        self.header.difficulty = v;
        self
    }

    pub fn number(mut self, v: BlockNumber) -> Self {
        self.header.number = v;
        self
    }

    pub fn gas_limit(mut self, v: U256) -> Self {
        self.header.gas_limit = v;
        self
    }

    pub fn gas_used(mut self, v: U256) -> Self {
        self.header.gas_used = v;
        self
    }

    pub fn time(mut self, v: u64) -> Self {
        self.header.time = v;
        self
    }

    pub fn extra(mut self, v: Vec<u8>) -> Self {
        self.header.extra = v;
        self
    }

    pub fn mix_digest(mut self, v: H256) -> Self {
        self.header.mix_digest = v;
        self
    }

    pub fn nonce(mut self, v: H64) -> Self {
        self.header.nonce = v;
        self
    }

    pub fn build(self) -> Header {
        self.header
    }
}

/// A header together with its uncle list. Transaction/receipt lists are out
/// of scope (spec §1 non-goals exclude transaction execution), so `Block`
/// carries only what header/uncle validation and finalization need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub header: Header,
    pub uncles: Vec<Header>,
}

impl Block {
    pub fn new(header: Header, uncles: Vec<Header>) -> Self {
        Block { header, uncles }
    }
}
