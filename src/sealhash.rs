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

//! Seal-hash composition (spec §4.A): Keccak-256 of the RLP-encoded 13-tuple
//! of header fields, excluding the seal fields (`mix_digest`, `nonce`) so
//! the hash is stable across mining attempts.

use ethereum_types::H256;
use rlp::RlpStream;
use tiny_keccak::{Hasher, Keccak};

use crate::types::Header;

/// Computes `SealHash(header)`.
///
/// Deliberately mirrors the field order in spec §4.A: parent_hash,
/// uncle_hash, coinbase, state_root, tx_root, receipt_root, bloom,
/// difficulty, number, gas_limit, gas_used, time, extra.
pub fn seal_hash(header: &Header) -> H256 {
    let mut stream = RlpStream::new_list(13);
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
        .append(&header.extra);

    keccak256(stream.out().as_ref())
}

/// Keccak-256 of an arbitrary byte string.
pub fn keccak256(data: &[u8]) -> H256 {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    H256::from(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethereum_types::H64;

    #[test]
    fn seal_hash_excludes_nonce_and_mix_digest() {
        let base = Header {
            number: 42,
            ..Header::default()
        };

        let mut a = base.clone();
        a.mix_digest = H256::repeat_byte(0xaa);
        a.nonce = H64::repeat_byte(0x11);

        let mut b = base;
        b.mix_digest = H256::repeat_byte(0xbb);
        b.nonce = H64::repeat_byte(0x22);

        assert_eq!(seal_hash(&a), seal_hash(&b));
    }

    #[test]
    fn seal_hash_changes_with_covered_fields() {
        let a = Header {
            number: 1,
            ..Header::default()
        };
        let b = Header {
            number: 2,
            ..Header::default()
        };
        assert_ne!(seal_hash(&a), seal_hash(&b));
    }
}
