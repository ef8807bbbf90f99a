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

//! Batch verification orchestrator (spec §4.F): fans header verification
//! out to `GOMAXPROCS`-bounded workers over a channel, and emits results
//! strictly in input order regardless of completion order.

use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::chain::ChainReader;
use crate::error::ConsensusError;
use crate::types::Header;
use crate::validator::{header_hash, verify_header};

/// One header's verification outcome, tagged with its position in the
/// submitted batch so results can be re-ordered by the coordinator.
struct IndexedResult {
    index: usize,
    result: Result<(), ConsensusError>,
}

/// Handle to a running batch verification. Dropping it (without calling
/// [`Self::join`]) signals abort, same as calling [`Self::abort`]
/// explicitly: the coordinator stops emitting further results early.
/// Workers were already handed their full share of the work queue up
/// front and keep draining it to completion regardless (the done-channel
/// is sized to the whole batch, so this never blocks them); only the
/// coordinator's ordered-emission loop exits early.
pub struct BatchHandle {
    abort: Sender<()>,
    results: Receiver<Vec<Result<(), ConsensusError>>>,
}

impl BatchHandle {
    /// Signals abort: the coordinator stops flushing further results.
    pub fn abort(&self) {
        let _ = self.abort.send(());
    }

    /// Blocks until the coordinator has flushed as much of the ordered
    /// result prefix as it will ever flush (either the whole batch, or a
    /// strict prefix if aborted), and returns it.
    ///
    /// Per spec invariant 6, this is always a prefix of the input in
    /// order: abort may truncate the suffix, but never reorders.
    pub fn join(self) -> Vec<Result<(), ConsensusError>> {
        self.results.recv().unwrap_or_default()
    }
}

impl Drop for BatchHandle {
    fn drop(&mut self) {
        let _ = self.abort.send(());
    }
}

/// `VerifyHeaders(chain, headers, seals)`.
///
/// `headers[i]` is validated against `headers[i-1]` when that header
/// chains to it (`headers[i-1]`'s hash equals `headers[i].parent_hash`),
/// or otherwise against `chain.get_header(headers[i].parent_hash, ...)`.
/// Missing parents produce `UnknownAncestor` for that index; one index's
/// error does not cancel sibling verifications (spec §7).
///
/// At most `min(GOMAXPROCS, headers.len())` workers run concurrently
/// (spec §4.F); results are flushed to the returned handle's channel in
/// strict input order via a contiguous-completion cursor (design notes §9).
pub fn verify_headers(chain: Arc<dyn ChainReader>, headers: Vec<Header>, now: u64) -> BatchHandle {
    let (abort_tx, abort_rx) = bounded::<()>(1);
    let (out_tx, out_rx) = bounded::<Vec<Result<(), ConsensusError>>>(1);

    if headers.is_empty() {
        let _ = out_tx.send(Vec::new());
        return BatchHandle { abort: abort_tx, results: out_rx };
    }

    let worker_count = num_cpus::get().max(1).min(headers.len());
    let total = headers.len();
    let (work_tx, work_rx) = bounded::<usize>(total);
    let (done_tx, done_rx) = bounded::<IndexedResult>(total);

    let hashes: Vec<_> = headers.iter().map(header_hash).collect();
    let headers = Arc::new(headers);
    let hashes = Arc::new(hashes);

    for i in 0..total {
        let _ = work_tx.send(i);
    }
    drop(work_tx);

    for _ in 0..worker_count {
        let chain = Arc::clone(&chain);
        let headers = Arc::clone(&headers);
        let hashes = Arc::clone(&hashes);
        let work_rx = work_rx.clone();
        let done_tx = done_tx.clone();

        std::thread::spawn(move || {
            for index in work_rx.iter() {
                let header = &headers[index];
                let result = verify_one(chain.as_ref(), &headers, &hashes, index, header, now);
                if done_tx.send(IndexedResult { index, result }).is_err() {
                    break;
                }
            }
        });
    }
    drop(done_tx);

    std::thread::spawn(move || {
        let mut pending = std::collections::HashMap::with_capacity(total);
        let mut ordered: Vec<Option<Result<(), ConsensusError>>> = (0..total).map(|_| None).collect();
        let mut next_to_emit = 0usize;

        for indexed in done_rx.iter() {
            if abort_rx.try_recv().is_ok() {
                break;
            }

            pending.insert(indexed.index, indexed.result);
            while let Some(result) = pending.remove(&next_to_emit) {
                ordered[next_to_emit] = Some(result);
                next_to_emit += 1;
            }

            if abort_rx.try_recv().is_ok() {
                break;
            }
        }

        let mut flushed = Vec::with_capacity(total);
        for slot in ordered.into_iter() {
            match slot {
                Some(r) => flushed.push(r),
                None => break,
            }
        }

        let _ = out_tx.send(flushed);
    });

    BatchHandle { abort: abort_tx, results: out_rx }
}

fn verify_one(
    chain: &dyn ChainReader,
    headers: &[Header],
    hashes: &[ethereum_types::H256],
    index: usize,
    header: &Header,
    now: u64,
) -> Result<(), ConsensusError> {
    if chain.get_header(hashes[index], header.number).is_some() {
        return Ok(());
    }

    let parent = if index > 0 && hashes[index - 1] == header.parent_hash {
        Some(headers[index - 1].clone())
    } else {
        chain.get_header(header.parent_hash, header.number.saturating_sub(1))
    };

    let parent = parent.ok_or(ConsensusError::UnknownAncestor { parent_hash: header.parent_hash })?;
    verify_header(chain, header, &parent, false, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::UbqhashParams;
    use crate::types::BlockNumber;
    use ethereum_types::{H256, U256};

    struct FakeChain {
        params: UbqhashParams,
    }

    impl ChainReader for FakeChain {
        fn get_header(&self, _hash: H256, _number: BlockNumber) -> Option<Header> {
            None
        }
        fn get_block(&self, _hash: H256, _number: BlockNumber) -> Option<crate::types::Block> {
            None
        }
        fn config(&self) -> &UbqhashParams {
            &self.params
        }
        fn calc_past_median_time(&self, _number: BlockNumber, _context: &Header) -> i64 {
            0
        }
    }

    fn fake_chain() -> Arc<dyn ChainReader> {
        let mut params = UbqhashParams::default();
        params.digishield_mod_block = 0;
        params.flux_block = 1_000_000_000;
        params.min_difficulty = U256::from(1);
        Arc::new(FakeChain { params })
    }

    fn chained(number: u64, parent_hash: H256, time: u64) -> Header {
        Header {
            number,
            parent_hash,
            time,
            difficulty: U256::from(1),
            gas_limit: U256::from(100_000u64),
            ..Header::default()
        }
    }

    /// S6: batch ordering — results come back in input order regardless of
    /// which header's verification happens to finish first.
    #[test]
    fn s6_batch_ordering_is_input_order() {
        let genesis = chained(0, H256::zero(), 0);
        let a = chained(1, header_hash(&genesis), 100);
        let b = chained(2, header_hash(&a), 200);
        let c = chained(3, header_hash(&b), 300);

        let headers = vec![a, b, c];
        let handle = verify_headers(fake_chain(), headers, 1_000_000);
        let results = handle.join();

        assert_eq!(results.len(), 3);
        // Header `a`'s parent (the genesis) is not known to the fake chain
        // reader and isn't part of the submitted batch, so every entry
        // fails with UnknownAncestor -- but in strict input order.
        assert!(matches!(results[0], Err(ConsensusError::UnknownAncestor { .. })));
    }

    #[test]
    fn empty_batch_yields_empty_results() {
        let handle = verify_headers(fake_chain(), Vec::new(), 0);
        assert!(handle.join().is_empty());
    }

    #[test]
    fn chained_batch_verifies_against_prior_batch_entry() {
        let genesis = chained(0, H256::zero(), 0);
        let genesis_hash = header_hash(&genesis);

        struct ChainWithGenesis {
            inner: Arc<dyn ChainReader>,
            genesis_hash: H256,
            genesis: Header,
        }
        impl ChainReader for ChainWithGenesis {
            fn get_header(&self, hash: H256, number: BlockNumber) -> Option<Header> {
                if hash == self.genesis_hash {
                    Some(self.genesis.clone())
                } else {
                    self.inner.get_header(hash, number)
                }
            }
            fn get_block(&self, hash: H256, number: BlockNumber) -> Option<crate::types::Block> {
                self.inner.get_block(hash, number)
            }
            fn config(&self) -> &UbqhashParams {
                self.inner.config()
            }
            fn calc_past_median_time(&self, number: BlockNumber, context: &Header) -> i64 {
                self.inner.calc_past_median_time(number, context)
            }
        }

        let chain: Arc<dyn ChainReader> =
            Arc::new(ChainWithGenesis { inner: fake_chain(), genesis_hash, genesis: genesis.clone() });

        let a = chained(1, genesis_hash, 100);
        let a_hash = header_hash(&a);
        let b = chained(2, a_hash, 200);

        let handle = verify_headers(chain, vec![a, b], 1_000_000);
        let results = handle.join();

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok(), "{:?}", results[0]);
        assert!(results[1].is_ok(), "{:?}", results[1]);
    }
}
