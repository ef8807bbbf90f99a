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

//! A block-header consensus engine for a Ubiq-style proof-of-work chain:
//! Ubqhash difficulty retargeting (Digishield-v3 and Flux), header and
//! uncle validation, Ethash-family seal verification, batch verification
//! with ordered result emission, and reward accumulation at finalization.
//!
//! The core never owns header storage, transaction execution, networking
//! or DAG generation; those are supplied by the collaborators in
//! [`chain`].

pub mod arith;
pub mod batch;
pub mod chain;
pub mod difficulty;
pub mod engine;
pub mod error;
pub mod params;
pub mod pow_mode;
pub mod reward;
pub mod seal;
pub mod sealhash;
pub mod types;
pub mod uncles;
pub mod validator;

pub use batch::{verify_headers, BatchHandle};
pub use chain::{ChainReader, DatasetLike, HashimotoProvider, ResourceGuard, StateDb};
pub use difficulty::calc_difficulty;
pub use engine::Engine;
pub use error::ConsensusError;
pub use params::{MonetaryPolicyStep, UbqhashParams};
pub use pow_mode::PowMode;
pub use sealhash::seal_hash;
pub use types::{Block, BlockNumber, Header, HeaderBuilder};
pub use uncles::verify_uncles;
pub use validator::{header_hash, verify_header, verify_header_entry, HeaderOutcome};
