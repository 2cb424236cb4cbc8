//! A local, single-writer, tamper-evident message log.
//!
//! Every [`block::Block`] carries the SHA-256 hash of its predecessor, the whole
//! sequence is rewritten to a JSON file on each append, and
//! [`chain::Chain::validate`] re-derives every link on demand.

pub mod block;
pub mod chain;
pub mod config;
pub mod error;
pub mod logging;
pub mod storage;

pub use block::Block;
pub use chain::{Chain, Fault};
pub use config::ChainConfig;
pub use error::{ChainError, Result};
