use crate::block::Block;
use crate::config::ChainConfig;
use crate::error::Result;
use crate::storage::JsonStore;
use std::fmt;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// The ordered, hash-linked sequence of blocks, bound to its backing file.
///
/// There is always at least the genesis block. The chain is the only writer of
/// its file; two processes sharing one file will overwrite each other.
pub struct Chain {
    blocks: Vec<Block>,
    store: JsonStore,
}

/// First problem found by [`Chain::first_fault`], by position in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The block's stored hash no longer matches its fields.
    HashMismatch { position: usize },
    /// The block's `previous_hash` is not its predecessor's hash.
    BrokenLink { position: usize },
}

impl Fault {
    pub fn position(&self) -> usize {
        match self {
            Fault::HashMismatch { position } | Fault::BrokenLink { position } => *position,
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::HashMismatch { position } => {
                write!(f, "block {} does not match its stored hash", position)
            }
            Fault::BrokenLink { position } => {
                write!(f, "block {} does not link to block {}", position, position - 1)
            }
        }
    }
}

impl Chain {
    /// Load the chain at `config.storage_path`, or create and persist a
    /// genesis-only chain if no file exists yet.
    ///
    /// A file that exists but cannot be parsed is an error; it is never
    /// replaced by a fresh chain.
    pub fn open(config: &ChainConfig) -> Result<Self> {
        let store = JsonStore::new(&config.storage_path);
        let blocks = match store.load()? {
            Some(blocks) => {
                debug!(path = %store.path().display(), blocks = blocks.len(), "loaded chain");
                blocks
            }
            None => {
                let blocks = vec![Block::genesis()];
                store.save(&blocks)?;
                info!(path = %store.path().display(), hash = %blocks[0].hash(), "created genesis block");
                blocks
            }
        };
        Ok(Self { blocks, store })
    }

    /// Append `message` as a new tail block and persist the whole chain.
    ///
    /// If the write fails the block is dropped again, so memory never runs
    /// ahead of the file.
    pub fn append(&mut self, message: impl Into<String>) -> Result<&Block> {
        let block = Block::new(self.blocks.len() as u64, message, self.tail().hash());
        self.blocks.push(block);

        if let Err(e) = self.store.save(&self.blocks) {
            self.blocks.pop();
            error!(error = %e, "append rolled back");
            return Err(e);
        }

        let tail = self.tail();
        info!(index = tail.index(), hash = %tail.hash(), "appended block");
        Ok(tail)
    }

    /// `true` if every block after genesis matches its hash and links to its
    /// predecessor.
    pub fn validate(&self) -> bool {
        match self.first_fault() {
            Some(fault) => {
                warn!(%fault, "chain validation failed");
                false
            }
            None => true,
        }
    }

    /// Scan from position 1 and report the first broken block, if any.
    /// Genesis is only checked as the target of block 1's link.
    pub fn first_fault(&self) -> Option<Fault> {
        self.blocks
            .windows(2)
            .enumerate()
            .find_map(|(i, pair)| {
                let (previous, current) = (&pair[0], &pair[1]);
                let position = i + 1;
                if !current.verify() {
                    Some(Fault::HashMismatch { position })
                } else if current.previous_hash() != previous.hash() {
                    Some(Fault::BrokenLink { position })
                } else {
                    None
                }
            })
    }

    /// Human-readable listing of every block in chain order.
    pub fn render(&self) -> String {
        self.to_string()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always `false` for an opened chain.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn tail(&self) -> &Block {
        // open() never yields an empty chain and append() only grows it
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn storage_path(&self) -> &Path {
        self.store.path()
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "Index: {}", block.index())?;
            writeln!(f, "Message: {}", block.message())?;
            writeln!(f, "Timestamp: {}", block.timestamp())?;
            writeln!(f, "Hash: {}", block.hash())?;
            writeln!(f, "Previous Hash: {}", block.previous_hash())?;
        }
        Ok(())
    }
}
