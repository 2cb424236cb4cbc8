use crate::block::{Block, GENESIS_PREVIOUS_HASH};
use crate::error::{ChainError, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Whole-file JSON store for a chain.
///
/// The file holds one array of block records in chain order. Every save
/// rewrites the full array into a temp file next to the target and renames it
/// into place, so a crash leaves either the old or the new file, never half of one.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted chain. `Ok(None)` if the file does not exist.
    ///
    /// Stored hashes are taken as-is; nothing is recomputed here. Any other
    /// read or parse problem, or records that do not start at a genesis block
    /// and count up by one, is a `LoadFailed`.
    pub fn load(&self) -> Result<Option<Vec<Block>>> {
        let data = match fs::read(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.load_failed(e.to_string())),
        };
        let blocks: Vec<Block> =
            serde_json::from_slice(&data).map_err(|e| self.load_failed(e.to_string()))?;
        check_shape(&blocks).map_err(|reason| self.load_failed(reason))?;
        Ok(Some(blocks))
    }

    /// Replace the persisted chain with `blocks`.
    pub fn save(&self, blocks: &[Block]) -> Result<()> {
        self.write_atomic(blocks)
            .map_err(|source| ChainError::Persist {
                path: self.path.clone(),
                source,
            })
    }

    fn write_atomic(&self, blocks: &[Block]) -> io::Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut ser =
                serde_json::Serializer::with_formatter(&mut tmp, PrettyFormatter::with_indent(b"    "));
            blocks.serialize(&mut ser)?;
        }
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn load_failed(&self, reason: String) -> ChainError {
        ChainError::LoadFailed {
            path: self.path.clone(),
            reason,
        }
    }
}

fn check_shape(blocks: &[Block]) -> std::result::Result<(), String> {
    let genesis = blocks.first().ok_or_else(|| "no blocks recorded".to_string())?;
    if genesis.previous_hash != GENESIS_PREVIOUS_HASH {
        return Err(format!(
            "first record has previous_hash {:?}, expected {:?}",
            genesis.previous_hash, GENESIS_PREVIOUS_HASH
        ));
    }
    for (position, block) in blocks.iter().enumerate() {
        if block.index != position as u64 {
            return Err(format!("record {} carries index {}", position, block.index));
        }
    }
    Ok(())
}
