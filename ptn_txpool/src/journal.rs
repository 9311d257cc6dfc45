//! Append-only journal of locally-submitted transactions.
//!
//! One JSON transaction per line. Replayed on startup so local transactions
//! survive restarts, and rewritten (rotated) periodically to shed entries
//! that have since been committed or dropped.

use crate::TxPoolError;
use ptn_types::Transaction;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use tracing::{info, warn};

/// File-backed local transaction journal.
pub struct TxJournal {
    path: PathBuf,
}

impl TxJournal {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Replay the journal through `add`, counting how many entries loaded.
    ///
    /// Unparsable lines and entries the pool rejects are skipped with a
    /// warning; a missing file is simply an empty journal.
    pub fn load<F>(&self, mut add: F) -> Result<usize, TxPoolError>
    where
        F: FnMut(Transaction) -> Result<(), TxPoolError>,
    {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(err.into()),
        };

        let mut loaded = 0usize;
        let mut dropped = 0usize;
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let tx: Transaction = match serde_json::from_str(&line) {
                Ok(tx) => tx,
                Err(err) => {
                    warn!(%err, "skipping unparsable journal entry");
                    dropped += 1;
                    continue;
                }
            };
            match add(tx) {
                Ok(()) => loaded += 1,
                Err(err) => {
                    warn!(%err, "journal transaction rejected on replay");
                    dropped += 1;
                }
            }
        }
        info!(loaded, dropped, "loaded local transaction journal");
        Ok(loaded)
    }

    /// Append one transaction.
    pub fn insert(&self, tx: &Transaction) -> Result<(), TxPoolError> {
        let line =
            serde_json::to_string(tx).map_err(|e| TxPoolError::Serialization(e.to_string()))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// Atomically rewrite the journal with the surviving local transactions.
    pub fn rotate(&self, txs: &[Transaction]) -> Result<(), TxPoolError> {
        let tmp = self.path.with_extension("new");
        {
            let mut file = File::create(&tmp)?;
            for tx in txs {
                let line = serde_json::to_string(tx)
                    .map_err(|e| TxPoolError::Serialization(e.to_string()))?;
                writeln!(file, "{line}")?;
            }
        }
        fs::rename(&tmp, &self.path)?;
        info!(count = txs.len(), "regenerated local transaction journal");
        Ok(())
    }
}
