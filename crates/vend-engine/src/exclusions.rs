//! Durable record of payments that must never be processed again.
//!
//! One transaction id per line, appended on every terminal outcome (vended
//! or permanently rejected) and replayed in full at startup. The file is
//! the machine's double-mint firewall across restarts.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use tracing::{info, warn};
use vend_types::TxId;

pub struct ExclusionSet {
    ids: HashSet<TxId>,
    path: PathBuf,
    log: File,
}

impl ExclusionSet {
    /// Opens the exclusion log, replaying every recorded id. Lines that do
    /// not parse as transaction ids are skipped with a warning rather than
    /// refusing startup.
    pub fn open(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let mut ids = HashSet::new();
        if path.exists() {
            for line in BufReader::new(File::open(&path)?).lines() {
                let line = line?;
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match TxId::new(line) {
                    Ok(id) => {
                        ids.insert(id);
                    }
                    Err(_) => warn!("[exclusions] skipping malformed line {line:?}"),
                }
            }
        }
        let log = OpenOptions::new().create(true).append(true).open(&path)?;
        info!("[exclusions] replayed {} excluded payments", ids.len());
        Ok(Self { ids, path, log })
    }

    pub fn contains(&self, id: &TxId) -> bool {
        self.ids.contains(id)
    }

    /// Records a terminal outcome. The in-memory set is updated even when
    /// the append fails, so the running process stays protected; the error
    /// still propagates because the durable record did not.
    pub fn insert(&mut self, id: TxId) -> std::io::Result<()> {
        if !self.ids.insert(id.clone()) {
            return Ok(());
        }
        let write = writeln!(self.log, "{id}").and_then(|()| self.log.flush());
        if write.is_err() {
            warn!("[exclusions] failed to persist {id} to {}", self.path.display());
        }
        write
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &HashSet<TxId> {
        &self.ids
    }
}
