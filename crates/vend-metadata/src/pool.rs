//! The three-state metadata pool.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use rand::seq::SliceRandom;
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use vend_types::{PolicyId, TxId};

use crate::error::PoolError;
use crate::item::{NftItem, CIP25_LABEL};

/// Name of the advisory lock file inside the available directory.
const LOCK_FILE: &str = ".pool.lock";

/// A set of items moved into the locked state by one reservation.
///
/// Held by exactly one cycle; ends in either `finalize` or `release`.
#[derive(Debug)]
pub struct ReservedBatch {
    pub items: Vec<NftItem>,
}

impl ReservedBatch {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Distinct policies represented in the batch.
    pub fn num_policies(&self) -> usize {
        let mut policies: Vec<&PolicyId> = self.items.iter().map(|i| &i.policy).collect();
        policies.sort();
        policies.dedup();
        policies.len()
    }

    /// Total character length of every asset name, the storage-cost proxy
    /// the rebate is computed from.
    pub fn total_name_chars(&self) -> usize {
        self.items.iter().map(|i| i.asset_name.len()).sum()
    }

    /// Merges every item fragment into one CIP-25 document.
    pub fn render_document(&self) -> Value {
        let mut policies: Map<String, Value> = Map::new();
        for item in &self.items {
            let entry = policies
                .entry(item.policy.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(assets) = entry {
                assets.insert(item.asset_name.clone(), item.attributes.clone());
            }
        }
        json!({ CIP25_LABEL: Value::Object(policies) })
    }
}

/// Directory-backed reservation store.
pub struct MetadataPool {
    available_dir: PathBuf,
    locked_dir: PathBuf,
    minted_dir: PathBuf,
    /// Advisory lock held for the pool's lifetime.
    _lock: File,
}

impl MetadataPool {
    /// Opens the pool, creating the state directories if needed and taking
    /// the exclusive pool lock.
    pub fn open(
        available_dir: impl Into<PathBuf>,
        locked_dir: impl Into<PathBuf>,
        minted_dir: impl Into<PathBuf>,
    ) -> Result<Self, PoolError> {
        let available_dir = available_dir.into();
        let locked_dir = locked_dir.into();
        let minted_dir = minted_dir.into();
        fs::create_dir_all(&available_dir)?;
        fs::create_dir_all(&locked_dir)?;
        fs::create_dir_all(&minted_dir)?;

        let lock_path = available_dir.join(LOCK_FILE);
        let lock = File::create(&lock_path)?;
        lock.try_lock_exclusive()
            .map_err(|_| PoolError::LockHeld(available_dir.clone()))?;

        Ok(Self {
            available_dir,
            locked_dir,
            minted_dir,
            _lock: lock,
        })
    }

    /// File names of every available item, in stable lexicographic order.
    fn list_available(&self) -> Result<Vec<String>, PoolError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.available_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".json") {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn available_count(&self) -> Result<usize, PoolError> {
        Ok(self.list_available()?.len())
    }

    /// Parses every available item, rejecting malformed files and items
    /// under policies this machine cannot sign for. Returns the item count.
    pub fn validate(&self, allowed: &[PolicyId]) -> Result<usize, PoolError> {
        let names = self.list_available()?;
        for name in &names {
            let path = self.available_dir.join(name);
            let item = NftItem::parse(&path)?;
            if !allowed.contains(&item.policy) {
                return Err(PoolError::UnknownPolicy {
                    path,
                    policy: item.policy.to_string(),
                });
            }
        }
        info!("[metadata] validated {} available items", names.len());
        Ok(names.len())
    }

    /// Moves `count` items into the locked state and returns them.
    ///
    /// Selection is lexicographic or uniform-random per `randomize`. A
    /// rename lost to a concurrent claimant (file already gone) is skipped
    /// rather than retried, so two reservations can never overlap.
    pub fn reserve(&self, count: usize, randomize: bool) -> Result<ReservedBatch, PoolError> {
        let mut names = self.list_available()?;
        if randomize {
            names.shuffle(&mut rand::thread_rng());
        }

        let mut claimed: Vec<NftItem> = Vec::with_capacity(count);
        for name in names {
            if claimed.len() == count {
                break;
            }
            let from = self.available_dir.join(&name);
            let to = self.locked_dir.join(&name);
            match fs::rename(&from, &to) {
                Ok(()) => match NftItem::parse(&to) {
                    Ok(item) => claimed.push(item),
                    Err(err) => {
                        self.release(ReservedBatch { items: claimed }, None)?;
                        let _ = fs::rename(&to, &from);
                        return Err(err);
                    }
                },
                // Lost the claim race; the item belongs to someone else.
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    self.release(ReservedBatch { items: claimed }, None)?;
                    return Err(e.into());
                }
            }
        }

        if claimed.len() < count {
            let available = claimed.len();
            self.release(ReservedBatch { items: claimed }, None)?;
            return Err(PoolError::Insufficient {
                requested: count,
                available,
            });
        }

        debug!("[metadata] reserved {} items", claimed.len());
        Ok(ReservedBatch { items: claimed })
    }

    /// Writes the merged CIP-25 document for the batch, keyed by the
    /// payment transaction id. The document is part of the transaction
    /// being assembled, so it exists before the items are finalized.
    pub fn stage_document(
        &self,
        batch: &ReservedBatch,
        payment: &TxId,
    ) -> Result<PathBuf, PoolError> {
        let path = self.minted_dir.join(format!("{payment}.json"));
        let doc = batch.render_document();
        let body = serde_json::to_vec_pretty(&doc).map_err(|e| PoolError::Malformed {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        fs::write(&path, body)?;
        Ok(path)
    }

    /// Returns a reserved batch to the available pool. The abort path for
    /// any failure between reservation and submission.
    pub fn release(
        &self,
        batch: ReservedBatch,
        staged_document: Option<&Path>,
    ) -> Result<(), PoolError> {
        for item in &batch.items {
            let from = self.locked_dir.join(&item.file_name);
            let to = self.available_dir.join(&item.file_name);
            fs::rename(&from, &to)?;
        }
        if let Some(doc) = staged_document {
            // Best effort; a stale staged document is harmless.
            let _ = fs::remove_file(doc);
        }
        if !batch.is_empty() {
            debug!("[metadata] released {} items", batch.len());
        }
        Ok(())
    }

    /// Marks a batch consumed after successful submission. Irreversible:
    /// item files move to the minted directory next to the staged document.
    pub fn finalize(&self, batch: ReservedBatch) -> Result<(), PoolError> {
        for item in &batch.items {
            let from = self.locked_dir.join(&item.file_name);
            let to = self.minted_dir.join(&item.file_name);
            fs::rename(&from, &to)?;
        }
        info!("[metadata] finalized {} items", batch.len());
        Ok(())
    }
}
