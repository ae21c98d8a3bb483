//! Notification ledgers.
//!
//! A ledger records which `(sheet, date)` pairs a check has already alerted
//! on, keyed `"<sheet>|<M月D日>"`. Ledgers only grow: saving unions the
//! in-memory entries over whatever is on disk and never deletes.
//!
//! Each check owns its own ledger; presence in one ledger says nothing about
//! another.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use fd_lock::{RwLock, RwLockWriteGuard};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{AlertError, Result};

/// Builds the ledger key for a sheet and date label.
#[must_use]
pub fn ledger_key(sheet: &str, date: &str) -> String {
    format!("{sheet}|{date}")
}

/// One recorded notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Sheet name.
    pub sheet: String,
    /// Canonical date label as text.
    pub date: String,
    /// When the notification was delivered.
    pub notified_at: DateTime<FixedOffset>,
}

impl LedgerEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(
        sheet: impl Into<String>,
        date: impl Into<String>,
        notified_at: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            sheet: sheet.into(),
            date: date.into(),
            notified_at,
        }
    }

    /// The ledger key of this entry.
    #[must_use]
    pub fn key(&self) -> String {
        ledger_key(&self.sheet, &self.date)
    }
}

/// Key-value store of already-notified keys.
pub trait NotificationLedger {
    /// Looks up an entry by key.
    fn get(&self, key: &str) -> Option<&LedgerEntry>;

    /// Returns true if the key has been recorded.
    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// All entries, ordered by key.
    fn entries(&self) -> Vec<LedgerEntry>;

    /// Merges entries in. Existing keys are overwritten, nothing is removed.
    fn merge(&mut self, entries: Vec<LedgerEntry>);

    /// Persists merged entries.
    fn save(&mut self) -> Result<()>;

    /// Fails if another writer currently holds the ledger, so a caller can
    /// bail out before doing anything that must be recorded.
    fn ensure_writable(&self) -> Result<()> {
        Ok(())
    }
}

/// A ledger held in memory only.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    entries: BTreeMap<String, LedgerEntry>,
    saves: usize,
}

impl MemoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// How many times [`NotificationLedger::save`] has been called.
    #[must_use]
    pub const fn save_count(&self) -> usize {
        self.saves
    }
}

impl NotificationLedger for MemoryLedger {
    fn get(&self, key: &str) -> Option<&LedgerEntry> {
        self.entries.get(key)
    }

    fn entries(&self) -> Vec<LedgerEntry> {
        self.entries.values().cloned().collect()
    }

    fn merge(&mut self, entries: Vec<LedgerEntry>) {
        for entry in entries {
            self.entries.insert(entry.key(), entry);
        }
    }

    fn save(&mut self) -> Result<()> {
        self.saves += 1;
        Ok(())
    }
}

/// A ledger backed by a JSON file.
///
/// Reads take no lock. Saves hold an exclusive OS lock on `<file>.lock` for
/// the whole read-merge-replace cycle and swap the file in with a rename, so
/// a reader sees either the old or the new content in full. The lock file
/// stays on disk; the lock itself goes away with the process holding it.
#[derive(Debug)]
pub struct FileLedger {
    path: PathBuf,
    entries: BTreeMap<String, LedgerEntry>,
    pending: BTreeMap<String, LedgerEntry>,
}

impl FileLedger {
    /// Opens a ledger. A missing or unparseable file reads as empty.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = read_entries(&path);
        debug!(path = %path.display(), count = entries.len(), "loaded ledger");
        Self {
            path,
            entries,
            pending: BTreeMap::new(),
        }
    }

    /// Path of the ledger file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }
}

impl NotificationLedger for FileLedger {
    fn get(&self, key: &str) -> Option<&LedgerEntry> {
        self.pending.get(key).or_else(|| self.entries.get(key))
    }

    fn entries(&self) -> Vec<LedgerEntry> {
        let mut all = self.entries.clone();
        all.extend(self.pending.iter().map(|(k, v)| (k.clone(), v.clone())));
        all.into_values().collect()
    }

    fn merge(&mut self, entries: Vec<LedgerEntry>) {
        for entry in entries {
            self.pending.insert(entry.key(), entry);
        }
    }

    fn ensure_writable(&self) -> Result<()> {
        let lock_path = self.lock_path();
        if !lock_path.exists() {
            return Ok(());
        }
        let mut lock = open_lock(&lock_path)?;
        let guard = try_exclusive(&mut lock, &lock_path)?;
        drop(guard);
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let lock_path = self.lock_path();
        let mut lock = open_lock(&lock_path)?;
        let _guard = try_exclusive(&mut lock, &lock_path)?;

        // Union over the current file, not the copy read at open time.
        let mut merged = read_entries(&self.path);
        merged.extend(self.pending.iter().map(|(k, v)| (k.clone(), v.clone())));

        let bytes = serde_json::to_vec_pretty(&merged)?;
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, bytes)?;
        fs::rename(&tmp_path, &self.path)?;

        info!(
            path = %self.path.display(),
            added = self.pending.len(),
            total = merged.len(),
            "ledger saved"
        );
        self.entries = merged;
        self.pending.clear();
        Ok(())
    }
}

fn read_entries(path: &Path) -> BTreeMap<String, LedgerEntry> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return BTreeMap::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ledger unreadable, treating as empty");
            return BTreeMap::new();
        }
    };
    if content.trim().is_empty() {
        return BTreeMap::new();
    }
    serde_json::from_str(&content).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "ledger unparseable, treating as empty");
        BTreeMap::new()
    })
}

fn open_lock(path: &Path) -> Result<RwLock<File>> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)?;
    Ok(RwLock::new(file))
}

fn try_exclusive<'a>(
    lock: &'a mut RwLock<File>,
    path: &Path,
) -> Result<RwLockWriteGuard<'a, File>> {
    lock.try_write().map_err(|e| match e.kind() {
        io::ErrorKind::WouldBlock => AlertError::LedgerLocked {
            path: path.to_path_buf(),
        },
        _ => AlertError::Ledger(e),
    })
}
