//! Registry persistence and lookup.
//!
//! A missing registry file is a first run, not an error: the manager starts
//! empty and creates the file on the first save. Every edit saves
//! immediately; the registry is small and losing an operator's machine
//! assignment to a power cut is the thing to avoid.

use crate::error::{RegistryError, RegistryResult};
use crate::model::{MachineEntry, RegistryFile};
use std::fs;
use std::path::{Path, PathBuf};

/// Loads, edits and persists the machine registry.
#[derive(Debug)]
pub struct RegistryManager {
    path: PathBuf,
    entries: Vec<MachineEntry>,
    max_id: usize,
}

impl RegistryManager {
    /// Open the registry at `path`, accepting ids up to `max_id`
    ///
    /// A missing file yields an empty registry. Entries with out-of-range
    /// ids in the file are skipped with a warning rather than failing the
    /// whole load.
    pub fn open(path: impl Into<PathBuf>, max_id: usize) -> RegistryResult<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => {
                let file: RegistryFile = serde_json::from_str(&contents)?;
                let (valid, rejected): (Vec<_>, Vec<_>) = file
                    .machines
                    .into_iter()
                    .partition(|e| (1..=max_id).contains(&e.id));
                for entry in &rejected {
                    tracing::warn!(machine = entry.id, "skipping registry entry with out-of-range id");
                }
                valid
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no registry file, starting empty");
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(count = entries.len(), "machine registry loaded");
        Ok(Self {
            path,
            entries,
            max_id,
        })
    }

    /// Register a machine; fails if the id is taken or out of range
    pub fn add(&mut self, id: usize, address: &str) -> RegistryResult<()> {
        self.validate(id, address)?;
        if self.entries.iter().any(|e| e.id == id) {
            return Err(RegistryError::AlreadyRegistered(id));
        }
        self.entries.push(MachineEntry {
            id,
            address: address.to_string(),
        });
        self.entries.sort_by_key(|e| e.id);
        self.save()
    }

    /// Replace the address of a registered machine
    pub fn update_address(&mut self, id: usize, address: &str) -> RegistryResult<()> {
        self.validate(id, address)?;
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(RegistryError::NotRegistered(id))?;
        entry.address = address.to_string();
        self.save()
    }

    /// Remove a machine from the registry
    pub fn remove(&mut self, id: usize) -> RegistryResult<()> {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        if self.entries.len() == before {
            return Err(RegistryError::NotRegistered(id));
        }
        self.save()
    }

    /// Look up the control-endpoint address for a machine
    pub fn address_of(&self, id: usize) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.address.as_str())
    }

    /// All registered machines, ordered by id
    pub fn entries(&self) -> &[MachineEntry] {
        &self.entries
    }

    fn validate(&self, id: usize, address: &str) -> RegistryResult<()> {
        if !(1..=self.max_id).contains(&id) {
            return Err(RegistryError::IdOutOfRange {
                id,
                max: self.max_id,
            });
        }
        if address.trim().is_empty() {
            return Err(RegistryError::InvalidAddress {
                id,
                reason: "empty".to_string(),
            });
        }
        Ok(())
    }

    fn save(&self) -> RegistryResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = RegistryFile {
            machines: self.entries.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        fs::write(&self.path, json)?;
        tracing::debug!(path = %self.path.display(), count = self.entries.len(), "registry saved");
        Ok(())
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}
