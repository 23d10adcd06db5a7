use crate::entry::Entry;
use crate::error::TendError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// On-disk shape: one JSON document holding the whole entry list.
#[derive(Serialize, Deserialize, Default)]
pub struct StoreData {
    pub entries: Vec<Entry>,
}

/// Whole-list persistence. Every mutation rewrites the full document, so the
/// last writer wins at the granularity of the entire list.
pub struct EntryStore {
    pub data: StoreData,
    pub path: PathBuf,
}

impl EntryStore {
    pub fn open(path: PathBuf) -> Result<Self, TendError> {
        let content = fs::read_to_string(&path).map_err(|e| TendError::StoreRead {
            path: path.clone(),
            source: e,
        })?;

        let data: StoreData = serde_json::from_str(&content).map_err(|e| TendError::StoreParse {
            path: path.clone(),
            source: e,
        })?;

        Ok(Self { data, path })
    }

    pub fn save(&self) -> Result<(), TendError> {
        let json =
            serde_json::to_string_pretty(&self.data).map_err(|e| TendError::StoreWrite {
                path: self.path.clone(),
                source: e.into(),
            })?;
        fs::write(&self.path, json).map_err(|e| TendError::StoreWrite {
            path: self.path.clone(),
            source: e,
        })?;
        Ok(())
    }

    pub fn append(&mut self, entry: Entry) -> Result<(), TendError> {
        self.data.entries.push(entry);
        self.save()
    }

    /// Replaces the record with the same id wholesale.
    pub fn replace(&mut self, entry: Entry) -> Result<(), TendError> {
        let slot = self
            .data
            .entries
            .iter_mut()
            .find(|e| e.id == entry.id)
            .ok_or_else(|| TendError::NotFound {
                id: entry.id.clone(),
            })?;
        *slot = entry;
        self.save()
    }

    pub fn remove(&mut self, id: &str) -> Result<Entry, TendError> {
        let pos = self
            .data
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| TendError::NotFound { id: id.to_string() })?;
        let removed = self.data.entries.remove(pos);
        self.save()?;
        Ok(removed)
    }

    /// Resolves a full id or a unique prefix of one.
    pub fn find(&self, id: &str) -> Result<&Entry, TendError> {
        if let Some(exact) = self.data.entries.iter().find(|e| e.id == id) {
            return Ok(exact);
        }

        let mut matches = self.data.entries.iter().filter(|e| e.id.starts_with(id));
        match (matches.next(), matches.next()) {
            (Some(one), None) => Ok(one),
            (Some(_), Some(_)) => Err(TendError::AmbiguousId { id: id.to_string() }),
            _ => Err(TendError::NotFound { id: id.to_string() }),
        }
    }
}

pub fn generate_store(path: &PathBuf) -> std::io::Result<()> {
    if !path.exists() {
        let template =
            include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/access/default_store.json"));
        fs::write(path, template)?;
    }

    Ok(())
}
