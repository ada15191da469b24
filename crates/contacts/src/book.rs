//! The in-memory contact book and its optional persistence target.
//!
//! [`ContactBook`] owns the ordered record collection for the whole run.
//! Positions are zero-based and follow insertion order; they are only
//! meaningful until the next add or remove.

use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::record::Record;
use crate::storage::Storage;

/// Ordered collection of records, optionally backed by a contacts file.
#[derive(Debug, Default)]
pub struct ContactBook {
    records: Vec<Record>,
    storage: Option<Storage>,
}

impl ContactBook {
    /// Create an empty book that is never saved.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty book that saves to `storage`.
    ///
    /// Nothing is read until [`ContactBook::load`] is called.
    #[must_use]
    pub fn with_storage(storage: Storage) -> Self {
        Self {
            records: Vec::new(),
            storage: Some(storage),
        }
    }

    /// Open the book for a run.
    ///
    /// With no target the book lives in memory only. An existing target is
    /// loaded; a missing one is created when `create_if_missing` is set.
    /// Failures are logged and never stop the run: a target that cannot be
    /// opened leaves the book unsaved, and one that cannot be read leaves it
    /// empty.
    #[must_use]
    pub fn open(target: Option<&Path>, create_if_missing: bool) -> Self {
        let Some(path) = target else {
            info!("No contacts file given; records will not be saved");
            return Self::new();
        };

        if !path.exists() && !create_if_missing {
            warn!(
                "Contacts file {} does not exist and creation is disabled; records will not be saved",
                path.display()
            );
            return Self::new();
        }

        let storage = match Storage::open(path) {
            Ok(storage) => storage,
            Err(err) => {
                error!(
                    "Cannot use {} as a contacts file: {err}; records will not be saved",
                    path.display()
                );
                return Self::new();
            }
        };

        let mut book = Self::with_storage(storage);
        if let Err(err) = book.load() {
            error!("Failed to load contacts from {}: {err}", path.display());
        }
        book
    }

    /// Replace the in-memory collection with what the contacts file holds.
    ///
    /// Does nothing when the book has no contacts file.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the file cannot be read; the collection
    /// is left empty in that case.
    pub fn load(&mut self) -> Result<usize> {
        let Some(storage) = &self.storage else {
            return Ok(0);
        };
        match storage.load() {
            Ok(records) => {
                self.records = records;
                Ok(self.records.len())
            }
            Err(err) => {
                self.records.clear();
                Err(err)
            }
        }
    }

    /// Write the whole collection to the contacts file.
    ///
    /// Does nothing when the book has no contacts file.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the write fails; the in-memory
    /// collection is unchanged.
    pub fn save(&mut self) -> Result<()> {
        if let Some(storage) = &mut self.storage {
            storage.save(&self.records)?;
        }
        Ok(())
    }

    /// Whether changes are written to a contacts file.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        self.storage.is_some()
    }

    /// The contacts file, if any.
    #[must_use]
    pub fn storage_path(&self) -> Option<&Path> {
        self.storage.as_ref().map(Storage::path)
    }

    /// Append a record and return its position.
    pub fn add(&mut self, record: Record) -> usize {
        debug!(kind = %record.kind(), "Adding record");
        self.records.push(record);
        self.records.len() - 1
    }

    /// Remove the record at `position`, keeping the order of the rest.
    pub fn remove(&mut self, position: usize) -> Option<Record> {
        if position < self.records.len() {
            debug!(position, "Removing record");
            Some(self.records.remove(position))
        } else {
            None
        }
    }

    /// The record at `position`.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&Record> {
        self.records.get(position)
    }

    /// Mutable access to the record at `position`.
    pub fn get_mut(&mut self, position: usize) -> Option<&mut Record> {
        self.records.get_mut(position)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the book has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in book order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Iterate over records in book order.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Positions of the records matching `query`, in book order.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<usize> {
        let positions: Vec<usize> = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.matches(query))
            .map(|(position, _)| position)
            .collect();
        debug!(query, matches = positions.len(), "Searched records");
        positions
    }
}

impl<'a> IntoIterator for &'a ContactBook {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
