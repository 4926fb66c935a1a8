use std::collections::HashMap;

use foundation::ids::LocationId;
use tracing::debug;

use crate::CatalogError;
use crate::location::Location;

/// Result of [`LocationStore::upsert`].
#[derive(Debug, Clone, PartialEq)]
pub enum Upserted {
    Inserted,
    /// The previous record, replaced wholesale.
    Replaced(Location),
}

/// Insertion-ordered mapping from id to [`Location`].
///
/// Ordering contract:
/// - Iteration yields locations in insertion order.
/// - Upserting an existing id removes the old record and appends the new one,
///   so the replaced location moves to the end.
///
/// Every mutation bumps [`LocationStore::revision`].
#[derive(Debug, Clone, Default)]
pub struct LocationStore {
    entries: Vec<Location>,
    index: HashMap<LocationId, usize>,
    revision: u64,
}

impl LocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from seed data. Seed ids must be unique.
    pub fn seeded(locations: impl IntoIterator<Item = Location>) -> Result<Self, CatalogError> {
        let mut store = Self::new();
        for location in locations {
            if store.contains(&location.id) {
                return Err(CatalogError::DuplicateId(location.id));
            }
            store.push(location);
        }
        store.revision = 1;
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn contains(&self, id: &LocationId) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &LocationId) -> Option<&Location> {
        self.index.get(id).map(|&idx| &self.entries[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Location> + '_ {
        self.entries.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &LocationId> + '_ {
        self.entries.iter().map(|l| &l.id)
    }

    /// Insert-or-replace by id.
    pub fn upsert(&mut self, location: Location) -> Upserted {
        let previous = self.take(&location.id);
        debug!(id = %location.id, replaced = previous.is_some(), "upsert location");
        self.push(location);
        self.revision += 1;
        match previous {
            Some(prev) => Upserted::Replaced(prev),
            None => Upserted::Inserted,
        }
    }

    pub fn remove(&mut self, id: &LocationId) -> Option<Location> {
        let removed = self.take(id)?;
        self.revision += 1;
        Some(removed)
    }

    /// Locations whose display name contains `query`, ignoring case and
    /// surrounding whitespace. An empty query returns every location.
    pub fn filter_by_name(&self, query: &str) -> Vec<&Location> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.entries.iter().collect();
        }
        self.entries
            .iter()
            .filter(|l| l.name_contains(&needle))
            .collect()
    }

    fn push(&mut self, location: Location) {
        self.index.insert(location.id.clone(), self.entries.len());
        self.entries.push(location);
    }

    fn take(&mut self, id: &LocationId) -> Option<Location> {
        let idx = self.index.remove(id)?;
        let removed = self.entries.remove(idx);
        for (i, entry) in self.entries.iter().enumerate().skip(idx) {
            self.index.insert(entry.id.clone(), i);
        }
        Some(removed)
    }
}
