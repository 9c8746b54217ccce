//! Ordered header multimap.
//!
//! Entries live in a single backing list of `(name, value)` slots. An index
//! maps each name to the slots it occupies, so lookups and deletes do not scan
//! the whole list. Deleting tombstones slots instead of shifting them, which
//! keeps every stored position valid and preserves the insertion order of the
//! surviving entries.
//!
//! Names are `HeaderName`s, which are lowercase by construction, so every
//! mutation and comparison is case-insensitive.

use std::collections::HashMap;

use axum::http::{HeaderMap, HeaderName, HeaderValue};

#[derive(Debug, Clone, Default)]
pub struct HeaderSet {
    slots: Vec<Option<(HeaderName, HeaderValue)>>,
    index: HashMap<HeaderName, Vec<usize>>,
    live: usize,
}

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from a `HeaderMap`, keeping every value of every name.
    pub fn from_header_map(map: &HeaderMap) -> Self {
        let mut set = Self::new();
        for (name, value) in map.iter() {
            set.append(name.clone(), value.clone());
        }
        set
    }

    /// Add a value, keeping any existing values for the name.
    pub fn append(&mut self, name: HeaderName, value: HeaderValue) {
        let pos = self.slots.len();
        self.index.entry(name.clone()).or_default().push(pos);
        self.slots.push(Some((name, value)));
        self.live += 1;
    }

    /// Replace all values for the name with a single value.
    ///
    /// The new value goes to the end of the insertion order.
    pub fn set(&mut self, name: HeaderName, value: HeaderValue) {
        self.delete(&name);
        self.append(name, value);
    }

    /// Remove every value for the name. Returns how many were removed.
    pub fn delete(&mut self, name: &HeaderName) -> usize {
        let Some(positions) = self.index.remove(name) else {
            return 0;
        };
        for &pos in &positions {
            self.slots[pos] = None;
        }
        self.live -= positions.len();
        positions.len()
    }

    pub fn contains(&self, name: &HeaderName) -> bool {
        self.index.contains_key(name)
    }

    /// First value stored for the name.
    pub fn get(&self, name: &HeaderName) -> Option<&HeaderValue> {
        self.get_all(name).next()
    }

    /// All values for the name, in insertion order.
    pub fn get_all<'a>(&'a self, name: &HeaderName) -> impl Iterator<Item = &'a HeaderValue> + 'a {
        self.index
            .get(name)
            .into_iter()
            .flatten()
            .filter_map(|&pos| self.slots[pos].as_ref().map(|(_, v)| v))
    }

    /// Live entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.slots
            .iter()
            .filter_map(|slot| slot.as_ref().map(|(n, v)| (n, v)))
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Convert into a `HeaderMap`, appending in insertion order.
    pub fn into_header_map(self) -> HeaderMap {
        let mut map = HeaderMap::with_capacity(self.live);
        for (name, value) in self.slots.into_iter().flatten() {
            map.append(name, value);
        }
        map
    }
}
