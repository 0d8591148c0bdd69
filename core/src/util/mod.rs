pub mod fast_map;

use fast_map::FastHashMap;

/// Name-keyed table with 4GL lookup rules: case-insensitive, first
/// definition wins, iteration in definition order.
#[derive(Debug, Clone)]
pub struct SymbolTable<T> {
    entries: Vec<(String, T)>,
    index: FastHashMap<String, usize>,
}

impl<T> Default for SymbolTable<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: FastHashMap::default(),
        }
    }
}

impl<T> SymbolTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false, leaving the table untouched, when `name` is taken.
    pub fn insert(&mut self, name: &str, value: T) -> bool {
        let key = name.to_ascii_lowercase();
        if self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key, self.entries.len());
        self.entries.push((name.to_string(), value));
        true
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.index
            .get(&name.to_ascii_lowercase())
            .map(|&i| &self.entries[i].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries with the name as written at the definition site.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}
