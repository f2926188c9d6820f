//! Open-addressed hash table with linear probing and tombstones (spec
//! §4.6), keyed by interned-string [`Handle`] identity. Used for globals,
//! instance fields, class method/field tables — every runtime table spec
//! §4.6 describes except the string-interning lookup itself, which keys by
//! raw bytes instead and lives in [`crate::interner::Interner`].

use crate::handle::Handle;

const MAX_LOAD: f64 = 0.75;

#[derive(Clone)]
struct Entry<V> {
    key: Option<Handle>,
    tombstone: bool,
    value: Option<V>,
}

impl<V> Entry<V> {
    fn empty() -> Self {
        Self { key: None, tombstone: false, value: None }
    }
}

#[derive(Clone)]
pub struct Table<V> {
    entries: Vec<Entry<V>>,
    count: usize,
}

impl<V> Default for Table<V> {
    fn default() -> Self {
        Self { entries: Vec::new(), count: 0 }
    }
}

impl<V: Clone> Table<V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[must_use]
    pub fn get(&self, key: Handle) -> Option<&V> {
        if self.entries.is_empty() {
            return None;
        }
        let index = self.find_entry(&self.entries, key);
        if self.entries[index].key == Some(key) {
            self.entries[index].value.as_ref()
        } else {
            None
        }
    }

    #[must_use]
    pub fn contains(&self, key: Handle) -> bool {
        self.get(key).is_some()
    }

    /// Returns `true` if this inserted a brand-new key (spec's
    /// "`DEFINE_GLOBAL` stores unconditionally" / "`SET_GLOBAL` returns
    /// whether the key was previously present" both build on this).
    pub fn set(&mut self, key: Handle, value: V) -> bool {
        if self.entries.is_empty() || (self.count + 1) as f64 > self.entries.len() as f64 * MAX_LOAD {
            self.grow();
        }
        let index = self.find_entry(&self.entries, key);
        let is_new_key = self.entries[index].key.is_none();
        if is_new_key && !self.entries[index].tombstone {
            self.count += 1;
        }
        self.entries[index] = Entry { key: Some(key), tombstone: false, value: Some(value) };
        is_new_key
    }

    pub fn delete(&mut self, key: Handle) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        let index = self.find_entry(&self.entries, key);
        if self.entries[index].key.is_none() {
            return false;
        }
        self.entries[index] = Entry { key: None, tombstone: true, value: None };
        true
    }

    fn find_entry(&self, entries: &[Entry<V>], key: Handle) -> usize {
        let capacity = entries.len() as u32;
        let mut index = key.scatter() % capacity;
        let mut first_tombstone: Option<usize> = None;
        loop {
            let entry = &entries[index as usize];
            match entry.key {
                Some(k) if k == key => return index as usize,
                None if entry.tombstone => {
                    if first_tombstone.is_none() {
                        first_tombstone = Some(index as usize);
                    }
                }
                None => return first_tombstone.unwrap_or(index as usize),
                Some(_) => {}
            }
            index = (index + 1) % capacity;
        }
    }

    fn grow(&mut self) {
        let new_capacity = (self.entries.len() * 2).max(8);
        let mut new_entries = vec![Entry::empty(); new_capacity];
        for entry in &self.entries {
            if let Some(key) = entry.key {
                let index = Self::find_entry_in(&new_entries, key);
                new_entries[index] = Entry { key: Some(key), tombstone: false, value: entry.value.clone() };
            }
        }
        self.entries = new_entries;
    }

    /// Associated-function twin of [`Self::find_entry`] for use during
    /// `grow`, before `self.entries` has been replaced.
    fn find_entry_in(entries: &[Entry<V>], key: Handle) -> usize {
        let capacity = entries.len() as u32;
        let mut index = key.scatter() % capacity;
        loop {
            match entries[index as usize].key {
                None => return index as usize,
                Some(k) if k == key => return index as usize,
                Some(_) => {}
            }
            index = (index + 1) % capacity;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle, &V)> {
        self.entries.iter().filter_map(|e| e.key.map(|k| (k, e.value.as_ref().unwrap())))
    }

    pub fn extend_from(&mut self, other: &Table<V>) {
        for (key, value) in other.iter() {
            self.set(key, value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::Handle;

    fn h(n: u32) -> Handle {
        Handle::from_index(n)
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut table: Table<i32> = Table::new();
        assert!(table.set(h(3), 42));
        assert_eq!(table.get(h(3)), Some(&42));
        assert!(!table.set(h(3), 43));
        assert_eq!(table.get(h(3)), Some(&43));
    }

    #[test]
    fn delete_then_reinsert_reuses_tombstone() {
        let mut table: Table<i32> = Table::new();
        table.set(h(1), 1);
        table.set(h(2), 2);
        assert!(table.delete(h(1)));
        assert_eq!(table.get(h(1)), None);
        assert_eq!(table.len(), 1);
        assert!(table.set(h(1), 99));
        assert_eq!(table.get(h(1)), Some(&99));
    }

    #[test]
    fn grows_past_load_factor_without_losing_entries() {
        let mut table: Table<u32> = Table::new();
        for i in 0..200 {
            table.set(h(i), i * 10);
        }
        for i in 0..200 {
            assert_eq!(table.get(h(i)), Some(&(i * 10)));
        }
    }
}
