//! In-memory ordered store for testing and fixtures.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

use crate::error::Result;
use crate::storage::traits::{KvIterator, KvStore, StorageError, StoreConfig, display_key};

type Entries = BTreeMap<Vec<u8>, Vec<Vec<u8>>>;

/// An ordered in-memory key-value store.
///
/// Each key maps to a list of values; cursors yield one entry per value.
/// Readers share a `RwLock`, so concurrent queries are safe.
#[derive(Debug)]
pub struct MemoryKvStore {
    entries: Arc<RwLock<Entries>>,
    open_iterators: Arc<AtomicUsize>,
    config: StoreConfig,
}

impl MemoryKvStore {
    /// Create a new memory store.
    pub fn new(config: StoreConfig) -> Self {
        MemoryKvStore {
            entries: Arc::new(RwLock::new(BTreeMap::new())),
            open_iterators: Arc::new(AtomicUsize::new(0)),
            config,
        }
    }

    /// Create a new memory store with default configuration.
    pub fn new_default() -> Self {
        Self::new(StoreConfig::default())
    }

    /// Append a value under `key`.
    pub fn put(&self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Result<()> {
        let key = key.into();
        if key.is_empty() {
            return Err(StorageError::InvalidOperation("empty key".to_string()).into());
        }
        let value = value.into();

        let mut entries = self.entries.write();
        let values = entries.entry(key).or_default();
        if !(self.config.dedup_values && values.contains(&value)) {
            values.push(value);
        }
        Ok(())
    }

    /// Number of stored entries, counting each value separately.
    pub fn len(&self) -> usize {
        self.entries.read().values().map(Vec::len).sum()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Number of distinct keys.
    pub fn key_count(&self) -> usize {
        self.entries.read().len()
    }

    /// Number of cursors opened and not yet released.
    pub fn open_iterators(&self) -> usize {
        self.open_iterators.load(Ordering::SeqCst)
    }
}

impl Default for MemoryKvStore {
    fn default() -> Self {
        Self::new_default()
    }
}

impl KvStore for MemoryKvStore {
    fn iter(&self, seek: Option<&[u8]>, reverse: bool) -> Result<Box<dyn KvIterator>> {
        if let Some(limit) = self.config.max_open_iterators
            && self.open_iterators() >= limit
        {
            return Err(StorageError::TooManyIterators(limit).into());
        }

        self.open_iterators.fetch_add(1, Ordering::SeqCst);
        let mut iter = MemoryIterator {
            entries: Arc::clone(&self.entries),
            reverse,
            current: None,
            position: 0,
            closed: false,
            open_iterators: Arc::clone(&self.open_iterators),
        };
        iter.load(seek.map_or(Bound::Unbounded, Bound::Included));
        Ok(Box::new(iter))
    }

    fn get_all(&self, key: &[u8], visit: &mut dyn FnMut(&[u8]) -> Result<()>) -> Result<()> {
        let entries = self.entries.read();
        let values = entries
            .get(key)
            .filter(|values| !values.is_empty())
            .ok_or_else(|| StorageError::KeyNotFound(display_key(key)))?;

        for value in values {
            visit(value)?;
        }
        Ok(())
    }
}

/// A cursor over a [`MemoryKvStore`].
///
/// Only the values of the key under the cursor are held; the next key is
/// looked up in the shared map when the cursor moves past the current one.
/// Keys written ahead of the cursor after it was opened are visited.
#[derive(Debug)]
pub struct MemoryIterator {
    entries: Arc<RwLock<Entries>>,
    reverse: bool,
    current: Option<(Vec<u8>, Vec<Vec<u8>>)>,
    position: usize,
    closed: bool,
    open_iterators: Arc<AtomicUsize>,
}

impl MemoryIterator {
    /// Position on the first non-empty key past `bound` in cursor direction.
    fn load(&mut self, bound: Bound<&[u8]>) {
        let entries = self.entries.read();
        let found = if self.reverse {
            entries
                .range::<[u8], _>((Bound::Unbounded, bound))
                .rev()
                .find(|(_, values)| !values.is_empty())
        } else {
            entries
                .range::<[u8], _>((bound, Bound::Unbounded))
                .find(|(_, values)| !values.is_empty())
        };

        self.current = found.map(|(key, values)| {
            let mut values = values.clone();
            if self.reverse {
                values.reverse();
            }
            (key.clone(), values)
        });
        self.position = 0;
    }

    fn release(&mut self) {
        self.closed = true;
        self.current = None;
        self.open_iterators.fetch_sub(1, Ordering::SeqCst);
    }
}

impl KvIterator for MemoryIterator {
    fn valid(&self) -> bool {
        !self.closed && self.current.is_some()
    }

    fn next(&mut self) {
        let Some((key, values)) = self.current.as_ref() else {
            return;
        };
        if self.position + 1 < values.len() {
            self.position += 1;
            return;
        }
        let key = key.clone();
        self.load(Bound::Excluded(key.as_slice()));
    }

    fn key(&self) -> &[u8] {
        self.current
            .as_ref()
            .map(|(key, _)| key.as_slice())
            .unwrap_or(&[])
    }

    fn val(&self) -> &[u8] {
        self.current
            .as_ref()
            .and_then(|(_, values)| values.get(self.position))
            .map(|value| value.as_slice())
            .unwrap_or(&[])
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Err(StorageError::IteratorClosed.into());
        }
        self.release();
        Ok(())
    }
}

impl Drop for MemoryIterator {
    fn drop(&mut self) {
        if !self.closed {
            self.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TesseraError;

    fn store() -> MemoryKvStore {
        let store = MemoryKvStore::new_default();
        store.put(b"b".to_vec(), b"2".to_vec()).unwrap();
        store.put(b"a".to_vec(), b"1".to_vec()).unwrap();
        store.put(b"c".to_vec(), b"3".to_vec()).unwrap();
        store.put(b"b".to_vec(), b"22".to_vec()).unwrap();
        store
    }

    fn drain(iter: &mut Box<dyn KvIterator>) -> Vec<(Vec<u8>, Vec<u8>)> {
        let mut out = Vec::new();
        while iter.valid() {
            out.push((iter.key().to_vec(), iter.val().to_vec()));
            iter.next();
        }
        out
    }

    #[test]
    fn test_forward_iteration() {
        let store = store();
        let mut iter = store.iter(None, false).unwrap();
        let entries = drain(&mut iter);
        let keys: Vec<&[u8]> = entries.iter().map(|(k, _)| k.as_slice()).collect();
        assert_eq!(keys, vec![&b"a"[..], b"b", b"b", b"c"]);
        assert_eq!(entries[1].1, b"2".to_vec());
        assert_eq!(entries[2].1, b"22".to_vec());
        iter.close().unwrap();
    }

    #[test]
    fn test_seek_forward_and_reverse() {
        let store = store();

        let mut iter = store.iter(Some(b"bb".as_slice()), false).unwrap();
        assert_eq!(iter.key(), b"c");
        iter.close().unwrap();

        let mut iter = store.iter(Some(b"bb".as_slice()), true).unwrap();
        let keys: Vec<Vec<u8>> = drain(&mut iter).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![b"b".to_vec(), b"b".to_vec(), b"a".to_vec()]);
        iter.close().unwrap();

        let mut iter = store.iter(None, true).unwrap();
        assert_eq!(iter.key(), b"c");
        iter.close().unwrap();
    }

    #[test]
    fn test_get_all() {
        let store = store();
        let mut seen = Vec::new();
        store
            .get_all(b"b", &mut |v| {
                seen.push(v.to_vec());
                Ok(())
            })
            .unwrap();
        assert_eq!(seen, vec![b"2".to_vec(), b"22".to_vec()]);

        let err = store.get_all(b"zz", &mut |_| Ok(())).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_get_all_stops_on_visitor_error() {
        let store = store();
        let mut calls = 0;
        let err = store
            .get_all(b"b", &mut |_| {
                calls += 1;
                Err(TesseraError::decode("stop"))
            })
            .unwrap_err();
        assert!(matches!(err, TesseraError::Decode(_)));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_dedup_values() {
        let store = MemoryKvStore::new_default();
        store.put(b"k".to_vec(), b"v".to_vec()).unwrap();
        store.put(b"k".to_vec(), b"v".to_vec()).unwrap();
        assert_eq!(store.len(), 1);

        let store = MemoryKvStore::new(StoreConfig {
            dedup_values: false,
            ..StoreConfig::default()
        });
        store.put(b"k".to_vec(), b"v".to_vec()).unwrap();
        store.put(b"k".to_vec(), b"v".to_vec()).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.key_count(), 1);
    }

    #[test]
    fn test_empty_key_rejected() {
        let store = MemoryKvStore::new_default();
        assert!(store.put(Vec::new(), b"v".to_vec()).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_iterator_accounting() {
        let store = store();
        let mut first = store.iter(None, false).unwrap();
        let second = store.iter(None, false).unwrap();
        assert_eq!(store.open_iterators(), 2);

        first.close().unwrap();
        assert_eq!(store.open_iterators(), 1);
        assert!(!first.valid());
        assert!(matches!(first.close(), Err(TesseraError::Storage(_))));
        assert_eq!(store.open_iterators(), 1);

        drop(second);
        assert_eq!(store.open_iterators(), 0);
    }

    #[test]
    fn test_iterator_limit() {
        let store = MemoryKvStore::new(StoreConfig {
            max_open_iterators: Some(1),
            ..StoreConfig::default()
        });
        let mut iter = store.iter(None, false).unwrap();
        assert!(store.iter(None, false).is_err());
        iter.close().unwrap();
        assert!(store.iter(None, false).is_ok());
    }

    #[test]
    fn test_cursor_loads_keys_on_demand() {
        let store = store();
        let mut iter = store.iter(Some(b"b".as_slice()), false).unwrap();
        assert_eq!(iter.key(), b"b");
        assert_eq!(iter.val(), b"2");

        // Written ahead of the cursor, so the next key lookup finds it.
        store.put(b"bz".to_vec(), b"9".to_vec()).unwrap();
        iter.next();
        assert_eq!(iter.val(), b"22");
        iter.next();
        assert_eq!(iter.key(), b"bz");
        iter.next();
        assert_eq!(iter.key(), b"c");
        iter.next();
        assert!(!iter.valid());
        iter.close().unwrap();
    }

    #[test]
    fn test_reverse_values_per_key() {
        let store = store();
        let mut iter = store.iter(Some(b"b".as_slice()), true).unwrap();
        let entries = drain(&mut iter);
        assert_eq!(
            entries,
            vec![
                (b"b".to_vec(), b"22".to_vec()),
                (b"b".to_vec(), b"2".to_vec()),
                (b"a".to_vec(), b"1".to_vec()),
            ]
        );
        iter.close().unwrap();
    }
}
