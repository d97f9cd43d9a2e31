//! Term-grouping iterator over the ordered store.
//!
//! A [`FieldIterator`] walks the encoded keys of one field inside a term range
//! and folds every run of entries sharing a term into one [`PostingValue`].
//! Because keys are sorted by term, each term forms exactly one contiguous run,
//! so a term is never yielded twice within a traversal.

use log::{debug, warn};

use crate::error::Result;
use crate::index::codec::{self, KeyRange};
use crate::index::field::{FieldKey, PostingValue, RangeOpts, SortOrder};
use crate::index::posting::PostingSet;
use crate::schema::term::TermMetadata;
use crate::storage::traits::{KvIterator, KvStore};
use crate::util::bytes::bytes_to_u64;

/// Single-pass cursor yielding one posting value per term.
///
/// Drive it with [`FieldIterator::next`] and read the current value with
/// [`FieldIterator::val`]. The owner should call [`FieldIterator::close`] to
/// release the store cursor and observe any close error; dropping an unclosed
/// iterator closes it and logs the error instead.
pub struct FieldIterator {
    cursor: Option<Box<dyn KvIterator>>,
    range: KeyRange,
    metadata: TermMetadata,
    order: SortOrder,
    current: Option<PostingValue>,
    done: bool,
    closed: bool,
}

impl FieldIterator {
    /// Open an iterator over `key` restricted to `opts`.
    pub fn new(
        store: &dyn KvStore,
        key: &FieldKey,
        opts: &RangeOpts,
        order: SortOrder,
        metadata: &TermMetadata,
    ) -> Result<Self> {
        let range = codec::key_range(key, opts, metadata)?;

        if range.is_empty() {
            debug!("field {key:?}: empty term range, skipping store scan");
            return Ok(FieldIterator {
                cursor: None,
                range,
                metadata: *metadata,
                order,
                current: None,
                done: true,
                closed: false,
            });
        }

        let cursor = if order.is_reverse() {
            let mut cursor = store.iter(range.end.as_deref(), true)?;
            // A reverse seek lands on the exclusive end itself.
            while cursor.valid() && range.end.as_deref().is_some_and(|end| cursor.key() >= end) {
                cursor.next();
            }
            cursor
        } else {
            store.iter(Some(range.start.as_slice()), false)?
        };
        debug!("field {key:?}: opened {order:?} iterator");

        Ok(FieldIterator {
            cursor: Some(cursor),
            range,
            metadata: *metadata,
            order,
            current: None,
            done: false,
            closed: false,
        })
    }

    /// Advance to the next term.
    ///
    /// Returns `Ok(false)` once the range is exhausted. A decode failure is
    /// returned as an error and ends the traversal; values yielded before it
    /// stay valid.
    pub fn next(&mut self) -> Result<bool> {
        if self.done {
            return Ok(false);
        }

        let Some(cursor) = self.cursor.as_deref_mut() else {
            self.finish();
            return Ok(false);
        };
        if !cursor.valid() || !self.range.contains(cursor.key()) {
            self.finish();
            return Ok(false);
        }

        match merge_term(cursor, &self.range, &self.metadata) {
            Ok(value) => {
                self.current = Some(value);
                Ok(true)
            }
            Err(e) => {
                self.finish();
                Err(e)
            }
        }
    }

    /// The posting value produced by the last successful `next`.
    pub fn val(&self) -> Option<&PostingValue> {
        self.current.as_ref()
    }

    /// Take ownership of the current posting value.
    pub fn take_val(&mut self) -> Option<PostingValue> {
        self.current.take()
    }

    /// Traversal direction.
    pub fn order(&self) -> SortOrder {
        self.order
    }

    /// Release the store cursor. Calling it again is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.finish();
        match self.cursor.take() {
            Some(mut cursor) => cursor.close(),
            None => Ok(()),
        }
    }

    fn finish(&mut self) {
        self.done = true;
        self.current = None;
    }
}

impl Drop for FieldIterator {
    fn drop(&mut self) {
        if !self.closed
            && let Err(e) = self.close()
        {
            warn!("failed to close field iterator: {e}");
        }
    }
}

/// Fold the run of entries sharing the current term into one posting value.
///
/// Leaves the cursor on the first entry of the next term, or exhausted.
fn merge_term(
    cursor: &mut dyn KvIterator,
    range: &KeyRange,
    metadata: &TermMetadata,
) -> Result<PostingValue> {
    let head = codec::unmarshal(metadata, cursor.key())?;
    let mut value = PostingValue {
        term: head.term,
        value: PostingSet::singleton(bytes_to_u64(cursor.val())?),
    };
    cursor.next();

    while cursor.valid() && range.contains(cursor.key()) {
        let field = codec::unmarshal(metadata, cursor.key())?;
        if field.term != value.term {
            break;
        }
        value.value.insert(bytes_to_u64(cursor.val())?);
        cursor.next();
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TesseraError;
    use crate::index::field::Field;
    use crate::schema::term::TermType;
    use crate::storage::memory::MemoryKvStore;
    use crate::util::bytes::u64_to_bytes;

    fn field_key() -> FieldKey {
        FieldKey::new(1, 1)
    }

    fn put(store: &MemoryKvStore, meta: &TermMetadata, key: FieldKey, term: &[u8], item: u64) {
        let encoded = codec::marshal(&Field::new(key, term.to_vec()), meta).unwrap();
        store.put(encoded, u64_to_bytes(item).to_vec()).unwrap();
    }

    fn collect(iter: &mut FieldIterator) -> Vec<(Vec<u8>, Vec<u64>)> {
        let mut out = Vec::new();
        while iter.next().unwrap() {
            let val = iter.val().unwrap();
            out.push((val.term.clone(), val.value.to_vec()));
        }
        out
    }

    fn http_store() -> (MemoryKvStore, TermMetadata) {
        let meta = TermMetadata::bytes();
        let store = MemoryKvStore::new_default();
        for (term, item) in [("POST", 5), ("GET", 2), ("GET", 1), ("PUT", 9), ("POST", 4), ("GET", 3)] {
            put(&store, &meta, field_key(), term.as_bytes(), item);
        }
        // Neighbouring fields must never leak in.
        put(&store, &meta, FieldKey::new(1, 0), b"ZZZ", 100);
        put(&store, &meta, FieldKey::new(1, 2), b"AAA", 200);
        (store, meta)
    }

    #[test]
    fn test_ascending_groups_terms() {
        let (store, meta) = http_store();
        let mut iter =
            FieldIterator::new(&store, &field_key(), &RangeOpts::all(), SortOrder::Asc, &meta).unwrap();
        assert_eq!(
            collect(&mut iter),
            vec![
                (b"GET".to_vec(), vec![1, 2, 3]),
                (b"POST".to_vec(), vec![4, 5]),
                (b"PUT".to_vec(), vec![9]),
            ]
        );
        assert!(!iter.next().unwrap());
        assert!(iter.val().is_none());
        iter.close().unwrap();
        assert_eq!(store.open_iterators(), 0);
    }

    #[test]
    fn test_descending_groups_terms() {
        let (store, meta) = http_store();
        let mut iter =
            FieldIterator::new(&store, &field_key(), &RangeOpts::all(), SortOrder::Desc, &meta).unwrap();
        assert_eq!(iter.order(), SortOrder::Desc);
        assert_eq!(
            collect(&mut iter),
            vec![
                (b"PUT".to_vec(), vec![9]),
                (b"POST".to_vec(), vec![4, 5]),
                (b"GET".to_vec(), vec![1, 2, 3]),
            ]
        );
        iter.close().unwrap();
    }

    #[test]
    fn test_bounded_range() {
        let (store, meta) = http_store();
        let opts = RangeOpts::all().lower("GET", false).upper("PUT", true);
        let mut iter = FieldIterator::new(&store, &field_key(), &opts, SortOrder::Asc, &meta).unwrap();
        let terms: Vec<Vec<u8>> = collect(&mut iter).into_iter().map(|(t, _)| t).collect();
        assert_eq!(terms, vec![b"POST".to_vec(), b"PUT".to_vec()]);
        iter.close().unwrap();

        let opts = RangeOpts::all().lower("GET", true).upper("PUT", false);
        let mut iter = FieldIterator::new(&store, &field_key(), &opts, SortOrder::Desc, &meta).unwrap();
        let terms: Vec<Vec<u8>> = collect(&mut iter).into_iter().map(|(t, _)| t).collect();
        assert_eq!(terms, vec![b"POST".to_vec(), b"GET".to_vec()]);
        iter.close().unwrap();
    }

    #[test]
    fn test_numeric_terms_follow_magnitude() {
        let meta = TermMetadata::new(TermType::I64);
        let store = MemoryKvStore::new_default();
        for (value, item) in [(5i64, 1u64), (-3, 2), (100, 3), (-3, 4), (0, 5)] {
            put(&store, &meta, field_key(), &value.to_be_bytes(), item);
        }

        let opts = RangeOpts::all()
            .lower((-3i64).to_be_bytes(), true)
            .upper(5i64.to_be_bytes(), true);
        let mut iter = FieldIterator::new(&store, &field_key(), &opts, SortOrder::Asc, &meta).unwrap();
        let values: Vec<(i64, Vec<u64>)> = collect(&mut iter)
            .into_iter()
            .map(|(t, ids)| (i64::from_be_bytes(t.try_into().unwrap()), ids))
            .collect();
        assert_eq!(values, vec![(-3, vec![2, 4]), (0, vec![5]), (5, vec![1])]);
        iter.close().unwrap();
    }

    #[test]
    fn test_empty_range_never_opens_cursor() {
        let (store, meta) = http_store();
        let opts = RangeOpts::all().lower("Z", true).upper("A", true);
        let mut iter = FieldIterator::new(&store, &field_key(), &opts, SortOrder::Asc, &meta).unwrap();
        assert_eq!(store.open_iterators(), 0);
        assert!(!iter.next().unwrap());
        iter.close().unwrap();
    }

    #[test]
    fn test_decode_error_keeps_earlier_values() {
        let (store, meta) = http_store();
        // A malformed item id under a later term.
        let bad = codec::marshal(&Field::new(field_key(), b"PUT".to_vec()), &meta).unwrap();
        store.put(bad, vec![1u8, 2, 3]).unwrap();

        let mut iter =
            FieldIterator::new(&store, &field_key(), &RangeOpts::all(), SortOrder::Asc, &meta).unwrap();
        assert!(iter.next().unwrap());
        let first = iter.take_val().unwrap();
        assert!(iter.next().unwrap());
        assert!(matches!(iter.next(), Err(TesseraError::Decode(_))));
        assert!(!iter.next().unwrap());
        assert_eq!(first.value.to_vec(), vec![1, 2, 3]);
        iter.close().unwrap();
    }

    #[test]
    fn test_close_is_idempotent_and_drop_releases() {
        let (store, meta) = http_store();
        let mut iter =
            FieldIterator::new(&store, &field_key(), &RangeOpts::all(), SortOrder::Asc, &meta).unwrap();
        assert_eq!(store.open_iterators(), 1);
        iter.close().unwrap();
        iter.close().unwrap();
        assert_eq!(store.open_iterators(), 0);

        {
            let mut iter =
                FieldIterator::new(&store, &field_key(), &RangeOpts::all(), SortOrder::Asc, &meta).unwrap();
            assert!(iter.next().unwrap());
            assert_eq!(store.open_iterators(), 1);
        }
        assert_eq!(store.open_iterators(), 0);
    }
}
