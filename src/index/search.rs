//! Query surface over the ordered store.

use std::sync::Arc;

use log::debug;

use crate::error::{Result, TesseraError};
use crate::index::codec;
use crate::index::config::IndexConfig;
use crate::index::field::{Field, FieldKey, RangeOpts, SortOrder};
use crate::index::iterator::FieldIterator;
use crate::index::posting::PostingSet;
use crate::schema::term::TermMetadata;
use crate::storage::memory::MemoryKvStore;
use crate::storage::traits::KvStore;
use crate::util::bytes::bytes_to_u64;

/// Read-side queries against an inverted index.
pub trait Searcher {
    /// Every item recorded under any term of the field.
    fn match_field(&self, key: &FieldKey) -> Result<PostingSet> {
        self.range(key, &RangeOpts::all())
    }

    /// Items recorded under exactly `field.term`. Any value on the field is ignored.
    fn match_terms(&self, field: &Field) -> Result<PostingSet>;

    /// Items recorded under any term within `opts`.
    fn range(&self, key: &FieldKey, opts: &RangeOpts) -> Result<PostingSet>;

    /// Open a per-term iterator over the field.
    fn iterator(&self, key: &FieldKey, opts: &RangeOpts, order: SortOrder) -> Result<FieldIterator>;
}

/// An inverted index read from an ordered key-value store.
///
/// Each stored entry maps an encoded `(field key, term)` to one 8-byte
/// big-endian item id; a term recorded for many items holds many entries.
#[derive(Debug, Clone)]
pub struct LsmIndex {
    store: Arc<dyn KvStore>,
    config: IndexConfig,
}

impl LsmIndex {
    /// Create an index over an existing store.
    pub fn new(store: Arc<dyn KvStore>, config: IndexConfig) -> Result<Self> {
        config.validate()?;
        Ok(LsmIndex { store, config })
    }

    /// Create an index backed by a fresh in-memory store.
    ///
    /// The store handle is returned as well so callers can populate it.
    pub fn in_memory(config: IndexConfig) -> Result<(Self, Arc<MemoryKvStore>)> {
        let store = Arc::new(MemoryKvStore::new(config.store.clone()));
        let index = Self::new(Arc::clone(&store) as Arc<dyn KvStore>, config)?;
        Ok((index, store))
    }

    /// The index configuration.
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// The term schema.
    pub fn term_metadata(&self) -> &TermMetadata {
        &self.config.term_metadata
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }
}

impl Searcher for LsmIndex {
    fn match_terms(&self, field: &Field) -> Result<PostingSet> {
        let key = codec::marshal_term(&field.key, &field.term, &self.config.term_metadata)?;

        let mut list = PostingSet::new();
        let result = self.store.get_all(&key, &mut |item| {
            list.insert(bytes_to_u64(item)?);
            Ok(())
        });

        match result {
            Ok(()) => Ok(list),
            Err(e) if e.is_not_found() => Ok(PostingSet::new()),
            Err(e) => Err(e),
        }
    }

    fn range(&self, key: &FieldKey, opts: &RangeOpts) -> Result<PostingSet> {
        let mut iter = self.iterator(key, opts, SortOrder::Asc)?;

        let mut list = PostingSet::new();
        let mut errors = Vec::new();
        let mut terms = 0usize;
        loop {
            match iter.next() {
                Ok(true) => {
                    if let Some(value) = iter.val() {
                        list.union_with(&value.value);
                        terms += 1;
                    }
                }
                Ok(false) => break,
                Err(e) => {
                    errors.push(e);
                    break;
                }
            }
        }
        if let Err(e) = iter.close() {
            errors.push(e);
        }
        TesseraError::aggregate(errors)?;

        debug!(
            "index {}: range over {key:?} merged {terms} terms into {} items",
            self.config.name,
            list.len()
        );
        Ok(list)
    }

    fn iterator(&self, key: &FieldKey, opts: &RangeOpts, order: SortOrder) -> Result<FieldIterator> {
        FieldIterator::new(
            self.store.as_ref(),
            key,
            opts,
            order,
            &self.config.term_metadata,
        )
    }
}
