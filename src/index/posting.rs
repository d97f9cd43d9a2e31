//! Compressed posting sets of 64-bit item identifiers.
//!
//! A [`PostingSet`] partitions the identifier space into 32-bit buckets, each
//! stored as a roaring bitmap whose containers switch between sorted arrays,
//! dense bitmaps and runs depending on local density. Enumeration is always
//! ascending and union cost is proportional to the containers touched, so
//! folding many term contributions into one result stays cheap.

use std::fmt;
use std::ops::BitOr;

use roaring::RoaringTreemap;

use crate::error::{Result, TesseraError};

/// An ordered, deduplicated set of item identifiers.
#[derive(Clone, Default, PartialEq)]
pub struct PostingSet {
    bitmap: RoaringTreemap,
}

impl PostingSet {
    /// Create an empty posting set.
    pub fn new() -> Self {
        PostingSet {
            bitmap: RoaringTreemap::new(),
        }
    }

    /// Create a posting set holding exactly one identifier.
    pub fn singleton(item_id: u64) -> Self {
        let mut set = Self::new();
        set.insert(item_id);
        set
    }

    /// Add an identifier. Returns `false` if it was already present.
    pub fn insert(&mut self, item_id: u64) -> bool {
        self.bitmap.insert(item_id)
    }

    /// Merge every identifier of `other` into this set.
    pub fn union_with(&mut self, other: &PostingSet) {
        self.bitmap |= &other.bitmap;
    }

    /// Set union of two posting sets.
    pub fn union(&self, other: &PostingSet) -> PostingSet {
        PostingSet {
            bitmap: &self.bitmap | &other.bitmap,
        }
    }

    /// Identifiers present in both sets.
    pub fn intersect(&self, other: &PostingSet) -> PostingSet {
        PostingSet {
            bitmap: &self.bitmap & &other.bitmap,
        }
    }

    /// Identifiers of this set that are absent from `other`.
    pub fn difference(&self, other: &PostingSet) -> PostingSet {
        PostingSet {
            bitmap: &self.bitmap - &other.bitmap,
        }
    }

    /// Check membership.
    pub fn contains(&self, item_id: u64) -> bool {
        self.bitmap.contains(item_id)
    }

    /// Number of identifiers.
    pub fn len(&self) -> u64 {
        self.bitmap.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.bitmap.is_empty()
    }

    /// Smallest identifier.
    pub fn min(&self) -> Option<u64> {
        self.bitmap.min()
    }

    /// Largest identifier.
    pub fn max(&self) -> Option<u64> {
        self.bitmap.max()
    }

    /// Iterate identifiers in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.bitmap.iter()
    }

    /// Collect identifiers in ascending order.
    pub fn to_vec(&self) -> Vec<u64> {
        self.iter().collect()
    }

    /// Serialize to the portable roaring format.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.bitmap.serialized_size());
        self.bitmap.serialize_into(&mut buf)?;
        Ok(buf)
    }

    /// Deserialize from bytes produced by [`PostingSet::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bitmap = RoaringTreemap::deserialize_from(bytes)
            .map_err(|e| TesseraError::decode(format!("malformed posting set: {e}")))?;
        Ok(PostingSet { bitmap })
    }
}

impl fmt::Debug for PostingSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.len() <= 16 {
            f.debug_set().entries(self.iter()).finish()
        } else {
            write!(
                f,
                "PostingSet<{} items, min={:?}, max={:?}>",
                self.len(),
                self.min(),
                self.max()
            )
        }
    }
}

impl FromIterator<u64> for PostingSet {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        PostingSet {
            bitmap: iter.into_iter().collect(),
        }
    }
}

impl Extend<u64> for PostingSet {
    fn extend<I: IntoIterator<Item = u64>>(&mut self, iter: I) {
        self.bitmap.extend(iter);
    }
}

impl BitOr for &PostingSet {
    type Output = PostingSet;

    fn bitor(self, rhs: &PostingSet) -> PostingSet {
        self.union(rhs)
    }
}
