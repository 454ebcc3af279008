use std::sync::atomic::{AtomicU64, Ordering};

use roaring::RoaringBitmap;

use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DocOrd;
use crate::corpus::reader::PostingsCursor;

const SIZE_DIRTY: u64 = u64::MAX;

#[derive(Debug)]
enum Storage {
    /// Plain bit words, one bit per document ordinal.
    Dense(Vec<u64>),
    /// Roaring bitmap for low-density sets.
    Sparse(RoaringBitmap),
}

/// Capacity-bounded membership set over document ordinals.
///
/// Bit `i` set means document `i` is a member. The internal
/// representation is fixed at construction: above 50% expected density a
/// dense bit vector, otherwise a roaring bitmap. Cardinality is cached
/// and recomputed lazily after mutation.
#[derive(Debug)]
pub struct DocSet {
    capacity: u32,
    storage: Storage,
    cached_size: AtomicU64, // SIZE_DIRTY marks it stale
}

impl Clone for DocSet {
    fn clone(&self) -> Self {
        DocSet {
            capacity: self.capacity,
            storage: match &self.storage {
                Storage::Dense(words) => Storage::Dense(words.clone()),
                Storage::Sparse(bits) => Storage::Sparse(bits.clone()),
            },
            cached_size: AtomicU64::new(self.cached_size.load(Ordering::Relaxed)),
        }
    }
}

impl DocSet {
    /// Empty sparse set over `capacity` documents.
    pub fn sparse(capacity: u32) -> Self {
        DocSet {
            capacity,
            storage: Storage::Sparse(RoaringBitmap::new()),
            cached_size: AtomicU64::new(0),
        }
    }

    /// Empty dense set over `capacity` documents.
    pub fn dense(capacity: u32) -> Self {
        let words = vec![0u64; (capacity as usize).div_ceil(64)];
        DocSet {
            capacity,
            storage: Storage::Dense(words),
            cached_size: AtomicU64::new(0),
        }
    }

    /// Pick the representation from the expected member count: dense
    /// above 50% density, sparse otherwise.
    pub fn with_density(capacity: u32, expected_members: u32) -> Self {
        if capacity > 0 && (expected_members as u64) * 2 > capacity as u64 {
            DocSet::dense(capacity)
        } else {
            DocSet::sparse(capacity)
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn is_dense(&self) -> bool {
        matches!(self.storage, Storage::Dense(_))
    }

    fn check_bounds(&self, doc: DocOrd) -> Result<()> {
        if doc >= self.capacity {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                format!("document {} outside capacity {}", doc, self.capacity),
            ));
        }
        Ok(())
    }

    pub fn add(&mut self, doc: DocOrd) -> Result<()> {
        self.check_bounds(doc)?;
        match &mut self.storage {
            Storage::Dense(words) => words[(doc >> 6) as usize] |= 1u64 << (doc & 63),
            Storage::Sparse(bits) => {
                bits.insert(doc);
            }
        }
        self.cached_size.store(SIZE_DIRTY, Ordering::Relaxed);
        Ok(())
    }

    pub fn remove(&mut self, doc: DocOrd) -> Result<()> {
        self.check_bounds(doc)?;
        match &mut self.storage {
            Storage::Dense(words) => words[(doc >> 6) as usize] &= !(1u64 << (doc & 63)),
            Storage::Sparse(bits) => {
                bits.remove(doc);
            }
        }
        self.cached_size.store(SIZE_DIRTY, Ordering::Relaxed);
        Ok(())
    }

    /// Bulk union of an ascending postings stream. The cursor is
    /// consumed; its state afterwards is unspecified.
    pub fn add_postings(&mut self, cursor: &mut dyn PostingsCursor) -> Result<()> {
        while let Some(doc) = cursor.next_doc() {
            self.add(doc)?;
        }
        Ok(())
    }

    pub fn contains(&self, doc: DocOrd) -> bool {
        if doc >= self.capacity {
            return false;
        }
        match &self.storage {
            Storage::Dense(words) => words[(doc >> 6) as usize] & (1u64 << (doc & 63)) != 0,
            Storage::Sparse(bits) => bits.contains(doc),
        }
    }

    /// Cardinality. O(1) once computed; recomputed lazily after any
    /// mutation.
    pub fn size(&self) -> u64 {
        let cached = self.cached_size.load(Ordering::Relaxed);
        if cached != SIZE_DIRTY {
            return cached;
        }
        let size = match &self.storage {
            Storage::Dense(words) => words.iter().map(|w| w.count_ones() as u64).sum(),
            Storage::Sparse(bits) => bits.len(),
        };
        self.cached_size.store(size, Ordering::Relaxed);
        size
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Members in ascending order.
    pub fn iter(&self) -> DocSetIter<'_> {
        match &self.storage {
            Storage::Dense(words) => DocSetIter::Dense {
                words,
                word: if words.is_empty() { 0 } else { words[0] },
                next_word: 1,
                base: 0,
            },
            Storage::Sparse(bits) => DocSetIter::Sparse(bits.iter()),
        }
    }

    /// Materialize all members in ascending order.
    pub fn vector(&self) -> Vec<DocOrd> {
        self.iter().collect()
    }

    /// First member with ordinal >= `from`, if any.
    pub fn next_member(&self, from: DocOrd) -> Option<DocOrd> {
        if from >= self.capacity {
            return None;
        }
        match &self.storage {
            Storage::Dense(words) => {
                let mut at = (from >> 6) as usize;
                let mut word = words[at] & (!0u64 << (from & 63));
                loop {
                    if word != 0 {
                        return Some((at as u32) * 64 + word.trailing_zeros());
                    }
                    at += 1;
                    if at >= words.len() {
                        return None;
                    }
                    word = words[at];
                }
            }
            Storage::Sparse(bits) => {
                if from == 0 {
                    bits.min()
                } else {
                    // rank counts members <= from-1; select is 0-indexed,
                    // so this lands on the first member >= from.
                    bits.select(bits.rank(from - 1) as u32)
                }
            }
        }
    }

    /// Intersection. The smaller operand is mutated in place and
    /// returned; neither input survives the call.
    pub fn intersect(self, other: DocSet) -> Result<DocSet> {
        if self.capacity != other.capacity {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                format!(
                    "capacity mismatch: {} vs {}",
                    self.capacity, other.capacity
                ),
            ));
        }
        let (mut small, large) = if self.size() <= other.size() {
            (self, other)
        } else {
            (other, self)
        };
        for doc in small.vector() {
            if !large.contains(doc) {
                small.remove(doc)?;
            }
        }
        Ok(small)
    }

    /// New set containing exactly the non-members, at the complementary
    /// density.
    pub fn complement(&self) -> DocSet {
        let expected = (self.capacity as u64 - self.size()) as u32;
        let mut out = DocSet::with_density(self.capacity, expected);
        let mut gap_start = 0u32;
        for member in self.iter() {
            out.add_range(gap_start, member);
            gap_start = member + 1;
        }
        out.add_range(gap_start, self.capacity);
        out
    }

    fn add_range(&mut self, start: u32, end: u32) {
        if start >= end {
            return;
        }
        match &mut self.storage {
            Storage::Dense(words) => set_range_dense(words, start, end),
            Storage::Sparse(bits) => {
                bits.insert_range(start..end);
            }
        }
        self.cached_size.store(SIZE_DIRTY, Ordering::Relaxed);
    }
}

fn set_range_dense(words: &mut [u64], start: u32, end: u32) {
    let start_word = (start >> 6) as usize;
    let end_word = (end >> 6) as usize;
    let start_bit = start & 63;
    let end_bit = end & 63;
    if start_word == end_word {
        words[start_word] |= (!0u64 << start_bit) & ((1u64 << end_bit) - 1);
        return;
    }
    words[start_word] |= !0u64 << start_bit;
    for word in &mut words[start_word + 1..end_word] {
        *word = !0u64;
    }
    if end_bit > 0 {
        words[end_word] |= (1u64 << end_bit) - 1;
    }
}

pub enum DocSetIter<'a> {
    Dense {
        words: &'a [u64],
        word: u64,
        next_word: usize,
        base: u32,
    },
    Sparse(roaring::bitmap::Iter<'a>),
}

impl Iterator for DocSetIter<'_> {
    type Item = DocOrd;

    fn next(&mut self) -> Option<DocOrd> {
        match self {
            DocSetIter::Dense {
                words,
                word,
                next_word,
                base,
            } => {
                while *word == 0 {
                    if *next_word >= words.len() {
                        return None;
                    }
                    *word = words[*next_word];
                    *base = (*next_word as u32) * 64;
                    *next_word += 1;
                }
                let bit = word.trailing_zeros();
                *word &= *word - 1;
                Some(*base + bit)
            }
            DocSetIter::Sparse(inner) => inner.next(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn density_picks_representation() {
        assert!(DocSet::with_density(100, 60).is_dense());
        assert!(!DocSet::with_density(100, 50).is_dense());
        assert!(!DocSet::with_density(0, 0).is_dense());
    }

    #[test]
    fn add_remove_size() {
        let mut set = DocSet::sparse(100);
        set.add(3).unwrap();
        set.add(40).unwrap();
        set.add(40).unwrap();
        assert_eq!(set.size(), 2);
        set.remove(3).unwrap();
        assert_eq!(set.size(), 1);
        assert!(set.contains(40));
        assert!(!set.contains(3));
    }

    #[test]
    fn out_of_capacity_rejected() {
        let mut set = DocSet::dense(10);
        let err = set.add(10).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
        assert!(set.remove(99).is_err());
        assert!(!set.contains(99));
    }

    #[test]
    fn iteration_is_ascending() {
        for dense in [true, false] {
            let mut set = if dense {
                DocSet::dense(200)
            } else {
                DocSet::sparse(200)
            };
            for doc in [199, 0, 64, 63, 128, 5] {
                set.add(doc).unwrap();
            }
            assert_eq!(set.vector(), vec![0, 5, 63, 64, 128, 199]);
        }
    }

    #[test]
    fn next_member_seeks() {
        for dense in [true, false] {
            let mut set = if dense {
                DocSet::dense(300)
            } else {
                DocSet::sparse(300)
            };
            for doc in [2, 70, 200] {
                set.add(doc).unwrap();
            }
            assert_eq!(set.next_member(0), Some(2));
            assert_eq!(set.next_member(2), Some(2));
            assert_eq!(set.next_member(3), Some(70));
            assert_eq!(set.next_member(71), Some(200));
            assert_eq!(set.next_member(201), None);
            assert_eq!(set.next_member(300), None);
        }
    }

    #[test]
    fn intersection_bounded_by_smaller() {
        let mut a = DocSet::sparse(50);
        let mut b = DocSet::dense(50);
        for doc in [1, 2, 3, 4] {
            a.add(doc).unwrap();
        }
        for doc in [2, 4, 6] {
            b.add(doc).unwrap();
        }
        let min = a.size().min(b.size());
        let both = a.intersect(b).unwrap();
        assert!(both.size() <= min);
        assert_eq!(both.vector(), vec![2, 4]);
    }

    #[test]
    fn intersection_capacity_mismatch() {
        let a = DocSet::sparse(10);
        let b = DocSet::sparse(20);
        assert!(a.intersect(b).is_err());
    }

    #[test]
    fn complement_partitions_capacity() {
        let mut set = DocSet::sparse(130);
        for doc in [0, 64, 129] {
            set.add(doc).unwrap();
        }
        let rest = set.complement();
        assert!(rest.is_dense()); // complement of a sparse set is dense
        assert_eq!(set.size() + rest.size(), 130);
        for doc in 0..130 {
            assert_ne!(set.contains(doc), rest.contains(doc));
        }
    }

    #[test]
    fn complement_of_full_set_is_empty() {
        let mut set = DocSet::dense(65);
        for doc in 0..65 {
            set.add(doc).unwrap();
        }
        let rest = set.complement();
        assert_eq!(rest.size(), 0);
        assert_eq!(rest.vector(), Vec::<u32>::new());
    }
}
