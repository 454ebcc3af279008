use std::borrow::Cow;
use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// A canonical vocabulary entry. Immutable once the lexicon is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub term: Vec<u8>,
    pub term_freq: u64,
    pub doc_freq: u32,
}

impl Term {
    /// Lossy UTF-8 view for display and delimited dumps.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.term)
    }
}

/// Canonical term order: descending corpus frequency, lexicographic
/// byte order as tie-break. The rank under this order is the term's
/// canonical index, the authoritative key of every downstream table.
pub fn canonical_cmp(a: &Term, b: &Term) -> Ordering {
    b.term_freq
        .cmp(&a.term_freq)
        .then_with(|| a.term.cmp(&b.term))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(bytes: &[u8], freq: u64) -> Term {
        Term {
            term: bytes.to_vec(),
            term_freq: freq,
            doc_freq: 1,
        }
    }

    #[test]
    fn higher_frequency_ranks_first() {
        assert_eq!(
            canonical_cmp(&term(b"z", 10), &term(b"a", 3)),
            Ordering::Less
        );
    }

    #[test]
    fn byte_order_breaks_ties() {
        assert_eq!(
            canonical_cmp(&term(b"a", 5), &term(b"c", 5)),
            Ordering::Less
        );
        assert_eq!(
            canonical_cmp(&term(b"c", 5), &term(b"a", 5)),
            Ordering::Greater
        );
    }
}
