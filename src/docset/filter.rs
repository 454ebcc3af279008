use crate::core::types::DocOrd;
use crate::corpus::reader::PostingsCursor;
use crate::docset::set::DocSet;

/// Postings cursor restricted to the members of a [`DocSet`].
///
/// Wraps the source cursor and yields only documents present in the set,
/// preserving frequency, position and payload access. The walk is a
/// merge: seek the next set member >= target, advance the source to at
/// least that ordinal, check membership where it lands, and restart past
/// the landing ordinal on a miss. Either side running out ends the
/// stream.
pub struct FilteredCursor<'a> {
    set: &'a DocSet,
    inner: Box<dyn PostingsCursor + 'a>,
    started: bool,
    exhausted: bool,
}

impl<'a> FilteredCursor<'a> {
    pub fn new(set: &'a DocSet, inner: Box<dyn PostingsCursor + 'a>) -> Self {
        FilteredCursor {
            set,
            inner,
            started: false,
            exhausted: false,
        }
    }

    fn seek(&mut self, mut target: DocOrd) -> Option<DocOrd> {
        loop {
            let member = match self.set.next_member(target) {
                Some(member) => member,
                None => {
                    self.exhausted = true;
                    return None;
                }
            };
            let landed = match self.inner.advance(member) {
                Some(landed) => landed,
                None => {
                    self.exhausted = true;
                    return None;
                }
            };
            if self.set.contains(landed) {
                return Some(landed);
            }
            target = landed + 1;
        }
    }
}

impl PostingsCursor for FilteredCursor<'_> {
    fn next_doc(&mut self) -> Option<DocOrd> {
        if self.exhausted {
            return None;
        }
        let target = if self.started { self.inner.doc() + 1 } else { 0 };
        self.started = true;
        self.seek(target)
    }

    fn advance(&mut self, target: DocOrd) -> Option<DocOrd> {
        if self.exhausted {
            return None;
        }
        if self.started && self.inner.doc() >= target && self.set.contains(self.inner.doc()) {
            return Some(self.inner.doc());
        }
        self.started = true;
        self.seek(target)
    }

    fn doc(&self) -> DocOrd {
        self.inner.doc()
    }

    fn term_freq(&self) -> u32 {
        self.inner.term_freq()
    }

    fn positions(&self) -> &[u32] {
        self.inner.positions()
    }

    fn payloads(&self) -> &[Vec<u8>] {
        self.inner.payloads()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::memory::MemoryCorpus;
    use crate::corpus::reader::CorpusReader;

    fn corpus() -> MemoryCorpus {
        let mut corpus = MemoryCorpus::new();
        for doc in 0..10u32 {
            // "x" occurs doc+1 times in every even document
            if doc % 2 == 0 {
                let tokens: Vec<&str> = (0..=doc).map(|_| "x").collect();
                corpus.index_text(doc, "text", &tokens);
            } else {
                corpus.index_text(doc, "text", &["y"]);
            }
        }
        corpus
    }

    #[test]
    fn filter_keeps_members_only() {
        let corpus = corpus();
        let mut set = DocSet::sparse(10);
        for doc in [0, 3, 4, 9] {
            set.add(doc).unwrap();
        }
        let inner = corpus.postings("text", b"x").unwrap().unwrap();
        let mut filtered = FilteredCursor::new(&set, inner);
        assert_eq!(filtered.next_doc(), Some(0));
        assert_eq!(filtered.term_freq(), 1);
        assert_eq!(filtered.next_doc(), Some(4));
        assert_eq!(filtered.term_freq(), 5);
        assert_eq!(filtered.next_doc(), None);
        assert_eq!(filtered.next_doc(), None);
    }

    #[test]
    fn filtered_count_matches_membership() {
        let corpus = corpus();
        let mut set = DocSet::dense(10);
        for doc in [2, 5, 6] {
            set.add(doc).unwrap();
        }
        let inner = corpus.postings("text", b"x").unwrap().unwrap();
        let mut filtered = FilteredCursor::new(&set, inner);
        let mut seen = Vec::new();
        while let Some(doc) = filtered.next_doc() {
            seen.push(doc);
        }
        // even docs carrying "x", restricted to the set
        assert_eq!(seen, vec![2, 6]);
    }

    #[test]
    fn advance_skips_non_members() {
        let corpus = corpus();
        let mut set = DocSet::sparse(10);
        set.add(8).unwrap();
        let inner = corpus.postings("text", b"x").unwrap().unwrap();
        let mut filtered = FilteredCursor::new(&set, inner);
        assert_eq!(filtered.advance(1), Some(8));
        assert_eq!(filtered.advance(8), Some(8));
        assert_eq!(filtered.next_doc(), None);
    }

    #[test]
    fn empty_set_yields_nothing() {
        let corpus = corpus();
        let set = DocSet::sparse(10);
        let inner = corpus.postings("text", b"x").unwrap().unwrap();
        let mut filtered = FilteredCursor::new(&set, inner);
        assert_eq!(filtered.next_doc(), None);
    }
}
