use crate::core::error::Result;
use crate::core::types::{DocOrd, TermEntry, TokenOcc};

/// Cursor over the postings of one term, ordered by ascending document
/// ordinal.
///
/// The accessor methods (`doc`, `term_freq`, `positions`, `payloads`)
/// are only meaningful after `next_doc` or `advance` returned `Some`.
/// Each cursor is independently positioned; obtaining one never affects
/// another.
pub trait PostingsCursor {
    /// Move to the next document containing the term. `None` when the
    /// stream is exhausted.
    fn next_doc(&mut self) -> Option<DocOrd>;

    /// Move to the first document with ordinal >= `target`. `None` when
    /// no such document exists. Seeking backwards is a caller error and
    /// may yield the current document again.
    fn advance(&mut self, target: DocOrd) -> Option<DocOrd>;

    /// Ordinal of the current document.
    fn doc(&self) -> DocOrd;

    /// Occurrences of the term within the current document.
    fn term_freq(&self) -> u32;

    /// Token positions of the occurrences, ascending.
    fn positions(&self) -> &[u32];

    /// Per-position payload bytes (e.g. a part-of-speech tag), aligned
    /// with `positions()`. Empty payloads are represented as empty slices.
    fn payloads(&self) -> &[Vec<u8>];
}

/// Read-only handle over an indexed corpus snapshot.
///
/// This is the boundary to the indexing collaborator: the engine never
/// sees the on-disk index format, only term enumeration, positional
/// postings, stored field values and per-document token streams.
/// Implementations must support unsynchronized concurrent reads.
pub trait CorpusReader: Sync {
    /// Total number of documents in the snapshot. Ordinals are dense in
    /// `[0, doc_count)`.
    fn doc_count(&self) -> u32;

    /// Whether the snapshot carries the given indexed field.
    fn has_field(&self, field: &str) -> bool;

    /// Enumerate the distinct terms of a field with their corpus-wide
    /// statistics. Enumeration order is unspecified.
    fn terms<'a>(&'a self, field: &str) -> Result<Box<dyn Iterator<Item = TermEntry> + 'a>>;

    /// Open a postings cursor for one term of a field. `None` when the
    /// term does not occur in the field.
    fn postings<'a>(&'a self, field: &str, term: &[u8])
    -> Result<Option<Box<dyn PostingsCursor + 'a>>>;

    /// Stored (non-indexed) field value of a document, if any.
    fn stored_value(&self, doc: DocOrd, field: &str) -> Result<Option<String>>;

    /// The full token stream of one document's field, ordered by
    /// position. Used by per-document counting.
    fn tokens(&self, doc: DocOrd, field: &str) -> Result<Vec<TokenOcc>>;
}
