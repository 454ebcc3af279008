/// Document ordinal within a corpus snapshot.
///
/// Ordinals are dense, start at zero and are only meaningful for the
/// snapshot they were assigned in.
pub type DocOrd = u32;

/// One distinct term of a field as enumerated by the corpus reader,
/// with its corpus-wide statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermEntry {
    pub term: Vec<u8>,
    pub term_freq: u64, // Total occurrences across the corpus
    pub doc_freq: u32,  // Number of documents containing the term
}

/// A single token occurrence inside one document's field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenOcc {
    pub position: u32,
    pub term: Vec<u8>,
    /// Arbitrary per-token payload bytes (e.g. a part-of-speech tag).
    pub payload: Option<Vec<u8>>,
}
