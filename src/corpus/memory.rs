use std::collections::{BTreeMap, HashMap};

use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{DocOrd, TermEntry, TokenOcc};
use crate::corpus::reader::{CorpusReader, PostingsCursor};

/// One term occurrence record: a document and the positions (with
/// payloads) of the term inside it.
#[derive(Debug, Clone)]
pub struct Posting {
    pub doc: DocOrd,
    pub positions: Vec<u32>,
    pub payloads: Vec<Vec<u8>>, // Aligned with positions
}

/// Posting list for a term, sorted by document ordinal.
#[derive(Debug, Clone, Default)]
pub struct PostingList {
    pub postings: Vec<Posting>,
}

impl PostingList {
    pub fn doc_freq(&self) -> u32 {
        self.postings.len() as u32
    }

    pub fn total_freq(&self) -> u64 {
        self.postings.iter().map(|p| p.positions.len() as u64).sum()
    }

    fn occurrence(&mut self, doc: DocOrd, position: u32, payload: Option<&[u8]>) {
        // Keep sorted by doc for cursor seeks
        match self.postings.binary_search_by_key(&doc, |p| p.doc) {
            Ok(at) => {
                let posting = &mut self.postings[at];
                posting.positions.push(position);
                posting.payloads.push(payload.map(|p| p.to_vec()).unwrap_or_default());
            }
            Err(at) => {
                self.postings.insert(
                    at,
                    Posting {
                        doc,
                        positions: vec![position],
                        payloads: vec![payload.map(|p| p.to_vec()).unwrap_or_default()],
                    },
                );
            }
        }
    }
}

#[derive(Debug, Default)]
struct FieldIndex {
    postings: BTreeMap<Vec<u8>, PostingList>,
    docs: HashMap<DocOrd, Vec<TokenOcc>>,
}

/// In-memory positional inverted index implementing [`CorpusReader`].
///
/// The reference collaborator: tests and benches run against it, and it
/// doubles as the template for adapting a real index reader to the seam.
#[derive(Debug, Default)]
pub struct MemoryCorpus {
    doc_count: u32,
    fields: HashMap<String, FieldIndex>,
    stored: HashMap<String, HashMap<DocOrd, String>>,
}

impl MemoryCorpus {
    pub fn new() -> Self {
        MemoryCorpus::default()
    }

    /// Index a run of annotated tokens `(term, payload)` into one field
    /// of a document, appending after any tokens already indexed for it.
    pub fn index_tokens(&mut self, doc: DocOrd, field: &str, tokens: &[(&str, Option<&str>)]) {
        self.doc_count = self.doc_count.max(doc + 1);
        let index = self.fields.entry(field.to_string()).or_default();
        let stream = index.docs.entry(doc).or_default();
        for (term, payload) in tokens {
            let position = stream.len() as u32;
            stream.push(TokenOcc {
                position,
                term: term.as_bytes().to_vec(),
                payload: payload.map(|p| p.as_bytes().to_vec()),
            });
            index
                .postings
                .entry(term.as_bytes().to_vec())
                .or_default()
                .occurrence(doc, position, payload.map(|p| p.as_bytes()));
        }
    }

    /// Index plain tokens without payloads.
    pub fn index_text(&mut self, doc: DocOrd, field: &str, tokens: &[&str]) {
        let annotated: Vec<(&str, Option<&str>)> = tokens.iter().map(|t| (*t, None)).collect();
        self.index_tokens(doc, field, &annotated);
    }

    /// Store a non-indexed field value for a document (e.g. a
    /// stratification attribute).
    pub fn store_value(&mut self, doc: DocOrd, field: &str, value: &str) {
        self.doc_count = self.doc_count.max(doc + 1);
        self.stored
            .entry(field.to_string())
            .or_default()
            .insert(doc, value.to_string());
    }

    fn field_index(&self, field: &str) -> Result<&FieldIndex> {
        self.fields.get(field).ok_or_else(|| {
            Error::new(ErrorKind::MissingField, format!("no indexed field '{}'", field))
        })
    }
}

impl CorpusReader for MemoryCorpus {
    fn doc_count(&self) -> u32 {
        self.doc_count
    }

    fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field) || self.stored.contains_key(field)
    }

    fn terms<'a>(&'a self, field: &str) -> Result<Box<dyn Iterator<Item = TermEntry> + 'a>> {
        let index = self.field_index(field)?;
        Ok(Box::new(index.postings.iter().map(|(term, list)| TermEntry {
            term: term.clone(),
            term_freq: list.total_freq(),
            doc_freq: list.doc_freq(),
        })))
    }

    fn postings<'a>(
        &'a self,
        field: &str,
        term: &[u8],
    ) -> Result<Option<Box<dyn PostingsCursor + 'a>>> {
        let index = self.field_index(field)?;
        Ok(index
            .postings
            .get(term)
            .map(|list| Box::new(MemoryPostingsCursor::new(list)) as Box<dyn PostingsCursor>))
    }

    fn stored_value(&self, doc: DocOrd, field: &str) -> Result<Option<String>> {
        let values = self.stored.get(field).ok_or_else(|| {
            Error::new(ErrorKind::MissingField, format!("no stored field '{}'", field))
        })?;
        Ok(values.get(&doc).cloned())
    }

    fn tokens(&self, doc: DocOrd, field: &str) -> Result<Vec<TokenOcc>> {
        let index = self.field_index(field)?;
        Ok(index.docs.get(&doc).cloned().unwrap_or_default())
    }
}

/// Cursor over one in-memory posting list.
pub struct MemoryPostingsCursor<'a> {
    list: &'a PostingList,
    next: usize,
    current: Option<usize>,
}

impl<'a> MemoryPostingsCursor<'a> {
    fn new(list: &'a PostingList) -> Self {
        MemoryPostingsCursor {
            list,
            next: 0,
            current: None,
        }
    }
}

const NO_PAYLOADS: &[Vec<u8>] = &[];

impl PostingsCursor for MemoryPostingsCursor<'_> {
    fn next_doc(&mut self) -> Option<DocOrd> {
        if self.next >= self.list.postings.len() {
            self.current = None;
            return None;
        }
        let at = self.next;
        self.current = Some(at);
        self.next += 1;
        Some(self.list.postings[at].doc)
    }

    fn advance(&mut self, target: DocOrd) -> Option<DocOrd> {
        if let Some(at) = self.current {
            if self.list.postings[at].doc >= target {
                return Some(self.list.postings[at].doc);
            }
        }
        let tail = &self.list.postings[self.next..];
        let offset = match tail.binary_search_by_key(&target, |p| p.doc) {
            Ok(at) => at,
            Err(at) => at,
        };
        let at = self.next + offset;
        if at >= self.list.postings.len() {
            self.current = None;
            self.next = self.list.postings.len();
            return None;
        }
        self.current = Some(at);
        self.next = at + 1;
        Some(self.list.postings[at].doc)
    }

    fn doc(&self) -> DocOrd {
        self.current.map_or(0, |at| self.list.postings[at].doc)
    }

    fn term_freq(&self) -> u32 {
        self.current
            .map_or(0, |at| self.list.postings[at].positions.len() as u32)
    }

    fn positions(&self) -> &[u32] {
        self.current
            .map_or(&[], |at| &self.list.postings[at].positions)
    }

    fn payloads(&self) -> &[Vec<u8>] {
        self.current
            .map_or(NO_PAYLOADS, |at| &self.list.postings[at].payloads)
    }
}
