use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use fst::{Map, MapBuilder};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::TermEntry;
use crate::corpus::reader::CorpusReader;
use crate::lexicon::term::{Term, canonical_cmp};

/// Canonical, frequency-ranked vocabulary over one corpus field.
///
/// Built once per (field, cutoff) pair from an immutable snapshot,
/// read-only afterwards and safe to share across worker threads without
/// locking. The membership matcher is compiled once from the accepted
/// term set as an fst map from term bytes to canonical index.
pub struct Lexicon {
    field: String,
    min_freq: u64,
    u_freq: u64, // Total field tokens
    n_freq: u64, // Tokens covered by accepted terms
    terms: Vec<Term>, // Canonical order
    matcher: Map<Vec<u8>>,
}

/// Persistence snapshot; the fst matcher is recompiled on load.
#[derive(Serialize, Deserialize)]
struct LexiconSnapshot {
    field: String,
    min_freq: u64,
    u_freq: u64,
    n_freq: u64,
    terms: Vec<Term>,
}

impl Lexicon {
    /// Scan every distinct term of `field`, drop those below `min_freq`,
    /// sort the rest canonically and assign indices `0..size`.
    pub fn build<R>(reader: &R, field: &str, min_freq: u64) -> Result<Lexicon>
    where
        R: CorpusReader + ?Sized,
    {
        if !reader.has_field(field) {
            return Err(Error::new(
                ErrorKind::MissingField,
                format!("lexicon field '{}' not in corpus", field),
            ));
        }
        let mut u_freq = 0u64;
        let mut n_freq = 0u64;
        let mut terms = Vec::new();
        for entry in reader.terms(field)? {
            u_freq += entry.term_freq;
            if entry.term_freq >= min_freq {
                n_freq += entry.term_freq;
                terms.push(Term {
                    term: entry.term,
                    term_freq: entry.term_freq,
                    doc_freq: entry.doc_freq,
                });
            }
        }
        terms.par_sort_unstable_by(canonical_cmp);
        let matcher = compile_matcher(&terms)?;
        Ok(Lexicon {
            field: field.to_string(),
            min_freq,
            u_freq,
            n_freq,
            terms,
            matcher,
        })
    }

    pub fn size(&self) -> usize {
        self.terms.len()
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn min_freq(&self) -> u64 {
        self.min_freq
    }

    pub fn u_freq(&self) -> u64 {
        self.u_freq
    }

    pub fn n_freq(&self) -> u64 {
        self.n_freq
    }

    /// Covered fraction of the field's tokens, in `[0, 1]`. An empty
    /// field counts as fully covered.
    pub fn cover(&self) -> f64 {
        if self.u_freq == 0 {
            return 1.0;
        }
        self.n_freq as f64 / self.u_freq as f64
    }

    pub fn contains(&self, term: &[u8]) -> bool {
        self.matcher.contains_key(term)
    }

    /// Canonical index of a term, if accepted.
    pub fn index_of(&self, term: &[u8]) -> Option<usize> {
        self.matcher.get(term).map(|index| index as usize)
    }

    pub fn term_at(&self, index: usize) -> Option<&Term> {
        self.terms.get(index)
    }

    /// Terms in canonical order.
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Term> {
        self.terms.iter()
    }

    /// Restrict an external term enumeration to lexicon members via the
    /// compiled matcher, pairing each entry with its canonical index.
    pub fn filter_matching<'a, I>(&'a self, all_terms: I) -> impl Iterator<Item = (usize, TermEntry)> + 'a
    where
        I: Iterator<Item = TermEntry> + 'a,
    {
        all_terms.filter_map(|entry| self.index_of(&entry.term).map(|index| (index, entry)))
    }

    /// Canonically aligned parallel arrays; the seam for downstream
    /// numeric libraries.
    pub fn to_arrays(&self) -> (Vec<Vec<u8>>, Vec<u64>, Vec<u32>) {
        let mut terms = Vec::with_capacity(self.terms.len());
        let mut term_freqs = Vec::with_capacity(self.terms.len());
        let mut doc_freqs = Vec::with_capacity(self.terms.len());
        for term in &self.terms {
            terms.push(term.term.clone());
            term_freqs.push(term.term_freq);
            doc_freqs.push(term.doc_freq);
        }
        (terms, term_freqs, doc_freqs)
    }

    /// Persist the lexicon so later passes can reuse the canonical
    /// index assignment instead of rescanning the corpus.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let snapshot = LexiconSnapshot {
            field: self.field.clone(),
            min_freq: self.min_freq,
            u_freq: self.u_freq,
            n_freq: self.n_freq,
            terms: self.terms.clone(),
        };
        bincode::serialize_into(BufWriter::new(file), &snapshot)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Lexicon> {
        let file = File::open(path.as_ref())?;
        let snapshot: LexiconSnapshot = bincode::deserialize_from(BufReader::new(file))?;
        let matcher = compile_matcher(&snapshot.terms)?;
        Ok(Lexicon {
            field: snapshot.field,
            min_freq: snapshot.min_freq,
            u_freq: snapshot.u_freq,
            n_freq: snapshot.n_freq,
            terms: snapshot.terms,
            matcher,
        })
    }
}

/// Compile the term → canonical index matcher. fst insertion must be in
/// lexicographic key order, so the canonical ranks are routed through a
/// byte-sorted view.
fn compile_matcher(terms: &[Term]) -> Result<Map<Vec<u8>>> {
    let mut by_bytes: Vec<usize> = (0..terms.len()).collect();
    by_bytes.sort_unstable_by(|&a, &b| terms[a].term.cmp(&terms[b].term));
    let mut builder = MapBuilder::memory();
    for index in by_bytes {
        builder.insert(&terms[index].term, index as u64)?;
    }
    Ok(builder.into_map())
}
