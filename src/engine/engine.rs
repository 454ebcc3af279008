use crate::core::config::AnalysisConfig;
use crate::core::error::{Error, ErrorKind, Result};
use crate::corpus::reader::CorpusReader;
use crate::docmap::map::DocMap;
use crate::docset::set::DocSet;
use crate::engine::frequency::{self, ColumnMode};
use crate::engine::cooccurrence;
use crate::engine::progress::Progress;
use crate::engine::table::CountTable;
use crate::lexicon::lexicon::Lexicon;
use crate::matrix::sparse::SparseMatrix;

/// Orchestrates one read-only aggregation pass over a corpus snapshot.
///
/// Construction validates the configuration snapshot and fails fast on
/// a missing target field. The build methods run single-threaded before
/// any dispatch; their results (lexicon, sample set, split map) are then
/// shared read-only by all worker threads. Counting results depend only
/// on the snapshot and the configuration, never on task completion
/// order.
pub struct AggregationEngine<'a, R: CorpusReader + ?Sized> {
    reader: &'a R,
    config: AnalysisConfig,
}

impl<'a, R> AggregationEngine<'a, R>
where
    R: CorpusReader + ?Sized,
{
    pub fn new(reader: &'a R, config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        if !reader.has_field(&config.field) {
            return Err(Error::new(
                ErrorKind::MissingField,
                format!("target field '{}' not in corpus", config.field),
            ));
        }
        Ok(AggregationEngine { reader, config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Canonical vocabulary over the configured field and cutoff.
    pub fn build_lexicon(&self) -> Result<Lexicon> {
        Lexicon::build(self.reader, &self.config.field, self.config.min_term_freq)
    }

    /// Active document sample from the configured filter term, if any.
    /// A filter term with no postings yields an empty (not absent) set.
    pub fn build_sample(&self) -> Result<Option<DocSet>> {
        let (field, term) = match (&self.config.filter_field, &self.config.filter_term) {
            (Some(field), Some(term)) => (field, term),
            _ => return Ok(None),
        };
        let mut set = DocSet::sparse(self.reader.doc_count());
        if let Some(mut cursor) = self.reader.postings(field, term.as_bytes())? {
            set.add_postings(cursor.as_mut())?;
        }
        Ok(Some(set))
    }

    /// Split-attribute map from the configured split field, if any.
    /// Document ordinals are scanned in ascending order, satisfying the
    /// map's monotone-key contract; documents without a stored value are
    /// left unkeyed.
    pub fn build_split_map(&self) -> Result<Option<DocMap<String>>> {
        let field = match &self.config.split_field {
            Some(field) => field,
            None => return Ok(None),
        };
        if !self.reader.has_field(field) {
            return Err(Error::new(
                ErrorKind::MissingField,
                format!("split field '{}' not in corpus", field),
            ));
        }
        let mut map = DocMap::new();
        for doc in 0..self.reader.doc_count() {
            if let Some(value) = self.reader.stored_value(doc, field)? {
                map.add(doc, value)?;
            }
        }
        map.finish()?;
        Ok(Some(map))
    }

    /// Term frequency table: rows in canonical order, one total column
    /// or one column per split value.
    pub fn count_frequencies(
        &self,
        lexicon: &Lexicon,
        sample: Option<&DocSet>,
        split: Option<&DocMap<String>>,
    ) -> Result<CountTable> {
        let progress = Progress::new("frequency counting", self.config.quiet);
        let mode = match split {
            Some(map) => ColumnMode::Split(map),
            None => ColumnMode::Total,
        };
        frequency::count_by_term(
            self.reader,
            lexicon,
            &self.config.field,
            sample,
            mode,
            self.config.threads,
            &progress,
        )
    }

    /// POS tag table: rows in canonical order, one column per payload
    /// tag, one count per occurrence.
    pub fn count_pos_tags(
        &self,
        lexicon: &Lexicon,
        sample: Option<&DocSet>,
    ) -> Result<CountTable> {
        let progress = Progress::new("pos counting", self.config.quiet);
        frequency::count_by_term(
            self.reader,
            lexicon,
            &self.config.field,
            sample,
            ColumnMode::Payload,
            self.config.threads,
            &progress,
        )
    }

    /// Windowed co-occurrence accumulator over the sample (or the whole
    /// corpus when none is configured).
    pub fn count_cooccurrences(
        &self,
        lexicon: &Lexicon,
        sample: Option<&DocSet>,
    ) -> Result<SparseMatrix> {
        let progress = Progress::new("cooccurrence counting", self.config.quiet);
        cooccurrence::count_by_document(
            self.reader,
            lexicon,
            &self.config.field,
            sample,
            self.config.w_pre,
            self.config.w_pos,
            self.config.threads,
            &progress,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::memory::MemoryCorpus;
    use crate::engine::table::TOTAL_COLUMN;

    fn corpus() -> MemoryCorpus {
        let mut corpus = MemoryCorpus::new();
        corpus.index_text(0, "text", &["a", "b", "a"]);
        corpus.index_text(1, "text", &["b", "c"]);
        corpus.index_text(2, "text", &["a", "c", "c"]);
        corpus
    }

    fn config() -> AnalysisConfig {
        AnalysisConfig {
            threads: 2,
            quiet: true,
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn missing_target_field_fails_before_dispatch() {
        let corpus = corpus();
        let bad = AnalysisConfig {
            field: "lemma".to_string(),
            ..config()
        };
        let err = AggregationEngine::new(&corpus, bad).err().unwrap();
        assert_eq!(err.kind, ErrorKind::MissingField);
    }

    #[test]
    fn whole_corpus_frequencies() {
        let corpus = corpus();
        let engine = AggregationEngine::new(&corpus, config()).unwrap();
        let lexicon = engine.build_lexicon().unwrap();
        let table = engine.count_frequencies(&lexicon, None, None).unwrap();

        let count = |term: &[u8]| {
            table
                .get(lexicon.index_of(term).unwrap() as u32, TOTAL_COLUMN)
                .unwrap_or(0)
        };
        assert_eq!(count(b"a"), 3);
        assert_eq!(count(b"b"), 2);
        assert_eq!(count(b"c"), 3);
    }

    #[test]
    fn sampled_frequencies() {
        let corpus = corpus();
        let engine = AggregationEngine::new(&corpus, config()).unwrap();
        let lexicon = engine.build_lexicon().unwrap();
        let mut sample = DocSet::sparse(corpus.doc_count());
        sample.add(0).unwrap();
        sample.add(2).unwrap();
        let table = engine
            .count_frequencies(&lexicon, Some(&sample), None)
            .unwrap();

        let count = |term: &[u8]| {
            table
                .get(lexicon.index_of(term).unwrap() as u32, TOTAL_COLUMN)
                .unwrap_or(0)
        };
        assert_eq!(count(b"a"), 3);
        assert_eq!(count(b"c"), 2);
        assert_eq!(count(b"b"), 1);
    }

    #[test]
    fn split_frequencies_stratify_by_attribute() {
        let mut corpus = corpus();
        corpus.store_value(0, "period", "old");
        corpus.store_value(1, "period", "new");
        // doc 2 left without a period attribute
        let with_split = AnalysisConfig {
            split_field: Some("period".to_string()),
            ..config()
        };
        let engine = AggregationEngine::new(&corpus, with_split).unwrap();
        let lexicon = engine.build_lexicon().unwrap();
        let split = engine.build_split_map().unwrap().unwrap();
        let table = engine
            .count_frequencies(&lexicon, None, Some(&split))
            .unwrap();

        let a = lexicon.index_of(b"a").unwrap() as u32;
        let c = lexicon.index_of(b"c").unwrap() as u32;
        assert_eq!(table.get(a, "old"), Some(2));
        assert_eq!(table.get(a, crate::engine::table::NONE_COLUMN), Some(1));
        assert_eq!(table.get(c, "new"), Some(1));
        assert_eq!(table.get(c, crate::engine::table::NONE_COLUMN), Some(2));
    }

    #[test]
    fn missing_split_field_fails_fast() {
        let corpus = corpus();
        let bad = AnalysisConfig {
            split_field: Some("era".to_string()),
            ..config()
        };
        let engine = AggregationEngine::new(&corpus, bad).unwrap();
        let err = engine.build_split_map().unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingField);
    }

    #[test]
    fn filter_term_builds_sample() {
        let corpus = corpus();
        let filtered = AnalysisConfig {
            filter_field: Some("text".to_string()),
            filter_term: Some("a".to_string()),
            ..config()
        };
        let engine = AggregationEngine::new(&corpus, filtered).unwrap();
        let sample = engine.build_sample().unwrap().unwrap();
        assert_eq!(sample.vector(), vec![0, 2]);
    }

    #[test]
    fn absent_filter_term_gives_empty_sample() {
        let corpus = corpus();
        let filtered = AnalysisConfig {
            filter_field: Some("text".to_string()),
            filter_term: Some("zz".to_string()),
            ..config()
        };
        let engine = AggregationEngine::new(&corpus, filtered).unwrap();
        let sample = engine.build_sample().unwrap().unwrap();
        assert!(sample.is_empty());
    }

    #[test]
    fn pos_counting_buckets_by_payload() {
        let mut corpus = MemoryCorpus::new();
        corpus.index_tokens(0, "text", &[("run", Some("VB")), ("run", Some("NN"))]);
        corpus.index_tokens(1, "text", &[("run", Some("VB"))]);
        let engine = AggregationEngine::new(&corpus, config()).unwrap();
        let lexicon = engine.build_lexicon().unwrap();
        let table = engine.count_pos_tags(&lexicon, None).unwrap();
        let run = lexicon.index_of(b"run").unwrap() as u32;
        assert_eq!(table.get(run, "VB"), Some(2));
        assert_eq!(table.get(run, "NN"), Some(1));
    }

    #[test]
    fn cooccurrence_counts_match_window_scenario() {
        let mut corpus = MemoryCorpus::new();
        corpus.index_text(0, "text", &["a", "b", "c"]);
        let narrow = AnalysisConfig {
            w_pre: 1,
            w_pos: 1,
            ..config()
        };
        let engine = AggregationEngine::new(&corpus, narrow).unwrap();
        let lexicon = engine.build_lexicon().unwrap();
        let matrix = engine.count_cooccurrences(&lexicon, None).unwrap();
        assert_eq!(matrix.size(), 4);
        let a = lexicon.index_of(b"a").unwrap() as u32;
        let c = lexicon.index_of(b"c").unwrap() as u32;
        // distance 2 exceeds the window
        assert!(!matrix.to_triplets().iter().any(|t| (t.0, t.1) == (a, c)));
    }
}
