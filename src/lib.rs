pub mod core;
pub mod corpus;
pub mod docset;
pub mod docmap;
pub mod lexicon;
pub mod matrix;
pub mod engine;
pub mod export;

/*
┌──────────────────────────────────────────────────────────────────────────┐
│                       CORPUSTAT STRUCT ARCHITECTURE                      │
└──────────────────────────────────────────────────────────────────────────┘

┌────────────────────────────── ENGINE LAYER ──────────────────────────────┐
│                                                                          │
│  ┌────────────────────────────────────────────────────────────────────┐ │
│  │                 struct AggregationEngine<'a, R>                    │ │
│  │  reader: &'a R                 // CorpusReader snapshot            │ │
│  │  config: AnalysisConfig        // validated, immutable per run     │ │
│  │                                                                    │ │
│  │  build_lexicon()      -> Lexicon                                   │ │
│  │  build_sample()       -> Option<DocSet>                            │ │
│  │  build_split_map()    -> Option<DocMap<String>>                    │ │
│  │  count_frequencies()  -> CountTable   (per-term fan-out)           │ │
│  │  count_pos_tags()     -> CountTable   (per-term fan-out)           │ │
│  │  count_cooccurrences()-> SparseMatrix (per-document fan-out)       │ │
│  └────────────────────────────────────────────────────────────────────┘ │
│                                                                          │
│  ┌──────────────────────┐  ┌─────────────────────────────────────────┐ │
│  │ pool::run_tasks      │  │ struct Progress                         │ │
│  │ • crossbeam scope    │  │ • throttled eprintln snapshots          │ │
│  │ • bounded channel    │  └─────────────────────────────────────────┘ │
│  │ • first-error latch  │                                              │
│  └──────────────────────┘                                              │
└──────────────────────────────────────────────────────────────────────────┘

┌─────────────────────────────── DATA LAYER ───────────────────────────────┐
│                                                                          │
│  ┌─────────────────────┐  ┌─────────────────────┐  ┌─────────────────┐  │
│  │ struct Lexicon      │  │ struct DocSet       │  │ struct DocMap<T>│  │
│  │ • terms: Vec<Term>  │  │ • Dense(Vec<u64>)   │  │ • keys/codes    │  │
│  │   (canonical order) │  │   | Sparse(Roaring) │  │   parallel vecs │  │
│  │ • matcher: fst::Map │  │ • cached size       │  │ • sealed state  │  │
│  │ • save/load bincode │  │ • intersect/        │  │ • doc_of via    │  │
│  └─────────────────────┘  │   complement        │  │   partition pt  │  │
│                           └─────────────────────┘  └─────────────────┘  │
│                                                                          │
│  ┌─────────────────────┐  ┌─────────────────────────────────────────┐   │
│  │ struct SparseMatrix │  │ struct CountTable                       │   │
│  │ • rows: HashMap     │  │ • interned string columns               │   │
│  │ • merge (additive)  │  │ • sparse cells per canonical row        │   │
│  │ • binary codec      │  └─────────────────────────────────────────┘   │
│  └─────────────────────┘                                                │
└──────────────────────────────────────────────────────────────────────────┘

┌────────────────────────────── CORPUS SEAM ───────────────────────────────┐
│  trait CorpusReader   doc_count / has_field / terms / postings /         │
│                       stored_value / tokens                              │
│  trait PostingsCursor next_doc / advance / doc / term_freq /             │
│                       positions / payloads                               │
│  MemoryCorpus         in-memory implementation, used by the test suite   │
│  FilteredCursor       postings restricted to a DocSet sample             │
└──────────────────────────────────────────────────────────────────────────┘
*/
