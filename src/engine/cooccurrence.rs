use parking_lot::Mutex;

use crate::core::error::Result;
use crate::core::types::DocOrd;
use crate::corpus::reader::CorpusReader;
use crate::docset::set::DocSet;
use crate::engine::pool::{Task, run_tasks};
use crate::engine::progress::Progress;
use crate::lexicon::lexicon::Lexicon;
use crate::matrix::sparse::SparseMatrix;

/// Count windowed term co-occurrences, one task per document.
///
/// Cells are directional: row = focus term, column = context term, for
/// every context position within `w_pre` tokens before or `w_pos`
/// tokens after the focus. Each in-window pair contributes exactly 1.
/// Tasks accumulate into private matrices; only the per-task merge into
/// the shared accumulator takes the lock, which keeps the high-rate
/// `update` path lock-free.
pub fn count_by_document<'a, R>(
    reader: &'a R,
    lexicon: &'a Lexicon,
    field: &str,
    sample: Option<&DocSet>,
    w_pre: u32,
    w_pos: u32,
    threads: usize,
    progress: &Progress,
) -> Result<SparseMatrix>
where
    R: CorpusReader + ?Sized,
{
    let docs: Vec<DocOrd> = match sample {
        Some(set) => set.vector(),
        None => (0..reader.doc_count()).collect(),
    };
    let total = docs.len();
    let shared = Mutex::new(SparseMatrix::new());

    let shared_ref = &shared;
    let tasks = docs.into_iter().map(move |doc| {
        let field = field.to_string();
        Box::new(move || {
            let local = count_document(reader, lexicon, &field, doc, w_pre, w_pos)?;
            if !local.is_empty() {
                shared_ref.lock().merge(local);
            }
            Ok(())
        }) as Task<'_>
    });
    run_tasks(threads, total, tasks, progress)?;
    Ok(shared.into_inner())
}

fn count_document<R>(
    reader: &R,
    lexicon: &Lexicon,
    field: &str,
    doc: DocOrd,
    w_pre: u32,
    w_pos: u32,
) -> Result<SparseMatrix>
where
    R: CorpusReader + ?Sized,
{
    let tokens = reader.tokens(doc, field)?;
    // Resolve canonical indices once; out-of-lexicon tokens keep their
    // position so they still consume window distance
    let resolved: Vec<(u32, Option<u32>)> = tokens
        .iter()
        .map(|token| {
            (
                token.position,
                lexicon.index_of(&token.term).map(|index| index as u32),
            )
        })
        .collect();

    let mut local = SparseMatrix::new();
    for (at, &(position, row)) in resolved.iter().enumerate() {
        let row = match row {
            Some(row) => row,
            None => continue,
        };
        for &(context, col) in resolved[..at].iter().rev() {
            if position - context > w_pre {
                break;
            }
            if let Some(col) = col {
                local.update(row, col, 1.0);
            }
        }
        for &(context, col) in &resolved[at + 1..] {
            if context - position > w_pos {
                break;
            }
            if let Some(col) = col {
                local.update(row, col, 1.0);
            }
        }
    }
    Ok(local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::memory::MemoryCorpus;

    fn run(
        corpus: &MemoryCorpus,
        sample: Option<&DocSet>,
        w_pre: u32,
        w_pos: u32,
    ) -> SparseMatrix {
        let lexicon = Lexicon::build(corpus, "text", 1).unwrap();
        let progress = Progress::new("test", true);
        count_by_document(corpus, &lexicon, "text", sample, w_pre, w_pos, 2, &progress).unwrap()
    }

    #[test]
    fn unit_window_counts_adjacent_pairs_only() {
        let mut corpus = MemoryCorpus::new();
        corpus.index_text(0, "text", &["a", "b", "c"]);
        let lexicon = Lexicon::build(&corpus, "text", 1).unwrap();
        let matrix = run(&corpus, None, 1, 1);

        let a = lexicon.index_of(b"a").unwrap() as u32;
        let b = lexicon.index_of(b"b").unwrap() as u32;
        let c = lexicon.index_of(b"c").unwrap() as u32;
        let mut expected = vec![(a, b, 1.0), (b, a, 1.0), (b, c, 1.0), (c, b, 1.0)];
        expected.sort_by(|x, y| (x.0, x.1).cmp(&(y.0, y.1)));
        assert_eq!(matrix.to_triplets(), expected);
        // distance 2 exceeds the window: no (a, c) cell
        assert_eq!(matrix.size(), 4);
    }

    #[test]
    fn asymmetric_window_is_directional() {
        let mut corpus = MemoryCorpus::new();
        corpus.index_text(0, "text", &["a", "b"]);
        let lexicon = Lexicon::build(&corpus, "text", 1).unwrap();
        let matrix = run(&corpus, None, 0, 1);
        let a = lexicon.index_of(b"a").unwrap() as u32;
        let b = lexicon.index_of(b"b").unwrap() as u32;
        // only forward context: a sees b, b sees nothing behind it
        assert_eq!(matrix.to_triplets(), vec![(a, b, 1.0)]);
    }

    #[test]
    fn sample_restricts_documents() {
        let mut corpus = MemoryCorpus::new();
        corpus.index_text(0, "text", &["a", "b"]);
        corpus.index_text(1, "text", &["a", "b"]);
        let mut set = DocSet::sparse(2);
        set.add(1).unwrap();
        let matrix = run(&corpus, Some(&set), 1, 1);
        assert_eq!(matrix.size(), 2);
        let total: f64 = matrix.to_triplets().iter().map(|t| t.2).sum();
        assert_eq!(total, 2.0);
    }

    #[test]
    fn repeated_terms_accumulate() {
        let mut corpus = MemoryCorpus::new();
        corpus.index_text(0, "text", &["a", "a", "a"]);
        let matrix = run(&corpus, None, 1, 1);
        // (a,a) from each adjacent ordered pair: 4 in total
        assert_eq!(matrix.to_triplets(), vec![(0, 0, 4.0)]);
    }
}
