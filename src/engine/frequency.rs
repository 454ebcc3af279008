use std::collections::HashMap;

use parking_lot::Mutex;

use crate::core::error::Result;
use crate::core::types::TermEntry;
use crate::corpus::reader::{CorpusReader, PostingsCursor};
use crate::docmap::map::DocMap;
use crate::docset::filter::FilteredCursor;
use crate::docset::set::DocSet;
use crate::engine::pool::{Task, run_tasks};
use crate::engine::progress::Progress;
use crate::engine::table::{CountTable, NONE_COLUMN, TOTAL_COLUMN};
use crate::lexicon::lexicon::Lexicon;

/// Column selection for per-term counting. Frequency and POS counting
/// share the per-term fan-out and differ only here.
#[derive(Clone, Copy)]
pub enum ColumnMode<'a> {
    /// Everything lands in one total column.
    Total,
    /// Column = the document's split attribute value.
    Split(&'a DocMap<String>),
    /// Column = the occurrence's payload (one count per occurrence).
    Payload,
}

/// Count one task per lexicon-accepted term into a shared table.
///
/// The term fan-out is driven through the lexicon's compiled matcher
/// over the reader's term enumeration. Each task walks its postings
/// (optionally restricted to the sample set), accumulates into a
/// task-local map and folds it into the shared table under a single
/// lock, once per term.
pub fn count_by_term<'a, R>(
    reader: &'a R,
    lexicon: &'a Lexicon,
    field: &str,
    sample: Option<&'a DocSet>,
    mode: ColumnMode<'a>,
    threads: usize,
    progress: &Progress,
) -> Result<CountTable>
where
    R: CorpusReader + ?Sized,
{
    let shared = Mutex::new(CountTable::new(lexicon.size()));
    if let ColumnMode::Split(map) = mode {
        // Pre-intern split columns in value-code order so the column set
        // does not depend on task completion order
        let mut table = shared.lock();
        for code in 0..map.value_count() as u32 {
            if let Some(value) = map.value_of_code(code) {
                table.column(value);
            }
        }
    }

    let shared_ref = &shared;
    let tasks = lexicon
        .filter_matching(reader.terms(field)?)
        .map(move |(row, entry)| {
            let field = field.to_string();
            Box::new(move || {
                count_term(reader, &field, row as u32, entry, sample, mode, shared_ref)
            }) as Task<'_>
        });
    run_tasks(threads, lexicon.size(), tasks, progress)?;
    Ok(shared.into_inner())
}

fn count_term<R>(
    reader: &R,
    field: &str,
    row: u32,
    entry: TermEntry,
    sample: Option<&DocSet>,
    mode: ColumnMode<'_>,
    shared: &Mutex<CountTable>,
) -> Result<()>
where
    R: CorpusReader + ?Sized,
{
    let cursor = match reader.postings(field, &entry.term)? {
        Some(cursor) => cursor,
        None => return Ok(()), // term vanished between enumeration and now
    };
    let mut cursor: Box<dyn PostingsCursor + '_> = match sample {
        Some(set) => Box::new(FilteredCursor::new(set, cursor)),
        None => cursor,
    };

    let mut local: HashMap<String, u64> = HashMap::new();
    while let Some(doc) = cursor.next_doc() {
        match mode {
            ColumnMode::Total => {
                *local.entry(TOTAL_COLUMN.to_string()).or_insert(0) += cursor.term_freq() as u64;
            }
            ColumnMode::Split(map) => {
                let key = match map.get(doc)? {
                    Some(value) => value.clone(),
                    None => NONE_COLUMN.to_string(),
                };
                *local.entry(key).or_insert(0) += cursor.term_freq() as u64;
            }
            ColumnMode::Payload => {
                for payload in cursor.payloads() {
                    let tag = if payload.is_empty() {
                        NONE_COLUMN.to_string()
                    } else {
                        String::from_utf8_lossy(payload).into_owned()
                    };
                    *local.entry(tag).or_insert(0) += 1;
                }
            }
        }
    }

    let mut table = shared.lock();
    for (key, count) in local {
        table.add_keyed(row, &key, count);
    }
    Ok(())
}
