use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::core::error::Result;
use crate::engine::table::CountTable;
use crate::lexicon::lexicon::Lexicon;

/// Write the lexicon as a delimited dump: one row per term in canonical
/// order, with term frequency and document frequency columns.
pub fn write_lexicon<W: Write>(
    out: &mut W,
    lexicon: &Lexicon,
    row_id_header: &str,
    delimiter: char,
) -> Result<()> {
    writeln!(out, "{0}{1}tf{1}df", row_id_header, delimiter)?;
    for term in lexicon.iter() {
        writeln!(
            out,
            "{1}{0}{2}{0}{3}",
            delimiter,
            term.text(),
            term.term_freq,
            term.doc_freq
        )?;
    }
    Ok(())
}

/// Write a count table as a delimited dump: one row per lexicon term in
/// canonical order, one column per interned key in lexicographic order.
/// Absent cells are left empty rather than written as zero.
///
/// Column order is normalized here because interning order depends on
/// which worker touched a key first.
pub fn write_table<W: Write>(
    out: &mut W,
    lexicon: &Lexicon,
    table: &CountTable,
    row_id_header: &str,
    delimiter: char,
) -> Result<()> {
    let mut keys: Vec<&str> = table.columns().iter().map(|key| key.as_str()).collect();
    keys.sort_unstable();

    write!(out, "{}", row_id_header)?;
    for key in &keys {
        write!(out, "{}{}", delimiter, key)?;
    }
    writeln!(out)?;

    for (row, term) in lexicon.iter().enumerate() {
        write!(out, "{}", term.text())?;
        for key in &keys {
            match table.get(row as u32, key) {
                Some(count) => write!(out, "{}{}", delimiter, count)?,
                None => write!(out, "{}", delimiter)?,
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn save_lexicon(
    path: impl AsRef<Path>,
    lexicon: &Lexicon,
    row_id_header: &str,
    delimiter: char,
) -> Result<()> {
    let mut out = BufWriter::new(File::create(path.as_ref())?);
    write_lexicon(&mut out, lexicon, row_id_header, delimiter)?;
    out.flush()?;
    Ok(())
}

pub fn save_table(
    path: impl AsRef<Path>,
    lexicon: &Lexicon,
    table: &CountTable,
    row_id_header: &str,
    delimiter: char,
) -> Result<()> {
    let mut out = BufWriter::new(File::create(path.as_ref())?);
    write_table(&mut out, lexicon, table, row_id_header, delimiter)?;
    out.flush()?;
    Ok(())
}
