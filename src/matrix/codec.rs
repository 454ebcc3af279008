use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::core::error::{Error, ErrorKind, Result};
use crate::matrix::sparse::SparseMatrix;

/// Fixed record: `(i32 row, i32 col, f64 value)` in native byte order.
/// No header, no footer, no compression; records are written in
/// row-major triplet order. Correctness of the indices depends on the
/// globally consistent canonical term ordering of the producing run.
pub const RECORD_SIZE: usize = 16;

/// Serialize all cells of `matrix` to `out` in triplet order.
pub fn write_matrix<W: Write>(matrix: &SparseMatrix, out: &mut W) -> Result<()> {
    let mut record = [0u8; RECORD_SIZE];
    for (row, col, value) in matrix.to_triplets() {
        record[0..4].copy_from_slice(&(row as i32).to_ne_bytes());
        record[4..8].copy_from_slice(&(col as i32).to_ne_bytes());
        record[8..16].copy_from_slice(&value.to_ne_bytes());
        out.write_all(&record[..])?;
    }
    Ok(())
}

/// Reconstruct an accumulator by reading records to end-of-stream and
/// applying `update` for each.
pub fn read_matrix<R: Read>(input: &mut R) -> Result<SparseMatrix> {
    let mut matrix = SparseMatrix::new();
    let mut record = [0u8; RECORD_SIZE];
    while read_record(input, &mut record)? {
        let row = i32::from_ne_bytes([record[0], record[1], record[2], record[3]]);
        let col = i32::from_ne_bytes([record[4], record[5], record[6], record[7]]);
        let value = f64::from_ne_bytes([
            record[8], record[9], record[10], record[11], record[12], record[13], record[14],
            record[15],
        ]);
        if row < 0 || col < 0 {
            return Err(Error::new(
                ErrorKind::Parse,
                format!("negative coordinates ({}, {})", row, col),
            ));
        }
        matrix.update(row as u32, col as u32, value);
    }
    Ok(matrix)
}

/// Fill one record; `Ok(false)` on a clean end-of-stream, `Parse` error
/// on a trailing partial record.
fn read_record<R: Read>(input: &mut R, record: &mut [u8; RECORD_SIZE]) -> Result<bool> {
    let mut filled = 0;
    while filled < RECORD_SIZE {
        let n = input.read(&mut record[filled..])?;
        if n == 0 {
            if filled == 0 {
                return Ok(false);
            }
            return Err(Error::new(
                ErrorKind::Parse,
                format!("truncated record: {} trailing bytes", filled),
            ));
        }
        filled += n;
    }
    Ok(true)
}

/// Write the co-occurrence dump file. A file left behind by a failed
/// write is invalid and must not be consumed downstream.
pub fn save(matrix: &SparseMatrix, path: impl AsRef<Path>) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut out = BufWriter::new(file);
    write_matrix(matrix, &mut out)?;
    out.flush()?;
    Ok(())
}

pub fn load(path: impl AsRef<Path>) -> Result<SparseMatrix> {
    let file = File::open(path.as_ref())?;
    read_matrix(&mut BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SparseMatrix {
        let mut m = SparseMatrix::new();
        m.update(0, 1, 1.0);
        m.update(0, 3, 2.0);
        m.update(7, 0, 0.5);
        m.update(2, 2, -4.25);
        m
    }

    #[test]
    fn record_layout_is_fixed() {
        let mut bytes = Vec::new();
        write_matrix(&sample(), &mut bytes).unwrap();
        assert_eq!(bytes.len(), 4 * RECORD_SIZE);
        // First record is the lowest (row, col) cell
        assert_eq!(&bytes[0..4], &0i32.to_ne_bytes());
        assert_eq!(&bytes[4..8], &1i32.to_ne_bytes());
        assert_eq!(&bytes[8..16], &1.0f64.to_ne_bytes());
    }

    #[test]
    fn round_trip_preserves_triplets() {
        let original = sample();
        let mut bytes = Vec::new();
        write_matrix(&original, &mut bytes).unwrap();
        let restored = read_matrix(&mut bytes.as_slice()).unwrap();
        assert_eq!(restored.to_triplets(), original.to_triplets());
        assert_eq!(restored.size(), original.size());
        assert_eq!(restored.last_coordinates(), original.last_coordinates());
    }

    #[test]
    fn empty_stream_is_an_empty_matrix() {
        let restored = read_matrix(&mut [].as_slice()).unwrap();
        assert!(restored.is_empty());
    }

    #[test]
    fn truncated_record_is_rejected() {
        let mut bytes = Vec::new();
        write_matrix(&sample(), &mut bytes).unwrap();
        bytes.truncate(bytes.len() - 3);
        let err = read_matrix(&mut bytes.as_slice()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cooc.bin");
        let original = sample();
        save(&original, &path).unwrap();
        let restored = load(&path).unwrap();
        assert_eq!(restored.to_triplets(), original.to_triplets());
    }
}
