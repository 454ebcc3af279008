use std::collections::HashMap;

/// Column key used when frequency counting runs without a split field.
pub const TOTAL_COLUMN: &str = "_total_";

/// Column key for documents lacking a split attribute (or occurrences
/// lacking a payload). Kept explicit so no count is silently dropped.
pub const NONE_COLUMN: &str = "_none_";

/// Two-dimensional count table: rows are canonical term indices, columns
/// are interned string keys (split values or POS tags).
#[derive(Debug, Clone)]
pub struct CountTable {
    columns: Vec<String>,
    column_index: HashMap<String, u32>,
    rows: Vec<HashMap<u32, u64>>, // Sparse cells per canonical row
}

impl CountTable {
    /// Table with a fixed row count (the lexicon size) and no columns yet.
    pub fn new(row_count: usize) -> Self {
        CountTable {
            columns: Vec::new(),
            column_index: HashMap::new(),
            rows: vec![HashMap::new(); row_count],
        }
    }

    /// Intern a column key, returning its index.
    pub fn column(&mut self, key: &str) -> u32 {
        if let Some(&col) = self.column_index.get(key) {
            return col;
        }
        let col = self.columns.len() as u32;
        self.columns.push(key.to_string());
        self.column_index.insert(key.to_string(), col);
        col
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_key(&self, col: u32) -> Option<&str> {
        self.columns.get(col as usize).map(|s| s.as_str())
    }

    pub fn add(&mut self, row: u32, col: u32, delta: u64) {
        *self.rows[row as usize].entry(col).or_insert(0) += delta;
    }

    pub fn add_keyed(&mut self, row: u32, key: &str, delta: u64) {
        let col = self.column(key);
        self.add(row, col, delta);
    }

    /// Accumulated count at (row, column key), if the cell exists.
    pub fn get(&self, row: u32, key: &str) -> Option<u64> {
        let col = self.column_index.get(key)?;
        self.rows.get(row as usize)?.get(col).copied()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Total of all cells in one row.
    pub fn row_total(&self, row: u32) -> u64 {
        self.rows
            .get(row as usize)
            .map_or(0, |cells| cells.values().sum())
    }
}
