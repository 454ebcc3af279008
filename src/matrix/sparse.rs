use std::collections::HashMap;

/// Mutable sparse (row, col) → value accumulator.
///
/// Backed by nested integer-keyed hash maps for memory density at
/// corpus scale (millions of cells, tens of thousands of rows). Plain
/// addition only, so merged results are invariant to merge order.
///
/// `update` is not safe for concurrent direct calls on one instance:
/// producers either hold an external lock or accumulate into task-local
/// instances merged sequentially afterwards.
#[derive(Debug, Clone, Default)]
pub struct SparseMatrix {
    rows: HashMap<u32, HashMap<u32, f64>>,
    cells: u64,
    max_row: u32,
    max_col: u32,
}

impl SparseMatrix {
    pub fn new() -> Self {
        SparseMatrix::default()
    }

    /// Increment cell `(row, col)` by `delta`, creating it if absent.
    pub fn update(&mut self, row: u32, col: u32, delta: f64) {
        use std::collections::hash_map::Entry;
        match self.rows.entry(row).or_default().entry(col) {
            Entry::Occupied(mut cell) => *cell.get_mut() += delta,
            Entry::Vacant(cell) => {
                cell.insert(delta);
                self.cells += 1;
            }
        }
        self.max_row = self.max_row.max(row);
        self.max_col = self.max_col.max(col);
    }

    /// Fold another accumulator's cells additively into this one.
    pub fn merge(&mut self, other: SparseMatrix) {
        for (row, cols) in other.rows {
            for (col, value) in cols {
                self.update(row, col, value);
            }
        }
    }

    /// Non-zero (allocated) cell count.
    pub fn size(&self) -> u64 {
        self.cells
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Largest row and column indices touched so far.
    pub fn last_coordinates(&self) -> Option<(u32, u32)> {
        if self.rows.is_empty() {
            None
        } else {
            Some((self.max_row, self.max_col))
        }
    }

    /// All cells as `(row, col, value)` triplets, row-major with
    /// ascending columns within each row. This is the serialization
    /// order of the binary codec.
    pub fn to_triplets(&self) -> Vec<(u32, u32, f64)> {
        let mut row_keys: Vec<u32> = self.rows.keys().copied().collect();
        row_keys.sort_unstable();
        let mut triplets = Vec::with_capacity(self.cells as usize);
        for row in row_keys {
            let cols = &self.rows[&row];
            let mut col_keys: Vec<u32> = cols.keys().copied().collect();
            col_keys.sort_unstable();
            for col in col_keys {
                triplets.push((row, col, cols[&col]));
            }
        }
        triplets
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.cells = 0;
        self.max_row = 0;
        self.max_col = 0;
    }
}
