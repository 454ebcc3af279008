use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, ErrorKind, Result};

/// Immutable configuration snapshot for one aggregation run.
///
/// A fresh engine instance takes one snapshot; nothing is cached or
/// invalidated behind the caller's back.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Target text field the lexicon and all counts are built over.
    pub field: String,
    /// Terms with a corpus-wide frequency below this are excluded from
    /// the lexicon (their tokens still count toward total coverage).
    pub min_term_freq: u64,
    /// Trailing co-occurrence window width (tokens before the focus).
    pub w_pre: u32,
    /// Leading co-occurrence window width (tokens after the focus).
    pub w_pos: u32,
    /// Optional stored field used to stratify frequency counts into columns.
    pub split_field: Option<String>,
    /// Optional field/term pair selecting the active document sample.
    pub filter_field: Option<String>,
    pub filter_term: Option<String>,
    /// Worker pool size.
    pub threads: usize,
    /// Suppress progress emission.
    pub quiet: bool,
    /// Row-id column header token in delimited dumps.
    pub row_id_header: String,
    /// Column delimiter in delimited dumps.
    pub delimiter: char,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            field: "text".to_string(),
            min_term_freq: 1,
            w_pre: 5,
            w_pos: 5,
            split_field: None,
            filter_field: None,
            filter_term: None,
            threads: num_cpus::get(), // available hardware parallelism
            quiet: false,
            row_id_header: "_term_".to_string(),
            delimiter: '\t',
        }
    }
}

impl AnalysisConfig {
    /// Load a configuration snapshot from a JSON file. Absent keys fall
    /// back to the defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let config: AnalysisConfig = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| Error::new(ErrorKind::Parse, format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Fast-fail checks run before any dispatch. Errors name the
    /// offending parameter.
    pub fn validate(&self) -> Result<()> {
        if self.field.is_empty() {
            return Err(Error::new(ErrorKind::Config, "field: must not be empty"));
        }
        if self.threads == 0 {
            return Err(Error::new(ErrorKind::Config, "threads: must be at least 1"));
        }
        if self.filter_field.is_some() != self.filter_term.is_some() {
            return Err(Error::new(
                ErrorKind::Config,
                "filter_field/filter_term: must be given together",
            ));
        }
        if self.row_id_header.is_empty() {
            return Err(Error::new(
                ErrorKind::Config,
                "row_id_header: must not be empty",
            ));
        }
        Ok(())
    }
}
