use std::collections::HashMap;
use std::hash::Hash;

use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DocOrd;

/// Succinct document-ordinal → attribute-value map.
///
/// Built in two phases: an open phase accepting keys in non-decreasing
/// order, then `finish()` seals the structure for lookup. Distinct
/// values are deduplicated into dense numeric codes, so millions of
/// documents sharing a few thousand attribute values cost two integer
/// arrays instead of a per-document hash map.
///
/// The open/sealed state is checked at runtime on every call: adding
/// after sealing, sealing twice, or querying before sealing fail fast
/// with a specific error kind.
#[derive(Debug, Clone)]
pub struct DocMap<T> {
    keys: Vec<DocOrd>,   // Non-decreasing insertion keys
    codes: Vec<u32>,     // Value code per key, aligned with keys
    values: Vec<T>,      // Code → value
    value_codes: HashMap<T, u32>,
    sorted_codes: bool,  // Codes assigned in non-decreasing order so far
    sealed: bool,
}

impl<T> DocMap<T>
where
    T: Ord + Hash + Clone,
{
    /// Empty open map; value codes are assigned in first-seen order.
    pub fn new() -> Self {
        DocMap {
            keys: Vec::new(),
            codes: Vec::new(),
            values: Vec::new(),
            value_codes: HashMap::new(),
            sorted_codes: true,
            sealed: false,
        }
    }

    /// Open map with value codes pre-assigned from an ascending value
    /// sequence, guaranteeing bidirectional lookup after sealing.
    pub fn with_sorted_values(sorted: impl IntoIterator<Item = T>) -> Result<Self> {
        let mut map = DocMap::new();
        for value in sorted {
            if let Some(last) = map.values.last() {
                if value <= *last {
                    return Err(Error::new(
                        ErrorKind::InvalidArgument,
                        "pre-populated values must be strictly ascending",
                    ));
                }
            }
            let code = map.values.len() as u32;
            map.value_codes.insert(value.clone(), code);
            map.values.push(value);
        }
        Ok(map)
    }

    /// Associate `doc` with `value`. Keys must arrive in non-decreasing
    /// order; re-adding the last key overwrites its association.
    pub fn add(&mut self, doc: DocOrd, value: T) -> Result<()> {
        if self.sealed {
            return Err(Error::new(ErrorKind::Sealed, "add after finish()"));
        }
        if let Some(&last) = self.keys.last() {
            if doc < last {
                return Err(Error::new(
                    ErrorKind::OutOfOrder,
                    format!("key {} after key {}", doc, last),
                ));
            }
        }
        let code = match self.value_codes.get(&value) {
            Some(&code) => code,
            None => {
                let code = self.values.len() as u32;
                self.value_codes.insert(value.clone(), code);
                self.values.push(value);
                code
            }
        };
        if let Some(&last_code) = self.codes.last() {
            if code < last_code {
                self.sorted_codes = false;
            }
        }
        match self.keys.last() {
            Some(&last) if last == doc => {
                let at = self.codes.len() - 1;
                self.codes[at] = code;
            }
            _ => {
                self.keys.push(doc);
                self.codes.push(code);
            }
        }
        Ok(())
    }

    /// Seal the map. No further `add` is allowed afterwards.
    pub fn finish(&mut self) -> Result<()> {
        if self.sealed {
            return Err(Error::new(ErrorKind::Sealed, "finish() called twice"));
        }
        self.sealed = true;
        self.keys.shrink_to_fit();
        self.codes.shrink_to_fit();
        Ok(())
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    fn check_sealed(&self) -> Result<()> {
        if !self.sealed {
            return Err(Error::new(ErrorKind::NotSealed, "query before finish()"));
        }
        Ok(())
    }

    /// Value associated with `doc`, if any. Only valid once sealed.
    pub fn get(&self, doc: DocOrd) -> Result<Option<&T>> {
        Ok(self.code_of(doc)?.map(|code| &self.values[code as usize]))
    }

    /// Numeric code of the value associated with `doc`, if any.
    pub fn code_of(&self, doc: DocOrd) -> Result<Option<u32>> {
        self.check_sealed()?;
        match self.keys.binary_search(&doc) {
            Ok(at) => Ok(Some(self.codes[at])),
            Err(_) => Ok(None),
        }
    }

    /// Representative (first) document carrying `value`. Requires codes
    /// to have been assigned in sorted order, which holds when the map
    /// was pre-populated with sorted values or fed value-sorted input.
    pub fn doc_of(&self, value: &T) -> Result<Option<DocOrd>> {
        self.check_sealed()?;
        if !self.sorted_codes {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                "reverse lookup requires value codes assigned in sorted order",
            ));
        }
        let code = match self.value_codes.get(value) {
            Some(&code) => code,
            None => return Ok(None),
        };
        let at = self.codes.partition_point(|&c| c < code);
        if at < self.codes.len() && self.codes[at] == code {
            Ok(Some(self.keys[at]))
        } else {
            Ok(None)
        }
    }

    /// Number of keyed documents.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of distinct values seen (or pre-populated).
    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    pub fn value_of_code(&self, code: u32) -> Option<&T> {
        self.values.get(code as usize)
    }
}

impl<T> Default for DocMap<T>
where
    T: Ord + Hash + Clone,
{
    fn default() -> Self {
        DocMap::new()
    }
}
