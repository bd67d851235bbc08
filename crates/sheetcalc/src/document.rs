//! Persisted sheet form
//!
//! Only raw input, style and grid bounds are stored. Computed values are
//! rebuilt by a full recompute on load.

use serde::{Deserialize, Serialize};
use sheetcalc_core::CellStyle;
use std::collections::BTreeMap;

/// A sheet as written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetDocument {
    /// Row bound of the grid
    pub rows: u32,
    /// Column bound of the grid
    pub cols: u16,
    /// A1 address → stored cell
    #[serde(default)]
    pub cells: BTreeMap<String, StoredCell>,
}

/// One persisted cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCell {
    pub raw_input: String,
    #[serde(default, skip_serializing_if = "CellStyle::is_default")]
    pub style: CellStyle,
}

impl SheetDocument {
    /// An empty document with the given bounds
    pub fn new(rows: u32, cols: u16) -> Self {
        Self {
            rows,
            cols,
            cells: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_style_is_omitted() {
        let mut doc = SheetDocument::new(10, 5);
        doc.cells.insert(
            "A1".into(),
            StoredCell {
                raw_input: "=1+1".into(),
                style: CellStyle::default(),
            },
        );

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "rows": 10,
                "cols": 5,
                "cells": { "A1": { "raw_input": "=1+1" } }
            })
        );
    }

    #[test]
    fn test_missing_cells_field() {
        let doc: SheetDocument = serde_json::from_str(r#"{"rows": 3, "cols": 2}"#).unwrap();
        assert_eq!(doc, SheetDocument::new(3, 2));
    }
}
