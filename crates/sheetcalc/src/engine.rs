//! Recalculation engine
//!
//! Owns the grid, the parsed input of every cell and the dependency graph.
//! Every edit goes through [`Engine::set_cell_input`] or [`Engine::set_cells`],
//! which return only after the affected cells have been recomputed.
//!
//! # Example
//!
//! ```rust
//! use sheetcalc::prelude::*;
//!
//! let mut engine = Engine::new();
//! let a1 = CellAddress::parse("A1").unwrap();
//! let a2 = CellAddress::parse("A2").unwrap();
//!
//! engine.set_cell_input(a2, "=A1*2");
//! let recalc = engine.set_cell_input(a1, "21");
//!
//! assert_eq!(engine.value(a2), &CellValue::Number(42.0));
//! assert_eq!(recalc.changed, vec![a1, a2]);
//! ```

use crate::document::{SheetDocument, StoredCell};
use crate::{EngineOptions, Error, Result};
use ahash::AHashMap;
use sheetcalc_core::{CellAddress, CellError, CellRange, CellRecord, CellStyle, CellValue, Grid};
use sheetcalc_formula::{
    evaluate_cell, parse_input, CellInput, DependencyGraph, EvaluationContext, FormulaError,
    FormulaResult, References,
};
use std::collections::BTreeSet;
use std::path::Path;

/// Outcome of a recompute pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recalc {
    /// Cells whose displayed value changed, sorted
    pub changed: Vec<CellAddress>,
    /// Number of cells evaluated in this pass
    pub evaluated: usize,
    /// Cells flagged #CICLO! in this pass, sorted
    pub cycles: Vec<CellAddress>,
}

/// The formula engine
#[derive(Debug)]
pub struct Engine {
    options: EngineOptions,
    grid: Grid,
    /// Parsed raw input of every stored cell
    inputs: AHashMap<CellAddress, FormulaResult<CellInput>>,
    graph: DependencyGraph,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Create an empty engine with default options
    pub fn new() -> Self {
        Self::with_options(EngineOptions::default())
    }

    /// Create an empty engine
    pub fn with_options(options: EngineOptions) -> Self {
        Self {
            grid: Grid::new(options.rows, options.cols),
            inputs: AHashMap::default(),
            graph: DependencyGraph::new(),
            options,
        }
    }

    /// Options this engine runs with
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    // === Edits ===

    /// Apply one edit and recompute everything it affects
    ///
    /// Empty input deletes the cell.
    pub fn set_cell_input(&mut self, address: CellAddress, raw: &str) -> Recalc {
        self.set_cells([(address, raw)])
    }

    /// Apply several edits, then run a single recompute pass over their union
    ///
    /// Edits to addresses outside the addressable space have no A1 form and
    /// are dropped.
    pub fn set_cells<I, S>(&mut self, edits: I) -> Recalc
    where
        I: IntoIterator<Item = (CellAddress, S)>,
        S: AsRef<str>,
    {
        let mut before: AHashMap<CellAddress, CellValue> = AHashMap::default();
        let mut seeds = BTreeSet::new();

        for (address, raw) in edits {
            if !address.is_addressable() {
                tracing::warn!(
                    row = address.row,
                    col = address.col,
                    "ignoring edit outside the addressable space"
                );
                continue;
            }
            before
                .entry(address)
                .or_insert_with(|| self.grid.value(address).clone());
            self.apply_input(address, raw.as_ref());
            seeds.insert(address);
        }

        let edits = seeds.len();
        let mut recalc = self.recompute(seeds);

        // Seeds may have been deleted or rewritten more than once; compare
        // against the value they showed before the batch
        let mut changed: BTreeSet<CellAddress> = recalc.changed.drain(..).collect();
        for (address, old) in before {
            if self.grid.value(address) == &old {
                changed.remove(&address);
            } else {
                changed.insert(address);
            }
        }
        recalc.changed = changed.into_iter().collect();

        tracing::debug!(
            edits,
            evaluated = recalc.evaluated,
            changed = recalc.changed.len(),
            "applied edits"
        );
        recalc
    }

    fn apply_input(&mut self, address: CellAddress, raw: &str) {
        if raw.is_empty() {
            self.grid.remove(address);
            self.inputs.remove(&address);
            self.graph.remove_cell(address);
            return;
        }

        self.grid.set_raw_input(address, raw);
        let parsed = parse_input(raw);
        let refs = match &parsed {
            Ok(input) => input.references(),
            Err(_) => References::default(),
        };
        self.graph.replace_edges(address, refs);
        self.inputs.insert(address, parsed);
    }

    /// Update the style of an existing cell; values and dependencies are untouched
    pub fn set_cell_style(&mut self, address: CellAddress, style: CellStyle) -> Result<()> {
        let record = self
            .grid
            .get_mut(address)
            .ok_or_else(|| sheetcalc_core::Error::CellNotFound(address.to_string()))?;
        record.style = style;
        Ok(())
    }

    /// Recompute every stored cell
    pub fn recalculate_all(&mut self) -> Recalc {
        let seeds: BTreeSet<CellAddress> = self.grid.iter().map(|(address, _)| address).collect();
        let recalc = self.recompute(seeds);
        tracing::debug!(
            evaluated = recalc.evaluated,
            changed = recalc.changed.len(),
            "full recalculation"
        );
        recalc
    }

    fn recompute(&mut self, seeds: BTreeSet<CellAddress>) -> Recalc {
        let affected = self.graph.transitive_dependents(seeds);
        let plan = self.graph.recalc_order(&affected);
        let mut changed = BTreeSet::new();
        let mut evaluated = 0;

        if !plan.cycles.is_empty() {
            let members: Vec<String> = plan.cycles.iter().map(|a| a.to_string()).collect();
            tracing::warn!(cells = ?members, "circular reference detected");
        }

        for &address in &plan.cycles {
            if self
                .grid
                .set_computed(address, CellValue::Error(CellError::Cycle))
            {
                changed.insert(address);
            }
        }

        for &address in &plan.order {
            let Some(value) = self.evaluate_at(address) else {
                continue;
            };
            evaluated += 1;
            tracing::trace!(cell = %address, value = %value, "evaluated");
            if self.grid.set_computed(address, value) {
                changed.insert(address);
            }
        }

        Recalc {
            changed: changed.into_iter().collect(),
            evaluated,
            cycles: plan.cycles,
        }
    }

    /// Value a stored cell should hold given the current grid, None if absent
    fn evaluate_at(&self, address: CellAddress) -> Option<CellValue> {
        let value = match self.inputs.get(&address)? {
            Err(err) => CellValue::Error(err.to_cell_error()),
            Ok(CellInput::Empty) => CellValue::Empty,
            Ok(CellInput::Literal(value)) => value.clone(),
            Ok(CellInput::Formula(expr)) => {
                let ctx = EvaluationContext::new(&self.grid)
                    .with_max_range_cells(self.options.max_range_cells);
                evaluate_cell(expr, &ctx)
            }
        };
        Some(value)
    }

    // === Reads ===

    /// Snapshot of a cell; absent addresses give an empty record
    pub fn get_cell(&self, address: CellAddress) -> CellRecord {
        self.grid.get(address).cloned().unwrap_or_default()
    }

    /// Computed value of a cell
    pub fn value(&self, address: CellAddress) -> &CellValue {
        self.grid.value(address)
    }

    /// Computed value as shown in the grid; errors use their fixed tokens
    pub fn display_value(&self, address: CellAddress) -> String {
        self.grid.value(address).to_string()
    }

    /// Current values of a range, rows outer and columns inner
    pub fn evaluate_range_values(&self, range: CellRange) -> Result<Vec<CellValue>> {
        let cells = range.cell_count();
        if cells > self.options.max_range_cells {
            return Err(Error::Formula(FormulaError::RangeTooLarge {
                range: range.to_string(),
                cells,
                limit: self.options.max_range_cells,
            }));
        }

        Ok(range
            .cells()
            .map(|address| self.grid.value(address).clone())
            .collect())
    }

    /// Formula cells that read `address` directly or through a range
    pub fn dependents_of(&self, address: CellAddress) -> Vec<CellAddress> {
        self.graph.direct_dependents(address).into_iter().collect()
    }

    /// Cells and ranges a formula cell reads
    pub fn precedents_of(&self, address: CellAddress) -> References {
        self.graph.precedents(address).cloned().unwrap_or_default()
    }

    /// Shared view of the grid
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Stored cells in row order
    pub fn cells(&self) -> impl Iterator<Item = (CellAddress, &CellRecord)> {
        self.grid.iter()
    }

    /// Grid bounds (rows, cols)
    pub fn dimensions(&self) -> (u32, u16) {
        self.grid.dimensions()
    }

    // === Persistence ===

    /// Persisted form: raw input and style per cell plus the grid bounds
    pub fn to_document(&self) -> SheetDocument {
        let (rows, cols) = self.grid.dimensions();
        let mut doc = SheetDocument::new(rows, cols);
        for (address, record) in self.grid.iter() {
            doc.cells.insert(
                address.to_string(),
                StoredCell {
                    raw_input: record.raw_input.clone(),
                    style: record.style.clone(),
                },
            );
        }
        doc
    }

    /// Load a document and compute every cell
    ///
    /// The document's bounds replace those in `options`.
    pub fn from_document(doc: &SheetDocument, options: EngineOptions) -> Result<Self> {
        let mut engine = Self::with_options(options.with_bounds(doc.rows, doc.cols));

        for (text, stored) in &doc.cells {
            if stored.raw_input.is_empty() {
                continue;
            }
            let address = CellAddress::parse(text)?;
            engine.grid.insert(
                address,
                CellRecord::with_style(stored.raw_input.as_str(), stored.style.clone()),
            );
            engine.apply_input(address, &stored.raw_input);
        }

        engine.recalculate_all();
        Ok(engine)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_document())?)
    }

    /// Load from JSON with default options
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: SheetDocument = serde_json::from_str(json)?;
        Self::from_document(&doc, EngineOptions::default())
    }

    /// Write the document to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Read a document from a file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
