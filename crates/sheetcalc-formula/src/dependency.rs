//! Dependency tracking for formula calculation
//!
//! Edges point from a referenced cell (or range) to the formula cell that
//! reads it. Ranges are stored as ranges, so a formula over `A1:A100000`
//! costs one edge rather than one per covered cell. A block index over the
//! ranges keeps lookups to the ranges near the edited cell.

use crate::ast::References;
use ahash::{AHashMap, AHashSet};
use sheetcalc_core::{CellAddress, CellRange};
use std::collections::{BTreeSet, VecDeque};
use std::ops::RangeInclusive;

/// Result of ordering an affected subgraph for recomputation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecalcPlan {
    /// Cells to evaluate, every cell after the cells it reads from
    pub order: Vec<CellAddress>,
    /// Cells on a dependency cycle, sorted; these are not in `order`
    pub cycles: Vec<CellAddress>,
}

const BLOCK_ROWS: u32 = 64;
const BLOCK_COLS: u16 = 16;
/// Ranges spanning more blocks than this are kept in a list scanned on every lookup
const MAX_RANGE_BLOCKS: u64 = 4096;

type BlockKey = (u32, u16);

/// Spatial index over referenced ranges
///
/// The grid is cut into fixed blocks and each range is listed under every
/// block it overlaps, so finding the ranges that contain a cell only visits
/// ranges overlapping that cell's block.
#[derive(Debug, Default)]
struct RangeIndex {
    blocks: AHashMap<BlockKey, AHashSet<CellRange>>,
    oversized: AHashSet<CellRange>,
}

impl RangeIndex {
    fn block_of(cell: CellAddress) -> BlockKey {
        (cell.row / BLOCK_ROWS, cell.col / BLOCK_COLS)
    }

    /// Block rows and columns a range overlaps, `None` if there are too many
    fn block_span(range: &CellRange) -> Option<(RangeInclusive<u32>, RangeInclusive<u16>)> {
        let (top, left) = Self::block_of(range.start);
        let (bottom, right) = Self::block_of(range.end);
        let count = (u64::from(bottom.saturating_sub(top)) + 1)
            * (u64::from(right.saturating_sub(left)) + 1);
        (count <= MAX_RANGE_BLOCKS).then(|| (top..=bottom, left..=right))
    }

    fn insert(&mut self, range: CellRange) {
        let Some((rows, cols)) = Self::block_span(&range) else {
            self.oversized.insert(range);
            return;
        };
        for row in rows {
            for col in cols.clone() {
                self.blocks.entry((row, col)).or_default().insert(range);
            }
        }
    }

    fn remove(&mut self, range: &CellRange) {
        let Some((rows, cols)) = Self::block_span(range) else {
            self.oversized.remove(range);
            return;
        };
        for row in rows {
            for col in cols.clone() {
                if let Some(ranges) = self.blocks.get_mut(&(row, col)) {
                    ranges.remove(range);
                    if ranges.is_empty() {
                        self.blocks.remove(&(row, col));
                    }
                }
            }
        }
    }

    fn containing(&self, cell: CellAddress) -> impl Iterator<Item = &CellRange> + '_ {
        self.blocks
            .get(&Self::block_of(cell))
            .into_iter()
            .flatten()
            .chain(self.oversized.iter())
            .filter(move |range| range.contains(&cell))
    }

    fn clear(&mut self) {
        self.blocks.clear();
        self.oversized.clear();
    }
}

/// Dependency graph for formula cells
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Formula cell → what it reads
    precedents: AHashMap<CellAddress, References>,
    /// Cell → formula cells that reference it directly
    cell_dependents: AHashMap<CellAddress, AHashSet<CellAddress>>,
    /// Range → formula cells that reference it
    range_dependents: AHashMap<CellRange, AHashSet<CellAddress>>,
    /// Where the keys of `range_dependents` lie on the grid
    range_index: RangeIndex,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the precedent set of a cell
    ///
    /// Old edges are dropped first; entries left without dependents are
    /// culled. An empty set leaves the cell out of the graph entirely.
    pub fn replace_edges(&mut self, cell: CellAddress, refs: References) {
        self.detach(cell);

        if refs.is_empty() {
            return;
        }

        for &precedent in &refs.cells {
            self.cell_dependents.entry(precedent).or_default().insert(cell);
        }
        for &range in &refs.ranges {
            let deps = self.range_dependents.entry(range).or_default();
            if deps.is_empty() {
                self.range_index.insert(range);
            }
            deps.insert(cell);
        }
        self.precedents.insert(cell, refs);
    }

    /// Remove a cell as a dependent; cells that still reference it keep their edges
    pub fn remove_cell(&mut self, cell: CellAddress) {
        self.detach(cell);
    }

    fn detach(&mut self, cell: CellAddress) {
        let Some(old) = self.precedents.remove(&cell) else {
            return;
        };

        for precedent in &old.cells {
            if let Some(deps) = self.cell_dependents.get_mut(precedent) {
                deps.remove(&cell);
                if deps.is_empty() {
                    self.cell_dependents.remove(precedent);
                }
            }
        }
        for range in &old.ranges {
            if let Some(deps) = self.range_dependents.get_mut(range) {
                deps.remove(&cell);
                if deps.is_empty() {
                    self.range_dependents.remove(range);
                    self.range_index.remove(range);
                }
            }
        }
    }

    /// What a formula cell reads, if it is in the graph
    pub fn precedents(&self, cell: CellAddress) -> Option<&References> {
        self.precedents.get(&cell)
    }

    /// Check if a cell has outgoing edges (is a formula with references)
    pub fn is_formula_cell(&self, cell: CellAddress) -> bool {
        self.precedents.contains_key(&cell)
    }

    /// Number of cells with at least one precedent
    pub fn formula_cell_count(&self) -> usize {
        self.precedents.len()
    }

    /// Number of distinct cells and ranges something depends on
    pub fn referenced_count(&self) -> usize {
        self.cell_dependents.len() + self.range_dependents.len()
    }

    /// Check if the graph holds no edges
    pub fn is_empty(&self) -> bool {
        self.precedents.is_empty()
    }

    /// Formula cells reading `cell` directly or through a range
    pub fn direct_dependents(&self, cell: CellAddress) -> BTreeSet<CellAddress> {
        let mut out: BTreeSet<CellAddress> = self
            .cell_dependents
            .get(&cell)
            .into_iter()
            .flat_map(|deps| deps.iter().copied())
            .collect();

        for range in self.range_index.containing(cell) {
            if let Some(deps) = self.range_dependents.get(range) {
                out.extend(deps.iter().copied());
            }
        }

        out
    }

    /// The seeds plus every cell that transitively depends on one of them
    pub fn transitive_dependents(
        &self,
        seeds: impl IntoIterator<Item = CellAddress>,
    ) -> BTreeSet<CellAddress> {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::new();

        for seed in seeds {
            if seen.insert(seed) {
                queue.push_back(seed);
            }
        }

        while let Some(cell) = queue.pop_front() {
            for dependent in self.direct_dependents(cell) {
                if seen.insert(dependent) {
                    queue.push_back(dependent);
                }
            }
        }

        seen
    }

    /// Order an affected set for recomputation
    ///
    /// Cells on a cycle are split out into [`RecalcPlan::cycles`]. Cells
    /// downstream of a cycle stay in `order`, after everything they read, so
    /// they see the cycle error once it is written.
    pub fn recalc_order(&self, affected: &BTreeSet<CellAddress>) -> RecalcPlan {
        let successors: AHashMap<CellAddress, Vec<CellAddress>> = affected
            .iter()
            .map(|&cell| {
                let next = self
                    .direct_dependents(cell)
                    .into_iter()
                    .filter(|dep| affected.contains(dep))
                    .collect();
                (cell, next)
            })
            .collect();

        let mut order = topo_sort(affected, &successors);
        if order.len() == affected.len() {
            return RecalcPlan {
                order,
                cycles: Vec::new(),
            };
        }

        let placed: AHashSet<CellAddress> = order.iter().copied().collect();
        let leftover: BTreeSet<CellAddress> = affected
            .iter()
            .copied()
            .filter(|cell| !placed.contains(cell))
            .collect();

        let cycles = cycle_members(&leftover, &successors);
        let downstream: BTreeSet<CellAddress> = leftover.difference(&cycles).copied().collect();
        order.extend(topo_sort(&downstream, &successors));

        tracing::trace!(
            affected = affected.len(),
            cycles = cycles.len(),
            downstream = downstream.len(),
            "ordered subgraph with cycles"
        );

        RecalcPlan {
            order,
            cycles: cycles.into_iter().collect(),
        }
    }

    /// Clear the entire graph
    pub fn clear(&mut self) {
        self.precedents.clear();
        self.cell_dependents.clear();
        self.range_dependents.clear();
        self.range_index.clear();
    }
}

/// Kahn's algorithm over `nodes`, ignoring edges that start outside it
///
/// Ready cells are taken in address order so the result is deterministic.
/// Nodes on a cycle are left out.
fn topo_sort(
    nodes: &BTreeSet<CellAddress>,
    successors: &AHashMap<CellAddress, Vec<CellAddress>>,
) -> Vec<CellAddress> {
    let mut in_degree: AHashMap<CellAddress, usize> = nodes.iter().map(|&c| (c, 0)).collect();
    for cell in nodes {
        for next in successors.get(cell).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(next) {
                *degree += 1;
            }
        }
    }

    let mut ready: BTreeSet<CellAddress> = in_degree
        .iter()
        .filter(|(_, &degree)| degree == 0)
        .map(|(&cell, _)| cell)
        .collect();
    let mut order = Vec::with_capacity(nodes.len());

    while let Some(cell) = ready.pop_first() {
        order.push(cell);
        for next in successors.get(&cell).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(next) {
                *degree -= 1;
                if *degree == 0 {
                    ready.insert(*next);
                }
            }
        }
    }

    order
}

/// Members of every non-trivial strongly connected component among `nodes`
///
/// A component counts if it has more than one cell or a cell that reads
/// itself. Iterative Tarjan, so long chains can't overflow the stack.
fn cycle_members(
    nodes: &BTreeSet<CellAddress>,
    successors: &AHashMap<CellAddress, Vec<CellAddress>>,
) -> BTreeSet<CellAddress> {
    struct Frame {
        cell: CellAddress,
        neighbours: Vec<CellAddress>,
        next: usize,
    }

    let neighbours = |cell: CellAddress| -> Vec<CellAddress> {
        successors
            .get(&cell)
            .into_iter()
            .flatten()
            .copied()
            .filter(|c| nodes.contains(c))
            .collect()
    };

    let mut counter: u32 = 0;
    let mut index: AHashMap<CellAddress, u32> = AHashMap::default();
    let mut lowlink: AHashMap<CellAddress, u32> = AHashMap::default();
    let mut stack: Vec<CellAddress> = Vec::new();
    let mut on_stack: AHashSet<CellAddress> = AHashSet::default();
    let mut result = BTreeSet::new();

    for &root in nodes {
        if index.contains_key(&root) {
            continue;
        }

        index.insert(root, counter);
        lowlink.insert(root, counter);
        counter += 1;
        stack.push(root);
        on_stack.insert(root);
        let mut dfs = vec![Frame {
            cell: root,
            neighbours: neighbours(root),
            next: 0,
        }];

        while let Some(frame) = dfs.last_mut() {
            let v = frame.cell;

            if let Some(&w) = frame.neighbours.get(frame.next) {
                frame.next += 1;

                match index.get(&w).copied() {
                    None => {
                        index.insert(w, counter);
                        lowlink.insert(w, counter);
                        counter += 1;
                        stack.push(w);
                        on_stack.insert(w);
                        dfs.push(Frame {
                            cell: w,
                            neighbours: neighbours(w),
                            next: 0,
                        });
                    }
                    Some(w_index) if on_stack.contains(&w) => {
                        if let Some(v_low) = lowlink.get_mut(&v) {
                            *v_low = (*v_low).min(w_index);
                        }
                    }
                    Some(_) => {}
                }
                continue;
            }

            // All neighbours explored; pop and propagate the lowlink
            dfs.pop();
            let v_low = lowlink[&v];
            if let Some(parent) = dfs.last() {
                if let Some(parent_low) = lowlink.get_mut(&parent.cell) {
                    *parent_low = (*parent_low).min(v_low);
                }
            }

            if v_low == index[&v] {
                let mut component = Vec::new();
                while let Some(w) = stack.pop() {
                    on_stack.remove(&w);
                    component.push(w);
                    if w == v {
                        break;
                    }
                }

                let self_loop = successors.get(&v).map_or(false, |next| next.contains(&v));
                if component.len() > 1 || self_loop {
                    result.extend(component);
                }
            }
        }
    }

    result
}
