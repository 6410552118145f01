//! The sheet: a position-keyed arena of cells and the write pipeline.
//!
//! Cells never point at each other. Edges are positions, and every
//! traversal step resolves position → cell through the arena, so the
//! cyclic-looking cell graph needs no reference counting and no unsafe.
//!
//! A write runs parse → cycle check → adjacency rewire → cache
//! invalidation, and fails before the first mutation of the target cell
//! or commits fully.

use std::collections::VecDeque;
use std::io;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use cellflow_common::{CellValue, Position, Size};

use crate::cell::{Cell, CellBody};
use crate::error::EngineError;

/// An in-memory spreadsheet.
#[derive(Debug, Default)]
pub struct Sheet {
    cells: FxHashMap<Position, Cell>,
}

impl Sheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write raw input to a cell, creating it if absent.
    ///
    /// Formula input is parsed and cycle-checked before anything is
    /// touched; a rejected write leaves the cell's text, value, and
    /// adjacency exactly as they were.
    pub fn set_cell(&mut self, pos: Position, text: &str) -> Result<(), EngineError> {
        if !pos.is_valid() {
            return Err(EngineError::InvalidPosition);
        }
        let body = CellBody::classify(text)?;

        if let CellBody::Formula { .. } = &body {
            // writing the same formula again is a no-op and keeps the cache
            if let Some(cell) = self.cells.get(&pos) {
                if cell.text() == body.text() {
                    trace!(%pos, "identical formula write short-circuited");
                    return Ok(());
                }
            }

            let refs: FxHashSet<Position> = body.referenced_cells().into_iter().collect();
            // referencing a cell brings it into existence
            for &referenced in &refs {
                self.cells.entry(referenced).or_insert_with(Cell::new_empty);
            }
            if !refs.is_empty() && self.closes_cycle(pos, &refs) {
                debug!(%pos, "rejected formula write: dependency cycle");
                return Err(EngineError::CircularDependency);
            }
        }

        self.cells.entry(pos).or_insert_with(Cell::new_empty).body = body;
        self.rewire(pos);
        self.invalidate_dependents(pos);
        trace!(%pos, "cell written");
        Ok(())
    }

    /// Look up a cell. `Ok(None)` means the position is fine but nothing
    /// was ever written there.
    pub fn cell(&self, pos: Position) -> Result<Option<&Cell>, EngineError> {
        if !pos.is_valid() {
            return Err(EngineError::InvalidPosition);
        }
        Ok(self.cells.get(&pos))
    }

    /// The value at a position, if a cell is present there.
    pub fn value(&self, pos: Position) -> Result<Option<CellValue>, EngineError> {
        Ok(self.cell(pos)?.map(|cell| cell.value(self)))
    }

    /// Reset a cell to empty. The node is removed from the arena only
    /// when no formula references it; otherwise it stays as an edge
    /// target. Either way its dependents observe the reset on next read.
    pub fn clear_cell(&mut self, pos: Position) -> Result<(), EngineError> {
        if !pos.is_valid() {
            return Err(EngineError::InvalidPosition);
        }
        let Some(cell) = self.cells.get_mut(&pos) else {
            return Ok(());
        };
        cell.clear();
        self.invalidate_dependents(pos);

        if !self.cells[&pos].has_dependents() {
            let outgoing: Vec<Position> = {
                let cell = self.cells.get_mut(&pos).expect("cell checked above");
                cell.outgoing.drain().collect()
            };
            for referenced in outgoing {
                if let Some(counterpart) = self.cells.get_mut(&referenced) {
                    counterpart.incoming.remove(&pos);
                }
            }
            self.cells.remove(&pos);
            trace!(%pos, "cell disposed");
        }
        Ok(())
    }

    /// The smallest bounding box covering every present cell.
    pub fn printable_size(&self) -> Size {
        let mut size = Size::default();
        for pos in self.cells.keys() {
            size.rows = size.rows.max(pos.row() + 1);
            size.cols = size.cols.max(pos.col() + 1);
        }
        size
    }

    /// Render the text grid: tab-separated cells, every row `\n`-terminated.
    pub fn print_texts<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        self.print_grid(out, |cell| cell.text())
    }

    /// Render the value grid, with evaluation errors as their tokens.
    pub fn print_values<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        self.print_grid(out, |cell| cell.value(self).to_string())
    }

    fn print_grid<W, F>(&self, out: &mut W, render: F) -> io::Result<()>
    where
        W: io::Write,
        F: Fn(&Cell) -> String,
    {
        let size = self.printable_size();
        for row in 0..size.rows {
            for col in 0..size.cols {
                if col > 0 {
                    out.write_all(b"\t")?;
                }
                if let Some(cell) = self.cells.get(&Position::new(row, col)) {
                    out.write_all(render(cell).as_bytes())?;
                }
            }
            out.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Non-validating lookup for the interpreter's reference reads.
    pub(crate) fn cell_at(&self, pos: Position) -> Option<&Cell> {
        self.cells.get(&pos)
    }

    /// Would making `origin` reference `refs` close a cycle? True iff some
    /// referenced cell already depends on `origin`: reachable from
    /// `origin` over `incoming` edges, `origin` itself included.
    fn closes_cycle(&self, origin: Position, refs: &FxHashSet<Position>) -> bool {
        let mut seen = FxHashSet::default();
        let mut queue = VecDeque::new();
        seen.insert(origin);
        queue.push_back(origin);

        while let Some(pos) = queue.pop_front() {
            if refs.contains(&pos) {
                return true;
            }
            if let Some(cell) = self.cells.get(&pos) {
                for &dependent in &cell.incoming {
                    if seen.insert(dependent) {
                        queue.push_back(dependent);
                    }
                }
            }
        }
        false
    }

    /// Re-point this cell's outgoing edges at its current body's
    /// reference set, keeping both directions in step.
    fn rewire(&mut self, pos: Position) {
        let old: Vec<Position> = {
            let cell = self.cells.get_mut(&pos).expect("rewire target exists");
            cell.outgoing.drain().collect()
        };
        for referenced in old {
            if let Some(counterpart) = self.cells.get_mut(&referenced) {
                counterpart.incoming.remove(&pos);
            }
        }

        let refs: FxHashSet<Position> = self.cells[&pos].referenced_cells().into_iter().collect();
        for &referenced in &refs {
            self.cells
                .entry(referenced)
                .or_insert_with(Cell::new_empty)
                .incoming
                .insert(pos);
        }
        self.cells.get_mut(&pos).expect("rewire target exists").outgoing = refs;
    }

    /// Drop the cached results of everything that transitively depends on
    /// `pos` (exclusive). A node whose cache is already empty cannot have
    /// propagated a stale value upward, so the walk stops there.
    fn invalidate_dependents(&self, pos: Position) {
        let Some(cell) = self.cells.get(&pos) else {
            return;
        };
        let mut stack: Vec<Position> = cell.incoming.iter().copied().collect();
        while let Some(dependent) = stack.pop() {
            if let Some(cell) = self.cells.get(&dependent) {
                if cell.invalidate_cache() {
                    trace!(pos = %dependent, "cache invalidated");
                    stack.extend(cell.incoming.iter().copied());
                }
            }
        }
    }
}
