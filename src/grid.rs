//! Grid materializer: sparse stored cells + declared structure → dense grid

use tracing::debug;

use crate::error::ChecklistResult;
use crate::store::GridStore;
use crate::types::{Cell, Grid, SheetView, Structure};

/// Lay `cells` over a blank `total_rows x total_cols` grid.
/// Cells outside the declared bounds are dropped.
pub fn build_grid(structure: &Structure, cells: &[Cell]) -> Grid {
    let mut grid = Grid::blank(structure.total_rows, structure.total_cols);
    let mut dropped = 0usize;
    for cell in cells {
        if !structure.contains(cell.row, cell.col) || !grid.set(cell.row, cell.col, &cell.value) {
            dropped += 1;
        }
    }
    if dropped > 0 {
        debug!(
            sheet = %structure.sheet_name,
            dropped,
            "ignored cells outside declared bounds"
        );
    }
    grid
}

/// Dense grid for `sheet`; empty when the sheet has no structure.
pub fn materialize<S: GridStore + ?Sized>(store: &S, sheet: &str) -> ChecklistResult<Grid> {
    Ok(materialize_sheet(store, sheet)?.grid)
}

/// Headers plus dense grid for `sheet`
pub fn materialize_sheet<S: GridStore + ?Sized>(
    store: &S,
    sheet: &str,
) -> ChecklistResult<SheetView> {
    let Some(structure) = store.get_structure(sheet)? else {
        return Ok(SheetView {
            name: sheet.to_string(),
            headers: Vec::new(),
            grid: Grid::default(),
        });
    };
    let cells = store.get_cells(sheet)?;
    let grid = build_grid(&structure, &cells);
    Ok(SheetView {
        name: structure.sheet_name,
        headers: structure.headers,
        grid,
    })
}
