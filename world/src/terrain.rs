//! Hardness grid and the floor classification derived from it.

use delve_core::{
    CellCoord, CellRect, Direction, FloorKind, EROSION_STEP, IMMUTABLE_HARDNESS, OPEN_HARDNESS,
};
use rand::Rng;

/// Cells occupied by the level's stairs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stairs {
    /// Cell holding the up stair, if the level has one.
    pub up: Option<CellCoord>,
    /// Cell holding the down stair, if the level has one.
    pub down: Option<CellCoord>,
}

/// Result of a single tunneling visit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Erosion {
    /// Hardness dropped; the cell became a corridor once it reaches zero.
    Eroded {
        /// Hardness left after the visit.
        remaining: u8,
    },
    /// The cell was open floor or immutable rock, so nothing changed.
    Unchanged,
}

/// Dense row-major terrain grid.
///
/// Every cell stores its hardness and the floor classification. Perimeter cells
/// are immutable rock. Accessing a cell outside the grid is a caller bug and
/// panics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Terrain {
    columns: u32,
    rows: u32,
    hardness: Vec<u8>,
    floor: Vec<FloorKind>,
}

impl Terrain {
    /// Builds an untouched grid: immutable perimeter, random erodible interior.
    pub fn bordered<R: Rng + ?Sized>(columns: u32, rows: u32, rng: &mut R) -> Self {
        let mut hardness = Vec::with_capacity(columns as usize * rows as usize);
        for row in 0..rows {
            for column in 0..columns {
                if is_perimeter(column, row, columns, rows) {
                    hardness.push(IMMUTABLE_HARDNESS);
                } else {
                    hardness.push(rng.gen_range(1..IMMUTABLE_HARDNESS));
                }
            }
        }

        Self {
            columns,
            rows,
            floor: vec![FloorKind::Rock; hardness.len()],
            hardness,
        }
    }

    /// Rebuilds the floor classification from persisted data.
    ///
    /// Open cells become corridors, room rectangles become room floor, then the
    /// stairs are stamped on top. Running the derivation on its own output
    /// yields the same grid.
    #[must_use]
    pub fn derive(
        columns: u32,
        rows: u32,
        hardness: Vec<u8>,
        rooms: &[CellRect],
        stairs: &Stairs,
    ) -> Self {
        assert_eq!(
            hardness.len(),
            columns as usize * rows as usize,
            "hardness grid does not match dimensions"
        );
        let floor = hardness
            .iter()
            .map(|&value| {
                if value == OPEN_HARDNESS {
                    FloorKind::Corridor
                } else {
                    FloorKind::Rock
                }
            })
            .collect();
        let mut terrain = Self {
            columns,
            rows,
            hardness,
            floor,
        };

        for room in rooms {
            for cell in room.cells() {
                let index = terrain.index(cell);
                terrain.floor[index] = FloorKind::Room;
            }
        }
        if let Some(up) = stairs.up {
            terrain.set_floor(up, FloorKind::StairUp);
        }
        if let Some(down) = stairs.down {
            terrain.set_floor(down, FloorKind::StairDown);
        }

        terrain
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Row-major index of the cell.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> usize {
        assert!(
            self.contains(cell),
            "cell ({}, {}) outside {}x{} grid",
            cell.column(),
            cell.row(),
            self.columns,
            self.rows
        );
        cell.row() as usize * self.columns as usize + cell.column() as usize
    }

    /// Hardness stored for the cell.
    #[must_use]
    pub fn hardness(&self, cell: CellCoord) -> u8 {
        self.hardness[self.index(cell)]
    }

    /// Floor classification of the cell.
    #[must_use]
    pub fn floor(&self, cell: CellCoord) -> FloorKind {
        self.floor[self.index(cell)]
    }

    /// Whether the cell is boundary rock that nothing may enter or erode.
    #[must_use]
    pub fn is_immutable(&self, cell: CellCoord) -> bool {
        self.hardness(cell) == IMMUTABLE_HARDNESS
    }

    /// Whether the player may step onto the cell.
    #[must_use]
    pub fn is_walkable(&self, cell: CellCoord) -> bool {
        self.floor(cell).is_walkable()
    }

    /// Whether the cell has zero hardness.
    #[must_use]
    pub fn is_open(&self, cell: CellCoord) -> bool {
        self.hardness(cell) == OPEN_HARDNESS
    }

    /// Opens the cell and assigns the provided classification.
    pub fn carve(&mut self, cell: CellCoord, kind: FloorKind) {
        let index = self.index(cell);
        self.hardness[index] = OPEN_HARDNESS;
        self.floor[index] = kind;
    }

    /// Reassigns the classification without touching hardness.
    pub fn set_floor(&mut self, cell: CellCoord, kind: FloorKind) {
        let index = self.index(cell);
        self.floor[index] = kind;
    }

    /// Applies one tunneling visit to the cell.
    pub fn erode(&mut self, cell: CellCoord) -> Erosion {
        let index = self.index(cell);
        let current = self.hardness[index];
        if current == OPEN_HARDNESS || current == IMMUTABLE_HARDNESS {
            return Erosion::Unchanged;
        }

        let remaining = current.saturating_sub(EROSION_STEP);
        self.hardness[index] = remaining;
        if remaining == OPEN_HARDNESS {
            self.floor[index] = FloorKind::Corridor;
        }
        Erosion::Eroded { remaining }
    }

    /// Dense hardness values in row-major order.
    #[must_use]
    pub fn hardness_cells(&self) -> &[u8] {
        &self.hardness
    }

    /// Dense floor classification in row-major order.
    #[must_use]
    pub fn floor_cells(&self) -> &[FloorKind] {
        &self.floor
    }

    /// In-bounds neighbours of the cell in [`Direction::ALL`] order.
    pub fn neighbors(&self, cell: CellCoord) -> impl Iterator<Item = CellCoord> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |direction| cell.step(direction))
            .filter(move |neighbor| self.contains(*neighbor))
    }

    /// Draws uniformly random cells until one satisfies `accept`.
    ///
    /// Gives up after `attempts` draws so that degenerate grids cannot hang
    /// the caller.
    pub fn random_cell<R, F>(&self, rng: &mut R, attempts: u32, mut accept: F) -> Option<CellCoord>
    where
        R: Rng + ?Sized,
        F: FnMut(CellCoord) -> bool,
    {
        if self.columns == 0 || self.rows == 0 {
            return None;
        }
        for _ in 0..attempts {
            let cell = CellCoord::new(
                rng.gen_range(0..self.columns),
                rng.gen_range(0..self.rows),
            );
            if accept(cell) {
                return Some(cell);
            }
        }
        None
    }

    /// Upper bound on random draws used by [`Terrain::random_cell`] callers.
    #[must_use]
    pub fn draw_budget(&self) -> u32 {
        self.columns.saturating_mul(self.rows).saturating_mul(64)
    }

    /// Reports whether the cell lies on the outer ring of the grid.
    #[must_use]
    pub const fn is_perimeter(&self, cell: CellCoord) -> bool {
        is_perimeter(cell.column(), cell.row(), self.columns, self.rows)
    }
}

const fn is_perimeter(column: u32, row: u32, columns: u32, rows: u32) -> bool {
    column == 0 || row == 0 || column + 1 == columns || row + 1 == rows
}
