//! Shortest-path distance fields seeded from the player's cell.

use std::{cmp::Ordering, collections::BinaryHeap};

use delve_core::{CellCoord, IMMUTABLE_HARDNESS, OPEN_HARDNESS};

use crate::terrain::Terrain;

/// Distance recorded for cells the search never reached.
pub const UNREACHED: i32 = i32::MAX;

const HARDNESS_PER_COST: u8 = 85;

/// Movement rules used when relaxing edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NavigationMode {
    /// Any cell except immutable rock, weighted by hardness.
    Tunneling,
    /// Open cells only, each step costing one.
    NonTunneling,
}

impl NavigationMode {
    /// Cost of entering a cell with the provided hardness, if it can be entered.
    #[must_use]
    pub const fn edge_cost(self, hardness: u8) -> Option<i32> {
        match self {
            Self::NonTunneling => {
                if hardness == OPEN_HARDNESS {
                    Some(1)
                } else {
                    None
                }
            }
            Self::Tunneling => {
                if hardness == IMMUTABLE_HARDNESS {
                    None
                } else {
                    Some(1 + (hardness / HARDNESS_PER_COST) as i32)
                }
            }
        }
    }
}

/// Dense Dijkstra distance grid.
///
/// Distances mirror the terrain's row-major layout. Unreached cells hold
/// [`UNREACHED`]; the source cell holds zero.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DistanceField {
    columns: u32,
    rows: u32,
    distances: Vec<i32>,
}

impl DistanceField {
    /// Computes a fresh field from `source` under `mode`.
    #[must_use]
    pub fn compute(terrain: &Terrain, source: CellCoord, mode: NavigationMode) -> Self {
        let mut field = Self::default();
        field.rebuild(terrain, source, mode);
        field
    }

    /// Recomputes every distance from scratch, reusing the allocation.
    pub fn rebuild(&mut self, terrain: &Terrain, source: CellCoord, mode: NavigationMode) {
        let cell_count = terrain.columns() as usize * terrain.rows() as usize;
        if self.distances.len() != cell_count {
            self.distances = vec![UNREACHED; cell_count];
        } else {
            self.distances.fill(UNREACHED);
        }
        self.columns = terrain.columns();
        self.rows = terrain.rows();

        if !terrain.contains(source) {
            return;
        }

        let mut frontier = BinaryHeap::new();
        self.distances[terrain.index(source)] = 0;
        frontier.push(Frontier {
            distance: 0,
            cell: source,
        });

        while let Some(Frontier { distance, cell }) = frontier.pop() {
            if distance > self.distances[terrain.index(cell)] {
                continue;
            }

            for neighbor in terrain.neighbors(cell) {
                let Some(cost) = mode.edge_cost(terrain.hardness(neighbor)) else {
                    continue;
                };
                let candidate = distance.saturating_add(cost);
                let index = terrain.index(neighbor);
                if candidate < self.distances[index] {
                    self.distances[index] = candidate;
                    frontier.push(Frontier {
                        distance: candidate,
                        cell: neighbor,
                    });
                }
            }
        }
    }

    /// Width of the field in cells.
    #[must_use]
    pub fn columns(&self) -> u32 {
        self.columns
    }

    /// Height of the field in cells.
    #[must_use]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Dense distances stored in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[i32] {
        &self.distances
    }

    /// Distance captured for the provided cell, if it lies within the field.
    #[must_use]
    pub fn distance(&self, cell: CellCoord) -> Option<i32> {
        if cell.column() >= self.columns || cell.row() >= self.rows {
            return None;
        }
        let index = cell.row() as usize * self.columns as usize + cell.column() as usize;
        self.distances.get(index).copied()
    }
}

/// Both distance fields the monsters navigate by.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NavigationFields {
    source: Option<CellCoord>,
    tunneling: DistanceField,
    non_tunneling: DistanceField,
}

impl NavigationFields {
    /// Recomputes both fields from `source`.
    pub fn rebuild(&mut self, terrain: &Terrain, source: CellCoord) {
        self.tunneling
            .rebuild(terrain, source, NavigationMode::Tunneling);
        self.non_tunneling
            .rebuild(terrain, source, NavigationMode::NonTunneling);
        self.source = Some(source);
    }

    /// Field computed under the provided mode.
    #[must_use]
    pub fn field(&self, mode: NavigationMode) -> &DistanceField {
        match mode {
            NavigationMode::Tunneling => &self.tunneling,
            NavigationMode::NonTunneling => &self.non_tunneling,
        }
    }

    /// Cell the fields were last computed from.
    #[must_use]
    pub fn source(&self) -> Option<CellCoord> {
        self.source
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Frontier {
    distance: i32,
    cell: CellCoord,
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .cmp(&self.distance)
            .then_with(|| other.cell.cmp(&self.cell))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
