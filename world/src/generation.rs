//! Procedural level builder: rooms, corridors and stairs.

use delve_core::{CellCoord, CellRect, CellRectSize, FloorKind, SimulationConfig};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::terrain::{Stairs, Terrain};

/// Terrain together with the rooms and stairs carved into it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Level {
    terrain: Terrain,
    rooms: Vec<CellRect>,
    stairs: Stairs,
}

impl Level {
    /// Assembles a level from a finished terrain and its annotations.
    #[must_use]
    pub fn from_parts(terrain: Terrain, rooms: Vec<CellRect>, stairs: Stairs) -> Self {
        Self {
            terrain,
            rooms,
            stairs,
        }
    }

    /// Terrain grid of the level.
    #[must_use]
    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    /// Mutable terrain grid, used when actors tunnel.
    pub fn terrain_mut(&mut self) -> &mut Terrain {
        &mut self.terrain
    }

    /// Rooms in placement order.
    #[must_use]
    pub fn rooms(&self) -> &[CellRect] {
        &self.rooms
    }

    /// Stair cells of the level.
    #[must_use]
    pub fn stairs(&self) -> &Stairs {
        &self.stairs
    }
}

/// Generates a complete level using the provided random source.
pub fn generate_level<R: Rng + ?Sized>(config: &SimulationConfig, rng: &mut R) -> Level {
    let mut terrain = Terrain::bordered(config.columns, config.rows, rng);
    let rooms = place_rooms(&mut terrain, config, rng);
    carve_corridors(&mut terrain, &rooms);
    let stairs = place_stairs(&mut terrain, rng);

    info!(
        rooms = rooms.len(),
        up = ?stairs.up,
        down = ?stairs.down,
        "level generated"
    );

    Level::from_parts(terrain, rooms, stairs)
}

fn place_rooms<R: Rng + ?Sized>(
    terrain: &mut Terrain,
    config: &SimulationConfig,
    rng: &mut R,
) -> Vec<CellRect> {
    let mut rooms = Vec::with_capacity(config.room_cap);
    let mut attempts = config.room_attempts;

    while attempts > 0 && rooms.len() < config.room_cap {
        attempts -= 1;

        let width = rng.gen_range(config.room_width.clone());
        let height = rng.gen_range(config.room_height.clone());
        let (Some(column_span), Some(row_span)) = (
            terrain.columns().checked_sub(width + 2),
            terrain.rows().checked_sub(height + 2),
        ) else {
            continue;
        };
        if column_span == 0 || row_span == 0 {
            continue;
        }

        let origin = CellCoord::new(rng.gen_range(1..=column_span), rng.gen_range(1..=row_span));
        let candidate = CellRect::from_origin_and_size(origin, CellRectSize::new(width, height));
        if !fits(terrain, &candidate) {
            continue;
        }

        for cell in candidate.cells() {
            terrain.carve(cell, FloorKind::Room);
        }
        rooms.push(candidate);
    }

    debug!(
        placed = rooms.len(),
        attempts_left = attempts,
        "room placement finished"
    );
    rooms
}

/// A room fits when it stays off the last interior ring and covers only
/// untouched rock.
fn fits(terrain: &Terrain, room: &CellRect) -> bool {
    let size = room.size();
    if size.width() == 0 || size.height() == 0 {
        return false;
    }
    if room.origin().column() == 0 || room.origin().row() == 0 {
        return false;
    }
    if room.end_column() + 1 >= terrain.columns() || room.end_row() + 1 >= terrain.rows() {
        return false;
    }
    room.cells()
        .all(|cell| terrain.floor(cell) == FloorKind::Rock && !terrain.is_immutable(cell))
}

fn carve_corridors(terrain: &mut Terrain, rooms: &[CellRect]) {
    for pair in rooms.windows(2) {
        let from = pair[0].center();
        let to = pair[1].center();
        let mut column = from.column();
        let mut row = from.row();

        while column != to.column() {
            carve_corridor_cell(terrain, CellCoord::new(column, row));
            if to.column() > column {
                column += 1;
            } else {
                column -= 1;
            }
        }
        while row != to.row() {
            carve_corridor_cell(terrain, CellCoord::new(column, row));
            if to.row() > row {
                row += 1;
            } else {
                row -= 1;
            }
        }
    }
}

fn carve_corridor_cell(terrain: &mut Terrain, cell: CellCoord) {
    if terrain.floor(cell) != FloorKind::Room {
        terrain.carve(cell, FloorKind::Corridor);
    }
}

fn place_stairs<R: Rng + ?Sized>(terrain: &mut Terrain, rng: &mut R) -> Stairs {
    let budget = terrain.draw_budget();
    let mut stairs = Stairs::default();

    stairs.up = terrain.random_cell(rng, budget, |cell| accepts_stair(terrain, cell));
    if let Some(up) = stairs.up {
        terrain.set_floor(up, FloorKind::StairUp);
    }

    stairs.down = terrain.random_cell(rng, budget, |cell| {
        accepts_stair(terrain, cell) && Some(cell) != stairs.up
    });
    if let Some(down) = stairs.down {
        terrain.set_floor(down, FloorKind::StairDown);
    }

    if stairs.up.is_none() || stairs.down.is_none() {
        warn!("no open floor left for stairs");
    }
    stairs
}

fn accepts_stair(terrain: &Terrain, cell: CellCoord) -> bool {
    matches!(terrain.floor(cell), FloorKind::Room | FloorKind::Corridor)
}
