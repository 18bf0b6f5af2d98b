#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Delve engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Systems inspect immutable world
//! views and submit [`Command`] values describing desired mutations, the world
//! executes those commands via its `apply` entry point, and then reports
//! [`Event`] values describing what actually happened. Nothing in this crate
//! owns grid state.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hardness of the immutable boundary rock. Never eroded, never entered.
pub const IMMUTABLE_HARDNESS: u8 = 255;

/// Hardness of permanently open floor.
pub const OPEN_HARDNESS: u8 = 0;

/// Amount of hardness removed by a single tunneling visit.
pub const EROSION_STEP: u8 = 85;

/// Scheduler time budget divided by an actor's speed to obtain its turn delay.
pub const TURN_QUANTUM: u64 = 1000;

/// Glyph used to draw the player character.
pub const PLAYER_GLYPH: char = '@';

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Refreshes the player's remembered terrain around its current cell.
    BeginPlayerTurn {
        /// Player whose turn is starting.
        actor: ActorId,
    },
    /// Requests that an actor relocate to an adjacent (or identical) cell.
    MoveActor {
        /// Actor attempting to move.
        actor: ActorId,
        /// Destination cell of the move.
        to: CellCoord,
    },
    /// Requests that an actor wear down the rock in the provided cell.
    Tunnel {
        /// Actor performing the erosion.
        actor: ActorId,
        /// Cell whose hardness should be reduced.
        cell: CellCoord,
    },
    /// Requests that an actor jump directly to the provided cell.
    Teleport {
        /// Actor being relocated.
        actor: ActorId,
        /// Cell the actor should land on.
        to: CellCoord,
    },
    /// Requests a level transition through the stair under the actor.
    UseStairs {
        /// Actor using the stairs.
        actor: ActorId,
        /// Which stair the actor expects to be standing on.
        direction: StairDirection,
    },
    /// Flips the player's fog-of-war presentation flag.
    ToggleFog {
        /// Player whose fog flag changes.
        actor: ActorId,
    },
    /// Places the teleport cursor on the player's cell.
    EnterTeleportMode {
        /// Player entering teleport mode.
        actor: ActorId,
    },
    /// Nudges the teleport cursor one cell, staying within the grid.
    MoveTeleportCursor {
        /// Player steering the cursor.
        actor: ActorId,
        /// Direction in which the cursor moves.
        direction: Direction,
    },
    /// Leaves teleport mode without relocating.
    CancelTeleport {
        /// Player leaving teleport mode.
        actor: ActorId,
    },
    /// Spends the actor's turn without acting.
    Rest {
        /// Actor resting.
        actor: ActorId,
    },
    /// Abandons the run; the player is removed from play.
    Quit {
        /// Player quitting.
        actor: ActorId,
    },
}

/// Events reported by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that an actor moved between two cells.
    ActorMoved {
        /// Actor that moved.
        actor: ActorId,
        /// Cell occupied before the move.
        from: CellCoord,
        /// Cell occupied after the move.
        to: CellCoord,
    },
    /// Reports that a move request could not be honoured.
    MoveBlocked {
        /// Actor whose move was rejected.
        actor: ActorId,
        /// Destination that refused entry.
        to: CellCoord,
    },
    /// Confirms that an actor was teleported.
    ActorTeleported {
        /// Actor that was relocated.
        actor: ActorId,
        /// Cell occupied before the jump.
        from: CellCoord,
        /// Cell occupied after the jump.
        to: CellCoord,
    },
    /// Reports that an actor died.
    ActorKilled {
        /// Actor that died.
        actor: ActorId,
        /// What ended the actor.
        cause: DeathCause,
    },
    /// Confirms that a cell lost hardness to tunneling.
    CellEroded {
        /// Cell that was eroded.
        cell: CellCoord,
        /// Hardness remaining after the erosion.
        hardness: u8,
    },
    /// Announces that the player's remembered terrain was refreshed.
    MemoryRefreshed {
        /// Player whose memory changed.
        actor: ActorId,
    },
    /// Announces that both distance fields were recomputed.
    NavigationRebuilt {
        /// Source cell the fields were computed from.
        source: CellCoord,
    },
    /// Announces the new state of the player's fog flag.
    FogToggled {
        /// Whether fog of war is now applied when rendering.
        enabled: bool,
    },
    /// Announces that the teleport cursor moved or appeared.
    TeleportCursorMoved {
        /// Cell under the cursor.
        cursor: CellCoord,
    },
    /// Announces that teleport mode ended without relocation.
    TeleportCancelled,
    /// Raised when a stair was successfully used.
    FloorChangeRequested {
        /// Direction of travel.
        direction: StairDirection,
    },
}

/// Reasons an actor stops participating in the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeathCause {
    /// Another actor stepped into the victim's cell.
    Slain {
        /// Actor that delivered the blow.
        by: ActorId,
    },
    /// The player abandoned the run.
    Quit,
}

/// Discrete commands issued by the player for a single decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlayerCommand {
    /// Step one cell, or steer the teleport cursor while teleporting.
    Move(Direction),
    /// Spend the turn in place.
    Rest,
    /// Use the stair under the player.
    UseStairs(StairDirection),
    /// Flip fog-of-war rendering.
    ToggleFog,
    /// Enter teleport mode with the cursor on the player.
    EnterTeleport,
    /// Teleport to the cursor.
    ConfirmTeleport,
    /// Teleport to a uniformly random cell that is not immutable rock.
    RandomTeleport,
    /// Leave teleport mode.
    CancelTeleport,
    /// Show the list of living monsters. Never consumes a turn.
    ListMonsters,
    /// Abandon the run.
    Quit,
}

/// Which way a stair leads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StairDirection {
    /// Stair leading up, drawn as `<`.
    Up,
    /// Stair leading down, drawn as `>`.
    Down,
}

/// Classification of a cell derived from hardness, rooms and stairs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FloorKind {
    /// Solid rock, erodible or not.
    Rock,
    /// Floor inside a room.
    Room,
    /// Carved passage outside any room.
    Corridor,
    /// Stair leading up.
    StairUp,
    /// Stair leading down.
    StairDown,
}

impl FloorKind {
    /// Glyph used when drawing the classification.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Rock => ' ',
            Self::Room => '.',
            Self::Corridor => '#',
            Self::StairUp => '<',
            Self::StairDown => '>',
        }
    }

    /// Reports whether the player may walk onto the cell.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        !matches!(self, Self::Rock)
    }

    /// Stair kind matching the provided direction.
    #[must_use]
    pub const fn stair(direction: StairDirection) -> Self {
        match direction {
            StairDirection::Up => Self::StairUp,
            StairDirection::Down => Self::StairDown,
        }
    }
}

/// Eight compass directions used for single-cell steps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Toward decreasing rows.
    North,
    /// Toward decreasing rows and increasing columns.
    NorthEast,
    /// Toward increasing columns.
    East,
    /// Toward increasing rows and columns.
    SouthEast,
    /// Toward increasing rows.
    South,
    /// Toward increasing rows and decreasing columns.
    SouthWest,
    /// Toward decreasing columns.
    West,
    /// Toward decreasing rows and columns.
    NorthWest,
}

impl Direction {
    /// Every direction in the fixed order used for neighbour scans.
    pub const ALL: [Direction; 8] = [
        Direction::West,
        Direction::East,
        Direction::North,
        Direction::South,
        Direction::NorthWest,
        Direction::SouthWest,
        Direction::NorthEast,
        Direction::SouthEast,
    ];

    /// Column and row deltas for a single step.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::NorthEast => (1, -1),
            Self::East => (1, 0),
            Self::SouthEast => (1, 1),
            Self::South => (0, 1),
            Self::SouthWest => (-1, 1),
            Self::West => (-1, 0),
            Self::NorthWest => (-1, -1),
        }
    }
}

/// Unique identifier assigned to an actor within a roster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(u32);

impl ActorId {
    /// Creates a new actor identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Cell displaced by the provided deltas, if it stays non-negative.
    #[must_use]
    pub fn offset_by(self, dx: i32, dy: i32) -> Option<CellCoord> {
        let column = self.column.checked_add_signed(dx)?;
        let row = self.row.checked_add_signed(dy)?;
        Some(CellCoord::new(column, row))
    }

    /// Neighbouring cell in the provided direction, if it stays non-negative.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<CellCoord> {
        let (dx, dy) = direction.offset();
        self.offset_by(dx, dy)
    }

    /// Squared Euclidean distance between two cells.
    #[must_use]
    pub fn distance_squared(self, other: CellCoord) -> u64 {
        let dx = u64::from(self.column.abs_diff(other.column));
        let dy = u64::from(self.row.abs_diff(other.row));
        dx * dx + dy * dy
    }

    /// Signed column and row deltas from `self` to `other`.
    #[must_use]
    pub fn delta_to(self, other: CellCoord) -> (i64, i64) {
        (
            i64::from(other.column) - i64::from(self.column),
            i64::from(other.row) - i64::from(self.row),
        )
    }
}

/// Axis-aligned rectangle expressed in cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRect {
    origin: CellCoord,
    size: CellRectSize,
}

impl CellRect {
    /// Constructs a rectangle from an origin cell and size.
    #[must_use]
    pub const fn from_origin_and_size(origin: CellCoord, size: CellRectSize) -> Self {
        Self { origin, size }
    }

    /// Upper-left cell that anchors the rectangle.
    #[must_use]
    pub const fn origin(&self) -> CellCoord {
        self.origin
    }

    /// Dimensions of the rectangle measured in whole cells.
    #[must_use]
    pub const fn size(&self) -> CellRectSize {
        self.size
    }

    /// First column past the right edge.
    #[must_use]
    pub const fn end_column(&self) -> u32 {
        self.origin.column() + self.size.width()
    }

    /// First row past the bottom edge.
    #[must_use]
    pub const fn end_row(&self) -> u32 {
        self.origin.row() + self.size.height()
    }

    /// Centre cell, rounding toward the origin.
    #[must_use]
    pub const fn center(&self) -> CellCoord {
        CellCoord::new(
            self.origin.column() + self.size.width() / 2,
            self.origin.row() + self.size.height() / 2,
        )
    }

    /// Reports whether the rectangle covers the provided cell.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() >= self.origin.column()
            && cell.column() < self.end_column()
            && cell.row() >= self.origin.row()
            && cell.row() < self.end_row()
    }

    /// Reports whether two rectangles share at least one cell.
    #[must_use]
    pub const fn overlaps(&self, other: &CellRect) -> bool {
        self.origin.column() < other.end_column()
            && other.origin.column() < self.end_column()
            && self.origin.row() < other.end_row()
            && other.origin.row() < self.end_row()
    }

    /// Iterates every covered cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> {
        let columns = self.origin.column()..self.end_column();
        (self.origin.row()..self.end_row())
            .flat_map(move |row| columns.clone().map(move |column| CellCoord::new(column, row)))
    }
}

/// Size of a [`CellRect`] measured in whole cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRectSize {
    width: u32,
    height: u32,
}

impl CellRectSize {
    /// Creates a new size descriptor with explicit dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width of the rectangle in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the rectangle in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }
}

/// Independent monster behaviour bits packed into the low nibble of a byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BehaviorFlags(u8);

impl BehaviorFlags {
    /// Navigates by the distance field instead of a greedy approach.
    pub const INTELLIGENT: u8 = 0x1;
    /// Carried in data; no movement rule consults it.
    pub const TELEPATHIC: u8 = 0x2;
    /// Erodes rock instead of being blocked by it.
    pub const TUNNELING: u8 = 0x4;
    /// Occasionally wanders at random.
    pub const ERRATIC: u8 = 0x8;

    /// Builds a flag set from raw bits, discarding everything above the nibble.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0x0F)
    }

    /// Raw nibble value.
    #[must_use]
    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Whether the intelligent bit is set.
    #[must_use]
    pub const fn is_intelligent(&self) -> bool {
        self.0 & Self::INTELLIGENT != 0
    }

    /// Whether the telepathic bit is set.
    #[must_use]
    pub const fn is_telepathic(&self) -> bool {
        self.0 & Self::TELEPATHIC != 0
    }

    /// Whether the tunneling bit is set.
    #[must_use]
    pub const fn is_tunneling(&self) -> bool {
        self.0 & Self::TUNNELING != 0
    }

    /// Whether the erratic bit is set.
    #[must_use]
    pub const fn is_erratic(&self) -> bool {
        self.0 & Self::ERRATIC != 0
    }

    /// Lowercase hexadecimal digit naming the flag set.
    #[must_use]
    pub const fn glyph(&self) -> char {
        const HEX: &[u8; 16] = b"0123456789abcdef";
        HEX[self.0 as usize] as char
    }
}

/// Positive number of scheduler ticks per [`TURN_QUANTUM`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Speed(u32);

impl Speed {
    /// Validates and wraps a speed value.
    pub const fn new(value: u32) -> Result<Self, ActorError> {
        if value == 0 {
            return Err(ActorError::NonPositiveSpeed);
        }
        Ok(Self(value))
    }

    /// Raw speed value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Ticks between consecutive turns, `floor(1000 / speed)`.
    #[must_use]
    pub const fn turn_delay(&self) -> u64 {
        TURN_QUANTUM / self.0 as u64
    }
}

/// Reasons an actor cannot be created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ActorError {
    /// Speed must be a positive integer.
    #[error("actor speed must be positive")]
    NonPositiveSpeed,
    /// Actors must start inside the grid.
    #[error("actor spawn cell ({column}, {row}) lies outside the grid")]
    OutOfBounds {
        /// Column of the rejected cell.
        column: u32,
        /// Row of the rejected cell.
        row: u32,
    },
}

/// Tunables for one simulation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Number of grid columns, including the boundary.
    pub columns: u32,
    /// Number of grid rows, including the boundary.
    pub rows: u32,
    /// Maximum number of rooms the generator keeps.
    pub room_cap: usize,
    /// Number of candidate rooms drawn before giving up.
    pub room_attempts: u32,
    /// Inclusive range of room widths.
    pub room_width: RangeInclusive<u32>,
    /// Inclusive range of room heights.
    pub room_height: RangeInclusive<u32>,
    /// Euclidean radius the player sees around itself.
    pub light_radius: u32,
    /// Number of monsters placed on a freshly generated level.
    pub monster_count: usize,
    /// Speed assigned to the player.
    pub player_speed: u32,
    /// Hit points assigned to the player.
    pub player_hp: u8,
    /// Inclusive range of monster speeds.
    pub monster_speed: RangeInclusive<u32>,
    /// Hit points assigned to freshly spawned monsters.
    pub monster_hp: u8,
    /// Player cell used when the generator placed no rooms.
    pub fallback_spawn: CellCoord,
}

impl SimulationConfig {
    /// Replaces the monster count for fresh levels.
    #[must_use]
    pub fn with_monster_count(mut self, monster_count: usize) -> Self {
        self.monster_count = monster_count;
        self
    }

    /// Number of cells in the grid.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            columns: 80,
            rows: 21,
            room_cap: 6,
            room_attempts: 2000,
            room_width: 4..=9,
            room_height: 3..=6,
            light_radius: 3,
            monster_count: 10,
            player_speed: 10,
            player_hp: 50,
            monster_speed: 5..=20,
            monster_hp: 10,
            fallback_spawn: CellCoord::new(1, 1),
        }
    }
}
