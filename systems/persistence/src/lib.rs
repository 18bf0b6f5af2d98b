#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Binary save format for a single level.
//!
//! All multi-byte integers are big-endian. Coordinates and monster
//! attributes take one byte each. The floor classification is not stored;
//! it is derived from hardness, rooms and stairs when the state is loaded.

use std::{
    fmt,
    io::{Read, Write},
};

use delve_core::{
    ActorError, BehaviorFlags, CellCoord, CellRect, CellRectSize, SimulationConfig,
};
use delve_world::{query, Level, MonsterSeed, Stairs, Terrain, World};
use thiserror::Error;
use tracing::{debug, warn};

/// Signature that opens every save file.
pub const MARKER: &[u8; 12] = b"RLG327-S2025";

/// Only save format version understood by this crate.
pub const VERSION: u32 = 0;

const HEADER_LEN: u32 = 20;
const CELL_LEN: u32 = 2;
const ROOM_RECORD_LEN: u32 = 4;
const STAIR_RECORD_LEN: u32 = 2;
const MONSTER_RECORD_LEN: u32 = 5;
const COUNT_LEN: u32 = 2;

/// Region of the save file, used to report where decoding failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Section {
    /// Marker, version and size.
    Header,
    /// Player coordinates.
    Player,
    /// Row-major hardness grid.
    Hardness,
    /// Room rectangles.
    Rooms,
    /// Up stair flag and coordinates.
    UpStair,
    /// Down stair flag and coordinates.
    DownStair,
    /// Monster records.
    Monsters,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Header => "header",
            Self::Player => "player",
            Self::Hardness => "hardness",
            Self::Rooms => "rooms",
            Self::UpStair => "up stair",
            Self::DownStair => "down stair",
            Self::Monsters => "monsters",
        };
        f.write_str(name)
    }
}

/// Errors raised while reading or writing save files.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The file does not start with [`MARKER`].
    #[error("save file marker does not match")]
    InvalidMarker,
    /// The file declares a version other than [`VERSION`].
    #[error("save file version {0} is not supported")]
    UnsupportedVersion(u32),
    /// The file ended before a mandatory section was complete.
    #[error("save file ends inside the {section} section")]
    Truncated {
        /// Section being read.
        section: Section,
    },
    /// A stored coordinate lies outside the configured grid.
    #[error("{section} entry at {cell:?} lies outside the grid")]
    OutOfBounds {
        /// Section holding the coordinate.
        section: Section,
        /// Offending coordinate.
        cell: CellCoord,
    },
    /// A value does not fit the field width of the format.
    #[error("{section} value {value} does not fit the save format")]
    Unrepresentable {
        /// Section holding the value.
        section: Section,
        /// Offending value.
        value: u32,
    },
    /// Reading or writing the underlying stream failed.
    #[error("save file i/o failed")]
    Io(#[from] std::io::Error),
    /// A stored monster cannot be recreated.
    #[error("stored monster is invalid")]
    Actor(#[from] ActorError),
}

/// Everything a save file records about a level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveState {
    /// Grid width the hardness data was laid out with.
    pub columns: u32,
    /// Grid height the hardness data was laid out with.
    pub rows: u32,
    /// Player cell.
    pub player: CellCoord,
    /// Row-major hardness grid.
    pub hardness: Vec<u8>,
    /// Rooms in placement order.
    pub rooms: Vec<CellRect>,
    /// Stair cells.
    pub stairs: Stairs,
    /// Living monsters in roster order.
    pub monsters: Vec<MonsterSeed>,
}

impl SaveState {
    /// Records the persistent parts of the world.
    #[must_use]
    pub fn capture(world: &World) -> Self {
        let level = query::level(world);
        let terrain = level.terrain();
        let monsters = query::living_monsters(world)
            .filter_map(|monster| {
                Some(MonsterSeed {
                    cell: monster.cell(),
                    speed: monster.speed().get(),
                    hp: monster.hp(),
                    flags: monster.behavior()?,
                })
            })
            .collect();

        Self {
            columns: terrain.columns(),
            rows: terrain.rows(),
            player: query::player(world).cell(),
            hardness: terrain.hardness_cells().to_vec(),
            rooms: level.rooms().to_vec(),
            stairs: *level.stairs(),
            monsters,
        }
    }

    /// Rebuilds a world with a fresh player at the stored cell.
    pub fn into_world(self, config: SimulationConfig) -> Result<World, PersistenceError> {
        let terrain = Terrain::derive(
            self.columns,
            self.rows,
            self.hardness,
            &self.rooms,
            &self.stairs,
        );
        let level = Level::from_parts(terrain, self.rooms, self.stairs);
        Ok(World::restore(config, level, self.player, &self.monsters)?)
    }

    /// Total length of the encoded file, as written into the header.
    ///
    /// Readers treat the field as informational and never check it.
    #[must_use]
    pub fn file_size(&self) -> u32 {
        let cells = u32::try_from(self.hardness.len()).unwrap_or(u32::MAX);
        let rooms = u32::try_from(self.rooms.len()).unwrap_or(u32::MAX);
        let monsters = u32::try_from(self.monsters.len()).unwrap_or(u32::MAX);
        let up = u32::from(self.stairs.up.is_some());
        let down = u32::from(self.stairs.down.is_some());

        HEADER_LEN
            .saturating_add(CELL_LEN)
            .saturating_add(cells)
            .saturating_add(COUNT_LEN)
            .saturating_add(rooms.saturating_mul(ROOM_RECORD_LEN))
            .saturating_add(COUNT_LEN)
            .saturating_add(up * STAIR_RECORD_LEN)
            .saturating_add(COUNT_LEN)
            .saturating_add(down * STAIR_RECORD_LEN)
            .saturating_add(COUNT_LEN)
            .saturating_add(monsters.saturating_mul(MONSTER_RECORD_LEN))
    }
}

/// Serialises the state into the save format.
pub fn encode(state: &SaveState) -> Result<Vec<u8>, PersistenceError> {
    let mut bytes = Vec::with_capacity(state.file_size() as usize);
    bytes.extend_from_slice(MARKER);
    bytes.extend_from_slice(&VERSION.to_be_bytes());
    bytes.extend_from_slice(&state.file_size().to_be_bytes());

    push_cell(&mut bytes, Section::Player, state.player)?;
    bytes.extend_from_slice(&state.hardness);

    push_count(&mut bytes, Section::Rooms, state.rooms.len())?;
    for room in &state.rooms {
        push_cell(&mut bytes, Section::Rooms, room.origin())?;
        push_byte(&mut bytes, Section::Rooms, room.size().width())?;
        push_byte(&mut bytes, Section::Rooms, room.size().height())?;
    }

    push_stair(&mut bytes, Section::UpStair, state.stairs.up)?;
    push_stair(&mut bytes, Section::DownStair, state.stairs.down)?;

    push_count(&mut bytes, Section::Monsters, state.monsters.len())?;
    for monster in &state.monsters {
        push_cell(&mut bytes, Section::Monsters, monster.cell)?;
        push_byte(&mut bytes, Section::Monsters, monster.speed)?;
        bytes.push(monster.hp);
        bytes.push(monster.flags.bits());
    }

    Ok(bytes)
}

/// Writes the encoded state to `writer`.
pub fn write<W: Write>(state: &SaveState, mut writer: W) -> Result<(), PersistenceError> {
    let bytes = encode(state)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    debug!(bytes = bytes.len(), "save written");
    Ok(())
}

/// Parses a save file laid out for the configured grid size.
///
/// A monster section cut short keeps the records read in full and logs a
/// warning; every other shortfall is an error.
pub fn decode(bytes: &[u8], config: &SimulationConfig) -> Result<SaveState, PersistenceError> {
    let mut reader = ByteReader::new(bytes);

    let marker = reader.take(MARKER.len(), Section::Header)?;
    if marker != MARKER {
        return Err(PersistenceError::InvalidMarker);
    }
    let version = reader.u32(Section::Header)?;
    if version != VERSION {
        return Err(PersistenceError::UnsupportedVersion(version));
    }
    let declared_size = reader.u32(Section::Header)?;

    let (columns, rows) = (config.columns, config.rows);
    let contains = |cell: CellCoord| cell.column() < columns && cell.row() < rows;

    let player = reader.cell(Section::Player)?;
    if !contains(player) {
        return Err(PersistenceError::OutOfBounds {
            section: Section::Player,
            cell: player,
        });
    }

    let hardness = reader.take(config.cell_count(), Section::Hardness)?.to_vec();

    let room_count = reader.u16(Section::Rooms)?;
    let mut rooms = Vec::with_capacity(usize::from(room_count));
    for _ in 0..room_count {
        let origin = reader.cell(Section::Rooms)?;
        let width = u32::from(reader.u8(Section::Rooms)?);
        let height = u32::from(reader.u8(Section::Rooms)?);
        let room = CellRect::from_origin_and_size(origin, CellRectSize::new(width, height));
        if width > 0 && height > 0 {
            let far = CellCoord::new(room.end_column() - 1, room.end_row() - 1);
            if !contains(origin) || !contains(far) {
                return Err(PersistenceError::OutOfBounds {
                    section: Section::Rooms,
                    cell: origin,
                });
            }
        }
        rooms.push(room);
    }

    let stairs = Stairs {
        up: reader.stair(Section::UpStair, &contains)?,
        down: reader.stair(Section::DownStair, &contains)?,
    };

    let monsters = read_monsters(&mut reader, &contains)?;

    debug!(
        declared_size,
        rooms = rooms.len(),
        monsters = monsters.len(),
        "save decoded"
    );

    Ok(SaveState {
        columns,
        rows,
        player,
        hardness,
        rooms,
        stairs,
        monsters,
    })
}

/// Reads the whole stream and decodes it.
pub fn read<R: Read>(
    mut reader: R,
    config: &SimulationConfig,
) -> Result<SaveState, PersistenceError> {
    let mut bytes = Vec::new();
    let _ = reader.read_to_end(&mut bytes)?;
    decode(&bytes, config)
}

fn read_monsters(
    reader: &mut ByteReader<'_>,
    contains: &impl Fn(CellCoord) -> bool,
) -> Result<Vec<MonsterSeed>, PersistenceError> {
    let Ok(count) = reader.u16(Section::Monsters) else {
        warn!("save file has no monster count, loading without monsters");
        return Ok(Vec::new());
    };

    let mut monsters = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        let Ok(record) = reader.take(MONSTER_RECORD_LEN as usize, Section::Monsters) else {
            warn!(
                expected = count,
                loaded = monsters.len(),
                "monster section truncated"
            );
            break;
        };
        let cell = CellCoord::new(u32::from(record[0]), u32::from(record[1]));
        if !contains(cell) {
            return Err(PersistenceError::OutOfBounds {
                section: Section::Monsters,
                cell,
            });
        }
        monsters.push(MonsterSeed {
            cell,
            speed: u32::from(record[2]),
            hp: record[3],
            flags: BehaviorFlags::from_bits(record[4]),
        });
    }
    Ok(monsters)
}

fn push_byte(bytes: &mut Vec<u8>, section: Section, value: u32) -> Result<(), PersistenceError> {
    let byte =
        u8::try_from(value).map_err(|_| PersistenceError::Unrepresentable { section, value })?;
    bytes.push(byte);
    Ok(())
}

fn push_cell(
    bytes: &mut Vec<u8>,
    section: Section,
    cell: CellCoord,
) -> Result<(), PersistenceError> {
    push_byte(bytes, section, cell.column())?;
    push_byte(bytes, section, cell.row())
}

fn push_count(
    bytes: &mut Vec<u8>,
    section: Section,
    count: usize,
) -> Result<(), PersistenceError> {
    let count = u16::try_from(count).map_err(|_| PersistenceError::Unrepresentable {
        section,
        value: u32::try_from(count).unwrap_or(u32::MAX),
    })?;
    bytes.extend_from_slice(&count.to_be_bytes());
    Ok(())
}

fn push_stair(
    bytes: &mut Vec<u8>,
    section: Section,
    stair: Option<CellCoord>,
) -> Result<(), PersistenceError> {
    match stair {
        Some(cell) => {
            bytes.extend_from_slice(&1_u16.to_be_bytes());
            push_cell(bytes, section, cell)
        }
        None => {
            bytes.extend_from_slice(&0_u16.to_be_bytes());
            Ok(())
        }
    }
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn take(&mut self, len: usize, section: Section) -> Result<&'a [u8], PersistenceError> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(PersistenceError::Truncated { section })?;
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn u8(&mut self, section: Section) -> Result<u8, PersistenceError> {
        Ok(self.take(1, section)?[0])
    }

    fn u16(&mut self, section: Section) -> Result<u16, PersistenceError> {
        let bytes = self.take(2, section)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn u32(&mut self, section: Section) -> Result<u32, PersistenceError> {
        let bytes = self.take(4, section)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn cell(&mut self, section: Section) -> Result<CellCoord, PersistenceError> {
        let column = u32::from(self.u8(section)?);
        let row = u32::from(self.u8(section)?);
        Ok(CellCoord::new(column, row))
    }

    fn stair(
        &mut self,
        section: Section,
        contains: &impl Fn(CellCoord) -> bool,
    ) -> Result<Option<CellCoord>, PersistenceError> {
        if self.u16(section)? == 0 {
            return Ok(None);
        }
        let cell = self.cell(section)?;
        if !contains(cell) {
            return Err(PersistenceError::OutOfBounds { section, cell });
        }
        Ok(Some(cell))
    }
}
