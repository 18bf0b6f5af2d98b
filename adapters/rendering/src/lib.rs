#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Delve adapters.
//!
//! Frames are plain glyph grids composed from a read-only view of the world.
//! Presenters decide where the text ends up.

use std::{fmt, io::Write};

use anyhow::{Context, Result as AnyResult};
use delve_core::{ActorId, CellCoord};
use delve_world::{is_lit, query, World};

/// Glyph drawn on the teleport cursor.
pub const CURSOR_GLYPH: char = '*';

/// Snapshot of one screen: the map rows plus a status line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Map rows, top to bottom, one glyph per column.
    pub rows: Vec<String>,
    /// Mode-dependent hint shown above the map.
    pub status: String,
}

impl Frame {
    /// Glyph drawn at the provided cell, if it lies inside the frame.
    #[must_use]
    pub fn glyph(&self, cell: CellCoord) -> Option<char> {
        self.rows
            .get(cell.row() as usize)?
            .chars()
            .nth(cell.column() as usize)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.status)?;
        for row in &self.rows {
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}

/// Composes the frame the provided player sees.
///
/// With fog enabled, cells outside the light radius show what the player
/// remembers of them and hide monsters. Teleport mode reveals the whole map
/// and marks the cursor.
#[must_use]
pub fn compose_frame(world: &World, player: ActorId) -> Frame {
    let terrain = query::terrain(world);
    let radius = query::config(world).light_radius;
    let viewer = query::character(world, player);
    let center = viewer.map(|character| character.cell());
    let state = viewer.and_then(|character| character.player_state());
    let cursor = state.and_then(|state| state.teleport_cursor());
    let fogged = state.is_some_and(|state| state.fog_enabled()) && cursor.is_none();

    let columns = terrain.columns() as usize;
    let mut occupants: Vec<Option<char>> = vec![None; columns * terrain.rows() as usize];
    for monster in query::living_monsters(world) {
        let slot = &mut occupants[terrain.index(monster.cell())];
        if slot.is_none() {
            *slot = Some(monster.glyph());
        }
    }

    let mut rows = Vec::with_capacity(terrain.rows() as usize);
    for row in 0..terrain.rows() {
        let mut line = String::with_capacity(columns);
        for column in 0..terrain.columns() {
            let cell = CellCoord::new(column, row);
            let visible =
                !fogged || center.is_some_and(|center| is_lit(center, cell, radius));
            let glyph = if cursor == Some(cell) {
                CURSOR_GLYPH
            } else if center == Some(cell) {
                viewer.map_or(' ', |character| character.glyph())
            } else if visible {
                occupants[terrain.index(cell)].unwrap_or_else(|| terrain.floor(cell).glyph())
            } else {
                state
                    .and_then(|state| state.remembered(cell))
                    .map_or(' ', |kind| kind.glyph())
            };
            line.push(glyph);
        }
        rows.push(line);
    }

    Frame {
        rows,
        status: status_line(cursor.is_some(), fogged).to_owned(),
    }
}

fn status_line(teleporting: bool, fogged: bool) -> &'static str {
    if teleporting {
        "TELEPORT: move '*' with hjklyubn, 'g' to land, 'r' random, 'c' to cancel"
    } else if fogged {
        "Your turn. hjklyubn move, 'f' fog off, 'g' teleport, 'm' monsters, 'Q' quit"
    } else {
        "Your turn. hjklyubn move, 'f' fog on, 'g' teleport, 'm' monsters, 'Q' quit"
    }
}

/// Describes where every living monster lies relative to the player.
///
/// Lines read like `c: 3 north 2 east`.
#[must_use]
pub fn monster_list(world: &World) -> Vec<String> {
    query::monster_bearings(world)
        .into_iter()
        .map(|bearing| {
            let mut parts = Vec::with_capacity(2);
            if bearing.rows < 0 {
                parts.push(format!("{} north", -bearing.rows));
            } else if bearing.rows > 0 {
                parts.push(format!("{} south", bearing.rows));
            }
            if bearing.columns < 0 {
                parts.push(format!("{} west", -bearing.columns));
            } else if bearing.columns > 0 {
                parts.push(format!("{} east", bearing.columns));
            }
            if parts.is_empty() {
                parts.push("here".to_owned());
            }
            format!("{}: {}", bearing.glyph, parts.join(" "))
        })
        .collect()
}

/// Destination for composed frames.
pub trait Presenter {
    /// Shows a full map frame.
    fn present(&mut self, frame: &Frame) -> AnyResult<()>;

    /// Shows a titled list of text lines, such as the monster list.
    fn present_lines(&mut self, title: &str, lines: &[String]) -> AnyResult<()>;
}

/// Presenter that writes plain text to any [`Write`] sink.
#[derive(Debug)]
pub struct TextPresenter<W> {
    writer: W,
}

impl<W: Write> TextPresenter<W> {
    /// Wraps the provided writer.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Presenter for TextPresenter<W> {
    fn present(&mut self, frame: &Frame) -> AnyResult<()> {
        write!(self.writer, "{frame}").context("failed to write frame")?;
        self.writer.flush().context("failed to flush frame")
    }

    fn present_lines(&mut self, title: &str, lines: &[String]) -> AnyResult<()> {
        writeln!(self.writer, "--- {title} ---").context("failed to write list title")?;
        for line in lines {
            writeln!(self.writer, "{line}").context("failed to write list line")?;
        }
        self.writer.flush().context("failed to flush list")
    }
}
