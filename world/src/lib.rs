#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Delve.
//!
//! The [`World`] owns the level terrain, the distance fields computed over it
//! and the character roster. Systems never mutate it directly: they submit
//! [`Command`] values to [`apply`] and react to the [`Event`] values it
//! reports. Read access goes through the [`query`] module.

pub mod generation;
pub mod navigation;
pub mod terrain;

use delve_core::{
    ActorError, ActorId, BehaviorFlags, CellCoord, Command, DeathCause, Event, FloorKind,
    SimulationConfig, Speed, PLAYER_GLYPH,
};
use rand::Rng;
use tracing::{debug, info, warn};

pub use generation::{generate_level, Level};
pub use navigation::{DistanceField, NavigationFields, NavigationMode, UNREACHED};
pub use terrain::{Erosion, Stairs, Terrain};

/// Description of a monster to place into a roster.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonsterSeed {
    /// Cell the monster starts on.
    pub cell: CellCoord,
    /// Raw speed; zero is rejected.
    pub speed: u32,
    /// Hit points carried for persistence.
    pub hp: u8,
    /// Behaviour bits.
    pub flags: BehaviorFlags,
}

/// Player-only state: remembered terrain and presentation modes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerState {
    columns: u32,
    memory: Vec<Option<FloorKind>>,
    fog_enabled: bool,
    teleport_cursor: Option<CellCoord>,
}

impl PlayerState {
    fn blank(columns: u32, rows: u32) -> Self {
        Self {
            columns,
            memory: vec![None; columns as usize * rows as usize],
            fog_enabled: true,
            teleport_cursor: None,
        }
    }

    /// Terrain the player last saw at the cell, `None` if never seen.
    #[must_use]
    pub fn remembered(&self, cell: CellCoord) -> Option<FloorKind> {
        if cell.column() >= self.columns {
            return None;
        }
        let index = cell.row() as usize * self.columns as usize + cell.column() as usize;
        self.memory.get(index).copied().flatten()
    }

    /// Whether rendering hides cells outside the light radius.
    #[must_use]
    pub const fn fog_enabled(&self) -> bool {
        self.fog_enabled
    }

    /// Teleport cursor, present only while teleport mode is active.
    #[must_use]
    pub const fn teleport_cursor(&self) -> Option<CellCoord> {
        self.teleport_cursor
    }

    /// Whether the player is steering the teleport cursor.
    #[must_use]
    pub const fn is_teleporting(&self) -> bool {
        self.teleport_cursor.is_some()
    }
}

/// Closed set of character kinds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CharacterKind {
    /// The player character.
    Player(PlayerState),
    /// A monster driven by its behaviour bits.
    Monster(BehaviorFlags),
}

/// One entry of the roster. Dead characters stay until the level is replaced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Character {
    id: ActorId,
    cell: CellCoord,
    alive: bool,
    speed: Speed,
    hp: u8,
    kind: CharacterKind,
}

impl Character {
    /// Identifier of the character.
    #[must_use]
    pub const fn id(&self) -> ActorId {
        self.id
    }

    /// Cell the character occupies.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Whether the character still takes turns.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Validated speed of the character.
    #[must_use]
    pub const fn speed(&self) -> Speed {
        self.speed
    }

    /// Hit points of the character.
    #[must_use]
    pub const fn hp(&self) -> u8 {
        self.hp
    }

    /// Kind-specific state.
    #[must_use]
    pub const fn kind(&self) -> &CharacterKind {
        &self.kind
    }

    /// Whether this is the player character.
    #[must_use]
    pub const fn is_player(&self) -> bool {
        matches!(self.kind, CharacterKind::Player(_))
    }

    /// Behaviour bits, for monsters.
    #[must_use]
    pub const fn behavior(&self) -> Option<BehaviorFlags> {
        match self.kind {
            CharacterKind::Monster(flags) => Some(flags),
            CharacterKind::Player(_) => None,
        }
    }

    /// Player state, for the player character.
    #[must_use]
    pub const fn player_state(&self) -> Option<&PlayerState> {
        match &self.kind {
            CharacterKind::Player(state) => Some(state),
            CharacterKind::Monster(_) => None,
        }
    }

    /// Glyph drawn for the character.
    #[must_use]
    pub const fn glyph(&self) -> char {
        match self.kind {
            CharacterKind::Player(_) => PLAYER_GLYPH,
            CharacterKind::Monster(flags) => flags.glyph(),
        }
    }

    fn player_state_mut(&mut self) -> Option<&mut PlayerState> {
        match &mut self.kind {
            CharacterKind::Player(state) => Some(state),
            CharacterKind::Monster(_) => None,
        }
    }
}

/// Offset from the player to a living monster, used by monster listings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonsterBearing {
    /// Glyph of the monster.
    pub glyph: char,
    /// Columns east of the player; negative means west.
    pub columns: i64,
    /// Rows south of the player; negative means north.
    pub rows: i64,
}

/// Reports whether `cell` lies within the Euclidean light radius of `center`.
#[must_use]
pub fn is_lit(center: CellCoord, cell: CellCoord, radius: u32) -> bool {
    let radius = u64::from(radius);
    center.distance_squared(cell) <= radius * radius
}

/// Represents the authoritative Delve world state.
#[derive(Clone, Debug)]
pub struct World {
    config: SimulationConfig,
    level: Level,
    fields: NavigationFields,
    roster: Vec<Character>,
    player: ActorId,
}

impl World {
    /// Generates a fresh level and populates it.
    ///
    /// The player starts on the first room's origin, or on the configured
    /// fallback cell when no room was placed. Monsters land on random room
    /// floor cells with random behaviour bits and speed.
    pub fn generate<R: Rng + ?Sized>(
        config: SimulationConfig,
        rng: &mut R,
    ) -> Result<Self, ActorError> {
        let level = generate_level(&config, rng);
        let spawn = level
            .rooms()
            .first()
            .map_or(config.fallback_spawn, |room| room.origin());
        let mut world = Self::with_player(config, level, spawn)?;

        let budget = world.level.terrain().draw_budget();
        for _ in 0..world.config.monster_count {
            let terrain = world.level.terrain();
            let Some(cell) =
                terrain.random_cell(rng, budget, |cell| terrain.floor(cell) == FloorKind::Room)
            else {
                warn!("no room floor available for monsters");
                break;
            };
            let seed = MonsterSeed {
                cell,
                speed: rng.gen_range(world.config.monster_speed.clone()),
                hp: world.config.monster_hp,
                flags: BehaviorFlags::from_bits(rng.gen::<u8>()),
            };
            let _ = world.spawn_monster(seed)?;
        }

        info!(
            monsters = world.roster.len() - 1,
            player = ?spawn,
            "world populated"
        );
        Ok(world)
    }

    /// Rebuilds a world from persisted parts with a brand-new player.
    pub fn restore(
        config: SimulationConfig,
        level: Level,
        player_cell: CellCoord,
        monsters: &[MonsterSeed],
    ) -> Result<Self, ActorError> {
        let mut world = Self::with_player(config, level, player_cell)?;
        for seed in monsters {
            let _ = world.spawn_monster(*seed)?;
        }
        Ok(world)
    }

    fn with_player(
        config: SimulationConfig,
        level: Level,
        spawn: CellCoord,
    ) -> Result<Self, ActorError> {
        let terrain = level.terrain();
        if !terrain.contains(spawn) {
            return Err(ActorError::OutOfBounds {
                column: spawn.column(),
                row: spawn.row(),
            });
        }
        let player = Character {
            id: ActorId::new(0),
            cell: spawn,
            alive: true,
            speed: Speed::new(config.player_speed)?,
            hp: config.player_hp,
            kind: CharacterKind::Player(PlayerState::blank(terrain.columns(), terrain.rows())),
        };

        let mut world = Self {
            config,
            level,
            fields: NavigationFields::default(),
            roster: vec![player],
            player: ActorId::new(0),
        };
        world.rebuild_navigation();
        Ok(world)
    }

    /// Appends a monster to the roster after validating it.
    pub fn spawn_monster(&mut self, seed: MonsterSeed) -> Result<ActorId, ActorError> {
        let speed = Speed::new(seed.speed)?;
        if !self.level.terrain().contains(seed.cell) {
            return Err(ActorError::OutOfBounds {
                column: seed.cell.column(),
                row: seed.cell.row(),
            });
        }
        let id = ActorId::new(u32::try_from(self.roster.len()).unwrap_or(u32::MAX));
        self.roster.push(Character {
            id,
            cell: seed.cell,
            alive: true,
            speed,
            hp: seed.hp,
            kind: CharacterKind::Monster(seed.flags),
        });
        Ok(id)
    }

    fn rebuild_navigation(&mut self) {
        let source = self.roster[self.player_index()].cell;
        self.fields.rebuild(self.level.terrain(), source);
        debug!(source = ?source, "navigation rebuilt");
    }

    fn player_index(&self) -> usize {
        self.player.get() as usize
    }

    fn index_of(&self, actor: ActorId) -> Option<usize> {
        let index = actor.get() as usize;
        self.roster
            .get(index)
            .filter(|character| character.id == actor)
            .map(|_| index)
    }

    fn kill(&mut self, index: usize, cause: DeathCause, out_events: &mut Vec<Event>) {
        let victim = &mut self.roster[index];
        if !victim.alive {
            return;
        }
        victim.alive = false;
        out_events.push(Event::ActorKilled {
            actor: victim.id,
            cause,
        });
    }

    /// Moves the actor and resolves the one-hit melee rule at the destination.
    fn relocate(&mut self, index: usize, to: CellCoord, out_events: &mut Vec<Event>) -> CellCoord {
        let mover = self.roster[index].id;
        let mover_is_player = self.roster[index].is_player();
        let from = self.roster[index].cell;
        self.roster[index].cell = to;

        let victims: Vec<usize> = self
            .roster
            .iter()
            .enumerate()
            .filter(|(other, character)| {
                *other != index
                    && character.alive
                    && character.cell == to
                    && (mover_is_player || character.is_player())
            })
            .map(|(other, _)| other)
            .collect();
        for victim in victims {
            self.kill(victim, DeathCause::Slain { by: mover }, out_events);
        }
        from
    }

    fn can_enter(&self, character: &Character, to: CellCoord) -> bool {
        let terrain = self.level.terrain();
        if !terrain.contains(to) || terrain.is_immutable(to) {
            return false;
        }
        if character.is_player() {
            terrain.is_walkable(to)
        } else {
            terrain.is_open(to)
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Commands naming a dead or unknown actor are ignored. Whenever the player's
/// cell changes, both distance fields are recomputed after the command's
/// terrain changes have been applied.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    let actor = command_actor(&command);
    let Some(index) = world.index_of(actor) else {
        return;
    };
    if !world.roster[index].alive {
        return;
    }
    let player_cell = world.roster[world.player_index()].cell;

    match command {
        Command::BeginPlayerTurn { .. } => {
            let radius = world.config.light_radius;
            let terrain = world.level.terrain();
            let character = &mut world.roster[index];
            let center = character.cell;
            if let Some(state) = character.player_state_mut() {
                refresh_memory(state, terrain, center, radius);
                out_events.push(Event::MemoryRefreshed { actor });
            }
        }
        Command::MoveActor { to, .. } => {
            if world.can_enter(&world.roster[index], to) {
                let from = world.relocate(index, to, out_events);
                out_events.push(Event::ActorMoved { actor, from, to });
            } else {
                out_events.push(Event::MoveBlocked { actor, to });
            }
        }
        Command::Tunnel { cell, .. } => {
            if let Erosion::Eroded { remaining } = world.level.terrain_mut().erode(cell) {
                out_events.push(Event::CellEroded {
                    cell,
                    hardness: remaining,
                });
            }
        }
        Command::Teleport { to, .. } => {
            if let Some(state) = world.roster[index].player_state_mut() {
                state.teleport_cursor = None;
            }
            let terrain = world.level.terrain();
            if terrain.contains(to) && !terrain.is_immutable(to) {
                let from = world.relocate(index, to, out_events);
                out_events.push(Event::ActorTeleported { actor, from, to });
            } else {
                out_events.push(Event::MoveBlocked { actor, to });
            }
        }
        Command::UseStairs { direction, .. } => {
            let here = world.roster[index].cell;
            if world.level.terrain().floor(here) == FloorKind::stair(direction) {
                info!(?direction, "stairs taken");
                out_events.push(Event::FloorChangeRequested { direction });
            }
        }
        Command::ToggleFog { .. } => {
            if let Some(state) = world.roster[index].player_state_mut() {
                state.fog_enabled = !state.fog_enabled;
                out_events.push(Event::FogToggled {
                    enabled: state.fog_enabled,
                });
            }
        }
        Command::EnterTeleportMode { .. } => {
            let here = world.roster[index].cell;
            if let Some(state) = world.roster[index].player_state_mut() {
                state.teleport_cursor = Some(here);
                out_events.push(Event::TeleportCursorMoved { cursor: here });
            }
        }
        Command::MoveTeleportCursor { direction, .. } => {
            let terrain = world.level.terrain();
            if let Some(state) = world.roster[index].player_state_mut() {
                if let Some(cursor) = state.teleport_cursor {
                    let next = cursor
                        .step(direction)
                        .filter(|cell| terrain.contains(*cell))
                        .unwrap_or(cursor);
                    state.teleport_cursor = Some(next);
                    out_events.push(Event::TeleportCursorMoved { cursor: next });
                }
            }
        }
        Command::CancelTeleport { .. } => {
            if let Some(state) = world.roster[index].player_state_mut() {
                if state.teleport_cursor.take().is_some() {
                    out_events.push(Event::TeleportCancelled);
                }
            }
        }
        Command::Rest { .. } => {}
        Command::Quit { .. } => {
            if world.roster[index].is_player() {
                world.kill(index, DeathCause::Quit, out_events);
            }
        }
    }

    let player = &world.roster[world.player_index()];
    if player.alive && player.cell != player_cell {
        world.rebuild_navigation();
        out_events.push(Event::NavigationRebuilt {
            source: world.roster[world.player_index()].cell,
        });
    }
}

fn command_actor(command: &Command) -> ActorId {
    match *command {
        Command::BeginPlayerTurn { actor }
        | Command::MoveActor { actor, .. }
        | Command::Tunnel { actor, .. }
        | Command::Teleport { actor, .. }
        | Command::UseStairs { actor, .. }
        | Command::ToggleFog { actor }
        | Command::EnterTeleportMode { actor }
        | Command::MoveTeleportCursor { actor, .. }
        | Command::CancelTeleport { actor }
        | Command::Rest { actor }
        | Command::Quit { actor } => actor,
    }
}

fn refresh_memory(state: &mut PlayerState, terrain: &Terrain, center: CellCoord, radius: u32) {
    let reach = i32::try_from(radius).unwrap_or(i32::MAX);
    for dy in -reach..=reach {
        for dx in -reach..=reach {
            let Some(cell) = center.offset_by(dx, dy) else {
                continue;
            };
            if !terrain.contains(cell) || !is_lit(center, cell, radius) {
                continue;
            }
            let index = terrain.index(cell);
            state.memory[index] = Some(terrain.floor(cell));
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use delve_core::{ActorId, CellCoord, FloorKind, SimulationConfig, StairDirection};
    use rand::Rng;

    use super::{Character, Level, MonsterBearing, NavigationFields, Terrain, World};

    /// Configuration the world was built with.
    #[must_use]
    pub fn config(world: &World) -> &SimulationConfig {
        &world.config
    }

    /// Level currently in play.
    #[must_use]
    pub fn level(world: &World) -> &Level {
        &world.level
    }

    /// Terrain of the level currently in play.
    #[must_use]
    pub fn terrain(world: &World) -> &Terrain {
        world.level.terrain()
    }

    /// Distance fields seeded from the player.
    #[must_use]
    pub fn fields(world: &World) -> &NavigationFields {
        &world.fields
    }

    /// Entire roster in creation order, dead entries included.
    #[must_use]
    pub fn roster(world: &World) -> &[Character] {
        &world.roster
    }

    /// Looks up a character by identifier.
    #[must_use]
    pub fn character(world: &World, actor: ActorId) -> Option<&Character> {
        world.index_of(actor).map(|index| &world.roster[index])
    }

    /// Identifier of the player character.
    #[must_use]
    pub fn player_id(world: &World) -> ActorId {
        world.player
    }

    /// The player character.
    #[must_use]
    pub fn player(world: &World) -> &Character {
        &world.roster[world.player_index()]
    }

    /// Whether the player is still in play.
    #[must_use]
    pub fn is_player_alive(world: &World) -> bool {
        player(world).is_alive()
    }

    /// Living monsters in roster order.
    pub fn living_monsters(world: &World) -> impl Iterator<Item = &Character> {
        world
            .roster
            .iter()
            .filter(|character| character.is_alive() && !character.is_player())
    }

    /// Number of living monsters.
    #[must_use]
    pub fn living_monster_count(world: &World) -> usize {
        living_monsters(world).count()
    }

    /// Whether the player stands on the stair leading in `direction`.
    #[must_use]
    pub fn on_stairs(world: &World, direction: StairDirection) -> bool {
        let cell = player(world).cell();
        terrain(world).floor(cell) == FloorKind::stair(direction)
    }

    /// Offsets from the player to every living monster, in roster order.
    #[must_use]
    pub fn monster_bearings(world: &World) -> Vec<MonsterBearing> {
        let origin = player(world).cell();
        living_monsters(world)
            .map(|monster| {
                let (columns, rows) = origin.delta_to(monster.cell());
                MonsterBearing {
                    glyph: monster.glyph(),
                    columns,
                    rows,
                }
            })
            .collect()
    }

    /// Uniformly random cell that is not immutable rock.
    pub fn random_open_cell<R: Rng + ?Sized>(world: &World, rng: &mut R) -> Option<CellCoord> {
        let terrain = terrain(world);
        terrain.random_cell(rng, terrain.draw_budget(), |cell| !terrain.is_immutable(cell))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delve_core::{CellRect, CellRectSize, StairDirection, IMMUTABLE_HARDNESS};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// 10x7 grid with one open room spanning columns 1..=8, rows 1..=5.
    fn open_level() -> Level {
        let mut hardness = vec![IMMUTABLE_HARDNESS; 70];
        let room = CellRect::from_origin_and_size(CellCoord::new(1, 1), CellRectSize::new(8, 5));
        for cell in room.cells() {
            hardness[(cell.row() * 10 + cell.column()) as usize] = 0;
        }
        let stairs = Stairs {
            up: Some(CellCoord::new(2, 2)),
            down: Some(CellCoord::new(7, 4)),
        };
        let terrain = Terrain::derive(10, 7, hardness, &[room], &stairs);
        Level::from_parts(terrain, vec![room], stairs)
    }

    fn small_config() -> SimulationConfig {
        SimulationConfig {
            columns: 10,
            rows: 7,
            ..SimulationConfig::default()
        }
    }

    fn monster(column: u32, row: u32) -> MonsterSeed {
        MonsterSeed {
            cell: CellCoord::new(column, row),
            speed: 10,
            hp: 10,
            flags: BehaviorFlags::from_bits(0),
        }
    }

    #[test]
    fn player_kills_monster_by_stepping_onto_it() {
        let mut world =
            World::restore(small_config(), open_level(), CellCoord::new(3, 3), &[monster(4, 3)])
                .expect("world");
        let player = query::player_id(&world);
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::MoveActor {
                actor: player,
                to: CellCoord::new(4, 3),
            },
            &mut events,
        );

        assert_eq!(query::living_monster_count(&world), 0);
        assert!(events.contains(&Event::ActorKilled {
            actor: ActorId::new(1),
            cause: DeathCause::Slain { by: player },
        }));
        assert!(events.contains(&Event::NavigationRebuilt {
            source: CellCoord::new(4, 3)
        }));
        assert_eq!(query::roster(&world).len(), 2, "dead monsters stay in the roster");
    }

    #[test]
    fn monster_kills_player_by_stepping_onto_it() {
        let mut world =
            World::restore(small_config(), open_level(), CellCoord::new(3, 3), &[monster(4, 4)])
                .expect("world");
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::MoveActor {
                actor: ActorId::new(1),
                to: CellCoord::new(3, 3),
            },
            &mut events,
        );

        assert!(!query::is_player_alive(&world));
    }

    #[test]
    fn monsters_share_cells_without_fighting() {
        let mut world = World::restore(
            small_config(),
            open_level(),
            CellCoord::new(1, 1),
            &[monster(4, 4), monster(5, 4)],
        )
        .expect("world");
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::MoveActor {
                actor: ActorId::new(1),
                to: CellCoord::new(5, 4),
            },
            &mut events,
        );

        assert_eq!(query::living_monster_count(&world), 2);
    }

    #[test]
    fn player_cannot_walk_into_rock() {
        let mut world =
            World::restore(small_config(), open_level(), CellCoord::new(1, 1), &[]).expect("world");
        let player = query::player_id(&world);
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::MoveActor {
                actor: player,
                to: CellCoord::new(0, 0),
            },
            &mut events,
        );

        assert_eq!(query::player(&world).cell(), CellCoord::new(1, 1));
        assert_eq!(
            events,
            vec![Event::MoveBlocked {
                actor: player,
                to: CellCoord::new(0, 0)
            }]
        );
    }

    #[test]
    fn stairs_only_work_on_matching_cell() {
        let mut world =
            World::restore(small_config(), open_level(), CellCoord::new(2, 2), &[]).expect("world");
        let player = query::player_id(&world);
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::UseStairs {
                actor: player,
                direction: StairDirection::Down,
            },
            &mut events,
        );
        assert!(events.is_empty());

        apply(
            &mut world,
            Command::UseStairs {
                actor: player,
                direction: StairDirection::Up,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::FloorChangeRequested {
                direction: StairDirection::Up
            }]
        );
    }

    #[test]
    fn memory_covers_only_the_lit_disc() {
        let config = SimulationConfig {
            light_radius: 1,
            ..small_config()
        };
        let mut world =
            World::restore(config, open_level(), CellCoord::new(4, 3), &[]).expect("world");
        let player = query::player_id(&world);
        let state = query::player(&world).player_state().expect("player").clone();
        assert_eq!(state.remembered(CellCoord::new(4, 3)), None);

        let mut events = Vec::new();
        apply(&mut world, Command::BeginPlayerTurn { actor: player }, &mut events);

        let state = query::player(&world).player_state().expect("player");
        assert_eq!(state.remembered(CellCoord::new(4, 3)), Some(FloorKind::Room));
        assert_eq!(state.remembered(CellCoord::new(5, 3)), Some(FloorKind::Room));
        assert_eq!(state.remembered(CellCoord::new(5, 4)), None);
        assert_eq!(state.remembered(CellCoord::new(6, 3)), None);
    }

    #[test]
    fn teleport_refuses_immutable_rock_and_leaves_mode() {
        let mut world =
            World::restore(small_config(), open_level(), CellCoord::new(1, 1), &[]).expect("world");
        let player = query::player_id(&world);
        let mut events = Vec::new();

        apply(&mut world, Command::EnterTeleportMode { actor: player }, &mut events);
        apply(
            &mut world,
            Command::MoveTeleportCursor {
                actor: player,
                direction: delve_core::Direction::NorthWest,
            },
            &mut events,
        );
        let state = query::player(&world).player_state().expect("player");
        assert_eq!(state.teleport_cursor(), Some(CellCoord::new(0, 0)));

        apply(
            &mut world,
            Command::Teleport {
                actor: player,
                to: CellCoord::new(0, 0),
            },
            &mut events,
        );

        assert_eq!(query::player(&world).cell(), CellCoord::new(1, 1));
        assert!(!query::player(&world)
            .player_state()
            .expect("player")
            .is_teleporting());
    }

    #[test]
    fn teleport_cursor_stops_at_the_level_edge() {
        let config = SimulationConfig {
            columns: 20,
            rows: 15,
            ..small_config()
        };
        let mut world =
            World::restore(config, open_level(), CellCoord::new(8, 5), &[]).expect("world");
        let player = query::player_id(&world);
        let mut events = Vec::new();

        apply(&mut world, Command::EnterTeleportMode { actor: player }, &mut events);
        for _ in 0..3 {
            apply(
                &mut world,
                Command::MoveTeleportCursor {
                    actor: player,
                    direction: delve_core::Direction::SouthEast,
                },
                &mut events,
            );
        }

        let state = query::player(&world).player_state().expect("player");
        assert_eq!(state.teleport_cursor(), Some(CellCoord::new(9, 6)));
    }

    #[test]
    fn quit_kills_player() {
        let mut world =
            World::restore(small_config(), open_level(), CellCoord::new(1, 1), &[]).expect("world");
        let player = query::player_id(&world);
        let mut events = Vec::new();

        apply(&mut world, Command::Quit { actor: player }, &mut events);

        assert!(!query::is_player_alive(&world));
        assert_eq!(
            events,
            vec![Event::ActorKilled {
                actor: player,
                cause: DeathCause::Quit
            }]
        );
    }

    #[test]
    fn bearings_are_relative_to_player() {
        let world = World::restore(
            small_config(),
            open_level(),
            CellCoord::new(4, 3),
            &[monster(1, 1), monster(7, 5)],
        )
        .expect("world");

        let bearings = query::monster_bearings(&world);

        assert_eq!(bearings.len(), 2);
        assert_eq!((bearings[0].columns, bearings[0].rows), (-3, -2));
        assert_eq!((bearings[1].columns, bearings[1].rows), (3, 2));
        assert_eq!(bearings[0].glyph, '0');
    }

    #[test]
    fn zero_speed_monster_is_rejected() {
        let mut seed = monster(3, 3);
        seed.speed = 0;
        let result = World::restore(small_config(), open_level(), CellCoord::new(1, 1), &[seed]);
        assert_eq!(result.err(), Some(ActorError::NonPositiveSpeed));
    }

    #[test]
    fn generated_world_places_player_on_first_room() {
        let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);
        let world = World::generate(SimulationConfig::default(), &mut rng).expect("world");
        let level = query::level(&world);
        let expected = level
            .rooms()
            .first()
            .map_or(CellCoord::new(1, 1), |room| room.origin());

        assert_eq!(query::player(&world).cell(), expected);
        assert_eq!(query::fields(&world).source(), Some(expected));
        for monster in query::living_monsters(&world) {
            assert_eq!(query::terrain(&world).floor(monster.cell()), FloorKind::Room);
            let speed = monster.speed().get();
            assert!((5..=20).contains(&speed));
        }
    }
}
