use std::collections::{HashSet, VecDeque};

use delve_core::{
    ActorId, BehaviorFlags, CellCoord, Command, Direction, Event, PlayerCommand,
    SimulationConfig, IMMUTABLE_HARDNESS,
};
use delve_system_actors::{monster_command, player_turn, take_turn, PlayerInput};
use delve_world::{self as world, query, Level, MonsterSeed, Stairs, Terrain, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const COLUMNS: u32 = 10;
const ROWS: u32 = 7;

struct Script(VecDeque<PlayerCommand>);

impl Script {
    fn new(commands: impl IntoIterator<Item = PlayerCommand>) -> Self {
        Self(commands.into_iter().collect())
    }
}

impl PlayerInput for Script {
    fn next_command(&mut self, _world: &World) -> PlayerCommand {
        self.0.pop_front().unwrap_or(PlayerCommand::Quit)
    }
}

fn config() -> SimulationConfig {
    SimulationConfig {
        columns: COLUMNS,
        rows: ROWS,
        ..SimulationConfig::default()
    }
}

/// Open interior with the provided `(column, row, hardness)` overrides.
fn level_with(rock: &[(u32, u32, u8)]) -> Level {
    let mut hardness = vec![0; (COLUMNS * ROWS) as usize];
    for row in 0..ROWS {
        for column in 0..COLUMNS {
            if column == 0 || row == 0 || column + 1 == COLUMNS || row + 1 == ROWS {
                hardness[(row * COLUMNS + column) as usize] = IMMUTABLE_HARDNESS;
            }
        }
    }
    for &(column, row, value) in rock {
        hardness[(row * COLUMNS + column) as usize] = value;
    }
    let terrain = Terrain::derive(COLUMNS, ROWS, hardness, &[], &Stairs::default());
    Level::from_parts(terrain, Vec::new(), Stairs::default())
}

fn wall(column: u32, rows: impl IntoIterator<Item = u32>, hardness: u8) -> Vec<(u32, u32, u8)> {
    rows.into_iter().map(|row| (column, row, hardness)).collect()
}

fn seed(column: u32, row: u32, bits: u8) -> MonsterSeed {
    MonsterSeed {
        cell: CellCoord::new(column, row),
        speed: 10,
        hp: 10,
        flags: BehaviorFlags::from_bits(bits),
    }
}

fn build(level: Level, player: CellCoord, monsters: &[MonsterSeed]) -> World {
    World::restore(config(), level, player, monsters).expect("valid world")
}

const MONSTER: ActorId = ActorId::new(1);

#[test]
fn greedy_monster_steps_toward_player() {
    let world = build(level_with(&[]), CellCoord::new(2, 2), &[seed(7, 4, 0)]);
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    let command = monster_command(&world, MONSTER, &mut rng);

    assert_eq!(
        command,
        Some(Command::MoveActor {
            actor: MONSTER,
            to: CellCoord::new(6, 3)
        })
    );
}

#[test]
fn non_tunneler_waits_in_front_of_rock() {
    let world = build(
        level_with(&wall(4, 1..=5, 100)),
        CellCoord::new(1, 3),
        &[seed(5, 3, 0)],
    );
    let mut rng = ChaCha8Rng::seed_from_u64(2);

    let command = monster_command(&world, MONSTER, &mut rng);

    assert_eq!(command, Some(Command::Rest { actor: MONSTER }));
}

#[test]
fn tunneler_erodes_rock_before_entering() {
    let mut rock = wall(4, 1..=5, 100);
    rock.push((4, 3, 200));
    let mut world = build(
        level_with(&rock),
        CellCoord::new(1, 3),
        &[seed(5, 3, BehaviorFlags::TUNNELING)],
    );
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let target = CellCoord::new(4, 3);
    let mut visits = 0;

    while query::terrain(&world).hardness(target) > 0 {
        let command = monster_command(&world, MONSTER, &mut rng).expect("monster acts");
        assert_eq!(
            command,
            Command::Tunnel {
                actor: MONSTER,
                cell: target
            }
        );
        let mut events = Vec::new();
        world::apply(&mut world, command, &mut events);
        visits += 1;
        assert_eq!(
            query::character(&world, MONSTER).expect("monster").cell(),
            CellCoord::new(5, 3),
            "tunneling never relocates"
        );
    }

    assert_eq!(visits, 3);
    assert_eq!(
        monster_command(&world, MONSTER, &mut rng),
        Some(Command::MoveActor {
            actor: MONSTER,
            to: target
        })
    );
}

#[test]
fn intelligent_monster_walks_around_walls() {
    let world = build(
        level_with(&wall(4, 1..=4, 100)),
        CellCoord::new(1, 3),
        &[seed(6, 3, BehaviorFlags::INTELLIGENT)],
    );
    let mut rng = ChaCha8Rng::seed_from_u64(4);

    let command = monster_command(&world, MONSTER, &mut rng);

    assert_eq!(
        command,
        Some(Command::MoveActor {
            actor: MONSTER,
            to: CellCoord::new(5, 4)
        })
    );
}

#[test]
fn sealed_wall_separates_walkers_from_tunnelers() {
    let walker_world = build(
        level_with(&wall(4, 1..=5, 100)),
        CellCoord::new(1, 3),
        &[seed(6, 3, BehaviorFlags::INTELLIGENT)],
    );
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    assert_eq!(
        monster_command(&walker_world, MONSTER, &mut rng),
        Some(Command::Rest { actor: MONSTER }),
        "unreached neighbours never attract a walker"
    );

    let mut tunneler_world = build(
        level_with(&wall(4, 1..=5, 100)),
        CellCoord::new(1, 3),
        &[seed(6, 3, BehaviorFlags::INTELLIGENT | BehaviorFlags::TUNNELING)],
    );
    let first = monster_command(&tunneler_world, MONSTER, &mut rng).expect("monster acts");
    assert_eq!(
        first,
        Command::MoveActor {
            actor: MONSTER,
            to: CellCoord::new(5, 3)
        },
        "ties resolve in scan order, west first"
    );

    let mut events = Vec::new();
    world::apply(&mut tunneler_world, first, &mut events);
    assert_eq!(
        monster_command(&tunneler_world, MONSTER, &mut rng),
        Some(Command::Tunnel {
            actor: MONSTER,
            cell: CellCoord::new(4, 3)
        })
    );
}

#[test]
fn erratic_monster_stays_within_reach() {
    let mut world = build(
        level_with(&[]),
        CellCoord::new(1, 1),
        &[seed(5, 3, BehaviorFlags::ERRATIC | BehaviorFlags::INTELLIGENT)],
    );
    let mut rng = ChaCha8Rng::seed_from_u64(6);

    for _ in 0..200 {
        let here = query::character(&world, MONSTER).expect("monster").cell();
        let Some(command) = monster_command(&world, MONSTER, &mut rng) else {
            break;
        };
        if let Command::MoveActor { to, .. } = command {
            let (dx, dy) = here.delta_to(to);
            assert!(dx.abs() <= 1 && dy.abs() <= 1, "jumped from {here:?} to {to:?}");
        }
        let mut events = Vec::new();
        world::apply(&mut world, command, &mut events);
        if !query::is_player_alive(&world) {
            break;
        }
    }
}

#[test]
fn erratic_monster_leaves_the_field_about_half_the_time() {
    const TURNS: usize = 2_000;
    let descent = Command::MoveActor {
        actor: MONSTER,
        to: CellCoord::new(4, 3),
    };
    let mut rng = ChaCha8Rng::seed_from_u64(16);

    let steady = build(
        level_with(&[]),
        CellCoord::new(1, 1),
        &[seed(5, 3, BehaviorFlags::INTELLIGENT)],
    );
    for _ in 0..50 {
        assert_eq!(
            monster_command(&steady, MONSTER, &mut rng),
            Some(descent.clone())
        );
    }

    let erratic = build(
        level_with(&[]),
        CellCoord::new(1, 1),
        &[seed(5, 3, BehaviorFlags::ERRATIC | BehaviorFlags::INTELLIGENT)],
    );
    let mut departures = 0;
    let mut rests = 0;
    let mut reached = HashSet::new();
    for _ in 0..TURNS {
        let command = monster_command(&erratic, MONSTER, &mut rng).expect("monster acts");
        if command != descent {
            departures += 1;
        }
        match command {
            Command::MoveActor { to, .. } => {
                let _ = reached.insert(to);
            }
            Command::Rest { .. } => rests += 1,
            other => panic!("unexpected command {other:?}"),
        }
    }

    // Half the turns wander; eight of the nine wandering choices differ from
    // the field step.
    assert!(
        (TURNS * 35 / 100..=TURNS * 55 / 100).contains(&departures),
        "{departures} departures in {TURNS} turns"
    );
    assert!(rests > 0, "staying put is one of the nine choices");
    assert_eq!(reached.len(), 8, "every neighbour is drawn eventually");
}

#[test]
fn telepathy_does_not_change_behaviour() {
    let plain = build(level_with(&[]), CellCoord::new(2, 5), &[seed(7, 1, 0)]);
    let telepathic = build(
        level_with(&[]),
        CellCoord::new(2, 5),
        &[seed(7, 1, BehaviorFlags::TELEPATHIC)],
    );
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    assert_eq!(
        monster_command(&plain, MONSTER, &mut rng),
        monster_command(&telepathic, MONSTER, &mut rng)
    );
}

#[test]
fn free_commands_do_not_end_the_turn() {
    let mut world = build(level_with(&[]), CellCoord::new(3, 3), &[seed(8, 5, 0)]);
    let player = query::player_id(&world);
    let mut input = Script::new([
        PlayerCommand::ToggleFog,
        PlayerCommand::ListMonsters,
        PlayerCommand::Move(Direction::East),
        PlayerCommand::Rest,
    ]);
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let mut events = Vec::new();

    player_turn(&mut world, player, &mut input, &mut rng, &mut events);

    assert_eq!(query::player(&world).cell(), CellCoord::new(4, 3));
    assert_eq!(input.0.len(), 1, "rest stays queued for the next turn");
    assert!(events.contains(&Event::FogToggled { enabled: false }));
    assert!(matches!(events.first(), Some(Event::MemoryRefreshed { .. })));
}

#[test]
fn teleport_cursor_steers_then_lands() {
    let mut world = build(level_with(&[]), CellCoord::new(3, 3), &[]);
    let player = query::player_id(&world);
    let mut input = Script::new([
        PlayerCommand::EnterTeleport,
        PlayerCommand::Move(Direction::East),
        PlayerCommand::Move(Direction::East),
        PlayerCommand::Move(Direction::South),
        PlayerCommand::ConfirmTeleport,
    ]);
    let mut rng = ChaCha8Rng::seed_from_u64(9);
    let mut events = Vec::new();

    player_turn(&mut world, player, &mut input, &mut rng, &mut events);

    assert!(input.0.is_empty());
    assert_eq!(query::player(&world).cell(), CellCoord::new(5, 4));
    assert!(!query::player(&world)
        .player_state()
        .expect("player")
        .is_teleporting());
}

#[test]
fn random_teleport_outside_mode_is_ignored() {
    let mut world = build(level_with(&[]), CellCoord::new(3, 3), &[]);
    let player = query::player_id(&world);
    let mut input = Script::new([PlayerCommand::RandomTeleport, PlayerCommand::Rest]);
    let mut rng = ChaCha8Rng::seed_from_u64(10);
    let mut events = Vec::new();

    player_turn(&mut world, player, &mut input, &mut rng, &mut events);

    assert_eq!(query::player(&world).cell(), CellCoord::new(3, 3));
    assert!(input.0.is_empty());
}

#[test]
fn random_teleport_never_lands_on_immutable_rock() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    for _ in 0..20 {
        let mut world = build(level_with(&wall(5, 1..=5, 90)), CellCoord::new(3, 3), &[]);
        let player = query::player_id(&world);
        let mut input = Script::new([PlayerCommand::EnterTeleport, PlayerCommand::RandomTeleport]);
        let mut events = Vec::new();

        player_turn(&mut world, player, &mut input, &mut rng, &mut events);

        let cell = query::player(&world).cell();
        assert!(!query::terrain(&world).is_immutable(cell));
    }
}

#[test]
fn dead_actors_skip_their_turn() {
    let mut world = build(level_with(&[]), CellCoord::new(3, 3), &[seed(4, 3, 0)]);
    let player = query::player_id(&world);
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::MoveActor {
            actor: player,
            to: CellCoord::new(4, 3),
        },
        &mut events,
    );
    assert_eq!(query::living_monster_count(&world), 0);

    let mut input = Script::new([]);
    let mut rng = ChaCha8Rng::seed_from_u64(12);
    let mut turn_events = Vec::new();
    take_turn(&mut world, MONSTER, &mut input, &mut rng, &mut turn_events);

    assert!(turn_events.is_empty());
    assert!(query::is_player_alive(&world));
}
