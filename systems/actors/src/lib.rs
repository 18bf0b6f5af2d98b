#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Turn policy for every actor kind.
//!
//! The player resolves commands pulled from a [`PlayerInput`] until one of
//! them consumes the turn. Monsters follow a fixed policy driven by their
//! behaviour bits and the world's distance fields. Both paths only emit
//! [`Command`] values and let the world apply them.

use delve_core::{ActorId, BehaviorFlags, CellCoord, Command, Direction, Event, PlayerCommand};
use delve_world::{self as world, query, CharacterKind, NavigationMode, World, UNREACHED};
use rand::Rng;
use tracing::debug;

/// Source of player decisions, typically backed by a keyboard.
pub trait PlayerInput {
    /// Produces the next command for the player.
    ///
    /// The world is passed as it stands after every previously applied free
    /// command so that the implementation can present it first.
    fn next_command(&mut self, world: &World) -> PlayerCommand;
}

/// How a single player command affects the turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlayerAction {
    /// The command is applied and the player decides again.
    Free(Option<Command>),
    /// The command is applied and the turn is over.
    EndTurn(Command),
}

/// Runs one turn for the provided actor, whatever its kind.
pub fn take_turn<I, R>(
    world: &mut World,
    actor: ActorId,
    input: &mut I,
    rng: &mut R,
    out_events: &mut Vec<Event>,
) where
    I: PlayerInput + ?Sized,
    R: Rng + ?Sized,
{
    let Some(character) = query::character(world, actor) else {
        return;
    };
    if !character.is_alive() {
        return;
    }

    let is_player = matches!(character.kind(), CharacterKind::Player(_));

    if is_player {
        player_turn(world, actor, input, rng, out_events);
    } else if let Some(command) = monster_command(world, actor, rng) {
        world::apply(world, command, out_events);
    }
}

/// Pulls player commands until one of them ends the turn.
pub fn player_turn<I, R>(
    world: &mut World,
    actor: ActorId,
    input: &mut I,
    rng: &mut R,
    out_events: &mut Vec<Event>,
) where
    I: PlayerInput + ?Sized,
    R: Rng + ?Sized,
{
    world::apply(world, Command::BeginPlayerTurn { actor }, out_events);

    loop {
        let command = input.next_command(world);
        match resolve_player_command(world, actor, command, rng) {
            PlayerAction::Free(Some(command)) => world::apply(world, command, out_events),
            PlayerAction::Free(None) => {}
            PlayerAction::EndTurn(command) => {
                debug!(?command, "player acts");
                world::apply(world, command, out_events);
                return;
            }
        }
    }
}

/// Maps a player command onto a world command given the player's mode.
///
/// Moves that hit a wall still end the turn; the world reports them as
/// blocked. Fog toggles, teleport-cursor steering and the monster list never
/// end the turn.
pub fn resolve_player_command<R: Rng + ?Sized>(
    world: &World,
    actor: ActorId,
    command: PlayerCommand,
    rng: &mut R,
) -> PlayerAction {
    let Some(player) = query::character(world, actor) else {
        return PlayerAction::Free(None);
    };
    let teleporting = player
        .player_state()
        .is_some_and(|state| state.is_teleporting());
    let here = player.cell();

    if teleporting {
        return match command {
            PlayerCommand::Move(direction) => {
                PlayerAction::Free(Some(Command::MoveTeleportCursor { actor, direction }))
            }
            PlayerCommand::EnterTeleport | PlayerCommand::ConfirmTeleport => {
                let to = player
                    .player_state()
                    .and_then(|state| state.teleport_cursor())
                    .unwrap_or(here);
                PlayerAction::EndTurn(Command::Teleport { actor, to })
            }
            PlayerCommand::RandomTeleport => match query::random_open_cell(world, rng) {
                Some(to) => PlayerAction::EndTurn(Command::Teleport { actor, to }),
                None => PlayerAction::EndTurn(Command::CancelTeleport { actor }),
            },
            PlayerCommand::CancelTeleport => {
                PlayerAction::Free(Some(Command::CancelTeleport { actor }))
            }
            PlayerCommand::ToggleFog => PlayerAction::Free(Some(Command::ToggleFog { actor })),
            PlayerCommand::Quit => PlayerAction::EndTurn(Command::Quit { actor }),
            PlayerCommand::Rest | PlayerCommand::UseStairs(_) | PlayerCommand::ListMonsters => {
                PlayerAction::Free(None)
            }
        };
    }

    match command {
        PlayerCommand::Move(direction) => match here.step(direction) {
            Some(to) => PlayerAction::EndTurn(Command::MoveActor { actor, to }),
            None => PlayerAction::EndTurn(Command::Rest { actor }),
        },
        PlayerCommand::Rest => PlayerAction::EndTurn(Command::Rest { actor }),
        PlayerCommand::UseStairs(direction) => {
            PlayerAction::EndTurn(Command::UseStairs { actor, direction })
        }
        PlayerCommand::ToggleFog => PlayerAction::Free(Some(Command::ToggleFog { actor })),
        PlayerCommand::EnterTeleport => {
            PlayerAction::Free(Some(Command::EnterTeleportMode { actor }))
        }
        PlayerCommand::Quit => PlayerAction::EndTurn(Command::Quit { actor }),
        PlayerCommand::ConfirmTeleport
        | PlayerCommand::RandomTeleport
        | PlayerCommand::CancelTeleport
        | PlayerCommand::ListMonsters => PlayerAction::Free(None),
    }
}

/// Decides what a monster does this turn.
///
/// Returns `None` for dead, unknown or non-monster actors. A tunneling
/// monster facing erodible rock spends the turn eroding it instead of
/// moving. Other monsters stay put when the chosen cell is rock.
pub fn monster_command<R: Rng + ?Sized>(
    world: &World,
    actor: ActorId,
    rng: &mut R,
) -> Option<Command> {
    let monster = query::character(world, actor)?;
    if !monster.is_alive() {
        return None;
    }
    let flags = monster.behavior()?;
    let here = monster.cell();
    let destination = choose_destination(world, here, flags, rng);

    let terrain = query::terrain(world);
    if destination == here || !terrain.contains(destination) || terrain.is_immutable(destination)
    {
        return Some(Command::Rest { actor });
    }

    if terrain.is_open(destination) {
        Some(Command::MoveActor {
            actor,
            to: destination,
        })
    } else if flags.is_tunneling() {
        Some(Command::Tunnel {
            actor,
            cell: destination,
        })
    } else {
        Some(Command::Rest { actor })
    }
}

fn choose_destination<R: Rng + ?Sized>(
    world: &World,
    here: CellCoord,
    flags: BehaviorFlags,
    rng: &mut R,
) -> CellCoord {
    if flags.is_erratic() && rng.gen_bool(0.5) {
        let choice = rng.gen_range(0..=Direction::ALL.len());
        return Direction::ALL
            .get(choice)
            .and_then(|direction| here.step(*direction))
            .unwrap_or(here);
    }

    if !flags.is_intelligent() {
        let target = query::player(world).cell();
        let (dx, dy) = here.delta_to(target);
        return here
            .offset_by(dx.signum() as i32, dy.signum() as i32)
            .unwrap_or(here);
    }

    let mode = if flags.is_tunneling() {
        NavigationMode::Tunneling
    } else {
        NavigationMode::NonTunneling
    };
    let field = query::fields(world).field(mode);
    let mut best = here;
    let mut best_distance = UNREACHED;
    for neighbor in query::terrain(world).neighbors(here) {
        let distance = field.distance(neighbor).unwrap_or(UNREACHED);
        if distance < best_distance {
            best_distance = distance;
            best = neighbor;
        }
    }
    best
}
