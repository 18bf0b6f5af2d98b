#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Discrete-event turn scheduler.
//!
//! Every living actor holds one pending turn keyed by the tick it becomes
//! due. The loop pops the earliest turn, lets the actor act and reschedules
//! it `1000 / speed` ticks later until the level is decided.

use std::{cmp::Ordering, collections::BinaryHeap};

use delve_core::{ActorId, DeathCause, Event, StairDirection};
use delve_system_actors::{take_turn, PlayerInput};
use delve_world::{query, World};
use rand::Rng;
use tracing::{debug, error, info};

/// Pending turn popped from a [`TurnQueue`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurnEvent {
    /// Tick at which the turn is due.
    pub time: u64,
    /// Actor taking the turn.
    pub actor: ActorId,
}

/// Min-priority queue of pending turns.
///
/// Turns due at the same tick come out in the order they were pushed.
#[derive(Debug, Default)]
pub struct TurnQueue {
    heap: BinaryHeap<Scheduled>,
    next_sequence: u64,
}

impl TurnQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `actor` to act at `time`.
    pub fn push(&mut self, time: u64, actor: ActorId) {
        self.heap.push(Scheduled {
            time,
            sequence: self.next_sequence,
            actor,
        });
        self.next_sequence += 1;
    }

    /// Removes and returns the earliest pending turn.
    pub fn pop_minimum(&mut self) -> Option<TurnEvent> {
        self.heap.pop().map(|entry| TurnEvent {
            time: entry.time,
            actor: entry.actor,
        })
    }

    /// Reports whether no turn is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Number of pending turns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Scheduled {
    time: u64,
    sequence: u64,
    actor: ActorId,
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Why the turn loop of one level stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelOutcome {
    /// A monster killed the player.
    PlayerDied,
    /// The player gave up.
    PlayerQuit,
    /// No living monster is left on the level.
    MonstersCleared,
    /// The player took the stairs.
    FloorChanged(StairDirection),
    /// The queue ran dry without a decision.
    Stalled,
}

/// Final result of a run spanning any number of levels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Every monster on the current level is dead.
    Victory,
    /// The player was killed.
    Defeat,
    /// The player quit.
    Quit,
    /// The scheduler had nothing left to run.
    Stalled,
}

/// Runs the turn loop on the current level until it is decided.
pub fn run_level<I, R>(world: &mut World, input: &mut I, rng: &mut R) -> LevelOutcome
where
    I: PlayerInput + ?Sized,
    R: Rng + ?Sized,
{
    if let Some(outcome) = settled(world, &[]) {
        return outcome;
    }

    let mut queue = TurnQueue::new();
    for character in query::roster(world) {
        if character.is_alive() {
            queue.push(0, character.id());
        }
    }

    let mut events = Vec::new();
    while let Some(TurnEvent { time, actor }) = queue.pop_minimum() {
        let Some(character) = query::character(world, actor) else {
            continue;
        };
        if !character.is_alive() {
            continue;
        }
        let delay = character.speed().turn_delay();

        events.clear();
        take_turn(world, actor, input, rng, &mut events);
        debug!(time, actor = actor.get(), events = events.len(), "turn resolved");

        if let Some(outcome) = settled(world, &events) {
            return outcome;
        }
        if query::character(world, actor).is_some_and(|character| character.is_alive()) {
            queue.push(time + delay, actor);
        }
    }

    LevelOutcome::Stalled
}

/// Plays levels until the run ends, generating a fresh level whenever the
/// player takes the stairs.
///
/// The replacement level uses the configuration of the world being replaced.
pub fn run_session<I, R>(world: &mut World, input: &mut I, rng: &mut R) -> SessionOutcome
where
    I: PlayerInput + ?Sized,
    R: Rng + ?Sized,
{
    loop {
        let outcome = run_level(world, input, rng);
        info!(?outcome, "level finished");
        match outcome {
            LevelOutcome::FloorChanged(_) => {
                let config = query::config(world).clone();
                match World::generate(config, rng) {
                    Ok(next) => *world = next,
                    Err(error) => {
                        error!(%error, "failed to populate the next level");
                        return SessionOutcome::Stalled;
                    }
                }
            }
            LevelOutcome::PlayerDied => return SessionOutcome::Defeat,
            LevelOutcome::PlayerQuit => return SessionOutcome::Quit,
            LevelOutcome::MonstersCleared => return SessionOutcome::Victory,
            LevelOutcome::Stalled => return SessionOutcome::Stalled,
        }
    }
}

fn settled(world: &World, events: &[Event]) -> Option<LevelOutcome> {
    if !query::is_player_alive(world) {
        let player = query::player_id(world);
        let quit = events.iter().any(|event| {
            matches!(
                event,
                Event::ActorKilled {
                    actor,
                    cause: DeathCause::Quit,
                } if *actor == player
            )
        });
        return Some(if quit {
            LevelOutcome::PlayerQuit
        } else {
            LevelOutcome::PlayerDied
        });
    }

    let floor_change = events.iter().find_map(|event| match event {
        Event::FloorChangeRequested { direction } => Some(*direction),
        _ => None,
    });
    if let Some(direction) = floor_change {
        return Some(LevelOutcome::FloorChanged(direction));
    }

    if query::living_monster_count(world) == 0 {
        return Some(LevelOutcome::MonstersCleared);
    }
    None
}
