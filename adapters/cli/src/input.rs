//! Line-oriented keyboard input for the player.

use std::io::BufRead;

use delve_core::{Direction, PlayerCommand, StairDirection};
use delve_rendering::{compose_frame, monster_list, Presenter};
use delve_system_actors::PlayerInput;
use delve_world::{query, World};
use tracing::{error, warn};

const ESCAPE: char = '\u{1b}';

/// Maps a single key to a player command.
pub(crate) fn parse_key(key: char) -> Option<PlayerCommand> {
    let command = match key {
        'y' | '7' => PlayerCommand::Move(Direction::NorthWest),
        'k' | '8' => PlayerCommand::Move(Direction::North),
        'u' | '9' => PlayerCommand::Move(Direction::NorthEast),
        'h' | '4' => PlayerCommand::Move(Direction::West),
        'l' | '6' => PlayerCommand::Move(Direction::East),
        'b' | '1' => PlayerCommand::Move(Direction::SouthWest),
        'j' | '2' => PlayerCommand::Move(Direction::South),
        'n' | '3' => PlayerCommand::Move(Direction::SouthEast),
        '5' | '.' | ' ' => PlayerCommand::Rest,
        '<' => PlayerCommand::UseStairs(StairDirection::Up),
        '>' => PlayerCommand::UseStairs(StairDirection::Down),
        'f' => PlayerCommand::ToggleFog,
        'g' => PlayerCommand::EnterTeleport,
        'r' => PlayerCommand::RandomTeleport,
        'c' | ESCAPE => PlayerCommand::CancelTeleport,
        'm' => PlayerCommand::ListMonsters,
        'Q' => PlayerCommand::Quit,
        _ => return None,
    };
    Some(command)
}

/// Reads one key per line and shows the map before every prompt.
///
/// `g` enters teleport mode and, once the cursor is out, confirms the jump.
/// End of input quits.
pub(crate) struct KeyboardInput<R, P> {
    reader: R,
    presenter: P,
}

impl<R: BufRead, P: Presenter> KeyboardInput<R, P> {
    pub(crate) fn new(reader: R, presenter: P) -> Self {
        Self { reader, presenter }
    }

    pub(crate) fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    fn read_key(&mut self) -> Option<char> {
        let mut line = String::new();
        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) => {
                    let trimmed = line.trim_end_matches(['\r', '\n']);
                    if let Some(key) = trimmed.chars().next() {
                        return Some(key);
                    }
                }
                Err(error) => {
                    error!(%error, "failed to read input");
                    return None;
                }
            }
        }
    }
}

impl<R: BufRead, P: Presenter> PlayerInput for KeyboardInput<R, P> {
    fn next_command(&mut self, world: &World) -> PlayerCommand {
        let frame = compose_frame(world, query::player_id(world));
        if let Err(error) = self.presenter.present(&frame) {
            error!(error = %error, "failed to present frame");
            return PlayerCommand::Quit;
        }

        loop {
            let Some(key) = self.read_key() else {
                return PlayerCommand::Quit;
            };
            let Some(command) = parse_key(key) else {
                warn!(?key, "unbound key");
                continue;
            };

            if command == PlayerCommand::ListMonsters {
                let lines = monster_list(world);
                if let Err(error) = self.presenter.present_lines("Monsters", &lines) {
                    error!(error = %error, "failed to present monster list");
                    return PlayerCommand::Quit;
                }
            }

            return command;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use delve_core::SimulationConfig;
    use delve_rendering::TextPresenter;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn world() -> World {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        World::generate(SimulationConfig::default().with_monster_count(2), &mut rng)
            .expect("world")
    }

    #[test]
    fn vi_keys_and_keypad_agree() {
        for (letter, digit) in [
            ('y', '7'),
            ('k', '8'),
            ('u', '9'),
            ('h', '4'),
            ('l', '6'),
            ('b', '1'),
            ('j', '2'),
            ('n', '3'),
        ] {
            assert!(parse_key(letter).is_some());
            assert_eq!(parse_key(letter), parse_key(digit));
        }
        assert_eq!(parse_key(ESCAPE), Some(PlayerCommand::CancelTeleport));
        assert_eq!(parse_key('q'), None);
    }

    #[test]
    fn unbound_keys_and_blank_lines_are_skipped() {
        let world = world();
        let mut input = KeyboardInput::new(Cursor::new("\nz\n>\n"), TextPresenter::new(Vec::new()));

        assert_eq!(
            input.next_command(&world),
            PlayerCommand::UseStairs(StairDirection::Down)
        );
    }

    #[test]
    fn end_of_input_quits() {
        let world = world();
        let mut input = KeyboardInput::new(Cursor::new(""), TextPresenter::new(Vec::new()));

        assert_eq!(input.next_command(&world), PlayerCommand::Quit);
    }

    #[test]
    fn monster_list_is_shown_in_place() {
        let world = world();
        let mut input = KeyboardInput::new(Cursor::new("m\n"), TextPresenter::new(Vec::new()));

        assert_eq!(input.next_command(&world), PlayerCommand::ListMonsters);

        let KeyboardInput { presenter, .. } = input;
        let text = String::from_utf8(presenter.into_inner()).expect("utf8");
        assert!(text.contains("--- Monsters ---"));
    }
}
