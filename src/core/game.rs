/// Core game interface for the arcade session engine
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::error::EngineResult;
use crate::games::{GameKind, GameState};

/// Identity of the chat user owning a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Grid coordinate as (row, col). Signed so a step off the board is representable.
pub type Cell = (i32, i32);

/// Unit step on the grid. Row grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Direction {
    pub row: i32,
    pub col: i32,
}

impl Direction {
    pub const UP: Direction = Direction { row: -1, col: 0 };
    pub const DOWN: Direction = Direction { row: 1, col: 0 };
    pub const LEFT: Direction = Direction { row: 0, col: -1 };
    pub const RIGHT: Direction = Direction { row: 0, col: 1 };

    pub const ALL: [Direction; 4] = [Self::UP, Self::DOWN, Self::LEFT, Self::RIGHT];

    pub fn opposite(self) -> Direction {
        Direction { row: -self.row, col: -self.col }
    }

    pub fn is_opposite(self, other: Direction) -> bool {
        self.opposite() == other
    }

    /// Move `cell` one step in this direction.
    pub fn step(self, cell: Cell) -> Cell {
        (cell.0 + self.row, cell.1 + self.col)
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Self::UP),
            "down" => Ok(Self::DOWN),
            "left" => Ok(Self::LEFT),
            "right" => Ok(Self::RIGHT),
            other => Err(format!("unknown direction '{other}'")),
        }
    }
}

/// One user interaction forwarded from the messaging side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputAction {
    Direction(Direction),
    Jump,
    Stop,
}

/// Result of advancing a game by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickOutcome {
    Continue,
    AteFood,
    /// Terminal: the session ends after this tick.
    Collided,
}

impl TickOutcome {
    pub fn is_terminal(self) -> bool {
        matches!(self, TickOutcome::Collided)
    }
}

/// Pure state-transition rules for one game kind.
///
/// Implementations do no I/O and share nothing between sessions; the tick
/// scheduler owns the state and calls in here once per tick.
pub trait GameRules: Send + Sync + 'static {
    type State: Clone + Send + Sync + Into<GameState> + 'static;

    const KIND: GameKind;

    /// Fresh state for a new session.
    fn new_game<R: Rng + ?Sized>(&self, rng: &mut R) -> EngineResult<Self::State>;

    /// Consume one buffered action between ticks. Returns false when the
    /// action does not apply to this game or state (it is then dropped).
    fn apply_input(&self, state: &mut Self::State, action: InputAction) -> bool;

    fn tick<R: Rng + ?Sized>(&self, state: &mut Self::State, rng: &mut R) -> EngineResult<TickOutcome>;

    /// Delay before the next tick. Re-read after every tick.
    fn tick_interval(&self, state: &Self::State) -> Duration;

    fn score(&self, state: &Self::State) -> u32;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_direction_has_a_distinct_opposite() {
        for dir in Direction::ALL {
            assert!(dir.is_opposite(dir.opposite()));
            assert!(!dir.is_opposite(dir));
            assert_eq!(dir.opposite().opposite(), dir);
        }
    }

    #[test]
    fn parses_direction_names() {
        assert_eq!("Up".parse::<Direction>(), Ok(Direction::UP));
        assert_eq!(" left ".parse::<Direction>(), Ok(Direction::LEFT));
        assert!("north".parse::<Direction>().is_err());
    }

    #[test]
    fn step_moves_one_cell() {
        assert_eq!(Direction::RIGHT.step((5, 5)), (5, 6));
        assert_eq!(Direction::UP.step((0, 3)), (-1, 3));
    }
}
