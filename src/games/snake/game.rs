use std::collections::VecDeque;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::config::SnakeConfig;
use crate::core::error::{EngineError, EngineResult};
use crate::core::game::{Cell, Direction, GameRules, InputAction, TickOutcome};
use crate::games::GameKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnakeState {
    /// Board is `size` x `size`.
    pub size: usize,
    /// Head first. Cells are unique except right after a self-collision.
    pub snake: VecDeque<Cell>,
    pub direction: Direction,
    /// Always outside the snake.
    pub food: Cell,
    /// Latest requested turn, checked against `direction` at the next tick.
    pub pending_direction: Option<Direction>,
    pub score: u32,
}

impl SnakeState {
    pub fn head(&self) -> Cell {
        // the snake is never empty
        self.snake.front().copied().unwrap_or_default()
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        let size = self.size as i32;
        (0..size).contains(&cell.0) && (0..size).contains(&cell.1)
    }

    pub fn occupies(&self, cell: Cell) -> bool {
        self.snake.contains(&cell)
    }
}

#[derive(Debug, Clone)]
pub struct SnakeGame {
    config: SnakeConfig,
}

impl SnakeGame {
    pub fn new(config: SnakeConfig) -> Self {
        Self { config }
    }

    /// Pick a random empty cell for the food, giving up after the configured
    /// number of attempts.
    fn spawn_food<R: Rng + ?Sized>(&self, state: &SnakeState, rng: &mut R) -> EngineResult<Cell> {
        let size = state.size as i32;
        for _ in 0..self.config.food_spawn_attempts {
            let cell = (rng.random_range(0..size), rng.random_range(0..size));
            if !state.occupies(cell) {
                return Ok(cell);
            }
        }
        Err(EngineError::invariant(format!(
            "no empty cell for food after {} attempts (snake length {})",
            self.config.food_spawn_attempts,
            state.snake.len()
        )))
    }
}

impl GameRules for SnakeGame {
    type State = SnakeState;

    const KIND: GameKind = GameKind::Snake;

    fn new_game<R: Rng + ?Sized>(&self, rng: &mut R) -> EngineResult<SnakeState> {
        let size = self.config.field_size;
        let center = (size / 2) as i32;
        let mut state = SnakeState {
            size,
            snake: VecDeque::from([(center, center)]),
            direction: Direction::RIGHT,
            food: (0, 0),
            pending_direction: None,
            score: 0,
        };
        state.food = self.spawn_food(&state, rng)?;
        Ok(state)
    }

    fn apply_input(&self, state: &mut SnakeState, action: InputAction) -> bool {
        match action {
            InputAction::Direction(dir) => {
                state.pending_direction = Some(dir);
                true
            }
            _ => false,
        }
    }

    fn tick<R: Rng + ?Sized>(&self, state: &mut SnakeState, rng: &mut R) -> EngineResult<TickOutcome> {
        if let Some(requested) = state.pending_direction.take() {
            if requested.is_opposite(state.direction) {
                debug!(?requested, current = ?state.direction, "ignored reversal");
            } else {
                state.direction = requested;
            }
        }

        let new_head = state.direction.step(state.head());
        if !state.in_bounds(new_head) || state.occupies(new_head) {
            return Ok(TickOutcome::Collided);
        }

        state.snake.push_front(new_head);
        if new_head == state.food {
            state.score += self.config.food_points;
            state.food = self.spawn_food(state, rng)?;
            Ok(TickOutcome::AteFood)
        } else {
            state.snake.pop_back();
            Ok(TickOutcome::Continue)
        }
    }

    fn tick_interval(&self, _state: &SnakeState) -> Duration {
        self.config.tick_interval()
    }

    fn score(&self, state: &SnakeState) -> u32 {
        state.score
    }
}
