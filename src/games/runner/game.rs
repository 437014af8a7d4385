use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::config::RunnerConfig;
use crate::core::error::EngineResult;
use crate::core::game::{GameRules, InputAction, TickOutcome};
use crate::games::GameKind;

pub const FIELD_HEIGHT: usize = 3;
pub const FIELD_WIDTH: usize = 10;
pub const AIR_ROW: usize = 0;
pub const GROUND_ROW: usize = FIELD_HEIGHT - 1;
/// The runner never moves horizontally.
pub const RUNNER_COL: i32 = 0;
/// Ticks spent in the air per jump.
pub const JUMP_TICKS: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObstacleKind {
    /// Cactus on the ground row, jump over it.
    Ground,
    /// Bird on the air row, stay down.
    Air,
}

impl ObstacleKind {
    pub fn row(self) -> usize {
        match self {
            ObstacleKind::Ground => GROUND_ROW,
            ObstacleKind::Air => AIR_ROW,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obstacle {
    pub row: usize,
    pub col: i32,
    pub kind: ObstacleKind,
}

impl Obstacle {
    pub fn new(kind: ObstacleKind, col: i32) -> Self {
        Self { row: kind.row(), col, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerState {
    pub runner_row: usize,
    pub obstacles: Vec<Obstacle>,
    /// 0 on the ground, otherwise ticks left in the air.
    pub jump_timer: u8,
    /// One jump remembered while airborne, fired right after landing.
    pub pending_jump: bool,
    pub score: u32,
    /// Never increases, never drops below the configured floor.
    pub tick_interval: Duration,
}

impl RunnerState {
    pub fn is_airborne(&self) -> bool {
        self.jump_timer > 0
    }

    fn take_off(&mut self) {
        self.runner_row = AIR_ROW;
        self.jump_timer = JUMP_TICKS;
    }

    fn land(&mut self) {
        self.runner_row = GROUND_ROW;
        self.jump_timer = 0;
    }

    pub fn obstacle_at(&self, row: usize, col: i32) -> Option<&Obstacle> {
        self.obstacles.iter().find(|o| o.row == row && o.col == col)
    }
}

#[derive(Debug, Clone)]
pub struct RunnerGame {
    config: RunnerConfig,
}

impl RunnerGame {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    fn advance_jump(&self, state: &mut RunnerState) {
        if !state.is_airborne() {
            return;
        }
        state.jump_timer -= 1;
        if state.jump_timer == 0 {
            state.land();
            if state.pending_jump {
                state.pending_jump = false;
                state.take_off();
                debug!("buffered jump fired on landing");
            }
        }
    }

    /// Shift everything one column left. Returns true on a hit.
    fn shift_obstacles(&self, state: &mut RunnerState) -> bool {
        let runner_row = state.runner_row;
        let mut hit = false;
        state.obstacles.retain_mut(|o| {
            o.col -= 1;
            if o.col < 0 {
                return false;
            }
            if o.col == RUNNER_COL && o.row == runner_row {
                hit = true;
            }
            true
        });
        hit
    }

    fn maybe_spawn<R: Rng + ?Sized>(&self, state: &mut RunnerState, rng: &mut R) {
        if !rng.random_bool(self.config.spawn_probability) {
            return;
        }
        let edge = FIELD_WIDTH as i32 - 1;
        let gap_start = FIELD_WIDTH as i32 - self.config.min_obstacle_gap as i32;
        if state.obstacles.iter().any(|o| o.col >= gap_start) {
            return;
        }
        let kind = if rng.random_bool(self.config.ground_share) {
            ObstacleKind::Ground
        } else {
            ObstacleKind::Air
        };
        state.obstacles.push(Obstacle::new(kind, edge));
        debug!(?kind, "spawned obstacle");
    }

    fn accelerate(&self, state: &mut RunnerState) {
        if !self.config.acceleration_enabled || state.score % self.config.acceleration_every != 0 {
            return;
        }
        let next = state
            .tick_interval
            .saturating_sub(self.config.acceleration_step())
            .max(self.config.min_interval());
        if next < state.tick_interval {
            state.tick_interval = next;
            debug!(interval_ms = next.as_millis() as u64, "speed increased");
        }
    }
}

impl GameRules for RunnerGame {
    type State = RunnerState;

    const KIND: GameKind = GameKind::Runner;

    fn new_game<R: Rng + ?Sized>(&self, _rng: &mut R) -> EngineResult<RunnerState> {
        Ok(RunnerState {
            runner_row: GROUND_ROW,
            obstacles: vec![Obstacle::new(ObstacleKind::Ground, FIELD_WIDTH as i32 - 1)],
            jump_timer: 0,
            pending_jump: false,
            score: 0,
            tick_interval: self.config.initial_interval(),
        })
    }

    fn apply_input(&self, state: &mut RunnerState, action: InputAction) -> bool {
        match action {
            InputAction::Jump if state.is_airborne() => {
                state.pending_jump = true;
                true
            }
            InputAction::Jump => {
                state.take_off();
                true
            }
            _ => false,
        }
    }

    fn tick<R: Rng + ?Sized>(&self, state: &mut RunnerState, rng: &mut R) -> EngineResult<TickOutcome> {
        self.advance_jump(state);

        if self.shift_obstacles(state) {
            return Ok(TickOutcome::Collided);
        }

        self.maybe_spawn(state, rng);

        if !state.is_airborne() {
            state.runner_row = GROUND_ROW;
        }

        state.score += 1;
        self.accelerate(state);
        Ok(TickOutcome::Continue)
    }

    fn tick_interval(&self, state: &RunnerState) -> Duration {
        state.tick_interval
    }

    fn score(&self, state: &RunnerState) -> u32 {
        state.score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn quiet() -> RunnerGame {
        RunnerGame::new(RunnerConfig {
            spawn_probability: 0.0,
            ..RunnerConfig::default()
        })
    }

    fn empty_field(game: &RunnerGame) -> RunnerState {
        let mut rng = StdRng::seed_from_u64(0);
        let mut state = game.new_game(&mut rng).unwrap();
        state.obstacles.clear();
        state
    }

    #[test]
    fn starts_grounded_with_one_cactus() {
        let mut rng = StdRng::seed_from_u64(0);
        let state = quiet().new_game(&mut rng).unwrap();
        assert_eq!(state.runner_row, GROUND_ROW);
        assert_eq!(state.obstacles, vec![Obstacle::new(ObstacleKind::Ground, 9)]);
        assert_eq!(state.tick_interval, Duration::from_millis(500));
    }

    #[test]
    fn lands_two_ticks_after_jump() {
        let game = quiet();
        let mut rng = StdRng::seed_from_u64(0);
        let mut state = empty_field(&game);

        game.apply_input(&mut state, InputAction::Jump);
        assert_eq!((state.runner_row, state.jump_timer), (AIR_ROW, 2));

        game.tick(&mut state, &mut rng).unwrap();
        assert_eq!((state.runner_row, state.jump_timer), (AIR_ROW, 1));

        game.tick(&mut state, &mut rng).unwrap();
        assert_eq!((state.runner_row, state.jump_timer), (GROUND_ROW, 0));
    }

    #[test]
    fn buffered_jump_fires_on_landing_once() {
        let game = quiet();
        let mut rng = StdRng::seed_from_u64(0);
        let mut state = empty_field(&game);

        game.apply_input(&mut state, InputAction::Jump);
        game.tick(&mut state, &mut rng).unwrap();
        assert_eq!(state.jump_timer, 1);

        game.apply_input(&mut state, InputAction::Jump);
        game.apply_input(&mut state, InputAction::Jump);
        assert!(state.pending_jump);

        game.tick(&mut state, &mut rng).unwrap();
        assert_eq!((state.runner_row, state.jump_timer), (AIR_ROW, 2));
        assert!(!state.pending_jump);

        // no second re-jump from the doubled request
        game.tick(&mut state, &mut rng).unwrap();
        game.tick(&mut state, &mut rng).unwrap();
        assert_eq!((state.runner_row, state.jump_timer), (GROUND_ROW, 0));
        game.tick(&mut state, &mut rng).unwrap();
        assert_eq!(state.runner_row, GROUND_ROW);
    }

    #[test]
    fn collision_reports_ticks_survived() {
        let game = quiet();
        let mut rng = StdRng::seed_from_u64(0);
        let mut state = game.new_game(&mut rng).unwrap();

        let mut ticks = 0;
        loop {
            match game.tick(&mut state, &mut rng).unwrap() {
                TickOutcome::Collided => break,
                _ => ticks += 1,
            }
        }
        // cactus starts at column 9 and reaches the runner on the ninth tick
        assert_eq!(ticks, 8);
        assert_eq!(state.score, 8);
    }

    #[test]
    fn jumping_clears_a_cactus() {
        let game = quiet();
        let mut rng = StdRng::seed_from_u64(0);
        let mut state = empty_field(&game);
        state.obstacles.push(Obstacle::new(ObstacleKind::Ground, 1));

        game.apply_input(&mut state, InputAction::Jump);
        assert_eq!(game.tick(&mut state, &mut rng).unwrap(), TickOutcome::Continue);
        assert_eq!(game.tick(&mut state, &mut rng).unwrap(), TickOutcome::Continue);
        assert!(state.obstacles.is_empty());
    }

    #[test]
    fn bird_hits_airborne_runner() {
        let game = quiet();
        let mut rng = StdRng::seed_from_u64(0);
        let mut state = empty_field(&game);
        state.obstacles.push(Obstacle::new(ObstacleKind::Air, 2));

        game.apply_input(&mut state, InputAction::Jump);
        game.tick(&mut state, &mut rng).unwrap();
        game.tick(&mut state, &mut rng).unwrap();
        // landed this tick, bird passes overhead harmlessly
        assert_eq!(state.runner_row, GROUND_ROW);

        let mut state = empty_field(&game);
        state.obstacles.push(Obstacle::new(ObstacleKind::Air, 1));
        game.apply_input(&mut state, InputAction::Jump);
        assert_eq!(game.tick(&mut state, &mut rng).unwrap(), TickOutcome::Collided);
    }

    #[test]
    fn spawns_respect_gap() {
        let game = RunnerGame::new(RunnerConfig {
            spawn_probability: 1.0,
            ..RunnerConfig::default()
        });
        let mut rng = StdRng::seed_from_u64(5);
        let mut state = empty_field(&game);
        state.obstacles.push(Obstacle::new(ObstacleKind::Ground, 8));

        game.tick(&mut state, &mut rng).unwrap();
        // shifted to 7 which is still inside the gap
        assert_eq!(state.obstacles.len(), 1);

        game.tick(&mut state, &mut rng).unwrap();
        assert_eq!(state.obstacles.len(), 2);
        assert_eq!(state.obstacles[1].col, 9);
    }

    #[test]
    fn interval_shrinks_to_the_floor() {
        let game = quiet();
        let mut rng = StdRng::seed_from_u64(0);
        let mut state = empty_field(&game);

        for _ in 0..5 {
            game.tick(&mut state, &mut rng).unwrap();
        }
        assert_eq!(state.tick_interval, Duration::from_millis(480));

        for _ in 0..500 {
            game.tick(&mut state, &mut rng).unwrap();
        }
        assert_eq!(state.tick_interval, Duration::from_millis(200));
    }

    #[test]
    fn random_play_holds_invariants() {
        let game = RunnerGame::new(RunnerConfig::default());
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..50 {
            let mut state = game.new_game(&mut rng).unwrap();
            let mut last_interval = state.tick_interval;
            for _ in 0..300 {
                if rng.random_bool(0.3) {
                    game.apply_input(&mut state, InputAction::Jump);
                }
                let outcome = game.tick(&mut state, &mut rng).unwrap();
                assert!(state.jump_timer <= JUMP_TICKS);
                if state.jump_timer > 0 {
                    assert_eq!(state.runner_row, AIR_ROW);
                }
                assert!(state.tick_interval <= last_interval);
                assert!(state.tick_interval >= Duration::from_millis(200));
                last_interval = state.tick_interval;
                assert!(state
                    .obstacles
                    .iter()
                    .all(|o| (0..FIELD_WIDTH as i32).contains(&o.col)));
                if outcome.is_terminal() {
                    break;
                }
            }
        }
    }
}
