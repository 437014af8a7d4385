/// Obstacle runner: jump over cacti, stay under birds, it keeps getting faster
pub mod game;
pub mod renderer;

pub use game::{Obstacle, ObstacleKind, RunnerGame, RunnerState};
pub use renderer::RunnerRenderer;
