/// Grid snake: steer around an NxN board eating food, don't hit the walls or yourself
pub mod game;
pub mod renderer;

pub use game::{SnakeGame, SnakeState};
pub use renderer::SnakeRenderer;
