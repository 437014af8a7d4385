pub mod core;
pub mod engine;
pub mod games;

// Outer surfaces driving the engine
pub mod bridge;
pub mod terminal;

// Re-export for convenience
pub use crate::core::game::{Direction, GameRules, InputAction, UserId};
pub use crate::core::registry::{InputDisposition, SessionRegistry};
pub use crate::games::GameKind;
