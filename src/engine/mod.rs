pub mod input;
pub mod runner;
pub mod session;

pub use input::InputChannel;
pub use session::{GameSession, SessionSnapshot, SessionStatus, SessionView};
