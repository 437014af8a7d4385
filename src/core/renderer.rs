/// Output seam between the session engine and whatever shows the game to the user
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::error::RenderError;
use crate::core::game::{Direction, InputAction, UserId};
use crate::games::GameKind;

/// A button the user can press while a game is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Control {
    Up,
    Down,
    Left,
    Right,
    Jump,
    Stop,
}

impl Control {
    pub fn label(self) -> &'static str {
        match self {
            Control::Up => "⬆️",
            Control::Down => "⬇️",
            Control::Left => "⬅️",
            Control::Right => "➡️",
            Control::Jump => "⬆️ Jump",
            Control::Stop => "⏹ Stop",
        }
    }

    /// The action a press of this control produces.
    pub fn action(self) -> InputAction {
        match self {
            Control::Up => InputAction::Direction(Direction::UP),
            Control::Down => InputAction::Direction(Direction::DOWN),
            Control::Left => InputAction::Direction(Direction::LEFT),
            Control::Right => InputAction::Direction(Direction::RIGHT),
            Control::Jump => InputAction::Jump,
            Control::Stop => InputAction::Stop,
        }
    }
}

/// Where a render goes: one generation of one user's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderTarget {
    pub user: UserId,
    pub generation: u64,
    pub kind: GameKind,
}

/// Per-tick update pushed to the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub text: String,
    pub controls: Vec<Control>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndReason {
    Collided,
    Stopped,
    /// Torn down after an internal error.
    Aborted,
}

/// Sent exactly once when a session terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub score: u32,
    pub reason: EndReason,
}

impl Summary {
    pub fn message(&self) -> String {
        match self.reason {
            EndReason::Collided => format!("Game over! Score: {}", self.score),
            EndReason::Stopped => format!("Game stopped. Score: {}", self.score),
            EndReason::Aborted => format!("Game aborted. Score: {}", self.score),
        }
    }
}

/// Per-kind strategy turning state into something a user can look at.
pub trait Renderer<S>: Send + Sync + 'static {
    fn render(&self, state: &S) -> String;

    fn controls(&self, state: &S) -> Vec<Control>;

    fn frame(&self, state: &S) -> Frame {
        Frame {
            text: self.render(state),
            controls: self.controls(state),
        }
    }
}

/// The output channel (chat message, terminal, pipe...).
///
/// The scheduler awaits every call before scheduling the next tick, so a
/// sink never sees overlapping renders for the same session. Any error tears
/// that session down.
#[async_trait]
pub trait RenderSink: Send + Sync + 'static {
    async fn update(&self, target: RenderTarget, frame: Frame) -> Result<(), RenderError>;

    async fn finish(&self, target: RenderTarget, summary: Summary) -> Result<(), RenderError>;
}
