//! Session bookkeeping shared between the registry and a session's tick loop.
//!
//! The game state itself is owned by the loop task. The registry keeps a
//! [`GameSession`] handle: identity, generation, status, the input buffer, a
//! wake-up signal for the loop and a read-only view of the latest state.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Notify};

use crate::core::game::UserId;
use crate::engine::input::InputChannel;
use crate::games::{GameKind, GameState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Active,
    /// Stop requested; the loop ends at its next boundary.
    Stopped,
    /// Removed from the registry; only seen in the snapshot taken on retirement.
    Terminated,
}

/// Latest state published by the loop after each tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub state: GameState,
    pub tick_interval: Duration,
    pub ticks: u64,
    pub score: u32,
}

/// Point-in-time copy of a session, as returned by `SessionRegistry::get`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub user: UserId,
    pub generation: u64,
    pub kind: GameKind,
    pub status: SessionStatus,
    pub state: GameState,
    pub tick_interval: Duration,
    pub ticks: u64,
    pub score: u32,
}

/// Registry-side handle for one session generation.
#[derive(Debug, Clone)]
pub struct GameSession {
    pub user: UserId,
    pub generation: u64,
    pub kind: GameKind,
    pub status: SessionStatus,
    pub input: InputChannel,
    wake: Arc<Notify>,
    view: watch::Receiver<SessionView>,
}

impl GameSession {
    /// Create the handle plus the loop-side publisher for its view.
    pub fn new(
        user: UserId,
        generation: u64,
        kind: GameKind,
        initial: SessionView,
    ) -> (Self, SessionLink) {
        let (view_tx, view) = watch::channel(initial);
        let input = InputChannel::new();
        let wake = Arc::new(Notify::new());
        let session = Self {
            user,
            generation,
            kind,
            status: SessionStatus::Active,
            input: input.clone(),
            wake: wake.clone(),
            view,
        };
        let link = SessionLink { input, wake, view: view_tx };
        (session, link)
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// Flag the session and nudge the loop so it notices without waiting out the interval.
    pub fn mark(&mut self, status: SessionStatus) {
        self.status = status;
        self.wake.notify_one();
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let view = self.view.borrow();
        SessionSnapshot {
            user: self.user,
            generation: self.generation,
            kind: self.kind,
            status: self.status,
            state: view.state.clone(),
            tick_interval: view.tick_interval,
            ticks: view.ticks,
            score: view.score,
        }
    }
}

/// The loop's end of a [`GameSession`].
#[derive(Debug)]
pub struct SessionLink {
    pub input: InputChannel,
    pub wake: Arc<Notify>,
    pub view: watch::Sender<SessionView>,
}

impl SessionLink {
    pub fn publish(&self, view: SessionView) {
        // no receivers only means the registry already dropped the handle
        self.view.send_replace(view);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::RunnerConfig;
    use crate::core::game::{GameRules, InputAction};
    use crate::games::runner::RunnerGame;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn runner_view() -> SessionView {
        let rules = RunnerGame::new(RunnerConfig::default());
        let state = rules.new_game(&mut StdRng::seed_from_u64(1)).unwrap();
        SessionView {
            tick_interval: rules.tick_interval(&state),
            score: rules.score(&state),
            state: state.into(),
            ticks: 0,
        }
    }

    #[test]
    fn snapshot_follows_published_view() {
        let (session, link) = GameSession::new(UserId(7), 3, GameKind::Runner, runner_view());
        assert_eq!(session.snapshot().ticks, 0);

        let mut next = runner_view();
        next.ticks = 4;
        link.publish(next);

        let snap = session.snapshot();
        assert_eq!(snap.ticks, 4);
        assert_eq!(snap.generation, 3);
        assert_eq!(snap.status, SessionStatus::Active);
        assert_eq!(snap.state.kind(), GameKind::Runner);
    }

    #[test]
    fn input_reaches_the_loop_side() {
        let (session, link) = GameSession::new(UserId(1), 1, GameKind::Runner, runner_view());
        session.input.push(InputAction::Jump);
        assert_eq!(link.input.take(), Some(InputAction::Jump));
    }

    #[tokio::test]
    async fn marking_wakes_the_loop() {
        let (mut session, link) = GameSession::new(UserId(1), 1, GameKind::Runner, runner_view());
        session.mark(SessionStatus::Stopped);
        assert!(!session.is_active());
        // permit stored by notify_one, so this resolves immediately
        link.wake.notified().await;
    }
}
