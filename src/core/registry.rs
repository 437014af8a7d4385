use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::future::{join_all, BoxFuture};
use futures_util::FutureExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::core::config::ArcadeConfig;
use crate::core::error::{ConfigError, EngineResult};
use crate::core::game::{GameRules, InputAction, UserId};
use crate::core::renderer::{EndReason, RenderSink, RenderTarget, Renderer, Summary};
use crate::engine::runner::SessionTask;
use crate::engine::session::{GameSession, SessionSnapshot, SessionStatus, SessionView};
use crate::games::{GameKind, KindVisitor};

/// What happened to a stop or input request.
///
/// None of these are errors: input for a missing or finished session is
/// simply dropped, so retransmitted button presses are harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputDisposition {
    Delivered,
    NoSession,
    /// A session exists but is already winding down.
    Inactive,
}

/// Where a loop stands relative to its user's slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Standing {
    Current,
    StopRequested,
    /// Stopped, then replaced by a newer generation before the loop noticed.
    /// The loop still owes its stop summary.
    StoppedThenSuperseded,
    /// A newer generation replaced it while active, or it was removed.
    Superseded,
}

#[derive(Debug, Default)]
pub(crate) struct SlotState {
    current: Option<GameSession>,
    /// Stopped sessions whose loops have not reported yet.
    parked: Vec<GameSession>,
}

impl SlotState {
    fn is_idle(&self) -> bool {
        self.current.is_none() && self.parked.is_empty()
    }
}

/// Everything the registry knows about one user.
///
/// `turn` serializes effects for the user: a loop holds it for a whole tick
/// (check, advance, render) and `start` holds it while swapping generations.
/// Lock order is always `turn` then `state`.
#[derive(Debug, Default)]
pub(crate) struct UserSlot {
    pub(crate) turn: Mutex<()>,
    state: Mutex<SlotState>,
}

impl UserSlot {
    pub(crate) async fn standing(&self, generation: u64) -> Standing {
        let state = self.state.lock().await;
        match &state.current {
            Some(session) if session.generation == generation => {
                if session.is_active() {
                    Standing::Current
                } else {
                    Standing::StopRequested
                }
            }
            _ if state.parked.iter().any(|s| s.generation == generation) => {
                Standing::StoppedThenSuperseded
            }
            _ => Standing::Superseded,
        }
    }

    /// Remove `generation` from the slot, whether current or parked.
    ///
    /// Returns its final snapshot (status `Terminated`), or `None` when the
    /// generation was already gone.
    pub(crate) async fn retire(&self, generation: u64) -> Option<SessionSnapshot> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let mut session = if state.current.as_ref().is_some_and(|s| s.generation == generation) {
            state.current.take()?
        } else {
            let idx = state.parked.iter().position(|s| s.generation == generation)?;
            state.parked.swap_remove(idx)
        };
        session.status = SessionStatus::Terminated;
        Some(session.snapshot())
    }
}

#[cfg(test)]
impl UserSlot {
    pub(crate) fn install_for_test(&self, session: GameSession) {
        let mut state = self.state.try_lock().expect("slot is uncontended in tests");
        state.current = Some(session);
    }
}

struct RegistryInner {
    config: ArcadeConfig,
    sink: Arc<dyn RenderSink>,
    // empty slots are pruned once their last loop is gone
    slots: RwLock<HashMap<UserId, Arc<UserSlot>>>,
    /// Registry-wide, so a user's generations keep rising across pruned slots.
    generations: AtomicU64,
    tasks: parking_lot::Mutex<Vec<JoinHandle<()>>>,
}

impl RegistryInner {
    /// Drop `user`'s slot if it is still `slot` and holds nothing.
    async fn prune(&self, user: UserId, slot: &Arc<UserSlot>) {
        let mut slots = self.slots.write().await;
        match slots.get(&user) {
            Some(registered) if Arc::ptr_eq(registered, slot) => {}
            _ => return,
        }
        // never wait on a slot lock under the map lock; a busy slot is not idle
        let idle = match slot.state.try_lock() {
            Ok(state) => state.is_idle(),
            Err(_) => false,
        };
        if idle {
            slots.remove(&user);
            debug!(%user, "pruned idle slot");
        }
    }
}

/// Process-wide map from user to their active session.
///
/// Cheap to clone; all clones share the same sessions.
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<RegistryInner>,
}

impl SessionRegistry {
    /// Fails if `config` does not pass [`ArcadeConfig::validate`].
    pub fn new(config: ArcadeConfig, sink: Arc<dyn RenderSink>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(RegistryInner {
                config,
                sink,
                slots: RwLock::new(HashMap::new()),
                generations: AtomicU64::new(0),
                tasks: parking_lot::Mutex::new(Vec::new()),
            }),
        })
    }

    pub fn config(&self) -> &ArcadeConfig {
        &self.inner.config
    }

    async fn slot(&self, user: UserId) -> Arc<UserSlot> {
        if let Some(slot) = self.inner.slots.read().await.get(&user) {
            return slot.clone();
        }
        self.inner.slots.write().await.entry(user).or_default().clone()
    }

    async fn existing_slot(&self, user: UserId) -> Option<Arc<UserSlot>> {
        self.inner.slots.read().await.get(&user).cloned()
    }

    async fn is_registered(&self, user: UserId, slot: &Arc<UserSlot>) -> bool {
        self.inner
            .slots
            .read()
            .await
            .get(&user)
            .is_some_and(|registered| Arc::ptr_eq(registered, slot))
    }

    /// Start a new `kind` session for `user`, replacing any current one.
    ///
    /// Returns the new generation. Once this returns, the replaced session's
    /// loop produces no further frames. A session that was already stopped
    /// still gets its stop summary.
    pub async fn start(&self, user: UserId, kind: GameKind) -> EngineResult<u64> {
        loop {
            let slot = self.slot(user).await;
            let _turn = slot.turn.lock().await;
            let mut state = slot.state.lock().await;
            if !self.is_registered(user, &slot).await {
                // pruned between lookup and lock
                continue;
            }

            let generation = self.inner.generations.fetch_add(1, Ordering::Relaxed) + 1;
            let launch = Launch {
                slot: slot.clone(),
                sink: self.inner.sink.clone(),
                user,
                generation,
            };
            let launched = kind.dispatch(&self.inner.config, launch)?;

            if let Some(mut old) = state.current.take() {
                if old.is_active() {
                    old.mark(SessionStatus::Stopped);
                    info!(%user, generation = old.generation, kind = %old.kind, "session superseded");
                } else {
                    debug!(%user, generation = old.generation, "parking stopped session");
                    state.parked.push(old);
                }
            }
            state.current = Some(launched.session);
            drop(state);

            self.spawn_supervised(user, generation, slot.clone(), launched.task);
            info!(%user, generation, %kind, "session started");
            return Ok(generation);
        }
    }

    /// Ask the user's session to stop. Idempotent.
    pub async fn stop(&self, user: UserId) -> InputDisposition {
        let Some(slot) = self.existing_slot(user).await else {
            return InputDisposition::NoSession;
        };
        let mut state = slot.state.lock().await;
        match state.current.as_mut() {
            Some(session) if session.is_active() => {
                session.mark(SessionStatus::Stopped);
                info!(%user, generation = session.generation, "stop requested");
                InputDisposition::Delivered
            }
            Some(_) => InputDisposition::Inactive,
            None => InputDisposition::NoSession,
        }
    }

    pub async fn get(&self, user: UserId) -> Option<SessionSnapshot> {
        let slot = self.existing_slot(user).await?;
        let state = slot.state.lock().await;
        state.current.as_ref().map(GameSession::snapshot)
    }

    /// Forward a user action to their session's input buffer.
    pub async fn apply_input(&self, user: UserId, action: InputAction) -> InputDisposition {
        if action == InputAction::Stop {
            return self.stop(user).await;
        }
        let Some(slot) = self.existing_slot(user).await else {
            debug!(%user, ?action, "input without a session");
            return InputDisposition::NoSession;
        };
        let state = slot.state.lock().await;
        match state.current.as_ref() {
            Some(session) if session.is_active() => {
                if let Some(replaced) = session.input.push(action) {
                    debug!(%user, ?replaced, ?action, "coalesced pending input");
                }
                InputDisposition::Delivered
            }
            Some(_) => InputDisposition::Inactive,
            None => InputDisposition::NoSession,
        }
    }

    pub async fn active_count(&self) -> usize {
        let slots: Vec<Arc<UserSlot>> = self.inner.slots.read().await.values().cloned().collect();
        let mut count = 0;
        for slot in slots {
            if slot.state.lock().await.current.is_some() {
                count += 1;
            }
        }
        count
    }

    /// Number of users the registry currently keeps a slot for.
    pub async fn tracked_users(&self) -> usize {
        self.inner.slots.read().await.len()
    }

    /// Stop every session and wait for all loops to wind down.
    pub async fn shutdown(&self) {
        let users: Vec<UserId> = self.inner.slots.read().await.keys().copied().collect();
        for user in users {
            self.stop(user).await;
        }
        let tasks: Vec<JoinHandle<()>> = std::mem::take(&mut *self.inner.tasks.lock());
        info!(loops = tasks.len(), "waiting for session loops");
        join_all(tasks).await;
    }

    /// Run a session loop on its own task. A panic in the loop is contained
    /// there: that session alone is retired with a best-effort `Aborted`
    /// summary carrying its last published score.
    fn spawn_supervised(
        &self,
        user: UserId,
        generation: u64,
        slot: Arc<UserSlot>,
        task: BoxFuture<'static, ()>,
    ) {
        let inner = self.inner.clone();
        let supervisor = tokio::spawn(async move {
            if let Err(err) = tokio::spawn(task).await {
                error!(%user, generation, error = %err, "session loop crashed");
                if let Some(last) = slot.retire(generation).await {
                    let target = RenderTarget { user, generation, kind: last.kind };
                    let summary = Summary { score: last.score, reason: EndReason::Aborted };
                    if let Err(err) = inner.sink.finish(target, summary).await {
                        warn!(%user, generation, error = %err, "failed to deliver final summary");
                    }
                }
            }
            inner.prune(user, &slot).await;
        });

        let mut tasks = self.inner.tasks.lock();
        tasks.retain(|t| !t.is_finished());
        tasks.push(supervisor);
    }
}

struct Launched {
    session: GameSession,
    task: BoxFuture<'static, ()>,
}

/// Builds a session for whichever game kind `dispatch` picks.
struct Launch {
    slot: Arc<UserSlot>,
    sink: Arc<dyn RenderSink>,
    user: UserId,
    generation: u64,
}

impl KindVisitor for Launch {
    type Output = EngineResult<Launched>;

    fn visit<G, R>(self, rules: G, renderer: R) -> EngineResult<Launched>
    where
        G: GameRules,
        R: Renderer<G::State>,
    {
        let mut rng = StdRng::from_os_rng();
        let state = rules.new_game(&mut rng)?;
        let view = SessionView {
            state: state.clone().into(),
            tick_interval: rules.tick_interval(&state),
            ticks: 0,
            score: rules.score(&state),
        };
        let (session, link) = GameSession::new(self.user, self.generation, G::KIND, view);

        let task = SessionTask {
            target: RenderTarget {
                user: self.user,
                generation: self.generation,
                kind: G::KIND,
            },
            rules,
            renderer,
            state,
            rng,
            link,
            slot: self.slot,
            sink: self.sink,
            ticks: 0,
        };
        Ok(Launched {
            session,
            task: task.run().boxed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::RunnerConfig;
    use crate::core::error::RenderError;
    use crate::core::renderer::Frame;

    struct Discard;

    #[async_trait::async_trait]
    impl RenderSink for Discard {
        async fn update(&self, _target: RenderTarget, _frame: Frame) -> Result<(), RenderError> {
            Ok(())
        }

        async fn finish(&self, _target: RenderTarget, _summary: Summary) -> Result<(), RenderError> {
            Ok(())
        }
    }

    fn session(generation: u64) -> GameSession {
        let rules = crate::games::snake::SnakeGame::new(Default::default());
        let state = rules.new_game(&mut StdRng::seed_from_u64(generation)).unwrap();
        let view = SessionView {
            tick_interval: rules.tick_interval(&state),
            score: 0,
            state: state.into(),
            ticks: 0,
        };
        GameSession::new(UserId(1), generation, GameKind::Snake, view).0
    }

    #[tokio::test]
    async fn retire_hands_back_a_terminated_snapshot() {
        let slot = UserSlot::default();
        slot.install_for_test(session(4));

        let last = slot.retire(4).await.unwrap();
        assert_eq!(last.status, SessionStatus::Terminated);
        assert_eq!(last.generation, 4);

        assert!(slot.retire(4).await.is_none());
        assert_eq!(slot.standing(4).await, Standing::Superseded);
    }

    #[tokio::test]
    async fn parked_session_keeps_its_standing_until_retired() {
        let slot = UserSlot::default();
        let mut stopped = session(1);
        stopped.mark(SessionStatus::Stopped);
        {
            let mut state = slot.state.lock().await;
            state.parked.push(stopped);
            state.current = Some(session(2));
        }

        assert_eq!(slot.standing(1).await, Standing::StoppedThenSuperseded);
        assert_eq!(slot.standing(2).await, Standing::Current);

        assert_eq!(slot.retire(1).await.map(|s| s.generation), Some(1));
        assert_eq!(slot.standing(1).await, Standing::Superseded);
        assert!(!slot.state.lock().await.is_idle());
    }

    #[test]
    fn rejects_invalid_config() {
        let mut config = ArcadeConfig::default();
        config.runner = RunnerConfig { acceleration_every: 0, ..RunnerConfig::default() };
        assert!(SessionRegistry::new(config, Arc::new(Discard)).is_err());

        let mut config = ArcadeConfig::default();
        config.snake.field_size = 1_000_000;
        assert!(SessionRegistry::new(config, Arc::new(Discard)).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn slots_are_pruned_and_generations_keep_rising() {
        let registry = SessionRegistry::new(ArcadeConfig::default(), Arc::new(Discard)).unwrap();
        let user = UserId(3);

        assert_eq!(registry.start(user, GameKind::Snake).await.unwrap(), 1);
        registry.stop(user).await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        assert_eq!(registry.tracked_users().await, 0);
        assert_eq!(registry.start(user, GameKind::Snake).await.unwrap(), 2);
        assert_eq!(registry.tracked_users().await, 1);

        registry.shutdown().await;
        assert_eq!(registry.tracked_users().await, 0);
    }
}
