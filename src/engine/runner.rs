//! The per-session tick loop.
//!
//! One loop runs per session generation on its own task. Every iteration it
//! takes its user's turn lock, checks that it still owns the current
//! generation, consumes buffered input, advances the rules, publishes the new
//! state and awaits the render before sleeping for the (possibly shortened)
//! tick interval. A loop that finds itself superseded returns without touching
//! anything. A stopped or crashed one reports a single final summary, even
//! when a newer generation was installed after the stop.

use std::sync::Arc;

use rand::rngs::StdRng;
use tracing::{debug, error, info, warn};

use crate::core::error::{EngineError, EngineResult};
use crate::core::game::GameRules;
use crate::core::registry::{Standing, UserSlot};
use crate::core::renderer::{EndReason, RenderSink, RenderTarget, Renderer, Summary};
use crate::engine::session::{SessionLink, SessionView};

enum Step {
    Continue,
    Finished,
}

pub(crate) struct SessionTask<G: GameRules, R> {
    pub(crate) target: RenderTarget,
    pub(crate) rules: G,
    pub(crate) renderer: R,
    pub(crate) state: G::State,
    pub(crate) rng: StdRng,
    pub(crate) link: SessionLink,
    pub(crate) slot: Arc<UserSlot>,
    pub(crate) sink: Arc<dyn RenderSink>,
    pub(crate) ticks: u64,
}

impl<G, R> SessionTask<G, R>
where
    G: GameRules,
    R: Renderer<G::State>,
{
    pub(crate) async fn run(mut self) {
        let RenderTarget { user, generation, kind } = self.target;
        info!(%user, generation, %kind, "session loop started");

        loop {
            let slot = self.slot.clone();
            let turn = slot.turn.lock().await;

            match slot.standing(generation).await {
                Standing::Superseded => {
                    debug!(%user, generation, "loop superseded, exiting");
                    return;
                }
                Standing::StopRequested => {
                    self.finish(EndReason::Stopped).await;
                    return;
                }
                Standing::StoppedThenSuperseded => {
                    debug!(%user, generation, "stopped before being replaced");
                    self.finish(EndReason::Stopped).await;
                    return;
                }
                Standing::Current => {}
            }

            match self.step().await {
                Ok(Step::Continue) => {}
                Ok(Step::Finished) => return,
                Err(err) => {
                    self.abort(err).await;
                    return;
                }
            }

            let interval = self.rules.tick_interval(&self.state);
            drop(turn);

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                // stop or supersede; re-checked at the top
                _ = self.link.wake.notified() => {}
            }
        }
    }

    /// One tick: input, rules, publish, render.
    async fn step(&mut self) -> EngineResult<Step> {
        if let Some(action) = self.link.input.take() {
            if !self.rules.apply_input(&mut self.state, action) {
                debug!(user = %self.target.user, ?action, "input ignored");
            }
        }

        let outcome = self.rules.tick(&mut self.state, &mut self.rng)?;
        self.ticks += 1;
        self.publish();

        if outcome.is_terminal() {
            self.finish(EndReason::Collided).await;
            return Ok(Step::Finished);
        }

        let frame = self.renderer.frame(&self.state);
        self.sink.update(self.target, frame).await?;
        Ok(Step::Continue)
    }

    fn publish(&self) {
        self.link.publish(SessionView {
            state: self.state.clone().into(),
            tick_interval: self.rules.tick_interval(&self.state),
            ticks: self.ticks,
            score: self.rules.score(&self.state),
        });
    }

    async fn finish(&mut self, reason: EndReason) {
        let summary = Summary {
            score: self.rules.score(&self.state),
            reason,
        };
        let RenderTarget { user, generation, .. } = self.target;
        if let Err(err) = self.sink.finish(self.target, summary).await {
            warn!(%user, generation, error = %err, "failed to deliver final summary");
        }
        let status = self.slot.retire(generation).await.map(|last| last.status);
        info!(%user, generation, score = summary.score, ?reason, ?status, ticks = self.ticks, "session ended");
    }

    async fn abort(&mut self, err: EngineError) {
        let RenderTarget { user, generation, .. } = self.target;
        match err {
            EngineError::RenderFailure(err) => {
                // the sink is broken, nothing left to tell the user through it
                warn!(%user, generation, error = %err, "render failed, tearing session down");
                self.slot.retire(generation).await;
            }
            other => {
                error!(%user, generation, error = %other, "session failed");
                self.finish(EndReason::Aborted).await;
            }
        }
    }
}
