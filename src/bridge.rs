//! JSON-lines adapter for a messaging front end.
//!
//! The chat side writes one command per line to our stdin:
//!
//! ```text
//! {"command":"start","user":42,"kind":"snake"}
//! {"command":"direction","user":42,"direction":"up"}
//! {"command":"jump","user":42}
//! {"command":"stop","user":42}
//! ```
//!
//! and reads one event per line from our stdout (`update` every tick, `final`
//! once per session). Lines that don't parse are logged and skipped.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::core::error::RenderError;
use crate::core::game::{Direction, InputAction, UserId};
use crate::core::registry::{InputDisposition, SessionRegistry};
use crate::core::renderer::{Control, EndReason, Frame, RenderSink, RenderTarget, Summary};
use crate::games::GameKind;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum BridgeCommand {
    Start { user: UserId, kind: GameKind },
    Stop { user: UserId },
    Direction { user: UserId, direction: String },
    Jump { user: UserId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum BridgeEvent {
    Update {
        user: UserId,
        generation: u64,
        kind: GameKind,
        text: String,
        controls: Vec<Control>,
    },
    Final {
        user: UserId,
        generation: u64,
        kind: GameKind,
        score: u32,
        reason: EndReason,
        message: String,
    },
}

/// [`RenderSink`] writing [`BridgeEvent`]s as JSON lines.
pub struct JsonLinesSink<W> {
    out: Mutex<W>,
}

impl<W> JsonLinesSink<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    async fn emit(&self, event: &BridgeEvent) -> Result<(), RenderError> {
        let mut line =
            serde_json::to_string(event).map_err(|e| RenderError::Transport(e.to_string()))?;
        line.push('\n');

        let mut out = self.out.lock().await;
        out.write_all(line.as_bytes()).await.map_err(io_to_render)?;
        out.flush().await.map_err(io_to_render)
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

fn io_to_render(err: std::io::Error) -> RenderError {
    match err.kind() {
        std::io::ErrorKind::BrokenPipe => RenderError::TargetGone(err.to_string()),
        _ => RenderError::Transport(err.to_string()),
    }
}

#[async_trait]
impl<W> RenderSink for JsonLinesSink<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn update(&self, target: RenderTarget, frame: Frame) -> Result<(), RenderError> {
        self.emit(&BridgeEvent::Update {
            user: target.user,
            generation: target.generation,
            kind: target.kind,
            text: frame.text,
            controls: frame.controls,
        })
        .await
    }

    async fn finish(&self, target: RenderTarget, summary: Summary) -> Result<(), RenderError> {
        self.emit(&BridgeEvent::Final {
            user: target.user,
            generation: target.generation,
            kind: target.kind,
            score: summary.score,
            reason: summary.reason,
            message: summary.message(),
        })
        .await
    }
}

/// Apply one parsed command to the registry.
pub async fn dispatch(registry: &SessionRegistry, command: BridgeCommand) {
    match command {
        BridgeCommand::Start { user, kind } => {
            if let Err(err) = registry.start(user, kind).await {
                warn!(%user, %kind, error = %err, "could not start session");
            }
        }
        BridgeCommand::Stop { user } => {
            let outcome = registry.stop(user).await;
            debug!(%user, ?outcome, "stop");
        }
        BridgeCommand::Direction { user, direction } => match direction.parse::<Direction>() {
            Ok(dir) => log_input(user, registry.apply_input(user, InputAction::Direction(dir)).await),
            Err(err) => warn!(%user, error = %err, "bad direction"),
        },
        BridgeCommand::Jump { user } => {
            log_input(user, registry.apply_input(user, InputAction::Jump).await);
        }
    }
}

fn log_input(user: UserId, outcome: InputDisposition) {
    if outcome != InputDisposition::Delivered {
        debug!(%user, ?outcome, "input dropped");
    }
}

/// Feed commands from `input` until EOF, then shut every session down.
pub async fn run<I>(registry: &SessionRegistry, input: I) -> std::io::Result<()>
where
    I: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<BridgeCommand>(line) {
            Ok(command) => dispatch(registry, command).await,
            Err(err) => warn!(error = %err, line, "skipping malformed command"),
        }
    }

    info!("input closed, shutting down");
    registry.shutdown().await;
    Ok(())
}
