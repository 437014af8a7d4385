/// Interactive terminal front end: a local stand-in for the chat UI
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::layout::{Alignment, Constraint, Layout};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Paragraph};
use ratatui::DefaultTerminal;
use tokio::sync::mpsc;
use tracing::info;

use crate::core::error::RenderError;
use crate::core::game::{Direction, InputAction, UserId};
use crate::core::registry::SessionRegistry;
use crate::core::renderer::{Control, Frame, RenderSink, RenderTarget, Summary};
use crate::games::GameKind;

/// The terminal only ever has one player.
pub const LOCAL_USER: UserId = UserId(0);

/// What the sink hands to the UI loop.
#[derive(Debug, Clone)]
pub enum Screen {
    Frame(RenderTarget, Frame),
    Final(RenderTarget, Summary),
}

/// [`RenderSink`] forwarding frames to the terminal UI loop.
#[derive(Debug, Clone)]
pub struct TerminalSink {
    tx: mpsc::UnboundedSender<Screen>,
}

impl TerminalSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Screen>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, screen: Screen) -> Result<(), RenderError> {
        self.tx
            .send(screen)
            .map_err(|_| RenderError::TargetGone("terminal closed".into()))
    }
}

#[async_trait]
impl RenderSink for TerminalSink {
    async fn update(&self, target: RenderTarget, frame: Frame) -> Result<(), RenderError> {
        self.send(Screen::Frame(target, frame))
    }

    async fn finish(&self, target: RenderTarget, summary: Summary) -> Result<(), RenderError> {
        self.send(Screen::Final(target, summary))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyCommand {
    Action(InputAction),
    Restart,
    Quit,
}

fn map_key(code: KeyCode) -> Option<KeyCommand> {
    let cmd = match code {
        KeyCode::Up => KeyCommand::Action(InputAction::Direction(Direction::UP)),
        KeyCode::Down => KeyCommand::Action(InputAction::Direction(Direction::DOWN)),
        KeyCode::Left => KeyCommand::Action(InputAction::Direction(Direction::LEFT)),
        KeyCode::Right => KeyCommand::Action(InputAction::Direction(Direction::RIGHT)),
        KeyCode::Char(' ') => KeyCommand::Action(InputAction::Jump),
        KeyCode::Char('s') => KeyCommand::Action(InputAction::Stop),
        KeyCode::Char('r') => KeyCommand::Restart,
        KeyCode::Char('q') | KeyCode::Esc => KeyCommand::Quit,
        _ => return None,
    };
    Some(cmd)
}

fn hint(control: Control) -> &'static str {
    match control {
        Control::Up => "↑",
        Control::Down => "↓",
        Control::Left => "←",
        Control::Right => "→",
        Control::Jump => "space: jump",
        Control::Stop => "s: stop",
    }
}

/// Everything currently on screen.
struct View {
    kind: GameKind,
    generation: u64,
    board: String,
    controls: Vec<Control>,
    status: String,
}

impl View {
    fn new(kind: GameKind) -> Self {
        Self {
            kind,
            generation: 0,
            board: String::new(),
            controls: Vec::new(),
            status: "Starting...".into(),
        }
    }

    fn apply(&mut self, screen: Screen) {
        match screen {
            Screen::Frame(target, frame) => {
                self.generation = target.generation;
                self.board = frame.text;
                self.controls = frame.controls;
                self.status.clear();
            }
            Screen::Final(target, summary) => {
                self.generation = target.generation;
                self.controls.clear();
                self.status = format!("{}  (r: new game, q: quit)", summary.message());
            }
        }
    }

    fn render(&self, f: &mut ratatui::Frame) {
        let [header, body, footer] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .areas(f.area());

        let title = format!("{}  ·  game #{}", self.kind.info().name, self.generation);
        f.render_widget(
            Paragraph::new(title)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Cyan))
                .block(Block::bordered()),
            header,
        );

        f.render_widget(
            Paragraph::new(self.board.as_str()).block(Block::bordered().title(" board ")),
            body,
        );

        let footer_text = if self.status.is_empty() {
            let mut hints: Vec<&str> = self.controls.iter().map(|c| hint(*c)).collect();
            hints.push("q: quit");
            hints.join("   ")
        } else {
            self.status.clone()
        };
        f.render_widget(
            Paragraph::new(footer_text)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Gray))
                .block(Block::bordered()),
            footer,
        );
    }
}

/// Read keys on a plain thread; crossterm polling blocks.
fn spawn_key_reader() -> mpsc::UnboundedReceiver<KeyCommand> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        while !tx.is_closed() {
            match event::poll(Duration::from_millis(100)) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(_) => break,
            }
            let Ok(Event::Key(key)) = event::read() else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if let Some(cmd) = map_key(key.code) {
                if tx.send(cmd).is_err() {
                    break;
                }
            }
        }
    });
    rx
}

/// Play `kind` in this terminal until the user quits.
pub async fn play(
    registry: SessionRegistry,
    kind: GameKind,
    screens: mpsc::UnboundedReceiver<Screen>,
) -> Result<()> {
    let mut terminal = ratatui::init();
    let result = run_ui(&mut terminal, &registry, kind, screens).await;
    ratatui::restore();

    registry.shutdown().await;
    result
}

async fn run_ui(
    terminal: &mut DefaultTerminal,
    registry: &SessionRegistry,
    kind: GameKind,
    mut screens: mpsc::UnboundedReceiver<Screen>,
) -> Result<()> {
    let mut keys = spawn_key_reader();
    let mut view = View::new(kind);
    registry.start(LOCAL_USER, kind).await?;

    loop {
        terminal.draw(|f| view.render(f))?;

        tokio::select! {
            Some(screen) = screens.recv() => view.apply(screen),
            key = keys.recv() => match key {
                Some(KeyCommand::Action(action)) => {
                    registry.apply_input(LOCAL_USER, action).await;
                }
                Some(KeyCommand::Restart) => {
                    let generation = registry.start(LOCAL_USER, kind).await?;
                    info!(generation, "restarted from terminal");
                }
                Some(KeyCommand::Quit) | None => return Ok(()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::renderer::EndReason;

    #[test]
    fn keys_map_to_actions() {
        assert_eq!(
            map_key(KeyCode::Left),
            Some(KeyCommand::Action(InputAction::Direction(Direction::LEFT)))
        );
        assert_eq!(map_key(KeyCode::Char(' ')), Some(KeyCommand::Action(InputAction::Jump)));
        assert_eq!(map_key(KeyCode::Esc), Some(KeyCommand::Quit));
        assert_eq!(map_key(KeyCode::Char('x')), None);
    }

    #[tokio::test]
    async fn sink_fails_once_ui_is_gone() {
        let (sink, rx) = TerminalSink::new();
        let target = RenderTarget { user: LOCAL_USER, generation: 1, kind: GameKind::Snake };
        drop(rx);

        let err = sink
            .finish(target, Summary { score: 0, reason: EndReason::Stopped })
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::TargetGone(_)));
    }

    #[test]
    fn final_screen_replaces_controls_with_summary() {
        let mut view = View::new(GameKind::Runner);
        let target = RenderTarget { user: LOCAL_USER, generation: 3, kind: GameKind::Runner };
        view.apply(Screen::Frame(target, Frame { text: "x".into(), controls: vec![Control::Jump] }));
        view.apply(Screen::Final(target, Summary { score: 12, reason: EndReason::Collided }));

        assert!(view.controls.is_empty());
        assert!(view.status.starts_with("Game over! Score: 12"));
        assert_eq!(view.generation, 3);
    }
}
