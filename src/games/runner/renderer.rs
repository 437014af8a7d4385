/// Text renderer for the runner lanes
use crate::core::renderer::{Control, Renderer};
use crate::games::runner::game::{ObstacleKind, RunnerState, FIELD_HEIGHT, FIELD_WIDTH, RUNNER_COL};

const RUNNER: &str = "🦖";
const CACTUS: &str = "🌵";
const BIRD: &str = "🐦";
const EMPTY: &str = "⬜";
const GROUND: &str = "_";

#[derive(Debug, Default, Clone, Copy)]
pub struct RunnerRenderer;

impl Renderer<RunnerState> for RunnerRenderer {
    fn render(&self, state: &RunnerState) -> String {
        let mut out = format!("Score: {}\n", state.score);
        for row in 0..FIELD_HEIGHT {
            for col in 0..FIELD_WIDTH as i32 {
                // runner wins the cell on the frame it gets hit
                let glyph = if row == state.runner_row && col == RUNNER_COL {
                    RUNNER
                } else {
                    match state.obstacle_at(row, col).map(|o| o.kind) {
                        Some(ObstacleKind::Ground) => CACTUS,
                        Some(ObstacleKind::Air) => BIRD,
                        None => EMPTY,
                    }
                };
                out.push_str(glyph);
            }
            out.push('\n');
        }
        out.push_str(&GROUND.repeat(FIELD_WIDTH));
        out
    }

    fn controls(&self, _state: &RunnerState) -> Vec<Control> {
        vec![Control::Jump, Control::Stop]
    }
}
