/// Text renderer for the snake board
use crate::core::renderer::{Control, Renderer};
use crate::games::snake::SnakeState;

const SNAKE: &str = "🟩";
const FOOD: &str = "🟥";
const EMPTY: &str = "⬜";

#[derive(Debug, Default, Clone, Copy)]
pub struct SnakeRenderer;

impl Renderer<SnakeState> for SnakeRenderer {
    fn render(&self, state: &SnakeState) -> String {
        let mut out = format!("Score: {}\n", state.score);
        for row in 0..state.size as i32 {
            for col in 0..state.size as i32 {
                let cell = (row, col);
                let glyph = if state.occupies(cell) {
                    SNAKE
                } else if cell == state.food {
                    FOOD
                } else {
                    EMPTY
                };
                out.push_str(glyph);
            }
            out.push('\n');
        }
        out
    }

    fn controls(&self, _state: &SnakeState) -> Vec<Control> {
        vec![Control::Up, Control::Left, Control::Down, Control::Right, Control::Stop]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::game::Direction;
    use std::collections::VecDeque;

    #[test]
    fn draws_snake_and_food() {
        let state = SnakeState {
            size: 3,
            snake: VecDeque::from([(1, 1), (1, 0)]),
            direction: Direction::RIGHT,
            food: (0, 2),
            pending_direction: None,
            score: 10,
        };

        let text = SnakeRenderer.render(&state);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Score: 10");
        assert_eq!(lines[1], "⬜⬜🟥");
        assert_eq!(lines[2], "🟩🟩⬜");
        assert_eq!(lines[3], "⬜⬜⬜");
    }
}
