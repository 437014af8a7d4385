pub mod macros;
pub mod runner;
pub mod snake;

use std::fmt;
use std::str::FromStr;

use crate::core::game::GameRules;
use crate::core::renderer::Renderer;
use crate::register_games;

/// Metadata about a game
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub author: &'static str,
}

/// Receives the concrete rules/renderer pair for a [`GameKind`].
///
/// Lets callers stay generic over the game while picking it at runtime.
pub trait KindVisitor {
    type Output;

    fn visit<G, R>(self, rules: G, renderer: R) -> Self::Output
    where
        G: GameRules,
        R: Renderer<G::State>;
}

// Register all games here - developers only need to add a new entry
register_games! {
    Snake => {
        module: snake,
        types: (SnakeGame, SnakeState, SnakeRenderer),
        config: snake,
        id: "snake",
        name: "🐍 Snake",
        description: "Steer the snake to the food with the arrows, avoid walls and your own tail",
        author: "Arcade Team"
    },
    Runner => {
        module: runner,
        types: (RunnerGame, RunnerState, RunnerRenderer),
        config: runner,
        id: "runner",
        name: "🦖 Runner",
        description: "Jump over cacti, duck under birds, survive as the pace picks up",
        author: "Arcade Team"
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for GameKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameKind::from_id(s.trim()).ok_or_else(|| format!("unknown game '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ArcadeConfig;

    struct KindOf;

    impl KindVisitor for KindOf {
        type Output = GameKind;

        fn visit<G, R>(self, _rules: G, _renderer: R) -> GameKind
        where
            G: GameRules,
            R: Renderer<G::State>,
        {
            G::KIND
        }
    }

    #[test]
    fn catalogue_round_trips_ids() {
        for &kind in GameKind::ALL {
            assert_eq!(kind.id().parse::<GameKind>(), Ok(kind));
        }
        assert!("tic_tac_toe".parse::<GameKind>().is_err());
    }

    #[test]
    fn dispatch_picks_matching_rules() {
        let config = ArcadeConfig::default();
        for &kind in GameKind::ALL {
            assert_eq!(kind.dispatch(&config, KindOf), kind);
        }
    }

    #[test]
    fn kind_serializes_as_id() {
        assert_eq!(serde_json::to_string(&GameKind::Runner).unwrap(), "\"runner\"");
        let kind: GameKind = serde_json::from_str("\"snake\"").unwrap();
        assert_eq!(kind, GameKind::Snake);
    }
}
