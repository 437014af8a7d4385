/// Macro to register games in the catalogue with automatic kind dispatch
///
/// Usage in games/mod.rs:
/// ```ignore
/// register_games! {
///     Snake => {
///         module: snake,
///         types: (SnakeGame, SnakeState, SnakeRenderer),
///         config: snake,
///         id: "snake",
///         name: "Snake",
///         description: "Eat, grow, don't bite yourself",
///         author: "Arcade Team"
///     }
/// }
/// ```
///
/// Generates `GameKind`, the `GameState` snapshot enum and `GameKind::dispatch`,
/// which builds the rules/renderer pair for a kind and hands them to a
/// [`KindVisitor`](crate::games::KindVisitor).
#[macro_export]
macro_rules! register_games {
    (
        $(
            $variant:ident => {
                module: $module:ident,
                types: ($game:ident, $state:ident, $renderer:ident),
                config: $section:ident,
                id: $id:literal,
                name: $name:expr,
                description: $desc:expr,
                author: $author:expr
            }
        ),* $(,)?
    ) => {
        /// Every game the engine can run.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum GameKind {
            $(
                #[serde(rename = $id)]
                $variant,
            )*
        }

        /// Snapshot of a running game's state, tagged by kind.
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(tag = "kind", content = "state")]
        pub enum GameState {
            $(
                #[serde(rename = $id)]
                $variant($crate::games::$module::$state),
            )*
        }

        $(
            impl From<$crate::games::$module::$state> for GameState {
                fn from(state: $crate::games::$module::$state) -> Self {
                    GameState::$variant(state)
                }
            }
        )*

        impl GameState {
            pub fn kind(&self) -> GameKind {
                match self {
                    $( GameState::$variant(_) => GameKind::$variant, )*
                }
            }
        }

        impl GameKind {
            pub const ALL: &'static [GameKind] = &[$( GameKind::$variant ),*];

            pub fn info(self) -> GameInfo {
                match self {
                    $(
                        GameKind::$variant => GameInfo {
                            id: $id,
                            name: $name,
                            description: $desc,
                            author: $author,
                        },
                    )*
                }
            }

            pub fn id(self) -> &'static str {
                self.info().id
            }

            /// Look a game up by its catalogue id.
            pub fn from_id(id: &str) -> Option<GameKind> {
                match id {
                    $( $id => Some(GameKind::$variant), )*
                    _ => None,
                }
            }

            /// Build this kind's rules and renderer from `config` and hand them to `visitor`.
            pub fn dispatch<V: KindVisitor>(
                self,
                config: &$crate::core::config::ArcadeConfig,
                visitor: V,
            ) -> V::Output {
                match self {
                    $(
                        GameKind::$variant => {
                            use $crate::games::$module::{$game, $renderer};
                            visitor.visit($game::new(config.$section.clone()), $renderer)
                        }
                    )*
                }
            }
        }
    };
}
