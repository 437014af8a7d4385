pub mod config;
pub mod error;
pub mod game;
pub mod registry;
pub mod renderer; // output seam + per-kind text strategies
