//! Library-build orchestration

pub mod builder;
pub mod carryover;
pub mod config;
pub mod pipeline;

pub use builder::build_index;
pub use carryover::carry_over_player_state;
pub use config::BuildConfig;
pub use pipeline::{BuildPipeline, BuildReport};
