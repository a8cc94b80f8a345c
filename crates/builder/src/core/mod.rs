//! Build orchestration

pub mod builder;
pub mod config;
pub mod context;

pub use builder::{BuildReport, Builder};
pub use config::BuildConfig;
pub use context::BuildContext;
