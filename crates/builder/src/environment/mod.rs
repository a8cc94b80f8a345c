//! Build environment: scratch layout, environment variables, execution

mod core;
mod execution;
mod variables;

pub use self::core::BuildEnvironment;
pub use execution::ProcessResult;
pub use variables::expand_placeholders;
