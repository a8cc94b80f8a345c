//! Pipeline stages: fetch & verify, build, install, verify
//!
//! Each stage is a hard gate: failure aborts the pipeline with no
//! partial-success state exposed to the caller.

pub mod build;
pub mod install;
pub mod source;
pub mod verify;

pub use install::InstalledArtifact;
