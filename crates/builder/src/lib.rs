#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Recipe build pipeline for kiln
//!
//! This crate turns a declarative recipe (source URL, checksum, build
//! steps, test steps) into an installed, verified artifact. The pipeline is
//! strictly sequential: fetch & verify, build steps, install, acceptance
//! test, each stage a hard gate.

mod core;
mod environment;
mod pkgconfig;
mod recipe;
mod stages;

pub use self::core::{BuildConfig, BuildContext, BuildReport, Builder};
pub use environment::{expand_placeholders, BuildEnvironment, ProcessResult};
pub use pkgconfig::render_pkg_config;
pub use recipe::{
    parse_recipe_file, parse_recipe_str, Build, BuildStep, Checksum, Command, Dependencies,
    FetchSource, InstallSpec, Metadata, PkgConfigSpec, Recipe, Source, TestExpectation, TestSpec,
};
pub use stages::install::InstalledArtifact;
pub use stages::source::fetch_and_verify;
