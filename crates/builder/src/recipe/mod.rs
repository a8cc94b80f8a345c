//! Recipe model and parser

pub mod model;
pub mod parser;

pub use model::{
    Build, BuildStep, Checksum, Command, Dependencies, FetchSource, InstallSpec, Metadata,
    PkgConfigSpec, Recipe, Source, TestExpectation, TestSpec,
};
pub use parser::{parse_recipe_file, parse_recipe_str};
