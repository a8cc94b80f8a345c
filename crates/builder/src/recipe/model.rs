//! Recipe data structures
//!
//! A recipe is a declarative YAML document describing how to fetch, build,
//! install, and verify one software artifact. It is parsed once per
//! invocation and read-only thereafter.

use kiln_errors::{Error, RecipeError};
use kiln_hash::{ContentHash, HashAlgorithm};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Complete recipe structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    /// Package metadata (required)
    pub metadata: Metadata,

    /// Source acquisition (required)
    pub source: Source,

    /// Build stage (required)
    pub build: Build,

    /// Installation behavior (optional)
    #[serde(default)]
    pub install: InstallSpec,

    /// Post-install smoke test (optional)
    #[serde(default)]
    pub test: Option<TestSpec>,
}

/// Package metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    pub version: String,
    pub description: String,

    #[serde(default)]
    pub homepage: Option<String>,

    #[serde(default)]
    pub license: Option<String>,

    #[serde(default)]
    pub dependencies: Dependencies,
}

/// Dependency declarations
///
/// Build-time dependencies are carried as metadata and surfaced by `check`;
/// resolving them across formulas is out of scope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dependencies {
    #[serde(default)]
    pub build: Vec<String>,
}

/// Source acquisition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub fetch: FetchSource,
}

/// Fetch source specification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchSource {
    pub url: String,
    pub checksum: Checksum,
}

/// Declared content checksum
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Checksum {
    Blake3 { blake3: String },
    Sha256 { sha256: String },
}

impl Checksum {
    /// The digest algorithm this checksum declares
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        match self {
            Checksum::Blake3 { .. } => HashAlgorithm::Blake3,
            Checksum::Sha256 { .. } => HashAlgorithm::Sha256,
        }
    }

    /// Parse the declared hex digest into a hash value
    ///
    /// # Errors
    ///
    /// Returns an error if the digest is not 64 hex characters.
    pub fn parse(&self) -> Result<ContentHash, Error> {
        let hex = match self {
            Checksum::Blake3 { blake3 } => blake3,
            Checksum::Sha256 { sha256 } => sha256,
        };
        ContentHash::from_hex(self.algorithm(), hex)
    }
}

/// Build stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Build {
    /// Environment variables for every build step
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Ordered build steps, executed sequentially
    pub steps: Vec<BuildStep>,
}

/// Individual build step
///
/// Steps are structured program+args values, never shell strings. `${VAR}`
/// placeholders in arguments are resolved against the build environment at
/// execution time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BuildStep {
    Run { run: Command },
    Configure { configure: Vec<String> },
    Make { make: Vec<String> },
}

impl BuildStep {
    /// The program and arguments this step invokes
    #[must_use]
    pub fn command(&self) -> (String, Vec<String>) {
        match self {
            BuildStep::Run { run } => (run.program.clone(), run.args.clone()),
            BuildStep::Configure { configure } => ("./configure".to_string(), configure.clone()),
            BuildStep::Make { make } => ("make".to_string(), make.clone()),
        }
    }

    /// Render the step for progress display
    #[must_use]
    pub fn display(&self) -> String {
        let (program, args) = self.command();
        if args.is_empty() {
            program
        } else {
            format!("{program} {}", args.join(" "))
        }
    }
}

/// An external command invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Command {
    pub program: String,

    #[serde(default)]
    pub args: Vec<String>,
}

/// Installation behavior
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallSpec {
    /// Generate a pkg-config descriptor under `lib/pkgconfig/`
    #[serde(default)]
    pub pkgconfig: Option<PkgConfigSpec>,
}

/// pkg-config descriptor template inputs
///
/// `Name` and `Version` always come from the recipe metadata; the remaining
/// keys are declared here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PkgConfigSpec {
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub libs: Vec<String>,

    #[serde(default)]
    pub cflags: Vec<String>,

    #[serde(default)]
    pub requires: Vec<String>,

    #[serde(default)]
    pub conflicts: Vec<String>,
}

/// Post-install smoke test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSpec {
    /// C source of the consumer program
    pub program: String,

    /// Fixture file copied into the test directory, relative to the recipe
    #[serde(default)]
    pub fixture: Option<String>,

    /// Arguments passed to the compiled consumer
    #[serde(default)]
    pub args: Vec<String>,

    /// Extra linker flags (e.g. `-lmad`)
    #[serde(default)]
    pub libs: Vec<String>,

    /// Expected observable property of the run
    pub expect: TestExpectation,
}

/// Literal expected value compared against the observed test result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TestExpectation {
    /// Exact byte size of an output file produced by the consumer
    FileSize { file: String, size: u64 },

    /// Exact byte length of captured stdout
    OutputSize { size: u64 },

    /// Exact stdout contents
    Output { output: String },
}

impl TestExpectation {
    /// Render the expectation for diagnostics
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            TestExpectation::FileSize { file, size } => format!("{file} is {size} bytes"),
            TestExpectation::OutputSize { size } => format!("stdout is {size} bytes"),
            TestExpectation::Output { output } => format!("stdout equals {output:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_algorithm() {
        let sha = Checksum::Sha256 {
            sha256: "00".repeat(32),
        };
        assert_eq!(sha.algorithm(), HashAlgorithm::Sha256);
        assert!(sha.parse().is_ok());

        let bad = Checksum::Blake3 {
            blake3: "nothex".into(),
        };
        assert!(matches!(
            bad.parse(),
            Err(Error::Recipe(RecipeError::InvalidChecksum { .. }))
        ));
    }

    #[test]
    fn test_step_command_forms() {
        let step = BuildStep::Configure {
            configure: vec!["--disable-debugging".into()],
        };
        let (program, args) = step.command();
        assert_eq!(program, "./configure");
        assert_eq!(args, vec!["--disable-debugging".to_string()]);
        assert_eq!(step.display(), "./configure --disable-debugging");
    }

    #[test]
    fn test_expectation_untagged_order() {
        // A file expectation must not be swallowed by the stdout-size form
        let yaml = "file: out.wav\nsize: 4608\n";
        let expect: TestExpectation = serde_yml::from_str(yaml).unwrap();
        assert!(matches!(
            expect,
            TestExpectation::FileSize { ref file, size: 4608 } if file == "out.wav"
        ));

        let yaml = "size: 4608\n";
        let expect: TestExpectation = serde_yml::from_str(yaml).unwrap();
        assert!(matches!(expect, TestExpectation::OutputSize { size: 4608 }));
    }
}
