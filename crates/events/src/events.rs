//! Domain event types for the kiln pipeline
//!
//! Events are grouped by pipeline stage: download, build, install, verify,
//! plus general operation lifecycle events.

use serde::{Deserialize, Serialize};

/// Top-level application event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event")]
pub enum AppEvent {
    Download(DownloadEvent),
    Build(BuildEvent),
    Install(InstallEvent),
    Verify(VerifyEvent),
    General(GeneralEvent),
}

/// Source download events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DownloadEvent {
    /// Download started
    Started { url: String, total_bytes: Option<u64> },

    /// Download progress update
    Progress { url: String, bytes_downloaded: u64, total_bytes: u64 },

    /// Download completed and checksum verified
    Completed { url: String, bytes_downloaded: u64, hash: String },

    /// Download failed after exhausting retries
    Failed { url: String, error: String },

    /// Retrying a failed download attempt
    Retrying { url: String, attempt: u32, max_attempts: u32 },
}

/// Build executor events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BuildEvent {
    /// Source tree prepared in the scratch directory
    SourceReady { path: String },

    /// Build step launched
    StepStarted { step_index: usize, command: String },

    /// Build step exited successfully
    StepCompleted { step_index: usize },

    /// Build step exited non-zero or timed out
    StepFailed { step_index: usize, exit_code: Option<i32> },
}

/// Artifact installer events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InstallEvent {
    Started { package: String, version: String },

    Completed { package: String, version: String, files_installed: usize },

    Failed { package: String, error: String },
}

/// Post-install verification events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VerifyEvent {
    Started { package: String },

    Completed { package: String, observed: String },

    Failed { package: String, expected: String, actual: String },
}

/// General operation lifecycle events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeneralEvent {
    OperationStarted { operation: String },

    OperationCompleted { operation: String, success: bool },

    Warning { message: String },

    DebugLog { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_roundtrip() {
        let event = AppEvent::Build(BuildEvent::StepFailed {
            step_index: 1,
            exit_code: Some(2),
        });
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"domain\":\"Build\""));
        assert!(json.contains("StepFailed"));
    }
}
