//! Build context for one pipeline run

use kiln_events::{EventEmitter, EventSender};
use std::path::PathBuf;

/// Build context for one pipeline run
#[derive(Clone, Debug)]
pub struct BuildContext {
    /// Package name
    pub name: String,
    /// Package version
    pub version: String,
    /// Recipe file path
    pub recipe_path: PathBuf,
    /// Install prefix, exclusive to this run until completion
    pub prefix: PathBuf,
    /// Event sender for progress reporting
    pub event_sender: Option<EventSender>,
}

impl EventEmitter for BuildContext {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

impl BuildContext {
    /// Create a new build context
    #[must_use]
    pub fn new(name: String, version: String, recipe_path: PathBuf, prefix: PathBuf) -> Self {
        Self {
            name,
            version,
            recipe_path,
            prefix,
            event_sender: None,
        }
    }

    /// Set event sender
    #[must_use]
    pub fn with_event_sender(mut self, event_sender: EventSender) -> Self {
        self.event_sender = Some(event_sender);
        self
    }
}
