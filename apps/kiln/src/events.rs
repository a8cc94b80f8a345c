//! Event handling and progress display

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use kiln_events::{AppEvent, BuildEvent, DownloadEvent, GeneralEvent, InstallEvent, VerifyEvent};
use std::collections::HashMap;

/// Event handler for progress display and user feedback
pub struct EventHandler {
    /// Multi-progress manager for concurrent progress bars
    multi_progress: MultiProgress,
    /// Active download bars by URL
    download_bars: HashMap<String, ProgressBar>,
    /// Show DebugLog events
    debug: bool,
}

impl EventHandler {
    pub fn new(debug: bool) -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            download_bars: HashMap::new(),
            debug,
        }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Download(event) => self.handle_download(event),
            AppEvent::Build(event) => self.handle_build(event),
            AppEvent::Install(event) => self.handle_install(event),
            AppEvent::Verify(event) => self.handle_verify(event),
            AppEvent::General(event) => self.handle_general(event),
        }
    }

    fn handle_download(&mut self, event: DownloadEvent) {
        match event {
            DownloadEvent::Started { url, total_bytes } => {
                let filename = url.split('/').next_back().unwrap_or(&url);

                let pb = if let Some(total) = total_bytes {
                    ProgressBar::new(total)
                } else {
                    ProgressBar::new_spinner()
                };
                pb.set_style(
                    ProgressStyle::default_bar()
                        .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} {msg}")
                        .unwrap()
                        .progress_chars("#>-"),
                );
                pb.set_message(format!("Downloading {filename}"));

                let pb = self.multi_progress.add(pb);
                self.download_bars.insert(url, pb);
            }
            DownloadEvent::Progress {
                url,
                bytes_downloaded,
                total_bytes,
            } => {
                if let Some(pb) = self.download_bars.get(&url) {
                    pb.set_length(total_bytes);
                    pb.set_position(bytes_downloaded);
                }
            }
            DownloadEvent::Completed { url, .. } => {
                if let Some(pb) = self.download_bars.remove(&url) {
                    pb.finish_with_message("Downloaded");
                }
            }
            DownloadEvent::Failed { url, error } => {
                if let Some(pb) = self.download_bars.remove(&url) {
                    pb.finish_with_message(format!("Failed: {error}"));
                }
            }
            DownloadEvent::Retrying {
                url,
                attempt,
                max_attempts,
            } => {
                self.show_status(&format!(
                    "🔁 Retrying download ({attempt}/{max_attempts}): {url}"
                ));
            }
        }
    }

    fn handle_build(&mut self, event: BuildEvent) {
        match event {
            BuildEvent::SourceReady { path } => {
                self.show_status(&format!("📦 Source ready at {path}"));
            }
            BuildEvent::StepStarted {
                step_index,
                command,
            } => {
                self.show_status(&format!("🔧 Step {step_index}: {command}"));
            }
            BuildEvent::StepCompleted { step_index } => {
                self.show_status(&format!("✅ Step {step_index} completed"));
            }
            BuildEvent::StepFailed {
                step_index,
                exit_code,
            } => {
                self.show_error(&format!(
                    "❌ Step {step_index} failed (exit code {exit_code:?})"
                ));
            }
        }
    }

    fn handle_install(&mut self, event: InstallEvent) {
        match event {
            InstallEvent::Started { package, version } => {
                self.show_status(&format!("📦 Installing {package} {version}"));
            }
            InstallEvent::Completed {
                package,
                version,
                files_installed,
            } => {
                self.show_status(&format!(
                    "✅ Installed {package} {version} ({files_installed} files)"
                ));
            }
            InstallEvent::Failed { package, error } => {
                self.show_error(&format!("❌ Install failed for {package}: {error}"));
            }
        }
    }

    fn handle_verify(&mut self, event: VerifyEvent) {
        match event {
            VerifyEvent::Started { package } => {
                self.show_status(&format!("🔍 Verifying {package}"));
            }
            VerifyEvent::Completed { package, observed } => {
                self.show_status(&format!("✅ Verified {package}: {observed}"));
            }
            VerifyEvent::Failed {
                package,
                expected,
                actual,
            } => {
                self.show_error(&format!(
                    "❌ Verification failed for {package}: expected {expected}, got {actual}"
                ));
            }
        }
    }

    fn handle_general(&mut self, event: GeneralEvent) {
        match event {
            GeneralEvent::OperationStarted { operation } => {
                self.show_status(&format!("🔄 {operation}"));
            }
            GeneralEvent::OperationCompleted { operation, success } => {
                if success {
                    self.show_status(&format!("✅ {operation}"));
                } else {
                    self.show_error(&format!("❌ {operation} failed"));
                }
            }
            GeneralEvent::Warning { message } => {
                self.show_status(&format!("⚠️  {message}"));
            }
            GeneralEvent::DebugLog { message } => {
                if self.debug {
                    self.show_status(&format!("🐛 {message}"));
                }
            }
        }
    }

    /// Show status message without interfering with progress bars
    fn show_status(&self, message: &str) {
        self.multi_progress.println(message).unwrap_or(());
    }

    fn show_error(&self, message: &str) {
        self.multi_progress.println(message).unwrap_or(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_handler_creation() {
        let mut handler = EventHandler::new(false);

        handler.handle_event(AppEvent::General(GeneralEvent::OperationStarted {
            operation: "Building mad 0.15.1b".to_string(),
        }));
        handler.handle_event(AppEvent::Build(BuildEvent::StepStarted {
            step_index: 0,
            command: "./configure --prefix=/opt/out".to_string(),
        }));
    }

    #[test]
    fn test_download_bar_lifecycle() {
        let mut handler = EventHandler::new(false);
        let url = "https://example.com/mad-0.15.1b.tar.gz";

        handler.handle_event(AppEvent::Download(DownloadEvent::Started {
            url: url.to_string(),
            total_bytes: Some(1024),
        }));
        assert!(handler.download_bars.contains_key(url));

        handler.handle_event(AppEvent::Download(DownloadEvent::Progress {
            url: url.to_string(),
            bytes_downloaded: 512,
            total_bytes: 1024,
        }));

        handler.handle_event(AppEvent::Download(DownloadEvent::Completed {
            url: url.to_string(),
            bytes_downloaded: 1024,
            hash: "sha256:abcd".to_string(),
        }));
        assert!(!handler.download_bars.contains_key(url));
    }
}
