//! Terminal spinner shown while the export runs
//!
//! The spinner lives in its own task and only stops when the token handed to
//! it at startup is cancelled.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Frames, followed by the frame shown once finished
const TICK_STRINGS: &[&str] = &["|", "/", "-", "\\", ""];

pub struct Spinner {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Spinner {
    /// Start spinning with `message` in a background task
    pub fn start(message: &'static str) -> Self {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(spin(message, cancel.clone()));
        Self { cancel, handle }
    }

    /// Cancel the spinner and wait for it to draw its final line
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            debug!(error = %e, "Spinner task ended abnormally");
        }
    }
}

async fn spin(message: &'static str, cancel: CancellationToken) {
    let style = ProgressStyle::with_template("{msg} {spinner}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(TICK_STRINGS);

    let pb = ProgressBar::new_spinner();
    pb.set_style(style);
    pb.set_message(message);

    let mut ticker = tokio::time::interval(TICK_INTERVAL);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => pb.tick(),
        }
    }

    pb.finish_with_message("Done!");
}
