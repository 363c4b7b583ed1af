use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Receives one notification per successfully written document.
pub trait ProgressSink: Send + Sync {
    /// Called once before the first write.
    fn start(&self, _total: usize) {}

    /// Called after `key` was written.
    fn uploaded(&self, key: &str);

    /// Called when the write of `key` failed and the run stops.
    fn failed(&self, _key: &str) {}

    /// Called once after the run, successful or not.
    fn finish(&self) {}
}

/// Console progress: an `Uploaded: <key>` line on stdout per document, with
/// an optional progress bar on stderr.
pub struct ImportProgress {
    bar: ProgressBar,
    imported: AtomicU64,
    failed: AtomicU64,
    start: Mutex<Instant>,
}

impl ImportProgress {
    pub fn new(show_bar: bool) -> Self {
        let bar = if show_bar {
            let bar = ProgressBar::new(0);
            bar.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}) ETA: {eta}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
            );
            bar
        } else {
            ProgressBar::hidden()
        };

        Self {
            bar,
            imported: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            start: Mutex::new(Instant::now()),
        }
    }

    pub fn imported(&self) -> u64 {
        self.imported.load(Ordering::Relaxed)
    }

    pub fn failed_count(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

impl ProgressSink for ImportProgress {
    fn start(&self, total: usize) {
        *self.start.lock() = Instant::now();
        self.bar.set_length(total as u64);
    }

    fn uploaded(&self, key: &str) {
        self.imported.fetch_add(1, Ordering::Relaxed);
        // Print outside the bar so the line lands on stdout even while it is drawn.
        self.bar.suspend(|| println!("Uploaded: {}", key));
        self.bar.inc(1);
    }

    fn failed(&self, _key: &str) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    fn finish(&self) {
        let imported = self.imported();
        let failed = self.failed_count();
        let elapsed = self.start.lock().elapsed();

        self.bar.finish_with_message(format!(
            "Done! Imported {} documents in {:.1}s ({} failed)",
            imported,
            elapsed.as_secs_f64(),
            failed
        ));
    }
}

/// Keeps progress lines in memory.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    lines: Mutex<Vec<String>>,
    failures: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Uploaded: <key>` lines in the order they were emitted.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn failures(&self) -> Vec<String> {
        self.failures.lock().clone()
    }
}

impl ProgressSink for RecordingProgress {
    fn uploaded(&self, key: &str) {
        self.lines.lock().push(format!("Uploaded: {}", key));
    }

    fn failed(&self, key: &str) {
        self.failures.lock().push(key.to_string());
    }
}
