//! Download progress bar.

use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";
const SPINNER_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] {bytes} ({bytes_per_sec})";

/// Terminal progress for one or more consecutive downloads.
///
/// Shows a bar when the server sent a length and a spinner otherwise.
pub struct DownloadProgress {
    bar: ProgressBar,
    bar_style: ProgressStyle,
    spinner_style: ProgressStyle,
    /// Last `(done, total)` seen, `None` before the first report.
    last: Mutex<Option<(u64, Option<u64>)>>,
}

impl DownloadProgress {
    pub fn new() -> Self {
        Self::with_bar(ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr()))
    }

    #[cfg(test)]
    fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden())
    }

    fn with_bar(bar: ProgressBar) -> Self {
        let bar_style = ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        let spinner_style = ProgressStyle::with_template(SPINNER_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(spinner_style.clone());
        Self {
            bar,
            bar_style,
            spinner_style,
            last: Mutex::new(None),
        }
    }

    /// Update from the downloader's `(bytes_so_far, total_bytes)` report.
    ///
    /// Counts grow strictly within one download, so a report that does not
    /// continue the previous one starts a fresh bar.
    pub fn report(&self, done: u64, total: Option<u64>) {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        if starts_new_download(*last, done, total) {
            self.start(total);
        }
        *last = Some((done, total));
        self.bar.set_position(done);
    }

    fn start(&self, total: Option<u64>) {
        self.bar.reset();
        match total {
            Some(total) => {
                self.bar.set_style(self.bar_style.clone());
                self.bar.set_length(total);
            }
            None => {
                self.bar.set_style(self.spinner_style.clone());
                self.bar.unset_length();
            }
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    #[cfg(test)]
    fn position(&self) -> (u64, Option<u64>) {
        (self.bar.position(), self.bar.length())
    }
}

fn starts_new_download(last: Option<(u64, Option<u64>)>, done: u64, total: Option<u64>) -> bool {
    match last {
        None => true,
        Some((last_done, last_total)) => {
            last_total != total
                || done <= last_done
                || last_total.is_some_and(|t| last_done >= t)
        }
    }
}
