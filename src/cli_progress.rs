/*!
 * Console progress for bulk downloads
 *
 * Implements [`BulkObserver`] with either an indicatif bar or, when bars are
 * turned off (logs, pipes), plain text lines:
 *
 * ```text
 * Download: Wrote out/2024/a.txt   1.00 KB
 * Progress: [==========          ]  50%   1.00 KB of 2.00 KB
 * ```
 */

use crate::cli_style::{bulk_summary_table, format_bytes, format_duration, print_warning, Theme};
use crate::core::{BulkDownloadReport, BulkObserver, BulkProgress, DownloadJob, DownloadPlan};
use crate::error::PullError;
use indicatif::{ProgressBar, ProgressStyle};

/// Width of the text progress bar, in characters
const TEXT_BAR_WIDTH: usize = 50;

/// Prints per-file lines and a progress bar for a bulk download
pub struct ConsoleProgress {
    bar: Option<ProgressBar>,
    use_bar: bool,
}

impl ConsoleProgress {
    /// `use_bar` selects the indicatif bar over plain text lines
    pub fn new(use_bar: bool) -> Self {
        Self { bar: None, use_bar }
    }

    fn line(&self, text: String) {
        match &self.bar {
            Some(bar) => bar.println(text),
            None => println!("{}", text),
        }
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("Progress: [{bar:50.cyan}] {percent:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ")
    }
}

impl BulkObserver for ConsoleProgress {
    fn listing_page(&mut self, entries_so_far: usize) {
        println!(
            "performing additional request... (got {} files so far)",
            entries_so_far
        );
    }

    fn planned(&mut self, plan: &DownloadPlan) {
        println!(
            "{} {} files, {} to download",
            Theme::header("Downloading:"),
            plan.len(),
            format_bytes(plan.total_bytes)
        );

        if self.use_bar && !plan.is_empty() {
            let bar = ProgressBar::new(plan.len() as u64);
            bar.set_style(Self::bar_style());
            bar.set_message(format!("{} of {}", format_bytes(0), format_bytes(plan.total_bytes)));
            self.bar = Some(bar);
        }
    }

    fn file_finished(
        &mut self,
        job: &DownloadJob,
        error: Option<&PullError>,
        progress: &BulkProgress,
    ) {
        match error {
            None => self.line(format!(
                "Download: Wrote {:<60} {:>10}",
                job.local_path.display(),
                format_bytes(job.bytes_written)
            )),
            Some(e) => self.line(format!(
                "{} {}: {}",
                Theme::error("Download: Failed"),
                job.key,
                e
            )),
        }

        match &self.bar {
            Some(bar) => {
                bar.set_position(progress.completed_files as u64);
                bar.set_message(format!(
                    "{} of {}",
                    format_bytes(progress.bytes_done),
                    format_bytes(progress.total_bytes)
                ));
            }
            None => println!("{}", render_progress_line(progress, TEXT_BAR_WIDTH)),
        }
    }

    fn finished(&mut self, report: &BulkDownloadReport) {
        if let Some(bar) = self.bar.take() {
            bar.finish();
        }

        println!(
            "Downloaded in: {}",
            format_duration(report.elapsed.as_secs_f64())
        );
        println!("{}", bulk_summary_table(report));

        for failure in &report.failures {
            print_warning(&format!("{}: {}", failure.key, failure.error));
        }
        println!();
    }
}

/// Text progress line drawn with `=` characters
pub fn render_progress_line(progress: &BulkProgress, width: usize) -> String {
    let percent = progress.percent().min(100) as usize;
    let filled = percent * width / 100;

    format!(
        "Progress: [{}{}] {:>3}% {:>10} of {}",
        "=".repeat(filled),
        " ".repeat(width - filled),
        percent,
        format_bytes(progress.bytes_done),
        format_bytes(progress.total_bytes)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_progress_line() {
        let progress = BulkProgress {
            total_files: 4,
            completed_files: 2,
            failed_files: 0,
            bytes_done: 1024,
            total_bytes: 2048,
        };

        let line = render_progress_line(&progress, 10);
        assert_eq!(line, "Progress: [=====     ]  50%    1.00 KB of 2.00 KB");
    }

    #[test]
    fn test_render_complete_and_empty() {
        let done = BulkProgress {
            total_files: 3,
            completed_files: 3,
            failed_files: 1,
            bytes_done: 10,
            total_bytes: 15,
        };
        assert!(render_progress_line(&done, 4).starts_with("Progress: [====] 100%"));

        let empty = BulkProgress::default();
        assert!(render_progress_line(&empty, 4).starts_with("Progress: [====] 100%"));
    }

    #[test]
    fn test_observer_without_bar() {
        let mut observer = ConsoleProgress::new(false);
        observer.planned(&DownloadPlan::default());
        assert!(observer.bar.is_none());
    }
}
