use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

static QUIET: AtomicBool = AtomicBool::new(false);
static PROGRESS: Mutex<Option<ProgressBar>> = Mutex::new(None);

/// Prints a report line on stdout unless `--quiet` was given.
#[macro_export]
macro_rules! output {
    ($($arg:tt)*) => {
        if !$crate::output::is_quiet() {
            $crate::output::emit(&format!($($arg)*));
        }
    };
}

/// Writes a line above the active progress bar, if any.
pub fn emit(line: &str) {
    match active_bar() {
        Some(pb) => pb.suspend(|| println!("{line}")),
        None => println!("{line}"),
    }
}

fn active_bar() -> Option<ProgressBar> {
    PROGRESS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

fn set_active_bar(pb: Option<ProgressBar>) {
    *PROGRESS.lock().unwrap_or_else(PoisonError::into_inner) = pb;
}

pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

pub fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

pub fn init_logging(debug: bool) {
    let level = if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy(); // Allow overriding with RUST_LOG

    let logger = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .finish();

    // Only fails when a subscriber is already installed, which then keeps logging.
    let _ = tracing::subscriber::set_global_default(logger);
}

pub fn fmt_frame(frame: usize, digits: usize) -> String {
    format!("{:0width$}", frame, width = digits)
}

pub fn fmt_time(time: Duration) -> String {
    let seconds = time.as_secs_f64();
    let hours = (seconds / 3600.0).floor();
    let minutes = ((seconds % 3600.0) / 60.0).floor();
    let secs = seconds % 60.0;
    format!("{:02.0}:{:02.0}:{:06.3}", hours, minutes, secs)
}

#[derive(Debug)]
pub struct Output {
    pub progress_bar: Option<ProgressBar>,
}

impl Output {
    pub fn new(args: &Cli, num_frames: u64) -> Self {
        let progress_bar = if args.no_progress || args.quiet {
            None
        } else {
            Some(ProgressBar::new(num_frames))
        };

        if let Some(pb) = &progress_bar {
            match ProgressStyle::with_template(
                "[{elapsed_precise}] [{wide_bar:.yellow/green}] {percent_precise}% ({pos}/{len})",
            ) {
                Ok(style) => pb.set_style(style.progress_chars("#>-")),
                Err(err) => tracing::warn!(%err, "invalid progress template"),
            }
        }
        set_active_bar(progress_bar.clone());

        Self { progress_bar }
    }

    pub fn inc(&self) {
        if let Some(pb) = &self.progress_bar {
            pb.inc(1);
        }
    }

    pub fn finish(&self) {
        if let Some(pb) = &self.progress_bar {
            pb.finish_and_clear();
            set_active_bar(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn pads_frame_labels() {
        assert_eq!(fmt_frame(42, 5), "00042");
        assert_eq!(fmt_frame(123456, 3), "123456");
    }

    #[test]
    fn formats_times() {
        assert_eq!(fmt_time(Duration::ZERO), "00:00:00.000");
        assert_eq!(fmt_time(Duration::from_millis(3_723_500)), "01:02:03.500");
    }

    #[test]
    fn report_lines_follow_the_active_bar() {
        let args = Cli::try_parse_from(["fallwatch", "-"]).unwrap();
        let output = Output::new(&args, 3);
        assert!(active_bar().is_some());

        output.inc();
        emit("[1] line printed while the bar is drawn");
        output.finish();
        assert!(active_bar().is_none());

        let args = Cli::try_parse_from(["fallwatch", "-", "--no-progress"]).unwrap();
        let output = Output::new(&args, 3);
        assert!(output.progress_bar.is_none());
        assert!(active_bar().is_none());
    }

    #[test]
    fn logging_can_be_initialised_twice() {
        init_logging(false);
        init_logging(true);
    }
}
