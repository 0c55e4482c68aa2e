//! Progress display module
//!
//! Styled status lines, the generation progress bar and the sink the engine
//! reports to after every batch.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Print the application banner
pub fn print_banner() {
    let banner = r#"
╔══════════════════════════════════════════════════════════════════╗
║                                                                  ║
║   ██████╗ ██╗    ██╗ ██████╗ ███████╗███╗   ██╗                  ║
║   ██╔══██╗██║    ██║██╔════╝ ██╔════╝████╗  ██║                  ║
║   ██████╔╝██║ █╗ ██║██║  ███╗█████╗  ██╔██╗ ██║                  ║
║   ██╔═══╝ ██║███╗██║██║   ██║██╔══╝  ██║╚██╗██║                  ║
║   ██║     ╚███╔███╔╝╚██████╔╝███████╗██║ ╚████║                  ║
║   ╚═╝      ╚══╝╚══╝  ╚═════╝ ╚══════╝╚═╝  ╚═══╝                  ║
║                                                                  ║
║              Rule-Based Password Candidate Generator             ║
║                     For Penetration Testing                      ║
║                                                  v1.0.0          ║
╚══════════════════════════════════════════════════════════════════╝
"#;

    println!("{}", banner.green());
}

/// Print a section header
pub fn print_header(text: &str) {
    println!("\n{} {}", "▶".green(), text.green().bold());
}

/// Print an info message
pub fn print_info(text: &str) {
    println!("  {} {}", "ℹ".cyan(), text);
}

/// Print a success message
pub fn print_success(text: &str) {
    println!("  {} {}", "✔".green(), text.green());
}

/// Print a warning message
pub fn print_warning(text: &str) {
    println!("  {} {}", "⚠".yellow(), text.yellow());
}

/// Print an error message
pub fn print_error(text: &str) {
    eprintln!("  {} {}", "✖".red(), text.red());
}

/// Print a bullet point
pub fn print_bullet(text: &str) {
    println!("  {} {}", "•".green(), text);
}

/// Snapshot of a generation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub seeds_done: u64,
    pub seeds_total: u64,
    pub emitted: u64,
    pub rejected: u64,
}

impl Progress {
    /// Completed share of the seed list (0.0 - 100.0)
    pub fn percent(&self) -> f64 {
        if self.seeds_total == 0 {
            100.0
        } else {
            self.seeds_done as f64 / self.seeds_total as f64 * 100.0
        }
    }
}

/// Receiver for progress snapshots
pub trait ProgressSink: Send + Sync {
    /// Called after every batch flush
    fn report(&self, progress: &Progress);

    /// Called once when the run ends
    fn finish(&self, progress: &Progress) {
        self.report(progress);
    }
}

/// Sink that ignores everything (quiet mode, stdout mode, tests)
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _progress: &Progress) {}
}

impl ProgressSink for ProgressBar {
    fn report(&self, progress: &Progress) {
        self.set_position(progress.seeds_done);
        let rejected = if progress.rejected > 0 {
            format!(", {} rejected", format_number(progress.rejected))
        } else {
            String::new()
        };
        self.set_message(format!("{} generated{}", format_number(progress.emitted), rejected));
    }

    fn finish(&self, progress: &Progress) {
        self.report(progress);
        self.finish_with_message(
            format!("{} generated", format_number(progress.emitted))
                .green()
                .to_string(),
        );
    }
}

/// Create a styled progress bar over the seed list
pub fn create_progress_bar(total: u64, msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);

    // the template is a literal; fall back to the default style if it ever stops parsing
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.green/dim}] {pos}/{len} seeds ({percent}%) {msg}")
        .map(|s| s.progress_chars("█▓░"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);

    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));

    pb
}

/// Format a number with thousand separators
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, d) in digits.char_indices() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(d);
    }

    out
}

/// Format duration as human-readable string
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();

    if secs < 60 {
        format!("{:.1}s", duration.as_secs_f64())
    } else if secs < 3600 {
        let mins = secs / 60;
        let secs = secs % 60;
        format!("{}m {}s", mins, secs)
    } else {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        format!("{}h {}m", hours, mins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(123), "123");
        assert_eq!(format_number(1234), "1,234");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(30)), "30.0s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_secs(3661)), "1h 1m");
    }

    #[test]
    fn test_progress_percent() {
        let p = Progress {
            seeds_done: 1,
            seeds_total: 4,
            ..Default::default()
        };
        assert_eq!(p.percent(), 25.0);
        assert_eq!(Progress::default().percent(), 100.0);
    }

    #[test]
    fn test_hidden_bar_accepts_reports() {
        let pb = ProgressBar::hidden();
        pb.set_length(10);
        let p = Progress {
            seeds_done: 3,
            seeds_total: 10,
            emitted: 42,
            rejected: 1,
        };
        pb.report(&p);
        assert_eq!(pb.position(), 3);
        ProgressSink::finish(&pb, &p);
        assert!(pb.is_finished());
    }
}
