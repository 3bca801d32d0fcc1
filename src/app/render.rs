//! Terminal output: notifications, batch progress and report tables.

use std::io::{self, Write};
use std::sync::Mutex;

use console::{style, Emoji, StyledObject};
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Theme;
use crate::domain::{DeliveryOutcome, DeliveryReport, DeliveryStatus, ListSummary, RejectedLine};
use crate::services::{DeliveryObserver, Notification, NotificationLevel, Notifier};

pub static SUCCESS: Emoji = Emoji("✓", "√");
pub static INFO: Emoji = Emoji("ℹ", "i");

/// Highlights `text` in the theme's accent color.
pub fn accent<D>(theme: Theme, text: D) -> StyledObject<D> {
    match theme {
        Theme::Dark => style(text).cyan(),
        Theme::Light => style(text).blue(),
    }
}

/// Prints notifications to the terminal.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleNotifier {
    theme: Theme,
}

impl ConsoleNotifier {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        tracing::debug!(level = ?notification.level, title = %notification.title, "Notification");

        let title = match notification.level {
            NotificationLevel::Success => accent(self.theme, notification.title).bold(),
            NotificationLevel::Warning => style(notification.title).yellow().bold(),
            NotificationLevel::Error => style(notification.title).red().bold(),
        };
        let line = format!(
            "{} {}: {}",
            notification.level.icon(),
            title,
            notification.message
        );

        match notification.level {
            NotificationLevel::Success => println!("{}", line),
            NotificationLevel::Warning | NotificationLevel::Error => eprintln!("{}", line),
        }
    }
}

/// Bar currently drawn on stderr, if any.
static ACTIVE_BAR: Mutex<Option<ProgressBar>> = Mutex::new(None);

fn active_bar() -> Option<ProgressBar> {
    ACTIVE_BAR.lock().unwrap_or_else(|e| e.into_inner()).clone()
}

fn set_active_bar(bar: Option<ProgressBar>) {
    *ACTIVE_BAR.lock().unwrap_or_else(|e| e.into_inner()) = bar;
}

/// Log output for the tracing subscriber. Hides the running progress bar
/// while a line is written so log lines never land inside the bar.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWriter;

/// Builds a [`LogWriter`]; pass to `with_writer`.
pub fn log_writer() -> LogWriter {
    LogWriter
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match active_bar() {
            Some(bar) => bar.suspend(|| io::stderr().write(buf)),
            None => io::stderr().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

/// Shows a progress bar while a batch runs.
pub struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    pub fn new(theme: Theme) -> Self {
        let color = match theme {
            Theme::Dark => "cyan",
            Theme::Light => "blue",
        };
        let template = format!("{{bar:40.{}}} {{pos}}/{{len}} {{msg}}", color);
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(&template).unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar }
    }
}

impl DeliveryObserver for ProgressObserver {
    fn on_started(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_message("Sending...");
        set_active_bar(Some(self.bar.clone()));
    }

    fn on_outcome(&self, _index: usize, outcome: &DeliveryOutcome) {
        self.bar
            .set_message(format!("{} {}", outcome.address, outcome.status.label()));
        self.bar.inc(1);
    }

    fn on_finished(&self, _report: &DeliveryReport) {
        set_active_bar(None);
        self.bar.finish_and_clear();
    }
}

impl Drop for ProgressObserver {
    fn drop(&mut self) {
        set_active_bar(None);
    }
}

/// Formats a report as a two-column table followed by the totals.
pub fn report_table(report: &DeliveryReport) -> String {
    let width = report
        .outcomes()
        .iter()
        .map(|o| o.address.as_str().chars().count())
        .max()
        .unwrap_or(0)
        .max("Email".len());

    let mut out = String::new();
    out.push_str(&format!("{:<width$}  Status\n", "Email", width = width));
    out.push_str(&format!("{}  {}\n", "-".repeat(width), "-".repeat(9)));
    for outcome in report.outcomes() {
        let label = match outcome.status {
            DeliveryStatus::Sent => style(outcome.status.label()).green(),
            DeliveryStatus::Failed => style(outcome.status.label()).red(),
        };
        out.push_str(&format!(
            "{:<width$}  {}\n",
            outcome.address.as_str(),
            label,
            width = width
        ));
    }
    out.push_str(&format!(
        "\nSent: {}  Failed: {}  Total: {}",
        report.sent_count(),
        report.failed_count(),
        report.total()
    ));
    if report.was_cancelled() {
        out.push_str("  (cancelled)");
    }
    out
}

/// Formats saved list names with their sizes.
pub fn list_table(lists: &[ListSummary], theme: Theme) -> String {
    if lists.is_empty() {
        return format!("{}", style("(No saved lists)").dim());
    }
    lists
        .iter()
        .map(|l| format!("  {}  ({} addresses)", accent(theme, &l.name), l.count))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Formats skipped recipient lines.
pub fn rejected_lines(rejected: &[RejectedLine]) -> String {
    rejected
        .iter()
        .map(|r| format!("  line {}: {} ({})", r.line, r.text, r.reason))
        .collect::<Vec<_>>()
        .join("\n")
}
