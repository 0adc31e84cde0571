//! Logging utilities with colored output and progress display.
//!
//! This module provides:
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `ProgressLine` for a single-line job counter
//! - `WatchStatus` for watch mode status messages
//!
//! # Example
//!
//! ```ignore
//! // Simple logging
//! log!("build"; "compiling {} files", count);
//!
//! // Progress line for image shrinking
//! let progress = ProgressLine::new("assets", "shrink", 12);
//! progress.inc();
//! progress.finish();
//! ```

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    io::{Write, stdout},
    sync::LazyLock,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Active progress bar count (for log coordination)
static BAR_COUNT: AtomicUsize = AtomicUsize::new(0);

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
///
/// # Usage
/// ```ignore
/// debug!("module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix
#[inline]
#[allow(clippy::cast_possible_truncation)] // Safe: bars count is always small
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);

    let mut stdout = stdout().lock();

    let bar_count = BAR_COUNT.load(Ordering::SeqCst);
    if bar_count > 0 {
        execute!(stdout, cursor::MoveUp(bar_count as u16)).ok();
        execute!(stdout, Clear(ClearType::FromCursorDown)).ok();
    } else {
        execute!(stdout, Clear(ClearType::UntilNewLine)).ok();
    }

    writeln!(stdout, "{prefix} {message}").ok();

    if bar_count > 0 {
        for _ in 0..bar_count {
            writeln!(stdout).ok();
        }
    }

    stdout.flush().ok();
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> String {
    let prefix = format!("[{module}]");
    match module_lower {
        "serve" | "reload" => prefix.bright_blue().bold().to_string(),
        "watch" | "generate" => prefix.bright_green().bold().to_string(),
        "error" => prefix.bright_red().bold().to_string(),
        "skip" => prefix.dimmed().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Watch Status (single-line status with overwrite)
// ============================================================================

/// Get current UTC time formatted as HH:MM:SS
fn now() -> String {
    use std::time::SystemTime;
    let secs = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format_clock(secs)
}

fn format_clock(secs: u64) -> String {
    let hours = (secs / 3600) % 24;
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Single-line status display for watch mode
///
/// Displays status messages that overwrite the previous output,
/// keeping the terminal clean. Supports timestamps and different
/// status types (success, error)
///
/// # Example
///
/// ```ignore
/// let mut status = WatchStatus::new();
/// status.success("styles rebuilt");
/// status.error("failed", "expected \"}\" on line 5");
/// ```
pub struct WatchStatus {
    /// Lines of previous output to clear
    last_lines: usize,
}

/// Global watch status display shared across watch-mode subsystems.
///
/// Template/style/script rebuilds overwrite each other's status block
/// instead of leaving stale error blocks in terminal.
static WATCH_STATUS: LazyLock<Mutex<WatchStatus>> =
    LazyLock::new(|| Mutex::new(WatchStatus::new()));

impl WatchStatus {
    /// Create a new watch status display.
    pub const fn new() -> Self {
        Self { last_lines: 0 }
    }

    /// Display success message (✓ prefix, green).
    pub fn success(&mut self, message: &str) {
        self.display(format!("{}", "✓".green()), message);
    }

    /// Display error message (✗ prefix, red) with optional detail.
    pub fn error(&mut self, summary: &str, detail: &str) {
        let message = if detail.is_empty() {
            summary.to_string()
        } else {
            format!("{summary}\n{detail}")
        };
        self.display(format!("{}", "✗".red()), &message);
    }

    /// Replace the previous status block with this one.
    fn display(&mut self, symbol: String, message: &str) {
        let mut stdout = stdout().lock();

        if self.last_lines > 0 {
            #[allow(clippy::cast_possible_truncation)]
            let lines = self.last_lines as u16;
            execute!(stdout, cursor::MoveUp(lines)).ok();
            execute!(stdout, Clear(ClearType::FromCursorDown)).ok();
        }

        let timestamp = format!("[{}]", now()).dimmed().to_string();
        let line = format!("{timestamp} {symbol} {message}");

        writeln!(stdout, "{line}").ok();
        stdout.flush().ok();

        self.last_lines = message.matches('\n').count() + 1;
    }
}

/// Global watch status: success
pub fn status_success(message: &str) {
    WATCH_STATUS.lock().success(message);
}

/// Global watch status: error
pub fn status_error(summary: &str, detail: &str) {
    WATCH_STATUS.lock().error(summary, detail);
}

// ============================================================================
// Progress Line (single-line counter)
// ============================================================================

/// Single-line counter for a batch of independent jobs.
///
/// Displays `[assets] shrink(42/69)` and redraws in place. Worker threads
/// skip the redraw when another thread holds the display.
///
/// ```ignore
/// let progress = ProgressLine::new("assets", "shrink", 69);
/// progress.inc();
/// progress.finish();
/// ```
pub struct ProgressLine {
    module: &'static str,
    label: &'static str,
    total: usize,
    current: AtomicUsize,
    lock: Mutex<()>,
}

impl ProgressLine {
    pub fn new(module: &'static str, label: &'static str, total: usize) -> Self {
        BAR_COUNT.store(1, Ordering::SeqCst);
        let progress = Self {
            module,
            label,
            total,
            current: AtomicUsize::new(0),
            lock: Mutex::new(()),
        };
        progress.draw(false);
        progress
    }

    #[inline]
    pub fn inc(&self) {
        self.current.fetch_add(1, Ordering::Relaxed);
        if let Some(_guard) = self.lock.try_lock() {
            self.draw(false);
        }
    }

    fn line(&self) -> String {
        format!(
            "{} {}({}/{})",
            colorize_prefix(self.module, &self.module.to_ascii_lowercase()),
            self.label,
            self.current.load(Ordering::Relaxed),
            self.total
        )
    }

    fn draw(&self, keep: bool) {
        let mut stdout = stdout().lock();
        execute!(
            stdout,
            cursor::MoveToColumn(0),
            Clear(ClearType::CurrentLine)
        )
        .ok();
        if keep {
            writeln!(stdout, "{}", self.line()).ok();
        } else {
            write!(stdout, "{}", self.line()).ok();
        }
        stdout.flush().ok();
    }

    /// Print the final count and leave the line in place.
    pub fn finish(self) {
        BAR_COUNT.store(0, Ordering::SeqCst);
        {
            let _guard = self.lock.lock();
            self.draw(true);
        }
        // skip the clearing Drop
        std::mem::forget(self);
    }
}

impl Drop for ProgressLine {
    fn drop(&mut self) {
        BAR_COUNT.store(0, Ordering::SeqCst);
        let mut stdout = stdout().lock();
        execute!(
            stdout,
            cursor::MoveToColumn(0),
            Clear(ClearType::CurrentLine)
        )
        .ok();
        stdout.flush().ok();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_status_starts_empty() {
        assert_eq!(WatchStatus::new().last_lines, 0);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00:00");
        assert_eq!(format_clock(3600 * 25 + 61), "01:01:01");
    }

    #[test]
    fn test_colorize_prefix_keeps_module_name() {
        assert!(colorize_prefix("serve", "serve").contains("[serve]"));
        assert!(colorize_prefix("Style", "style").contains("[Style]"));
    }

    #[test]
    fn test_progress_line_counts() {
        let progress = ProgressLine::new("assets", "shrink", 2);
        progress.inc();
        progress.inc();
        assert!(progress.line().contains("shrink(2/2)"));
        progress.finish();
    }
}
