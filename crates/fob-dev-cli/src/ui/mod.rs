//! Terminal output helpers.
//!
//! Status messages go to stderr so `monitor` output on stdout stays
//! pipeable.
//!
//! ```no_run
//! use fob_dev_cli::ui;
//!
//! ui::init_colors(false);
//! ui::success("Server started");
//! ui::warning("Build output directory does not exist yet");
//! ```

mod format;
mod messages;

use std::sync::atomic::{AtomicBool, Ordering};

pub use format::format_duration;
pub use messages::{info, success, warning};

static COLORS: AtomicBool = AtomicBool::new(true);

/// Check if color output should be enabled.
///
/// Respects NO_COLOR and FORCE_COLOR, then falls back to terminal detection.
pub fn should_use_color() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }
    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }
    console::user_attended_stderr()
}

/// Initialize color support for this process.
///
/// `no_color` (the `--no-color` flag) disables colors regardless of the
/// environment.
pub fn init_colors(no_color: bool) {
    let enabled = !no_color && should_use_color();
    COLORS.store(enabled, Ordering::Relaxed);
    console::set_colors_enabled(enabled);
    console::set_colors_enabled_stderr(enabled);
}

/// Whether messages are colored.
pub fn colors_enabled() -> bool {
    COLORS.load(Ordering::Relaxed)
}
