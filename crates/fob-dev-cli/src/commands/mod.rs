//! Command implementations for `fob-dev`.
//!
//! - [`serve`] - Run the dev server
//! - [`monitor`] - Follow a running server's dashboard channels
//! - [`check`] - Configuration validation

pub mod check;
pub mod monitor;
pub mod serve;
pub(crate) mod utils;

pub use check::execute as check_execute;
pub use monitor::execute as monitor_execute;
pub use serve::execute as serve_execute;
