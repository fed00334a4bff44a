//! Terminal output helpers for the CLI
//!
//! Styled output on a TTY, plain bracketed markers in CI and pipes.

mod context;
mod output;

pub use context::UiContext;
pub use output::{key_value, key_value_status, section, step_ok, step_ok_detail, step_warn_hint};
