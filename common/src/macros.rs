//! Status macros layered on top of `tracing`.
//!
//! The CLI formatter renders events emitted under these targets with their own glyphs.

pub const SUCCESS_TARGET: &str = "egress::success";
pub const PRINT_TARGET: &str = "egress::print";

/// Logs a completed step. Rendered as `[✔]` by the CLI.
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        $crate::__tracing::info!(target: "egress::success", $($arg)*)
    };
}

/// Emits a raw line of program output, bypassing the status glyphs.
#[macro_export]
macro_rules! output {
    ($msg:expr) => {
        $crate::__tracing::info!(target: "egress::print", raw_msg = %$msg)
    };
}
