//! Stable exit codes for `whatexec` commands.

/// Every requested command resolved to at least one executable.
pub const FOUND: i32 = 0;
/// At least one requested command could not be resolved.
pub const NOT_FOUND: i32 = 1;
/// Invalid arguments, unreadable config or an unsupported platform.
pub const INVALID: i32 = 2;
/// Interrupted with Ctrl-C before the search finished.
pub const CANCELLED: i32 = 130;
