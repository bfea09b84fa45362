//! Locate executable files by command name.
//!
//! Resolution first consults the `PATH` directories (optionally through a
//! TTL cache) and, when that fails, scans every ready volume in parallel,
//! visiting well-known install locations first. The architecture keeps a
//! strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (platform rules, query parsing,
//!   location priorities). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (environment reads, executable
//!   detection, directory walks, volume discovery, configuration).
//!
//! [`resolve`] combines both strategies behind [`core::types::ExecutableResolver`];
//! [`nonblocking`] offers cancellable async forms of the slow operations.

pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod nonblocking;
pub mod resolve;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
