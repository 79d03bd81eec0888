//! Runtime hooks for the Beheer console shell.
//!
//! This crate holds the pieces of the console bootstrap that do not depend on
//! the route table:
//!
//! - [`diagnostics`]: the process-wide [`DiagnosticsContext`] with its debug
//!   level and pluggable sinks
//! - [`callback`]: the guarded callback executor (`foist`) for developer
//!   injected code
//! - [`idle`]: the session idle watchdog
//! - [`cookies`]: cookie security defaults derived from the console origin
//!
//! ## Example
//!
//! ```ignore
//! use beheer_pages::{DiagnosticsContext, IdleWatchdog};
//!
//! let diagnostics = DiagnosticsContext::global();
//! diagnostics.set_level(3);
//!
//! if let Some(watchdog) = IdleWatchdog::start(Some(600), Some(30), diagnostics.clone()) {
//!     watchdog.interrupt();
//! }
//! ```

pub mod callback;
pub mod cookies;
pub mod diagnostics;
pub mod idle;

pub use callback::{CallbackError, CallbackOutcome, Synchronize};
pub use cookies::{CookieDefaults, SameSite};
pub use diagnostics::{
	DiagnosticRecord, DiagnosticsContext, DiagnosticsSink, MAX_DEBUG_LEVEL, MemorySink, Severity,
};
pub use idle::{IdleConfig, IdleHandle, IdleState, IdleTracker, IdleWatchdog};
