//! Diagnostics channel for the console shell.
//!
//! [`DiagnosticsContext`] replaces the ambient debug service of the console:
//! it is created once at startup (see [`DiagnosticsContext::global`]) and
//! lives for the whole session. Every report is forwarded to `tracing` and to
//! the installed [`DiagnosticsSink`], if any, provided it passes the current
//! debug level.
//!
//! ## Levels
//!
//! | Level | Reports passed |
//! |-------|----------------|
//! | 0 | errors |
//! | 1 | errors, warnings |
//! | 2 | errors, warnings, info |
//! | 3 | everything, including debug |

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;

/// Highest accepted debug level.
pub const MAX_DEBUG_LEVEL: u8 = 3;

/// Level used when nothing else is configured.
const DEFAULT_DEBUG_LEVEL: u8 = 1;

static GLOBAL: Lazy<Arc<DiagnosticsContext>> =
	Lazy::new(|| Arc::new(DiagnosticsContext::new(DEFAULT_DEBUG_LEVEL)));

/// Severity of a diagnostic report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
	Error,
	Warn,
	Info,
	Debug,
}

impl Severity {
	/// Minimum debug level at which this severity is reported.
	pub fn min_level(self) -> u8 {
		match self {
			Self::Error => 0,
			Self::Warn => 1,
			Self::Info => 2,
			Self::Debug => 3,
		}
	}
}

impl fmt::Display for Severity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let label = match self {
			Self::Error => "error",
			Self::Warn => "warn",
			Self::Info => "info",
			Self::Debug => "debug",
		};
		f.write_str(label)
	}
}

/// A single report passed to a [`DiagnosticsSink`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticRecord {
	pub severity: Severity,
	pub message: String,
	pub detail: String,
}

/// Receiver for diagnostic reports in addition to `tracing`.
pub trait DiagnosticsSink: Send + Sync {
	fn record(&self, record: &DiagnosticRecord);
}

/// A sink that keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
	records: Mutex<Vec<DiagnosticRecord>>,
}

impl MemorySink {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns a snapshot of the recorded reports.
	pub fn records(&self) -> Vec<DiagnosticRecord> {
		self.records.lock().clone()
	}

	/// Returns how many reports of `severity` were recorded.
	pub fn count(&self, severity: Severity) -> usize {
		self.records
			.lock()
			.iter()
			.filter(|r| r.severity == severity)
			.count()
	}

	pub fn clear(&self) {
		self.records.lock().clear();
	}
}

impl DiagnosticsSink for MemorySink {
	fn record(&self, record: &DiagnosticRecord) {
		self.records.lock().push(record.clone());
	}
}

/// Process-wide diagnostics channel with an adjustable debug level.
pub struct DiagnosticsContext {
	level: AtomicU8,
	sink: RwLock<Option<Arc<dyn DiagnosticsSink>>>,
}

impl fmt::Debug for DiagnosticsContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DiagnosticsContext")
			.field("level", &self.level())
			.field("has_sink", &self.sink.read().is_some())
			.finish()
	}
}

impl Default for DiagnosticsContext {
	fn default() -> Self {
		Self::new(DEFAULT_DEBUG_LEVEL)
	}
}

impl DiagnosticsContext {
	/// Creates a standalone context. Levels above [`MAX_DEBUG_LEVEL`] are clamped.
	pub fn new(level: u8) -> Self {
		Self {
			level: AtomicU8::new(level.min(MAX_DEBUG_LEVEL)),
			sink: RwLock::new(None),
		}
	}

	/// Creates a context that reports into `sink`.
	pub fn with_sink(level: u8, sink: Arc<dyn DiagnosticsSink>) -> Self {
		let ctx = Self::new(level);
		ctx.set_sink(sink);
		ctx
	}

	/// Returns the context shared by the whole console session.
	///
	/// The context is created on first access and never torn down.
	pub fn global() -> Arc<DiagnosticsContext> {
		Arc::clone(&GLOBAL)
	}

	/// Returns the current debug level.
	pub fn level(&self) -> u8 {
		self.level.load(Ordering::Relaxed)
	}

	/// Changes the debug level. Values above [`MAX_DEBUG_LEVEL`] are clamped.
	pub fn set_level(&self, level: u8) {
		let clamped = level.min(MAX_DEBUG_LEVEL);
		let previous = self.level.swap(clamped, Ordering::Relaxed);
		if previous != clamped {
			tracing::info!(from = previous, to = clamped, "Diagnostics level changed");
		}
	}

	/// Installs the sink that receives every report passing the level.
	pub fn set_sink(&self, sink: Arc<dyn DiagnosticsSink>) {
		*self.sink.write() = Some(sink);
	}

	pub fn clear_sink(&self) {
		*self.sink.write() = None;
	}

	/// Returns whether `severity` passes the current level.
	pub fn enabled(&self, severity: Severity) -> bool {
		self.level() >= severity.min_level()
	}

	pub fn error(&self, message: &str, detail: impl fmt::Display) {
		self.report(Severity::Error, message, detail);
	}

	pub fn warn(&self, message: &str, detail: impl fmt::Display) {
		self.report(Severity::Warn, message, detail);
	}

	pub fn info(&self, message: &str, detail: impl fmt::Display) {
		self.report(Severity::Info, message, detail);
	}

	pub fn debug(&self, message: &str, detail: impl fmt::Display) {
		self.report(Severity::Debug, message, detail);
	}

	fn report(&self, severity: Severity, message: &str, detail: impl fmt::Display) {
		if !self.enabled(severity) {
			return;
		}

		let detail = detail.to_string();
		match severity {
			Severity::Error => tracing::error!(target: "beheer::diagnostics", %detail, "{}", message),
			Severity::Warn => tracing::warn!(target: "beheer::diagnostics", %detail, "{}", message),
			Severity::Info => tracing::info!(target: "beheer::diagnostics", %detail, "{}", message),
			Severity::Debug => tracing::debug!(target: "beheer::diagnostics", %detail, "{}", message),
		}

		let sink = self.sink.read().clone();
		if let Some(sink) = sink {
			sink.record(&DiagnosticRecord {
				severity,
				message: message.to_string(),
				detail,
			});
		}
	}
}
