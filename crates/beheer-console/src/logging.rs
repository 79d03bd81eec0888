//! `tracing` subscriber setup.
//!
//! The filter comes from `RUST_LOG` when set, otherwise from
//! [`LoggingSettings::level`]. Initializing twice is harmless: the second
//! call reports [`LoggingError::AlreadyInitialized`] and changes nothing.

use beheer_conf::LoggingSettings;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
	#[error("Invalid log filter '{filter}': {reason}")]
	InvalidFilter { filter: String, reason: String },

	#[error("Unknown log format: {0}")]
	UnknownFormat(String),

	#[error("A global subscriber is already installed")]
	AlreadyInitialized,
}

/// Builds the filter for `settings`, preferring `RUST_LOG`.
pub fn env_filter(settings: &LoggingSettings) -> Result<EnvFilter, LoggingError> {
	if let Ok(filter) = EnvFilter::try_from_default_env() {
		return Ok(filter);
	}
	EnvFilter::try_new(&settings.level).map_err(|e| LoggingError::InvalidFilter {
		filter: settings.level.clone(),
		reason: e.to_string(),
	})
}

/// Installs the global subscriber.
pub fn init_logging(settings: &LoggingSettings) -> Result<(), LoggingError> {
	let filter = env_filter(settings)?;
	let builder = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(true);

	let result = match settings.format.as_str() {
		"text" => builder.try_init(),
		"compact" => builder.compact().try_init(),
		"pretty" => builder.pretty().try_init(),
		other => return Err(LoggingError::UnknownFormat(other.to_string())),
	};
	result.map_err(|_| LoggingError::AlreadyInitialized)
}
