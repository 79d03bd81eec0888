//! Console settings
//!
//! Settings are assembled from defaults, an optional configuration file
//! (`.toml` or `.json`), `BEHEER_*` environment variables and the app
//! constants the server hands to the console.

use std::collections::HashMap;
use std::path::PathBuf;

use beheer_urls::LocationMode;
use serde::{Deserialize, Serialize};

/// App constant holding the idle time in seconds.
pub const IDLE_TIME_CONSTANT: &str = "console.idle.time";

/// App constant holding the idle timeout in seconds.
pub const IDLE_TIMEOUT_CONSTANT: &str = "console.idle.timeout";

const LOG_FORMATS: &[&str] = &["text", "compact", "pretty"];

/// Main console settings
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleSettings {
	/// Debug mode: log every bundle file as it is loaded
	#[serde(default)]
	pub debug: bool,

	/// Idle watchdog durations
	#[serde(default)]
	pub idle: IdleSettings,

	/// How routes appear in the browser location
	#[serde(default)]
	pub location_mode: LocationMode,

	/// Base path of the server, prefixed to embedded pages
	#[serde(default = "default_server_path")]
	pub server_path: String,

	/// URL the console is served from
	#[serde(default)]
	pub origin: Option<String>,

	/// Host name override; otherwise taken from `origin`
	#[serde(default)]
	pub hostname: Option<String>,

	/// Logging configuration
	#[serde(default)]
	pub logging: LoggingSettings,

	/// Custom application-specific settings
	#[serde(default)]
	pub custom: HashMap<String, serde_json::Value>,
}

fn default_server_path() -> String {
	"../".to_string()
}

impl Default for ConsoleSettings {
	fn default() -> Self {
		Self {
			debug: false,
			idle: IdleSettings::default(),
			location_mode: LocationMode::default(),
			server_path: default_server_path(),
			origin: None,
			hostname: None,
			logging: LoggingSettings::default(),
			custom: HashMap::new(),
		}
	}
}

impl ConsoleSettings {
	/// Create new settings with defaults
	pub fn new() -> Self {
		Self::default()
	}

	/// Validate settings
	pub fn validate(&self) -> Result<(), SettingsError> {
		if self.server_path.trim().is_empty() {
			return Err(SettingsError::ValidationError(
				"server_path must not be empty".to_string(),
			));
		}

		if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
			return Err(SettingsError::ValidationError(format!(
				"logging.format must be one of {}, got '{}'",
				LOG_FORMATS.join(", "),
				self.logging.format
			)));
		}

		if let Some(origin) = &self.origin {
			url::Url::parse(origin).map_err(|e| {
				SettingsError::ValidationError(format!("origin '{}' is not a URL: {}", origin, e))
			})?;
		}

		Ok(())
	}

	/// Load settings from environment variables on top of the defaults
	pub fn from_env() -> Result<Self, SettingsError> {
		Self::default().apply_env()
	}

	/// Overrides fields from `BEHEER_*` environment variables
	pub fn apply_env(mut self) -> Result<Self, SettingsError> {
		if let Ok(debug) = std::env::var("BEHEER_DEBUG") {
			self.debug = debug.to_lowercase() == "true" || debug == "1";
		}

		if let Ok(time) = std::env::var("BEHEER_IDLE_TIME") {
			self.idle.time = Some(parse_env_seconds("BEHEER_IDLE_TIME", &time)?);
		}

		if let Ok(timeout) = std::env::var("BEHEER_IDLE_TIMEOUT") {
			self.idle.timeout = Some(parse_env_seconds("BEHEER_IDLE_TIMEOUT", &timeout)?);
		}

		if let Ok(mode) = std::env::var("BEHEER_LOCATION_MODE") {
			self.location_mode = match mode.to_lowercase().as_str() {
				"hash" => LocationMode::Hash,
				"html5" => LocationMode::Html5,
				other => {
					return Err(SettingsError::ParseError(format!(
						"BEHEER_LOCATION_MODE must be 'hash' or 'html5', got '{}'",
						other
					)));
				}
			};
		}

		if let Ok(server_path) = std::env::var("BEHEER_SERVER_PATH") {
			self.server_path = server_path;
		}

		if let Ok(origin) = std::env::var("BEHEER_ORIGIN") {
			self.origin = Some(origin);
		}

		if let Ok(hostname) = std::env::var("BEHEER_HOSTNAME") {
			self.hostname = Some(hostname);
		}

		if let Ok(level) = std::env::var("BEHEER_LOG_LEVEL") {
			self.logging.level = level;
		}

		if let Ok(format) = std::env::var("BEHEER_LOG_FORMAT") {
			self.logging.format = format;
		}

		Ok(self)
	}

	/// Load settings from a configuration file
	pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
		let path = path.into();
		let contents = std::fs::read_to_string(&path).map_err(|e| {
			SettingsError::FileError(format!("Failed to read {}: {}", path.display(), e))
		})?;

		let settings: ConsoleSettings =
			if path.extension().and_then(|s| s.to_str()) == Some("toml") {
				toml::from_str(&contents)
					.map_err(|e| SettingsError::ParseError(format!("TOML parse error: {}", e)))?
			} else if path.extension().and_then(|s| s.to_str()) == Some("json") {
				serde_json::from_str(&contents)
					.map_err(|e| SettingsError::ParseError(format!("JSON parse error: {}", e)))?
			} else {
				return Err(SettingsError::UnsupportedFormat(
					"Supported formats: .toml, .json".to_string(),
				));
			};

		tracing::debug!(path = %path.display(), "Loaded console settings");
		Ok(settings)
	}

	/// Takes the idle durations from the server's app constants.
	///
	/// Constants may be numbers or numeric strings. Anything else leaves the
	/// value unset, which disables the watchdog.
	pub fn with_constants(mut self, constants: &HashMap<String, serde_json::Value>) -> Self {
		if let Some(value) = constants.get(IDLE_TIME_CONSTANT) {
			self.idle.time = constant_seconds(IDLE_TIME_CONSTANT, value);
		}
		if let Some(value) = constants.get(IDLE_TIMEOUT_CONSTANT) {
			self.idle.timeout = constant_seconds(IDLE_TIMEOUT_CONSTANT, value);
		}
		self
	}

	/// Defaults plus the idle durations from `constants`
	pub fn from_constants(constants: &HashMap<String, serde_json::Value>) -> Self {
		Self::default().with_constants(constants)
	}

	/// Host name the console is served on, if known
	pub fn effective_hostname(&self) -> Option<String> {
		if let Some(hostname) = &self.hostname {
			return Some(hostname.clone());
		}
		self.origin
			.as_deref()
			.and_then(|origin| url::Url::parse(origin).ok())
			.and_then(|url| url.host_str().map(str::to_string))
	}

	/// Whether the console runs on `localhost`
	pub fn is_localhost(&self) -> bool {
		self.effective_hostname().as_deref() == Some("localhost")
	}

	/// Set a custom setting
	pub fn set<T: Serialize>(
		&mut self,
		key: impl Into<String>,
		value: T,
	) -> Result<(), SettingsError> {
		let json_value = serde_json::to_value(value)
			.map_err(|e| SettingsError::SerializationError(e.to_string()))?;
		self.custom.insert(key.into(), json_value);
		Ok(())
	}

	/// Get a custom setting
	pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
		self.custom
			.get(key)
			.and_then(|v| serde_json::from_value(v.clone()).ok())
	}
}

fn parse_env_seconds(name: &str, raw: &str) -> Result<i64, SettingsError> {
	raw.trim().parse::<i64>().map_err(|e| {
		SettingsError::ParseError(format!("{} must be a number of seconds: {}", name, e))
	})
}

fn constant_seconds(name: &str, value: &serde_json::Value) -> Option<i64> {
	let seconds = match value {
		serde_json::Value::Number(n) => n.as_i64(),
		serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
		_ => None,
	};
	if seconds.is_none() {
		tracing::warn!(constant = name, %value, "Ignoring non-numeric idle constant");
	}
	seconds
}

/// Idle watchdog settings, in seconds. Zero, negative or unset disables it.
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdleSettings {
	#[serde(default)]
	pub time: Option<i64>,
	#[serde(default)]
	pub timeout: Option<i64>,
}

impl IdleSettings {
	pub fn new(time: i64, timeout: i64) -> Self {
		Self {
			time: Some(time),
			timeout: Some(timeout),
		}
	}
}

/// Logging settings
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
	/// `tracing` filter directive, e.g. `info` or `beheer_urls=debug`
	#[serde(default = "default_log_level")]
	pub level: String,
	/// `text`, `compact` or `pretty`
	#[serde(default = "default_log_format")]
	pub format: String,
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_log_format() -> String {
	"text".to_string()
}

impl Default for LoggingSettings {
	fn default() -> Self {
		Self {
			level: default_log_level(),
			format: default_log_format(),
		}
	}
}

/// Settings error
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	#[error("File error: {0}")]
	FileError(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Unsupported format: {0}")]
	UnsupportedFormat(String),

	#[error("Serialization error: {0}")]
	SerializationError(String),
}
