//! Configuration for the Beheer console.
//!
//! ```
//! use beheer_conf::ConsoleSettings;
//!
//! let settings = ConsoleSettings::default();
//! assert!(settings.validate().is_ok());
//! ```

pub mod settings;

pub use settings::{
	ConsoleSettings, IDLE_TIME_CONSTANT, IDLE_TIMEOUT_CONSTANT, IdleSettings, LoggingSettings,
	SettingsError,
};
