//! Console startup.
//!
//! [`Console::start`] wires settings, diagnostics, the route table, the
//! bundle loader, cookie defaults and the idle watchdog together.

use std::sync::Arc;

use beheer_conf::{ConsoleSettings, SettingsError};
use beheer_pages::{
	CallbackOutcome, CookieDefaults, DiagnosticsContext, IdleConfig, IdleHandle, IdleWatchdog,
	MAX_DEBUG_LEVEL, Synchronize,
};
use beheer_urls::{
	Authenticator, BundleFetcher, BundleLoader, ExternalOpener, GuardServices, LoggingOpener,
	MemorySession, Navigator, RouterError, SessionStore, StaticAuthenticator,
};

use crate::bundles::{LoggingFetcher, console_bundles};
use crate::routes::console_route_table;

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
	#[error(transparent)]
	Settings(#[from] SettingsError),

	#[error(transparent)]
	Router(#[from] RouterError),

	#[error("Invalid console origin '{origin}': {reason}")]
	InvalidOrigin { origin: String, reason: String },

	#[error("The idle watchdog needs a running tokio runtime")]
	NoRuntime,
}

/// External services the console talks to.
#[derive(Clone)]
pub struct Collaborators {
	pub fetcher: Arc<dyn BundleFetcher>,
	pub auth: Arc<dyn Authenticator>,
	pub session: Arc<dyn SessionStore>,
	pub opener: Arc<dyn ExternalOpener>,
	/// Defaults to [`DiagnosticsContext::global`].
	pub diagnostics: Option<Arc<DiagnosticsContext>>,
}

impl Default for Collaborators {
	fn default() -> Self {
		Self {
			fetcher: Arc::new(LoggingFetcher),
			auth: Arc::new(StaticAuthenticator(true)),
			session: Arc::new(MemorySession::new()),
			opener: Arc::new(LoggingOpener),
			diagnostics: None,
		}
	}
}

/// A started console.
#[derive(Debug)]
pub struct Console {
	settings: ConsoleSettings,
	diagnostics: Arc<DiagnosticsContext>,
	navigator: Arc<Navigator>,
	cookies: CookieDefaults,
	idle: Option<IdleHandle>,
}

impl Console {
	/// Starts the console.
	///
	/// When the idle watchdog is enabled this must run inside a tokio runtime.
	pub fn start(settings: ConsoleSettings, collaborators: Collaborators) -> Result<Self, BootstrapError> {
		settings.validate()?;

		let diagnostics = collaborators
			.diagnostics
			.unwrap_or_else(DiagnosticsContext::global);
		if settings.is_localhost() {
			diagnostics.set_level(MAX_DEBUG_LEVEL);
		}

		let cookies = match &settings.origin {
			Some(origin) => CookieDefaults::for_origin(origin).map_err(|e| BootstrapError::InvalidOrigin {
				origin: origin.clone(),
				reason: e.to_string(),
			})?,
			None => CookieDefaults::default(),
		};

		let table = console_route_table()?;
		let loader = BundleLoader::new(Arc::new(console_bundles()), collaborators.fetcher)
			.with_debug(settings.debug);
		let services = GuardServices::default()
			.with_auth(collaborators.auth)
			.with_session(collaborators.session)
			.with_opener(collaborators.opener)
			.with_diagnostics(Arc::clone(&diagnostics))
			.with_server_path(settings.server_path.clone());
		let navigator = Navigator::new(Arc::new(table), Arc::new(loader), services)
			.with_mode(settings.location_mode);

		let idle = match IdleConfig::from_options(settings.idle.time, settings.idle.timeout) {
			Some(config) => {
				if tokio::runtime::Handle::try_current().is_err() {
					return Err(BootstrapError::NoRuntime);
				}
				Some(IdleWatchdog::spawn(config, Arc::clone(&diagnostics)))
			}
			None => {
				tracing::debug!(idle = ?settings.idle, "Idle watchdog disabled");
				None
			}
		};

		tracing::info!(
			mode = ?settings.location_mode,
			secure_cookies = cookies.secure,
			debug_level = diagnostics.level(),
			idle = idle.is_some(),
			"Console started"
		);

		Ok(Self {
			settings,
			diagnostics,
			navigator: Arc::new(navigator),
			cookies,
			idle,
		})
	}

	pub fn settings(&self) -> &ConsoleSettings {
		&self.settings
	}

	pub fn diagnostics(&self) -> &Arc<DiagnosticsContext> {
		&self.diagnostics
	}

	pub fn navigator(&self) -> &Arc<Navigator> {
		&self.navigator
	}

	pub fn cookies(&self) -> &CookieDefaults {
		&self.cookies
	}

	pub fn idle(&self) -> Option<&IdleHandle> {
		self.idle.as_ref()
	}

	/// Signals user activity to the idle watchdog.
	pub fn interact(&self) {
		if let Some(idle) = &self.idle {
			idle.interrupt();
		}
	}

	/// Runs injected code against `state`; failures are only reported.
	pub fn foist<S, F, E>(&self, state: &mut S, callback: F) -> CallbackOutcome
	where
		S: Synchronize,
		F: FnOnce(&mut S) -> Result<(), E>,
		E: std::fmt::Display,
	{
		self.diagnostics.foist(state, callback)
	}

	pub fn set_log_level(&self, level: u8) {
		self.diagnostics.set_level(level);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use beheer_conf::IdleSettings;
	use beheer_pages::{IdleState, MemorySink, SameSite, Severity};
	use rstest::rstest;

	fn quiet() -> Collaborators {
		Collaborators {
			diagnostics: Some(Arc::new(DiagnosticsContext::new(0))),
			..Collaborators::default()
		}
	}

	#[rstest]
	fn test_start_with_defaults() {
		let console = Console::start(ConsoleSettings::default(), quiet()).unwrap();

		assert_eq!(console.diagnostics().level(), 0);
		assert!(console.idle().is_none());
		assert!(!console.cookies().secure);
		assert_eq!(console.navigator().services().server_path, "../");
		// Without a watchdog, activity is a no-op.
		console.interact();
	}

	#[rstest]
	#[case(Some("localhost"), None, MAX_DEBUG_LEVEL)]
	#[case(None, Some("http://localhost:8080/iaf/gui/"), MAX_DEBUG_LEVEL)]
	#[case(Some("console.example.org"), None, 0)]
	fn test_localhost_raises_debug_level(
		#[case] hostname: Option<&str>,
		#[case] origin: Option<&str>,
		#[case] level: u8,
	) {
		let mut settings = ConsoleSettings::default();
		settings.hostname = hostname.map(str::to_string);
		settings.origin = origin.map(str::to_string);

		let console = Console::start(settings, quiet()).unwrap();

		assert_eq!(console.diagnostics().level(), level);
	}

	#[rstest]
	fn test_https_origin_secures_cookies() {
		let mut settings = ConsoleSettings::default();
		settings.origin = Some("https://console.example.org/iaf/gui/".to_string());

		let console = Console::start(settings, quiet()).unwrap();

		assert!(console.cookies().secure);
		assert_eq!(console.cookies().same_site, SameSite::Strict);
	}

	#[rstest]
	fn test_invalid_settings_are_rejected() {
		let mut settings = ConsoleSettings::default();
		settings.server_path = " ".to_string();

		assert!(matches!(
			Console::start(settings, quiet()),
			Err(BootstrapError::Settings(_))
		));
	}

	#[rstest]
	fn test_idle_watchdog_needs_runtime() {
		let mut settings = ConsoleSettings::default();
		settings.idle = IdleSettings::new(600, 30);

		assert!(matches!(
			Console::start(settings, quiet()),
			Err(BootstrapError::NoRuntime)
		));
	}

	#[rstest]
	#[case(IdleSettings::new(0, 30))]
	#[case(IdleSettings::new(600, -1))]
	fn test_non_positive_idle_disables_watchdog(#[case] idle: IdleSettings) {
		let mut settings = ConsoleSettings::default();
		settings.idle = idle;

		let console = Console::start(settings, quiet()).unwrap();

		assert!(console.idle().is_none());
	}

	#[rstest]
	#[tokio::test(start_paused = true)]
	async fn test_idle_watchdog_starts() {
		let mut settings = ConsoleSettings::default();
		settings.idle = IdleSettings::new(600, 30);

		let console = Console::start(settings, quiet()).unwrap();

		let idle = console.idle().unwrap();
		assert_eq!(idle.state(), IdleState::Active);
		console.interact();
	}

	#[derive(Default)]
	struct Scope {
		digests: usize,
	}

	impl Synchronize for Scope {
		fn synchronize(&mut self) {
			self.digests += 1;
		}
	}

	#[rstest]
	fn test_foist_contains_failures() {
		let sink = Arc::new(MemorySink::new());
		let collaborators = Collaborators {
			diagnostics: Some(Arc::new(DiagnosticsContext::with_sink(1, sink.clone()))),
			..Collaborators::default()
		};
		let console = Console::start(ConsoleSettings::default(), collaborators).unwrap();
		let mut scope = Scope::default();

		let outcome = console.foist(&mut scope, |_| Err::<(), _>("boom"));

		assert!(matches!(outcome, CallbackOutcome::Failed(_)));
		assert_eq!(scope.digests, 1);
		assert_eq!(sink.count(Severity::Error), 1);
	}

	#[rstest]
	fn test_set_log_level() {
		let console = Console::start(ConsoleSettings::default(), quiet()).unwrap();

		console.set_log_level(2);

		assert_eq!(console.diagnostics().level(), 2);
	}
}
