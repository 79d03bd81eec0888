//! Route guards and the services they may use.
//!
//! A guard runs synchronously before a route is activated. It receives the
//! resolved parameters, the route's runtime metadata (which it may rewrite)
//! and an explicit set of collaborators. It either lets resolution continue
//! or redirects it elsewhere.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use beheer_pages::DiagnosticsContext;
use parking_lot::RwLock;
use serde::Serialize;

use super::params::RouteParams;

/// Answers whether the current user is signed in.
pub trait Authenticator: Send + Sync {
	fn is_authenticated(&self) -> bool;
}

/// Read access to session values.
pub trait SessionStore: Send + Sync {
	fn get(&self, key: &str) -> Option<String>;
}

/// Opens URLs outside the console.
pub trait ExternalOpener: Send + Sync {
	fn open(&self, url: &str, target: &str);
}

/// An authenticator with a fixed answer.
#[derive(Debug, Clone, Copy)]
pub struct StaticAuthenticator(pub bool);

impl Authenticator for StaticAuthenticator {
	fn is_authenticated(&self) -> bool {
		self.0
	}
}

/// In-memory session store.
#[derive(Debug, Default)]
pub struct MemorySession {
	values: RwLock<HashMap<String, String>>,
}

impl MemorySession {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
		self.values.write().insert(key.into(), value.into());
	}

	pub fn remove(&self, key: &str) -> Option<String> {
		self.values.write().remove(key)
	}
}

impl SessionStore for MemorySession {
	fn get(&self, key: &str) -> Option<String> {
		self.values.read().get(key).cloned()
	}
}

/// An opener that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingOpener;

impl ExternalOpener for LoggingOpener {
	fn open(&self, url: &str, target: &str) {
		tracing::info!(url, target, "Opening external page");
	}
}

/// Collaborators available to every guard.
#[derive(Clone)]
pub struct GuardServices {
	pub session: Arc<dyn SessionStore>,
	pub auth: Arc<dyn Authenticator>,
	pub opener: Arc<dyn ExternalOpener>,
	pub diagnostics: Arc<DiagnosticsContext>,
	/// Base path of the server, prepended to embedded page URLs.
	pub server_path: String,
}

impl Default for GuardServices {
	fn default() -> Self {
		Self {
			session: Arc::new(MemorySession::new()),
			auth: Arc::new(StaticAuthenticator(true)),
			opener: Arc::new(LoggingOpener),
			diagnostics: DiagnosticsContext::global(),
			server_path: String::new(),
		}
	}
}

impl fmt::Debug for GuardServices {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("GuardServices")
			.field("server_path", &self.server_path)
			.field("diagnostics", &self.diagnostics)
			.finish_non_exhaustive()
	}
}

impl GuardServices {
	pub fn with_session(mut self, session: Arc<dyn SessionStore>) -> Self {
		self.session = session;
		self
	}

	pub fn with_auth(mut self, auth: Arc<dyn Authenticator>) -> Self {
		self.auth = auth;
		self
	}

	pub fn with_opener(mut self, opener: Arc<dyn ExternalOpener>) -> Self {
		self.opener = opener;
		self
	}

	pub fn with_diagnostics(mut self, diagnostics: Arc<DiagnosticsContext>) -> Self {
		self.diagnostics = diagnostics;
		self
	}

	pub fn with_server_path(mut self, server_path: impl Into<String>) -> Self {
		self.server_path = server_path.into();
		self
	}
}

/// Page metadata exposed to the shell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RouteMetadata {
	#[serde(rename = "pageTitle", skip_serializing_if = "Option::is_none")]
	pub page_title: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub breadcrumbs: Option<String>,
	/// Whether the page embeds an external document.
	#[serde(skip_serializing_if = "std::ops::Not::not")]
	pub iframe: bool,
	/// Values set by guards, e.g. the embedded document URL.
	#[serde(flatten)]
	pub extras: BTreeMap<String, String>,
}

impl RouteMetadata {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn title(mut self, page_title: impl Into<String>) -> Self {
		self.page_title = Some(page_title.into());
		self
	}

	pub fn breadcrumbs(mut self, breadcrumbs: impl Into<String>) -> Self {
		self.breadcrumbs = Some(breadcrumbs.into());
		self
	}

	pub fn iframe(mut self) -> Self {
		self.iframe = true;
		self
	}

	pub fn extra(&self, key: &str) -> Option<&str> {
		self.extras.get(key).map(String::as_str)
	}

	pub fn set_extra(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.extras.insert(key.into(), value.into());
	}
}

/// Where a guard sends resolution instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectTarget {
	/// A named route with explicit parameters.
	Route { name: String, params: RouteParams },
	/// A URL path with query parameters, resolved like a navigation.
	Path {
		path: String,
		query: HashMap<String, String>,
	},
}

impl RedirectTarget {
	pub fn route(name: impl Into<String>) -> Self {
		Self::Route {
			name: name.into(),
			params: RouteParams::new(),
		}
	}

	pub fn route_with(name: impl Into<String>, params: RouteParams) -> Self {
		Self::Route {
			name: name.into(),
			params,
		}
	}

	pub fn path(path: impl Into<String>) -> Self {
		Self::Path {
			path: path.into(),
			query: HashMap::new(),
		}
	}
}

impl fmt::Display for RedirectTarget {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Route { name, .. } => f.write_str(name),
			Self::Path { path, .. } => f.write_str(path),
		}
	}
}

/// Result of running a guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
	Continue,
	Redirect(RedirectTarget),
}

/// Everything a guard can see and touch.
pub struct GuardContext<'a> {
	/// Name of the route being resolved (the leaf, also for ancestor guards).
	pub route_name: &'a str,
	pub params: &'a RouteParams,
	pub metadata: &'a mut RouteMetadata,
	pub services: &'a GuardServices,
}

/// A pre-activation hook.
pub type Guard = Arc<dyn Fn(&mut GuardContext<'_>) -> GuardOutcome + Send + Sync>;

/// Wraps a closure as a [`Guard`].
pub fn guard<F>(f: F) -> Guard
where
	F: Fn(&mut GuardContext<'_>) -> GuardOutcome + Send + Sync + 'static,
{
	Arc::new(f)
}
