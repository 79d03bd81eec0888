//! Navigation: resolution, dependency loading and activation.
//!
//! The [`Navigator`] owns the active-route pointer. A navigation resolves
//! synchronously, then awaits the route's bundles. If another navigation
//! started in the meantime the older one is abandoned without touching the
//! active route; its bundle loads keep running and stay memoized.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::bundle::BundleLoader;
use super::core::{ResolvedRoute, RouteTable, split_url};
use super::error::RouterError;
use super::guard::GuardServices;
use super::params::RouteParams;

/// How routes are encoded in the browser location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationMode {
	/// `index.html#/status?filter=x`; `#!/` is accepted as well.
	#[default]
	Hash,
	/// `/status?filter=x`
	Html5,
}

impl LocationMode {
	/// Extracts the route URL (`path?query`) from a location.
	pub fn route_url<'a>(&self, location: &'a str) -> &'a str {
		match self {
			Self::Hash => match location.split_once('#') {
				Some((_, fragment)) => fragment.strip_prefix('!').unwrap_or(fragment),
				None => "",
			},
			Self::Html5 => {
				let without_fragment = location.split('#').next().unwrap_or(location);
				match without_fragment.split_once("://") {
					Some((_, rest)) => rest.find('/').map_or("/", |slash| &rest[slash..]),
					None => without_fragment,
				}
			}
		}
	}

	/// Renders a route URL as a location.
	pub fn location(&self, route_url: &str) -> String {
		match self {
			Self::Hash => format!("#{}", route_url),
			Self::Html5 => route_url.to_string(),
		}
	}
}

/// Result of a navigation that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationOutcome {
	/// The route is now active.
	Activated(ResolvedRoute),
	/// A newer navigation started first; nothing was activated.
	Superseded,
}

impl NavigationOutcome {
	pub fn is_activated(&self) -> bool {
		matches!(self, Self::Activated(_))
	}
}

/// Drives navigations against a [`RouteTable`].
#[derive(Debug)]
pub struct Navigator {
	table: Arc<RouteTable>,
	loader: Arc<BundleLoader>,
	services: GuardServices,
	mode: LocationMode,
	active: RwLock<Option<ResolvedRoute>>,
	generation: AtomicU64,
}

impl Navigator {
	pub fn new(table: Arc<RouteTable>, loader: Arc<BundleLoader>, services: GuardServices) -> Self {
		Self {
			table,
			loader,
			services,
			mode: LocationMode::default(),
			active: RwLock::new(None),
			generation: AtomicU64::new(0),
		}
	}

	pub fn with_mode(mut self, mode: LocationMode) -> Self {
		self.mode = mode;
		self
	}

	pub fn table(&self) -> &RouteTable {
		&self.table
	}

	pub fn loader(&self) -> &BundleLoader {
		&self.loader
	}

	pub fn services(&self) -> &GuardServices {
		&self.services
	}

	pub fn mode(&self) -> LocationMode {
		self.mode
	}

	/// Returns the active route, if any navigation completed.
	pub fn active(&self) -> Option<ResolvedRoute> {
		self.active.read().clone()
	}

	/// Navigates to `path` with `query`.
	///
	/// # Errors
	///
	/// [`RouterError::RoutingLoop`] or [`RouterError::DependencyLoad`]; the
	/// previous route stays active and the error is reported to diagnostics.
	pub async fn navigate(
		&self,
		path: &str,
		query: &HashMap<String, String>,
	) -> Result<NavigationOutcome, RouterError> {
		let ticket = self.begin();
		let resolved = self.table.resolve(path, query, &self.services);
		self.complete(ticket, resolved).await
	}

	/// Navigates to a location in this navigator's [`LocationMode`].
	pub async fn navigate_location(&self, location: &str) -> Result<NavigationOutcome, RouterError> {
		self.navigate_url(self.mode.route_url(location)).await
	}

	/// Navigates to a route URL of the form `path?query`.
	pub async fn navigate_url(&self, url: &str) -> Result<NavigationOutcome, RouterError> {
		let (path, query) = split_url(url);
		self.navigate(path, &query).await
	}

	/// Navigates to a named route.
	pub async fn navigate_to(
		&self,
		name: &str,
		params: &RouteParams,
	) -> Result<NavigationOutcome, RouterError> {
		let ticket = self.begin();
		let resolved = self.table.resolve_named(name, params, &self.services);
		self.complete(ticket, resolved).await
	}

	/// Generates the location of a named route.
	pub fn href(&self, name: &str, params: &RouteParams) -> Result<String, RouterError> {
		self.table
			.href(name, params)
			.map(|url| self.mode.location(&url))
	}

	fn begin(&self) -> u64 {
		self.generation.fetch_add(1, Ordering::SeqCst) + 1
	}

	async fn complete(
		&self,
		ticket: u64,
		resolved: Result<ResolvedRoute, RouterError>,
	) -> Result<NavigationOutcome, RouterError> {
		let resolved = resolved.map_err(|err| self.report(err))?;

		if let Err(source) = self.loader.load_all(resolved.dependencies()).await {
			if self.is_stale(ticket) {
				tracing::debug!(route = resolved.name(), error = %source, "Superseded navigation failed");
				return Ok(NavigationOutcome::Superseded);
			}
			return Err(self.report(RouterError::DependencyLoad {
				route: resolved.name().to_string(),
				source,
			}));
		}

		let mut active = self.active.write();
		if self.is_stale(ticket) {
			tracing::debug!(route = resolved.name(), "Navigation superseded");
			return Ok(NavigationOutcome::Superseded);
		}
		tracing::debug!(route = resolved.name(), params = ?resolved.params(), "Route activated");
		*active = Some(resolved.clone());
		Ok(NavigationOutcome::Activated(resolved))
	}

	fn is_stale(&self, ticket: u64) -> bool {
		self.generation.load(Ordering::SeqCst) != ticket
	}

	fn report(&self, err: RouterError) -> RouterError {
		self.services
			.diagnostics
			.error("Navigation failed", &err);
		err
	}
}
