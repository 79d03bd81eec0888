//! Route table and resolver.
//!
//! A [`RouteTable`] is built once from an ordered list of
//! [`RouteDefinition`]s and is immutable afterwards. Resolution picks the
//! most specific concrete route for a path, materializes its parameters,
//! runs the guards of the route and its ancestors root-to-leaf, and follows
//! guard redirects up to [`MAX_REDIRECT_HOPS`] times.
//!
//! Route names are hierarchical: `pages.storage.list` is nested in
//! `pages.storage`, which is nested in `pages`. A nested route inherits its
//! ancestors' URL fragments, parameter descriptors, metadata, guards and
//! dependencies.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::error::RouterError;
use super::guard::{Guard, GuardContext, GuardOutcome, GuardServices, RedirectTarget, RouteMetadata};
use super::params::{ParamDescriptor, ParamSchema, RouteParams};
use super::pattern::ClientPathPattern;

/// Path every unmatched URL resolves to.
pub const DEFAULT_PATH: &str = "/";

/// Maximum number of guard redirects followed by one resolution.
pub const MAX_REDIRECT_HOPS: usize = 5;

/// A single route declaration.
pub struct RouteDefinition {
	name: String,
	url: Option<String>,
	is_abstract: bool,
	view: Option<String>,
	guard: Option<Guard>,
	params: Vec<(String, ParamDescriptor)>,
	dependencies: Vec<String>,
	metadata: Option<RouteMetadata>,
}

impl fmt::Debug for RouteDefinition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouteDefinition")
			.field("name", &self.name)
			.field("url", &self.url)
			.field("is_abstract", &self.is_abstract)
			.field("view", &self.view)
			.field("has_guard", &self.guard.is_some())
			.field("params", &self.params)
			.field("dependencies", &self.dependencies)
			.field("metadata", &self.metadata)
			.finish()
	}
}

impl RouteDefinition {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			url: None,
			is_abstract: false,
			view: None,
			guard: None,
			params: Vec::new(),
			dependencies: Vec::new(),
			metadata: None,
		}
	}

	/// Sets the URL fragment, appended to the ancestors' fragments.
	pub fn url(mut self, url: impl Into<String>) -> Self {
		self.url = Some(url.into());
		self
	}

	/// Marks the route as a layout shell that is never activated.
	pub fn layout(mut self) -> Self {
		self.is_abstract = true;
		self
	}

	pub fn view(mut self, view: impl Into<String>) -> Self {
		self.view = Some(view.into());
		self
	}

	pub fn guard(mut self, guard: Guard) -> Self {
		self.guard = Some(guard);
		self
	}

	/// Declares a parameter, overriding an inherited descriptor.
	pub fn param(mut self, name: impl Into<String>, descriptor: impl Into<ParamDescriptor>) -> Self {
		let name = name.into();
		let descriptor = descriptor.into();
		match self.params.iter_mut().find(|(n, _)| *n == name) {
			Some((_, existing)) => *existing = descriptor,
			None => self.params.push((name, descriptor)),
		}
		self
	}

	pub fn dependency(mut self, bundle: impl Into<String>) -> Self {
		self.dependencies.push(bundle.into());
		self
	}

	pub fn metadata(mut self, metadata: RouteMetadata) -> Self {
		self.metadata = Some(metadata);
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Name of the enclosing route, derived from the name.
	pub fn parent_name(&self) -> Option<&str> {
		self.name.rsplit_once('.').map(|(parent, _)| parent)
	}

	pub fn url_fragment(&self) -> Option<&str> {
		self.url.as_deref()
	}

	pub fn is_abstract(&self) -> bool {
		self.is_abstract
	}

	pub fn view_ref(&self) -> Option<&str> {
		self.view.as_deref()
	}

	pub fn has_guard(&self) -> bool {
		self.guard.is_some()
	}

	pub fn params(&self) -> &[(String, ParamDescriptor)] {
		&self.params
	}

	pub fn dependencies(&self) -> &[String] {
		&self.dependencies
	}

	pub fn own_metadata(&self) -> Option<&RouteMetadata> {
		self.metadata.as_ref()
	}
}

/// A route with everything inherited from its ancestors folded in.
#[derive(Debug)]
struct CompiledRoute {
	definition: Arc<RouteDefinition>,
	pattern: Option<ClientPathPattern>,
	schema: ParamSchema,
	metadata: RouteMetadata,
	/// Registered ancestors, root first, ending with the route itself.
	chain: Vec<usize>,
	dependencies: Vec<String>,
}

/// The outcome of a full resolution.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedRoute {
	#[serde(skip)]
	definition: Arc<RouteDefinition>,
	name: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	view: Option<String>,
	params: RouteParams,
	metadata: RouteMetadata,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	dependencies: Vec<String>,
	/// Routes whose guards redirected, in order.
	#[serde(skip_serializing_if = "Vec::is_empty")]
	redirects: Vec<String>,
}

impl PartialEq for ResolvedRoute {
	fn eq(&self, other: &Self) -> bool {
		self.name == other.name && self.params == other.params && self.metadata == other.metadata
	}
}

impl ResolvedRoute {
	pub fn definition(&self) -> &RouteDefinition {
		&self.definition
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn view(&self) -> Option<&str> {
		self.view.as_deref()
	}

	pub fn params(&self) -> &RouteParams {
		&self.params
	}

	pub fn metadata(&self) -> &RouteMetadata {
		&self.metadata
	}

	/// Bundles that must be loaded before activation, ancestors' first.
	pub fn dependencies(&self) -> &[String] {
		&self.dependencies
	}

	pub fn redirects(&self) -> &[String] {
		&self.redirects
	}
}

/// A single resolution step.
#[derive(Debug, Clone)]
pub enum Resolution {
	Resolved(ResolvedRoute),
	/// A guard of `from` redirected.
	RedirectTo {
		from: String,
		target: RedirectTarget,
	},
}

/// Builder for [`RouteTable`].
#[derive(Debug)]
pub struct RouteTableBuilder {
	routes: Vec<RouteDefinition>,
	default_path: String,
}

impl Default for RouteTableBuilder {
	fn default() -> Self {
		Self {
			routes: Vec::new(),
			default_path: DEFAULT_PATH.to_string(),
		}
	}
}

impl RouteTableBuilder {
	pub fn route(mut self, definition: RouteDefinition) -> Self {
		self.routes.push(definition);
		self
	}

	pub fn routes(mut self, definitions: impl IntoIterator<Item = RouteDefinition>) -> Self {
		self.routes.extend(definitions);
		self
	}

	/// Sets the path unmatched URLs resolve to. Defaults to [`DEFAULT_PATH`].
	pub fn otherwise(mut self, path: impl Into<String>) -> Self {
		self.default_path = path.into();
		self
	}

	/// Validates and compiles the table.
	///
	/// # Errors
	///
	/// - [`RouterError::DuplicateRoute`] if a name is registered twice
	/// - [`RouterError::InvalidPattern`] if an effective pattern does not
	///   compile, or a concrete route has no URL
	/// - [`RouterError::InvalidDefault`] if the default path matches no
	///   concrete route
	pub fn build(self) -> Result<RouteTable, RouterError> {
		let mut by_name = HashMap::with_capacity(self.routes.len());
		for (index, definition) in self.routes.iter().enumerate() {
			if by_name.insert(definition.name.clone(), index).is_some() {
				return Err(RouterError::DuplicateRoute(definition.name.clone()));
			}
		}

		let definitions: Vec<Arc<RouteDefinition>> = self.routes.into_iter().map(Arc::new).collect();
		let mut routes = Vec::with_capacity(definitions.len());
		for (index, definition) in definitions.iter().enumerate() {
			routes.push(compile_route(index, definition, &definitions, &by_name)?);
		}

		let mut table = RouteTable {
			routes,
			by_name,
			default_path: self.default_path,
			default_route: 0,
		};
		table.default_route = table
			.match_path(&table.default_path)
			.map(|(index, _)| index)
			.ok_or_else(|| RouterError::InvalidDefault(table.default_path.clone()))?;

		tracing::debug!(
			routes = table.routes.len(),
			default = %table.routes[table.default_route].definition.name,
			"Route table built"
		);
		Ok(table)
	}
}

fn compile_route(
	index: usize,
	definition: &Arc<RouteDefinition>,
	definitions: &[Arc<RouteDefinition>],
	by_name: &HashMap<String, usize>,
) -> Result<CompiledRoute, RouterError> {
	let mut chain = vec![index];
	let mut current = definition.parent_name();
	while let Some(parent) = current {
		if let Some(&parent_index) = by_name.get(parent) {
			chain.push(parent_index);
		}
		current = parent.rsplit_once('.').map(|(p, _)| p);
	}
	chain.reverse();

	let fragments: Vec<&str> = chain
		.iter()
		.filter_map(|&i| definitions[i].url.as_deref())
		.collect();
	let pattern = if fragments.is_empty() {
		if !definition.is_abstract {
			return Err(RouterError::InvalidPattern {
				route: definition.name.clone(),
				pattern: String::new(),
				reason: "concrete route has no URL".to_string(),
			});
		}
		None
	} else {
		let composed = ClientPathPattern::compose(&fragments);
		let pattern = ClientPathPattern::new(&composed).map_err(|reason| RouterError::InvalidPattern {
			route: definition.name.clone(),
			pattern: composed.clone(),
			reason,
		})?;
		Some(pattern)
	};

	let mut schema = ParamSchema::default();
	if let Some(pattern) = &pattern {
		for name in pattern.param_names().iter().chain(pattern.query_names()) {
			schema.declare(name);
		}
	}
	let mut dependencies: Vec<String> = Vec::new();
	for &i in &chain {
		for (name, descriptor) in &definitions[i].params {
			schema.describe(name, descriptor.clone());
		}
		for bundle in &definitions[i].dependencies {
			if !dependencies.contains(bundle) {
				dependencies.push(bundle.clone());
			}
		}
	}

	let metadata = chain
		.iter()
		.rev()
		.find_map(|&i| definitions[i].metadata.clone())
		.unwrap_or_default();

	Ok(CompiledRoute {
		definition: Arc::clone(definition),
		pattern,
		schema,
		metadata,
		chain,
		dependencies,
	})
}

/// Immutable, validated set of routes.
pub struct RouteTable {
	routes: Vec<CompiledRoute>,
	by_name: HashMap<String, usize>,
	default_path: String,
	default_route: usize,
}

impl fmt::Debug for RouteTable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouteTable")
			.field("routes_count", &self.routes.len())
			.field("default_path", &self.default_path)
			.finish()
	}
}

impl RouteTable {
	pub fn builder() -> RouteTableBuilder {
		RouteTableBuilder::default()
	}

	pub fn len(&self) -> usize {
		self.routes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.routes.is_empty()
	}

	pub fn default_path(&self) -> &str {
		&self.default_path
	}

	/// Returns every definition in registration order.
	pub fn definitions(&self) -> impl Iterator<Item = &RouteDefinition> {
		self.routes.iter().map(|route| route.definition.as_ref())
	}

	pub fn get(&self, name: &str) -> Option<&RouteDefinition> {
		self.by_name
			.get(name)
			.map(|&index| self.routes[index].definition.as_ref())
	}

	/// Returns the effective pattern of `name`, ancestors' fragments included.
	pub fn pattern_of(&self, name: &str) -> Option<&ClientPathPattern> {
		self.by_name
			.get(name)
			.and_then(|&index| self.routes[index].pattern.as_ref())
	}

	/// Returns the name of the concrete route matching `path`, if any.
	pub fn match_name(&self, path: &str) -> Option<&str> {
		self.match_path(path)
			.map(|(index, _)| self.routes[index].definition.name.as_str())
	}

	/// Finds the most specific concrete route for `path`.
	fn match_path(&self, path: &str) -> Option<(usize, HashMap<String, String>)> {
		let mut best: Option<(usize, HashMap<String, String>, usize)> = None;
		for (index, route) in self.routes.iter().enumerate() {
			if route.definition.is_abstract {
				continue;
			}
			let Some(pattern) = &route.pattern else {
				continue;
			};
			let Some(captured) = pattern.matches(path) else {
				continue;
			};
			let specificity = pattern.literal_segments();
			let replace = match &best {
				None => true,
				Some((best_index, _, best_specificity)) => {
					if *best_specificity == specificity {
						tracing::warn!(
							path,
							chosen = %self.routes[*best_index].definition.name,
							ignored = %route.definition.name,
							"Ambiguous routes; using the first registered"
						);
					}
					specificity > *best_specificity
				}
			};
			if replace {
				best = Some((index, captured, specificity));
			}
		}
		best.map(|(index, captured, _)| (index, captured))
	}

	/// Resolves one step: matches, materializes and runs guards.
	///
	/// Unmatched or malformed paths resolve to the default route.
	pub fn resolve_step(
		&self,
		path: &str,
		query: &HashMap<String, String>,
		services: &GuardServices,
	) -> Resolution {
		let (index, captured) = match self.match_path(path) {
			Some(found) => found,
			None => {
				tracing::debug!(path, default = %self.default_path, "No route matched");
				let captured = self
					.routes[self.default_route]
					.pattern
					.as_ref()
					.and_then(|pattern| pattern.matches(&self.default_path))
					.unwrap_or_default();
				(self.default_route, captured)
			}
		};
		let route = &self.routes[index];
		tracing::debug!(path, route = %route.definition.name, "Route matched");

		// Only parameters declared in the URL's query list come from the query.
		let query: HashMap<String, String> = route
			.pattern
			.as_ref()
			.map(|pattern| {
				query
					.iter()
					.filter(|(name, _)| pattern.query_names().contains(name))
					.map(|(name, value)| (name.clone(), value.clone()))
					.collect()
			})
			.unwrap_or_default();
		self.activate(index, &captured, &query, services)
	}

	/// Resolves `path`, following guard redirects.
	///
	/// # Errors
	///
	/// [`RouterError::RoutingLoop`] when guards redirect more than
	/// [`MAX_REDIRECT_HOPS`] times; [`RouterError::InvalidRouteName`] or
	/// [`RouterError::AbstractRoute`] when a guard redirects to a route that
	/// cannot be activated.
	pub fn resolve(
		&self,
		path: &str,
		query: &HashMap<String, String>,
		services: &GuardServices,
	) -> Result<ResolvedRoute, RouterError> {
		let step = self.resolve_step(path, query, services);
		self.follow(step, services)
	}

	/// Resolves a URL of the form `path?query`.
	pub fn resolve_url(&self, url: &str, services: &GuardServices) -> Result<ResolvedRoute, RouterError> {
		let (path, query) = split_url(url);
		self.resolve(path, &query, services)
	}

	/// Resolves a named route with explicit parameters, following redirects.
	///
	/// # Errors
	///
	/// As [`RouteTable::resolve`], plus [`RouterError::InvalidRouteName`] and
	/// [`RouterError::AbstractRoute`] for `name` itself.
	pub fn resolve_named(
		&self,
		name: &str,
		params: &RouteParams,
		services: &GuardServices,
	) -> Result<ResolvedRoute, RouterError> {
		let step = self.step_named(name, params, services)?;
		self.follow(step, services)
	}

	fn step_named(
		&self,
		name: &str,
		params: &RouteParams,
		services: &GuardServices,
	) -> Result<Resolution, RouterError> {
		let index = self.concrete_index(name)?;
		Ok(self.activate(index, &HashMap::new(), &params.as_hash_map(), services))
	}

	fn follow(&self, mut step: Resolution, services: &GuardServices) -> Result<ResolvedRoute, RouterError> {
		let mut trail = Vec::new();
		loop {
			match step {
				Resolution::Resolved(mut resolved) => {
					resolved.redirects = trail;
					return Ok(resolved);
				}
				Resolution::RedirectTo { from, target } => {
					tracing::debug!(from = %from, to = %target, "Guard redirected");
					trail.push(from);
					if trail.len() > MAX_REDIRECT_HOPS {
						tracing::error!(trail = ?trail, "Routing loop detected");
						return Err(RouterError::RoutingLoop {
							limit: MAX_REDIRECT_HOPS,
							trail,
						});
					}
					step = match target {
						RedirectTarget::Route { name, params } => {
							self.step_named(&name, &params, services)?
						}
						RedirectTarget::Path { path, query } => {
							self.resolve_step(&path, &query, services)
						}
					};
				}
			}
		}
	}

	fn concrete_index(&self, name: &str) -> Result<usize, RouterError> {
		let &index = self
			.by_name
			.get(name)
			.ok_or_else(|| RouterError::InvalidRouteName(name.to_string()))?;
		if self.routes[index].definition.is_abstract {
			return Err(RouterError::AbstractRoute(name.to_string()));
		}
		Ok(index)
	}

	fn activate(
		&self,
		index: usize,
		captured: &HashMap<String, String>,
		supplied: &HashMap<String, String>,
		services: &GuardServices,
	) -> Resolution {
		let route = &self.routes[index];
		let params = route.schema.materialize(captured, supplied);
		let mut metadata = route.metadata.clone();

		for &link in &route.chain {
			let Some(guard) = &self.routes[link].definition.guard else {
				continue;
			};
			let mut ctx = GuardContext {
				route_name: &route.definition.name,
				params: &params,
				metadata: &mut metadata,
				services,
			};
			if let GuardOutcome::Redirect(target) = guard(&mut ctx) {
				return Resolution::RedirectTo {
					from: route.definition.name.clone(),
					target,
				};
			}
		}

		Resolution::Resolved(ResolvedRoute {
			definition: Arc::clone(&route.definition),
			name: route.definition.name.clone(),
			view: route.definition.view.clone(),
			params,
			metadata,
			dependencies: route.dependencies.clone(),
			redirects: Vec::new(),
		})
	}

	/// Generates the URL of a named route.
	///
	/// Path parameters are always written. Query parameters are written in
	/// declaration order unless absent or squashed (equal to a squashed
	/// default). Parameters not declared in the URL are not written.
	///
	/// # Errors
	///
	/// [`RouterError::InvalidRouteName`], [`RouterError::AbstractRoute`], or
	/// [`RouterError::MissingParameter`] when a path parameter has neither a
	/// value nor a default.
	pub fn href(&self, name: &str, params: &RouteParams) -> Result<String, RouterError> {
		let index = self.concrete_index(name)?;
		let route = &self.routes[index];
		let Some(pattern) = &route.pattern else {
			return Err(RouterError::InvalidRouteName(name.to_string()));
		};

		let values = route.schema.materialize(&HashMap::new(), &params.as_hash_map());
		let path_values = values.as_hash_map();
		let mut url = pattern
			.reverse(&path_values)
			.ok_or_else(|| RouterError::MissingParameter {
				route: name.to_string(),
				param: pattern
					.param_names()
					.iter()
					.find(|p| !values.contains(p))
					.cloned()
					.unwrap_or_default(),
			})?;

		let mut separator = '?';
		for query_name in pattern.query_names() {
			let Some(value) = values.get(query_name) else {
				continue;
			};
			let squashed = route
				.schema
				.descriptor(query_name)
				.is_some_and(|d| d.is_squashed(Some(value)));
			if squashed {
				continue;
			}
			url.push(separator);
			url.push_str(&urlencoding::encode(query_name));
			url.push('=');
			url.push_str(&urlencoding::encode(value));
			separator = '&';
		}
		Ok(url)
	}

	/// Declared parameter names of `name`, in declaration order.
	pub fn param_names(&self, name: &str) -> Option<&[String]> {
		self.by_name
			.get(name)
			.map(|&index| self.routes[index].schema.names())
	}
}

/// Splits `path?query` and percent-decodes the query.
///
/// `+` is kept literally; status filters are `+`-joined. An undecodable query
/// is treated as malformed input: the path is replaced by one that matches
/// nothing, so resolution falls through to the default route.
pub(crate) fn split_url(url: &str) -> (&str, HashMap<String, String>) {
	let Some((path, query)) = url.split_once('?') else {
		return (url, HashMap::new());
	};
	match decode_query(query) {
		Ok(pairs) => (path, pairs),
		Err(err) => {
			tracing::debug!(url, error = %err, "Malformed query string");
			("", HashMap::new())
		}
	}
}

fn decode_query(query: &str) -> Result<HashMap<String, String>, std::string::FromUtf8Error> {
	let mut pairs = HashMap::new();
	for pair in query.split('&').filter(|pair| !pair.is_empty()) {
		let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
		pairs.insert(
			urlencoding::decode(name)?.into_owned(),
			urlencoding::decode(value)?.into_owned(),
		);
	}
	Ok(pairs)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::client_router::guard::guard;
	use parking_lot::Mutex;
	use rstest::{fixture, rstest};

	fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect()
	}

	#[fixture]
	fn table() -> RouteTable {
		RouteTable::builder()
			.route(RouteDefinition::new("login").url("/login").view("login.html"))
			.route(
				RouteDefinition::new("pages")
					.layout()
					.view("content.html")
					.metadata(RouteMetadata::new().title("Console")),
			)
			.route(RouteDefinition::new("pages.loading").url("/"))
			.route(
				RouteDefinition::new("pages.status")
					.url("/status?configuration&filter&search")
					.param("configuration", ParamDescriptor::value("All").squash())
					.param("filter", ParamDescriptor::value("started+stopped+warning").squash())
					.param("search", ParamDescriptor::value("").squash())
					.metadata(RouteMetadata::new().title("Adapter Status")),
			)
			.route(
				RouteDefinition::new("pages.edit_schedule")
					.url("/scheduler/edit/:group/:name")
					.param("group", "")
					.param("name", ""),
			)
			.route(
				RouteDefinition::new("pages.storage")
					.layout()
					.url("/adapters/:adapter/:storageSource/:storageSourceName/")
					.dependency("datatables"),
			)
			.route(
				RouteDefinition::new("pages.storage.list")
					.url("stores/:processState")
					.dependency("datatables"),
			)
			.route(RouteDefinition::new("pages.monitors_edit").url("/monitors/:monitor/triggers/:trigger"))
			.route(RouteDefinition::new("pages.monitors_add").url("/monitors/:monitor/triggers/new"))
			.build()
			.unwrap()
	}

	#[rstest]
	fn test_exact_and_param_match(table: RouteTable) {
		let services = GuardServices::default();

		let resolved = table
			.resolve("/scheduler/edit/GROUP1/JOB1", &HashMap::new(), &services)
			.unwrap();

		assert_eq!(resolved.name(), "pages.edit_schedule");
		assert_eq!(resolved.params().get("group"), Some("GROUP1"));
		assert_eq!(resolved.params().get("name"), Some("JOB1"));
	}

	#[rstest]
	#[case("/does-not-exist")]
	#[case("no-leading-slash")]
	#[case("/scheduler/edit/%FF/JOB1")]
	fn test_unmatched_and_malformed_fall_back_to_default(table: RouteTable, #[case] url: &str) {
		let resolved = table.resolve_url(url, &GuardServices::default()).unwrap();
		assert_eq!(resolved.name(), "pages.loading");
	}

	#[rstest]
	fn test_most_literal_segments_wins(table: RouteTable) {
		assert_eq!(table.match_name("/monitors/M1/triggers/new"), Some("pages.monitors_add"));
		assert_eq!(table.match_name("/monitors/M1/triggers/T1"), Some("pages.monitors_edit"));
	}

	#[rstest]
	fn test_tie_resolves_to_first_registered() {
		let table = RouteTable::builder()
			.route(RouteDefinition::new("home").url("/"))
			.route(RouteDefinition::new("first").url("/items/:id"))
			.route(RouteDefinition::new("second").url("/items/:key"))
			.build()
			.unwrap();

		assert_eq!(table.match_name("/items/7"), Some("first"));
	}

	#[rstest]
	fn test_defaults_and_query_materialization(table: RouteTable) {
		let services = GuardServices::default();

		let resolved = table
			.resolve("/status", &query(&[("configuration", "IAF_Util")]), &services)
			.unwrap();

		assert_eq!(resolved.params().get("configuration"), Some("IAF_Util"));
		assert_eq!(resolved.params().get("filter"), Some("started+stopped+warning"));
		assert_eq!(resolved.params().get("search"), Some(""));
		assert_eq!(resolved.metadata().page_title.as_deref(), Some("Adapter Status"));

		let resolved = table
			.resolve_url("/status?filter=started+warning&search=my%20adapter", &services)
			.unwrap();

		assert_eq!(resolved.params().get("filter"), Some("started+warning"));
		assert_eq!(resolved.params().get("search"), Some("my adapter"));
		assert_eq!(
			table.href("pages.status", resolved.params()).unwrap(),
			"/status?filter=started%2Bwarning&search=my%20adapter"
		);
	}

	#[rstest]
	#[case("/status?filter=%FF")]
	#[case("/status?%FE=started")]
	fn test_undecodable_query_falls_back_to_default(table: RouteTable, #[case] url: &str) {
		let resolved = table.resolve_url(url, &GuardServices::default()).unwrap();
		assert_eq!(resolved.name(), "pages.loading");
	}

	#[rstest]
	fn test_undeclared_query_is_ignored() {
		let table = RouteTable::builder()
			.route(RouteDefinition::new("home").url("/"))
			.route(
				RouteDefinition::new("view")
					.url("/view/:name")
					.param("url", ParamDescriptor::value("").squash()),
			)
			.build()
			.unwrap();
		let services = GuardServices::default();

		let from_query = table
			.resolve("/view/a", &query(&[("url", "larva")]), &services)
			.unwrap();
		let from_params = table
			.resolve_named("view", &RouteParams::from_pairs([("name", "a"), ("url", "larva")]), &services)
			.unwrap();

		assert_eq!(from_query.params().get("url"), Some(""));
		assert_eq!(from_params.params().get("url"), Some("larva"));
	}

	#[rstest]
	fn test_nested_route_inherits_url_and_dependencies(table: RouteTable) {
		assert_eq!(
			table.pattern_of("pages.storage.list").map(|p| p.pattern()),
			Some("/adapters/:adapter/:storageSource/:storageSourceName/stores/:processState")
		);

		let resolved = table
			.resolve(
				"/adapters/A1/receivers/R1/stores/Error",
				&HashMap::new(),
				&GuardServices::default(),
			)
			.unwrap();

		assert_eq!(resolved.name(), "pages.storage.list");
		assert_eq!(resolved.params().get("storageSourceName"), Some("R1"));
		assert_eq!(resolved.dependencies(), &["datatables".to_string()]);
		assert_eq!(resolved.metadata().page_title.as_deref(), Some("Console"));
	}

	#[rstest]
	fn test_duplicate_route_rejected() {
		let result = RouteTable::builder()
			.route(RouteDefinition::new("home").url("/"))
			.route(RouteDefinition::new("home").url("/other"))
			.build();
		assert!(matches!(result, Err(RouterError::DuplicateRoute(name)) if name == "home"));
	}

	#[rstest]
	fn test_invalid_pattern_rejected() {
		let result = RouteTable::builder()
			.route(RouteDefinition::new("home").url("/"))
			.route(RouteDefinition::new("broken").url("/users/{id"))
			.build();
		assert!(matches!(result, Err(RouterError::InvalidPattern { route, .. }) if route == "broken"));
	}

	#[rstest]
	fn test_concrete_route_without_url_rejected() {
		let result = RouteTable::builder()
			.route(RouteDefinition::new("home").url("/"))
			.route(RouteDefinition::new("orphan"))
			.build();
		assert!(matches!(result, Err(RouterError::InvalidPattern { .. })));
	}

	#[rstest]
	fn test_default_must_match_a_concrete_route() {
		let result = RouteTable::builder()
			.route(RouteDefinition::new("login").url("/login"))
			.build();
		assert_eq!(result.unwrap_err(), RouterError::InvalidDefault("/".to_string()));
	}

	#[rstest]
	fn test_guards_run_root_to_leaf() {
		// Arrange
		let order = Arc::new(Mutex::new(Vec::new()));
		let recorder = |label: &'static str| {
			let order = Arc::clone(&order);
			guard(move |ctx| {
				order.lock().push(format!("{}:{}", label, ctx.route_name));
				GuardOutcome::Continue
			})
		};
		let table = RouteTable::builder()
			.route(RouteDefinition::new("pages").layout().guard(recorder("pages")))
			.route(RouteDefinition::new("pages.a").layout().url("/a").guard(recorder("a")))
			.route(RouteDefinition::new("pages.a.b").url("/b").guard(recorder("b")))
			.otherwise("/a/b")
			.build()
			.unwrap();
		order.lock().clear();

		// Act
		table
			.resolve("/a/b", &HashMap::new(), &GuardServices::default())
			.unwrap();

		// Assert
		assert_eq!(
			*order.lock(),
			vec!["pages:pages.a.b", "a:pages.a.b", "b:pages.a.b"]
		);
	}

	#[rstest]
	fn test_guard_redirect_restarts_resolution() {
		let table = RouteTable::builder()
			.route(RouteDefinition::new("home").url("/"))
			.route(RouteDefinition::new("target").url("/target/:id"))
			.route(RouteDefinition::new("source").url("/source").guard(guard(|_| {
				GuardOutcome::Redirect(RedirectTarget::route_with(
					"target",
					RouteParams::from_pairs([("id", "7")]),
				))
			})))
			.build()
			.unwrap();

		let resolved = table
			.resolve("/source", &HashMap::new(), &GuardServices::default())
			.unwrap();

		assert_eq!(resolved.name(), "target");
		assert_eq!(resolved.params().get("id"), Some("7"));
		assert_eq!(resolved.redirects(), &["source".to_string()]);
	}

	#[rstest]
	fn test_redirect_loop_is_bounded() {
		let table = RouteTable::builder()
			.route(RouteDefinition::new("home").url("/"))
			.route(
				RouteDefinition::new("ping")
					.url("/ping")
					.guard(guard(|_| GuardOutcome::Redirect(RedirectTarget::path("/pong")))),
			)
			.route(
				RouteDefinition::new("pong")
					.url("/pong")
					.guard(guard(|_| GuardOutcome::Redirect(RedirectTarget::route("ping")))),
			)
			.build()
			.unwrap();

		let err = table
			.resolve("/ping", &HashMap::new(), &GuardServices::default())
			.unwrap_err();

		match err {
			RouterError::RoutingLoop { limit, trail } => {
				assert_eq!(limit, MAX_REDIRECT_HOPS);
				assert_eq!(trail.len(), MAX_REDIRECT_HOPS + 1);
				assert_eq!(trail[0], "ping");
				assert_eq!(trail[1], "pong");
			}
			other => panic!("unexpected error: {other}"),
		}
	}

	#[rstest]
	fn test_href_squashes_defaults(table: RouteTable) {
		assert_eq!(table.href("pages.status", &RouteParams::new()).unwrap(), "/status");
		assert_eq!(
			table
				.href(
					"pages.status",
					&RouteParams::from_pairs([("configuration", "IAF_Util"), ("search", "my adapter")])
				)
				.unwrap(),
			"/status?configuration=IAF_Util&search=my%20adapter"
		);
	}

	#[rstest]
	fn test_href_round_trip(table: RouteTable) {
		let services = GuardServices::default();
		let params = RouteParams::from_pairs([
			("adapter", "Adapter One"),
			("storageSource", "receivers"),
			("storageSourceName", "R/1"),
			("processState", "Error"),
		]);

		let url = table.href("pages.storage.list", &params).unwrap();
		let resolved = table.resolve_url(&url, &services).unwrap();

		assert_eq!(resolved.name(), "pages.storage.list");
		assert_eq!(resolved.params(), &params);
	}

	#[rstest]
	fn test_href_errors(table: RouteTable) {
		assert_eq!(
			table.href("pages", &RouteParams::new()),
			Err(RouterError::AbstractRoute("pages".to_string()))
		);
		assert_eq!(
			table.href("nope", &RouteParams::new()),
			Err(RouterError::InvalidRouteName("nope".to_string()))
		);
		assert_eq!(
			table.href("pages.storage.list", &RouteParams::new()),
			Err(RouterError::MissingParameter {
				route: "pages.storage.list".to_string(),
				param: "adapter".to_string(),
			})
		);
	}

	#[rstest]
	fn test_resolution_is_idempotent(table: RouteTable) {
		let services = GuardServices::default();
		let first = table
			.resolve_url("/status?configuration=X&filter=started", &services)
			.unwrap();
		let second = table
			.resolve_url("/status?configuration=X&filter=started", &services)
			.unwrap();
		assert_eq!(first, second);
	}

	#[rstest]
	fn test_resolved_route_serializes_without_definition(table: RouteTable) {
		let resolved = table
			.resolve("/login", &HashMap::new(), &GuardServices::default())
			.unwrap();
		let json = serde_json::to_value(&resolved).unwrap();
		assert_eq!(json["name"], "login");
		assert_eq!(json["view"], "login.html");
		assert!(json.get("definition").is_none());
	}
}
