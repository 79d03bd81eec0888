//! Error types for client-side routing.

use super::bundle::BundleError;

/// Error type for typed parameter access.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
	/// Failed to parse a parameter value.
	#[error("Failed to parse parameter '{param}' value '{raw_value}' as {param_type}: {reason}")]
	ParseError {
		/// Name of the parameter that failed to parse.
		param: String,
		/// Expected type name.
		param_type: &'static str,
		/// Raw string value that failed to parse.
		raw_value: String,
		/// Error message from parsing.
		reason: String,
	},
	/// The parameter has no value.
	#[error("Missing parameter: {0}")]
	Missing(String),
}

/// Error type for route table construction, resolution and navigation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouterError {
	/// A route pattern failed to compile.
	#[error("Invalid route pattern '{pattern}' for '{route}': {reason}")]
	InvalidPattern {
		route: String,
		pattern: String,
		reason: String,
	},
	/// Two routes were registered under the same name.
	#[error("Duplicate route name: {0}")]
	DuplicateRoute(String),
	/// The default path does not resolve to a concrete route.
	#[error("Default path '{0}' does not match any concrete route")]
	InvalidDefault(String),
	/// Unknown route name.
	#[error("Invalid route name: {0}")]
	InvalidRouteName(String),
	/// Abstract routes cannot be activated or linked to.
	#[error("Route '{0}' is abstract")]
	AbstractRoute(String),
	/// Missing parameter for reverse URL.
	#[error("Missing parameter '{param}' for route '{route}'")]
	MissingParameter { route: String, param: String },
	/// Guards kept redirecting past the hop limit.
	#[error("Routing loop: more than {limit} redirects ({})", trail.join(" -> "))]
	RoutingLoop { limit: usize, trail: Vec<String> },
	/// A dependency bundle failed to load; the route was not activated.
	#[error("Failed to load dependencies of '{route}': {source}")]
	DependencyLoad { route: String, source: BundleError },
}
