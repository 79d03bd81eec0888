//! Route parameters: declarations, materialization and typed access.
//!
//! Every parameter a route knows about is declared either in its URL pattern
//! (path segment or query list) or in its parameter descriptors. Resolution
//! materializes all of them: the supplied value wins, otherwise the
//! descriptor's default applies. Values stay strings; consumers interpret
//! them (see [`RouteParams::parse`]).

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use serde::Serialize;

use super::error::PathError;

/// Descriptor for one route parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamDescriptor {
	/// Value used when none is supplied. `None` means the parameter is absent.
	pub default_value: Option<String>,
	/// Omit the value from generated URLs when it equals the default.
	pub squash: bool,
}

impl ParamDescriptor {
	/// A parameter defaulting to `value`, not squashed.
	pub fn value(value: impl Into<String>) -> Self {
		Self {
			default_value: Some(value.into()),
			squash: false,
		}
	}

	/// A parameter without a default value.
	pub fn null() -> Self {
		Self::default()
	}

	/// Marks the parameter as squashed.
	pub fn squash(mut self) -> Self {
		self.squash = true;
		self
	}

	/// Returns whether `value` would be omitted from a generated URL.
	pub fn is_squashed(&self, value: Option<&str>) -> bool {
		self.squash && value == self.default_value.as_deref()
	}
}

impl From<&str> for ParamDescriptor {
	fn from(value: &str) -> Self {
		Self::value(value)
	}
}

/// Materialized parameter values of a resolved route, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RouteParams(BTreeMap<String, String>);

impl RouteParams {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds parameters from `(name, value)` pairs.
	pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
	where
		K: Into<String>,
		V: Into<String>,
	{
		Self(
			pairs
				.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
		)
	}

	pub fn get(&self, name: &str) -> Option<&str> {
		self.0.get(name).map(String::as_str)
	}

	/// Returns the value, or `""` when absent.
	pub fn get_or_empty(&self, name: &str) -> &str {
		self.get(name).unwrap_or("")
	}

	pub fn contains(&self, name: &str) -> bool {
		self.0.contains_key(name)
	}

	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.0.insert(name.into(), value.into());
	}

	pub fn remove(&mut self, name: &str) -> Option<String> {
		self.0.remove(name)
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	/// Parses a parameter into `T`.
	///
	/// # Errors
	///
	/// [`PathError::Missing`] if absent, [`PathError::ParseError`] if the
	/// value does not parse.
	pub fn parse<T>(&self, name: &str) -> Result<T, PathError>
	where
		T: FromStr,
		T::Err: std::fmt::Display,
	{
		let raw = self
			.get(name)
			.ok_or_else(|| PathError::Missing(name.to_string()))?;
		raw.parse::<T>().map_err(|e| PathError::ParseError {
			param: name.to_string(),
			param_type: std::any::type_name::<T>(),
			raw_value: raw.to_string(),
			reason: e.to_string(),
		})
	}

	pub(crate) fn as_hash_map(&self) -> HashMap<String, String> {
		self.0.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
	}
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RouteParams {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self::from_pairs(iter)
	}
}

/// Parameter declarations of one route, ancestors included.
#[derive(Debug, Clone, Default)]
pub(crate) struct ParamSchema {
	/// Declared names in declaration order.
	names: Vec<String>,
	descriptors: HashMap<String, ParamDescriptor>,
}

impl ParamSchema {
	pub(crate) fn declare(&mut self, name: &str) {
		if !self.names.iter().any(|n| n == name) {
			self.names.push(name.to_string());
		}
	}

	/// Declares `name` with `descriptor`, replacing an inherited descriptor.
	pub(crate) fn describe(&mut self, name: &str, descriptor: ParamDescriptor) {
		self.declare(name);
		self.descriptors.insert(name.to_string(), descriptor);
	}

	pub(crate) fn descriptor(&self, name: &str) -> Option<&ParamDescriptor> {
		self.descriptors.get(name)
	}

	pub(crate) fn names(&self) -> &[String] {
		&self.names
	}

	/// Materializes every declared parameter.
	///
	/// `path_values` are captured path segments; an empty segment of a
	/// squashed parameter reads back as its default. `supplied` are query or
	/// programmatic values. Undeclared supplied keys are ignored.
	pub(crate) fn materialize(
		&self,
		path_values: &HashMap<String, String>,
		supplied: &HashMap<String, String>,
	) -> RouteParams {
		let mut params = RouteParams::new();
		for name in &self.names {
			let descriptor = self.descriptors.get(name);
			let captured = path_values.get(name).filter(|value| {
				!(value.is_empty() && descriptor.is_some_and(|d| d.squash))
			});
			let value = captured
				.or_else(|| supplied.get(name))
				.cloned()
				.or_else(|| descriptor.and_then(|d| d.default_value.clone()));
			if let Some(value) = value {
				params.insert(name.clone(), value);
			}
		}
		params
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};

	#[fixture]
	fn status_schema() -> ParamSchema {
		let mut schema = ParamSchema::default();
		schema.describe("configuration", ParamDescriptor::value("All").squash());
		schema.describe(
			"filter",
			ParamDescriptor::value("started+stopped+warning").squash(),
		);
		schema.describe("search", ParamDescriptor::value("").squash());
		schema.describe("adapter", ParamDescriptor::value("").squash());
		schema
	}

	#[rstest]
	fn test_defaults_apply_when_absent(status_schema: ParamSchema) {
		let params = status_schema.materialize(&HashMap::new(), &HashMap::new());

		assert_eq!(params.get("configuration"), Some("All"));
		assert_eq!(params.get("filter"), Some("started+stopped+warning"));
		assert_eq!(params.get("search"), Some(""));
		assert_eq!(params.len(), 4);
	}

	#[rstest]
	fn test_supplied_values_win(status_schema: ParamSchema) {
		let supplied = HashMap::from([("configuration".to_string(), "IAF_Util".to_string())]);
		let params = status_schema.materialize(&HashMap::new(), &supplied);
		assert_eq!(params.get("configuration"), Some("IAF_Util"));
	}

	#[rstest]
	fn test_undeclared_supplied_keys_are_ignored(status_schema: ParamSchema) {
		let supplied = HashMap::from([("bogus".to_string(), "1".to_string())]);
		let params = status_schema.materialize(&HashMap::new(), &supplied);
		assert!(!params.contains("bogus"));
	}

	#[rstest]
	fn test_null_default_is_absent() {
		let mut schema = ParamSchema::default();
		schema.describe("directory", ParamDescriptor::null());
		let params = schema.materialize(&HashMap::new(), &HashMap::new());
		assert!(params.is_empty());
	}

	#[rstest]
	fn test_empty_squashed_segment_reads_back_as_default() {
		let mut schema = ParamSchema::default();
		schema.describe("adapter", ParamDescriptor::value("Main").squash());
		schema.describe("name", ParamDescriptor::value("x"));
		let path = HashMap::from([
			("adapter".to_string(), String::new()),
			("name".to_string(), String::new()),
		]);

		let params = schema.materialize(&path, &HashMap::new());

		assert_eq!(params.get("adapter"), Some("Main"));
		assert_eq!(params.get("name"), Some(""));
	}

	#[rstest]
	#[case(ParamDescriptor::value("All").squash(), Some("All"), true)]
	#[case(ParamDescriptor::value("All").squash(), Some("Other"), false)]
	#[case(ParamDescriptor::value("All"), Some("All"), false)]
	#[case(ParamDescriptor::null().squash(), None, true)]
	fn test_is_squashed(
		#[case] descriptor: ParamDescriptor,
		#[case] value: Option<&str>,
		#[case] expected: bool,
	) {
		assert_eq!(descriptor.is_squashed(value), expected);
	}

	#[rstest]
	fn test_parse_typed_values() {
		let params = RouteParams::from_pairs([("id", "42"), ("name", "abc")]);

		assert_eq!(params.parse::<i64>("id"), Ok(42));
		assert!(matches!(
			params.parse::<i64>("name"),
			Err(PathError::ParseError { ref raw_value, .. }) if raw_value == "abc"
		));
		assert_eq!(
			params.parse::<i64>("missing"),
			Err(PathError::Missing("missing".to_string()))
		);
	}
}
