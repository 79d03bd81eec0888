//! Path pattern matching for console routes.
//!
//! Patterns are written the way the console declares its routes:
//!
//! - `/scheduler` - exact match
//! - `/scheduler/edit/:group/:name` - named segments
//! - `/adapters/{adapter}/` - braces are accepted as an alternative spelling
//! - `/status?configuration&filter&search` - trailing list of query parameters
//!
//! A named segment captures one path segment, which may be empty. Captured
//! values are percent-decoded; undecodable input makes the pattern not match.

use std::collections::HashMap;

/// Maximum allowed length for a client-side URL pattern string in bytes.
const MAX_CLIENT_PATTERN_LENGTH: usize = 1024;

/// Maximum allowed number of path segments in a client-side URL pattern.
const MAX_CLIENT_PATH_SEGMENTS: usize = 32;

/// Maximum allowed size for compiled regex in client-side patterns (in bytes).
const MAX_CLIENT_REGEX_SIZE: usize = 1 << 20; // 1 MiB

/// One piece of a compiled path template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
	Literal(String),
	Param(String),
}

/// A compiled route pattern.
#[derive(Debug, Clone)]
pub struct ClientPathPattern {
	/// The original pattern string, including the query list.
	pattern: String,
	/// Path template tokens, used for reverse generation.
	tokens: Vec<Token>,
	/// Compiled regex for the path part.
	regex: regex::Regex,
	/// Path parameter names in order.
	param_names: Vec<String>,
	/// Declared query parameter names in order.
	query_names: Vec<String>,
	/// Number of path segments without any parameter.
	literal_segments: usize,
}

impl ClientPathPattern {
	/// Compiles a pattern string.
	///
	/// # Errors
	///
	/// Returns a description of the problem if:
	/// - the pattern exceeds 1024 bytes or 32 path segments
	/// - a parameter name is empty or a brace is unclosed
	/// - the pattern compiles to an invalid regex
	pub fn new(pattern: &str) -> Result<Self, String> {
		// Reject patterns exceeding the maximum length to prevent ReDoS
		if pattern.len() > MAX_CLIENT_PATTERN_LENGTH {
			return Err(format!(
				"Pattern length {} exceeds maximum allowed length of {} bytes",
				pattern.len(),
				MAX_CLIENT_PATTERN_LENGTH
			));
		}

		let (path, query) = match pattern.split_once('?') {
			Some((path, query)) => (path, Some(query)),
			None => (pattern, None),
		};

		let segment_count = path.split('/').count();
		if segment_count > MAX_CLIENT_PATH_SEGMENTS {
			return Err(format!(
				"Pattern has {} path segments, exceeding maximum of {}",
				segment_count, MAX_CLIENT_PATH_SEGMENTS
			));
		}

		let tokens = Self::tokenize(path)?;
		let param_names: Vec<String> = tokens
			.iter()
			.filter_map(|t| match t {
				Token::Param(name) => Some(name.clone()),
				Token::Literal(_) => None,
			})
			.collect();

		let query_names: Vec<String> = query
			.map(|q| {
				q.split('&')
					.filter(|name| !name.is_empty())
					.map(str::to_string)
					.collect()
			})
			.unwrap_or_default();

		let literal_segments = path
			.split('/')
			.filter(|seg| !seg.is_empty() && !seg.contains(':') && !seg.contains('{'))
			.count();

		let regex_str = Self::compile_tokens(&tokens);

		// Use RegexBuilder with size limits to prevent memory exhaustion
		let regex = regex::RegexBuilder::new(&regex_str)
			.size_limit(MAX_CLIENT_REGEX_SIZE)
			.build()
			.map_err(|e| format!("Failed to compile pattern regex: {}", e))?;

		Ok(Self {
			pattern: pattern.to_string(),
			tokens,
			regex,
			param_names,
			query_names,
			literal_segments,
		})
	}

	/// Splits a path template into literal and parameter tokens.
	fn tokenize(path: &str) -> Result<Vec<Token>, String> {
		let mut tokens = Vec::new();
		let mut literal = String::new();
		let mut chars = path.chars().peekable();

		while let Some(c) = chars.next() {
			match c {
				':' => {
					let mut name = String::new();
					while let Some(&next) = chars.peek() {
						if next.is_ascii_alphanumeric() || next == '_' {
							name.push(next);
							chars.next();
						} else {
							break;
						}
					}
					if name.is_empty() {
						return Err(format!("Empty parameter name in '{}'", path));
					}
					if !literal.is_empty() {
						tokens.push(Token::Literal(std::mem::take(&mut literal)));
					}
					tokens.push(Token::Param(name));
				}
				'{' => {
					let mut name = String::new();
					let mut closed = false;
					for next in chars.by_ref() {
						if next == '}' {
							closed = true;
							break;
						}
						name.push(next);
					}
					if !closed {
						return Err(format!("Unclosed '{{' in '{}'", path));
					}
					if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
					{
						return Err(format!("Invalid parameter name '{}' in '{}'", name, path));
					}
					if !literal.is_empty() {
						tokens.push(Token::Literal(std::mem::take(&mut literal)));
					}
					tokens.push(Token::Param(name));
				}
				_ => literal.push(c),
			}
		}

		if !literal.is_empty() {
			tokens.push(Token::Literal(literal));
		}
		Ok(tokens)
	}

	fn compile_tokens(tokens: &[Token]) -> String {
		let mut regex_str = String::from("^");
		for token in tokens {
			match token {
				Token::Literal(text) => regex_str.push_str(&regex::escape(text)),
				// A segment may be empty: `/configurations/manage/` captures name = "".
				Token::Param(name) => regex_str.push_str(&format!("(?P<{}>[^/]*)", name)),
			}
		}
		regex_str.push('$');
		regex_str
	}

	/// Joins route URL fragments, parent first, into one pattern string.
	///
	/// Path parts are concatenated verbatim and query lists are merged:
	/// `compose(&["/adapters/:a/?x", "stores/:s?y"])` is `/adapters/:a/stores/:s?x&y`.
	pub fn compose(fragments: &[&str]) -> String {
		let mut path = String::new();
		let mut query: Vec<&str> = Vec::new();
		for fragment in fragments {
			let (p, q) = match fragment.split_once('?') {
				Some((p, q)) => (p, Some(q)),
				None => (*fragment, None),
			};
			path.push_str(p);
			if let Some(q) = q {
				query.extend(q.split('&').filter(|name| !name.is_empty()));
			}
		}
		if query.is_empty() {
			path
		} else {
			format!("{}?{}", path, query.join("&"))
		}
	}

	/// Returns the original pattern string.
	pub fn pattern(&self) -> &str {
		&self.pattern
	}

	/// Returns the path parameter names.
	pub fn param_names(&self) -> &[String] {
		&self.param_names
	}

	/// Returns the declared query parameter names.
	pub fn query_names(&self) -> &[String] {
		&self.query_names
	}

	/// Returns whether `name` appears in the path or the query list.
	pub fn declares(&self, name: &str) -> bool {
		self.param_names.iter().any(|n| n == name) || self.query_names.iter().any(|n| n == name)
	}

	/// Number of path segments that contain no parameter. Higher is more specific.
	pub fn literal_segments(&self) -> usize {
		self.literal_segments
	}

	/// Attempts to match a path against this pattern.
	///
	/// Returns the percent-decoded path parameters, or `None` when the path
	/// does not match or a captured value is not valid percent-encoding.
	pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
		let caps = self.regex.captures(path)?;
		let mut params = HashMap::with_capacity(self.param_names.len());
		for name in &self.param_names {
			let raw = caps.name(name)?.as_str();
			let decoded = urlencoding::decode(raw).ok()?;
			params.insert(name.clone(), decoded.into_owned());
		}
		Some(params)
	}

	/// Checks if this pattern would match the given path.
	pub fn is_match(&self, path: &str) -> bool {
		self.matches(path).is_some()
	}

	/// Generates the path part from the given parameters.
	///
	/// Values are percent-encoded. Returns `None` when a path parameter is missing.
	pub fn reverse(&self, params: &HashMap<String, String>) -> Option<String> {
		let mut result = String::new();
		for token in &self.tokens {
			match token {
				Token::Literal(text) => result.push_str(text),
				Token::Param(name) => {
					let value = params.get(name)?;
					result.push_str(&urlencoding::encode(value));
				}
			}
		}
		Some(result)
	}

	/// Returns whether this is an exact match pattern (no path parameters).
	pub fn is_exact(&self) -> bool {
		self.param_names.is_empty()
	}
}

impl PartialEq for ClientPathPattern {
	fn eq(&self, other: &Self) -> bool {
		self.pattern == other.pattern
	}
}

impl Eq for ClientPathPattern {}

impl std::fmt::Display for ClientPathPattern {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.pattern)
	}
}
