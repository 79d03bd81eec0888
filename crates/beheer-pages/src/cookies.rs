//! Cookie security defaults for the console.
//!
//! Cookies written by the console are `Secure` exactly when the console is
//! served over `https`, and always `SameSite=Strict`.

use serde::Serialize;
use url::Url;

/// `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SameSite {
	Strict,
	Lax,
	None,
}

impl SameSite {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Strict => "Strict",
			Self::Lax => "Lax",
			Self::None => "None",
		}
	}
}

/// Attributes applied to every cookie the console writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CookieDefaults {
	pub secure: bool,
	pub same_site: SameSite,
	pub path: Option<String>,
}

impl Default for CookieDefaults {
	fn default() -> Self {
		Self {
			secure: false,
			same_site: SameSite::Strict,
			path: None,
		}
	}
}

impl CookieDefaults {
	/// Derives the defaults from the URL the console was loaded from.
	pub fn for_origin(origin: &str) -> Result<Self, url::ParseError> {
		let url = Url::parse(origin)?;
		Ok(Self::for_scheme(url.scheme()))
	}

	/// Derives the defaults from a URL scheme (`http`, `https`).
	pub fn for_scheme(scheme: &str) -> Self {
		Self {
			secure: scheme.eq_ignore_ascii_case("https"),
			..Self::default()
		}
	}

	pub fn with_path(mut self, path: impl Into<String>) -> Self {
		self.path = Some(path.into());
		self
	}

	/// Renders the attribute part of a `Set-Cookie` header, starting with `; `.
	pub fn attributes(&self) -> String {
		let mut attrs = String::new();
		if let Some(path) = &self.path {
			attrs.push_str("; Path=");
			attrs.push_str(path);
		}
		attrs.push_str("; SameSite=");
		attrs.push_str(self.same_site.as_str());
		if self.secure {
			attrs.push_str("; Secure");
		}
		attrs
	}

	/// Renders a complete `Set-Cookie` value for `name=value`.
	pub fn set_cookie(&self, name: &str, value: &str) -> String {
		format!("{}={}{}", name, value, self.attributes())
	}
}
