//! # Beheer
//!
//! Client-side routing for the Beheer administrative console.
//!
//! The console is a single-page application: one shell, many views. This
//! crate decides which view a browser location maps to, which parameters it
//! carries, which guards may redirect it, which plugin bundles it needs
//! before it can be shown, and how a location is generated back from a route
//! name.
//!
//! ## Feature Flags
//!
//! - `minimal` - Router only (route tables, resolution, bundles, navigation)
//! - `full` (default) - Everything below
//!
//! ### Fine-grained Control
//!
//! - `urls` - [`beheer_urls`]: route tables, resolver, bundle loader, navigator
//! - `conf` - [`beheer_conf`]: console settings from files and environment
//! - `pages` - [`beheer_pages`]: diagnostics, idle watchdog, guarded callbacks, cookies
//! - `console` - [`beheer_console`]: the concrete console route table and bootstrap
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use beheer::prelude::*;
//!
//! let table = RouteTable::builder()
//!     .route(RouteDefinition::new("home").url("/"))
//!     .route(
//!         RouteDefinition::new("schedule")
//!             .url("/scheduler/edit/:group/:name")
//!             .metadata(RouteMetadata::new().title("Edit Schedule")),
//!     )
//!     .otherwise("/")
//!     .build()?;
//!
//! let resolved = table.resolve_url("/scheduler/edit/G1/J1", &GuardServices::default())?;
//! assert_eq!(resolved.params().get("group"), Some("G1"));
//! ```

#[cfg(feature = "urls")]
pub use beheer_urls as urls;

#[cfg(feature = "conf")]
pub use beheer_conf as conf;

#[cfg(feature = "pages")]
pub use beheer_pages as pages;

#[cfg(feature = "console")]
pub use beheer_console as console;

/// Commonly used types.
pub mod prelude {
	#[cfg(feature = "urls")]
	pub use beheer_urls::{
		BundleDefinition, BundleFetcher, BundleLoader, BundleRegistry, GuardContext,
		GuardOutcome, GuardServices, LocationMode, NavigationOutcome, Navigator, ParamDescriptor,
		RedirectTarget, ResolvedRoute, RouteDefinition, RouteMetadata, RouteParams, RouteTable,
		RouterError, guard,
	};

	#[cfg(feature = "conf")]
	pub use beheer_conf::{ConsoleSettings, SettingsError};

	#[cfg(feature = "pages")]
	pub use beheer_pages::{CookieDefaults, DiagnosticsContext, IdleWatchdog, Severity};

	#[cfg(feature = "console")]
	pub use beheer_console::{Collaborators, Console, init_logging};
}
