//! Declarative route tables for single-page consoles.
//!
//! Routes are declared once as [`RouteDefinition`]s and compiled into an
//! immutable [`RouteTable`]. The table resolves URLs to routes, runs guards,
//! and generates URLs back from route names. A [`Navigator`] adds lazy bundle
//! loading and keeps track of the active route.
//!
//! ## Example
//!
//! ```
//! use std::collections::HashMap;
//! use beheer_urls::{GuardServices, ParamDescriptor, RouteDefinition, RouteParams, RouteTable};
//!
//! let table = RouteTable::builder()
//!     .route(RouteDefinition::new("home").url("/"))
//!     .route(
//!         RouteDefinition::new("status")
//!             .url("/status?filter")
//!             .param("filter", ParamDescriptor::value("all").squash()),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let resolved = table
//!     .resolve("/status", &HashMap::new(), &GuardServices::default())
//!     .unwrap();
//! assert_eq!(resolved.params().get("filter"), Some("all"));
//! assert_eq!(table.href("status", &RouteParams::new()).unwrap(), "/status");
//! ```

pub mod client_router;

pub use client_router::{
	Authenticator, BundleDefinition, BundleError, BundleFetcher, BundleLoader, BundleRegistry,
	ClientPathPattern, DEFAULT_PATH, ExternalOpener, Guard, GuardContext, GuardOutcome,
	GuardServices, LocationMode, LoggingOpener, MAX_REDIRECT_HOPS, MemorySession,
	NavigationOutcome, Navigator, ParamDescriptor, PathError, RedirectTarget, Resolution,
	ResolvedRoute, RouteDefinition, RouteMetadata, RouteParams, RouteTable, RouteTableBuilder,
	RouterError, SessionStore, StaticAuthenticator, guard,
};
