//! Client-side router for the console shell.
//!
//! ## Modules
//!
//! - [`pattern`]: URL pattern compilation and matching
//! - [`params`]: parameter descriptors and materialized values
//! - [`guard`]: pre-activation guards and their services
//! - [`bundle`]: memoized loading of plugin bundles
//! - [`core`]: the route table and resolver
//! - [`navigation`]: activation and the active-route pointer

pub mod bundle;
pub mod core;
pub mod error;
pub mod guard;
pub mod navigation;
pub mod params;
pub mod pattern;

pub use bundle::{BundleDefinition, BundleError, BundleFetcher, BundleLoader, BundleRegistry};
pub use self::core::{
	DEFAULT_PATH, MAX_REDIRECT_HOPS, Resolution, ResolvedRoute, RouteDefinition, RouteTable,
	RouteTableBuilder,
};
pub use error::{PathError, RouterError};
pub use guard::{
	Authenticator, ExternalOpener, Guard, GuardContext, GuardOutcome, GuardServices, LoggingOpener,
	MemorySession, RedirectTarget, RouteMetadata, SessionStore, StaticAuthenticator, guard,
};
pub use navigation::{LocationMode, NavigationOutcome, Navigator};
pub use params::{ParamDescriptor, RouteParams};
pub use pattern::ClientPathPattern;
