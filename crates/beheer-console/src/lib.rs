//! The Beheer administrative console.
//!
//! Ties the router, settings and runtime hooks together into the concrete
//! console: its route table ([`routes`]), the guards that fill in page
//! titles, breadcrumbs and embedded URLs ([`guards`]), the on-demand plugin
//! bundles ([`bundles`]) and the startup sequence ([`bootstrap`]).
//!
//! ## Example
//!
//! ```no_run
//! use beheer_conf::ConsoleSettings;
//! use beheer_console::{Collaborators, Console};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = ConsoleSettings::from_env()?;
//! let console = Console::start(settings, Collaborators::default())?;
//!
//! console.navigator().navigate_url("/configurations/manage/Foo").await?;
//! if let Some(active) = console.navigator().active() {
//!     println!("{:?}", active.metadata().breadcrumbs);
//! }
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod bundles;
pub mod guards;
pub mod logging;
pub mod routes;

pub use bootstrap::{BootstrapError, Collaborators, Console};
pub use bundles::{CHARTJS, DATATABLES, LoggingFetcher, MERMAID, console_bundles};
pub use logging::{LoggingError, env_filter, init_logging};
pub use routes::{console_route_table, console_routes};
