//! Beheer console CLI
//!
//! Inspects the console route table from the command line.
//!
//! ## Usage
//!
//! ```bash
//! beheer-console routes
//! beheer-console resolve "/configurations/manage/Foo"
//! beheer-console resolve --location "index.html#/status?filter=started"
//! beheer-console href pages.edit_schedule group=GROUP1 name=JOB1
//! ```

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{Context, bail};
use beheer_conf::ConsoleSettings;
use beheer_console::guards::RELEASE_SESSION_KEY;
use beheer_console::{Collaborators, Console, init_logging};
use beheer_urls::{MemorySession, NavigationOutcome, RouteParams, StaticAuthenticator};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "beheer-console")]
#[command(about = "Beheer console route table utility", long_about = None)]
#[command(version)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// Settings file (TOML or JSON); environment variables apply on top
	#[arg(short, long, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Verbosity level (can be repeated)
	#[arg(short, long, action = clap::ArgAction::Count)]
	verbosity: u8,
}

#[derive(Subcommand)]
enum Commands {
	/// List all registered routes
	Routes,

	/// Resolve a URL to the route the console would show
	Resolve {
		/// Route URL (`/path?query`), or a browser location with --location
		#[arg(value_name = "URL")]
		url: String,

		/// Interpret URL as a browser location in the configured location mode
		#[arg(long)]
		location: bool,

		/// Resolve as a user who is not signed in
		#[arg(long)]
		anonymous: bool,

		/// Release reported by the server
		#[arg(long, value_name = "RELEASE")]
		release: Option<String>,
	},

	/// Generate the location of a named route
	Href {
		/// Route name (e.g., pages.status)
		#[arg(value_name = "NAME")]
		name: String,

		/// Parameters as key=value pairs
		#[arg(value_name = "PARAMS")]
		params: Vec<String>,
	},
}

#[tokio::main]
async fn main() {
	let cli = Cli::parse();

	if let Err(e) = run(cli).await {
		eprintln!("Error: {:#}", e);
		process::exit(1);
	}
}

async fn run(cli: Cli) -> anyhow::Result<()> {
	let mut settings = load_settings(cli.config.as_ref())?;
	match cli.verbosity {
		0 => {}
		1 => settings.logging.level = "debug".to_string(),
		_ => settings.logging.level = "trace".to_string(),
	}
	init_logging(&settings.logging)?;

	match cli.command {
		Commands::Routes => run_routes(settings),
		Commands::Resolve {
			url,
			location,
			anonymous,
			release,
		} => run_resolve(settings, &url, location, anonymous, release).await,
		Commands::Href { name, params } => run_href(settings, &name, &params),
	}
}

fn load_settings(path: Option<&PathBuf>) -> anyhow::Result<ConsoleSettings> {
	let settings = match path {
		Some(path) => ConsoleSettings::from_file(path.clone())
			.with_context(|| format!("Failed to load settings from {}", path.display()))?,
		None => ConsoleSettings::default(),
	};
	Ok(settings.apply_env()?)
}

fn run_routes(settings: ConsoleSettings) -> anyhow::Result<()> {
	let console = Console::start(settings, Collaborators::default())?;
	let table = console.navigator().table();

	for definition in table.definitions() {
		let pattern = table
			.pattern_of(definition.name())
			.map(|pattern| pattern.pattern())
			.unwrap_or("-");
		let kind = if definition.is_abstract() { "layout" } else { "page" };
		let dependencies = definition.dependencies().join(",");
		println!(
			"{:<40} {:<6} {:<60} {}",
			definition.name(),
			kind,
			pattern,
			dependencies
		);
	}
	Ok(())
}

async fn run_resolve(
	settings: ConsoleSettings,
	url: &str,
	location: bool,
	anonymous: bool,
	release: Option<String>,
) -> anyhow::Result<()> {
	let session = MemorySession::new();
	if let Some(release) = release {
		session.set(RELEASE_SESSION_KEY, release);
	}
	let collaborators = Collaborators {
		auth: Arc::new(StaticAuthenticator(!anonymous)),
		session: Arc::new(session),
		..Collaborators::default()
	};
	let console = Console::start(settings, collaborators)?;
	let navigator = console.navigator();

	let outcome = if location {
		navigator.navigate_location(url).await?
	} else {
		navigator.navigate_url(url).await?
	};

	match outcome {
		NavigationOutcome::Activated(resolved) => {
			println!("{}", serde_json::to_string_pretty(&resolved)?);
			Ok(())
		}
		NavigationOutcome::Superseded => bail!("Navigation to {} was superseded", url),
	}
}

fn run_href(settings: ConsoleSettings, name: &str, pairs: &[String]) -> anyhow::Result<()> {
	let params = pairs
		.iter()
		.map(|pair| {
			pair.split_once('=')
				.with_context(|| format!("Expected key=value, got '{}'", pair))
		})
		.collect::<anyhow::Result<Vec<_>>>()?;

	let console = Console::start(settings, Collaborators::default())?;
	let href = console
		.navigator()
		.href(name, &RouteParams::from_pairs(params))?;
	println!("{}", href);
	Ok(())
}
