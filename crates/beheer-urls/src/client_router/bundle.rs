//! Lazy loading of plugin bundles.
//!
//! A route may depend on named bundles (script and stylesheet sets) that must
//! be loaded before it is activated. [`BundleLoader`] makes loading idempotent
//! per bundle name:
//!
//! - a bundle that finished loading is a no-op success
//! - a request for a bundle that is currently loading attaches to the same
//!   shared future
//! - a failed load is forgotten, so the next request retries
//!
//! Fetching individual files is delegated to a [`BundleFetcher`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared, try_join_all};
use parking_lot::Mutex;
use serde::Serialize;

/// Error type for bundle loading.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BundleError {
	/// No bundle is registered under this name.
	#[error("Unknown bundle: {0}")]
	Unknown(String),
	/// A file of the bundle could not be fetched.
	#[error("Failed to fetch '{file}' of bundle '{bundle}': {message}")]
	Fetch {
		bundle: String,
		file: String,
		message: String,
	},
}

/// Fetches a single bundle file.
#[async_trait]
pub trait BundleFetcher: Send + Sync {
	/// Fetches `file` on behalf of `bundle`. The error is a human readable reason.
	async fn fetch(&self, bundle: &str, file: &str) -> Result<(), String>;
}

/// A named set of files loaded together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleDefinition {
	pub name: String,
	/// Load files one after another, in declaration order.
	pub serie: bool,
	pub files: Vec<String>,
}

impl BundleDefinition {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			serie: false,
			files: Vec::new(),
		}
	}

	/// Loads the files sequentially.
	pub fn serie(mut self) -> Self {
		self.serie = true;
		self
	}

	pub fn file(mut self, file: impl Into<String>) -> Self {
		self.files.push(file.into());
		self
	}
}

/// Registered bundle definitions by name.
#[derive(Debug, Clone, Default)]
pub struct BundleRegistry {
	bundles: HashMap<String, Arc<BundleDefinition>>,
	/// Registration order, for listing.
	order: Vec<String>,
}

impl BundleRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a bundle, replacing an earlier one of the same name.
	pub fn register(mut self, definition: BundleDefinition) -> Self {
		if !self.bundles.contains_key(&definition.name) {
			self.order.push(definition.name.clone());
		}
		self.bundles
			.insert(definition.name.clone(), Arc::new(definition));
		self
	}

	pub fn get(&self, name: &str) -> Option<Arc<BundleDefinition>> {
		self.bundles.get(name).cloned()
	}

	pub fn contains(&self, name: &str) -> bool {
		self.bundles.contains_key(name)
	}

	/// Returns the bundle names in registration order.
	pub fn names(&self) -> &[String] {
		&self.order
	}
}

type SharedLoad = Shared<BoxFuture<'static, Result<(), BundleError>>>;

enum LoadState {
	Loading(SharedLoad),
	Loaded,
}

/// Memoizing bundle loader.
pub struct BundleLoader {
	registry: Arc<BundleRegistry>,
	fetcher: Arc<dyn BundleFetcher>,
	state: Mutex<HashMap<String, LoadState>>,
	debug: bool,
}

impl fmt::Debug for BundleLoader {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.state.lock();
		let loaded: Vec<&String> = state
			.iter()
			.filter(|(_, s)| matches!(s, LoadState::Loaded))
			.map(|(name, _)| name)
			.collect();
		f.debug_struct("BundleLoader")
			.field("bundles", &self.registry.names())
			.field("loaded", &loaded)
			.field("debug", &self.debug)
			.finish()
	}
}

impl BundleLoader {
	pub fn new(registry: Arc<BundleRegistry>, fetcher: Arc<dyn BundleFetcher>) -> Self {
		Self {
			registry,
			fetcher,
			state: Mutex::new(HashMap::new()),
			debug: false,
		}
	}

	/// Logs every file fetch at `debug` level.
	pub fn with_debug(mut self, debug: bool) -> Self {
		self.debug = debug;
		self
	}

	pub fn registry(&self) -> &BundleRegistry {
		&self.registry
	}

	/// Returns whether `name` has finished loading successfully.
	pub fn is_loaded(&self, name: &str) -> bool {
		matches!(self.state.lock().get(name), Some(LoadState::Loaded))
	}

	/// Loads one bundle, or attaches to its in-flight load.
	///
	/// # Errors
	///
	/// [`BundleError::Unknown`] for unregistered names, [`BundleError::Fetch`]
	/// when a file fails to load.
	pub async fn load(&self, name: &str) -> Result<(), BundleError> {
		let load = {
			let mut state = self.state.lock();
			match state.get(name) {
				Some(LoadState::Loaded) => return Ok(()),
				Some(LoadState::Loading(load)) => load.clone(),
				None => {
					let definition = self
						.registry
						.get(name)
						.ok_or_else(|| BundleError::Unknown(name.to_string()))?;
					let load = fetch_bundle(definition, Arc::clone(&self.fetcher), self.debug)
						.boxed()
						.shared();
					state.insert(name.to_string(), LoadState::Loading(load.clone()));
					load
				}
			}
		};

		let result = load.clone().await;

		let mut state = self.state.lock();
		let settles_this_load = matches!(
			state.get(name),
			Some(LoadState::Loading(current)) if current.ptr_eq(&load)
		);
		if settles_this_load {
			match &result {
				Ok(()) => {
					state.insert(name.to_string(), LoadState::Loaded);
				}
				Err(err) => {
					tracing::warn!(bundle = name, error = %err, "Bundle load failed");
					state.remove(name);
				}
			}
		}
		result
	}

	/// Loads several bundles concurrently; fails on the first error.
	pub async fn load_all(&self, names: &[String]) -> Result<(), BundleError> {
		try_join_all(names.iter().map(|name| self.load(name))).await?;
		Ok(())
	}
}

async fn fetch_bundle(
	definition: Arc<BundleDefinition>,
	fetcher: Arc<dyn BundleFetcher>,
	debug: bool,
) -> Result<(), BundleError> {
	let fetch_file = |file: &String| {
		let fetcher = Arc::clone(&fetcher);
		let bundle = definition.name.clone();
		let file = file.clone();
		async move {
			if debug {
				tracing::debug!(bundle = %bundle, file = %file, "Fetching bundle file");
			}
			fetcher
				.fetch(&bundle, &file)
				.await
				.map_err(|message| BundleError::Fetch {
					bundle,
					file,
					message,
				})
		}
	};

	if definition.serie {
		for file in &definition.files {
			fetch_file(file).await?;
		}
	} else {
		try_join_all(definition.files.iter().map(fetch_file)).await?;
	}

	if debug {
		tracing::debug!(bundle = %definition.name, files = definition.files.len(), "Bundle loaded");
	}
	Ok(())
}
