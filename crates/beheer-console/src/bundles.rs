//! Plugin bundles loaded on demand by console pages.

use async_trait::async_trait;
use beheer_urls::{BundleDefinition, BundleFetcher, BundleRegistry};

pub const DATATABLES: &str = "datatables";
pub const CHARTJS: &str = "chartjs";
pub const MERMAID: &str = "mermaid";

/// The console's bundle registry.
pub fn console_bundles() -> BundleRegistry {
	BundleRegistry::new()
		.register(
			BundleDefinition::new(DATATABLES)
				.serie()
				.file("js/plugins/dataTables/datatables.v1.10.20.min.js")
				.file("css/plugins/dataTables/datatables.v1.10.20.min.css")
				.file("js/plugins/dataTables/angular-datatables.v0.6.2.min.js")
				.file("js/plugins/dataTables/angular-datatables.buttons.min.js"),
		)
		.register(
			BundleDefinition::new(CHARTJS)
				.serie()
				.file("js/plugins/chartJs/Chart.min.js")
				.file("js/plugins/chartJs/angular-chart.min.js")
				.file("css/plugins/chartJs/Chart.min.css"),
		)
		.register(
			BundleDefinition::new(MERMAID)
				.serie()
				.file("js/plugins/mermaid/mermaid.min.js")
				.file("js/plugins/mermaid/ng-mermaid.js"),
		)
}

/// A fetcher that only records what would be fetched.
///
/// Used where no asset pipeline exists, e.g. the command line.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingFetcher;

#[async_trait]
impl BundleFetcher for LoggingFetcher {
	async fn fetch(&self, bundle: &str, file: &str) -> Result<(), String> {
		tracing::info!(bundle, file, "Bundle file requested");
		Ok(())
	}
}
