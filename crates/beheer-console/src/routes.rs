//! The console route table.
//!
//! Everything under `pages` is rendered inside the console layout and
//! requires a signed-in user. Storage pages nest under `pages.storage`,
//! which contributes the adapter part of their URL.

use beheer_urls::{ParamDescriptor, RouteDefinition, RouteMetadata, RouteTable, RouterError};

use crate::bundles::{CHARTJS, DATATABLES};
use crate::guards;

fn meta(page_title: &str, breadcrumbs: &str) -> RouteMetadata {
	RouteMetadata::new().title(page_title).breadcrumbs(breadcrumbs)
}

fn page(name: &str, url: &str, view: &str) -> RouteDefinition {
	RouteDefinition::new(format!("pages.{}", name))
		.url(url)
		.view(format!("views/{}", view))
}

fn squashed(value: &str) -> ParamDescriptor {
	ParamDescriptor::value(value).squash()
}

/// All console routes, in registration order.
pub fn console_routes() -> Vec<RouteDefinition> {
	vec![
		RouteDefinition::new("login")
			.url("/login")
			.view("views/login.html")
			.metadata(RouteMetadata::new().title("Login")),
		RouteDefinition::new("logout")
			.url("/logout")
			.metadata(RouteMetadata::new().title("Logout")),
		RouteDefinition::new("pages")
			.layout()
			.view("views/common/content.html")
			.guard(guards::require_login()),
		page("status", "/status?configuration&filter&search", "ShowConfigurationStatus.html")
			.metadata(meta("Adapter Status", "Adapter > Status"))
			.param("configuration", squashed("All"))
			.param("filter", squashed("started+stopped+warning"))
			.param("search", squashed(""))
			.param("adapter", squashed("")),
		page("adapter", "/adapter", "ShowConfigurationStatus.html"),
		page("adapterstatistics", "/adapter/:name/statistics", "adapter_statistics.html")
			.metadata(meta("Adapter", "Adapter > Statistics"))
			.param("id", "0")
			.dependency(CHARTJS),
		RouteDefinition::new("pages.storage")
			.layout()
			.url("/adapters/:adapter/:storageSource/:storageSourceName/")
			.param("adapter", squashed(""))
			.param("storageSourceName", squashed(""))
			.param("processState", squashed(""))
			.param("storageSource", squashed(""))
			.metadata(meta("", ""))
			.guard(guards::storage_title()),
		RouteDefinition::new("pages.storage.list")
			.url("stores/:processState")
			.view("views/txstorage/adapter_storage_list.html")
			.dependency(DATATABLES),
		RouteDefinition::new("pages.storage.view")
			.url("stores/:processState/messages/:messageId")
			.view("views/txstorage/adapter_storage_view.html")
			.param("messageId", squashed(""))
			.guard(guards::storage_message_trail()),
		page("notifications", "/notifications", "notifications.html")
			.metadata(meta("Notifications", "Notifications"))
			.param("id", "0"),
		page("configuration", "/configurations?name&loaded", "ShowConfiguration.html")
			.metadata(meta("Configurations", "Configurations > Show"))
			.param("name", squashed("All"))
			.param("loaded", squashed("")),
		page("upload_configuration", "/configurations/upload", "ManageConfigurationsUpload.html")
			.metadata(meta("Manage Configurations", "Configurations > Upload")),
		page("manage_configurations", "/configurations/manage", "ManageConfigurations.html")
			.metadata(meta("Manage Configurations", "Configurations > Manage")),
		page(
			"manage_configuration_details",
			"/configurations/manage/:name",
			"ManageConfigurationDetails.html",
		)
		.metadata(meta("Manage Configurations", "Configurations > Manage"))
		.param("name", "")
		.guard(guards::configuration_details()),
		page("logging_show", "/logging?directory&file", "ShowLogging.html")
			.metadata(meta("Logging", "Logging > Log Files"))
			.param("directory", ParamDescriptor::null())
			.param("file", ParamDescriptor::null()),
		page("logging_manage", "/logging/settings", "ManageLogging.html")
			.metadata(meta("Logging", "Logging > Log Settings")),
		page("send_message", "/jms/send-message", "SendJmsMessage.html")
			.metadata(meta("Send JMS Message", "JMS > Send Message")),
		page("browse_queue", "/jms/browse-queue", "BrowseJmsQueue.html")
			.metadata(meta("Browse JMS Queue", "JMS > Browse Queue")),
		page("test_pipeline", "/test-pipeline", "TestPipeline.html")
			.metadata(meta("Test a PipeLine", "Testing > Test a PipeLine")),
		page("test_servicelistener", "/test-serviceListener", "TestServiceListener.html")
			.metadata(meta("Test a ServiceListener", "Testing > Test a ServiceListener")),
		page("webservices", "/webservices", "Webservices.html")
			.metadata(meta("Webservices", "Webservices")),
		page("scheduler", "/scheduler", "ShowScheduler.html")
			.metadata(meta("Scheduler", "Scheduler")),
		page("add_schedule", "/scheduler/new", "AddEditSchedule.html")
			.metadata(meta("Add Schedule", "Scheduler > Add Schedule")),
		page("edit_schedule", "/scheduler/edit/:group/:name", "AddEditSchedule.html")
			.metadata(meta("Edit Schedule", "Scheduler > Edit Schedule"))
			.param("name", "")
			.param("group", ""),
		page("environment_variables", "/environment-variables", "ShowEnvironmentVariables.html")
			.metadata(meta("Environment Variables", "Environment Variables")),
		page("execute_query", "/jdbc/execute-query", "ExecuteJdbcQuery.html")
			.metadata(meta("Execute JDBC Query", "JDBC > Execute Query")),
		page("browse_tables", "/jdbc/browse-tables", "BrowseJdbcTable.html")
			.metadata(meta("Browse JDBC Tables", "JDBC > Browse Tables")),
		page("security_items", "/security-items", "ShowSecurityItems.html")
			.metadata(meta("Security Items", "Security Items")),
		page("connection_overview", "/connections", "ShowConnectionOverview.html")
			.metadata(meta("Connection Overview", "Connection Overview"))
			.dependency(DATATABLES),
		page(
			"inlinestore_overview",
			"/inlinestores/overview",
			"ShowInlineMessageStoreOverview.html",
		)
		.metadata(meta("InlineStore Overview", "InlineStore Overview")),
		page("monitors", "/monitors?configuration", "ShowMonitors.html")
			.metadata(meta("Monitors", "Monitors"))
			.param("configuration", ParamDescriptor::null().squash()),
		page(
			"monitors_editTrigger",
			"/monitors/:monitor/triggers/:trigger?configuration",
			"EditMonitorTrigger.html",
		)
		.metadata(meta("Edit Trigger", "Monitors > Triggers > Edit"))
		.param("configuration", ParamDescriptor::null().squash())
		.param("monitor", "")
		.param("trigger", ""),
		page(
			"monitors_addTrigger",
			"/monitors/:monitor/triggers/new?configuration",
			"EditMonitorTrigger.html",
		)
		.metadata(meta("Add Trigger", "Monitors > Triggers > Add"))
		.param("configuration", ParamDescriptor::null().squash())
		.param("monitor", ""),
		page("ibisstore_summary", "/ibisstore-summary", "ShowIbisstoreSummary.html")
			.metadata(meta("Ibisstore Summary", "JDBC > Ibisstore Summary")),
		page("liquibase", "/liquibase", "ShowLiquibaseScript.html")
			.metadata(meta("Liquibase Script", "JDBC > Liquibase Script")),
		page("customView", "/customView/:name", "iFrame.html")
			.metadata(meta("Custom View", "Custom View").iframe())
			.param("name", squashed(""))
			.param("url", squashed(""))
			.guard(guards::custom_view()),
		page("larva", "/testing/larva", "iFrame.html")
			.metadata(meta("Larva", "Testing > Larva").iframe())
			.guard(guards::embed("larva")),
		page("ladybug", "/testing/ladybug", "iFrame.html")
			.metadata(meta("Ladybug", "Testing > Ladybug").iframe())
			.guard(guards::embed("iaf/testtool")),
		page("ladybug_beta", "/testing/ladybug-beta", "iFrame.html")
			.metadata(meta("Ladybug (beta)", "Testing > Ladybug (beta)").iframe())
			.guard(guards::embed("iaf/ladybug")),
		page("empty_page", "/empty_page", "empty_page.html")
			.metadata(RouteMetadata::new().title("Empty Page")),
		page("iaf_update", "/iaf-update", "iaf-update.html")
			.metadata(RouteMetadata::new().title("IAF Update"))
			.guard(guards::release_known()),
		page("loading", "/", "common/loading.html"),
		page("errorpage", "/error", "common/errorpage.html"),
	]
}

/// Builds the console route table; unmatched URLs show the loading page.
pub fn console_route_table() -> Result<RouteTable, RouterError> {
	RouteTable::builder()
		.routes(console_routes())
		.otherwise("/")
		.build()
}
