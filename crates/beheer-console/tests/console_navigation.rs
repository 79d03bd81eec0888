//! Navigation through the full console route table.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use beheer_conf::ConsoleSettings;
use beheer_console::guards::{IFRAME_URL, REDIRECT_URL, RELEASE_SESSION_KEY};
use beheer_console::{Collaborators, Console, DATATABLES};
use beheer_pages::{DiagnosticsContext, MemorySink, Severity};
use beheer_urls::{
	BundleFetcher, ExternalOpener, MemorySession, NavigationOutcome, Navigator, RouteParams,
	RouterError, StaticAuthenticator,
};
use parking_lot::Mutex;
use rstest::*;

#[derive(Default)]
struct RecordingOpener {
	opened: Mutex<Vec<(String, String)>>,
}

impl ExternalOpener for RecordingOpener {
	fn open(&self, url: &str, target: &str) {
		self.opened.lock().push((url.to_string(), target.to_string()));
	}
}

/// Fails every file of `failing` after a short delay.
#[derive(Default)]
struct TestFetcher {
	failing: Option<&'static str>,
	fetched: Mutex<Vec<String>>,
}

#[async_trait]
impl BundleFetcher for TestFetcher {
	async fn fetch(&self, bundle: &str, file: &str) -> Result<(), String> {
		tokio::time::sleep(Duration::from_millis(50)).await;
		if self.failing == Some(bundle) {
			return Err(format!("{} not found", file));
		}
		self.fetched.lock().push(file.to_string());
		Ok(())
	}
}

struct Harness {
	console: Console,
	sink: Arc<MemorySink>,
	opener: Arc<RecordingOpener>,
	fetcher: Arc<TestFetcher>,
}

impl Harness {
	fn navigator(&self) -> &Navigator {
		self.console.navigator()
	}
}

fn harness_with(signed_in: bool, session: MemorySession, fetcher: TestFetcher) -> Harness {
	let sink = Arc::new(MemorySink::new());
	let opener = Arc::new(RecordingOpener::default());
	let fetcher = Arc::new(fetcher);
	let collaborators = Collaborators {
		fetcher: fetcher.clone(),
		auth: Arc::new(StaticAuthenticator(signed_in)),
		session: Arc::new(session),
		opener: opener.clone(),
		diagnostics: Some(Arc::new(DiagnosticsContext::with_sink(1, sink.clone()))),
	};
	let console = Console::start(ConsoleSettings::default(), collaborators).unwrap();
	Harness {
		console,
		sink,
		opener,
		fetcher,
	}
}

#[fixture]
fn harness() -> Harness {
	harness_with(true, MemorySession::new(), TestFetcher::default())
}

async fn activate(navigator: &Navigator, url: &str) -> beheer_urls::ResolvedRoute {
	match navigator.navigate_url(url).await.unwrap() {
		NavigationOutcome::Activated(resolved) => resolved,
		NavigationOutcome::Superseded => panic!("navigation to {} was superseded", url),
	}
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn test_edit_schedule_captures_group_and_name(harness: Harness) {
	let resolved = activate(harness.navigator(), "/scheduler/edit/GROUP1/JOB1").await;

	assert_eq!(resolved.name(), "pages.edit_schedule");
	assert_eq!(resolved.params().get("group"), Some("GROUP1"));
	assert_eq!(resolved.params().get("name"), Some("JOB1"));
	assert_eq!(resolved.metadata().page_title.as_deref(), Some("Edit Schedule"));
	assert_eq!(resolved.view(), Some("views/AddEditSchedule.html"));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn test_configuration_details_breadcrumbs(harness: Harness) {
	let resolved = activate(harness.navigator(), "/configurations/manage/Foo").await;

	assert_eq!(resolved.name(), "pages.manage_configuration_details");
	assert_eq!(
		resolved.metadata().breadcrumbs.as_deref(),
		Some("Configurations > Manage > Foo")
	);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn test_configuration_details_without_name_shows_overview(harness: Harness) {
	let resolved = activate(harness.navigator(), "/configurations/manage/").await;

	assert_eq!(resolved.name(), "pages.manage_configurations");
	assert_eq!(resolved.redirects(), &["pages.manage_configuration_details"]);
	assert_eq!(
		resolved.metadata().breadcrumbs.as_deref(),
		Some("Configurations > Manage")
	);
}

#[rstest]
#[case("/does-not-exist")]
#[case("/status/extra/segments")]
#[case("no-leading-slash")]
#[tokio::test(start_paused = true)]
async fn test_unknown_urls_show_loading_page(harness: Harness, #[case] url: &str) {
	let resolved = activate(harness.navigator(), url).await;

	assert_eq!(resolved.name(), "pages.loading");
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn test_resolution_is_idempotent(harness: Harness) {
	let url = "/status?filter=started&search=adapter1";
	let first = activate(harness.navigator(), url).await;
	let second = activate(harness.navigator(), url).await;

	assert_eq!(first, second);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn test_status_defaults_and_squashed_href(harness: Harness) {
	let resolved = activate(harness.navigator(), "/status").await;

	assert_eq!(resolved.params().get("configuration"), Some("All"));
	assert_eq!(resolved.params().get("filter"), Some("started+stopped+warning"));
	assert_eq!(
		harness.navigator().href("pages.status", resolved.params()).unwrap(),
		"#/status"
	);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn test_status_href_round_trip(harness: Harness) {
	let resolved = activate(harness.navigator(), "/status?filter=started&configuration=Main").await;
	let href = harness
		.navigator()
		.table()
		.href(resolved.name(), resolved.params())
		.unwrap();

	assert_eq!(href, "/status?configuration=Main&filter=started");
	assert_eq!(activate(harness.navigator(), &href).await, resolved);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn test_signed_out_users_see_login() {
	let harness = harness_with(false, MemorySession::new(), TestFetcher::default());
	let resolved = activate(harness.navigator(), "/status").await;

	assert_eq!(resolved.name(), "login");
	assert_eq!(resolved.redirects(), &["pages.status"]);
}

#[rstest]
#[case(
	"/adapters/Adapter1/pipes/MyPipe/stores/Error",
	"Error List",
	"Adapter > Pipes > MyPipe > Error List"
)]
#[case(
	"/adapters/Adapter1/receivers/MyReceiver/stores/Done",
	"Done List",
	"Adapter > Done List"
)]
#[tokio::test(start_paused = true)]
async fn test_storage_list_titles(
	harness: Harness,
	#[case] url: &str,
	#[case] title: &str,
	#[case] breadcrumbs: &str,
) {
	let resolved = activate(harness.navigator(), url).await;

	assert_eq!(resolved.name(), "pages.storage.list");
	assert_eq!(resolved.metadata().page_title.as_deref(), Some(title));
	assert_eq!(resolved.metadata().breadcrumbs.as_deref(), Some(breadcrumbs));
	assert_eq!(resolved.dependencies(), &[DATATABLES]);
	assert!(harness.navigator().loader().is_loaded(DATATABLES));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn test_storage_message_trail(harness: Harness) {
	let resolved = activate(
		harness.navigator(),
		"/adapters/Adapter1/pipes/MyPipe/stores/Error/messages/42",
	)
	.await;

	assert_eq!(resolved.name(), "pages.storage.view");
	assert_eq!(resolved.metadata().page_title.as_deref(), Some("Error List"));
	assert_eq!(
		resolved.metadata().breadcrumbs.as_deref(),
		Some("Adapter > Pipes > MyPipe > Error List > View Message 42")
	);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn test_custom_view_without_url_shows_status(harness: Harness) {
	let resolved = activate(harness.navigator(), "/customView/Grafana").await;

	assert_eq!(resolved.name(), "pages.status");
	assert_eq!(resolved.redirects(), &["pages.customView"]);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn test_custom_view_opens_external_urls(harness: Harness) {
	let params = RouteParams::from_pairs([("name", "Grafana"), ("url", "https://grafana.local/")]);
	let outcome = harness
		.navigator()
		.navigate_to("pages.customView", &params)
		.await
		.unwrap();
	let NavigationOutcome::Activated(resolved) = outcome else {
		panic!("expected activation");
	};

	assert_eq!(resolved.metadata().extra(REDIRECT_URL), Some("https://grafana.local/"));
	assert_eq!(resolved.metadata().extra(IFRAME_URL), None);
	assert_eq!(
		*harness.opener.opened.lock(),
		vec![("https://grafana.local/".to_string(), "Grafana".to_string())]
	);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn test_custom_view_embeds_server_pages(harness: Harness) {
	let params = RouteParams::from_pairs([("name", "Report"), ("url", "iaf/report")]);
	let outcome = harness
		.navigator()
		.navigate_to("pages.customView", &params)
		.await
		.unwrap();
	let NavigationOutcome::Activated(resolved) = outcome else {
		panic!("expected activation");
	};

	assert!(resolved.metadata().iframe);
	assert_eq!(resolved.metadata().extra(IFRAME_URL), Some("../iaf/report"));
	assert!(harness.opener.opened.lock().is_empty());
}

#[rstest]
#[case("/testing/larva", "../larva")]
#[case("/testing/ladybug", "../iaf/testtool")]
#[case("/testing/ladybug-beta", "../iaf/ladybug")]
#[tokio::test(start_paused = true)]
async fn test_embedded_test_tools(harness: Harness, #[case] url: &str, #[case] embedded: &str) {
	let resolved = activate(harness.navigator(), url).await;

	assert_eq!(resolved.metadata().extra(IFRAME_URL), Some(embedded));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn test_update_page_requires_known_release() {
	let harness = harness_with(true, MemorySession::new(), TestFetcher::default());
	let resolved = activate(harness.navigator(), "/iaf-update").await;
	assert_eq!(resolved.name(), "pages.status");

	let session = MemorySession::new();
	session.set(RELEASE_SESSION_KEY, "8.1.0");
	let harness = harness_with(true, session, TestFetcher::default());
	let resolved = activate(harness.navigator(), "/iaf-update").await;
	assert_eq!(resolved.name(), "pages.iaf_update");
	assert_eq!(resolved.metadata().extra("release"), Some("8.1.0"));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn test_failed_bundle_keeps_previous_route() {
	let fetcher = TestFetcher {
		failing: Some(DATATABLES),
		..TestFetcher::default()
	};
	let harness = harness_with(true, MemorySession::new(), fetcher);
	activate(harness.navigator(), "/status").await;

	let err = harness
		.navigator()
		.navigate_url("/connections")
		.await
		.unwrap_err();

	assert!(matches!(
		err,
		RouterError::DependencyLoad { ref route, .. } if route == "pages.connection_overview"
	));
	assert_eq!(harness.navigator().active().unwrap().name(), "pages.status");
	assert_eq!(harness.sink.count(Severity::Error), 1);
	assert!(!harness.navigator().loader().is_loaded(DATATABLES));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn test_later_navigation_wins(harness: Harness) {
	let navigator = harness.navigator();
	let (slow, fast) = tokio::join!(
		navigator.navigate_url("/connections"),
		navigator.navigate_url("/scheduler"),
	);

	assert_eq!(slow.unwrap(), NavigationOutcome::Superseded);
	assert!(fast.unwrap().is_activated());
	assert_eq!(navigator.active().unwrap().name(), "pages.scheduler");
	// The superseded navigation still finished loading its bundle.
	assert!(navigator.loader().is_loaded(DATATABLES));
	assert_eq!(harness.fetcher.fetched.lock().len(), 4);
}
