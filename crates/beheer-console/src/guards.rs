//! Guards of the console routes.

use beheer_urls::{Guard, GuardContext, GuardOutcome, RedirectTarget, guard};

/// Session key set once the server reported its release.
pub const RELEASE_SESSION_KEY: &str = "IAF-Release";

/// Metadata key holding the URL of an embedded page.
pub const IFRAME_URL: &str = "url";

/// Metadata key holding an external URL opened in another window.
pub const REDIRECT_URL: &str = "redirectURL";

/// Sends unauthenticated users to the login page.
pub fn require_login() -> Guard {
	guard(|ctx| {
		if ctx.services.auth.is_authenticated() {
			GuardOutcome::Continue
		} else {
			tracing::debug!(route = ctx.route_name, "Not signed in");
			GuardOutcome::Redirect(RedirectTarget::route("login"))
		}
	})
}

/// `"Adapter > [Pipes > <name> > ]<state> List"`
fn storage_trail(ctx: &GuardContext<'_>) -> String {
	let params = ctx.params;
	let pipes = if params.get("storageSource") == Some("pipes") {
		format!("Pipes > {} > ", params.get_or_empty("storageSourceName"))
	} else {
		String::new()
	};
	format!(
		"Adapter > {}{} List",
		pipes,
		params.get_or_empty("processState")
	)
}

/// Titles storage pages after the process state they list.
pub fn storage_title() -> Guard {
	guard(|ctx| {
		ctx.metadata.page_title = Some(format!("{} List", ctx.params.get_or_empty("processState")));
		ctx.metadata.breadcrumbs = Some(storage_trail(ctx));
		GuardOutcome::Continue
	})
}

/// Extends the storage trail with the viewed message.
pub fn storage_message_trail() -> Guard {
	guard(|ctx| {
		let trail = format!(
			"{} > View Message {}",
			storage_trail(ctx),
			ctx.params.get_or_empty("messageId")
		);
		ctx.metadata.breadcrumbs = Some(trail);
		GuardOutcome::Continue
	})
}

/// Names the configuration in the trail; without a name, shows the overview.
pub fn configuration_details() -> Guard {
	guard(|ctx| match ctx.params.get("name") {
		Some(name) if !name.is_empty() => {
			ctx.metadata.breadcrumbs = Some(format!("Configurations > Manage > {}", name));
			GuardOutcome::Continue
		}
		_ => GuardOutcome::Redirect(RedirectTarget::route("pages.manage_configurations")),
	})
}

/// Embeds or opens the page given by the `url` parameter.
///
/// Without a URL the status page is shown. URLs containing `http` open in a
/// window named after the view; anything else is embedded from the server.
pub fn custom_view() -> Guard {
	guard(|ctx| {
		let url = ctx.params.get_or_empty("url").to_string();
		if url.is_empty() {
			return GuardOutcome::Redirect(RedirectTarget::route("pages.status"));
		}

		if url.contains("http") {
			ctx.services
				.opener
				.open(&url, ctx.params.get_or_empty("name"));
			ctx.metadata.set_extra(REDIRECT_URL, url);
		} else {
			let embedded = format!("{}{}", ctx.services.server_path, url);
			ctx.metadata.set_extra(IFRAME_URL, embedded);
		}
		GuardOutcome::Continue
	})
}

/// Embeds `page` from the server.
pub fn embed(page: &'static str) -> Guard {
	guard(move |ctx| {
		let embedded = format!("{}{}", ctx.services.server_path, page);
		ctx.metadata.set_extra(IFRAME_URL, embedded);
		GuardOutcome::Continue
	})
}

/// Shows the update page only once the release is known.
pub fn release_known() -> Guard {
	guard(|ctx| match ctx.services.session.get(RELEASE_SESSION_KEY) {
		Some(release) => {
			ctx.metadata.set_extra("release", release);
			GuardOutcome::Continue
		}
		None => GuardOutcome::Redirect(RedirectTarget::path("/status")),
	})
}
