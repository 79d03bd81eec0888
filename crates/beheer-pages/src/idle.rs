//! Session idle watchdog.
//!
//! After `idle` of inactivity the session enters [`IdleState::Warning`] and a
//! second countdown of `timeout` starts. If that elapses without interaction
//! the session is [`IdleState::Expired`]. Any interaction before expiry
//! resets the watchdog to the start of the first countdown.
//!
//! [`IdleTracker`] is the time-source independent state machine;
//! [`IdleWatchdog`] drives it on the tokio timer and publishes state changes
//! on a `watch` channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::diagnostics::DiagnosticsContext;

/// Watchdog durations. Only constructible with two positive values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleConfig {
	idle: Duration,
	timeout: Duration,
}

impl IdleConfig {
	/// Returns `None` (watchdog disabled) unless both values are positive.
	pub fn from_secs(idle_secs: i64, timeout_secs: i64) -> Option<Self> {
		if idle_secs <= 0 || timeout_secs <= 0 {
			return None;
		}
		Some(Self {
			idle: Duration::from_secs(idle_secs as u64),
			timeout: Duration::from_secs(timeout_secs as u64),
		})
	}

	/// Like [`IdleConfig::from_secs`], treating absent values as disabled.
	pub fn from_options(idle_secs: Option<i64>, timeout_secs: Option<i64>) -> Option<Self> {
		Self::from_secs(idle_secs?, timeout_secs?)
	}

	pub fn idle(&self) -> Duration {
		self.idle
	}

	pub fn timeout(&self) -> Duration {
		self.timeout
	}
}

/// Watchdog state as seen by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdleState {
	Active,
	Warning,
	Expired,
}

/// Pure idle state machine over explicit instants.
#[derive(Debug, Clone)]
pub struct IdleTracker {
	config: IdleConfig,
	last_interaction: Instant,
	expired: bool,
}

impl IdleTracker {
	pub fn new(config: IdleConfig, now: Instant) -> Self {
		Self {
			config,
			last_interaction: now,
			expired: false,
		}
	}

	/// Returns the state at `now`. Once expired the tracker stays expired.
	pub fn state_at(&mut self, now: Instant) -> IdleState {
		if self.expired {
			return IdleState::Expired;
		}

		let elapsed = now.saturating_duration_since(self.last_interaction);
		if elapsed < self.config.idle {
			IdleState::Active
		} else if elapsed < self.config.idle.saturating_add(self.config.timeout) {
			IdleState::Warning
		} else {
			self.expired = true;
			IdleState::Expired
		}
	}

	/// Records an interaction. Ignored after expiry.
	pub fn interrupt(&mut self, now: Instant) -> IdleState {
		if self.state_at(now) != IdleState::Expired {
			self.last_interaction = now;
		}
		self.state_at(now)
	}

	/// Returns the instant of the next state transition, if any.
	///
	/// `None` once expired, or when the transition lies beyond what
	/// [`Instant`] can represent.
	pub fn next_transition(&self, now: Instant) -> Option<Instant> {
		if self.expired {
			return None;
		}
		let warning_at = self.last_interaction.checked_add(self.config.idle)?;
		if now < warning_at {
			Some(warning_at)
		} else {
			warning_at.checked_add(self.config.timeout)
		}
	}
}

/// Handle to a running watchdog.
///
/// Dropping the handle stops the watchdog.
#[derive(Debug)]
pub struct IdleHandle {
	interrupts: mpsc::UnboundedSender<()>,
	state: watch::Receiver<IdleState>,
	task: JoinHandle<()>,
}

impl IdleHandle {
	/// Signals a user interaction.
	pub fn interrupt(&self) {
		let _ = self.interrupts.send(());
	}

	pub fn state(&self) -> IdleState {
		*self.state.borrow()
	}

	/// Returns a receiver that observes every state change.
	pub fn subscribe(&self) -> watch::Receiver<IdleState> {
		self.state.clone()
	}

	/// Stops the watchdog without waiting for expiry.
	pub fn stop(self) {
		self.task.abort();
	}
}

impl Drop for IdleHandle {
	fn drop(&mut self) {
		self.task.abort();
	}
}

/// Spawns idle watchdogs on the tokio runtime.
pub struct IdleWatchdog;

impl IdleWatchdog {
	/// Starts a watchdog when both values are positive; otherwise returns `None`.
	///
	/// Must be called from within a tokio runtime.
	pub fn start(
		idle_secs: Option<i64>,
		timeout_secs: Option<i64>,
		diagnostics: Arc<DiagnosticsContext>,
	) -> Option<IdleHandle> {
		match IdleConfig::from_options(idle_secs, timeout_secs) {
			Some(config) => Some(Self::spawn(config, diagnostics)),
			None => {
				tracing::debug!(?idle_secs, ?timeout_secs, "Idle watchdog disabled");
				None
			}
		}
	}

	/// Spawns a watchdog for `config`.
	pub fn spawn(config: IdleConfig, diagnostics: Arc<DiagnosticsContext>) -> IdleHandle {
		let (interrupts, rx) = mpsc::unbounded_channel();
		let (state_tx, state) = watch::channel(IdleState::Active);
		let tracker = IdleTracker::new(config, Instant::now());

		tracing::debug!(
			idle_secs = config.idle.as_secs(),
			timeout_secs = config.timeout.as_secs(),
			"Idle watchdog started"
		);

		let task = tokio::spawn(run(tracker, rx, state_tx, diagnostics));

		IdleHandle {
			interrupts,
			state,
			task,
		}
	}
}

async fn run(
	mut tracker: IdleTracker,
	mut interrupts: mpsc::UnboundedReceiver<()>,
	state_tx: watch::Sender<IdleState>,
	diagnostics: Arc<DiagnosticsContext>,
) {
	loop {
		let now = Instant::now();
		let state = tracker.state_at(now);
		publish(&state_tx, state, &tracker, &diagnostics);

		if state == IdleState::Expired {
			break;
		}
		let deadline = tracker.next_transition(now);
		let transition = async {
			match deadline {
				Some(deadline) => tokio::time::sleep_until(deadline).await,
				None => std::future::pending().await,
			}
		};

		tokio::select! {
			_ = transition => {}
			received = interrupts.recv() => match received {
				Some(()) => {
					tracker.interrupt(Instant::now());
				}
				None => break,
			},
		}
	}
}

fn publish(
	state_tx: &watch::Sender<IdleState>,
	state: IdleState,
	tracker: &IdleTracker,
	diagnostics: &DiagnosticsContext,
) {
	let changed = state_tx.send_if_modified(|current| {
		if *current == state {
			false
		} else {
			*current = state;
			true
		}
	});
	if !changed {
		return;
	}

	match state {
		IdleState::Active => diagnostics.debug("Idle state ended", "user interaction"),
		IdleState::Warning => diagnostics.warn(
			"Idle state reached",
			format_args!("session expires in {}s", tracker.config.timeout.as_secs()),
		),
		IdleState::Expired => diagnostics.warn("Session expired", "idle timeout elapsed"),
	}
}
