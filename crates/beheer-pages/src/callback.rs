//! Guarded execution of injected callbacks.
//!
//! The console exposes a developer escape hatch that runs arbitrary code
//! against the application state (`foist`). The code is untrusted from the
//! host's point of view: failures, including panics, are reported through
//! diagnostics and never propagate. The state is re-synchronized exactly once
//! after every invocation.
//!
//! ```ignore
//! let outcome = DiagnosticsContext::global().foist(&mut app_state, |state| {
//!     state.monitoring = true;
//!     Ok::<(), String>(())
//! });
//! assert!(outcome.is_completed());
//! ```

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::diagnostics::DiagnosticsContext;

/// State that must be re-synchronized after injected code ran.
pub trait Synchronize {
	fn synchronize(&mut self);
}

/// Failure raised by an injected callback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallbackError {
	#[error("injected code failed: {0}")]
	Failed(String),

	#[error("injected code panicked: {0}")]
	Panicked(String),
}

/// What happened to an injected callback. Never an error for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
	Completed,
	Failed(CallbackError),
}

impl CallbackOutcome {
	pub fn is_completed(&self) -> bool {
		matches!(self, Self::Completed)
	}
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(s) = payload.downcast_ref::<&str>() {
		(*s).to_string()
	} else if let Some(s) = payload.downcast_ref::<String>() {
		s.clone()
	} else {
		"unknown panic payload".to_string()
	}
}

impl DiagnosticsContext {
	/// Runs `callback` against `state` with failures contained.
	///
	/// The injection is announced as a warning. An `Err` or a panic from the
	/// callback yields exactly one error report. `state.synchronize()` runs
	/// exactly once afterwards in every case.
	pub fn foist<S, F, E>(&self, state: &mut S, callback: F) -> CallbackOutcome
	where
		S: Synchronize,
		F: FnOnce(&mut S) -> Result<(), E>,
		E: fmt::Display,
	{
		self.warn("Dirty injection!", std::any::type_name::<F>());

		let result = catch_unwind(AssertUnwindSafe(|| callback(&mut *state)));

		let outcome = match result {
			Ok(Ok(())) => CallbackOutcome::Completed,
			Ok(Err(e)) => CallbackOutcome::Failed(CallbackError::Failed(e.to_string())),
			Err(payload) => {
				CallbackOutcome::Failed(CallbackError::Panicked(panic_message(payload.as_ref())))
			}
		};

		if let CallbackOutcome::Failed(err) = &outcome {
			self.error("Failed to execute injected code!", err);
		}

		state.synchronize();
		outcome
	}
}
