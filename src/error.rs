//! Error types and the unhandled-error hook.
//!
//! Two kinds of failure exist in this crate:
//!
//! - **Programming errors** (assigning a `SingleAssignmentDisposable` twice,
//!   installing the hook twice, ...) are returned to the caller as [`Error`].
//! - **Callback failures** (a scheduled action or an observer panicking) are
//!   caught at the dispatch boundary, turned into an [`UnhandledError`] and
//!   forwarded to the [`ErrorHook`]. They never reach the scheduler loop or
//!   the remaining subscribers.

use std::{
  any::Any,
  fmt,
  panic::{catch_unwind, AssertUnwindSafe},
  sync::Arc,
};

use once_cell::sync::OnceCell;

/// Errors surfaced directly to the caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("single assignment disposable was already assigned")]
  AlreadyAssigned,
  #[error("unhandled error hook is already installed")]
  HookAlreadyInstalled,
  #[error("failed to spawn thread pool: {0}")]
  ThreadPool(#[from] std::io::Error),
}

/// Where a caught failure happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorOrigin {
  /// An action running on the thread-pool scheduler.
  ThreadPool,
  /// An action running during a main-thread pump.
  MainThread,
  /// An observer callback invoked by a subject or the message bus.
  Delivery,
  /// An action running inline on the immediate scheduler.
  Immediate,
}

impl fmt::Display for ErrorOrigin {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      ErrorOrigin::ThreadPool => "thread-pool",
      ErrorOrigin::MainThread => "main-thread",
      ErrorOrigin::Delivery => "delivery",
      ErrorOrigin::Immediate => "immediate",
    };
    f.write_str(name)
  }
}

/// A failure caught at a dispatch boundary.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unhandled {origin} failure: {message}")]
pub struct UnhandledError {
  pub origin: ErrorOrigin,
  pub message: String,
}

impl UnhandledError {
  pub fn new(origin: ErrorOrigin, message: impl Into<String>) -> Self {
    Self { origin, message: message.into() }
  }

  /// Build an error from the payload of a caught panic.
  pub fn from_panic(origin: ErrorOrigin, payload: Box<dyn Any + Send>) -> Self {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
      (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
      s.clone()
    } else {
      "non-string panic payload".to_string()
    };
    Self { origin, message }
  }
}

type HookFn = dyn Fn(&UnhandledError) + Send + Sync;

/// Handle to the single callback receiving every [`UnhandledError`].
///
/// Clones share the same slot. The callback can be installed once; until it
/// is, failures are logged with `tracing::error!`.
#[derive(Clone, Default)]
pub struct ErrorHook(Arc<OnceCell<Box<HookFn>>>);

impl ErrorHook {
  pub fn new() -> Self { Self::default() }

  /// Install the callback. Only the first installation succeeds.
  pub fn install<F>(&self, f: F) -> Result<(), Error>
  where
    F: Fn(&UnhandledError) + Send + Sync + 'static,
  {
    self
      .0
      .set(Box::new(f))
      .map_err(|_| Error::HookAlreadyInstalled)
  }

  #[inline]
  pub fn is_installed(&self) -> bool { self.0.get().is_some() }

  pub fn report(&self, err: UnhandledError) {
    match self.0.get() {
      Some(hook) => {
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| hook(&err))) {
          let nested = UnhandledError::from_panic(err.origin, payload);
          tracing::error!(
            origin = %err.origin,
            error = %err.message,
            hook_panic = %nested.message,
            "unhandled error hook panicked"
          );
        }
      }
      None => tracing::error!(origin = %err.origin, error = %err.message, "unhandled error"),
    }
  }

  /// Run `f`, reporting a panic instead of propagating it.
  ///
  /// Returns `true` when `f` ran to completion.
  pub fn catch<F: FnOnce()>(&self, origin: ErrorOrigin, f: F) -> bool {
    match catch_unwind(AssertUnwindSafe(f)) {
      Ok(()) => true,
      Err(payload) => {
        self.report(UnhandledError::from_panic(origin, payload));
        false
      }
    }
  }
}

impl fmt::Debug for ErrorHook {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ErrorHook")
      .field("installed", &self.is_installed())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use super::*;

  fn recorder(hook: &ErrorHook) -> Arc<Mutex<Vec<UnhandledError>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let c_seen = seen.clone();
    hook
      .install(move |e| c_seen.lock().unwrap().push(e.clone()))
      .unwrap();
    seen
  }

  #[test]
  fn install_only_once() {
    let hook = ErrorHook::new();
    assert!(!hook.is_installed());
    hook.install(|_| {}).unwrap();
    assert!(hook.is_installed());
    assert!(matches!(hook.install(|_| {}), Err(Error::HookAlreadyInstalled)));
  }

  #[test]
  fn catch_reports_panic_message() {
    let hook = ErrorHook::new();
    let seen = recorder(&hook);

    assert!(hook.catch(ErrorOrigin::MainThread, || {}));
    assert!(!hook.catch(ErrorOrigin::MainThread, || panic!("tile {} missing", 7)));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0], UnhandledError::new(ErrorOrigin::MainThread, "tile 7 missing"));
  }

  #[test]
  fn clones_share_the_slot() {
    let hook = ErrorHook::new();
    let seen = recorder(&hook);
    let cloned = hook.clone();
    cloned.report(UnhandledError::new(ErrorOrigin::Delivery, "boom"));
    assert_eq!(seen.lock().unwrap().len(), 1);
  }

  #[test]
  fn report_without_hook_does_not_panic() {
    ErrorHook::new().report(UnhandledError::new(ErrorOrigin::ThreadPool, "lost"));
  }

  #[test]
  fn panicking_hook_is_contained() {
    let hook = ErrorHook::new();
    hook.install(|_| panic!("hook itself fails")).unwrap();
    assert!(!hook.catch(ErrorOrigin::Immediate, || panic!("first")));
  }

  #[test]
  fn non_string_payload() {
    let err = UnhandledError::from_panic(ErrorOrigin::Delivery, Box::new(42_u8));
    assert_eq!(err.message, "non-string panic payload");
    assert_eq!(err.to_string(), "unhandled delivery failure: non-string panic payload");
  }
}
