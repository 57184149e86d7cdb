//! Disposables: handles to releasable resources and cancellable work.
//!
//! Every disposable releases what it owns at most once, no matter how many
//! threads race on [`Disposable::dispose`]. Only the caller that wins the
//! disposed transition runs the release logic; everyone else returns without
//! effect.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`BooleanDisposable`] | A bare disposed flag |
//! | [`AnonymousDisposable`] | Runs a teardown closure exactly once |
//! | [`SingleAssignmentDisposable`] | One slot, assignable once |
//! | [`MultipleAssignmentDisposable`] | One replaceable slot, never disposes the replaced value |
//! | [`SerialDisposable`] | One replaceable slot, disposes the replaced value |
//! | [`CompositeDisposable`] | An ordered group disposed together |
//! | [`DisposeGuard`] | Disposes on drop |

use std::{
  fmt::{Debug, Formatter},
  sync::atomic::{AtomicBool, Ordering},
};

use parking_lot::Mutex;

mod boxed;
mod composite;
mod guard;
mod multiple;
mod serial;
mod single;

pub use boxed::BoxedDisposable;
pub use composite::CompositeDisposable;
pub use guard::DisposeGuard;
pub use multiple::MultipleAssignmentDisposable;
pub use serial::SerialDisposable;
pub use single::SingleAssignmentDisposable;

/// A releasable resource or a cancellable action.
pub trait Disposable: Send + Sync {
  /// Release the resource. Idempotent and safe to call from any thread.
  fn dispose(&self);

  fn is_disposed(&self) -> bool;
}

impl<T: Disposable + ?Sized> Disposable for Box<T> {
  #[inline]
  fn dispose(&self) { (**self).dispose() }

  #[inline]
  fn is_disposed(&self) -> bool { (**self).is_disposed() }
}

impl<T: Disposable + ?Sized> Disposable for std::sync::Arc<T> {
  #[inline]
  fn dispose(&self) { (**self).dispose() }

  #[inline]
  fn is_disposed(&self) -> bool { (**self).is_disposed() }
}

/// The canonical no-op disposable. It reports itself as disposed.
pub fn empty() -> BoxedDisposable { BoxedDisposable::empty() }

/// Create a disposable running `teardown` the first time it is disposed.
pub fn create<F>(teardown: F) -> BoxedDisposable
where
  F: FnOnce() + Send + 'static,
{
  BoxedDisposable::new(AnonymousDisposable::new(teardown))
}

pub(crate) struct EmptyDisposable;

impl Disposable for EmptyDisposable {
  #[inline]
  fn dispose(&self) {}

  #[inline]
  fn is_disposed(&self) -> bool { true }
}

/// A disposable that only records whether it was disposed.
#[derive(Debug, Default)]
pub struct BooleanDisposable(AtomicBool);

impl BooleanDisposable {
  pub fn new() -> Self { Self::default() }

  /// A flag that starts out disposed.
  pub fn disposed() -> Self { Self(AtomicBool::new(true)) }

  /// Flip the flag. Returns `true` only for the call that performed the
  /// transition.
  #[inline]
  pub fn try_dispose(&self) -> bool {
    self
      .0
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .is_ok()
  }
}

impl Disposable for BooleanDisposable {
  #[inline]
  fn dispose(&self) { self.try_dispose(); }

  #[inline]
  fn is_disposed(&self) -> bool { self.0.load(Ordering::Acquire) }
}

type Teardown = Box<dyn FnOnce() + Send>;

/// Runs a teardown closure the first time it is disposed.
pub struct AnonymousDisposable {
  flag: BooleanDisposable,
  teardown: Mutex<Option<Teardown>>,
}

impl AnonymousDisposable {
  pub fn new<F>(teardown: F) -> Self
  where
    F: FnOnce() + Send + 'static,
  {
    Self {
      flag: BooleanDisposable::new(),
      teardown: Mutex::new(Some(Box::new(teardown))),
    }
  }
}

impl Disposable for AnonymousDisposable {
  fn dispose(&self) {
    if self.flag.try_dispose() {
      let teardown = self.teardown.lock().take();
      if let Some(teardown) = teardown {
        teardown();
      }
    }
  }

  #[inline]
  fn is_disposed(&self) -> bool { self.flag.is_disposed() }
}

impl Debug for AnonymousDisposable {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AnonymousDisposable")
      .field("is_disposed", &self.is_disposed())
      .finish()
  }
}
