use std::{
  any::Any,
  fmt::{Debug, Formatter},
  sync::Arc,
};

use once_cell::sync::Lazy;

use super::{Disposable, DisposeGuard, EmptyDisposable};

static EMPTY: Lazy<BoxedDisposable> = Lazy::new(|| BoxedDisposable(Arc::new(EmptyDisposable)));

/// A type-erased, cloneable disposable.
///
/// Clones share the same underlying disposable, so disposing any clone
/// disposes all of them. This is the handle returned by `subscribe` and
/// `schedule`, and the element type stored by the container disposables.
#[derive(Clone)]
pub struct BoxedDisposable(Arc<dyn Disposable>);

impl BoxedDisposable {
  /// Erase the type of `disposable`.
  ///
  /// Passing a `BoxedDisposable` returns it as is instead of wrapping it a
  /// second time.
  pub fn new<D: Disposable + 'static>(disposable: D) -> Self {
    let mut slot = Some(disposable);
    if let Some(boxed) = (&mut slot as &mut dyn Any)
      .downcast_mut::<Option<BoxedDisposable>>()
      .and_then(Option::take)
    {
      return boxed;
    }
    match slot {
      Some(d) => Self(Arc::new(d)),
      None => Self::empty(),
    }
  }

  /// The canonical no-op disposable.
  #[inline]
  pub fn empty() -> Self { EMPTY.clone() }

  /// Whether both handles refer to the same disposable.
  #[inline]
  pub fn ptr_eq(&self, other: &Self) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
  }

  /// Dispose this handle when the returned guard is dropped.
  pub fn into_guard(self) -> DisposeGuard { DisposeGuard::new(self) }
}

impl Disposable for BoxedDisposable {
  #[inline]
  fn dispose(&self) { self.0.dispose() }

  #[inline]
  fn is_disposed(&self) -> bool { self.0.is_disposed() }
}

impl Default for BoxedDisposable {
  fn default() -> Self { BoxedDisposable::empty() }
}

impl Debug for BoxedDisposable {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("BoxedDisposable")
      .field("is_disposed", &self.is_disposed())
      .finish()
  }
}
