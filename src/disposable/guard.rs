use super::{BoxedDisposable, Disposable};

/// An RAII guard over a disposable.
/// When this structure is dropped (falls out of scope), the inner disposable
/// is disposed, on every exit path including early returns and panics.
///
/// If you don't bind the guard to a variable it is dropped, and the
/// disposable released, immediately.
#[derive(Debug)]
#[must_use]
pub struct DisposeGuard(Option<BoxedDisposable>);

impl DisposeGuard {
  pub fn new(disposable: impl Disposable + 'static) -> Self {
    Self(Some(BoxedDisposable::new(disposable)))
  }

  /// Give up the guard without disposing, returning the inner disposable.
  pub fn disarm(mut self) -> BoxedDisposable { self.0.take().unwrap_or_default() }
}

impl Drop for DisposeGuard {
  fn drop(&mut self) {
    if let Some(d) = self.0.take() {
      d.dispose();
    }
  }
}

#[cfg(test)]
mod tests {
  use std::{panic, sync::atomic::Ordering};

  use super::*;
  use crate::disposable::tests::counting;

  #[test]
  fn disposes_on_scope_exit() {
    let (d, count) = counting();
    {
      let _guard = d.clone().into_guard();
      assert_eq!(count.load(Ordering::SeqCst), 0);
    }
    assert_eq!(count.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn disposes_on_panic() {
    let (d, count) = counting();
    let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
      let _guard = DisposeGuard::new(d.clone());
      panic!("unwinding");
    }));
    assert!(result.is_err());
    assert_eq!(count.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn disarm_keeps_resource() {
    let (d, count) = counting();
    let inner = DisposeGuard::new(d).disarm();
    assert_eq!(count.load(Ordering::SeqCst), 0);
    inner.dispose();
    assert_eq!(count.load(Ordering::SeqCst), 1);
  }
}
