use std::{
  fmt::{Debug, Formatter},
  mem,
};

use parking_lot::Mutex;
use smallvec::SmallVec;

use super::{BoxedDisposable, Disposable};

#[derive(Default)]
struct Inner {
  disposed: bool,
  members: SmallVec<[BoxedDisposable; 2]>,
}

/// An ordered group of disposables released together.
///
/// Members are disposed in insertion order. Adding to a disposed composite
/// disposes the new member right away, so nothing added concurrently with
/// `dispose` escapes release. A member that released itself stays listed
/// until it is removed, cleared or the composite is disposed.
#[derive(Default)]
pub struct CompositeDisposable(Mutex<Inner>);

impl CompositeDisposable {
  pub fn new() -> Self { Self::default() }

  /// Add a member, returning the handle that identifies it for
  /// [`CompositeDisposable::remove`].
  pub fn add(&self, disposable: impl Disposable + 'static) -> BoxedDisposable {
    let disposable = BoxedDisposable::new(disposable);
    let accepted = {
      let mut inner = self.0.lock();
      if !inner.disposed {
        inner.members.push(disposable.clone());
      }
      !inner.disposed
    };
    if !accepted {
      disposable.dispose();
    }
    disposable
  }

  /// Remove one occurrence of `disposable` and dispose it.
  ///
  /// Returns `false` when it was not a member.
  pub fn remove(&self, disposable: &BoxedDisposable) -> bool {
    let removed = {
      let mut inner = self.0.lock();
      inner
        .members
        .iter()
        .position(|m| m.ptr_eq(disposable))
        .map(|pos| inner.members.remove(pos))
    };
    match removed {
      Some(d) => {
        d.dispose();
        true
      }
      None => false,
    }
  }

  /// Dispose every member while keeping the composite usable.
  pub fn clear(&self) {
    let members = mem::take(&mut self.0.lock().members);
    for m in members {
      m.dispose();
    }
  }

  pub fn contains(&self, disposable: &BoxedDisposable) -> bool {
    self.0.lock().members.iter().any(|m| m.ptr_eq(disposable))
  }

  #[inline]
  pub fn len(&self) -> usize { self.0.lock().members.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.0.lock().members.is_empty() }
}

impl Disposable for CompositeDisposable {
  fn dispose(&self) {
    let members = {
      let mut inner = self.0.lock();
      if inner.disposed {
        return;
      }
      inner.disposed = true;
      mem::take(&mut inner.members)
    };
    for m in members {
      m.dispose();
    }
  }

  fn is_disposed(&self) -> bool { self.0.lock().disposed }
}

impl Debug for CompositeDisposable {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let inner = self.0.lock();
    f.debug_struct("CompositeDisposable")
      .field("disposed", &inner.disposed)
      .field("len", &inner.members.len())
      .finish()
  }
}
