use parking_lot::Mutex;

use super::{BoxedDisposable, Disposable};

enum Slot {
  Open(Option<BoxedDisposable>),
  Disposed,
}

/// A single replaceable slot that disposes the value it replaces.
///
/// Use [`super::MultipleAssignmentDisposable`] when the replaced value must
/// survive the replacement.
pub struct SerialDisposable(Mutex<Slot>);

impl Default for SerialDisposable {
  fn default() -> Self { Self(Mutex::new(Slot::Open(None))) }
}

impl SerialDisposable {
  pub fn new() -> Self { Self::default() }

  pub fn set(&self, disposable: impl Disposable + 'static) {
    let disposable = BoxedDisposable::new(disposable);
    let stale = {
      let mut slot = self.0.lock();
      match &mut *slot {
        Slot::Open(current) => current.replace(disposable),
        Slot::Disposed => Some(disposable),
      }
    };
    if let Some(d) = stale {
      d.dispose();
    }
  }

  pub fn get(&self) -> BoxedDisposable {
    match &*self.0.lock() {
      Slot::Open(Some(d)) => d.clone(),
      _ => BoxedDisposable::empty(),
    }
  }
}

impl Disposable for SerialDisposable {
  fn dispose(&self) {
    let current = {
      let mut slot = self.0.lock();
      match std::mem::replace(&mut *slot, Slot::Disposed) {
        Slot::Open(current) => current,
        Slot::Disposed => None,
      }
    };
    if let Some(d) = current {
      d.dispose();
    }
  }

  fn is_disposed(&self) -> bool { matches!(*self.0.lock(), Slot::Disposed) }
}
