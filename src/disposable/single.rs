use std::mem;

use parking_lot::Mutex;

use super::{BoxedDisposable, Disposable};
use crate::error::Error;

enum Slot {
  Empty,
  Assigned(BoxedDisposable),
  Disposed { assigned: bool },
}

/// A slot that accepts exactly one disposable.
///
/// Assigning twice is a programming error and returns
/// [`Error::AlreadyAssigned`]. If the container is disposed before the value
/// arrives, the value is disposed as soon as it is assigned.
pub struct SingleAssignmentDisposable(Mutex<Slot>);

impl Default for SingleAssignmentDisposable {
  fn default() -> Self { Self(Mutex::new(Slot::Empty)) }
}

impl SingleAssignmentDisposable {
  pub fn new() -> Self { Self::default() }

  pub fn set(&self, disposable: impl Disposable + 'static) -> Result<(), Error> {
    let disposable = BoxedDisposable::new(disposable);
    let dispose_now = {
      let mut slot = self.0.lock();
      match &*slot {
        Slot::Empty => {
          *slot = Slot::Assigned(disposable.clone());
          false
        }
        Slot::Disposed { assigned: false } => {
          *slot = Slot::Disposed { assigned: true };
          true
        }
        Slot::Assigned(_) | Slot::Disposed { assigned: true } => {
          return Err(Error::AlreadyAssigned);
        }
      }
    };
    if dispose_now {
      disposable.dispose();
    }
    Ok(())
  }

  /// The assigned disposable, or the empty disposable when unset or disposed.
  pub fn get(&self) -> BoxedDisposable {
    match &*self.0.lock() {
      Slot::Assigned(d) => d.clone(),
      _ => BoxedDisposable::empty(),
    }
  }
}

impl Disposable for SingleAssignmentDisposable {
  fn dispose(&self) {
    let current = {
      let mut slot = self.0.lock();
      match mem::replace(&mut *slot, Slot::Disposed { assigned: false }) {
        Slot::Empty => None,
        Slot::Assigned(d) => {
          *slot = Slot::Disposed { assigned: true };
          Some(d)
        }
        disposed @ Slot::Disposed { .. } => {
          *slot = disposed;
          None
        }
      }
    };
    if let Some(d) = current {
      d.dispose();
    }
  }

  fn is_disposed(&self) -> bool { matches!(*self.0.lock(), Slot::Disposed { .. }) }
}
