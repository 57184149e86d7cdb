use parking_lot::Mutex;

use super::{BoxedDisposable, Disposable};

enum Slot {
  Open(Option<BoxedDisposable>),
  Disposed,
}

/// A single replaceable slot.
///
/// Replacing the occupant does **not** dispose it: the previous value is
/// handed back to whoever still owns it, so a placeholder can be detached
/// from one subscription and reattached to another. Once the container is
/// disposed, every later assignment is disposed immediately and never
/// stored.
pub struct MultipleAssignmentDisposable(Mutex<Slot>);

impl Default for MultipleAssignmentDisposable {
  fn default() -> Self { Self(Mutex::new(Slot::Open(None))) }
}

impl MultipleAssignmentDisposable {
  pub fn new() -> Self { Self::default() }

  pub fn set(&self, disposable: impl Disposable + 'static) {
    let disposable = BoxedDisposable::new(disposable);
    let rejected = {
      let mut slot = self.0.lock();
      match &mut *slot {
        Slot::Open(current) => {
          *current = Some(disposable);
          None
        }
        Slot::Disposed => Some(disposable),
      }
    };
    // Outside the lock: user teardown may call back into this container.
    if let Some(d) = rejected {
      d.dispose();
    }
  }

  /// Detach the occupant without disposing it.
  pub fn take(&self) -> Option<BoxedDisposable> {
    match &mut *self.0.lock() {
      Slot::Open(current) => current.take(),
      Slot::Disposed => None,
    }
  }

  /// The occupant, or the empty disposable when unset or disposed.
  pub fn get(&self) -> BoxedDisposable {
    match &*self.0.lock() {
      Slot::Open(Some(d)) => d.clone(),
      _ => BoxedDisposable::empty(),
    }
  }
}

impl Disposable for MultipleAssignmentDisposable {
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

#[cfg(test)]
mod tests {
  use std::{
    sync::{atomic::Ordering, Arc, Barrier},
    thread,
  };

  use super::*;
  use crate::disposable::tests::counting;

  #[test]
  fn replace_does_not_dispose_previous() {
    let m = MultipleAssignmentDisposable::new();
    let (first, first_count) = counting();
    let (second, second_count) = counting();

    m.set(first.clone());
    m.set(second.clone());
    assert_eq!(first_count.load(Ordering::SeqCst), 0);
    assert!(m.get().ptr_eq(&second));

    m.dispose();
    assert_eq!(first_count.load(Ordering::SeqCst), 0);
    assert_eq!(second_count.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn assignment_after_dispose_is_disposed_not_stored() {
    let m = MultipleAssignmentDisposable::new();
    m.dispose();

    let (late, count) = counting();
    m.set(late.clone());
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert!(m.get().ptr_eq(&BoxedDisposable::empty()));
    assert!(!m.get().ptr_eq(&late));
  }

  #[test]
  fn read_after_dispose_is_noop() {
    let m = MultipleAssignmentDisposable::new();
    let (d, count) = counting();
    m.set(d);
    m.dispose();
    let read = m.get();
    assert!(read.ptr_eq(&BoxedDisposable::empty()));
    read.dispose();
    assert_eq!(count.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn take_detaches() {
    let m = MultipleAssignmentDisposable::new();
    let (d, count) = counting();
    m.set(d.clone());
    let taken = m.take().unwrap();
    assert!(taken.ptr_eq(&d));
    m.dispose();
    assert_eq!(count.load(Ordering::SeqCst), 0);
  }

  #[test]
  fn reentrant_dispose_from_rejected_value() {
    let m = Arc::new(MultipleAssignmentDisposable::new());
    m.dispose();
    let c_m = m.clone();
    m.set(crate::disposable::create(move || {
      c_m.set(BoxedDisposable::empty());
    }));
    assert!(m.is_disposed());
  }

  #[test]
  fn set_racing_dispose_releases_only_the_occupant() {
    for _ in 0..100 {
      let m = Arc::new(MultipleAssignmentDisposable::new());
      let barrier = Arc::new(Barrier::new(2));
      let setter = {
        let (m, barrier) = (m.clone(), barrier.clone());
        thread::spawn(move || {
          barrier.wait();
          (0..50)
            .map(|_| {
              let (d, count) = counting();
              m.set(d);
              count
            })
            .collect::<Vec<_>>()
        })
      };
      barrier.wait();
      m.dispose();
      let counts: Vec<_> = setter
        .join()
        .unwrap()
        .iter()
        .map(|c| c.load(Ordering::SeqCst))
        .collect();

      // replaced values are never released; the occupant at dispose time
      // and every later assignment are released exactly once
      assert!(counts.iter().all(|&c| c <= 1));
      assert!(counts.windows(2).all(|w| w[0] <= w[1]));
      assert_eq!(counts.last(), Some(&1));
    }
  }

  #[test]
  fn concurrent_dispose_releases_once() {
    for _ in 0..50 {
      let m = Arc::new(MultipleAssignmentDisposable::new());
      let (d, count) = counting();
      m.set(d);
      let barrier = Arc::new(Barrier::new(8));
      let handles: Vec<_> = (0..8)
        .map(|_| {
          let (m, barrier) = (m.clone(), barrier.clone());
          thread::spawn(move || {
            barrier.wait();
            m.dispose();
          })
        })
        .collect();
      for h in handles {
        h.join().unwrap();
      }
      assert_eq!(count.load(Ordering::SeqCst), 1);
    }
  }
}
