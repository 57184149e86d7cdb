use std::sync::{
  atomic::{AtomicU8, Ordering},
  Arc,
};

use super::Action;
use crate::{
  disposable::Disposable,
  error::{ErrorHook, ErrorOrigin},
};

const PENDING: u8 = 0;
const RUNNING: u8 = 1;
const FINISHED: u8 = 2;
const CANCELLED: u8 = 3;

/// An action waiting in a scheduler, paired with the state its
/// [`ActionHandle`] observes.
pub(crate) struct ScheduledAction {
  state: Arc<AtomicU8>,
  action: Action,
}

impl ScheduledAction {
  pub(crate) fn new(action: Action) -> (Self, ActionHandle) {
    let state = Arc::new(AtomicU8::new(PENDING));
    (Self { state: state.clone(), action }, ActionHandle(state))
  }

  /// Run the action unless it was cancelled first.
  ///
  /// Returns `false` when the action was skipped.
  pub(crate) fn run(self, hook: &ErrorHook, origin: ErrorOrigin) -> bool {
    if self
      .state
      .compare_exchange(PENDING, RUNNING, Ordering::AcqRel, Ordering::Acquire)
      .is_err()
    {
      return false;
    }
    hook.catch(origin, self.action);
    self.state.store(FINISHED, Ordering::Release);
    true
  }

  #[inline]
  pub(crate) fn is_cancelled(&self) -> bool { self.state.load(Ordering::Acquire) == CANCELLED }
}

/// Cancellation handle of a scheduled action.
///
/// Disposing it before the action starts guarantees the action never runs.
/// It reports disposed once the action was cancelled or has finished.
#[derive(Clone, Debug)]
pub struct ActionHandle(Arc<AtomicU8>);

impl ActionHandle {
  #[inline]
  pub fn is_finished(&self) -> bool { self.0.load(Ordering::Acquire) == FINISHED }
}

impl Disposable for ActionHandle {
  fn dispose(&self) {
    let _ = self
      .0
      .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire);
  }

  fn is_disposed(&self) -> bool {
    matches!(self.0.load(Ordering::Acquire), FINISHED | CANCELLED)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::AtomicBool;

  use super::*;

  #[test]
  fn cancel_before_run() {
    let ran = Arc::new(AtomicBool::new(false));
    let c_ran = ran.clone();
    let (task, handle) = ScheduledAction::new(Box::new(move || c_ran.store(true, Ordering::SeqCst)));
    handle.dispose();
    assert!(task.is_cancelled());
    assert!(!task.run(&ErrorHook::new(), ErrorOrigin::Immediate));
    assert!(!ran.load(Ordering::SeqCst));
    assert!(handle.is_disposed());
    assert!(!handle.is_finished());
  }

  #[test]
  fn cancel_after_run_is_noop() {
    let (task, handle) = ScheduledAction::new(Box::new(|| {}));
    assert!(!handle.is_disposed());
    assert!(task.run(&ErrorHook::new(), ErrorOrigin::Immediate));
    handle.dispose();
    assert!(handle.is_finished());
    assert!(handle.is_disposed());
  }

  #[test]
  fn panicking_action_still_finishes() {
    let (task, handle) = ScheduledAction::new(Box::new(|| panic!("bad tile")));
    assert!(task.run(&ErrorHook::new(), ErrorOrigin::Immediate));
    assert!(handle.is_finished());
  }
}
