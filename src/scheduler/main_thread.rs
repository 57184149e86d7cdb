use std::{
  collections::VecDeque,
  fmt::{Debug, Formatter},
  mem,
  sync::Arc,
  thread::{self, ThreadId},
};

use parking_lot::Mutex;

use super::{Action, ScheduledAction, Scheduler};
use crate::{
  disposable::BoxedDisposable,
  error::{ErrorHook, ErrorOrigin},
};

struct Inner {
  queue: Mutex<VecDeque<ScheduledAction>>,
  hook: ErrorHook,
  owner: ThreadId,
}

/// Queues actions for the single consumer thread.
///
/// Actions run only inside [`MainThreadScheduler::pump`], in the order they
/// were scheduled. Clones share the same queue, so a clone can be handed to
/// producer threads while the host keeps pumping on its own thread.
#[derive(Clone)]
pub struct MainThreadScheduler(Arc<Inner>);

impl MainThreadScheduler {
  /// Create a scheduler owned by the calling thread.
  pub fn new(hook: ErrorHook) -> Self {
    Self(Arc::new(Inner {
      queue: Mutex::new(VecDeque::new()),
      hook,
      owner: thread::current().id(),
    }))
  }

  /// Run every action queued before this call.
  ///
  /// Actions scheduled while pumping wait for the next pump. A panicking
  /// action is reported and the remaining actions still run. Returns the
  /// number of actions that ran.
  pub fn pump(&self) -> usize {
    let batch = mem::take(&mut *self.0.queue.lock());
    let queued = batch.len();
    let ran = batch
      .into_iter()
      .map(|task| task.run(&self.0.hook, ErrorOrigin::MainThread))
      .filter(|ran| *ran)
      .count();
    if queued > 0 {
      tracing::trace!(queued, ran, "main thread pump");
    }
    ran
  }

  /// Number of queued actions that were not cancelled.
  pub fn pending(&self) -> usize {
    self
      .0
      .queue
      .lock()
      .iter()
      .filter(|task| !task.is_cancelled())
      .count()
  }

  /// Whether the caller runs on the thread that created this scheduler.
  #[inline]
  pub fn is_main_thread(&self) -> bool { thread::current().id() == self.0.owner }
}

impl Scheduler for MainThreadScheduler {
  fn schedule(&self, action: Action) -> BoxedDisposable {
    let (task, handle) = ScheduledAction::new(action);
    self.0.queue.lock().push_back(task);
    BoxedDisposable::new(handle)
  }
}

impl Debug for MainThreadScheduler {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("MainThreadScheduler")
      .field("queued", &self.0.queue.lock().len())
      .field("owner", &self.0.owner)
      .finish()
  }
}
