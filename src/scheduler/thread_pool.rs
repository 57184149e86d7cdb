use std::fmt::{Debug, Formatter};

use futures::{executor::ThreadPool, future};

use super::{Action, ScheduledAction, Scheduler};
use crate::{
  disposable::BoxedDisposable,
  error::{Error, ErrorHook, ErrorOrigin},
};

/// Runs actions on a pool of worker threads.
///
/// Clones share the same pool. Two actions scheduled separately may run in
/// any order and concurrently.
#[derive(Clone)]
pub struct ThreadPoolScheduler {
  pool: ThreadPool,
  hook: ErrorHook,
}

impl ThreadPoolScheduler {
  /// A pool with one worker per CPU.
  pub fn new(hook: ErrorHook) -> Result<Self, Error> { Self::builder().build(hook) }

  pub fn builder() -> ThreadPoolSchedulerBuilder { ThreadPoolSchedulerBuilder::default() }
}

impl Scheduler for ThreadPoolScheduler {
  fn schedule(&self, action: Action) -> BoxedDisposable {
    let (task, handle) = ScheduledAction::new(action);
    let hook = self.hook.clone();
    self.pool.spawn_ok(future::lazy(move |_| {
      task.run(&hook, ErrorOrigin::ThreadPool);
    }));
    BoxedDisposable::new(handle)
  }
}

impl Debug for ThreadPoolScheduler {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ThreadPoolScheduler")
      .field("hook", &self.hook)
      .finish()
  }
}

/// Configures the worker pool behind a [`ThreadPoolScheduler`].
#[derive(Clone, Debug)]
pub struct ThreadPoolSchedulerBuilder {
  pool_size: Option<usize>,
  name_prefix: String,
}

impl Default for ThreadPoolSchedulerBuilder {
  fn default() -> Self { Self { pool_size: None, name_prefix: "rx-worker-".to_string() } }
}

impl ThreadPoolSchedulerBuilder {
  /// Number of worker threads. Defaults to the number of CPUs.
  pub fn pool_size(mut self, size: usize) -> Self {
    self.pool_size = Some(size.max(1));
    self
  }

  pub fn name_prefix(mut self, prefix: impl Into<String>) -> Self {
    self.name_prefix = prefix.into();
    self
  }

  pub fn build(self, hook: ErrorHook) -> Result<ThreadPoolScheduler, Error> {
    let mut builder = ThreadPool::builder();
    builder.name_prefix(self.name_prefix.as_str());
    if let Some(size) = self.pool_size {
      builder.pool_size(size);
    }
    let pool = builder.create()?;
    tracing::debug!(pool_size = ?self.pool_size, prefix = %self.name_prefix, "thread pool scheduler started");
    Ok(ThreadPoolScheduler { pool, hook })
  }
}

#[cfg(test)]
mod tests {
  use std::{
    collections::HashSet,
    sync::{
      atomic::{AtomicBool, AtomicUsize, Ordering},
      mpsc, Arc, Mutex,
    },
    thread,
    time::Duration,
  };

  use super::*;
  use crate::{disposable::Disposable, scheduler::SchedulerExt};

  #[test]
  fn runs_off_the_calling_thread() {
    let scheduler = ThreadPoolScheduler::builder()
      .pool_size(2)
      .build(ErrorHook::new())
      .unwrap();
    let (tx, rx) = mpsc::channel();
    scheduler.schedule_fn(move || tx.send(thread::current().id()).unwrap());
    let worker = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_ne!(worker, thread::current().id());
  }

  #[test]
  fn names_worker_threads() {
    let scheduler = ThreadPoolScheduler::builder()
      .pool_size(1)
      .name_prefix("tile-loader-")
      .build(ErrorHook::new())
      .unwrap();
    let (tx, rx) = mpsc::channel();
    scheduler.schedule_fn(move || {
      tx.send(thread::current().name().map(str::to_string)).unwrap()
    });
    let name = rx.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();
    assert!(name.starts_with("tile-loader-"));
  }

  #[test]
  fn cancelled_before_start_never_runs() {
    let scheduler = ThreadPoolScheduler::builder()
      .pool_size(1)
      .build(ErrorHook::new())
      .unwrap();

    // Occupy the only worker so the next action cannot start yet.
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let (started_tx, started_rx) = mpsc::channel();
    scheduler.schedule_fn(move || {
      started_tx.send(()).unwrap();
      let _ = release_rx.recv();
    });
    started_rx.recv_timeout(Duration::from_secs(5)).unwrap();

    let ran = Arc::new(AtomicBool::new(false));
    let c_ran = ran.clone();
    let handle = scheduler.schedule_fn(move || c_ran.store(true, Ordering::SeqCst));
    handle.dispose();
    assert!(handle.is_disposed());

    let (done_tx, done_rx) = mpsc::channel();
    scheduler.schedule_fn(move || done_tx.send(()).unwrap());
    release_tx.send(()).unwrap();
    done_rx.recv_timeout(Duration::from_secs(5)).unwrap();

    assert!(!ran.load(Ordering::SeqCst));
  }

  #[test]
  fn panics_are_reported_and_pool_survives() {
    let hook = ErrorHook::new();
    let failures = Arc::new(AtomicUsize::new(0));
    let c_failures = failures.clone();
    hook
      .install(move |e| {
        assert_eq!(e.origin, ErrorOrigin::ThreadPool);
        c_failures.fetch_add(1, Ordering::SeqCst);
      })
      .unwrap();

    let scheduler = ThreadPoolScheduler::builder().pool_size(1).build(hook).unwrap();
    scheduler.schedule_fn(|| panic!("decode failed"));

    let (tx, rx) = mpsc::channel();
    scheduler.schedule_fn(move || tx.send(()).unwrap());
    rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(failures.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn uses_several_workers() {
    let scheduler = ThreadPoolScheduler::builder()
      .pool_size(4)
      .build(ErrorHook::new())
      .unwrap();
    let threads = Arc::new(Mutex::new(HashSet::new()));
    let (tx, rx) = mpsc::channel();
    for _ in 0..64 {
      let threads = threads.clone();
      let tx = tx.clone();
      scheduler.schedule_fn(move || {
        threads.lock().unwrap().insert(thread::current().id());
        thread::sleep(Duration::from_millis(2));
        tx.send(()).unwrap();
      });
    }
    for _ in 0..64 {
      rx.recv_timeout(Duration::from_secs(5)).unwrap();
    }
    assert!(threads.lock().unwrap().len() > 1);
  }
}
