//! The process-wide context object.
//!
//! A [`Runtime`] bundles the pieces an application wires together once at
//! startup: the unhandled-error hook, the two schedulers and the message bus.
//! It is an ordinary value passed to whoever needs it, never a global.
//!
//! ```rust
//! use rxmain::prelude::*;
//!
//! let runtime = Runtime::builder()
//!   .pool_size(2)
//!   .error_hook(|e| eprintln!("{e}"))
//!   .build()
//!   .unwrap();
//!
//! let main = runtime.main_thread().clone();
//! runtime.thread_pool().schedule_fn(move || {
//!   main.schedule_fn(|| println!("back on the main thread"));
//! });
//! # std::thread::sleep(std::time::Duration::from_millis(50));
//! runtime.pump();
//! runtime.shutdown();
//! ```

use crate::{
  bus::MessageBus,
  disposable::Disposable,
  error::{Error, ErrorHook, UnhandledError},
  scheduler::{MainThreadScheduler, ThreadPoolScheduler, ThreadPoolSchedulerBuilder},
};

type HookFn = Box<dyn Fn(&UnhandledError) + Send + Sync>;

/// Schedulers, bus and error hook sharing one lifetime.
///
/// Clones are cheap and refer to the same schedulers and bus.
#[derive(Clone, Debug)]
pub struct Runtime {
  hook: ErrorHook,
  thread_pool: ThreadPoolScheduler,
  main_thread: MainThreadScheduler,
  bus: MessageBus,
}

impl Runtime {
  /// A runtime with default settings. Must be called on the thread that will
  /// pump the main-thread scheduler.
  pub fn new() -> Result<Self, Error> { Self::builder().build() }

  pub fn builder() -> RuntimeBuilder { RuntimeBuilder::default() }

  #[inline]
  pub fn thread_pool(&self) -> &ThreadPoolScheduler { &self.thread_pool }

  #[inline]
  pub fn main_thread(&self) -> &MainThreadScheduler { &self.main_thread }

  #[inline]
  pub fn bus(&self) -> &MessageBus { &self.bus }

  #[inline]
  pub fn error_hook(&self) -> &ErrorHook { &self.hook }

  /// Run the actions queued on the main-thread scheduler. Returns how many
  /// ran.
  pub fn pump(&self) -> usize { self.main_thread.pump() }

  /// Tear down the bus: every subscription completes and later publishes are
  /// ignored. Actions already queued on the schedulers still run.
  pub fn shutdown(&self) {
    if self.bus.is_disposed() {
      return;
    }
    tracing::debug!(pending = self.main_thread.pending(), "runtime shutting down");
    self.bus.dispose();
  }
}

/// Configures a [`Runtime`].
#[derive(Default)]
pub struct RuntimeBuilder {
  pool: ThreadPoolSchedulerBuilder,
  hook: Option<HookFn>,
}

impl RuntimeBuilder {
  /// Number of thread-pool workers. Defaults to the number of CPUs.
  pub fn pool_size(mut self, size: usize) -> Self {
    self.pool = self.pool.pool_size(size);
    self
  }

  /// Thread name prefix of the thread-pool workers.
  pub fn name_prefix(mut self, prefix: impl Into<String>) -> Self {
    self.pool = self.pool.name_prefix(prefix);
    self
  }

  /// Callback receiving every failure caught in an action or observer.
  pub fn error_hook<F>(mut self, f: F) -> Self
  where
    F: Fn(&UnhandledError) + Send + Sync + 'static,
  {
    self.hook = Some(Box::new(f));
    self
  }

  /// Spawn the worker pool and build the runtime. The calling thread becomes
  /// the main thread.
  pub fn build(self) -> Result<Runtime, Error> {
    let hook = ErrorHook::new();
    if let Some(f) = self.hook {
      hook.install(f)?;
    }
    let thread_pool = self.pool.build(hook.clone())?;
    let main_thread = MainThreadScheduler::new(hook.clone());
    let bus = MessageBus::new(hook.clone());
    tracing::debug!(hook_installed = hook.is_installed(), "runtime started");
    Ok(Runtime { hook, thread_pool, main_thread, bus })
  }
}

#[cfg(test)]
mod tests {
  use std::{
    sync::{mpsc, Arc, Mutex},
    thread,
    time::Duration,
  };

  use super::*;
  use crate::{error::ErrorOrigin, observable::ObservableExt, scheduler::SchedulerExt};

  #[test]
  fn components_share_the_hook() {
    let errors = Arc::new(Mutex::new(Vec::new()));
    let c_errors = errors.clone();
    let runtime = Runtime::builder()
      .pool_size(1)
      .error_hook(move |e| c_errors.lock().unwrap().push(e.origin))
      .build()
      .unwrap();
    assert!(runtime.error_hook().is_installed());

    runtime.main_thread().schedule_fn(|| panic!("main"));
    runtime.pump();

    let _s = runtime
      .bus()
      .subscribe::<u8>()
      .subscribe(|_| panic!("observer"));
    runtime.bus().publish(1_u8);

    let (tx, rx) = mpsc::channel();
    runtime.thread_pool().schedule_fn(|| panic!("worker"));
    runtime.thread_pool().schedule_fn(move || tx.send(()).unwrap());
    rx.recv_timeout(Duration::from_secs(5)).unwrap();
    thread::sleep(Duration::from_millis(50));

    let errors = errors.lock().unwrap();
    assert!(errors.contains(&ErrorOrigin::MainThread));
    assert!(errors.contains(&ErrorOrigin::Delivery));
    assert!(errors.contains(&ErrorOrigin::ThreadPool));
  }

  #[test]
  fn building_thread_is_the_main_thread() {
    let runtime = Runtime::new().unwrap();
    assert!(runtime.main_thread().is_main_thread());
    let main = runtime.main_thread().clone();
    let on_other = thread::spawn(move || main.is_main_thread()).join().unwrap();
    assert!(!on_other);
  }

  #[test]
  fn worker_to_main_thread_roundtrip() {
    let runtime = Runtime::builder().pool_size(2).build().unwrap();
    let (tx, rx) = mpsc::channel();
    let main = runtime.main_thread().clone();
    runtime.thread_pool().schedule_fn(move || {
      main.schedule_fn(move || tx.send(thread::current().id()).unwrap());
    });

    let mut ran = 0;
    for _ in 0..100 {
      ran += runtime.pump();
      if ran > 0 {
        break;
      }
      thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(ran, 1);
    assert_eq!(rx.try_recv().unwrap(), thread::current().id());
  }

  #[test]
  fn shutdown_disposes_the_bus() {
    let runtime = Runtime::new().unwrap();
    let completed = Arc::new(Mutex::new(false));
    let c_completed = completed.clone();
    let _s = runtime
      .bus()
      .subscribe::<String>()
      .subscribe_all(|_| {}, |_| {}, move || *c_completed.lock().unwrap() = true);

    runtime.shutdown();
    runtime.shutdown();
    assert!(runtime.bus().is_disposed());
    assert!(*completed.lock().unwrap());
    assert_eq!(runtime.bus().subscriber_count::<String>(), 0);
  }

  #[test]
  fn second_hook_is_rejected() {
    let runtime = Runtime::builder()
      .error_hook(|_| {})
      .build()
      .unwrap();
    assert!(matches!(
      runtime.error_hook().install(|_| {}),
      Err(Error::HookAlreadyInstalled)
    ));
  }
}
