//! Schedulers decide which execution context runs a unit of work.
//!
//! - [`ThreadPoolScheduler`]: runs work on any worker of a shared pool, with
//!   no ordering between separately scheduled actions.
//! - [`MainThreadScheduler`]: queues work until the host drives
//!   [`MainThreadScheduler::pump`], then runs it in FIFO order.
//! - [`ImmediateScheduler`]: runs work inline on the calling thread.
//!
//! `schedule` never blocks. The returned disposable cancels the action if it
//! has not started yet; an action that already started runs to completion.
//! A panicking action is caught and reported to the [`ErrorHook`], it never
//! takes down a worker or the pump.

use std::sync::Arc;

use crate::{
  disposable::BoxedDisposable,
  error::{ErrorHook, ErrorOrigin},
};

mod action;
mod main_thread;
mod thread_pool;

pub use action::ActionHandle;
pub(crate) use action::ScheduledAction;
pub use main_thread::MainThreadScheduler;
pub use thread_pool::{ThreadPoolScheduler, ThreadPoolSchedulerBuilder};

/// A unit of work handed to a scheduler.
pub type Action = Box<dyn FnOnce() + Send + 'static>;

/// A Scheduler is an object to order actions and schedule their execution.
pub trait Scheduler: Send + Sync {
  fn schedule(&self, action: Action) -> BoxedDisposable;
}

/// Closure-friendly scheduling on top of the object-safe [`Scheduler`].
pub trait SchedulerExt: Scheduler {
  fn schedule_fn<F>(&self, f: F) -> BoxedDisposable
  where
    F: FnOnce() + Send + 'static,
  {
    self.schedule(Box::new(f))
  }
}

impl<S: Scheduler + ?Sized> SchedulerExt for S {}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
  #[inline]
  fn schedule(&self, action: Action) -> BoxedDisposable { (**self).schedule(action) }
}

impl<S: Scheduler + ?Sized> Scheduler for Box<S> {
  #[inline]
  fn schedule(&self, action: Action) -> BoxedDisposable { (**self).schedule(action) }
}

/// Runs every action synchronously on the calling thread.
#[derive(Clone, Debug, Default)]
pub struct ImmediateScheduler {
  hook: ErrorHook,
}

impl ImmediateScheduler {
  pub fn new(hook: ErrorHook) -> Self { Self { hook } }
}

impl Scheduler for ImmediateScheduler {
  fn schedule(&self, action: Action) -> BoxedDisposable {
    let (task, handle) = ScheduledAction::new(action);
    task.run(&self.hook, ErrorOrigin::Immediate);
    BoxedDisposable::new(handle)
  }
}
