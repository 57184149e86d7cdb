//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

// Bus
pub use crate::bus::{Message, MessageBus, MessageStream};
// Disposables
pub use crate::disposable::{
  self, AnonymousDisposable, BooleanDisposable, BoxedDisposable, CompositeDisposable,
  Disposable, DisposeGuard, MultipleAssignmentDisposable, SerialDisposable,
  SingleAssignmentDisposable,
};
// Errors
pub use crate::error::{Error, ErrorHook, ErrorOrigin, UnhandledError};
// Observable & observer
pub use crate::observable::{self, BoxedObservable, Create, Observable, ObservableExt};
pub use crate::observer::{AllObserver, BoxedObserver, FnMutObserver, Observer};
// Operators
pub use crate::ops::observe_on::ObserveOn;
// Runtime
pub use crate::runtime::{Runtime, RuntimeBuilder};
// Schedulers
pub use crate::scheduler::{
  Action, ActionHandle, ImmediateScheduler, MainThreadScheduler, Scheduler, SchedulerExt,
  ThreadPoolScheduler, ThreadPoolSchedulerBuilder,
};
pub use crate::{subject::Subject, subscriber::Subscriber};
