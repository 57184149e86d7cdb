//! # rxmain: a small reactive core for main-loop applications
//!
//! Worker threads produce, the main thread consumes. This crate supplies the
//! plumbing in between: cancellable work on a thread pool, a main-thread
//! queue the host drains from its loop, push-based observables that can hop
//! between the two, and a bus routing messages by their type.
//!
//! ## Quick Start
//!
//! ```rust
//! use rxmain::prelude::*;
//!
//! let runtime = Runtime::new().unwrap();
//! let subject = Subject::<u32, ()>::with_hook(runtime.error_hook().clone());
//!
//! let _subscription = subject
//!   .clone()
//!   .observe_on_main_thread(runtime.main_thread())
//!   .subscribe_all(|v| println!("tile {v} ready"), |_| {}, || {});
//!
//! let producer = subject.clone();
//! runtime.thread_pool().schedule_fn(move || producer.next(7));
//! # std::thread::sleep(std::time::Duration::from_millis(50));
//! runtime.pump();
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Disposable`] | Handle to release a resource or cancel pending work |
//! | [`Scheduler`] | Where an action runs: [`ThreadPoolScheduler`], [`MainThreadScheduler`] |
//! | [`Observable`] / [`Observer`] | Push-based streams of `next`, `error`, `complete` |
//! | [`Subject`] | Hot stream fed by hand, multicasting to every subscriber |
//! | [`MessageBus`] | Publish/subscribe keyed by the message type |
//! | [`Runtime`] | The hook, schedulers and bus of one application |
//!
//! Failures inside actions and observers are panics caught at the dispatch
//! boundary and forwarded to the [`ErrorHook`]; they never unwind into a
//! scheduler or a producer.
//!
//! [`Disposable`]: disposable::Disposable
//! [`Scheduler`]: scheduler::Scheduler
//! [`ThreadPoolScheduler`]: scheduler::ThreadPoolScheduler
//! [`MainThreadScheduler`]: scheduler::MainThreadScheduler
//! [`Observable`]: observable::Observable
//! [`Observer`]: observer::Observer
//! [`Subject`]: subject::Subject
//! [`MessageBus`]: bus::MessageBus
//! [`Runtime`]: runtime::Runtime
//! [`ErrorHook`]: error::ErrorHook

pub mod bus;
pub mod disposable;
pub mod error;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod runtime;
pub mod scheduler;
pub mod subject;
pub mod subscriber;

// Re-export the prelude module
pub use prelude::*;

#[cfg(doctest)]
mod __markdown_doctests {
  mod readme {
    #![doc = include_str!("../README.md")]
  }
}
