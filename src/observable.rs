//! Observable trait and the subscribe helpers.
//!
//! [`Observable`] is the object-safe core: hand it a boxed observer, get back
//! the disposable of that subscription. Every subscription is independent.
//! [`ObservableExt`] layers closure subscription and `observe_on` on top.

use std::sync::Arc;

use crate::{
  disposable::BoxedDisposable,
  error::ErrorHook,
  observer::{AllObserver, BoxedObserver, FnMutObserver, Observer},
  ops::observe_on::ObserveOn,
  scheduler::{MainThreadScheduler, Scheduler},
};

pub mod create;
pub use create::{create, Create};

/// A push-based source of values.
pub trait Observable<Item, Err>: Send + Sync {
  /// Register `observer` and return the disposable that deregisters it.
  fn actual_subscribe(&self, observer: BoxedObserver<Item, Err>) -> BoxedDisposable;

  /// The hook receiving failures of observers subscribed to this source.
  fn error_hook(&self) -> ErrorHook { ErrorHook::default() }
}

/// Type-erased observable.
pub type BoxedObservable<Item, Err> = Arc<dyn Observable<Item, Err>>;

impl<Item, Err, T> Observable<Item, Err> for Arc<T>
where
  T: Observable<Item, Err> + ?Sized,
{
  #[inline]
  fn actual_subscribe(&self, observer: BoxedObserver<Item, Err>) -> BoxedDisposable {
    (**self).actual_subscribe(observer)
  }

  #[inline]
  fn error_hook(&self) -> ErrorHook { (**self).error_hook() }
}

pub trait ObservableExt<Item, Err>: Observable<Item, Err> {
  /// Subscribe with a `next` closure.
  fn subscribe<F>(&self, next: F) -> BoxedDisposable
  where
    F: FnMut(Item) + Send + 'static,
    FnMutObserver<F>: Observer<Item, Err>,
    Item: 'static,
    Err: 'static,
  {
    self.actual_subscribe(Box::new(FnMutObserver(next)))
  }

  /// Subscribe with one closure per signal.
  fn subscribe_all<N, E, C>(&self, next: N, error: E, complete: C) -> BoxedDisposable
  where
    N: FnMut(Item) + Send + 'static,
    E: FnOnce(Err) + Send + 'static,
    C: FnOnce() + Send + 'static,
    Item: 'static,
    Err: 'static,
  {
    self.actual_subscribe(Box::new(AllObserver { next, error, complete }))
  }

  fn subscribe_with<O>(&self, observer: O) -> BoxedDisposable
  where
    O: Observer<Item, Err> + Send + 'static,
    Item: 'static,
    Err: 'static,
  {
    self.actual_subscribe(Box::new(observer))
  }

  /// Re-deliver every signal through `scheduler`, keeping the order of each
  /// subscription.
  fn observe_on<SD>(self, scheduler: SD) -> ObserveOn<Self, SD>
  where
    Self: Sized,
    SD: Scheduler + Clone + 'static,
  {
    ObserveOn::new(self, scheduler)
  }

  /// Deliver every signal during the pumps of `main`, never on the producer
  /// thread.
  fn observe_on_main_thread(self, main: &MainThreadScheduler) -> ObserveOn<Self, MainThreadScheduler>
  where
    Self: Sized,
  {
    ObserveOn::new(self, main.clone())
  }

  fn box_it(self) -> BoxedObservable<Item, Err>
  where
    Self: Sized + 'static,
  {
    Arc::new(self)
  }
}

impl<Item, Err, T> ObservableExt<Item, Err> for T where T: Observable<Item, Err> {}
