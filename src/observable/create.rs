use crate::{
  disposable::{BoxedDisposable, CompositeDisposable},
  error::ErrorHook,
  observable::Observable,
  observer::BoxedObserver,
  subscriber::Subscriber,
};

/// Creates a cold observable from a producer function.
///
/// The producer runs once per subscription with that subscription's
/// [`Subscriber`]. It may emit synchronously or hand the subscriber to other
/// threads, and returns the teardown run when the subscription is disposed.
///
/// ```rust
/// use rxmain::prelude::*;
///
/// let numbers = observable::create(|s: Subscriber<i32, ()>| {
///   s.next(1);
///   s.next(2);
///   s.complete();
///   disposable::empty()
/// });
/// numbers.subscribe_all(|v| println!("{v}"), |_| {}, || println!("done"));
/// ```
pub fn create<Item, Err, F>(producer: F) -> Create<F>
where
  F: Fn(Subscriber<Item, Err>) -> BoxedDisposable + Send + Sync,
{
  Create { producer, hook: ErrorHook::default() }
}

#[derive(Clone)]
pub struct Create<F> {
  producer: F,
  hook: ErrorHook,
}

impl<F> Create<F> {
  /// Report observer failures of this source to `hook`.
  pub fn with_hook(mut self, hook: ErrorHook) -> Self {
    self.hook = hook;
    self
  }
}

impl<Item, Err, F> Observable<Item, Err> for Create<F>
where
  F: Fn(Subscriber<Item, Err>) -> BoxedDisposable + Send + Sync,
  Item: Send + 'static,
  Err: Send + 'static,
{
  fn actual_subscribe(&self, observer: BoxedObserver<Item, Err>) -> BoxedDisposable {
    let subscriber = Subscriber::new(observer, self.hook.clone());
    let subscription = CompositeDisposable::new();
    subscription.add(subscriber.clone());
    subscription.add((self.producer)(subscriber));
    BoxedDisposable::new(subscription)
  }

  fn error_hook(&self) -> ErrorHook { self.hook.clone() }
}

#[cfg(test)]
mod tests {
  use std::{
    sync::{
      atomic::{AtomicBool, Ordering},
      Arc, Mutex,
    },
    thread,
  };

  use super::*;
  use crate::{
    disposable::{self, Disposable},
    observable::ObservableExt,
  };

  #[test]
  fn terminal_state_drops_late_emissions() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (l1, l2, l3) = (log.clone(), log.clone(), log.clone());
    create(|s: Subscriber<i32, &'static str>| {
      s.next(1);
      s.next(2);
      s.complete();
      s.next(3);
      s.error("late");
      disposable::empty()
    })
    .subscribe_all(
      move |v| l1.lock().unwrap().push(format!("next {v}")),
      move |e| l2.lock().unwrap().push(format!("error {e}")),
      move || l3.lock().unwrap().push("complete".to_string()),
    );
    assert_eq!(*log.lock().unwrap(), vec!["next 1", "next 2", "complete"]);
  }

  #[test]
  fn each_subscription_runs_the_producer() {
    let source = create(|s: Subscriber<i32, ()>| {
      s.next(7);
      disposable::empty()
    });
    let seen = Arc::new(Mutex::new(Vec::new()));
    for _ in 0..3 {
      let seen = seen.clone();
      source.subscribe_all(move |v| seen.lock().unwrap().push(v), |_| {}, || {});
    }
    assert_eq!(*seen.lock().unwrap(), vec![7, 7, 7]);
  }

  #[test]
  fn dispose_runs_teardown_and_stops_background_producer() {
    let torn_down = Arc::new(AtomicBool::new(false));
    let c_torn_down = torn_down.clone();
    let (tx, rx) = std::sync::mpsc::channel::<Subscriber<i32, ()>>();
    let tx = Mutex::new(tx);
    let source = create(move |s: Subscriber<i32, ()>| {
      tx.lock().unwrap().send(s).unwrap();
      let torn_down = c_torn_down.clone();
      disposable::create(move || torn_down.store(true, Ordering::SeqCst))
    });

    let seen = Arc::new(Mutex::new(Vec::new()));
    let c_seen = seen.clone();
    let subscription = source.subscribe_all(move |v| c_seen.lock().unwrap().push(v), |_| {}, || {});
    let producer_side = rx.recv().unwrap();

    let worker = thread::spawn(move || {
      producer_side.next(1);
      producer_side
    });
    let producer_side = worker.join().unwrap();

    subscription.dispose();
    assert!(torn_down.load(Ordering::SeqCst));
    assert!(producer_side.is_closed());
    producer_side.next(2);
    assert_eq!(*seen.lock().unwrap(), vec![1]);
  }
}
