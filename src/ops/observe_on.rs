use std::{collections::VecDeque, mem, sync::Arc};

use parking_lot::Mutex;

use crate::{
  disposable::{BoxedDisposable, CompositeDisposable, MultipleAssignmentDisposable},
  error::ErrorHook,
  observable::Observable,
  observer::{BoxedObserver, Observer},
  scheduler::{Scheduler, SchedulerExt},
  subscriber::Subscriber,
};

/// Re-delivers the signals of `source` on `scheduler`.
///
/// Signals of one subscription are queued and drained by a single scheduled
/// action at a time, so they arrive in the order they were produced on any
/// scheduler. Different subscriptions are drained independently.
#[derive(Clone)]
pub struct ObserveOn<S, SD> {
  source: S,
  scheduler: SD,
}

impl<S, SD> ObserveOn<S, SD> {
  pub fn new(source: S, scheduler: SD) -> Self { Self { source, scheduler } }
}

impl<S, SD, Item, Err> Observable<Item, Err> for ObserveOn<S, SD>
where
  S: Observable<Item, Err>,
  SD: Scheduler + Clone + 'static,
  Item: Send + 'static,
  Err: Send + 'static,
{
  fn actual_subscribe(&self, observer: BoxedObserver<Item, Err>) -> BoxedDisposable {
    let downstream = Subscriber::new(observer, self.source.error_hook());
    let drain = Arc::new(MultipleAssignmentDisposable::new());
    let state = Arc::new(ObserveOnState {
      queue: Mutex::new(SignalQueue::default()),
      downstream: downstream.clone(),
      scheduler: self.scheduler.clone(),
      drain: drain.clone(),
    });

    let subscription = CompositeDisposable::new();
    subscription.add(downstream);
    subscription.add(drain);
    subscription.add(
      self
        .source
        .actual_subscribe(Box::new(ObserveOnObserver { state })),
    );
    BoxedDisposable::new(subscription)
  }

  fn error_hook(&self) -> ErrorHook { self.source.error_hook() }
}

enum Signal<Item, Err> {
  Next(Item),
  Error(Err),
  Complete,
}

struct SignalQueue<Item, Err> {
  signals: VecDeque<Signal<Item, Err>>,
  draining: bool,
  // bumped for every scheduled drain
  generation: u64,
}

impl<Item, Err> Default for SignalQueue<Item, Err> {
  fn default() -> Self { Self { signals: VecDeque::new(), draining: false, generation: 0 } }
}

struct ObserveOnState<Item, Err, SD> {
  queue: Mutex<SignalQueue<Item, Err>>,
  downstream: Subscriber<Item, Err>,
  scheduler: SD,
  // handle of the latest scheduled drain only
  drain: Arc<MultipleAssignmentDisposable>,
}

impl<Item, Err, SD> ObserveOnState<Item, Err, SD>
where
  SD: Scheduler + 'static,
  Item: Send + 'static,
  Err: Send + 'static,
{
  fn push(self: &Arc<Self>, signal: Signal<Item, Err>) {
    if self.downstream.is_closed() {
      return;
    }
    let generation = {
      let mut queue = self.queue.lock();
      queue.signals.push_back(signal);
      if mem::replace(&mut queue.draining, true) {
        return;
      }
      queue.generation += 1;
      queue.generation
    };
    // not under the lock: an inline scheduler runs the drain right here
    let this = self.clone();
    let handle = self.scheduler.schedule_fn(move || this.drain());
    let queue = self.queue.lock();
    if queue.generation == generation {
      self.drain.set(handle);
    }
  }

  fn drain(&self) {
    loop {
      let signal = {
        let mut queue = self.queue.lock();
        match queue.signals.pop_front() {
          Some(signal) => signal,
          None => {
            queue.draining = false;
            return;
          }
        }
      };
      match signal {
        Signal::Next(value) => self.downstream.next(value),
        Signal::Error(err) => Subscriber::error(&self.downstream, err),
        Signal::Complete => Subscriber::complete(&self.downstream),
      }
    }
  }
}

struct ObserveOnObserver<Item, Err, SD> {
  state: Arc<ObserveOnState<Item, Err, SD>>,
}

impl<Item, Err, SD> Observer<Item, Err> for ObserveOnObserver<Item, Err, SD>
where
  SD: Scheduler + 'static,
  Item: Send + 'static,
  Err: Send + 'static,
{
  fn next(&mut self, value: Item) { self.state.push(Signal::Next(value)); }

  fn error(self, err: Err) { self.state.push(Signal::Error(err)); }

  fn complete(self) { self.state.push(Signal::Complete); }

  fn is_closed(&self) -> bool { self.state.downstream.is_closed() }
}
