//! Subscriber: the thread-safe end of one subscription.
//!
//! A [`Subscriber`] owns the observer of a single subscription and is the
//! only path through which signals reach it. It guarantees:
//!
//! - signals are delivered one at a time and in the order they were accepted,
//!   even from several producer threads;
//! - nothing is delivered after `error`, `complete` or `dispose`;
//! - a delivery racing with `dispose` is a silent no-op;
//! - a panicking observer is reported to the [`ErrorHook`] and the producer
//!   carries on.
//!
//! No lock is held while the observer runs. A signal arriving while another
//! thread, or the observer's own callback, is delivering is queued and handed
//! over by the thread already delivering, so emitting never blocks on an
//! observer.

use std::{
  collections::VecDeque,
  fmt::{Debug, Formatter},
  mem,
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  },
};

use parking_lot::Mutex;

use crate::{
  disposable::Disposable,
  error::{ErrorHook, ErrorOrigin},
  observer::{BoxedObserver, Observer},
};

enum Signal<Item, Err> {
  Next(Item),
  Error(Err),
  Complete,
}

struct State<Item, Err> {
  queue: VecDeque<Signal<Item, Err>>,
  // `None` while a thread is delivering, or once the observer is gone
  observer: Option<BoxedObserver<Item, Err>>,
  delivering: bool,
  disposed: bool,
}

struct Inner<Item, Err> {
  // no more signals accepted: terminated or disposed
  closed: AtomicBool,
  state: Mutex<State<Item, Err>>,
  hook: ErrorHook,
}

pub struct Subscriber<Item, Err>(Arc<Inner<Item, Err>>);

impl<Item, Err> Clone for Subscriber<Item, Err> {
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<Item, Err> Subscriber<Item, Err> {
  pub fn new(observer: BoxedObserver<Item, Err>, hook: ErrorHook) -> Self {
    Self(Arc::new(Inner {
      closed: AtomicBool::new(false),
      state: Mutex::new(State {
        queue: VecDeque::new(),
        observer: Some(observer),
        delivering: false,
        disposed: false,
      }),
      hook,
    }))
  }

  pub fn next(&self, value: Item) {
    if !self.is_closed() {
      self.push(Signal::Next(value));
    }
  }

  pub fn error(&self, err: Err) {
    if !self.0.closed.swap(true, Ordering::AcqRel) {
      self.push(Signal::Error(err));
    }
  }

  pub fn complete(&self) {
    if !self.0.closed.swap(true, Ordering::AcqRel) {
      self.push(Signal::Complete);
    }
  }

  #[inline]
  pub fn is_closed(&self) -> bool { self.0.closed.load(Ordering::Acquire) }

  fn push(&self, signal: Signal<Item, Err>) {
    let observer = {
      let mut state = self.0.state.lock();
      if state.disposed {
        return;
      }
      state.queue.push_back(signal);
      if state.delivering {
        return;
      }
      match state.observer.take() {
        Some(observer) => {
          state.delivering = true;
          observer
        }
        None => return,
      }
    };
    self.deliver(observer);
  }

  /// Drain the queue through `observer`, owned by this thread until the
  /// queue is empty or a terminal signal consumed it.
  fn deliver(&self, mut observer: BoxedObserver<Item, Err>) {
    loop {
      let signal = {
        let mut state = self.0.state.lock();
        if state.disposed {
          state.delivering = false;
          let dropped = mem::take(&mut state.queue);
          drop(state);
          // user drop glue runs outside the lock
          drop(dropped);
          drop(observer);
          return;
        }
        match state.queue.pop_front() {
          Some(signal) => signal,
          None => {
            state.observer = Some(observer);
            state.delivering = false;
            return;
          }
        }
      };
      match signal {
        Signal::Next(value) => {
          self.0.hook.catch(ErrorOrigin::Delivery, || observer.next(value));
        }
        Signal::Error(err) => {
          self.0.hook.catch(ErrorOrigin::Delivery, || observer.error(err));
          self.finish();
          return;
        }
        Signal::Complete => {
          self.0.hook.catch(ErrorOrigin::Delivery, || observer.complete());
          self.finish();
          return;
        }
      }
    }
  }

  fn finish(&self) {
    let rest = {
      let mut state = self.0.state.lock();
      state.delivering = false;
      mem::take(&mut state.queue)
    };
    drop(rest);
  }
}

impl<Item: Send, Err: Send> Disposable for Subscriber<Item, Err> {
  fn dispose(&self) {
    self.0.closed.store(true, Ordering::Release);
    let (queue, observer) = {
      let mut state = self.0.state.lock();
      if state.disposed {
        return;
      }
      state.disposed = true;
      // a delivering thread holds the observer and drops it on its next turn
      (mem::take(&mut state.queue), state.observer.take())
    };
    drop(queue);
    drop(observer);
  }

  #[inline]
  fn is_disposed(&self) -> bool { self.is_closed() }
}

impl<Item, Err> Debug for Subscriber<Item, Err> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subscriber")
      .field("closed", &self.is_closed())
      .finish()
  }
}
