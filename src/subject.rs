//! Subject: a hot observable that multicasts to many observers.
//!
//! A [`Subject`] is both the producer side (`next`, `error`, `complete`,
//! callable from any thread) and an [`Observable`]. Signals are fanned out on
//! the calling thread; a subscriber already busy on another thread gets the
//! signal from that thread once its current callback returns. The subscriber
//! list is locked only to snapshot or edit it, never while an observer runs,
//! so observers may subscribe, dispose or emit from inside their callbacks.

use std::{
  fmt::{Debug, Formatter},
  mem,
  sync::{Arc, Weak},
};

use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::{
  disposable::{BoxedDisposable, Disposable},
  error::ErrorHook,
  observable::Observable,
  observer::BoxedObserver,
  subscriber::Subscriber,
};

enum Terminal<Err> {
  Error(Err),
  Completed,
}

struct State<Item, Err> {
  next_id: usize,
  subscribers: SmallVec<[(usize, Subscriber<Item, Err>); 2]>,
  terminal: Option<Terminal<Err>>,
}

struct Inner<Item, Err> {
  state: Mutex<State<Item, Err>>,
  hook: ErrorHook,
}

pub struct Subject<Item, Err>(Arc<Inner<Item, Err>>);

impl<Item, Err> Clone for Subject<Item, Err> {
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<Item, Err> Default for Subject<Item, Err> {
  fn default() -> Self { Self::with_hook(ErrorHook::default()) }
}

impl<Item, Err> Subject<Item, Err> {
  pub fn new() -> Self { Self::default() }

  /// A subject reporting observer failures to `hook`.
  pub fn with_hook(hook: ErrorHook) -> Self {
    Self(Arc::new(Inner {
      state: Mutex::new(State {
        next_id: 0,
        subscribers: SmallVec::new(),
        terminal: None,
      }),
      hook,
    }))
  }

  /// Number of live subscriptions.
  pub fn observer_count(&self) -> usize { self.0.state.lock().subscribers.len() }

  /// Whether the subject has already errored or completed.
  pub fn is_closed(&self) -> bool { self.0.state.lock().terminal.is_some() }

  fn snapshot(&self) -> SmallVec<[Subscriber<Item, Err>; 2]> {
    let state = self.0.state.lock();
    if state.terminal.is_some() {
      return SmallVec::new();
    }
    state.subscribers.iter().map(|(_, s)| s.clone()).collect()
  }

  fn terminate(&self, terminal: Terminal<Err>) -> Option<SmallVec<[Subscriber<Item, Err>; 2]>> {
    let mut state = self.0.state.lock();
    if state.terminal.is_some() {
      return None;
    }
    state.terminal = Some(terminal);
    Some(
      mem::take(&mut state.subscribers)
        .into_iter()
        .map(|(_, s)| s)
        .collect(),
    )
  }

  pub fn complete(&self) {
    if let Some(subscribers) = self.terminate(Terminal::Completed) {
      for s in subscribers {
        s.complete();
      }
    }
  }
}

impl<Item: Clone, Err> Subject<Item, Err> {
  /// Deliver `value` to every current subscriber.
  ///
  /// The value is cloned for all subscribers but the last, which receives the
  /// moved value.
  pub fn next(&self, value: Item) {
    let subscribers = self.snapshot();
    let mut iter = subscribers.iter().peekable();
    while let Some(s) = iter.next() {
      if iter.peek().is_some() {
        s.next(value.clone());
      } else {
        s.next(value);
        break;
      }
    }
  }
}

impl<Item, Err: Clone> Subject<Item, Err> {
  pub fn error(&self, err: Err) {
    let terminal = Terminal::Error(err.clone());
    if let Some(subscribers) = self.terminate(terminal) {
      for s in subscribers {
        s.error(err.clone());
      }
    }
  }
}

impl<Item, Err> Observable<Item, Err> for Subject<Item, Err>
where
  Item: Send + 'static,
  Err: Clone + Send + 'static,
{
  fn actual_subscribe(&self, observer: BoxedObserver<Item, Err>) -> BoxedDisposable {
    let subscriber = Subscriber::new(observer, self.0.hook.clone());
    let mut state = self.0.state.lock();
    let replay = state.terminal.as_ref().map(|terminal| match terminal {
      Terminal::Error(err) => Some(err.clone()),
      Terminal::Completed => None,
    });
    if let Some(replay) = replay {
      drop(state);
      match replay {
        Some(err) => subscriber.error(err),
        None => subscriber.complete(),
      }
      return BoxedDisposable::empty();
    }
    let id = state.next_id;
    state.next_id += 1;
    state.subscribers.push((id, subscriber.clone()));
    drop(state);
    BoxedDisposable::new(SubjectSubscription {
      subject: Arc::downgrade(&self.0),
      id,
      subscriber,
    })
  }

  fn error_hook(&self) -> ErrorHook { self.0.hook.clone() }
}

impl<Item, Err> Debug for Subject<Item, Err> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let state = self.0.state.lock();
    f.debug_struct("Subject")
      .field("observers", &state.subscribers.len())
      .field("closed", &state.terminal.is_some())
      .finish()
  }
}

/// Subscription handle for a Subject.
///
/// Disposing closes the subscriber first, so a broadcast already holding a
/// snapshot skips it, then removes it from the subject.
struct SubjectSubscription<Item, Err> {
  subject: Weak<Inner<Item, Err>>,
  id: usize,
  subscriber: Subscriber<Item, Err>,
}

impl<Item, Err> Disposable for SubjectSubscription<Item, Err>
where
  Item: Send + 'static,
  Err: Send + 'static,
{
  fn dispose(&self) {
    self.subscriber.dispose();
    self.unlist();
  }

  fn is_disposed(&self) -> bool { self.subscriber.is_closed() }
}

impl<Item, Err> SubjectSubscription<Item, Err> {
  fn unlist(&self) {
    if let Some(inner) = self.subject.upgrade() {
      let removed = {
        let mut state = inner.state.lock();
        state
          .subscribers
          .iter()
          .position(|(id, _)| *id == self.id)
          .map(|pos| state.subscribers.remove(pos))
      };
      drop(removed);
    }
  }
}
