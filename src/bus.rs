//! A process-wide publish/subscribe multiplexer keyed by message type.
//!
//! Each message type gets its own channel, a [`Subject`] stored under the
//! type's [`TypeId`]. Matching is exact: subscribing to one type never
//! receives messages of another, related or not.
//!
//! ```rust
//! use rxmain::prelude::*;
//!
//! #[derive(Clone, Debug)]
//! struct TileLoadStart { quadkey: String }
//!
//! let bus = MessageBus::new(ErrorHook::new());
//! let _subscription = bus
//!   .subscribe::<TileLoadStart>()
//!   .subscribe(|msg| println!("loading {}", msg.quadkey));
//! bus.publish(TileLoadStart { quadkey: "1202".into() });
//! ```

use std::{
  any::{Any, TypeId},
  collections::HashMap,
  convert::Infallible,
  fmt::{Debug, Formatter},
  mem,
  sync::Arc,
};

use parking_lot::RwLock;

use crate::{
  disposable::{BooleanDisposable, BoxedDisposable, Disposable},
  error::ErrorHook,
  observable::Observable,
  observer::BoxedObserver,
  subject::Subject,
};

/// A value that can travel over the bus.
pub trait Message: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> Message for T {}

/// Type-erased view of one channel.
trait Channel: Send + Sync {
  fn as_any(&self) -> &dyn Any;
  fn complete(&self);
}

impl<M: Message> Channel for Subject<M, Infallible> {
  fn as_any(&self) -> &dyn Any { self }

  fn complete(&self) { Subject::complete(self) }
}

struct Inner {
  channels: RwLock<HashMap<TypeId, Box<dyn Channel>>>,
  hook: ErrorHook,
  disposed: BooleanDisposable,
}

/// Cheap cloneable handle; clones publish to and subscribe on the same bus.
#[derive(Clone)]
pub struct MessageBus(Arc<Inner>);

impl MessageBus {
  pub fn new(hook: ErrorHook) -> Self {
    Self(Arc::new(Inner {
      channels: RwLock::new(HashMap::new()),
      hook,
      disposed: BooleanDisposable::new(),
    }))
  }

  /// Deliver `message` to every subscriber of exactly type `M`, on the
  /// calling thread.
  ///
  /// A subscriber that panics is reported to the error hook and the
  /// remaining subscribers still receive the message.
  pub fn publish<M: Message>(&self, message: M) {
    if let Some(channel) = self.find::<M>() {
      channel.next(message);
    }
  }

  /// The stream of messages of exactly type `M`.
  pub fn subscribe<M: Message>(&self) -> MessageStream<M> {
    MessageStream { channel: self.channel::<M>() }
  }

  /// Number of live subscriptions for messages of type `M`.
  pub fn subscriber_count<M: Message>(&self) -> usize {
    self
      .find::<M>()
      .map_or(0, |channel| channel.observer_count())
  }

  fn find<M: Message>(&self) -> Option<Subject<M, Infallible>> {
    self
      .0
      .channels
      .read()
      .get(&TypeId::of::<M>())
      .and_then(|channel| channel.as_any().downcast_ref::<Subject<M, Infallible>>())
      .cloned()
  }

  fn channel<M: Message>(&self) -> Subject<M, Infallible> {
    if let Some(channel) = self.find::<M>() {
      return channel;
    }
    let mut channels = self.0.channels.write();
    // checked under the lock: dispose flips the flag before draining the map
    if self.0.disposed.is_disposed() {
      let closed = Subject::with_hook(self.0.hook.clone());
      closed.complete();
      return closed;
    }
    let channel = channels
      .entry(TypeId::of::<M>())
      .or_insert_with(|| Box::new(Subject::<M, Infallible>::with_hook(self.0.hook.clone())));
    match channel.as_any().downcast_ref::<Subject<M, Infallible>>() {
      Some(subject) => subject.clone(),
      // unreachable: entries are keyed by their own TypeId
      None => Subject::with_hook(self.0.hook.clone()),
    }
  }
}

impl Disposable for MessageBus {
  /// Complete every channel and drop all subscriptions. Later publishes are
  /// ignored and later subscribers complete immediately.
  fn dispose(&self) {
    if !self.0.disposed.try_dispose() {
      return;
    }
    let channels = mem::take(&mut *self.0.channels.write());
    tracing::debug!(channels = channels.len(), "message bus disposed");
    for channel in channels.values() {
      channel.complete();
    }
  }

  fn is_disposed(&self) -> bool { self.0.disposed.is_disposed() }
}

impl Debug for MessageBus {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("MessageBus")
      .field("channels", &self.0.channels.read().len())
      .field("disposed", &self.is_disposed())
      .finish()
  }
}

/// Observable of the messages of one type, returned by
/// [`MessageBus::subscribe`].
pub struct MessageStream<M> {
  channel: Subject<M, Infallible>,
}

impl<M> Clone for MessageStream<M> {
  fn clone(&self) -> Self { Self { channel: self.channel.clone() } }
}

impl<M: Message> Observable<M, Infallible> for MessageStream<M> {
  #[inline]
  fn actual_subscribe(&self, observer: BoxedObserver<M, Infallible>) -> BoxedDisposable {
    self.channel.actual_subscribe(observer)
  }

  #[inline]
  fn error_hook(&self) -> ErrorHook { self.channel.error_hook() }
}
