//! Worker threads load tiles and announce progress on the message bus; the
//! main loop pumps the main-thread scheduler and reacts to the announcements.
//!
//! ```sh
//! cargo run --example tile_stream
//! ```

use std::{
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  },
  thread,
  time::Duration,
};

use rxmain::prelude::*;

#[derive(Clone, Debug)]
struct TileLoadStart {
  quadkey: String,
}

#[derive(Clone, Debug)]
struct TileLoadFinish {
  quadkey: String,
  bytes: usize,
}

const QUADKEYS: [&str; 6] = ["0", "1", "2", "3", "30", "31"];

fn load_tile(quadkey: &str) -> usize {
  // "31" has no data on disk
  assert!(quadkey != "31", "tile {quadkey} is missing");
  thread::sleep(Duration::from_millis(20 * quadkey.len() as u64));
  256 * 256 * quadkey.len()
}

fn main() -> Result<(), Error> {
  tracing_subscriber::fmt()
    .with_max_level(tracing::Level::DEBUG)
    .with_thread_names(true)
    .init();

  let runtime = Runtime::builder()
    .pool_size(3)
    .name_prefix("tile-loader-")
    .error_hook(|e| tracing::error!(origin = %e.origin, "{}", e.message))
    .build()?;

  let session = CompositeDisposable::new();
  let finished = Arc::new(AtomicUsize::new(0));

  session.add(
    runtime
      .bus()
      .subscribe::<TileLoadStart>()
      .observe_on_main_thread(runtime.main_thread())
      .subscribe(|msg| tracing::info!(quadkey = %msg.quadkey, "loading")),
  );
  let c_finished = finished.clone();
  session.add(
    runtime
      .bus()
      .subscribe::<TileLoadFinish>()
      .observe_on_main_thread(runtime.main_thread())
      .subscribe(move |msg| {
        c_finished.fetch_add(1, Ordering::SeqCst);
        tracing::info!(quadkey = %msg.quadkey, bytes = msg.bytes, "loaded");
      }),
  );

  let attempts = Arc::new(AtomicUsize::new(0));
  for quadkey in QUADKEYS {
    let bus = runtime.bus().clone();
    let attempts = attempts.clone();
    runtime.thread_pool().schedule_fn(move || {
      attempts.fetch_add(1, Ordering::SeqCst);
      bus.publish(TileLoadStart { quadkey: quadkey.to_string() });
      let bytes = load_tile(quadkey);
      bus.publish(TileLoadFinish { quadkey: quadkey.to_string(), bytes });
    });
  }

  // one tile is cancelled before any worker reaches it
  let cancelled = runtime
    .thread_pool()
    .schedule_fn(|| tracing::warn!("cancelled tile load ran"));
  cancelled.dispose();

  let expected = QUADKEYS.len() - 1;
  let mut frames = 0;
  while finished.load(Ordering::SeqCst) < expected && frames < 200 {
    let ran = runtime.pump();
    if ran > 0 {
      tracing::debug!(frame = frames, ran, "frame");
    }
    frames += 1;
    thread::sleep(Duration::from_millis(16));
  }

  tracing::info!(
    attempts = attempts.load(Ordering::SeqCst),
    finished = finished.load(Ordering::SeqCst),
    frames,
    "all tiles settled"
  );
  session.dispose();
  runtime.shutdown();
  Ok(())
}
