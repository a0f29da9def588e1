// Cancellable timer that holds a value back until input goes quiet
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

/// Debounced view of a changing value.
///
/// `get()` starts out equal to the first input. Every change to the input
/// cancels the pending timer and starts a new one; the value only becomes
/// visible once it has stayed put for the whole delay. Dropping the
/// debouncer cancels whatever is pending.
///
/// Scheduling spawns a Tokio task, so `set`/`set_delay` must run inside a
/// runtime.
pub struct Debouncer<T> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    timer: Mutex<Timer<T>>,
    published: watch::Sender<T>,
}

struct Timer<T> {
    latest: T,
    delay: Duration,
    /// Bumped on every reschedule; a timer only publishes if it still matches
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(initial: T, delay: Duration) -> Self {
        let (published, _rx) = watch::channel(initial.clone());
        Self {
            inner: Arc::new(Inner {
                timer: Mutex::new(Timer {
                    latest: initial,
                    delay,
                    generation: 0,
                    pending: None,
                }),
                published,
            }),
        }
    }

    /// Feed a new input value. Same value as last time is not a change.
    pub fn set(&self, value: T) {
        let mut timer = self.inner.timer.lock();
        if timer.latest == value {
            return;
        }
        timer.latest = value;
        self.reschedule(&mut timer);
    }

    /// Change the delay; a pending update restarts with the new delay from now
    pub fn set_delay(&self, delay: Duration) {
        let mut timer = self.inner.timer.lock();
        if timer.delay == delay {
            return;
        }
        timer.delay = delay;
        if timer.pending.is_some() {
            self.reschedule(&mut timer);
        }
    }

    /// Publish the latest input right now and drop the pending timer
    pub fn flush(&self) {
        let mut timer = self.inner.timer.lock();
        cancel(&mut timer);
        let value = timer.latest.clone();
        self.inner.publish(value);
    }

    /// The debounced value
    pub fn get(&self) -> T {
        self.inner.published.borrow().clone()
    }

    /// The most recent input, published or not
    pub fn latest(&self) -> T {
        self.inner.timer.lock().latest.clone()
    }

    pub fn delay(&self) -> Duration {
        self.inner.timer.lock().delay
    }

    pub fn is_pending(&self) -> bool {
        self.inner.timer.lock().pending.is_some()
    }

    /// Watch the debounced value; only published values show up here
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.inner.published.subscribe()
    }

    fn reschedule(&self, timer: &mut Timer<T>) {
        cancel(timer);

        let generation = timer.generation;
        let value = timer.latest.clone();
        // deadline is fixed now, not whenever the task first gets polled
        let deadline = Instant::now() + timer.delay;
        let inner: Weak<Inner<T>> = Arc::downgrade(&self.inner);

        timer.pending = Some(tokio::spawn(async move {
            sleep_until(deadline).await;
            if let Some(inner) = inner.upgrade() {
                inner.fire(generation, value);
            }
        }));
    }
}

impl<T> Inner<T>
where
    T: Clone + PartialEq,
{
    fn fire(&self, generation: u64, value: T) {
        let mut timer = self.timer.lock();
        if timer.generation != generation {
            debug!("Dropping superseded debounce update");
            return;
        }
        timer.pending = None;
        self.publish(value);
    }

    fn publish(&self, value: T) {
        self.published.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }
}

fn cancel<T>(timer: &mut Timer<T>) {
    timer.generation = timer.generation.wrapping_add(1);
    if let Some(pending) = timer.pending.take() {
        pending.abort();
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        cancel(&mut self.inner.timer.lock());
    }
}
