//! Time and interruption, injectable so polling can be tested without waiting

use std::cell::{Cell, RefCell};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of elapsed time and of delays
pub trait Clock {
    /// Monotonic time since the clock was created
    fn elapsed(&self) -> Duration;

    fn sleep(&self, duration: Duration);
}

/// Granularity at which [SystemClock] notices an interrupt while sleeping
const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Wall clock; sleeps return early once an interrupt is requested
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: Instant,
    interrupt: Interrupt,
}

impl SystemClock {
    pub fn new(interrupt: Interrupt) -> Self {
        SystemClock {
            start: Instant::now(),
            interrupt,
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(Interrupt::default())
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        let deadline = Instant::now() + duration;
        while !self.interrupt.is_requested() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            std::thread::sleep(SLEEP_SLICE.min(deadline - now));
        }
    }
}

/// Test clock: sleeping advances time instantly and is recorded
#[derive(Debug, Default)]
pub struct ManualClock {
    elapsed: Cell<Duration>,
    sleeps: RefCell<Vec<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, duration: Duration) {
        self.elapsed.set(self.elapsed.get() + duration);
    }

    /// Every duration passed to [Clock::sleep], in order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }
}

impl Clock for ManualClock {
    fn elapsed(&self) -> Duration {
        self.elapsed.get()
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
        self.advance(duration);
    }
}

/// Operator interrupt (Ctrl-C) shared between the signal handler and the poller
///
/// While a run is being watched an interrupt is absorbed: the poller stops
/// observing and reports. Outside that window the handler should exit.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    requested: Arc<AtomicBool>,
    watching: Arc<AtomicBool>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an interrupt; returns false when nobody is watching a run
    pub fn request(&self) -> bool {
        self.requested.store(true, Ordering::SeqCst);
        self.watching.load(Ordering::SeqCst)
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Mark the watching window; it closes when the guard drops
    pub fn watch(&self) -> WatchGuard {
        self.watching.store(true, Ordering::SeqCst);
        WatchGuard {
            watching: Arc::clone(&self.watching),
        }
    }
}

pub struct WatchGuard {
    watching: Arc<AtomicBool>,
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        self.watching.store(false, Ordering::SeqCst);
    }
}
