//! Timer-driven waiting, independent of the render loop.
//!
//! Transitions advance on render ticks; the pause between sequence steps is
//! wall-clock time. Pending sleeps park their waker in a [`TimerQueue`], and
//! whoever pumps the director fires the expired ones.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};
use std::time::Duration;

use web_time::Instant;

/// Source of "now", measured from an arbitrary origin.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Wall clock (WASM-compatible through `web-time`).
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Deadlines waiting to be fired.
pub struct TimerQueue {
    clock: Box<dyn Clock>,
    pending: Vec<(Duration, Waker)>,
}

impl TimerQueue {
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self {
            clock: Box::new(clock),
            pending: Vec::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    fn register(&mut self, deadline: Duration, waker: Waker) {
        self.pending.push((deadline, waker));
    }

    /// Wake every sleep whose deadline has passed. Returns how many fired.
    pub fn fire_due(&mut self) -> usize {
        let now = self.clock.now();
        let mut fired = 0;
        self.pending.retain(|(deadline, waker)| {
            if *deadline <= now {
                waker.wake_by_ref();
                fired += 1;
                false
            } else {
                true
            }
        });
        fired
    }

    /// Earliest pending deadline, for hosts that want to schedule a wakeup.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.iter().map(|(deadline, _)| *deadline).min()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

pub type SharedTimers = Rc<RefCell<TimerQueue>>;

/// Future that completes once `duration` has elapsed on the queue's clock.
pub struct Sleep {
    timers: SharedTimers,
    deadline: Duration,
}

/// Wait `duration` on the timer queue.
pub fn sleep(timers: &SharedTimers, duration: Duration) -> Sleep {
    let deadline = timers.borrow().now() + duration;
    Sleep {
        timers: Rc::clone(timers),
        deadline,
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let mut timers = self.timers.borrow_mut();
        if timers.now() >= self.deadline {
            Poll::Ready(())
        } else {
            timers.register(self.deadline, cx.waker().clone());
            Poll::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    fn queue() -> (ManualClock, SharedTimers) {
        let clock = ManualClock::new();
        let timers = Rc::new(RefCell::new(TimerQueue::new(clock.clone())));
        (clock, timers)
    }

    #[test]
    fn test_zero_sleep_is_ready() {
        let (_clock, timers) = queue();
        assert!(sleep(&timers, Duration::ZERO).now_or_never().is_some());
    }

    #[test]
    fn test_sleep_waits_for_clock() {
        let (clock, timers) = queue();
        let mut pending = Box::pin(sleep(&timers, Duration::from_millis(500)));

        assert!(pending.as_mut().now_or_never().is_none());
        assert_eq!(timers.borrow().pending(), 1);
        assert_eq!(timers.borrow().next_deadline(), Some(Duration::from_millis(500)));

        clock.advance(Duration::from_millis(499));
        assert_eq!(timers.borrow_mut().fire_due(), 0);

        clock.advance(Duration::from_millis(1));
        assert_eq!(timers.borrow_mut().fire_due(), 1);
        assert!(pending.as_mut().now_or_never().is_some());
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
