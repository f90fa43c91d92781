//! Timer scheduling abstraction.
//!
//! Every deferred action in the engine goes through [`Scheduler`]: the
//! clock's periodic tick, its one-shot completion, the randomized wellness
//! prompt, and the delayed break-start nudge. An implementation owns a
//! single timer queue; callbacks are plain `FnOnce` boxes invoked with no
//! queue borrow held, so a firing callback may schedule or cancel freely.
//!
//! ## Implementations
//!
//! - [`VirtualScheduler`]: time moves only through `advance()`. Tests use
//!   it to replay hours of session activity deterministically.
//! - [`WallScheduler`]: time is `std::time::Instant`; the host loop calls
//!   `poll()` to fire whatever has come due.
//!
//! ## Usage
//!
//! ```ignore
//! let sched = Rc::new(VirtualScheduler::new());
//! let id = sched.schedule(100, Box::new(|| println!("due")));
//! sched.advance(100); // fires
//! ```

use std::cell::RefCell;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::Instant;

/// Handle to a pending timer. Cancelling an already-fired or already-
/// cancelled handle is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// One-shot timer source.
///
/// `now_ms` is milliseconds on the scheduler's own clock; it has no epoch
/// meaning and is only compared against itself.
pub trait Scheduler {
    fn now_ms(&self) -> u64;

    /// Run `callback` once, `delay_ms` from now. Returns a handle usable
    /// with [`Scheduler::cancel`].
    fn schedule(&self, delay_ms: u64, callback: Box<dyn FnOnce()>) -> TimerId;

    /// Drop a pending timer so it never fires.
    fn cancel(&self, timer: TimerId);
}

#[derive(Debug, PartialEq, Eq)]
struct QueueEntry {
    deadline_ms: u64,
    /// Insertion sequence. Breaks deadline ties so equal-deadline timers
    /// fire in scheduling order.
    seq: u64,
    id: u64,
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.deadline_ms, self.seq).cmp(&(other.deadline_ms, other.seq))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Shared queue body. Cancellation removes the callback; the heap entry
/// stays behind and is discarded when popped.
struct TimerQueue {
    next_id: u64,
    next_seq: u64,
    heap: BinaryHeap<Reverse<QueueEntry>>,
    callbacks: HashMap<u64, Box<dyn FnOnce()>>,
}

impl TimerQueue {
    fn new() -> Self {
        Self {
            next_id: 1,
            next_seq: 0,
            heap: BinaryHeap::new(),
            callbacks: HashMap::new(),
        }
    }

    fn push(&mut self, deadline_ms: u64, callback: Box<dyn FnOnce()>) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(QueueEntry {
            deadline_ms,
            seq,
            id,
        }));
        self.callbacks.insert(id, callback);
        TimerId(id)
    }

    fn remove(&mut self, timer: TimerId) {
        self.callbacks.remove(&timer.0);
    }

    /// Pop the next live entry due at or before `limit_ms`, skipping
    /// cancelled ones.
    fn pop_due(&mut self, limit_ms: u64) -> Option<(u64, Box<dyn FnOnce()>)> {
        loop {
            match self.heap.peek() {
                Some(Reverse(entry)) if entry.deadline_ms <= limit_ms => {
                    let Reverse(entry) = self.heap.pop()?;
                    if let Some(cb) = self.callbacks.remove(&entry.id) {
                        return Some((entry.deadline_ms, cb));
                    }
                    // Cancelled; keep draining.
                }
                _ => return None,
            }
        }
    }

    fn pending(&self) -> usize {
        self.callbacks.len()
    }

    fn next_deadline_ms(&self) -> Option<u64> {
        // Skip heap entries whose callback was cancelled.
        self.heap
            .iter()
            .filter(|Reverse(e)| self.callbacks.contains_key(&e.id))
            .map(|Reverse(e)| e.deadline_ms)
            .min()
    }
}

// ── Virtual time ─────────────────────────────────────────────────────

struct VirtualInner {
    now_ms: u64,
    queue: TimerQueue,
}

/// Deterministic scheduler for tests: time only moves when `advance` is
/// called. Due callbacks fire in deadline order (ties in scheduling order),
/// and the clock reads each callback's own deadline while it runs, so a
/// callback that schedules follow-up work inside the advanced window sees
/// that work fire in the same `advance`.
pub struct VirtualScheduler {
    inner: RefCell<VirtualInner>,
}

impl VirtualScheduler {
    pub fn new() -> Self {
        Self {
            inner: RefCell::new(VirtualInner {
                now_ms: 0,
                queue: TimerQueue::new(),
            }),
        }
    }

    /// Move the clock forward by `ms`, firing everything that comes due.
    pub fn advance(&self, ms: u64) {
        let target = self.inner.borrow().now_ms + ms;
        loop {
            let next = {
                let mut inner = self.inner.borrow_mut();
                match inner.queue.pop_due(target) {
                    Some((deadline, cb)) => {
                        inner.now_ms = inner.now_ms.max(deadline);
                        Some(cb)
                    }
                    None => {
                        inner.now_ms = target;
                        None
                    }
                }
            };
            match next {
                Some(cb) => cb(), // Queue borrow released first.
                None => break,
            }
        }
    }

    /// Count of timers scheduled but not yet fired or cancelled.
    pub fn pending(&self) -> usize {
        self.inner.borrow().queue.pending()
    }
}

impl Default for VirtualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for VirtualScheduler {
    fn now_ms(&self) -> u64 {
        self.inner.borrow().now_ms
    }

    fn schedule(&self, delay_ms: u64, callback: Box<dyn FnOnce()>) -> TimerId {
        let mut inner = self.inner.borrow_mut();
        let deadline = inner.now_ms + delay_ms;
        inner.queue.push(deadline, callback)
    }

    fn cancel(&self, timer: TimerId) {
        self.inner.borrow_mut().queue.remove(timer);
    }
}

// ── Wall clock ───────────────────────────────────────────────────────

struct WallInner {
    queue: TimerQueue,
}

/// Real-time scheduler. No internal thread; the host loop is responsible
/// for calling `poll()` often enough (the clock ticks at 100 ms, so a
/// 25-50 ms poll interval keeps displayed time smooth).
pub struct WallScheduler {
    epoch: Instant,
    inner: RefCell<WallInner>,
}

impl WallScheduler {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            inner: RefCell::new(WallInner {
                queue: TimerQueue::new(),
            }),
        }
    }

    /// Fire every timer due at or before now. Returns the number fired.
    pub fn poll(&self) -> usize {
        let now = self.now_ms();
        let mut fired = 0;
        loop {
            let next = {
                let mut inner = self.inner.borrow_mut();
                inner.queue.pop_due(now).map(|(_, cb)| cb)
            };
            match next {
                Some(cb) => {
                    cb();
                    fired += 1;
                }
                None => break,
            }
        }
        fired
    }

    /// Milliseconds until the next live timer, if any. Lets the host
    /// sleep instead of spinning.
    pub fn ms_until_next(&self) -> Option<u64> {
        let next = self.inner.borrow().queue.next_deadline_ms()?;
        Some(next.saturating_sub(self.now_ms()))
    }

    pub fn pending(&self) -> usize {
        self.inner.borrow().queue.pending()
    }
}

impl Default for WallScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for WallScheduler {
    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn schedule(&self, delay_ms: u64, callback: Box<dyn FnOnce()>) -> TimerId {
        let deadline = self.now_ms() + delay_ms;
        self.inner.borrow_mut().queue.push(deadline, callback)
    }

    fn cancel(&self, timer: TimerId) {
        self.inner.borrow_mut().queue.remove(timer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn fires_in_deadline_order() {
        let sched = VirtualScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let l = log.clone();
        sched.schedule(200, Box::new(move || l.borrow_mut().push("b")));
        let l = log.clone();
        sched.schedule(100, Box::new(move || l.borrow_mut().push("a")));
        let l = log.clone();
        sched.schedule(300, Box::new(move || l.borrow_mut().push("c")));

        sched.advance(250);
        assert_eq!(*log.borrow(), vec!["a", "b"]);
        sched.advance(50);
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn equal_deadlines_fire_in_scheduling_order() {
        let sched = VirtualScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for name in ["first", "second", "third"] {
            let l = log.clone();
            sched.schedule(50, Box::new(move || l.borrow_mut().push(name)));
        }
        sched.advance(50);
        assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let sched = VirtualScheduler::new();
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        let id = sched.schedule(100, Box::new(move || *h.borrow_mut() += 1));
        sched.cancel(id);
        sched.advance(1000);
        assert_eq!(*hits.borrow(), 0);
        assert_eq!(sched.pending(), 0);
    }

    #[test]
    fn cancel_after_fire_is_noop() {
        let sched = VirtualScheduler::new();
        let id = sched.schedule(10, Box::new(|| {}));
        sched.advance(10);
        sched.cancel(id);
        assert_eq!(sched.pending(), 0);
    }

    #[test]
    fn callback_may_schedule_within_same_advance() {
        let sched = Rc::new(VirtualScheduler::new());
        let log = Rc::new(RefCell::new(Vec::new()));

        let s = sched.clone();
        let l = log.clone();
        sched.schedule(
            100,
            Box::new(move || {
                l.borrow_mut().push("outer");
                let l2 = l.clone();
                s.schedule(50, Box::new(move || l2.borrow_mut().push("inner")));
            }),
        );

        sched.advance(200);
        assert_eq!(*log.borrow(), vec!["outer", "inner"]);
    }

    #[test]
    fn callback_sees_its_own_deadline_as_now() {
        let sched = Rc::new(VirtualScheduler::new());
        let seen = Rc::new(RefCell::new(0));

        let s = sched.clone();
        let v = seen.clone();
        sched.schedule(
            70,
            Box::new(move || {
                *v.borrow_mut() = s.now_ms();
            }),
        );

        sched.advance(500);
        assert_eq!(*seen.borrow(), 70);
        assert_eq!(sched.now_ms(), 500);
    }

    #[test]
    fn callback_may_cancel_a_later_timer() {
        let sched = Rc::new(VirtualScheduler::new());
        let hits = Rc::new(RefCell::new(0));

        let h = hits.clone();
        let victim = sched.schedule(200, Box::new(move || *h.borrow_mut() += 1));

        let s = sched.clone();
        sched.schedule(100, Box::new(move || s.cancel(victim)));

        sched.advance(300);
        assert_eq!(*hits.borrow(), 0);
    }

    #[test]
    fn wall_scheduler_fires_due_timers_on_poll() {
        let sched = WallScheduler::new();
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        sched.schedule(0, Box::new(move || *h.borrow_mut() += 1));
        assert_eq!(sched.poll(), 1);
        assert_eq!(*hits.borrow(), 1);
        assert_eq!(sched.pending(), 0);
    }

    #[test]
    fn wall_scheduler_reports_time_until_next() {
        let sched = WallScheduler::new();
        assert_eq!(sched.ms_until_next(), None);
        sched.schedule(10_000, Box::new(|| {}));
        let until = sched.ms_until_next().unwrap();
        assert!(until <= 10_000);
    }
}
