//! Drift-corrected countdown clock.
//!
//! The clock never accumulates per-tick deltas. It records an absolute
//! deadline on the scheduler's clock and every progress report recomputes
//! `deadline - now`, so late or coalesced timer callbacks cannot drift the
//! countdown away from wall time. Completion is owned by a separate
//! one-shot timer armed for the exact deadline, not by the periodic tick
//! noticing zero.
//!
//! ## State Transitions
//!
//! ```text
//! stopped -> start() -> running -> pause() -> stopped
//!                       running -> (deadline) -> stopped, on_done fired once
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let clock = Clock::new(sched, |ms| println!("{ms}"), || println!("done"));
//! clock.start(25 * 60 * 1000);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use crate::scheduler::{Scheduler, TimerId};

/// Cadence of progress reports while running.
pub const TICK_INTERVAL_MS: u64 = 100;

struct ClockState {
    running: bool,
    /// Absolute completion instant on the scheduler clock. Meaningless
    /// while stopped.
    deadline_ms: u64,
    /// Last known remaining time; authoritative only while stopped.
    remaining_ms: u64,
    tick_timer: Option<TimerId>,
    done_timer: Option<TimerId>,
}

struct ClockShared {
    scheduler: Rc<dyn Scheduler>,
    on_tick: Box<dyn Fn(u64)>,
    on_done: Box<dyn Fn()>,
    state: RefCell<ClockState>,
}

/// Countdown clock. One per session machine; all timer bookkeeping is
/// internal and fully cancelled on pause/reset/restart.
pub struct Clock {
    shared: Rc<ClockShared>,
}

impl Clock {
    pub fn new(
        scheduler: Rc<dyn Scheduler>,
        on_tick: impl Fn(u64) + 'static,
        on_done: impl Fn() + 'static,
    ) -> Self {
        Self {
            shared: Rc::new(ClockShared {
                scheduler,
                on_tick: Box::new(on_tick),
                on_done: Box::new(on_done),
                state: RefCell::new(ClockState {
                    running: false,
                    deadline_ms: 0,
                    remaining_ms: 0,
                    tick_timer: None,
                    done_timer: None,
                }),
            }),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_running(&self) -> bool {
        self.shared.state.borrow().running
    }

    /// Point-in-time remaining. Computed live from the deadline while
    /// running, so it is accurate between ticks.
    pub fn remaining_ms(&self) -> u64 {
        let st = self.shared.state.borrow();
        if st.running {
            st.deadline_ms
                .saturating_sub(self.shared.scheduler.now_ms())
        } else {
            st.remaining_ms
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a fresh countdown. Any previous run's timers are cancelled.
    /// Emits an immediate tick with the full duration.
    pub fn start(&self, duration_ms: u64) {
        let shared = &self.shared;
        {
            let mut st = shared.state.borrow_mut();
            Self::disarm(shared, &mut st);
            st.running = true;
            st.remaining_ms = duration_ms;
            st.deadline_ms = shared.scheduler.now_ms() + duration_ms;
        }
        (shared.on_tick)(duration_ms);
        Self::arm(shared);
    }

    /// Stop and return the remaining time measured at this instant.
    /// No-op (returning the stored remaining) when already stopped.
    pub fn pause(&self) -> u64 {
        let shared = &self.shared;
        let mut st = shared.state.borrow_mut();
        if !st.running {
            return st.remaining_ms;
        }
        let remaining = st
            .deadline_ms
            .saturating_sub(shared.scheduler.now_ms());
        st.remaining_ms = remaining;
        st.running = false;
        Self::disarm(shared, &mut st);
        remaining
    }

    /// Continue from the stored remaining time against a fresh deadline.
    /// No-op when already running or when nothing remains.
    pub fn resume(&self) {
        let shared = &self.shared;
        let remaining = {
            let mut st = shared.state.borrow_mut();
            if st.running || st.remaining_ms == 0 {
                return;
            }
            st.deadline_ms = shared.scheduler.now_ms() + st.remaining_ms;
            st.running = true;
            st.remaining_ms
        };
        (shared.on_tick)(remaining);
        Self::arm(shared);
    }

    /// Stop and load a new duration without starting. Emits a tick so the
    /// display shows the new value.
    pub fn reset(&self, duration_ms: u64) {
        self.pause();
        self.shared.state.borrow_mut().remaining_ms = duration_ms;
        (self.shared.on_tick)(duration_ms);
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Schedule the one-shot completion timer and the first periodic
    /// tick. Completion is scheduled first so that when both come due at
    /// the same instant, completion wins and the tick is cancelled.
    fn arm(shared: &Rc<ClockShared>) {
        let delta = {
            let st = shared.state.borrow();
            st.deadline_ms.saturating_sub(shared.scheduler.now_ms())
        };
        let weak = Rc::downgrade(shared);
        let done_id = shared.scheduler.schedule(
            delta,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    Self::complete(&shared);
                }
            }),
        );
        shared.state.borrow_mut().done_timer = Some(done_id);
        Self::schedule_tick(shared);
    }

    fn disarm(shared: &ClockShared, st: &mut ClockState) {
        if let Some(id) = st.tick_timer.take() {
            shared.scheduler.cancel(id);
        }
        if let Some(id) = st.done_timer.take() {
            shared.scheduler.cancel(id);
        }
    }

    fn schedule_tick(shared: &Rc<ClockShared>) {
        let weak = Rc::downgrade(shared);
        let id = shared.scheduler.schedule(
            TICK_INTERVAL_MS,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    Self::on_periodic_tick(&shared);
                }
            }),
        );
        shared.state.borrow_mut().tick_timer = Some(id);
    }

    fn on_periodic_tick(shared: &Rc<ClockShared>) {
        let remaining = {
            let mut st = shared.state.borrow_mut();
            st.tick_timer = None;
            if !st.running {
                return;
            }
            let remaining = st
                .deadline_ms
                .saturating_sub(shared.scheduler.now_ms());
            st.remaining_ms = remaining;
            remaining
        };
        if remaining == 0 {
            // The completion timer is due at this same instant and owns
            // the final zero tick.
            return;
        }
        // Chain the next tick before reporting, so a handler that pauses
        // or restarts sees the live timer and can cancel it.
        Self::schedule_tick(shared);
        (shared.on_tick)(remaining);
    }

    fn complete(shared: &Rc<ClockShared>) {
        {
            let mut st = shared.state.borrow_mut();
            st.done_timer = None;
            if !st.running {
                return;
            }
            st.running = false;
            st.remaining_ms = 0;
            if let Some(id) = st.tick_timer.take() {
                shared.scheduler.cancel(id);
            }
        }
        (shared.on_tick)(0);
        (shared.on_done)();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::VirtualScheduler;

    struct Recorded {
        ticks: RefCell<Vec<u64>>,
        done: RefCell<u32>,
    }

    fn recording_clock(sched: Rc<VirtualScheduler>) -> (Clock, Rc<Recorded>) {
        let rec = Rc::new(Recorded {
            ticks: RefCell::new(Vec::new()),
            done: RefCell::new(0),
        });
        let r1 = rec.clone();
        let r2 = rec.clone();
        let clock = Clock::new(
            sched,
            move |ms| r1.ticks.borrow_mut().push(ms),
            move || *r2.done.borrow_mut() += 1,
        );
        (clock, rec)
    }

    #[test]
    fn start_emits_immediate_tick_then_counts_down() {
        let sched = Rc::new(VirtualScheduler::new());
        let (clock, rec) = recording_clock(sched.clone());

        clock.start(1000);
        assert_eq!(*rec.ticks.borrow(), vec![1000]);

        sched.advance(350);
        assert_eq!(*rec.ticks.borrow(), vec![1000, 900, 800, 700]);
        assert!(clock.is_running());
    }

    #[test]
    fn completion_fires_once_with_single_zero_tick() {
        let sched = Rc::new(VirtualScheduler::new());
        let (clock, rec) = recording_clock(sched.clone());

        clock.start(300);
        sched.advance(10_000);

        assert_eq!(*rec.ticks.borrow(), vec![300, 200, 100, 0]);
        assert_eq!(*rec.done.borrow(), 1);
        assert!(!clock.is_running());
        assert_eq!(clock.remaining_ms(), 0);
        // Nothing left armed.
        assert_eq!(sched.pending(), 0);

        sched.advance(10_000);
        assert_eq!(*rec.done.borrow(), 1);
        assert_eq!(rec.ticks.borrow().len(), 4);
    }

    #[test]
    fn remaining_tracks_deadline_between_ticks() {
        let sched = Rc::new(VirtualScheduler::new());
        let (clock, rec) = recording_clock(sched.clone());

        clock.start(1000);
        sched.advance(250);
        // Last periodic report was at 200 ms, but the live query reads
        // the deadline.
        assert_eq!(*rec.ticks.borrow().last().unwrap(), 800);
        assert_eq!(clock.remaining_ms(), 750);
    }

    #[test]
    fn pause_returns_live_remaining_and_silences_ticks() {
        let sched = Rc::new(VirtualScheduler::new());
        let (clock, rec) = recording_clock(sched.clone());

        clock.start(1000);
        sched.advance(250);
        assert_eq!(clock.pause(), 750);

        let before = rec.ticks.borrow().len();
        sched.advance(5000);
        assert_eq!(rec.ticks.borrow().len(), before);
        assert_eq!(clock.remaining_ms(), 750);
        assert_eq!(*rec.done.borrow(), 0);
        assert_eq!(sched.pending(), 0);
    }

    #[test]
    fn pause_resume_preserves_remaining() {
        let sched = Rc::new(VirtualScheduler::new());
        let (clock, _rec) = recording_clock(sched.clone());

        clock.start(60_000);
        sched.advance(12_300);
        let at_pause = clock.pause();
        assert_eq!(at_pause, 47_700);

        sched.advance(99_999); // Paused time does not count.
        clock.resume();
        assert_eq!(clock.remaining_ms(), 47_700);

        sched.advance(47_700);
        assert_eq!(clock.remaining_ms(), 0);
    }

    #[test]
    fn resume_after_completion_is_noop() {
        let sched = Rc::new(VirtualScheduler::new());
        let (clock, rec) = recording_clock(sched.clone());

        clock.start(100);
        sched.advance(100);
        assert_eq!(*rec.done.borrow(), 1);

        clock.resume();
        assert!(!clock.is_running());
        assert_eq!(sched.pending(), 0);

        sched.advance(10_000);
        assert_eq!(*rec.done.borrow(), 1);
    }

    #[test]
    fn resume_while_running_is_noop() {
        let sched = Rc::new(VirtualScheduler::new());
        let (clock, rec) = recording_clock(sched.clone());

        clock.start(1000);
        sched.advance(100);
        let ticks_before = rec.ticks.borrow().len();
        clock.resume();
        // No extra immediate tick, no duplicated timers.
        assert_eq!(rec.ticks.borrow().len(), ticks_before);
        assert_eq!(sched.pending(), 2);
    }

    #[test]
    fn reset_stops_and_reports_new_duration() {
        let sched = Rc::new(VirtualScheduler::new());
        let (clock, rec) = recording_clock(sched.clone());

        clock.start(1000);
        sched.advance(300);
        clock.reset(2000);

        assert!(!clock.is_running());
        assert_eq!(clock.remaining_ms(), 2000);
        assert_eq!(*rec.ticks.borrow().last().unwrap(), 2000);
        assert_eq!(sched.pending(), 0);

        sched.advance(10_000);
        assert_eq!(*rec.done.borrow(), 0);
    }

    #[test]
    fn restart_discards_previous_run() {
        let sched = Rc::new(VirtualScheduler::new());
        let (clock, rec) = recording_clock(sched.clone());

        clock.start(500);
        sched.advance(200);
        clock.start(900);
        sched.advance(900);

        // Only the second run completes.
        assert_eq!(*rec.done.borrow(), 1);
        assert_eq!(clock.remaining_ms(), 0);
        assert_eq!(sched.pending(), 0);
    }

    #[test]
    fn uneven_advances_do_not_drift_the_countdown() {
        let sched = Rc::new(VirtualScheduler::new());
        let (clock, _rec) = recording_clock(sched.clone());

        clock.start(10_000);
        // 1 + 99 + 250 + 650 + 9000 = 10_000, in ragged steps.
        for step in [1u64, 99, 250, 650, 9000] {
            sched.advance(step);
        }
        assert_eq!(clock.remaining_ms(), 0);
        assert!(!clock.is_running());
    }
}
