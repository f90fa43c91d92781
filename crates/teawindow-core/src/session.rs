//! The session state machine.
//!
//! Five modes, one clock, one nudge scheduler. Transitions happen only in
//! response to explicit commands or clock completion; a command that
//! makes no sense in the current mode is a silent no-op. Counter
//! mutations always finish before the next transition is invoked, so the
//! auto-advance chain (work done, break starts, break done, next work
//! starts) can re-enter the machine from inside its own completion
//! callback without corrupting anything.
//!
//! ```text
//! IDLE -> WORK_RUNNING -> WORK_PAUSED
//!              |  ^            |
//!       (done) v  +--resume----+
//!         BREAK_RUNNING -> BREAK_PAUSED
//!              | (done)
//!              v
//!   WORK_RUNNING or IDLE, per auto_start_next_work
//! ```

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::nudges::{NudgeCategory, NudgeScheduler, DAY_GOAL_MESSAGE};
use crate::scheduler::{Scheduler, TimerId};
use crate::storage::Settings;
use crate::traits::{Chime, DayProgress, Presenter, ProgressStore};

/// Machine mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    Idle,
    WorkRunning,
    WorkPaused,
    BreakRunning,
    BreakPaused,
}

impl Mode {
    pub fn is_break(self) -> bool {
        matches!(self, Mode::BreakRunning | Mode::BreakPaused)
    }

    pub fn is_running(self) -> bool {
        matches!(self, Mode::WorkRunning | Mode::BreakRunning)
    }
}

/// Point-in-time snapshot of the machine, for status rendering.
#[derive(Debug, Clone, Serialize)]
pub struct SessionState {
    pub mode: Mode,
    pub work_duration_ms: u64,
    pub break_duration_ms: u64,
    pub remaining_ms: u64,
    pub done_today: u32,
    pub target_today: u32,
    pub streak_count: u32,
    pub auto_start_break: bool,
    pub auto_start_next_work: bool,
}

struct MachineState {
    mode: Mode,
    work_duration_ms: u64,
    break_duration_ms: u64,
    remaining_ms: u64,
    done_today: u32,
    target_today: u32,
    streak_count: u32,
    auto_start_break: bool,
    auto_start_next_work: bool,
    /// Scheduler instant the current pause began, for the resume nudge.
    pause_started_at_ms: u64,
    /// Whether the day-goal signal has fired for the current crossing.
    day_goal_latched: bool,
}

struct SessionCore {
    scheduler: Rc<dyn Scheduler>,
    clock: Clock,
    nudges: NudgeScheduler,
    presenter: Rc<dyn Presenter>,
    chime: Rc<dyn Chime>,
    store: Rc<dyn ProgressStore>,
    day_key: String,
    wellness_prompts: bool,
    /// Delayed break-start nudge, live between a completion/skip and its
    /// delivery.
    pending_break_nudge: Cell<Option<TimerId>>,
    state: RefCell<MachineState>,
}

/// The session machine. One per process; owns its clock and nudge
/// history outright.
pub struct Session {
    core: Rc<SessionCore>,
}

impl Session {
    /// Build the machine from validated settings and the stored progress
    /// for `day_key`. Nothing starts running until [`Session::start`].
    pub fn new(
        scheduler: Rc<dyn Scheduler>,
        settings: &Settings,
        nudges: NudgeScheduler,
        presenter: Rc<dyn Presenter>,
        chime: Rc<dyn Chime>,
        store: Rc<dyn ProgressStore>,
        day_key: String,
    ) -> Self {
        let progress = store.load(&day_key);
        let work_duration_ms = u64::from(settings.work_minutes) * 60 * 1000;
        let break_duration_ms = u64::from(settings.break_minutes) * 60 * 1000;

        let core = Rc::new_cyclic(|weak: &Weak<SessionCore>| {
            let tick_target = weak.clone();
            let done_target = weak.clone();
            let clock = Clock::new(
                scheduler.clone(),
                move |remaining| {
                    if let Some(core) = tick_target.upgrade() {
                        core.on_tick(remaining);
                    }
                },
                move || {
                    if let Some(core) = done_target.upgrade() {
                        SessionCore::on_clock_done(&core);
                    }
                },
            );
            SessionCore {
                scheduler,
                clock,
                nudges,
                presenter,
                chime,
                store,
                day_key,
                wellness_prompts: settings.wellness_prompts,
                pending_break_nudge: Cell::new(None),
                state: RefCell::new(MachineState {
                    mode: Mode::Idle,
                    work_duration_ms,
                    break_duration_ms,
                    remaining_ms: work_duration_ms,
                    done_today: progress.done,
                    target_today: settings.target_today,
                    streak_count: progress.streak,
                    auto_start_break: settings.auto_start_break,
                    auto_start_next_work: settings.auto_start_next_work,
                    pause_started_at_ms: 0,
                    day_goal_latched: false,
                }),
            }
        });
        // A restored count may already meet the target.
        core.check_day_goal();
        Session { core }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a work session. Defined only in IDLE.
    pub fn start(&self) {
        if self.core.state.borrow().mode != Mode::Idle {
            return;
        }
        SessionCore::start_work(&self.core);
    }

    /// Pause the running interval. Defined in the two running modes.
    pub fn pause(&self) {
        let core = &self.core;
        let next = match core.state.borrow().mode {
            Mode::WorkRunning => Mode::WorkPaused,
            Mode::BreakRunning => Mode::BreakPaused,
            _ => return,
        };
        let remaining = core.clock.pause();
        {
            let mut st = core.state.borrow_mut();
            st.remaining_ms = remaining;
            st.mode = next;
            st.pause_started_at_ms = core.scheduler.now_ms();
        }
        core.presenter.mode_changed(next);
    }

    /// Resume a paused interval. A pause that lasted long enough earns a
    /// gentle nudge on the way back in.
    pub fn resume(&self) {
        let core = &self.core;
        let (next, paused_minutes) = {
            let st = core.state.borrow();
            let next = match st.mode {
                Mode::WorkPaused => Mode::WorkRunning,
                Mode::BreakPaused => Mode::BreakRunning,
                _ => return,
            };
            let paused_ms = core.scheduler.now_ms().saturating_sub(st.pause_started_at_ms);
            (next, paused_ms / 60_000)
        };
        if paused_minutes >= core.nudges.config().resume_threshold_min {
            core.nudges.show(NudgeCategory::Resume, &*core.presenter);
        }
        core.state.borrow_mut().mode = next;
        core.presenter.mode_changed(next);
        core.clock.resume();
    }

    /// Abandon whatever is in flight and return to IDLE with a fresh
    /// work duration loaded. Pending nudge timers are cancelled too.
    pub fn reset(&self) {
        self.core.nudges.cancel_pending_prompt();
        self.core.cancel_break_nudge();
        self.core.reset_to_idle();
    }

    /// Skip the current break. Defined only in the break modes; counters
    /// are untouched and no completion chime plays.
    pub fn skip_break(&self) {
        let core = &self.core;
        let auto_next = {
            let st = core.state.borrow();
            if !st.mode.is_break() {
                return;
            }
            st.auto_start_next_work
        };
        if auto_next {
            SessionCore::start_work(core);
        } else {
            core.reset_to_idle();
        }
    }

    /// Skip the current (or next) work session straight into a break,
    /// without crediting it. Defined outside the break modes.
    pub fn skip_session(&self) {
        let core = &self.core;
        let auto_break = {
            let st = core.state.borrow();
            if st.mode.is_break() {
                return;
            }
            st.auto_start_break
        };
        core.clock.pause();
        if auto_break {
            core.start_break();
            SessionCore::schedule_break_nudge(core, core.nudges.config().skip_nudge_delay_ms);
        } else {
            core.enter_break_paused();
            core.nudges.show(NudgeCategory::BreakStart, &*core.presenter);
        }
    }

    /// Credit the current work session as done right now and move on to
    /// the break, exactly as if the clock had run out. Defined outside
    /// the break modes.
    pub fn log_session(&self) {
        let core = &self.core;
        if core.state.borrow().mode.is_break() {
            return;
        }
        core.clock.pause();
        SessionCore::on_work_complete(core);
    }

    /// Overwrite the counters from outside (a store-level reset) and
    /// re-evaluate the day goal; this is the retraction path.
    pub fn reload_progress(&self, done: u32, streak: u32) {
        {
            let mut st = self.core.state.borrow_mut();
            st.done_today = done;
            st.streak_count = streak;
        }
        self.core.check_day_goal();
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.core.state.borrow().mode
    }

    pub fn snapshot(&self) -> SessionState {
        let st = self.core.state.borrow();
        let remaining_ms = if st.mode.is_running() {
            self.core.clock.remaining_ms()
        } else {
            st.remaining_ms
        };
        SessionState {
            mode: st.mode,
            work_duration_ms: st.work_duration_ms,
            break_duration_ms: st.break_duration_ms,
            remaining_ms,
            done_today: st.done_today,
            target_today: st.target_today,
            streak_count: st.streak_count,
            auto_start_break: st.auto_start_break,
            auto_start_next_work: st.auto_start_next_work,
        }
    }
}

impl SessionCore {
    fn on_tick(&self, remaining_ms: u64) {
        self.state.borrow_mut().remaining_ms = remaining_ms;
        self.presenter.tick(remaining_ms);
    }

    fn on_clock_done(core: &Rc<Self>) {
        // Copy the mode out; the completion handlers re-borrow.
        let mode = core.state.borrow().mode;
        match mode {
            Mode::WorkRunning => Self::on_work_complete(core),
            Mode::BreakRunning => Self::on_break_complete(core),
            _ => {}
        }
    }

    /// The natural work-completion path, shared with `log_session`.
    /// Counters first, then nudges, then the break transition, then the
    /// day-goal check; that order is what makes auto-advance re-entry
    /// safe.
    fn on_work_complete(core: &Rc<Self>) {
        core.chime.work_complete();
        let (progress, streak_hit, auto_break) = {
            let mut st = core.state.borrow_mut();
            st.done_today += 1;
            st.streak_count += 1;
            (
                DayProgress {
                    done: st.done_today,
                    streak: st.streak_count,
                },
                st.streak_count % core.nudges.config().streak_interval == 0,
                st.auto_start_break,
            )
        };
        // A failed write is absorbed; memory stays authoritative.
        let _ = core.store.save(&core.day_key, &progress);

        if streak_hit {
            core.nudges.show(NudgeCategory::Streak, &*core.presenter);
        }
        if auto_break {
            core.start_break();
            Self::schedule_break_nudge(core, core.nudges.config().break_nudge_delay_ms);
        } else {
            core.enter_break_paused();
            core.nudges.show(NudgeCategory::BreakStart, &*core.presenter);
        }
        core.check_day_goal();
    }

    fn on_break_complete(core: &Rc<Self>) {
        core.chime.break_complete();
        let auto_next = core.state.borrow().auto_start_next_work;
        if auto_next {
            Self::start_work(core);
        } else {
            core.reset_to_idle();
        }
    }

    fn start_work(core: &Rc<Self>) {
        core.chime.session_start();
        let duration = {
            let mut st = core.state.borrow_mut();
            st.mode = Mode::WorkRunning;
            st.remaining_ms = st.work_duration_ms;
            st.work_duration_ms
        };
        core.cancel_break_nudge();

        // One wellness prompt per work session; scheduling always
        // replaces whatever the previous session left pending.
        let weak = Rc::downgrade(core);
        core.nudges.schedule_random_prompt(
            core.wellness_prompts,
            Box::new(move || {
                if let Some(core) = weak.upgrade() {
                    core.nudges.show(NudgeCategory::Random, &*core.presenter);
                }
            }),
        );

        core.presenter.mode_changed(Mode::WorkRunning);
        core.clock.start(duration);
    }

    fn start_break(&self) {
        let duration = {
            let mut st = self.state.borrow_mut();
            st.mode = Mode::BreakRunning;
            st.remaining_ms = st.break_duration_ms;
            st.break_duration_ms
        };
        self.presenter.mode_changed(Mode::BreakRunning);
        self.clock.start(duration);
    }

    /// Break loaded but held; the user resumes it when ready.
    fn enter_break_paused(&self) {
        let duration = {
            let mut st = self.state.borrow_mut();
            st.mode = Mode::BreakPaused;
            st.remaining_ms = st.break_duration_ms;
            st.pause_started_at_ms = self.scheduler.now_ms();
            st.break_duration_ms
        };
        self.presenter.mode_changed(Mode::BreakPaused);
        self.clock.reset(duration);
    }

    fn reset_to_idle(&self) {
        let duration = {
            let mut st = self.state.borrow_mut();
            st.mode = Mode::Idle;
            st.remaining_ms = st.work_duration_ms;
            st.work_duration_ms
        };
        self.presenter.mode_changed(Mode::Idle);
        self.clock.reset(duration);
    }

    fn schedule_break_nudge(core: &Rc<Self>, delay_ms: u64) {
        core.cancel_break_nudge();
        let weak = Rc::downgrade(core);
        let id = core.scheduler.schedule(
            delay_ms,
            Box::new(move || {
                if let Some(core) = weak.upgrade() {
                    core.pending_break_nudge.set(None);
                    core.nudges.show(NudgeCategory::BreakStart, &*core.presenter);
                }
            }),
        );
        core.pending_break_nudge.set(Some(id));
    }

    fn cancel_break_nudge(&self) {
        if let Some(id) = self.pending_break_nudge.take() {
            self.scheduler.cancel(id);
        }
    }

    /// Latch-and-signal on the first crossing of the daily target;
    /// retract when the count drops back below it. The latch consumes
    /// the one-time nudge even when the cooldown suppresses its text --
    /// the visual signal always goes through.
    fn check_day_goal(&self) {
        let (reached, latched) = {
            let st = self.state.borrow();
            (st.done_today >= st.target_today, st.day_goal_latched)
        };
        if reached && !latched {
            self.state.borrow_mut().day_goal_latched = true;
            self.presenter.day_complete(true);
            let now = self.scheduler.now_ms();
            if self.nudges.can_show(now) {
                self.presenter
                    .show_nudge(DAY_GOAL_MESSAGE, NudgeCategory::Streak);
                self.nudges.mark_shown(now);
            }
        } else if !reached && latched {
            self.state.borrow_mut().day_goal_latched = false;
            self.presenter.day_complete(false);
        }
    }
}
