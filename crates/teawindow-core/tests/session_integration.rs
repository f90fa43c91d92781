//! End-to-end tests: the full session machine driven over virtual time
//! with recording collaborators.

use std::cell::RefCell;
use std::rc::Rc;

use teawindow_core::error::StoreError;
use teawindow_core::{
    DayProgress, Mode, NudgeCategory, NudgeConfig, NudgeScheduler, Presenter, ProgressStore,
    Scheduler, Session, Settings, VirtualScheduler,
};

const MIN: u64 = 60 * 1000;

#[derive(Default)]
struct Recorder {
    ticks: RefCell<Vec<u64>>,
    modes: RefCell<Vec<Mode>>,
    nudges: RefCell<Vec<(String, NudgeCategory)>>,
    day_signals: RefCell<Vec<bool>>,
}

impl Presenter for Recorder {
    fn tick(&self, remaining_ms: u64) {
        self.ticks.borrow_mut().push(remaining_ms);
    }
    fn mode_changed(&self, mode: Mode) {
        self.modes.borrow_mut().push(mode);
    }
    fn show_nudge(&self, text: &str, category: NudgeCategory) {
        self.nudges.borrow_mut().push((text.to_string(), category));
    }
    fn day_complete(&self, reached: bool) {
        self.day_signals.borrow_mut().push(reached);
    }
}

#[derive(Default)]
struct ChimeLog {
    starts: RefCell<u32>,
    work_done: RefCell<u32>,
    break_done: RefCell<u32>,
}

impl teawindow_core::Chime for ChimeLog {
    fn session_start(&self) {
        *self.starts.borrow_mut() += 1;
    }
    fn work_complete(&self) {
        *self.work_done.borrow_mut() += 1;
    }
    fn break_complete(&self) {
        *self.break_done.borrow_mut() += 1;
    }
}

#[derive(Default)]
struct MemoryStore {
    saved: RefCell<Vec<DayProgress>>,
}

impl ProgressStore for MemoryStore {
    fn load(&self, _day: &str) -> DayProgress {
        DayProgress::default()
    }
    fn save(&self, _day: &str, progress: &DayProgress) -> Result<(), StoreError> {
        self.saved.borrow_mut().push(*progress);
        Ok(())
    }
}

struct Rig {
    sched: Rc<VirtualScheduler>,
    session: Session,
    presenter: Rc<Recorder>,
    chime: Rc<ChimeLog>,
    store: Rc<MemoryStore>,
}

fn rig_with(settings: Settings) -> Rig {
    let sched = Rc::new(VirtualScheduler::new());
    let presenter = Rc::new(Recorder::default());
    let chime = Rc::new(ChimeLog::default());
    let store = Rc::new(MemoryStore::default());
    let nudges = NudgeScheduler::with_seed(
        sched.clone() as Rc<dyn Scheduler>,
        NudgeConfig::default(),
        7,
    );
    let session = Session::new(
        sched.clone() as Rc<dyn Scheduler>,
        &settings,
        nudges,
        presenter.clone(),
        chime.clone(),
        store.clone(),
        "2024-06-01".to_string(),
    );
    Rig {
        sched,
        session,
        presenter,
        chime,
        store,
    }
}

fn rig() -> Rig {
    rig_with(Settings::default())
}

fn nudge_categories(rig: &Rig) -> Vec<NudgeCategory> {
    rig.presenter
        .nudges
        .borrow()
        .iter()
        .map(|(_, c)| *c)
        .collect()
}

#[test]
fn full_work_session_auto_advances_into_the_break() {
    let rig = rig();

    rig.session.start();
    assert_eq!(rig.session.mode(), Mode::WorkRunning);
    assert_eq!(rig.session.snapshot().remaining_ms, 25 * MIN);

    rig.sched.advance(25 * MIN);

    let snap = rig.session.snapshot();
    assert_eq!(snap.mode, Mode::BreakRunning);
    assert_eq!(snap.remaining_ms, 5 * MIN);
    assert_eq!(snap.done_today, 1);
    assert_eq!(snap.streak_count, 1);
    assert_eq!(*rig.chime.work_done.borrow(), 1);
    assert_eq!(
        rig.store.saved.borrow().as_slice(),
        &[DayProgress { done: 1, streak: 1 }]
    );
}

#[test]
fn break_completion_auto_starts_the_next_work_session() {
    let rig = rig();

    rig.session.start();
    rig.sched.advance(25 * MIN); // work done, break starts
    rig.sched.advance(5 * MIN); // break done, next work starts

    let snap = rig.session.snapshot();
    assert_eq!(snap.mode, Mode::WorkRunning);
    assert_eq!(snap.remaining_ms, 25 * MIN);
    assert_eq!(*rig.chime.break_done.borrow(), 1);
    // Initial start plus the auto-start.
    assert_eq!(*rig.chime.starts.borrow(), 2);
}

#[test]
fn break_completion_without_auto_next_returns_to_idle() {
    let rig = rig_with(Settings {
        auto_start_next_work: false,
        ..Settings::default()
    });

    rig.session.start();
    rig.sched.advance(30 * MIN);

    let snap = rig.session.snapshot();
    assert_eq!(snap.mode, Mode::Idle);
    assert_eq!(snap.remaining_ms, 25 * MIN);
    assert_eq!(snap.done_today, 1);
}

#[test]
fn work_completion_without_auto_break_holds_the_break() {
    let rig = rig_with(Settings {
        auto_start_break: false,
        ..Settings::default()
    });

    rig.session.start();
    rig.sched.advance(25 * MIN);

    let snap = rig.session.snapshot();
    assert_eq!(snap.mode, Mode::BreakPaused);
    assert_eq!(snap.remaining_ms, 5 * MIN);
    // Break-start nudge delivered immediately, not on a delay.
    assert!(nudge_categories(&rig).contains(&NudgeCategory::BreakStart));

    // The held break does not run down on its own.
    rig.sched.advance(60 * MIN);
    assert_eq!(rig.session.mode(), Mode::BreakPaused);
    assert_eq!(rig.session.snapshot().remaining_ms, 5 * MIN);

    rig.session.resume();
    rig.sched.advance(5 * MIN);
    assert_ne!(rig.session.mode(), Mode::BreakRunning);
}

#[test]
fn break_start_nudge_arrives_on_a_delay_when_auto_starting() {
    let rig = rig();

    rig.session.start();
    rig.sched.advance(25 * MIN);
    // Completion just happened; the nudge rides a one-second delay.
    assert!(!nudge_categories(&rig).contains(&NudgeCategory::BreakStart));

    rig.sched.advance(1000);
    assert!(nudge_categories(&rig).contains(&NudgeCategory::BreakStart));
}

#[test]
fn day_goal_fires_exactly_once_and_retracts_on_reload() {
    let rig = rig_with(Settings {
        target_today: 1,
        ..Settings::default()
    });

    rig.session.start();
    rig.sched.advance(25 * MIN);
    assert_eq!(rig.presenter.day_signals.borrow().as_slice(), &[true]);

    // A second completion while already at/above target: no re-fire.
    rig.sched.advance(5 * MIN); // break done, work auto-starts
    rig.sched.advance(25 * MIN); // second work completes
    assert_eq!(rig.session.snapshot().done_today, 2);
    assert_eq!(rig.presenter.day_signals.borrow().as_slice(), &[true]);

    // External reset below target retracts the signal.
    rig.session.reload_progress(0, 0);
    assert_eq!(
        rig.presenter.day_signals.borrow().as_slice(),
        &[true, false]
    );

    // And the next crossing fires again.
    rig.session.reload_progress(1, 1);
    assert_eq!(
        rig.presenter.day_signals.borrow().as_slice(),
        &[true, false, true]
    );
}

#[test]
fn skip_session_enters_break_without_crediting() {
    let rig = rig();

    rig.session.start();
    rig.sched.advance(10 * MIN);
    rig.session.skip_session();

    let snap = rig.session.snapshot();
    assert_eq!(snap.mode, Mode::BreakRunning);
    assert_eq!(snap.remaining_ms, 5 * MIN);
    assert_eq!(snap.done_today, 0);
    assert_eq!(snap.streak_count, 0);
    assert!(rig.store.saved.borrow().is_empty());
    assert_eq!(*rig.chime.work_done.borrow(), 0);

    // Its break-start nudge uses the short skip delay.
    rig.sched.advance(200);
    assert!(nudge_categories(&rig).contains(&NudgeCategory::BreakStart));
}

#[test]
fn skip_session_is_a_noop_during_breaks() {
    let rig = rig();

    rig.session.start();
    rig.sched.advance(25 * MIN);
    assert_eq!(rig.session.mode(), Mode::BreakRunning);
    let remaining = rig.session.snapshot().remaining_ms;

    rig.session.skip_session();
    assert_eq!(rig.session.mode(), Mode::BreakRunning);
    assert_eq!(rig.session.snapshot().remaining_ms, remaining);
    assert_eq!(rig.session.snapshot().done_today, 1);
}

#[test]
fn skip_break_jumps_to_the_next_work_session() {
    let rig = rig();

    rig.session.start();
    rig.sched.advance(25 * MIN);
    assert_eq!(rig.session.mode(), Mode::BreakRunning);
    let done_before = rig.session.snapshot().done_today;

    rig.session.skip_break();
    let snap = rig.session.snapshot();
    assert_eq!(snap.mode, Mode::WorkRunning);
    assert_eq!(snap.remaining_ms, 25 * MIN);
    assert_eq!(snap.done_today, done_before);
    // Skipping is not a completion; no break chime.
    assert_eq!(*rig.chime.break_done.borrow(), 0);
}

#[test]
fn long_pause_earns_a_resume_nudge_short_pause_does_not() {
    let rig = rig();

    rig.session.start();
    rig.sched.advance(MIN);
    rig.session.pause();
    rig.sched.advance(2 * MIN); // under the 5-minute threshold
    rig.session.resume();
    assert!(!nudge_categories(&rig).contains(&NudgeCategory::Resume));

    rig.session.pause();
    rig.sched.advance(5 * MIN);
    rig.session.resume();
    assert!(nudge_categories(&rig).contains(&NudgeCategory::Resume));
}

#[test]
fn streak_nudge_fires_on_the_interval() {
    let rig = rig();

    // Two full cycles: streak hits 2, a multiple of the interval.
    rig.session.start();
    rig.sched.advance(30 * MIN);
    assert!(!nudge_categories(&rig).contains(&NudgeCategory::Streak));
    rig.sched.advance(30 * MIN);

    assert_eq!(rig.session.snapshot().streak_count, 2);
    assert!(nudge_categories(&rig).contains(&NudgeCategory::Streak));
}

#[test]
fn counters_survive_the_auto_advance_chain() {
    let rig = rig();

    rig.session.start();
    // Six uninterrupted cycles of work + break.
    for _ in 0..6 {
        rig.sched.advance(30 * MIN);
    }

    let snap = rig.session.snapshot();
    assert_eq!(snap.done_today, 6);
    assert_eq!(snap.streak_count, 6);
    assert_eq!(rig.store.saved.borrow().len(), 6);
    assert_eq!(
        rig.store.saved.borrow().last().unwrap(),
        &DayProgress { done: 6, streak: 6 }
    );
}

#[test]
fn starting_a_session_cancels_the_previous_random_prompt() {
    let rig = rig_with(Settings {
        wellness_prompts: true,
        ..Settings::default()
    });

    rig.session.start();
    rig.sched.advance(MIN);
    rig.session.reset();
    rig.session.start();
    // Run well past the prompt window across the auto-advance cycles.
    rig.sched.advance(60 * MIN);

    let randoms = nudge_categories(&rig)
        .iter()
        .filter(|c| **c == NudgeCategory::Random)
        .count();
    // Prompts rearm per work session, but never double up: at most one
    // per session started.
    assert!(randoms <= *rig.chime.starts.borrow() as usize);
}

#[test]
fn ticks_are_non_increasing_within_a_run() {
    let rig = rig();

    rig.session.start();
    rig.sched.advance(3 * MIN);
    rig.session.pause();

    let ticks = rig.presenter.ticks.borrow();
    for pair in ticks.windows(2) {
        assert!(pair[1] <= pair[0], "tick increased: {pair:?}");
    }
}

#[test]
fn mode_change_notifications_follow_the_transitions() {
    let rig = rig();

    rig.session.start();
    rig.sched.advance(25 * MIN);
    rig.session.pause();
    rig.session.resume();
    rig.sched.advance(5 * MIN);

    let modes = rig.presenter.modes.borrow();
    assert_eq!(
        modes.as_slice(),
        &[
            Mode::WorkRunning,
            Mode::BreakRunning,
            Mode::BreakPaused,
            Mode::BreakRunning,
            Mode::WorkRunning,
        ]
    );
}
