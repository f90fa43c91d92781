//! Foreground session runner: the whole engine on a wall-clock
//! scheduler, rendered as plain terminal lines.

use std::cell::Cell;
use std::io::Write;
use std::rc::Rc;
use std::time::Duration;

use clap::Args;
use teawindow_core::{
    Chime, Mode, NudgeCategory, NudgeConfig, NudgeScheduler, Presenter, Scheduler, Session,
    Settings, Store, WallScheduler,
};

/// Poll granularity while waiting on the next timer.
const POLL_CAP_MS: u64 = 50;

#[derive(Args)]
pub struct RunArgs {
    /// Override the configured work minutes for this run
    #[arg(long)]
    work: Option<u32>,
    /// Override the configured break minutes for this run
    #[arg(long)]
    r#break: Option<u32>,
    /// Stop after this many completed work sessions
    #[arg(long)]
    sessions: Option<u32>,
}

struct TerminalPresenter {
    last_whole_sec: Cell<Option<u64>>,
}

impl TerminalPresenter {
    fn new() -> Self {
        Self {
            last_whole_sec: Cell::new(None),
        }
    }
}

fn mode_label(mode: Mode) -> &'static str {
    match mode {
        Mode::Idle => "idle",
        Mode::WorkRunning => "work",
        Mode::WorkPaused => "work (paused)",
        Mode::BreakRunning => "break",
        Mode::BreakPaused => "break (paused)",
    }
}

impl Presenter for TerminalPresenter {
    fn tick(&self, remaining_ms: u64) {
        // Render once per whole second, like a clock face.
        let sec = remaining_ms.div_ceil(1000);
        if self.last_whole_sec.get() == Some(sec) {
            return;
        }
        self.last_whole_sec.set(Some(sec));
        print!("\r  {:02}:{:02}  ", sec / 60, sec % 60);
        let _ = std::io::stdout().flush();
    }

    fn mode_changed(&self, mode: Mode) {
        self.last_whole_sec.set(None);
        println!("\n== {}", mode_label(mode));
    }

    fn show_nudge(&self, text: &str, _category: NudgeCategory) {
        println!("\n  ~ {text}");
    }

    fn day_complete(&self, reached: bool) {
        if reached {
            println!("\n  * daily target reached -- lovely work");
        }
    }
}

/// Rings the terminal bell for completions, stays quiet on starts.
struct TerminalChime;

impl Chime for TerminalChime {
    fn session_start(&self) {}
    fn work_complete(&self) {
        print!("\u{7}");
        let _ = std::io::stdout().flush();
    }
    fn break_complete(&self) {
        print!("\u{7}");
        let _ = std::io::stdout().flush();
    }
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = Settings::load_or_default();
    if let Some(work) = args.work {
        settings.work_minutes = work;
    }
    if let Some(break_min) = args.r#break {
        settings.break_minutes = break_min;
    }
    settings.validate();

    let store = Rc::new(Store::open()?);
    let day_key = teawindow_core::storage::today_key();
    let wall = Rc::new(WallScheduler::new());
    let scheduler: Rc<dyn Scheduler> = wall.clone();

    let nudges = NudgeScheduler::new(scheduler.clone(), NudgeConfig::default());
    let session = Session::new(
        scheduler,
        &settings,
        nudges,
        Rc::new(TerminalPresenter::new()),
        Rc::new(TerminalChime),
        store,
        day_key,
    );

    let started_with = session.snapshot().done_today;
    println!(
        "work {} min / break {} min, {} of {} done today",
        settings.work_minutes, settings.break_minutes, started_with, settings.target_today
    );
    session.start();

    // WallScheduler reports how long until its next timer; sleep that
    // long (capped so Ctrl-C stays responsive) and poll again.
    loop {
        wall.poll();
        if let Some(n) = args.sessions {
            if session.snapshot().done_today - started_with >= n {
                println!("\n{} session(s) done, stopping.", n);
                break;
            }
        }
        match wall.ms_until_next() {
            Some(ms) => std::thread::sleep(Duration::from_millis(ms.min(POLL_CAP_MS).max(1))),
            None => break, // idle with nothing scheduled
        }
    }

    let snap = session.snapshot();
    println!(
        "done today: {} of {} (streak {})",
        snap.done_today, snap.target_today, snap.streak_count
    );
    Ok(())
}
