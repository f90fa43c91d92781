//! Nudge selection and scheduling.
//!
//! A nudge is one line of text shown at a trigger point: a break
//! starting, resuming after a long pause, a streak milestone, or a
//! randomized mid-session wellness prompt. Selection is uniform over the
//! category's pool with two constraints: one global cooldown gate shared
//! by every category, and a per-category no-repeat window over the last
//! few picks.
//!
//! [`NudgeScheduler`] is a value owned by one session machine. Two
//! machines in one process keep fully independent histories, and tests
//! seed the RNG for reproducible picks.

pub mod catalog;

pub use catalog::{pool, NudgeCategory, DAY_GOAL_MESSAGE};

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;

use crate::scheduler::{Scheduler, TimerId};
use crate::traits::Presenter;

/// Attempts at drawing an index outside the no-repeat window before
/// giving up and accepting a repeat.
const PICK_ATTEMPTS: u32 = 25;

/// Nudge policy knobs, fixed at machine construction.
#[derive(Debug, Clone)]
pub struct NudgeConfig {
    /// Minimum quiet time between any two nudges, across categories.
    pub cooldown_ms: u64,
    /// How many recent picks per category are excluded from reselection.
    pub no_repeat_window: usize,
    /// Streak nudge fires when the streak is a multiple of this.
    pub streak_interval: u32,
    /// Resume nudge fires after a pause at least this long.
    pub resume_threshold_min: u64,
    /// Inclusive minute range for the randomized in-session prompt.
    pub random_prompt_min: u64,
    pub random_prompt_max: u64,
    /// Delay before the break-start nudge when a break auto-starts.
    pub break_nudge_delay_ms: u64,
    /// Delay before the break-start nudge after an explicit skip.
    pub skip_nudge_delay_ms: u64,
}

impl Default for NudgeConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 30_000,
            no_repeat_window: 3,
            streak_interval: 2,
            resume_threshold_min: 5,
            random_prompt_min: 8,
            random_prompt_max: 18,
            break_nudge_delay_ms: 1000,
            skip_nudge_delay_ms: 200,
        }
    }
}

/// Cooldown- and repeat-constrained message picker plus the single
/// randomized in-session prompt timer.
pub struct NudgeScheduler {
    config: NudgeConfig,
    scheduler: Rc<dyn Scheduler>,
    rng: RefCell<Mcg128Xsl64>,
    /// Last picked indices per category, newest at the back, bounded by
    /// the no-repeat window.
    history: RefCell<HashMap<NudgeCategory, VecDeque<usize>>>,
    /// One timestamp across all categories; `None` until the first show.
    last_shown_at: Cell<Option<u64>>,
    pending_prompt: Cell<Option<TimerId>>,
}

impl NudgeScheduler {
    pub fn new(scheduler: Rc<dyn Scheduler>, config: NudgeConfig) -> Self {
        Self::with_rng(scheduler, config, Mcg128Xsl64::from_entropy())
    }

    /// Deterministic picks for tests and previews.
    pub fn with_seed(scheduler: Rc<dyn Scheduler>, config: NudgeConfig, seed: u64) -> Self {
        Self::with_rng(scheduler, config, Mcg128Xsl64::seed_from_u64(seed))
    }

    fn with_rng(scheduler: Rc<dyn Scheduler>, config: NudgeConfig, rng: Mcg128Xsl64) -> Self {
        Self {
            config,
            scheduler,
            rng: RefCell::new(rng),
            history: RefCell::new(HashMap::new()),
            last_shown_at: Cell::new(None),
            pending_prompt: Cell::new(None),
        }
    }

    pub fn config(&self) -> &NudgeConfig {
        &self.config
    }

    /// Draw a message from the category's pool, avoiding the last few
    /// picks when the pool is big enough to allow it. The chosen index
    /// joins the window, evicting the oldest.
    pub fn pick(&self, category: NudgeCategory) -> Option<&'static str> {
        let set = pool(category);
        if set.is_empty() {
            return None;
        }

        let window = self.config.no_repeat_window;
        let mut history = self.history.borrow_mut();
        let recent = history.entry(category).or_default();
        let mut rng = self.rng.borrow_mut();

        let mut idx = rng.gen_range(0..set.len());
        if set.len() > window {
            for _ in 0..PICK_ATTEMPTS {
                if !recent.contains(&idx) {
                    break;
                }
                idx = rng.gen_range(0..set.len());
            }
        }

        recent.push_back(idx);
        if recent.len() > window {
            recent.pop_front();
        }
        Some(set[idx])
    }

    /// Whether the global cooldown allows a nudge at `now`.
    pub fn can_show(&self, now_ms: u64) -> bool {
        match self.last_shown_at.get() {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.config.cooldown_ms,
        }
    }

    pub fn mark_shown(&self, now_ms: u64) {
        self.last_shown_at.set(Some(now_ms));
    }

    /// Cooldown-gated pick-and-deliver. Returns whether anything was
    /// shown.
    pub fn show(&self, category: NudgeCategory, presenter: &dyn Presenter) -> bool {
        let now = self.scheduler.now_ms();
        if !self.can_show(now) {
            return false;
        }
        let Some(text) = self.pick(category) else {
            return false;
        };
        presenter.show_nudge(text, category);
        self.mark_shown(now);
        true
    }

    /// Arm the one randomized in-session prompt: a uniform minute in the
    /// configured range, one-shot. Any previously pending prompt is
    /// cancelled first, so at most one is ever live.
    pub fn schedule_random_prompt(
        &self,
        enabled: bool,
        on_fire: Box<dyn FnOnce()>,
    ) -> Option<TimerId> {
        self.cancel_pending_prompt();
        if !enabled {
            return None;
        }
        let minute = self
            .rng
            .borrow_mut()
            .gen_range(self.config.random_prompt_min..=self.config.random_prompt_max);
        let id = self.scheduler.schedule(minute * 60 * 1000, on_fire);
        self.pending_prompt.set(Some(id));
        Some(id)
    }

    pub fn cancel_pending_prompt(&self) {
        if let Some(id) = self.pending_prompt.take() {
            self.scheduler.cancel(id);
        }
    }
}
