//! Collaborator seams.
//!
//! The session machine never renders, plays sound, or touches disk on its
//! own; it talks to these traits. Null implementations exist for hosts
//! that want only a subset (and for tests that record calls instead).

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::nudges::NudgeCategory;
use crate::session::Mode;

/// Per-day completion counters handed to the store after every work
/// completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DayProgress {
    pub done: u32,
    pub streak: u32,
}

/// Presentation surface. All methods are notifications; the machine never
/// reads anything back.
pub trait Presenter {
    /// Countdown progress, at the clock's tick cadence plus one
    /// immediate tick on every start/resume/reset.
    fn tick(&self, remaining_ms: u64);

    fn mode_changed(&self, mode: Mode);

    fn show_nudge(&self, text: &str, category: NudgeCategory);

    /// Raised when done-today first reaches the target, lowered if the
    /// count later drops back below it.
    fn day_complete(&self, reached: bool);
}

/// Discrete audio/notification cues. The host decides what, if anything,
/// each one sounds like.
pub trait Chime {
    fn session_start(&self);
    fn work_complete(&self);
    fn break_complete(&self);
}

/// Persistence for per-day progress, keyed by local `YYYY-MM-DD`.
/// Implementations default missing days to zeros.
pub trait ProgressStore {
    fn load(&self, day: &str) -> DayProgress;
    fn save(&self, day: &str, progress: &DayProgress) -> Result<(), StoreError>;
}

/// Presenter that discards everything.
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn tick(&self, _remaining_ms: u64) {}
    fn mode_changed(&self, _mode: Mode) {}
    fn show_nudge(&self, _text: &str, _category: NudgeCategory) {}
    fn day_complete(&self, _reached: bool) {}
}

/// Chime that stays silent.
pub struct NullChime;

impl Chime for NullChime {
    fn session_start(&self) {}
    fn work_complete(&self) {}
    fn break_complete(&self) {}
}
