//! Static nudge text, grouped by trigger.

use serde::{Deserialize, Serialize};

/// Trigger point a nudge is drawn for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NudgeCategory {
    /// A break just began.
    BreakStart,
    /// Resuming after a long pause.
    Resume,
    /// A streak milestone was hit.
    Streak,
    /// The randomized mid-session wellness prompt.
    Random,
}

impl NudgeCategory {
    pub const ALL: [NudgeCategory; 4] = [
        NudgeCategory::BreakStart,
        NudgeCategory::Resume,
        NudgeCategory::Streak,
        NudgeCategory::Random,
    ];
}

/// Shown once when the daily target is first reached. Not part of a
/// rotating pool.
pub const DAY_GOAL_MESSAGE: &str = "That's a wrap for today -- enjoy your evening.";

/// The rotating message pool for `category`.
pub fn pool(category: NudgeCategory) -> &'static [&'static str] {
    match category {
        NudgeCategory::BreakStart => BREAK_START,
        NudgeCategory::Resume => RESUME,
        NudgeCategory::Streak => STREAK,
        NudgeCategory::Random => RANDOM,
    }
}

const BREAK_START: &[&str] = &[
    "Stretch your arms like you've just woken up.",
    "Sip something warm (or cold) and relax.",
    "Close your eyes... just for a few breaths.",
    "Let your shoulders drop -- they've been working too.",
    "Look outside, notice something you haven't before.",
    "Move your neck gently side to side.",
    "Wiggle your toes and wake up your feet.",
    "Step away from the screen for a mini-adventure.",
    "Take a slow inhale, exhale even slower.",
    "Pour yourself a little kindness -- you deserve it.",
];

const RESUME: &[&str] = &[
    "Let's pick up where we left off -- steady and calm.",
    "We were in a nice rhythm... shall we get back to it?",
    "Your tea's still warm -- let's keep going.",
    "No rush -- just one small step forward now.",
    "The day's still here for you -- ready?",
    "Let's ease back into it, nice and light.",
    "Where were we? Oh yes -- moving ahead.",
    "A little progress is still progress.",
    "We can make this next bit cozy.",
    "Your corner of the world is waiting.",
];

const STREAK: &[&str] = &[
    "That's two in a row -- you're on a gentle roll.",
    "Look at that streak -- quiet focus is magic.",
    "Another chapter in your day, done beautifully.",
    "The view from here is looking good.",
    "Small steps, steady pace -- this works.",
    "That's momentum you can feel.",
    "Like a cup refilling -- you're recharging too.",
    "Your focus muscles are getting stronger.",
    "That's a lovely little streak you've got there.",
    "Your tea break will taste even better now.",
];

const RANDOM: &[&str] = &[
    "Loosen your hands and shake them out.",
    "Adjust your chair and find comfort again.",
    "Take a micro-walk -- even five steps count.",
    "Hum a tune you like.",
    "Smile at something nearby.",
    "Rest your eyes -- they've earned it.",
    "Take three breaths you can actually notice.",
    "Imagine your favorite place for a moment.",
    "Tap your fingers to a rhythm you enjoy.",
    "Stretch your legs and feel the floor beneath you.",
];
