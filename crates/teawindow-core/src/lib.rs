//! # Teawindow Core Library
//!
//! Core engine for Tea by the Window, a gentle work/break session timer.
//! All behavior lives here behind plain traits; the CLI binary (and any
//! other front end) is a thin shell over this crate.
//!
//! ## Architecture
//!
//! - **Scheduler**: one-shot deferred callbacks behind a trait, with a
//!   virtual-time implementation so tests replay hours deterministically
//! - **Clock**: drift-corrected countdown that recomputes remaining time
//!   from an absolute deadline on every report
//! - **Ephemeris**: closed-form sunrise/sunset with a fixed fallback,
//!   deciding the day/night ambient state
//! - **Nudges**: cooldown- and repeat-constrained contextual messages
//! - **Session**: the work/break state machine tying it all together
//! - **Storage**: TOML settings and SQLite per-day progress
//!
//! ## Key Components
//!
//! - [`Session`]: the session state machine
//! - [`Clock`]: countdown clock
//! - [`NudgeScheduler`]: message selection and the randomized prompt
//! - [`Settings`] / [`Store`]: persistence
//! - [`Scheduler`]: timing seam for hosts and tests

pub mod clock;
pub mod ephemeris;
pub mod error;
pub mod geo;
pub mod nudges;
pub mod scheduler;
pub mod session;
pub mod storage;
pub mod traits;

pub use clock::Clock;
pub use ephemeris::{Coordinates, SunTimes};
pub use error::{ConfigError, GeoError, StoreError};
pub use geo::{IpLocationProvider, LocationProvider};
pub use nudges::{NudgeCategory, NudgeConfig, NudgeScheduler};
pub use scheduler::{Scheduler, TimerId, VirtualScheduler, WallScheduler};
pub use session::{Mode, Session, SessionState};
pub use storage::{Settings, Store};
pub use traits::{Chime, DayProgress, NullChime, NullPresenter, Presenter, ProgressStore};
