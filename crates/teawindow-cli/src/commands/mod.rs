pub mod config;
pub mod nudge;
pub mod run;
pub mod status;
pub mod sun;
