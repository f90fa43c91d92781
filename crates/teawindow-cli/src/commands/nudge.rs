use std::rc::Rc;

use clap::{Args, ValueEnum};
use teawindow_core::{
    NudgeCategory, NudgeConfig, NudgeScheduler, Scheduler, VirtualScheduler,
};

#[derive(Clone, Copy, ValueEnum)]
pub enum Category {
    BreakStart,
    Resume,
    Streak,
    Random,
}

impl From<Category> for NudgeCategory {
    fn from(value: Category) -> Self {
        match value {
            Category::BreakStart => NudgeCategory::BreakStart,
            Category::Resume => NudgeCategory::Resume,
            Category::Streak => NudgeCategory::Streak,
            Category::Random => NudgeCategory::Random,
        }
    }
}

#[derive(Args)]
pub struct NudgeArgs {
    /// Which pool to draw from
    #[arg(long, value_enum, default_value = "break-start")]
    category: Category,
    /// RNG seed, for a reproducible preview
    #[arg(long)]
    seed: Option<u64>,
    /// How many messages to draw
    #[arg(long, default_value = "5")]
    count: u32,
}

pub fn run(args: NudgeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let sched: Rc<dyn Scheduler> = Rc::new(VirtualScheduler::new());
    let nudges = match args.seed {
        Some(seed) => NudgeScheduler::with_seed(sched, NudgeConfig::default(), seed),
        None => NudgeScheduler::new(sched, NudgeConfig::default()),
    };

    let category = NudgeCategory::from(args.category);
    for _ in 0..args.count {
        if let Some(text) = nudges.pick(category) {
            println!("{text}");
        }
    }
    Ok(())
}
