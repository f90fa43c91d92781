use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "teawindow", version, about = "Tea by the Window CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a session loop in the foreground
    Run(commands::run::RunArgs),
    /// Print settings and today's progress as JSON
    Status,
    /// Settings management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Sunrise/sunset preview
    Sun(commands::sun::SunArgs),
    /// Nudge catalog preview
    Nudge(commands::nudge::NudgeArgs),
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Status => commands::status::run(),
        Commands::Config { action } => commands::config::run(action),
        Commands::Sun(args) => commands::sun::run(args),
        Commands::Nudge(args) => commands::nudge::run(args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
