use clap::{Parser, Subcommand};

mod commands;
mod console;
mod logging;

#[derive(Parser)]
#[command(name = "voxtimer", version, about = "Voice-style multi-timer CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a timer, e.g. `voxtimer start 5 minutes called pasta`
    Start(commands::timer::StartArgs),
    /// Report remaining time on one or more timers
    Status(commands::timer::QueryArgs),
    /// Cancel a timer by description
    Cancel(commands::timer::QueryArgs),
    /// Print every active timer as JSON
    List,
    /// Silence expired timers
    Stop,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Interactive session with the clock running
    Session(commands::session::SessionArgs),
}

fn main() {
    logging::init();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Start(args) => commands::timer::start(args),
        Commands::Status(args) => commands::timer::status(args),
        Commands::Cancel(args) => commands::timer::cancel(args),
        Commands::List => commands::timer::list(),
        Commands::Stop => commands::timer::stop(),
        Commands::Config { action } => commands::config::run(action),
        Commands::Session(args) => commands::session::run(args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
