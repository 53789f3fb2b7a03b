use crate::demo::{run_demo, run_valuation, DemoArgs, ValuateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use valuation_funnel::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Valuation Funnel",
    about = "Serve the 3PL valuation funnel or score answers from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score a set of survey answers and print the valuation
    Valuate(ValuateArgs),
    /// Walk an evaluation through abandonment recovery and completion
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Valuate(args) => run_valuation(args),
        Command::Demo(args) => run_demo(args).await,
    }
}
