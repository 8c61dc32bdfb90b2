use crate::demo::{run_demo, run_revenue_report, DemoArgs, RevenueReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use dogslife::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "DogsLife",
    about = "Run and demonstrate the DogsLife prepaid balance service from the command line",
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
    /// Print a revenue report over the seeded demo data
    Report(RevenueReportArgs),
    /// Run an end-to-end CLI demo covering booking and level progression
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
        Command::Report(args) => run_revenue_report(args),
        Command::Demo(args) => run_demo(args),
    }
}
