use crate::demo::{run_demo, run_history_report, run_questionnaire, DemoArgs, HistoryReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use mindcheck::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "MindCheck",
    about = "Run the MindCheck screening service or explore it from the command line",
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
    /// Print the screening questionnaire with option weights
    Questionnaire,
    /// Run the reference screenings end to end and show the resulting dashboards
    Demo(DemoArgs),
    /// Work with exported screening history
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryCommand {
    /// Print monthly tier buckets and totals for a CSV export
    Report(HistoryReportArgs),
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
        Command::Questionnaire => {
            run_questionnaire();
            Ok(())
        }
        Command::Demo(args) => run_demo(args),
        Command::History {
            command: HistoryCommand::Report(args),
        } => run_history_report(args),
    }
}
