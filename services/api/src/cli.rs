use crate::demo::{run_demo, run_recalculate, DemoArgs, RecalculateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use talent_rank::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Talent Rank",
    about = "Run the regional ranking service or its maintenance tasks from the command line",
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
    /// Operator maintenance for scores and ranks
    Rankings {
        #[command(subcommand)]
        command: RankingsCommand,
    },
    /// Walk through scoring and regional ranking on a seeded population
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum RankingsCommand {
    /// Import a profile export, run a full sweep and print the resulting rankings
    Recalculate(RecalculateArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Seed the in-memory profile store from a CSV export
    #[arg(long)]
    pub(crate) profiles_csv: Option<PathBuf>,
    /// Run a full ranking sweep before accepting requests
    #[arg(long)]
    pub(crate) sweep_on_start: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Rankings {
            command: RankingsCommand::Recalculate(args),
        } => run_recalculate(args),
        Command::Demo(args) => run_demo(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_serve_without_subcommand() {
        let cli = Cli::try_parse_from(["talent-rank-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_recalculate_arguments() {
        let cli = Cli::try_parse_from([
            "talent-rank-api",
            "rankings",
            "recalculate",
            "--profiles-csv",
            "profiles.csv",
            "--top",
            "3",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Rankings {
                command: RankingsCommand::Recalculate(args),
            }) => {
                assert_eq!(args.profiles_csv, PathBuf::from("profiles.csv"));
                assert_eq!(args.top, Some(3));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
