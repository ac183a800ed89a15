mod commands;
mod terminal;

use clap::Parser;
use commands::{CommandLine, Commands};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CommandLine::parse();

    logging::init(cli.verbose);
    let config = cli.config();

    match cli.command {
        Commands::Auto => {
            print::header("automatic discovery");
            commands::auto::run(config).await
        }
        Commands::Sweep { cidr } => {
            print::header("directed subnet sweep");
            commands::sweep::run(config, &cidr).await
        }
        Commands::Router { address, community } => {
            print::header("router table harvest");
            commands::router::run(config, &address, community).await
        }
        Commands::Trace { target } => {
            print::header("path trace");
            commands::trace::run(config, &target).await
        }
        Commands::Multi => {
            print::header("multi-subnet discovery");
            commands::multi::run(config).await
        }
        Commands::Passive => {
            print::header("passive discovery");
            commands::passive::run(config).await
        }
    }
}
