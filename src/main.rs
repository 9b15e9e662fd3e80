use clap::Parser;
use tracing_subscriber::EnvFilter;

use ninjazzz::cli::{
    Commands, run_check, run_manifest, run_permissions, run_simulate, run_storages,
};

#[derive(Parser)]
#[command(name = "ninjazzz")]
#[command(about = "NinjaZZZ wallet plugin manifest and bridge tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("ninjazzz=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Manifest { compact } => run_manifest(compact)?,
        Commands::Permissions { json } => run_permissions(json)?,
        Commands::Storages { json } => run_storages(json)?,
        Commands::Check { manifest } => run_check(manifest)?,
        Commands::Simulate {
            owner,
            count,
            config,
        } => run_simulate(owner, count, config).await?,
    }

    Ok(())
}
