use clap::Parser;

use knowstro_rs::cli::{self, Cli, execute_command};
use knowstro_rs::server::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = cli::load_and_merge_config(&cli)?;
    cli::init_logger_from_settings(&settings)?;

    execute_command(&cli, settings.clone()).await?;
    if cli::executor::is_dry_run(&cli) {
        return Ok(());
    }

    Server::new(settings).run().await
}
