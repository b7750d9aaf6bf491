//! Command dispatch after parsing and configuration loading

use super::handlers::ServeCommandHandler;
use super::parser::{Cli, Commands};
use crate::config::settings::Settings;
use crate::error::{AppError, AppResult};

/// Run the selected command.
///
/// Plain `serve` (or no command) returns `Ok(())` and leaves starting the
/// server to the caller; `serve --dry-run` validates and reports instead.
pub async fn execute_command(cli: &Cli, settings: Settings) -> AppResult<()> {
    cli.validate().map_err(|reason| AppError::Validation {
        field: "cli_arguments".to_string(),
        reason,
    })?;

    match &cli.command {
        Some(Commands::Serve { dry_run: true, .. }) => {
            ServeCommandHandler::new(settings).execute(true).await
        }
        Some(Commands::Serve { .. }) | None => Ok(()),
    }
}

/// True when the command line asks for a configuration check only
pub fn is_dry_run(cli: &Cli) -> bool {
    matches!(cli.command, Some(Commands::Serve { dry_run: true, .. }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn valid_config() -> Settings {
        let mut config = Settings::default();
        config.database.url = "postgres://localhost/knowstro".to_string();
        config
    }

    #[tokio::test]
    async fn test_execute_serve_dry_run() {
        let cli = Cli::try_parse_from(["knowstro-rs", "serve", "--dry-run"]).unwrap();
        assert!(is_dry_run(&cli));
        assert!(execute_command(&cli, valid_config()).await.is_ok());
    }

    #[tokio::test]
    async fn test_execute_without_command() {
        let cli = Cli::try_parse_from(["knowstro-rs"]).unwrap();
        assert!(!is_dry_run(&cli));
        assert!(execute_command(&cli, valid_config()).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_arguments_are_rejected() {
        let cli = Cli::try_parse_from(["knowstro-rs", "serve", "--host", "0.0.0.0", "--port", "443"])
            .unwrap();
        let err = execute_command(&cli, valid_config()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "cli_arguments"));
    }

    #[tokio::test]
    async fn test_dry_run_with_invalid_config_fails() {
        let cli = Cli::try_parse_from(["knowstro-rs", "serve", "--dry-run"]).unwrap();
        let mut config = valid_config();
        config.auth.activation_token_ttl_hours = 0;
        assert!(execute_command(&cli, config).await.is_err());
    }
}
