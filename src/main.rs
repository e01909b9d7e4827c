use std::error::Error;
use std::io;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use clap_complete::generate;

use github_issues::cli::{Cli, Commands, IssueCommands};
use github_issues::client::GitHubClient;
use github_issues::config::Config;
use github_issues::error::Result;
use github_issues::{cache, commands, output};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");

        // Show error chain if verbose flag was passed
        if std::env::args().any(|arg| arg == "--verbose" || arg == "-v") {
            let mut source = e.source();
            while let Some(cause) = source {
                eprintln!("Caused by: {cause}");
                source = Error::source(cause);
            }
        }

        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    output::set_json_output(cli.json);

    match cli.command {
        // Commands that don't require config/client
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "ghi", &mut io::stdout());
        }
        Commands::Init => {
            commands::init::run().await?;
        }
        // Commands that require config and client
        command => {
            let config = Config::load()?;
            let repo = config.resolve_repo(cli.repo.as_deref())?;
            let client = Arc::new(GitHubClient::new(config.token()?));
            let cache = cache::shared();

            match command {
                Commands::Issues(args) => {
                    commands::issues::list(client, cache, &repo, args).await?;
                }
                Commands::Issue { action } => match action {
                    IssueCommands::View(args) => {
                        commands::issues::view(client, cache, &repo, args).await?;
                    }
                },
                Commands::Completions { .. } | Commands::Init => {
                    // Already handled above
                }
            }
        }
    }

    Ok(())
}
