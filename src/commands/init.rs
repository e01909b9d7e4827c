use std::io::{self, BufRead, Write};

use crate::config::Config;
use crate::error::{GitHubError, Result};

pub async fn run() -> Result<()> {
    let config_path = Config::config_path()?;

    if config_path.exists() {
        print!(
            "Config file already exists at {}. Overwrite? [y/N] ",
            config_path.display()
        );
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().lock().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    println!("GitHub Issues CLI Configuration");
    println!("===============================\n");

    print!("Enter a GitHub personal access token (create one at https://github.com/settings/tokens): ");
    io::stdout().flush()?;

    let mut token = String::new();
    io::stdin().lock().read_line(&mut token)?;
    let token = token.trim();

    if token.is_empty() {
        return Err(GitHubError::MissingToken);
    }

    print!("Enter repository as OWNER/NAME [facebook/react]: ");
    io::stdout().flush()?;

    let mut repo = String::new();
    io::stdin().lock().read_line(&mut repo)?;
    let repo = repo.trim();

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| GitHubError::ConfigRead {
            path: config_path.clone(),
            source: e,
        })?;
    }

    let mut config_content = format!("token = \"{token}\"\n");
    if !repo.is_empty() {
        let (owner, name) = repo
            .split_once('/')
            .filter(|(o, n)| !o.is_empty() && !n.is_empty())
            .ok_or_else(|| GitHubError::InvalidRepo(repo.to_string()))?;
        config_content.push_str(&format!("repo_owner = \"{owner}\"\n"));
        config_content.push_str(&format!("repo_name = \"{name}\"\n"));
    }

    std::fs::write(&config_path, config_content).map_err(|e| GitHubError::ConfigRead {
        path: config_path.clone(),
        source: e,
    })?;

    println!("\nConfig saved to {}", config_path.display());
    println!("You can now use 'ghi' commands!");

    Ok(())
}
