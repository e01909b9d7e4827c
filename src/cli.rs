use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use crate::filters::StatusFilter;

#[derive(Parser)]
#[command(name = "ghi")]
#[command(about = "Browse GitHub issues from the terminal", version)]
#[command(after_help = "EXAMPLES:
    ghi issues                          List issues in the configured repo
    ghi issues --search hooks --status open
    ghi issues --pages 3                Load three pages of results
    ghi issue view 12345                Show an issue with its comments
    ghi issue view 12345 --all-comments")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Repository to browse as OWNER/NAME (overrides config)
    #[arg(long, global = true)]
    pub repo: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search and list issues
    #[command(after_help = "EXAMPLES:
    ghi issues --status closed
    ghi issues --search \"useEffect cleanup\" --limit 50
    ghi issues --all")]
    Issues(IssueListArgs),
    /// Inspect a single issue
    Issue {
        #[command(subcommand)]
        action: IssueCommands,
    },
    /// Generate shell completions
    #[command(after_help = "EXAMPLES:
    ghi completions bash > ~/.bash_completion.d/ghi
    ghi completions zsh > ~/.zfunc/_ghi")]
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
    /// Initialize configuration file interactively
    Init,
}

#[derive(Subcommand)]
pub enum IssueCommands {
    /// Show issue details with comments
    #[command(after_help = "EXAMPLES:
    ghi issue view 12345
    ghi issue view 12345 --comments 50
    ghi issue view 12345 --all-comments")]
    View(IssueViewArgs),
}

#[derive(Args)]
pub struct IssueListArgs {
    /// Free-text search within issue titles and bodies
    #[arg(long, short)]
    pub search: Option<String>,

    /// Filter by issue status
    #[arg(long, value_enum, default_value_t = StatusFilter::All)]
    pub status: StatusFilter,

    /// Issues per page
    #[arg(long, short, default_value_t = crate::search::ISSUES_PER_PAGE)]
    pub limit: i64,

    /// Number of pages to load
    #[arg(long, default_value_t = 1, conflicts_with = "all")]
    pub pages: u32,

    /// Load every page of results (may be slow for broad queries)
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct IssueViewArgs {
    /// Issue number (e.g., 12345)
    pub number: i64,

    /// Comments per page
    #[arg(long, default_value_t = crate::detail::COMMENTS_PER_PAGE)]
    pub comments: i64,

    /// Load the entire comment thread
    #[arg(long, conflicts_with = "comments")]
    pub all_comments: bool,
}
