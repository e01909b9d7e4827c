use std::sync::Arc;

use serde::Serialize;
use tabled::Tabled;

use crate::cache::SharedCache;
use crate::cli::{IssueListArgs, IssueViewArgs};
use crate::client::GitHubClient;
use crate::detail::{DetailSnapshot, IssueDetailQuery};
use crate::error::{GitHubError, Result};
use crate::filters::{FilterStore, RepoRef};
use crate::output::{self, format_relative, state_colored, truncate};
use crate::search::IssueSearch;
use crate::types::{Issue, IssueComment};

#[derive(Tabled)]
struct IssueRow {
    #[tabled(rename = "#")]
    number: i64,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Author")]
    author: String,
    #[tabled(rename = "Comments")]
    comments: i64,
    #[tabled(rename = "Opened")]
    opened: String,
}

impl From<&Issue> for IssueRow {
    fn from(issue: &Issue) -> Self {
        Self {
            number: issue.number,
            title: truncate(&issue.title, 60),
            status: state_colored(issue.state),
            author: issue
                .author
                .as_ref()
                .map(|a| a.login.clone())
                .unwrap_or_default(),
            comments: issue.comments.total_count,
            opened: format_relative(&issue.created_at),
        }
    }
}

pub async fn list(
    client: Arc<GitHubClient>,
    cache: SharedCache,
    repo: &RepoRef,
    args: IssueListArgs,
) -> Result<()> {
    let mut store = FilterStore::new(repo.clone());
    if let Some(text) = args.search {
        store.set_search_text(text);
    }
    store.set_status(args.status);

    let search = IssueSearch::new(client, cache, store.query(), args.limit);
    search.load().await;

    let mut pages_loaded = 1u32;
    loop {
        let snap = search.snapshot();
        if let Some(err) = snap.error {
            return Err(GitHubError::Query(err.to_string()));
        }
        if !snap.has_next_page {
            break;
        }
        if !args.all && pages_loaded >= args.pages {
            break;
        }
        let before = snap.items.len();
        search.fetch_more().await;
        pages_loaded += 1;
        // A page that added nothing means the server has no more to give
        // (or withheld a cursor); stop rather than spin.
        if search.snapshot().items.len() == before {
            break;
        }
    }

    let snap = search.snapshot();
    if snap.items.is_empty() {
        output::print_message(&format!("No issues match '{}'", search.query_string()));
        return Ok(());
    }

    output::print_table(&snap.items, |i| IssueRow::from(i));
    if snap.has_next_page && !output::is_json_output() {
        println!("(more available: re-run with --pages {})", pages_loaded + 1);
    }

    Ok(())
}

/// Serialized form of `ghi issue view --json`.
#[derive(Serialize)]
struct IssueWithComments<'a> {
    #[serde(flatten)]
    issue: &'a crate::types::IssueDetail,
    comments: &'a [IssueComment],
    #[serde(rename = "totalComments")]
    total_comments: i64,
}

pub async fn view(
    client: Arc<GitHubClient>,
    cache: SharedCache,
    repo: &RepoRef,
    args: IssueViewArgs,
) -> Result<()> {
    let detail = IssueDetailQuery::new(client, cache, repo.clone(), args.number, args.comments);
    detail.load().await;

    if args.all_comments {
        loop {
            let snap = detail.snapshot();
            if snap.error.is_some() || !snap.has_next_page {
                break;
            }
            detail.fetch_more_comments().await;
            if detail.snapshot().comments.len() == snap.comments.len() {
                break;
            }
        }
    }

    let snap = detail.snapshot();
    if let Some(err) = snap.error {
        return Err(GitHubError::Query(err.to_string()));
    }

    let Some(issue) = &snap.issue else {
        return Err(GitHubError::IssueNotFound(args.number));
    };

    output::print_item(
        &IssueWithComments {
            issue,
            comments: &snap.comments,
            total_comments: snap.total_comments,
        },
        |_| display_issue(&snap),
    );

    Ok(())
}

fn display_issue(snap: &DetailSnapshot) {
    let Some(issue) = &snap.issue else { return };

    println!("#{} - {}", issue.number, issue.title);
    println!(
        "{} by {} {}",
        state_colored(issue.state),
        issue
            .author
            .as_ref()
            .map(|a| a.login.as_str())
            .unwrap_or("ghost"),
        format_relative(&issue.created_at)
    );
    println!();

    if !issue.body.is_empty() {
        println!("{}", issue.body);
        println!();
    }

    if snap.comments.is_empty() {
        println!("No comments.");
        return;
    }

    println!("Comments ({} of {}):", snap.comments.len(), snap.total_comments);
    println!();
    for comment in &snap.comments {
        println!(
            "  {} - {}",
            comment
                .author
                .as_ref()
                .map(|a| a.login.as_str())
                .unwrap_or("ghost"),
            format_relative(&comment.created_at)
        );
        for line in comment.body.lines() {
            println!("  {line}");
        }
        println!();
    }

    if snap.has_next_page {
        println!("(more comments available: re-run with --all-comments)");
    }
}
