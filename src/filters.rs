use clap::ValueEnum;
use tokio::sync::watch;

/// Repository scope for all queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StatusFilter {
    #[default]
    All,
    Open,
    Closed,
}

impl StatusFilter {
    fn as_query_term(&self) -> Option<&'static str> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Open => Some("state:open"),
            StatusFilter::Closed => Some("state:closed"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueFilters {
    pub search_text: String,
    pub status: StatusFilter,
}

/// Builds a GitHub search query string from filter parameters.
///
/// Terms are joined in fixed order: repository scope, issue type, trimmed
/// search text (if any), status (if not All).
pub fn build_search_query(repo: &RepoRef, filters: &IssueFilters) -> String {
    let mut parts = vec![
        format!("repo:{}/{}", repo.owner, repo.name),
        "is:issue".to_string(),
    ];

    let text = filters.search_text.trim();
    if !text.is_empty() {
        parts.push(text.to_string());
    }

    if let Some(term) = filters.status.as_query_term() {
        parts.push(term.to_string());
    }

    parts.join(" ")
}

/// Owned filter state with setters as the only mutation path.
///
/// Observers receive the built query string through a watch channel, so a
/// filter change is seen downstream as a query-string change (a new cache
/// key), never as an in-place edit of the old one.
pub struct FilterStore {
    repo: RepoRef,
    filters: IssueFilters,
    tx: watch::Sender<String>,
}

impl FilterStore {
    pub fn new(repo: RepoRef) -> Self {
        let filters = IssueFilters::default();
        let (tx, _rx) = watch::channel(build_search_query(&repo, &filters));
        Self { repo, filters, tx }
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.filters.search_text = text.into();
        self.publish();
    }

    pub fn set_status(&mut self, status: StatusFilter) {
        self.filters.status = status;
        self.publish();
    }

    pub fn reset(&mut self) {
        self.filters = IssueFilters::default();
        self.publish();
    }

    pub fn filters(&self) -> &IssueFilters {
        &self.filters
    }

    /// The query string built from the current filters.
    pub fn query(&self) -> String {
        build_search_query(&self.repo, &self.filters)
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.tx.subscribe()
    }

    fn publish(&self) {
        let query = self.query();
        self.tx.send_if_modified(|current| {
            if *current == query {
                false
            } else {
                *current = query;
                true
            }
        });
    }
}
