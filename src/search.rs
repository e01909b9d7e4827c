use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Deserialize;
use serde_json::json;

use crate::cache::{self, SearchKey, SearchPage, SharedCache};
use crate::client::GitHubClient;
use crate::error::{GitHubError, Result};
use crate::types::{Issue, PageInfo};

pub const ISSUES_PER_PAGE: i64 = 20;

const SEARCH_ISSUES_QUERY: &str = r#"
query SearchIssues($query: String!, $first: Int!, $after: String) {
    search(query: $query, type: ISSUE, first: $first, after: $after) {
        edges {
            node {
                ... on Issue {
                    id
                    number
                    title
                    state
                    createdAt
                    author {
                        login
                    }
                    comments {
                        totalCount
                    }
                }
            }
        }
        pageInfo {
            hasNextPage
            endCursor
        }
    }
}
"#;

#[derive(Deserialize)]
struct SearchData {
    search: SearchResults,
}

#[derive(Deserialize)]
struct SearchResults {
    edges: Vec<SearchResultEdge>,
    #[serde(rename = "pageInfo")]
    page_info: PageInfo,
}

#[derive(Deserialize)]
struct SearchResultEdge {
    node: Issue,
}

/// What the search coordinator exposes to presentation code. Errors are
/// carried as a value here, never returned as `Err` from the coordinator.
pub struct SearchSnapshot {
    pub items: Vec<Issue>,
    pub loading: bool,
    pub is_fetching_more: bool,
    pub error: Option<Arc<GitHubError>>,
    pub has_next_page: bool,
}

/// Coordinates one search query string against the shared cache.
///
/// A changed query string means a new coordinator over a new cache key; a
/// late page for a superseded query still merges into its own key and
/// never leaks into another.
pub struct IssueSearch {
    client: Arc<GitHubClient>,
    cache: SharedCache,
    key: SearchKey,
    page_size: i64,
    loading: AtomicBool,
    fetching_more: AtomicBool,
    error: Mutex<Option<Arc<GitHubError>>>,
}

impl IssueSearch {
    pub fn new(
        client: Arc<GitHubClient>,
        cache: SharedCache,
        query: impl Into<String>,
        page_size: i64,
    ) -> Self {
        Self {
            client,
            cache,
            key: SearchKey::issues(query),
            page_size,
            loading: AtomicBool::new(false),
            fetching_more: AtomicBool::new(false),
            error: Mutex::new(None),
        }
    }

    pub fn query_string(&self) -> &str {
        &self.key.query
    }

    /// Fetch the first page, cache-first: an existing entry for this key
    /// is served as-is without touching the network.
    pub async fn load(&self) {
        if cache::lock(&self.cache).search_result(&self.key).is_some() {
            return;
        }

        self.loading.store(true, Ordering::SeqCst);
        let result = self.fetch_page(None).await;
        self.record(result);
        self.loading.store(false, Ordering::SeqCst);
    }

    /// Fetch the next page using the cached cursor. A no-op when there is
    /// no next page, no cursor, or a fetch-more is already in flight
    /// (re-entrant calls are suppressed, not queued).
    pub async fn fetch_more(&self) {
        let cursor = {
            let cache = cache::lock(&self.cache);
            let Some(view) = cache.search_result(&self.key) else {
                return;
            };
            if !view.page_info.has_next_page {
                return;
            }
            let Some(cursor) = view.page_info.end_cursor else {
                return;
            };
            cursor
        };

        if self
            .fetching_more
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        let result = self.fetch_page(Some(cursor)).await;
        self.record(result);
        self.fetching_more.store(false, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        let view = cache::lock(&self.cache).search_result(&self.key);
        let (items, has_next_page) = match view {
            Some(view) => (view.items, view.page_info.has_next_page),
            None => (Vec::new(), false),
        };
        SearchSnapshot {
            items,
            loading: self.loading.load(Ordering::SeqCst),
            is_fetching_more: self.fetching_more.load(Ordering::SeqCst),
            error: self.current_error(),
            has_next_page,
        }
    }

    async fn fetch_page(&self, after: Option<String>) -> Result<SearchPage> {
        let mut variables = json!({
            "query": self.key.query,
            "first": self.page_size,
        });
        if let Some(after) = after {
            variables["after"] = json!(after);
        }

        let data: SearchData = self
            .client
            .query(SEARCH_ISSUES_QUERY, Some(variables))
            .await?;

        Ok(SearchPage {
            issues: data.search.edges.into_iter().map(|e| e.node).collect(),
            page_info: data.search.page_info,
        })
    }

    fn record(&self, result: Result<SearchPage>) {
        match result {
            Ok(page) => {
                cache::lock(&self.cache).merge_search_page(&self.key, page);
                *self.error_slot() = None;
            }
            Err(err) => {
                *self.error_slot() = Some(Arc::new(err));
            }
        }
    }

    fn current_error(&self) -> Option<Arc<GitHubError>> {
        self.error_slot().clone()
    }

    fn error_slot(&self) -> std::sync::MutexGuard<'_, Option<Arc<GitHubError>>> {
        self.error.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
