use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Deserialize;
use serde_json::json;

use crate::cache::{self, CommentsField, IssueDetailPage, SharedCache};
use crate::client::GitHubClient;
use crate::error::{GitHubError, Result};
use crate::filters::RepoRef;
use crate::types::{IssueComment, IssueDetail, PageInfo};

pub const COMMENTS_PER_PAGE: i64 = 20;
pub const MIN_VALID_ISSUE_NUMBER: i64 = 1;

const GET_ISSUE_QUERY: &str = r#"
query GetIssue($owner: String!, $name: String!, $number: Int!, $commentsFirst: Int!, $commentsAfter: String) {
    repository(owner: $owner, name: $name) {
        issue(number: $number) {
            id
            number
            title
            state
            createdAt
            author {
                login
            }
            body
            comments(first: $commentsFirst, after: $commentsAfter) {
                totalCount
                pageInfo {
                    hasNextPage
                    endCursor
                }
                nodes {
                    id
                    body
                    createdAt
                    author {
                        login
                    }
                }
            }
        }
    }
}
"#;

#[derive(Deserialize)]
struct IssueData {
    repository: Option<RepositoryData>,
}

#[derive(Deserialize)]
struct RepositoryData {
    issue: Option<IssueDetailRaw>,
}

#[derive(Deserialize)]
struct IssueDetailRaw {
    #[serde(flatten)]
    issue: IssueDetail,
    comments: CommentsRaw,
}

/// Comments field as it appears on the wire. The detail query always asks
/// for nodes, but the decoder tolerates a count-only shape and maps it to
/// the summary tag rather than failing the merge.
#[derive(Deserialize)]
struct CommentsRaw {
    #[serde(rename = "totalCount")]
    total_count: i64,
    nodes: Option<Vec<IssueComment>>,
    #[serde(rename = "pageInfo")]
    page_info: Option<PageInfo>,
}

impl From<CommentsRaw> for CommentsField {
    fn from(raw: CommentsRaw) -> Self {
        match raw.nodes {
            Some(nodes) => CommentsField::Thread {
                total_count: raw.total_count,
                nodes,
                page_info: raw.page_info.unwrap_or_default(),
            },
            None => CommentsField::Summary {
                total_count: raw.total_count,
            },
        }
    }
}

/// What the detail coordinator exposes to presentation code.
///
/// `issue: None` with `error: None` means the issue does not exist (a
/// successful null response), which is a different state from a failed
/// fetch (`error` set).
pub struct DetailSnapshot {
    pub issue: Option<IssueDetail>,
    pub comments: Vec<IssueComment>,
    pub total_comments: i64,
    pub loading: bool,
    pub is_fetching_more: bool,
    pub error: Option<Arc<GitHubError>>,
    pub has_next_page: bool,
}

/// Coordinates one issue-detail query, with forward pagination over the
/// issue's comment thread.
pub struct IssueDetailQuery {
    client: Arc<GitHubClient>,
    cache: SharedCache,
    repo: RepoRef,
    number: i64,
    page_size: i64,
    /// Set for invalid issue numbers: load() never touches the network.
    skip: bool,
    not_found: AtomicBool,
    loading: AtomicBool,
    fetching_more: AtomicBool,
    error: Mutex<Option<Arc<GitHubError>>>,
}

impl IssueDetailQuery {
    pub fn new(
        client: Arc<GitHubClient>,
        cache: SharedCache,
        repo: RepoRef,
        number: i64,
        page_size: i64,
    ) -> Self {
        Self {
            client,
            cache,
            repo,
            number,
            page_size,
            skip: number < MIN_VALID_ISSUE_NUMBER,
            not_found: AtomicBool::new(false),
            loading: AtomicBool::new(false),
            fetching_more: AtomicBool::new(false),
            error: Mutex::new(None),
        }
    }

    /// Fetch the issue with its first comments page. Skipped entirely for
    /// invalid numbers; cache-first when the thread shape is already
    /// cached for this issue.
    pub async fn load(&self) {
        if self.skip {
            return;
        }
        {
            let cache = cache::lock(&self.cache);
            if let Some(record) = cache.issue_by_number(self.number) {
                if record.body.is_some() && record.comments.page_info().is_some() {
                    return;
                }
            }
        }

        self.loading.store(true, Ordering::SeqCst);
        let result = self.fetch_page(None).await;
        self.record(result);
        self.loading.store(false, Ordering::SeqCst);
    }

    /// Fetch the next comments page. Same guards as the search
    /// coordinator: no next page, no cursor, or already in flight all make
    /// this a no-op.
    pub async fn fetch_more_comments(&self) {
        if self.skip {
            return;
        }
        let cursor = {
            let cache = cache::lock(&self.cache);
            let Some(record) = cache.issue_by_number(self.number) else {
                return;
            };
            let Some(page_info) = record.comments.page_info() else {
                return;
            };
            if !page_info.has_next_page {
                return;
            }
            let Some(cursor) = page_info.end_cursor.clone() else {
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

    pub fn snapshot(&self) -> DetailSnapshot {
        let cache = cache::lock(&self.cache);
        let record = cache.issue_by_number(self.number);

        let (issue, comments, total_comments, has_next_page) = match record {
            Some(record) if record.body.is_some() => {
                let issue = IssueDetail {
                    id: record.id.clone(),
                    number: record.number,
                    title: record.title.clone(),
                    state: record.state,
                    author: record.author.clone(),
                    body: record.body.clone().unwrap_or_default(),
                    created_at: record.created_at.clone(),
                };
                let has_next = record
                    .comments
                    .page_info()
                    .map(|p| p.has_next_page)
                    .unwrap_or(false);
                (
                    Some(issue),
                    record.comments.nodes().to_vec(),
                    record.comments.total_count(),
                    has_next,
                )
            }
            _ => (None, Vec::new(), 0, false),
        };

        DetailSnapshot {
            issue,
            comments,
            total_comments,
            loading: self.loading.load(Ordering::SeqCst),
            is_fetching_more: self.fetching_more.load(Ordering::SeqCst),
            error: self.error_slot().clone(),
            has_next_page,
        }
    }

    /// True after a successful fetch found no such issue.
    pub fn is_not_found(&self) -> bool {
        self.not_found.load(Ordering::SeqCst)
    }

    async fn fetch_page(&self, after: Option<String>) -> Result<Option<IssueDetailPage>> {
        let mut variables = json!({
            "owner": self.repo.owner,
            "name": self.repo.name,
            "number": self.number,
            "commentsFirst": self.page_size,
        });
        if let Some(after) = after {
            variables["commentsAfter"] = json!(after);
        }

        let data: IssueData = self
            .client
            .query(GET_ISSUE_QUERY, Some(variables))
            .await?;

        Ok(data
            .repository
            .and_then(|repo| repo.issue)
            .map(|raw| IssueDetailPage {
                issue: raw.issue,
                comments: raw.comments.into(),
            }))
    }

    fn record(&self, result: Result<Option<IssueDetailPage>>) {
        match result {
            Ok(Some(page)) => {
                cache::lock(&self.cache).merge_detail_page(page);
                self.not_found.store(false, Ordering::SeqCst);
                *self.error_slot() = None;
            }
            // A null issue is a successful response, not an error.
            Ok(None) => {
                self.not_found.store(true, Ordering::SeqCst);
                *self.error_slot() = None;
            }
            Err(err) => {
                *self.error_slot() = Some(Arc::new(err));
            }
        }
    }

    fn error_slot(&self) -> std::sync::MutexGuard<'_, Option<Arc<GitHubError>>> {
        self.error.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn comment_node(id: &str) -> Value {
        json!({
            "id": id,
            "body": format!("comment {id}"),
            "createdAt": "2024-01-15T10:30:00Z",
            "author": { "login": "gaearon" }
        })
    }

    fn issue_body(comments: Vec<Value>, total: i64, has_next: bool, cursor: Option<&str>) -> String {
        json!({
            "data": {
                "repository": {
                    "issue": {
                        "id": "a",
                        "number": 128,
                        "title": "useEffect cleanup",
                        "state": "OPEN",
                        "createdAt": "2024-01-15T10:30:00Z",
                        "author": { "login": "gaearon" },
                        "body": "Full issue body",
                        "comments": {
                            "totalCount": total,
                            "pageInfo": { "hasNextPage": has_next, "endCursor": cursor },
                            "nodes": comments
                        }
                    }
                }
            }
        })
        .to_string()
    }

    fn not_found_body() -> String {
        json!({ "data": { "repository": { "issue": null } } }).to_string()
    }

    fn coordinator(server: &mockito::Server, number: i64) -> IssueDetailQuery {
        let client = Arc::new(GitHubClient::with_endpoint(
            server.url(),
            "test-token".to_string(),
        ));
        IssueDetailQuery::new(
            client,
            cache::shared(),
            RepoRef::new("facebook", "react"),
            number,
            COMMENTS_PER_PAGE,
        )
    }

    #[tokio::test]
    async fn load_fetches_issue_and_first_comments_page() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(issue_body(
                vec![comment_node("n1"), comment_node("n2")],
                3,
                true,
                Some("q1"),
            ))
            .expect(1)
            .create_async()
            .await;

        let detail = coordinator(&server, 128);
        detail.load().await;
        mock.assert_async().await;

        let snap = detail.snapshot();
        let issue = snap.issue.expect("issue should be cached");
        assert_eq!(issue.number, 128);
        assert_eq!(issue.body, "Full issue body");
        assert_eq!(snap.comments.len(), 2);
        assert_eq!(snap.total_comments, 3);
        assert!(snap.has_next_page);
        assert!(snap.error.is_none());
    }

    #[tokio::test]
    async fn invalid_issue_number_skips_execution() {
        let mut server = mockito::Server::new_async().await;
        let none = server.mock("POST", "/").expect(0).create_async().await;

        let detail = coordinator(&server, 0);
        detail.load().await;
        detail.fetch_more_comments().await;
        none.assert_async().await;

        let snap = detail.snapshot();
        assert!(snap.issue.is_none());
        assert!(snap.error.is_none());
    }

    #[tokio::test]
    async fn missing_issue_is_not_found_not_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(not_found_body())
            .create_async()
            .await;

        let detail = coordinator(&server, 999999);
        detail.load().await;

        let snap = detail.snapshot();
        assert!(snap.issue.is_none());
        assert!(snap.error.is_none());
        assert!(detail.is_not_found());
    }

    #[tokio::test]
    async fn graphql_errors_surface_as_error_value() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(
                json!({
                    "data": { "repository": null },
                    "errors": [{ "message": "rate limited" }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let detail = coordinator(&server, 128);
        detail.load().await;

        let snap = detail.snapshot();
        assert!(snap.issue.is_none());
        let err = snap.error.expect("error should be recorded");
        assert!(matches!(*err, GitHubError::GraphQL { .. }));
        assert!(!detail.is_not_found());
    }

    #[tokio::test]
    async fn comment_pages_append_across_fetch_more() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(issue_body(
                vec![comment_node("n1"), comment_node("n2")],
                3,
                true,
                Some("q1"),
            ))
            .expect(1)
            .create_async()
            .await;

        let detail = coordinator(&server, 128);
        detail.load().await;
        first.assert_async().await;
        first.remove_async().await;

        let second = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::PartialJson(json!({
                "variables": { "commentsAfter": "q1" }
            })))
            .with_status(200)
            .with_body(issue_body(vec![comment_node("n3")], 3, false, Some("q2")))
            .expect(1)
            .create_async()
            .await;

        tokio::join!(detail.fetch_more_comments(), detail.fetch_more_comments());
        second.assert_async().await;

        let snap = detail.snapshot();
        let ids: Vec<&str> = snap.comments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["n1", "n2", "n3"]);
        assert!(!snap.has_next_page);
        assert!(!snap.is_fetching_more);
    }

    #[tokio::test]
    async fn fetch_more_without_next_page_is_a_no_op() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(issue_body(vec![comment_node("n1")], 1, false, None))
            .expect(1)
            .create_async()
            .await;

        let detail = coordinator(&server, 128);
        detail.load().await;
        first.assert_async().await;
        first.remove_async().await;

        let none = server.mock("POST", "/").expect(0).create_async().await;
        detail.fetch_more_comments().await;
        none.assert_async().await;
    }
}
