use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::types::{Author, Issue, IssueComment, IssueDetail, IssueState, PageInfo};

/// Cache shared by all coordinators in the process. Merges run under the
/// lock, synchronously with respect to each other.
pub type SharedCache = Arc<Mutex<IssueCache>>;

pub fn shared() -> SharedCache {
    Arc::new(Mutex::new(IssueCache::new()))
}

/// Lock the shared cache, recovering from a poisoned lock (merges are pure
/// and cannot leave the cache half-written).
pub fn lock(cache: &SharedCache) -> MutexGuard<'_, IssueCache> {
    cache.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Identity of one search-results cache entry. Different query strings are
/// different entries and are never merged with each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchKey {
    pub query: String,
    pub result_type: &'static str,
}

impl SearchKey {
    pub fn issues(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            result_type: "ISSUE",
        }
    }
}

/// Accumulated search results for one key: edges reference normalized
/// issue records by id, append-ordered by fetch time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConnection {
    pub edges: Vec<SearchEdge>,
    pub page_info: PageInfo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchEdge {
    pub node_id: String,
}

/// The comments field of a cached issue, tagged by response shape.
///
/// The same issue is reachable from the search query (count only) and the
/// repository query (full thread); the tag keeps the two from corrupting
/// each other.
#[derive(Debug, Clone)]
pub enum CommentsField {
    /// List view: a bare count, no node data.
    Summary { total_count: i64 },
    /// Detail view: paginated nodes.
    Thread {
        total_count: i64,
        nodes: Vec<IssueComment>,
        page_info: PageInfo,
    },
}

impl CommentsField {
    pub fn total_count(&self) -> i64 {
        match self {
            CommentsField::Summary { total_count } => *total_count,
            CommentsField::Thread { total_count, .. } => *total_count,
        }
    }

    pub fn nodes(&self) -> &[IssueComment] {
        match self {
            CommentsField::Summary { .. } => &[],
            CommentsField::Thread { nodes, .. } => nodes,
        }
    }

    pub fn page_info(&self) -> Option<&PageInfo> {
        match self {
            CommentsField::Summary { .. } => None,
            CommentsField::Thread { page_info, .. } => Some(page_info),
        }
    }
}

/// One normalized issue record, updated in place by every fetch that sees
/// the same id, whichever shape it arrives in.
#[derive(Debug, Clone)]
pub struct IssueRecord {
    pub id: String,
    pub number: i64,
    pub title: String,
    pub state: IssueState,
    pub author: Option<Author>,
    pub created_at: String,
    /// Only the detail query fetches the body; list fetches leave it alone.
    pub body: Option<String>,
    pub comments: CommentsField,
}

/// One page of search results as it comes off the wire, before
/// normalization.
#[derive(Debug, Clone)]
pub struct SearchPage {
    pub issues: Vec<Issue>,
    pub page_info: PageInfo,
}

/// One detail-query response (issue fields plus a comments page).
#[derive(Debug, Clone)]
pub struct IssueDetailPage {
    pub issue: IssueDetail,
    pub comments: CommentsField,
}

/// Merge policy for paginated search results.
///
/// First page adopts the incoming value; later pages keep the incoming
/// metadata and append the incoming edges after the existing ones. No
/// de-duplication: the server does not repeat items across pages of a
/// stable query.
pub fn merge_search(
    existing: Option<SearchConnection>,
    incoming: SearchConnection,
) -> SearchConnection {
    match existing {
        None => incoming,
        Some(existing) => {
            let mut edges = existing.edges;
            edges.extend(incoming.edges);
            SearchConnection {
                edges,
                page_info: incoming.page_info,
            }
        }
    }
}

/// Merge policy for an issue's comments field.
///
/// A summary never overwrites a thread (it carries no node data to
/// preserve the thread with), and a thread page appends to the thread it
/// extends. Everything else adopts the incoming value.
pub fn merge_comments(existing: Option<CommentsField>, incoming: CommentsField) -> CommentsField {
    match (existing, incoming) {
        (None, incoming) => incoming,
        (Some(CommentsField::Summary { .. }), incoming) => incoming,
        (Some(thread @ CommentsField::Thread { .. }), CommentsField::Summary { .. }) => thread,
        (
            Some(CommentsField::Thread { nodes, .. }),
            CommentsField::Thread {
                total_count,
                nodes: incoming_nodes,
                page_info,
            },
        ) => {
            let mut merged = nodes;
            merged.extend(incoming_nodes);
            CommentsField::Thread {
                total_count,
                nodes: merged,
                page_info,
            }
        }
    }
}

/// Normalized, identifier-keyed query cache.
///
/// Search connections are keyed by `SearchKey` and hold issue ids; issue
/// records are keyed by id and shared between the list and detail views.
#[derive(Default)]
pub struct IssueCache {
    searches: HashMap<SearchKey, SearchConnection>,
    issues: HashMap<String, IssueRecord>,
}

/// A materialized view of one search entry.
pub struct SearchView {
    pub items: Vec<Issue>,
    pub page_info: PageInfo,
}

impl IssueCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one search-results page into the entry for `key`, upserting
    /// each node into the normalized issue map.
    pub fn merge_search_page(&mut self, key: &SearchKey, page: SearchPage) {
        let mut edges = Vec::with_capacity(page.issues.len());
        for issue in page.issues {
            edges.push(SearchEdge {
                node_id: issue.id.clone(),
            });
            self.upsert_list_issue(issue);
        }

        let incoming = SearchConnection {
            edges,
            page_info: page.page_info,
        };
        let merged = merge_search(self.searches.remove(key), incoming);
        self.searches.insert(key.clone(), merged);
    }

    /// Merge one detail-query response: issue fields update in place, the
    /// comments field goes through the comments merge policy.
    pub fn merge_detail_page(&mut self, page: IssueDetailPage) {
        let IssueDetailPage { issue, comments } = page;
        let existing = self.issues.remove(&issue.id);
        let merged_comments = merge_comments(existing.map(|r| r.comments), comments);
        self.issues.insert(
            issue.id.clone(),
            IssueRecord {
                id: issue.id,
                number: issue.number,
                title: issue.title,
                state: issue.state,
                author: issue.author,
                created_at: issue.created_at,
                body: Some(issue.body),
                comments: merged_comments,
            },
        );
    }

    pub fn search_result(&self, key: &SearchKey) -> Option<SearchView> {
        let connection = self.searches.get(key)?;
        let items = connection
            .edges
            .iter()
            .filter_map(|edge| self.issues.get(&edge.node_id))
            .map(list_shape)
            .collect();
        Some(SearchView {
            items,
            page_info: connection.page_info.clone(),
        })
    }

    pub fn issue_by_number(&self, number: i64) -> Option<&IssueRecord> {
        self.issues.values().find(|record| record.number == number)
    }

    /// Full cache reset; the only eviction path.
    pub fn reset(&mut self) {
        self.searches.clear();
        self.issues.clear();
    }

    fn upsert_list_issue(&mut self, issue: Issue) {
        let existing = self.issues.remove(&issue.id);
        let (body, prior_comments) = match existing {
            Some(record) => (record.body, Some(record.comments)),
            None => (None, None),
        };
        let comments = merge_comments(
            prior_comments,
            CommentsField::Summary {
                total_count: issue.comments.total_count,
            },
        );
        self.issues.insert(
            issue.id.clone(),
            IssueRecord {
                id: issue.id,
                number: issue.number,
                title: issue.title,
                state: issue.state,
                author: issue.author,
                created_at: issue.created_at,
                body,
                comments,
            },
        );
    }
}

fn list_shape(record: &IssueRecord) -> Issue {
    Issue {
        id: record.id.clone(),
        number: record.number,
        title: record.title.clone(),
        state: record.state,
        author: record.author.clone(),
        comments: crate::types::CommentCount {
            total_count: record.comments.total_count(),
        },
        created_at: record.created_at.clone(),
    }
}
