//! End-to-end flow: filter store -> debounce -> search coordinator ->
//! cache merge -> snapshot.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use github_issues::cache;
use github_issues::client::GitHubClient;
use github_issues::debounce::Debouncer;
use github_issues::filters::{FilterStore, RepoRef, StatusFilter};
use github_issues::search::IssueSearch;

fn search_body(numbers: &[i64], has_next: bool, cursor: Option<&str>) -> String {
    let edges: Vec<serde_json::Value> = numbers
        .iter()
        .map(|n| {
            json!({
                "node": {
                    "id": format!("id-{n}"),
                    "number": n,
                    "title": format!("Issue {n}"),
                    "state": "OPEN",
                    "createdAt": "2024-01-15T10:30:00Z",
                    "author": { "login": "gaearon" },
                    "comments": { "totalCount": 0 }
                }
            })
        })
        .collect();
    json!({
        "data": {
            "search": {
                "edges": edges,
                "pageInfo": { "hasNextPage": has_next, "endCursor": cursor }
            }
        }
    })
    .to_string()
}

#[tokio::test]
async fn typed_filters_settle_into_one_query() {
    let mut server = mockito::Server::new_async().await;
    let expected_query = "repo:facebook/react is:issue hooks state:open";

    let mock = server
        .mock("POST", "/")
        .match_body(mockito::Matcher::PartialJson(json!({
            "variables": { "query": expected_query, "first": 20 }
        })))
        .with_status(200)
        .with_body(search_body(&[1, 2], true, Some("c1")))
        .expect(1)
        .create_async()
        .await;

    let mut store = FilterStore::new(RepoRef::new("facebook", "react"));
    let debouncer = Debouncer::new(store.query(), Duration::from_millis(50));
    let mut settled = debouncer.subscribe();

    // A typing burst: only the final state should ever reach the network.
    store.set_status(StatusFilter::Open);
    for prefix in ["h", "ho", "hoo", "hook", "hooks"] {
        store.set_search_text(prefix);
        debouncer.set(store.query());
    }

    tokio::time::timeout(Duration::from_secs(1), settled.changed())
        .await
        .expect("debounce should settle")
        .unwrap();
    let query = settled.borrow_and_update().clone();
    assert_eq!(query, expected_query);

    let client = Arc::new(GitHubClient::with_endpoint(
        server.url(),
        "test-token".to_string(),
    ));
    let shared = cache::shared();
    let search = IssueSearch::new(client.clone(), shared.clone(), query, 20);
    search.load().await;
    mock.assert_async().await;
    mock.remove_async().await;

    let snap = search.snapshot();
    assert!(snap.error.is_none());
    assert_eq!(snap.items.len(), 2);
    assert!(snap.has_next_page);

    // Second page appends under the same key.
    let page2 = server
        .mock("POST", "/")
        .match_body(mockito::Matcher::PartialJson(json!({
            "variables": { "query": expected_query, "after": "c1" }
        })))
        .with_status(200)
        .with_body(search_body(&[3], false, Some("c2")))
        .expect(1)
        .create_async()
        .await;

    search.fetch_more().await;
    page2.assert_async().await;

    let snap = search.snapshot();
    let numbers: Vec<i64> = snap.items.iter().map(|i| i.number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert!(!snap.has_next_page);

    // Resetting filters is a different query string, so a fresh key: the
    // accumulated pages of the old query are untouched.
    store.reset();
    let reset_query = store.query();
    assert_eq!(reset_query, "repo:facebook/react is:issue");
    let fresh = server
        .mock("POST", "/")
        .match_body(mockito::Matcher::PartialJson(json!({
            "variables": { "query": reset_query }
        })))
        .with_status(200)
        .with_body(search_body(&[9], false, None))
        .expect(1)
        .create_async()
        .await;

    let reset_search = IssueSearch::new(client, shared, reset_query, 20);
    reset_search.load().await;
    fresh.assert_async().await;

    assert_eq!(reset_search.snapshot().items.len(), 1);
    assert_eq!(search.snapshot().items.len(), 3);
}
