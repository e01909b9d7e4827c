use serde::{Deserialize, Serialize};

/// An issue as returned by the search query (list shape: no body,
/// comments are a bare count).
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Issue {
    pub id: String,
    pub number: i64,
    pub title: String,
    pub state: IssueState,
    pub author: Option<Author>,
    pub comments: CommentCount,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

/// An issue as returned by the repository query (detail shape: adds the
/// body; the paginated comment thread is surfaced separately).
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct IssueDetail {
    pub id: String,
    pub number: i64,
    pub title: String,
    pub state: IssueState,
    pub author: Option<Author>,
    pub body: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueState::Open => "OPEN",
            IssueState::Closed => "CLOSED",
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Author {
    pub login: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy)]
pub struct CommentCount {
    #[serde(rename = "totalCount")]
    pub total_count: i64,
}
