use serde::{Deserialize, Serialize};

/// Cursor pagination info. `end_cursor` is an opaque server token, passed
/// back verbatim as the `after` argument of the next fetch.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInfo {
    #[serde(rename = "hasNextPage")]
    pub has_next_page: bool,
    #[serde(rename = "endCursor")]
    pub end_cursor: Option<String>,
}
