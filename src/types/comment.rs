use serde::{Deserialize, Serialize};

use super::Author;

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct IssueComment {
    pub id: String,
    pub body: String,
    pub author: Option<Author>,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}
