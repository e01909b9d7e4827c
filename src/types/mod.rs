mod comment;
mod issue;
mod page;

pub use comment::IssueComment;
pub use issue::{Author, CommentCount, Issue, IssueDetail, IssueState};
pub use page::PageInfo;
