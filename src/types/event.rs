use serde::{Deserialize, Serialize};

use crate::types::review::Association;

/// Webhook event name the bot reacts to. Everything else is rejected at
/// the dispatch boundary.
pub const PULL_REQUEST_REVIEW_EVENT: &str = "pull_request_review";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub login: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub owner: Account,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRef {
    pub sha: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub user: Account,
    pub author_association: Association,
    pub head: CommitRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Installation {
    pub id: u64,
}

/// The parsed `pull_request_review` webhook payload, reduced to the fields
/// the bot consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestReviewEvent {
    #[serde(default)]
    pub action: Option<String>,

    pub pull_request: PullRequest,

    pub repository: Repository,

    pub installation: Installation,
}
