use crate::types::event::PullRequestReviewEvent;
use crate::types::review::Association;

/// Immutable facts about one webhook delivery. Built once per event,
/// owned by the evaluation that consumes it, discarded after the decision
/// is reported.
#[derive(Debug, Clone)]
pub struct PullRequestContext {
    pub owner: String,
    pub repo: String,
    pub number: u64,

    pub head_sha: String,

    pub author: String,
    pub author_association: Association,

    pub installation_id: u64,
}

impl PullRequestContext {
    pub fn from_event(event: &PullRequestReviewEvent) -> Self {
        Self {
            owner: event.repository.owner.login.clone(),
            repo: event.repository.name.clone(),
            number: event.pull_request.number,
            head_sha: event.pull_request.head.sha.clone(),
            author: event.pull_request.user.login.clone(),
            author_association: event.pull_request.author_association,
            installation_id: event.installation.id,
        }
    }
}
