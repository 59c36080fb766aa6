pub mod api;
pub mod app;

#[cfg(test)]
mod testutil;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::check::AuthorizationResult;
use crate::types::context::PullRequestContext;
use crate::types::permission::PermissionLevel;
use crate::types::review::Review;

/// A failure talking to the GitHub API. The decision engine never retries
/// these; webhook redelivery is the recovery mechanism.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("github api error: status {status}, {message}")]
    Status { status: u16, message: String },

    #[error("github auth error: {0}")]
    Auth(String),

    #[error("decode github response: {0}")]
    Decode(String),
}

/// Supplies review lists and permission levels for logins in a repository.
///
/// Implementations own the transport concerns the engine must not carry:
/// `list_reviews` has to follow pagination until exhausted (a truncated
/// list breaks the last-write-wins replay), and transient failures should
/// be retried with bounded backoff before surfacing an error.
#[async_trait]
pub trait PermissionResolver: Send + Sync {
    /// All reviews of a pull request, oldest submission first.
    async fn list_reviews(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<Review>, UpstreamError>;

    async fn get_permission_level(
        &self,
        owner: &str,
        repo: &str,
        login: &str,
    ) -> Result<PermissionLevel, UpstreamError>;
}

/// Publishes an [`AuthorizationResult`] as a check run on the head commit.
///
/// GitHub may redeliver a webhook, so publishing the same result twice for
/// one head SHA must be tolerated.
#[async_trait]
pub trait CheckReporter: Send + Sync {
    async fn publish(
        &self,
        ctx: &PullRequestContext,
        result: &AuthorizationResult,
    ) -> Result<(), UpstreamError>;
}
