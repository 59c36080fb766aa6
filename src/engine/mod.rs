mod candidates;

use log::{debug, info};
use thiserror::Error;

use crate::github::{PermissionResolver, UpstreamError};
use crate::types::check::AuthorizationResult;
use crate::types::context::PullRequestContext;
use crate::types::review::{Association, Review, ReviewState};

use candidates::{Candidacy, CandidateSet};

#[derive(Error, Debug)]
pub enum EvaluateError {
    #[error("invalid pull request context: {0}")]
    InvalidContext(&'static str),

    #[error("upstream api error: {0}")]
    Upstream(#[from] UpstreamError),
}

/// Decides whether a pull request has collected enough authorized
/// approvals.
///
/// The engine is a pure function of its inputs apart from the permission
/// lookups it issues through the resolver capability; it holds no state
/// across evaluations and never retries upstream failures.
pub struct Engine {
    required: u32,
}

impl Engine {
    pub fn new(required: u32) -> Self {
        Self { required }
    }

    /// Replays `reviews` in submission order to build the candidate set,
    /// then resolves permission levels for active candidates until the
    /// threshold is met or the candidates run out.
    pub async fn evaluate(
        &self,
        ctx: &PullRequestContext,
        reviews: &[Review],
        resolver: &dyn PermissionResolver,
    ) -> Result<AuthorizationResult, EvaluateError> {
        validate_context(ctx)?;

        let candidates = build_candidates(ctx, reviews);

        let mut points: u32 = 0;
        for login in candidates.active() {
            // Threshold already satisfied, further lookups are wasted
            // upstream calls.
            if points >= self.required {
                break;
            }

            let level = resolver
                .get_permission_level(&ctx.owner, &ctx.repo, login)
                .await?;
            debug!("Approver authorization: login '{login}', permission {level:?}");

            if level.authorized() {
                points += 1;
            }
        }

        let result = AuthorizationResult::new(points, self.required, &ctx.head_sha);
        info!(
            "Evaluated {}/{}#{}: {} ({})",
            ctx.owner,
            ctx.repo,
            ctx.number,
            result.conclusion(),
            result.summary()
        );
        Ok(result)
    }
}

fn validate_context(ctx: &PullRequestContext) -> Result<(), EvaluateError> {
    if ctx.owner.is_empty() {
        return Err(EvaluateError::InvalidContext("repository owner is empty"));
    }
    if ctx.repo.is_empty() {
        return Err(EvaluateError::InvalidContext("repository name is empty"));
    }
    if ctx.number == 0 {
        return Err(EvaluateError::InvalidContext(
            "pull request number is missing",
        ));
    }
    if ctx.head_sha.is_empty() {
        return Err(EvaluateError::InvalidContext("head commit sha is empty"));
    }
    Ok(())
}

fn build_candidates(ctx: &PullRequestContext, reviews: &[Review]) -> CandidateSet {
    let mut candidates = CandidateSet::new();

    // The author always starts as a candidate to be checked.
    candidates.set(&ctx.author, Candidacy::Pending);

    for review in reviews {
        let login = review.author.login.as_str();

        // A login without an association can never add or remove
        // candidacy, whatever the review state says.
        if review.author_association == Association::None {
            continue;
        }

        match review.state {
            ReviewState::Commented => continue,
            ReviewState::Approved => {
                debug!(
                    "Review candidate: login '{login}', association {:?}",
                    review.author_association
                );
                candidates.set(login, Candidacy::Approved);
            }
            _ => candidates.set(login, Candidacy::Revoked),
        }
    }

    candidates
}
