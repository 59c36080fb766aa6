use actix_web::HttpRequest;
use anyhow::{Context, Result};
use log::{error, info, warn};

use crate::config::Config;
use crate::engine::{Engine, EvaluateError};
use crate::github::app::AppAuth;
use crate::github::{CheckReporter, PermissionResolver};
use crate::types::check::AuthorizationResult;
use crate::types::context::PullRequestContext;
use crate::types::event::{PullRequestReviewEvent, PULL_REQUEST_REVIEW_EVENT};

use super::response::Response;
use super::signature::{self, SIGNATURE_HEADER};
use super::{WebhookError, EVENT_HEADER};

/// Handles one webhook delivery end to end: signature check, event
/// dispatch, evaluation, check run publication.
pub struct WebhookHandler {
    engine: Engine,
    auth: AppAuth,
    secret_token: String,
}

impl WebhookHandler {
    pub fn new(cfg: &Config) -> Result<Self> {
        let auth = AppAuth::new(
            cfg.github.app_id,
            &cfg.github.private_key_path,
            &cfg.github.api_url,
        )
        .context("init github app auth")?;

        Ok(Self {
            engine: Engine::new(cfg.min_reviews_required),
            auth,
            secret_token: cfg.github.secret_token.clone(),
        })
    }

    pub async fn handle(&self, req: &HttpRequest, body: &[u8]) -> Response {
        let event = match self.parse_event(req, body) {
            Ok(event) => event,
            Err(err) => {
                warn!("Rejecting delivery: {err}");
                return Response::bad_request(err.to_string());
            }
        };

        let ctx = PullRequestContext::from_event(&event);
        info!(
            "Handling review event for {}/{}#{} (action {:?})",
            ctx.owner, ctx.repo, ctx.number, event.action
        );

        match self.run_check(&ctx).await {
            Ok(_) => Response::ok(),
            Err(EvaluateError::InvalidContext(reason)) => {
                warn!("Invalid pull request context: {reason}");
                Response::bad_request(reason)
            }
            Err(err) => {
                // GitHub redelivery is the retry mechanism, answer 500 and
                // let the host try again.
                error!("Error handling webhook: {err:#}");
                Response::error("Error handling webhook")
            }
        }
    }

    /// Authenticates and parses the raw delivery. Anything that fails here
    /// never reaches the engine.
    fn parse_event(
        &self,
        req: &HttpRequest,
        body: &[u8],
    ) -> Result<PullRequestReviewEvent, WebhookError> {
        let header = Self::header(req, SIGNATURE_HEADER)
            .ok_or(WebhookError::InvalidSignature("missing signature header"))?;
        signature::verify(&self.secret_token, body, &header)?;

        let event_name = Self::header(req, EVENT_HEADER).unwrap_or_default();
        if event_name != PULL_REQUEST_REVIEW_EVENT {
            return Err(WebhookError::UnsupportedEvent(event_name));
        }

        Ok(serde_json::from_slice(body)?)
    }

    async fn run_check(
        &self,
        ctx: &PullRequestContext,
    ) -> Result<AuthorizationResult, EvaluateError> {
        let client = self.auth.installation_client(ctx.installation_id).await?;

        let reviews = client.list_reviews(&ctx.owner, &ctx.repo, ctx.number).await?;
        let result = self.engine.evaluate(ctx, &reviews, &client).await?;

        client.publish(ctx, &result).await?;
        Ok(result)
    }

    fn header(req: &HttpRequest, name: &str) -> Option<String> {
        req.headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string())
    }
}
