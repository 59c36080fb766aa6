use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use rand::Rng;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::time;

use crate::types::check::{AuthorizationResult, CreateCheckRun};
use crate::types::context::PullRequestContext;
use crate::types::permission::{PermissionLevel, PermissionResponse};
use crate::types::review::Review;

use super::{CheckReporter, PermissionResolver, UpstreamError};

pub const MIME_GITHUB_JSON: &str = "application/vnd.github+json";
pub const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
pub const API_VERSION: &str = "2022-11-28";

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE_MILLIS: u64 = 500;

/// GitHub REST client scoped to one installation token. Implements both
/// collaborator contracts the engine depends on.
#[derive(Debug, Clone)]
pub struct RestClient {
    api_url: String,
    client: reqwest::Client,
    token: String,
}

impl RestClient {
    const PER_PAGE: usize = 100;

    pub fn new(api_url: &str, client: reqwest::Client, token: String) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            client,
            token,
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.api_url, path);
        self.client
            .request(method, url)
            .header(ACCEPT, MIME_GITHUB_JSON)
            .header(API_VERSION_HEADER, API_VERSION)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, UpstreamError> {
        let resp = send_with_retry(|| self.request(Method::GET, path).query(query)).await?;
        resp.json()
            .await
            .map_err(|err| UpstreamError::Decode(format!("'{path}' response: {err}")))
    }
}

/// Sends the request built by `build`, retrying transient failures
/// (connect/timeout errors, 429 and 5xx responses) with exponential
/// backoff and jitter. Everything else surfaces immediately.
pub(crate) async fn send_with_retry<F>(build: F) -> Result<Response, UpstreamError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match build().send().await {
            Ok(resp) if resp.status().is_success() => return Ok(resp),
            Ok(resp) => {
                let status = resp.status();
                if attempt < MAX_ATTEMPTS && retryable_status(status) {
                    let delay = backoff(attempt);
                    warn!(
                        "GitHub returned status {status}, retrying in {}ms (attempt {attempt})",
                        delay.as_millis()
                    );
                    time::sleep(delay).await;
                    continue;
                }
                let message = resp.text().await.unwrap_or_default();
                return Err(UpstreamError::Status {
                    status: status.as_u16(),
                    message: truncate_message(message),
                });
            }
            Err(err) if attempt < MAX_ATTEMPTS && retryable_error(&err) => {
                let delay = backoff(attempt);
                warn!(
                    "GitHub request error: {err}, retrying in {}ms (attempt {attempt})",
                    delay.as_millis()
                );
                time::sleep(delay).await;
            }
            Err(err) => return Err(UpstreamError::Transport(err)),
        }
    }
}

#[async_trait]
impl PermissionResolver for RestClient {
    async fn list_reviews(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<Review>, UpstreamError> {
        let path = format!("repos/{owner}/{repo}/pulls/{number}/reviews");

        // A single page is not enough; a truncated review list would make
        // the candidacy replay see a stale last state for a login.
        let mut reviews = Vec::new();
        let mut page = 1usize;
        loop {
            let query = [
                ("per_page", Self::PER_PAGE.to_string()),
                ("page", page.to_string()),
            ];
            let batch: Vec<Review> = self.get_json(&path, &query).await?;
            let len = batch.len();
            reviews.extend(batch);
            if len < Self::PER_PAGE {
                break;
            }
            page += 1;
        }

        debug!("Listed {} reviews for {owner}/{repo}#{number}", reviews.len());
        Ok(reviews)
    }

    async fn get_permission_level(
        &self,
        owner: &str,
        repo: &str,
        login: &str,
    ) -> Result<PermissionLevel, UpstreamError> {
        let path = format!("repos/{owner}/{repo}/collaborators/{login}/permission");
        let resp: PermissionResponse = self.get_json(&path, &[]).await?;
        debug!("Permission level of '{login}' in {owner}/{repo}: {:?}", resp.permission);
        Ok(resp.permission)
    }
}

#[async_trait]
impl CheckReporter for RestClient {
    async fn publish(
        &self,
        ctx: &PullRequestContext,
        result: &AuthorizationResult,
    ) -> Result<(), UpstreamError> {
        let path = format!("repos/{}/{}/check-runs", ctx.owner, ctx.repo);
        let check = CreateCheckRun::from_result(result);

        send_with_retry(|| self.request(Method::POST, &path).json(&check)).await?;

        info!(
            "Published check run '{}' for {}/{}@{}",
            result.conclusion(),
            ctx.owner,
            ctx.repo,
            result.head_sha
        );
        Ok(())
    }
}

fn retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

fn backoff(attempt: u32) -> Duration {
    let base = BACKOFF_BASE_MILLIS * 2u64.pow(attempt.saturating_sub(1));
    let jitter = rand::thread_rng().gen_range(0..BACKOFF_BASE_MILLIS);
    Duration::from_millis(base + jitter)
}

fn truncate_message(message: String) -> String {
    const MAX_LEN: usize = 512;
    if message.len() > MAX_LEN {
        let mut end = MAX_LEN;
        while !message.is_char_boundary(end) {
            end -= 1;
        }
        message[..end].to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use actix_web::{web, HttpResponse};

    use crate::github::testutil::start_server;
    use crate::types::review::ReviewState;

    use super::*;

    #[test]
    fn test_retryable_status() {
        assert!(retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(retryable_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(retryable_status(StatusCode::BAD_GATEWAY));

        assert!(!retryable_status(StatusCode::NOT_FOUND));
        assert!(!retryable_status(StatusCode::FORBIDDEN));
        assert!(!retryable_status(StatusCode::UNPROCESSABLE_ENTITY));
    }

    #[test]
    fn test_backoff_bounds() {
        for attempt in 1u32..=3 {
            let base = BACKOFF_BASE_MILLIS * 2u64.pow(attempt - 1);
            let delay = backoff(attempt).as_millis() as u64;
            assert!(delay >= base);
            assert!(delay < base + BACKOFF_BASE_MILLIS);
        }
    }

    #[test]
    fn test_truncate_message() {
        assert_eq!(truncate_message(String::from("short")), "short");

        let long = "x".repeat(2048);
        assert_eq!(truncate_message(long).len(), 512);
    }

    fn review_json(login: &str, state: &str) -> serde_json::Value {
        serde_json::json!({
            "user": {"login": login},
            "state": state,
            "author_association": "MEMBER"
        })
    }

    #[derive(serde::Deserialize)]
    struct Pagination {
        page: usize,
        per_page: usize,
    }

    #[actix_web::test]
    async fn test_list_reviews_follows_pagination() {
        // A full first page must trigger a fetch of the second; the
        // second page carries a later revoking review for a login from
        // the first page, the case truncation would miss.
        async fn reviews(query: web::Query<Pagination>) -> HttpResponse {
            assert_eq!(query.per_page, 100);
            let items: Vec<serde_json::Value> = match query.page {
                1 => (0..100)
                    .map(|i| review_json(&format!("r{i}"), "APPROVED"))
                    .collect(),
                2 => vec![
                    review_json("r100", "APPROVED"),
                    review_json("r0", "CHANGES_REQUESTED"),
                ],
                _ => Vec::new(),
            };
            HttpResponse::Ok().json(items)
        }

        let (url, handle) = start_server(|cfg| {
            cfg.route(
                "/repos/octo-org/hello-world/pulls/42/reviews",
                web::get().to(reviews),
            );
        })
        .await;

        let client = RestClient::new(&url, reqwest::Client::new(), String::from("test-token"));
        let reviews = client
            .list_reviews("octo-org", "hello-world", 42)
            .await
            .unwrap();

        assert_eq!(reviews.len(), 102);
        assert_eq!(reviews[0].author.login, "r0");
        assert_eq!(reviews[0].state, ReviewState::Approved);
        assert_eq!(reviews[101].author.login, "r0");
        assert_eq!(reviews[101].state, ReviewState::ChangesRequested);

        handle.stop(true).await;
    }

    #[actix_web::test]
    async fn test_short_first_page_stops_traversal() {
        let hits = Arc::new(AtomicUsize::new(0));
        let state = hits.clone();
        let (url, handle) = start_server(move |cfg| {
            cfg.app_data(web::Data::new(state.clone()));
            cfg.route(
                "/repos/o/r/pulls/1/reviews",
                web::get().to(|hits: web::Data<Arc<AtomicUsize>>| async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    HttpResponse::Ok().json(vec![review_json("alice", "APPROVED")])
                }),
            );
        })
        .await;

        let client = RestClient::new(&url, reqwest::Client::new(), String::from("test-token"));
        let reviews = client.list_reviews("o", "r", 1).await.unwrap();

        assert_eq!(reviews.len(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        handle.stop(true).await;
    }

    #[actix_web::test]
    async fn test_retries_transient_status() {
        let hits = Arc::new(AtomicUsize::new(0));
        let state = hits.clone();
        let (url, handle) = start_server(move |cfg| {
            cfg.app_data(web::Data::new(state.clone()));
            cfg.route(
                "/repos/o/r/collaborators/alice/permission",
                web::get().to(|hits: web::Data<Arc<AtomicUsize>>| async move {
                    if hits.fetch_add(1, Ordering::SeqCst) == 0 {
                        HttpResponse::BadGateway().finish()
                    } else {
                        HttpResponse::Ok().json(serde_json::json!({"permission": "admin"}))
                    }
                }),
            );
        })
        .await;

        let client = RestClient::new(&url, reqwest::Client::new(), String::from("test-token"));
        let level = client.get_permission_level("o", "r", "alice").await.unwrap();

        assert_eq!(level, PermissionLevel::Admin);
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        handle.stop(true).await;
    }

    #[actix_web::test]
    async fn test_non_retryable_status_fails_fast() {
        let hits = Arc::new(AtomicUsize::new(0));
        let state = hits.clone();
        let (url, handle) = start_server(move |cfg| {
            cfg.app_data(web::Data::new(state.clone()));
            cfg.route(
                "/repos/o/r/collaborators/ghost/permission",
                web::get().to(|hits: web::Data<Arc<AtomicUsize>>| async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    HttpResponse::NotFound().body("Not Found")
                }),
            );
        })
        .await;

        let client = RestClient::new(&url, reqwest::Client::new(), String::from("test-token"));
        let result = client.get_permission_level("o", "r", "ghost").await;

        match result {
            Err(UpstreamError::Status { status, .. }) => assert_eq!(status, 404),
            other => panic!("expected status error, got {other:?}"),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        handle.stop(true).await;
    }
}
