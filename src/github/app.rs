use std::fs;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use log::debug;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};

use super::api::{self, RestClient, API_VERSION, API_VERSION_HEADER, MIME_GITHUB_JSON};
use super::UpstreamError;

/// App JWT claims, RFC 7519 registered names.
#[derive(Debug, Serialize)]
struct AppClaims {
    iat: i64,
    exp: i64,
    iss: String,
}

#[derive(Debug, Deserialize)]
struct InstallationToken {
    token: String,
}

/// GitHub App identity. Signs short-lived RS256 JWTs with the app private
/// key and exchanges them for installation tokens, one per webhook
/// delivery.
pub struct AppAuth {
    app_id: u64,
    key: EncodingKey,
    api_url: String,
    client: reqwest::Client,
}

impl AppAuth {
    /// GitHub caps app JWT lifetime at 10 minutes.
    const JWT_LIFETIME_SECS: i64 = 600;

    /// Issued-at is backdated to tolerate clock drift against GitHub.
    const JWT_BACKDATE_SECS: i64 = 60;

    const REQUEST_TIMEOUT_SECS: u64 = 30;

    pub fn new(app_id: u64, private_key_path: &str, api_url: &str) -> Result<Self> {
        let pem = fs::read(private_key_path)
            .with_context(|| format!("read private key file '{private_key_path}'"))?;
        let key = EncodingKey::from_rsa_pem(&pem).context("parse RSA private key")?;

        let client = reqwest::Client::builder()
            .user_agent(format!("reviewbot/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(Self::REQUEST_TIMEOUT_SECS))
            .build()
            .context("build github http client")?;

        Ok(Self {
            app_id,
            key,
            api_url: api_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn app_jwt(&self) -> Result<String, UpstreamError> {
        let now = Utc::now().timestamp();
        let claims = AppClaims {
            iat: now - Self::JWT_BACKDATE_SECS,
            exp: now + Self::JWT_LIFETIME_SECS,
            iss: self.app_id.to_string(),
        };

        encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|err| UpstreamError::Auth(format!("sign app jwt: {err}")))
    }

    async fn installation_token(&self, installation_id: u64) -> Result<String, UpstreamError> {
        let jwt = self.app_jwt()?;
        let url = format!(
            "{}/app/installations/{installation_id}/access_tokens",
            self.api_url
        );

        // Token minting sits on the same delivery path as every other
        // upstream call, so it gets the same bounded-retry treatment.
        let resp = api::send_with_retry(|| {
            self.client
                .post(&url)
                .bearer_auth(&jwt)
                .header(ACCEPT, MIME_GITHUB_JSON)
                .header(API_VERSION_HEADER, API_VERSION)
        })
        .await?;

        let token: InstallationToken = resp
            .json()
            .await
            .map_err(|err| UpstreamError::Decode(format!("installation token: {err}")))?;

        debug!("Minted installation token for installation {installation_id}");
        Ok(token.token)
    }

    /// A REST client authenticated as the given installation.
    pub async fn installation_client(
        &self,
        installation_id: u64,
    ) -> Result<RestClient, UpstreamError> {
        let token = self.installation_token(installation_id).await?;
        Ok(RestClient::new(&self.api_url, self.client.clone(), token))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use actix_web::{web, HttpResponse};

    use crate::github::testutil::{start_server, write_test_key};

    use super::*;

    #[actix_web::test]
    async fn test_installation_token_retries() {
        let hits = Arc::new(AtomicUsize::new(0));
        let state = hits.clone();
        let (url, handle) = start_server(move |cfg| {
            cfg.app_data(web::Data::new(state.clone()));
            cfg.route(
                "/app/installations/7/access_tokens",
                web::post().to(|hits: web::Data<Arc<AtomicUsize>>| async move {
                    if hits.fetch_add(1, Ordering::SeqCst) == 0 {
                        HttpResponse::ServiceUnavailable().finish()
                    } else {
                        HttpResponse::Created().json(serde_json::json!({
                            "token": "ghs_test",
                            "expires_at": "2026-01-01T00:00:00Z"
                        }))
                    }
                }),
            );
        })
        .await;

        let key_path = write_test_key("app-retry");
        let auth = AppAuth::new(169668, key_path.to_str().unwrap(), &url).unwrap();

        auth.installation_client(7).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        fs::remove_file(key_path).ok();
        handle.stop(true).await;
    }

    #[actix_web::test]
    async fn test_installation_token_auth_failure() {
        let (url, handle) = start_server(|cfg| {
            cfg.route(
                "/app/installations/7/access_tokens",
                web::post().to(|| async { HttpResponse::Unauthorized().body("Bad credentials") }),
            );
        })
        .await;

        let key_path = write_test_key("app-denied");
        let auth = AppAuth::new(169668, key_path.to_str().unwrap(), &url).unwrap();

        let result = auth.installation_client(7).await;
        match result {
            Err(UpstreamError::Status { status, .. }) => assert_eq!(status, 401),
            other => panic!("expected status error, got {:?}", other.map(|_| ())),
        }

        fs::remove_file(key_path).ok();
        handle.stop(true).await;
    }
}
