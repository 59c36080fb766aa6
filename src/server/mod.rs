mod handlers;
mod response;
mod signature;

use std::sync::Arc;

use actix_web::web::{self, Bytes, Data, PayloadConfig};
use actix_web::{App, HttpRequest, HttpResponse, HttpServer};
use anyhow::{Context, Result};
use chrono::Local;
use log::{info, warn};
use thiserror::Error;

use crate::types::healthz::HealthzResponse;

pub use handlers::WebhookHandler;
use response::Response;

/// Header GitHub names the event type in.
pub const EVENT_HEADER: &str = "X-GitHub-Event";

/// Why an inbound delivery was rejected before reaching the engine.
#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("invalid signature: {0}")]
    InvalidSignature(&'static str),

    #[error("unsupported event '{0}'")]
    UnsupportedEvent(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

pub struct ServerContext {
    pub webhook_handler: WebhookHandler,
}

/// The actix-web server receiving webhook deliveries. Each delivery is an
/// independent unit of work; no decision state is shared between them.
pub struct WebhookServer {
    bind: String,
    ctx: Arc<ServerContext>,

    workers: Option<usize>,
}

impl WebhookServer {
    const WEBHOOK_PATH: &str = "/";
    const HEALTHZ_PATH: &str = "/healthz";

    /// GitHub caps webhook payloads at 25 MiB.
    const PAYLOAD_LIMIT_MIB: usize = 25;

    pub fn new(bind: String, ctx: Arc<ServerContext>) -> Self {
        Self {
            bind,
            ctx,
            workers: None,
        }
    }

    pub fn set_workers(&mut self, workers: usize) {
        self.workers = Some(workers);
    }

    pub async fn run(self) -> Result<()> {
        let ctx = self.ctx.clone();
        let mut srv = HttpServer::new(move || {
            App::new()
                .app_data(Data::new(ctx.clone()))
                .app_data(PayloadConfig::new(Self::PAYLOAD_LIMIT_MIB * 1024 * 1024))
                .route(Self::WEBHOOK_PATH, web::post().to(Self::handle_webhook))
                .route(Self::HEALTHZ_PATH, web::get().to(Self::handle_healthz))
                .default_service(web::route().to(Self::default_handler))
        });

        info!("Binding to http://{}", self.bind);
        srv = srv.bind(&self.bind).context("bind server")?;

        if let Some(workers) = self.workers {
            srv = srv.workers(workers);
        }

        info!("Starting webhook server");
        srv.run().await.context("run server")?;

        info!("Server stopped");
        Ok(())
    }

    async fn handle_webhook(
        req: HttpRequest,
        body: Bytes,
        ctx: Data<Arc<ServerContext>>,
    ) -> HttpResponse {
        ctx.webhook_handler.handle(&req, &body).await.into()
    }

    async fn handle_healthz(_req: HttpRequest) -> HttpResponse {
        let now = Local::now().timestamp() as u64;
        Response::json(HealthzResponse {
            now,
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        })
        .into()
    }

    async fn default_handler(req: HttpRequest) -> HttpResponse {
        let path = req.uri().path().to_string();
        let method = req.method().as_str().to_string();
        warn!("No route to {method} {path}");
        Response::not_found(format!("No route to {method} {path}")).into()
    }
}
