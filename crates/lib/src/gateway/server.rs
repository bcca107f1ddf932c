//! Gateway HTTP server: webhook intake, run acceptance, and the worker that
//! drives orchestration runs.
//!
//! The intake handler is synchronous to the caller only for signature
//! verification and decoding; everything after that happens on the worker,
//! so the 200 means "accepted", not "replied".

use crate::channels::{CandidateSource, GourmetClient, LineClient, ReplyTransport};
use crate::config::{self, Config};
use crate::orchestrator::{Orchestrator, RetryPolicy, RunRecord, RunStore};
use crate::signature;
use crate::webhook;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;

const SIGNATURE_HEADER: &str = "X-Line-Signature";

/// Shared state for the gateway (config, secret, run store, worker queue).
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    channel_secret: Arc<String>,
    store: Arc<RunStore>,
    run_tx: mpsc::Sender<RunRecord>,
}

/// Run the gateway server; binds to config.gateway.bind:config.gateway.port.
/// Fails fast when the channel secret, access token, or lookup base URL is
/// not configured. Blocks until shutdown (Ctrl+C or SIGTERM).
pub async fn run_gateway(config: Config) -> Result<()> {
    let channel_secret = config::resolve_channel_secret(&config)
        .context("channel secret not configured (set line.channelSecret or LINE_CHANNEL_SECRET)")?;
    let access_token = config::resolve_access_token(&config)
        .context("access token not configured (set line.accessToken or LINE_ACCESS_TOKEN)")?;
    let gourmet_url = config
        .gourmet
        .base_url
        .clone()
        .context("lookup service not configured (set gourmet.baseUrl)")?;

    let store = Arc::new(RunStore::new(config::resolve_runs_dir(&config)));
    let transport: Arc<dyn ReplyTransport> =
        Arc::new(LineClient::new(access_token, config.line.reply_url.clone()));
    let candidates: Arc<dyn CandidateSource> = Arc::new(GourmetClient::new(gourmet_url));
    let orchestrator = Arc::new(Orchestrator::new(
        store.clone(),
        transport,
        candidates,
        RetryPolicy::default(),
    ));

    // Resume runs a previous process left incomplete.
    let pending = store.load_incomplete().await;
    if !pending.is_empty() {
        log::info!("resuming {} incomplete run(s)", pending.len());
    }
    for run in pending {
        let orch = orchestrator.clone();
        tokio::spawn(async move {
            orch.drive(run).await;
        });
    }

    // Worker: one independent task per accepted run; runs share no mutable
    // state, so they need no coordination.
    let (run_tx, mut run_rx) = mpsc::channel::<RunRecord>(64);
    {
        let orch = orchestrator.clone();
        tokio::spawn(async move {
            while let Some(run) = run_rx.recv().await {
                let orch = orch.clone();
                tokio::spawn(async move {
                    orch.drive(run).await;
                });
            }
        });
    }

    let state = GatewayState {
        config: Arc::new(config.clone()),
        channel_secret: Arc::new(channel_secret),
        store,
        run_tx,
    };

    let app = Router::new()
        .route("/", get(health_http))
        .route("/line/webhook", post(line_webhook))
        .with_state(state);

    let bind_addr = format!("{}:{}", config.gateway.bind.trim(), config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received");
}

/// POST /line/webhook: verify the signature over the exact raw bytes, decode,
/// persist a run for the first event, and hand it to the worker. 200 means the
/// delivery was accepted; replies happen asynchronously.
async fn line_webhook(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let presented = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if !signature::verify_signature(&body, presented, &state.channel_secret) {
        log::info!("webhook: signature verification failed");
        return StatusCode::BAD_REQUEST;
    }

    let envelope = match webhook::decode_envelope(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            log::info!("webhook: decode failed: {}", e);
            return StatusCode::BAD_REQUEST;
        }
    };

    // Policy: process the first event only; the rest of the delivery is
    // counted and dropped.
    let mut events = envelope.events.into_iter();
    let Some(event) = events.next() else {
        log::debug!("webhook: delivery with no events");
        return StatusCode::OK;
    };
    let dropped = events.count();
    if dropped > 0 {
        log::info!(
            "webhook: processing first event only, dropping {} additional event(s)",
            dropped
        );
    }

    let run = RunRecord::new(event);
    log::info!("webhook: accepted delivery as {}", run.id);
    // Persist before answering 200: accepted runs survive a crash. On write
    // failure answer 500 so the platform redelivers.
    if let Err(e) = state.store.save(&run).await {
        log::warn!("webhook: persisting {} failed: {}", run.id, e);
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    if state.run_tx.send(run).await.is_err() {
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    StatusCode::OK
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.config.gateway.port,
    }))
}
