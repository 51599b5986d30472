//! HTTP front end.
//!
//! Every path and method lands on one catch-all handler that hands the raw
//! request to the [`Dispatcher`].  The only routing decision the relay makes
//! is by method, and that belongs to the dispatcher.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{ConnectInfo, DefaultBodyLimit, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::Response;
use axum::Router;
use tokio::task::JoinHandle;

use crate::config::RelayConfig;
use crate::dispatch::Dispatcher;
use crate::limiter::RateLimiter;
use crate::request::InputError;

/// Identifier used when no header or peer address is available.
pub const UNKNOWN_CLIENT: &str = "unknown";

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the relay router.
///
/// Bodies are capped at `max_request_bytes`.  An oversized or unreadable
/// body still goes through the dispatcher, which answers it as a caller
/// input error in the relay's JSON shape.
pub fn build_router(dispatcher: Arc<Dispatcher>, max_request_bytes: usize) -> Router {
    Router::new()
        .fallback(relay)
        .layer(DefaultBodyLimit::max(max_request_bytes))
        .with_state(dispatcher)
}

async fn relay(
    State(dispatcher): State<Arc<Dispatcher>>,
    method: Method,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let client_id = client_identifier(&headers, peer.map(|ConnectInfo(addr)| addr));
    let body = body.as_deref().map_err(body_error);
    dispatcher.handle_body(&method, &client_id, body).await
}

/// Only an image can push a body past the cap, so an over-limit body is
/// reported as an oversized image.
fn body_error(rejection: &BytesRejection) -> InputError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        log::info!("request body over the size limit");
        InputError::ImageTooLarge
    } else {
        log::warn!("failed to read request body: {}", rejection.body_text());
        InputError::UnreadableBody
    }
}

/// Rate-limit key for a request.
///
/// First entry of `x-forwarded-for`, else `client-ip`, else the peer IP,
/// else [`UNKNOWN_CLIENT`].  Headers are trusted as set by the edge proxy.
pub fn client_identifier(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    header_value("x-forwarded-for")
        .or_else(|| header_value("client-ip"))
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

// ---------------------------------------------------------------------------
// Limiter eviction
// ---------------------------------------------------------------------------

/// Periodically drop expired limiter windows so the map stays bounded by
/// the number of recently active clients.
pub fn spawn_sweeper(limiter: Arc<RateLimiter>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = limiter.sweep(Instant::now());
            if removed > 0 {
                log::debug!("limiter sweep: evicted {removed}, {} active", limiter.len());
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Serve
// ---------------------------------------------------------------------------

/// Bind, serve until Ctrl-C, then drain in-flight requests.
pub async fn serve(config: RelayConfig) -> Result<()> {
    let dispatcher = Arc::new(Dispatcher::from_config(&config));
    let sweeper = spawn_sweeper(
        Arc::clone(dispatcher.limiter()),
        config.limits.sweep_interval(),
    );
    let app = build_router(dispatcher, config.server.max_request_bytes);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;
    let addr = listener.local_addr()?;

    log::info!(
        "relay listening on {addr} (model={}, limit={} per {}s)",
        config.upstream.model,
        config.limits.capacity,
        config.limits.window_secs
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("relay server error")?;

    sweeper.abort();
    log::info!("relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("shutdown signal received"),
        Err(e) => log::error!("failed to listen for shutdown signal: {e}"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn forwarded_for_first_entry_wins() {
        let map = headers(&[
            ("x-forwarded-for", "203.0.113.7, 10.0.0.2"),
            ("client-ip", "198.51.100.1"),
        ]);
        let peer: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        assert_eq!(client_identifier(&map, Some(peer)), "203.0.113.7");
    }

    #[test]
    fn client_ip_header_is_second_choice() {
        let map = headers(&[("client-ip", "198.51.100.1")]);
        assert_eq!(client_identifier(&map, None), "198.51.100.1");
    }

    #[test]
    fn blank_forwarded_for_is_ignored() {
        let map = headers(&[("x-forwarded-for", " "), ("client-ip", "198.51.100.1")]);
        assert_eq!(client_identifier(&map, None), "198.51.100.1");
    }

    #[test]
    fn peer_address_then_unknown() {
        let peer: SocketAddr = "192.0.2.4:41000".parse().unwrap();
        assert_eq!(client_identifier(&HeaderMap::new(), Some(peer)), "192.0.2.4");
        assert_eq!(client_identifier(&HeaderMap::new(), None), UNKNOWN_CLIENT);
    }

    #[tokio::test]
    async fn sweeper_evicts_expired_windows() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(10), 30));
        limiter.allow("a");
        assert_eq!(limiter.len(), 1);

        let handle = spawn_sweeper(Arc::clone(&limiter), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(limiter.is_empty());
        handle.abort();
    }
}
