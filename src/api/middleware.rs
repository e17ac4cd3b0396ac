//! Cross-cutting HTTP layers: CORS, security headers, rate limiting and error rendering

use std::any::Any;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    error_handling::HandleErrorLayer,
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    BoxError, Json, Router,
};
use tower::{
    timeout::{error::Elapsed, TimeoutLayer},
    ServiceBuilder,
};
use tower_governor::{governor::GovernorConfigBuilder, key_extractor::PeerIpKeyExtractor, GovernorLayer};
use tower_http::{
    cors::{AllowOrigin, Any as AnyOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
};

use crate::{
    config::{AppConfig, RateLimitConfig},
    error::{AppError, ErrorDetail, ErrorResponse},
    AppState,
};

const ALLOWED_METHODS: [Method; 6] = [
    Method::GET,
    Method::HEAD,
    Method::PUT,
    Method::PATCH,
    Method::POST,
    Method::DELETE,
];

/// Any origin outside production, the configured list in production
pub fn cors_layer(config: &AppConfig) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(ALLOWED_METHODS);

    if !config.is_production() {
        return cors.allow_origin(AnyOrigin).allow_headers(AnyOrigin);
    }

    let origins: Vec<HeaderValue> = config
        .cors
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    cors.allow_origin(AllowOrigin::list(origins))
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

fn security_header_values() -> Vec<(HeaderName, HeaderValue)> {
    vec![
        (
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(
                "default-src 'self';base-uri 'self';font-src 'self' https: data:;form-action 'self';\
                 frame-ancestors 'self';img-src 'self' data:;object-src 'none';script-src 'self';\
                 script-src-attr 'none';style-src 'self' https: 'unsafe-inline';upgrade-insecure-requests",
            ),
        ),
        (
            HeaderName::from_static("cross-origin-opener-policy"),
            HeaderValue::from_static("same-origin"),
        ),
        (
            HeaderName::from_static("cross-origin-resource-policy"),
            HeaderValue::from_static("same-origin"),
        ),
        (HeaderName::from_static("origin-agent-cluster"), HeaderValue::from_static("?1")),
        (header::REFERRER_POLICY, HeaderValue::from_static("no-referrer")),
        (
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=15552000; includeSubDomains"),
        ),
        (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        (header::X_DNS_PREFETCH_CONTROL, HeaderValue::from_static("off")),
        (HeaderName::from_static("x-download-options"), HeaderValue::from_static("noopen")),
        (header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN")),
        (
            HeaderName::from_static("x-permitted-cross-domain-policies"),
            HeaderValue::from_static("none"),
        ),
        (header::X_XSS_PROTECTION, HeaderValue::from_static("0")),
    ]
}

/// Add the security headers to every response that does not set them itself
pub fn security_headers(router: Router) -> Router {
    security_header_values()
        .into_iter()
        .fold(router, |router, (name, value)| {
            router.layer(SetResponseHeaderLayer::if_not_present(name, value))
        })
}

/// Per-client rate limiting: `max_requests` per `window_ms`, keyed by the peer address.
///
/// Forwarded-for headers are ignored; the router must be served with
/// `ConnectInfo<SocketAddr>`.
pub fn rate_limit(router: Router, config: &RateLimitConfig) -> Router {
    if !config.enabled {
        return router;
    }

    let max_requests = config.max_requests.max(1);
    let replenish_ms = (config.window_ms / u64::from(max_requests)).max(1);

    let Some(governor) = GovernorConfigBuilder::default()
        .per_millisecond(replenish_ms)
        .burst_size(max_requests)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
    else {
        tracing::warn!("Invalid rate limit configuration, rate limiting disabled");
        return router;
    };
    let governor = Arc::new(governor);

    let limiter = governor.limiter().clone();
    let sweep = Arc::new(Sweep::new(SWEEP_INTERVAL));
    let message = rate_limited_message(config.window_ms);

    tracing::info!(
        window_ms = config.window_ms,
        max_requests,
        "Rate limiting enabled"
    );
    router
        .layer(GovernorLayer { config: governor })
        .layer(axum::middleware::from_fn(move |request: Request, next: Next| {
            let limiter = limiter.clone();
            let sweep = sweep.clone();
            let message = message.clone();
            async move {
                if sweep.is_due() {
                    limiter.retain_recent();
                }
                render_rate_limited(request, next, &message).await
            }
        }))
}

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

fn rate_limited_message(window_ms: u64) -> String {
    let minutes = window_ms / 60_000;
    if minutes > 0 {
        format!("Too many requests from this IP, please try again after {} minutes", minutes)
    } else {
        "Too many requests from this IP, please try again later".to_string()
    }
}

/// Throttles the cleanup of idle rate limiter keys to one pass per interval
struct Sweep {
    started: Instant,
    interval_ms: u64,
    last_ms: AtomicU64,
}

impl Sweep {
    fn new(interval: Duration) -> Self {
        Self {
            started: Instant::now(),
            interval_ms: interval.as_millis() as u64,
            last_ms: AtomicU64::new(0),
        }
    }

    fn is_due(&self) -> bool {
        let now = self.started.elapsed().as_millis() as u64;
        let last = self.last_ms.load(Ordering::Relaxed);
        now.saturating_sub(last) >= self.interval_ms
            && self
                .last_ms
                .compare_exchange(last, now, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
    }
}

/// Replace the limiter's plain-text rejection with a structured error body
async fn render_rate_limited(request: Request, next: Next, message: &str) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let response = next.run(request).await;
    if response.status() != StatusCode::TOO_MANY_REQUESTS || response.extensions().get::<ErrorDetail>().is_some() {
        return response;
    }

    match peer {
        Some(ip) => tracing::warn!(%ip, "Rate limit exceeded for IP"),
        None => tracing::warn!("Rate limit exceeded for unknown peer"),
    }

    let mut rejected = AppError::RateLimited(message.to_string()).into_response();
    for name in [header::RETRY_AFTER, HeaderName::from_static("x-ratelimit-after")] {
        if let Some(value) = response.headers().get(&name) {
            rejected.headers_mut().insert(name, value.clone());
        }
    }
    rejected
}

/// Fail requests that run longer than `timeout` with a structured 408
pub fn request_timeout(router: Router, timeout: Duration) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_timeout))
            .layer(TimeoutLayer::new(timeout)),
    )
}

async fn handle_timeout(error: BoxError) -> AppError {
    if error.is::<Elapsed>() {
        AppError::Timeout("Request timed out".to_string())
    } else {
        AppError::Internal(format!("Unhandled middleware error: {}", error))
    }
}

/// Fold the diagnostic detail of error responses into their body outside production
pub async fn error_detail(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    let Some(ErrorDetail { body, detail }) = response.extensions_mut().remove::<ErrorDetail>() else {
        return response;
    };
    if state.config.is_production() {
        return response;
    }

    let status = response.status();
    let body = ErrorResponse {
        detail: Some(detail),
        ..body
    };
    (status, Json(body)).into_response()
}

/// Render a handler panic as a generic internal error
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown panic".to_string()
    };

    AppError::Internal(format!("Handler panicked: {}", message)).into_response()
}
