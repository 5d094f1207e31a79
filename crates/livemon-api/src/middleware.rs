//! Request middleware: per-IP rate limiting, security headers and CORS.
//!
//! # Rate limiting
//!
//! [`RateLimiter`] keeps one fixed window per client key. The first request
//! from a key opens a window of `window_ms`; up to `max_requests` requests
//! are admitted inside it and the rest get `429` with the seconds left in
//! the window. Windows that have ended are pruned on the next check, so
//! the table only holds clients seen recently.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderName, HeaderValue, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use livemon_core::config::RateLimitConfig;
use tokio::sync::Mutex;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// Key used when the peer address is not available.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Outcome of one [`RateLimiter::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// The request fits in the current window.
    Allowed {
        /// Requests left in the window after this one.
        remaining: u32,
    },
    /// The window is exhausted.
    Limited {
        /// Whole seconds until the window ends, at least 1.
        retry_after_secs: u64,
    },
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: i64,
    count: u32,
}

/// Fixed-window request counter keyed by client.
#[derive(Debug)]
pub struct RateLimiter {
    window_ms: i64,
    max_requests: u32,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    /// Limiter with the configured window and budget.
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            window_ms: i64::try_from(config.window_ms).unwrap_or(i64::MAX),
            max_requests: config.max_requests,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Requests admitted per window.
    pub const fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Count one request from `key` at `now` (epoch millis).
    pub async fn check(&self, key: &str, now: i64) -> RateDecision {
        let mut windows = self.windows.lock().await;
        windows.retain(|_, w| now.saturating_sub(w.started_at) < self.window_ms);

        let window = windows.entry(key.to_owned()).or_insert(Window {
            started_at: now,
            count: 0,
        });

        if window.count >= self.max_requests {
            let ends_at = window.started_at.saturating_add(self.window_ms);
            let left_ms = u64::try_from(ends_at.saturating_sub(now)).unwrap_or(0);
            return RateDecision::Limited {
                retry_after_secs: left_ms.div_ceil(1000).max(1),
            };
        }

        window.count = window.count.saturating_add(1);
        RateDecision::Allowed {
            remaining: self.max_requests.saturating_sub(window.count),
        }
    }

    /// Number of clients with an open window.
    pub async fn tracked_clients(&self) -> usize {
        self.windows.lock().await.len()
    }
}

/// Axum middleware applying [`AppState::rate_limiter`] to the wrapped routes.
pub async fn rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let key = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| UNKNOWN_CLIENT.to_owned(), |info| info.0.ip().to_string());

    match state.rate_limiter.check(&key, state.hub.now()).await {
        RateDecision::Allowed { remaining } => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert(
                HeaderName::from_static("ratelimit-limit"),
                state.rate_limiter.max_requests().into(),
            );
            headers.insert(
                HeaderName::from_static("ratelimit-remaining"),
                remaining.into(),
            );
            response
        }
        RateDecision::Limited { retry_after_secs } => {
            debug!(client = %key, retry_after_secs, "Rate limit exceeded");
            ApiError::RateLimited { retry_after_secs }.into_response()
        }
    }
}

/// Add the fixed security headers to every response from `router`.
///
/// Handlers that already set one of these headers keep their value.
pub fn with_security_headers(router: Router) -> Router {
    router
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_XSS_PROTECTION,
            HeaderValue::from_static("0"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("cross-origin-resource-policy"),
            HeaderValue::from_static("same-origin"),
        ))
}

/// CORS layer for the configured origins. An empty list allows any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin)
                .inspect_err(|e| warn!(%origin, error = %e, "Ignoring invalid CORS origin"))
                .ok()
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(window_ms: u64, max_requests: u32) -> RateLimiter {
        RateLimiter::new(&RateLimitConfig {
            window_ms,
            max_requests,
        })
    }

    #[tokio::test]
    async fn admits_up_to_the_budget() {
        let limiter = limiter(1000, 2);
        assert_eq!(
            limiter.check("a", 0).await,
            RateDecision::Allowed { remaining: 1 }
        );
        assert_eq!(
            limiter.check("a", 10).await,
            RateDecision::Allowed { remaining: 0 }
        );
        assert_eq!(
            limiter.check("a", 200).await,
            RateDecision::Limited {
                retry_after_secs: 1
            }
        );
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let limiter = limiter(1000, 1);
        assert!(matches!(
            limiter.check("a", 0).await,
            RateDecision::Allowed { .. }
        ));
        assert!(matches!(
            limiter.check("b", 0).await,
            RateDecision::Allowed { .. }
        ));
        assert!(matches!(
            limiter.check("a", 1).await,
            RateDecision::Limited { .. }
        ));
    }

    #[tokio::test]
    async fn retry_after_rounds_up_to_window_end() {
        let limiter = limiter(900_000, 1);
        limiter.check("a", 0).await;
        assert_eq!(
            limiter.check("a", 1).await,
            RateDecision::Limited {
                retry_after_secs: 900
            }
        );
        assert_eq!(
            limiter.check("a", 899_500).await,
            RateDecision::Limited {
                retry_after_secs: 1
            }
        );
    }

    #[tokio::test]
    async fn expired_windows_reset_and_are_pruned() {
        let limiter = limiter(1000, 1);
        limiter.check("a", 0).await;
        limiter.check("b", 500).await;
        assert_eq!(limiter.tracked_clients().await, 2);

        assert_eq!(
            limiter.check("a", 1000).await,
            RateDecision::Allowed { remaining: 0 }
        );
        assert_eq!(limiter.tracked_clients().await, 2);

        limiter.check("a", 2100).await;
        assert_eq!(limiter.tracked_clients().await, 1);
    }

    #[test]
    fn cors_skips_invalid_origins() {
        let layer = cors_layer(&[
            String::from("http://localhost:3000"),
            String::from("bad\norigin"),
        ]);
        assert!(format!("{layer:?}").contains("localhost:3000"));
    }
}
