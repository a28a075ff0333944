//! Request plumbing shared by every route: request ids, the gateway key
//! check, and per-caller rate limiting.
//!
//! The gateway in front of rxmart authenticates end users and forwards the
//! signed-in account in [`PHARMACIST_HEADER`] or [`CUSTOMER_HEADER`]. Those
//! headers are only trusted on requests that carry one of the gateway's
//! bearer keys.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::ApiError;

pub const PHARMACIST_HEADER: &str = "x-pharmacist-id";
pub const CUSTOMER_HEADER: &str = "x-customer-id";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const GATEWAY_KEYS_VAR: &str = "RXMART_API_KEYS";
const MAX_REQUEST_ID_LEN: usize = 64;
// Past this many tracked callers, expired windows are swept on insert.
const SWEEP_THRESHOLD: usize = 4096;

#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    fn from_extensions(req: &Request) -> String {
        req.extensions()
            .get::<RequestId>()
            .map(|id| id.0.clone())
            .unwrap_or_default()
    }
}

/// Gateway ids are reused only when they are short and header-safe.
fn accept_request_id(raw: &str) -> bool {
    !raw.is_empty()
        && raw.len() <= MAX_REQUEST_ID_LEN
        && raw
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Bearer keys identifying the gateway.
#[derive(Debug, Clone)]
pub struct GatewayAuth {
    keys: Option<Arc<HashSet<String>>>,
}

impl GatewayAuth {
    /// Reads `RXMART_API_KEYS` (comma-separated).
    ///
    /// # Errors
    ///
    /// Fails outside development when no key is configured.
    pub fn from_env(is_development: bool) -> anyhow::Result<Self> {
        let raw = std::env::var(GATEWAY_KEYS_VAR).unwrap_or_default();
        Self::from_raw(&raw, is_development)
    }

    pub fn from_raw(raw: &str, is_development: bool) -> anyhow::Result<Self> {
        let keys: HashSet<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(ToOwned::to_owned)
            .collect();

        match (keys.is_empty(), is_development) {
            (false, _) => Ok(Self {
                keys: Some(Arc::new(keys)),
            }),
            (true, true) => {
                tracing::warn!(
                    "{GATEWAY_KEYS_VAR} is empty; principal headers are trusted without a gateway key"
                );
                Ok(Self::disabled())
            }
            (true, false) => anyhow::bail!("{GATEWAY_KEYS_VAR} must list at least one gateway key"),
        }
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self { keys: None }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.keys.is_some()
    }

    fn admits(&self, headers: &HeaderMap) -> bool {
        let Some(keys) = &self.keys else {
            return true;
        };
        bearer_token(headers.get(AUTHORIZATION)).is_some_and(|token| keys.contains(token))
    }
}

/// Who a request counts against for rate limiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Caller {
    Pharmacist(i64),
    Customer(i64),
    Anonymous,
}

impl Caller {
    /// Pharmacist wins when a request carries both headers; unparseable ids
    /// count as anonymous (the principal extractor rejects them later).
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let id = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<i64>().ok())
        };

        if let Some(id) = id(PHARMACIST_HEADER) {
            Caller::Pharmacist(id)
        } else if let Some(id) = id(CUSTOMER_HEADER) {
            Caller::Customer(id)
        } else {
            Caller::Anonymous
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    opened_at: Instant,
    used: usize,
}

/// Fixed request windows tracked per [`Caller`].
#[derive(Debug, Clone)]
pub struct RateLimitState {
    budget: usize,
    period: Duration,
    windows: Arc<Mutex<HashMap<Caller, Window>>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(budget: usize, period: Duration) -> Self {
        Self {
            budget,
            period,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Counts one request for `caller` at `now`; `false` once the budget
    /// for the current window is spent.
    async fn admit(&self, caller: Caller, now: Instant) -> bool {
        let mut windows = self.windows.lock().await;

        if windows.len() >= SWEEP_THRESHOLD && !windows.contains_key(&caller) {
            let period = self.period;
            windows.retain(|_, w| now.duration_since(w.opened_at) < period);
        }

        let window = windows.entry(caller).or_insert(Window {
            opened_at: now,
            used: 0,
        });
        if now.duration_since(window.opened_at) >= self.period {
            *window = Window {
                opened_at: now,
                used: 0,
            };
        }
        if window.used >= self.budget {
            return false;
        }
        window.used += 1;
        true
    }
}

/// Reuses a well-formed `x-request-id` or generates a `UUIDv4`, stores it as
/// a [`RequestId`] extension and echoes it on the response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|raw| accept_request_id(raw))
        .map_or_else(|| Uuid::new_v4().to_string(), str::to_string);

    req.extensions_mut().insert(RequestId(id.clone()));
    let mut res = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    res
}

/// Rejects requests without a gateway key before any principal header is read.
pub async fn require_gateway_key(
    State(auth): State<GatewayAuth>,
    req: Request,
    next: Next,
) -> Response {
    if auth.admits(req.headers()) {
        return next.run(req).await;
    }

    let rid = RequestId::from_extensions(&req);
    tracing::warn!(request_id = %rid, path = %req.uri().path(), "request without gateway key");
    ApiError::new(rid, "unauthorized", "missing or invalid gateway key").into_response()
}

pub async fn enforce_rate_limit(
    State(limits): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let caller = Caller::from_headers(req.headers());
    if limits.admit(caller, Instant::now()).await {
        return next.run(req).await;
    }

    let rid = RequestId::from_extensions(&req);
    tracing::warn!(request_id = %rid, ?caller, "rate limit exceeded");
    ApiError::new(rid, "rate_limited", "too many requests, slow down").into_response()
}

fn bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
