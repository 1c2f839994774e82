use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::auth::RequestContext;
use crate::error::ApiError;
use crate::state::AppState;

/// Client details resolved once per request and attached as an extension so
/// downstream middleware and handlers agree on the client address.
#[derive(Clone, Debug)]
pub struct ClientMeta {
    pub addr: IpAddr,
    pub user_agent: Option<String>,
}

impl ClientMeta {
    pub fn context(&self, method: &axum::http::Method, path: &str) -> RequestContext {
        RequestContext {
            method: method.to_string(),
            path: path.to_string(),
            client_addr: self.addr,
            user_agent: self.user_agent.clone(),
        }
    }
}

impl Default for ClientMeta {
    fn default() -> Self {
        Self {
            addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            user_agent: None,
        }
    }
}

/// Falls back to loopback when the middleware did not run (direct handler
/// tests); in the served router the extension is always present.
#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for ClientMeta
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<ClientMeta>().cloned().unwrap_or_default())
    }
}

/// First gate in the request path: reject requests from locked-out addresses
/// before any other processing, with a Retry-After hint.
pub async fn lockout_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let meta = extract_client_meta(&request);

    if let Err(err) = state.guard.check(meta.addr) {
        state.events.record_suspicious_activity(
            "request from locked-out address",
            &meta.context(request.method(), request.uri().path()),
        );
        return Err(err.into());
    }

    request.extensions_mut().insert(meta);
    Ok(next.run(request).await)
}

/// Prefer the first `x-forwarded-for` hop (the service runs behind a reverse
/// proxy in production), fall back to the socket peer address.
fn extract_client_meta(request: &Request) -> ClientMeta {
    let addr = forwarded_for(request.headers())
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|info| info.0.ip())
        })
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

    let user_agent = request
        .headers()
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    ClientMeta { addr, user_agent }
}

fn forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse().ok())
}
