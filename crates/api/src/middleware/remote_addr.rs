//! Extractor for the visitor's network address.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRef, FromRequestParts};
use axum::http::request::Parts;

use crate::state::TrustProxy;

/// Address of the client behind the request, when known.
///
/// With [`TrustProxy`] enabled, uses the first `X-Forwarded-For` hop, then
/// `X-Real-IP`. Otherwise, or when neither header is set, falls back to the
/// TCP peer address (available when the server is started with
/// `into_make_service_with_connect_info`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAddress(pub Option<String>);

impl<S> FromRequestParts<S> for RemoteAddress
where
    S: Send + Sync,
    TrustProxy: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TrustProxy(trusted) = TrustProxy::from_ref(state);

        let forwarded = if trusted {
            forwarded_address(parts)
        } else {
            None
        };

        let address = forwarded.or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        });

        Ok(Self(address))
    }
}

fn forwarded_address(parts: &Parts) -> Option<String> {
    let header = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    header("x-forwarded-for")
        .and_then(|v| v.split(',').next().map(|hop| hop.trim().to_string()))
        .filter(|v| !v.is_empty())
        .or_else(|| header("x-real-ip"))
}
