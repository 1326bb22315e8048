//! Shared response envelope for API handlers.
//!
//! Every successful response is `{ "data": ... }`. Mutations that degrade to
//! "no result" answer `{ "data": null }` with status 200.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
