use messenger_core::error::CoreError;

use crate::geo::GeoError;

/// Error type shared by the widget services and their store.
#[derive(Debug, thiserror::Error)]
pub enum WidgetError {
    /// A domain-level error from `messenger_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resolving the visitor's location failed.
    #[error(transparent)]
    Geo(#[from] GeoError),

    /// A stored campaign could not be decoded.
    #[error("Malformed campaign data: {0}")]
    Campaign(#[from] serde_json::Error),
}

pub type WidgetResult<T> = Result<T, WidgetError>;
