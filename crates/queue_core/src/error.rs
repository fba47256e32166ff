use std::fmt;

use shared::domain::UserId;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Template,
    Region,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Template => f.write_str("template"),
            AssetKind::Region => f.write_str("region"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    /// Initial load failed; recovered by showing a message, never retried.
    #[error("backfill of {resource} unavailable: {source}")]
    BackfillUnavailable {
        resource: &'static str,
        source: anyhow::Error,
    },
    /// Presentation assets do not match the engine. Fatal.
    #[error("{asset} `{name}` is missing from the presentation surface")]
    TemplateOrRegionMissing { asset: AssetKind, name: String },
    /// More than one request for the same requester. Logged, never returned.
    #[error("{count} outstanding requests found for requester {requester_id}")]
    DuplicateOwnRequest { requester_id: UserId, count: usize },
}

impl SyncError {
    pub fn missing_template(name: impl Into<String>) -> Self {
        Self::TemplateOrRegionMissing {
            asset: AssetKind::Template,
            name: name.into(),
        }
    }

    pub fn missing_region(name: impl Into<String>) -> Self {
        Self::TemplateOrRegionMissing {
            asset: AssetKind::Region,
            name: name.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::TemplateOrRegionMissing { .. })
    }
}
