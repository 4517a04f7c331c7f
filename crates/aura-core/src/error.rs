//! Error types for the AURA engine

use thiserror::Error;

/// Engine-level errors
///
/// Only invalid caller input propagates out of the engine; everything else
/// is recovered where a safe default exists (hold the radius, skip a stale
/// record).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuraError {
    /// Carries no payload: the offending values must never reach logs or
    /// responses.
    #[error("coordinate out of range")]
    InvalidCoordinate,

    #[error("malformed cell key: {0}")]
    InvalidCell(String),

    #[error("resolution out of range: {0}")]
    ResolutionOutOfRange(u8),

    #[error("malformed hotspot table: {0}")]
    InvalidHotspotTable(String),
}

/// Result type for AURA operations
pub type AuraResult<T> = Result<T, AuraError>;
