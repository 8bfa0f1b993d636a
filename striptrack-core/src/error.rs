//! Error types for striptrack-core.

use crate::geometry::PlaneId;
use thiserror::Error;

/// Result type alias for striptrack operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for striptrack operations.
///
/// Missing or ambiguous hits are not errors; they are reported as data by
/// the reconstruction. These variants cover broken inputs and misuse.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Plane table position outside `0..PLANE_COUNT`.
    #[error("invalid plane index: {0}")]
    InvalidPlaneIndex(u32),

    /// Strip index beyond the plane's readout.
    #[error("strip {strip} out of range for plane {plane} ({strip_count} strips)")]
    StripOutOfRange {
        plane: PlaneId,
        strip: u32,
        strip_count: u32,
    },

    /// Strip indices must be unique and ascending.
    #[error("strip indices for plane {0} are not strictly ascending")]
    UnorderedStrips(PlaneId),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// A track coordinator was asked to reconstruct twice without a reset.
    #[error("track coordinator already finished; reset it before the next event")]
    CoordinatorSpent,
}
