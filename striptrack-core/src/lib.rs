//! striptrack-core: Core types for strip-detector track reconstruction.
//!
//! This crate provides the data model shared by the reconstruction and I/O
//! crates: the plane geometry table, per-event hit records, and the line
//! models that describe reconstructed tracks.
//!

pub mod error;
pub mod geometry;
pub mod hit;
pub mod track;

pub use error::{Error, Result};
pub use geometry::{Axis, GeometryTable, PlaneGeometry, PlaneId, Station, PLANE_COUNT};
pub use hit::HitRecord;
pub use track::{EventTracks, LineModel, TrackPair};
