//! striptrack-algorithms: Track reconstruction for strip-detector events.
//!
//! This crate turns per-event strip hits into straight-line tracks:
//! - **Cluster** - classifies a plane's hits and computes the cluster centroid
//! - **Fit** - exact two-point and weighted least-squares line fits
//! - **Gate** - consistency check of station 3 against the main track
//! - **Coordinator** - per-event state machine tying the steps together
//! - **Processing** - parallel batch reconstruction with statistics
//!
#![warn(missing_docs)]

mod cluster;
mod config;
mod coordinates;
mod coordinator;
mod fit;
mod gate;
mod processing;

pub use cluster::{
    classify_cluster, classify_cluster_with, coordinate_of, ClusterOutcome, StripRange,
};
pub use config::{
    FullTrackWeighting, ReconstructionConfig, GATE_SIGMA_FACTOR, SIGMA_STATION_1, SIGMA_STATION_2,
    SIGMA_STATION_3,
};
pub use coordinates::{StationCoordinates, StationPoint, Y_COORDINATE_SIGN};
pub use coordinator::{PlaneOutcome, Stage, TrackCoordinator};
pub use fit::{
    least_squares_line, two_point_line, weighted_line, weighted_line_with_weights, WeightedFit,
};
pub use gate::{check_trajectory, gate_distance, GateOutcome};
pub use processing::{
    reconstruct_event, reconstruct_events, ReconstructionRun, ReconstructionStatistics,
};
