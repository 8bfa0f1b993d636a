//! Per-event track reconstruction.
//!
//! [`TrackCoordinator`] walks one [`HitRecord`] through a fixed sequence of
//! stages:
//!
//! 1. every plane present in the record is classified and, when it holds a
//!    single cluster, its coordinate is assigned to a station slot;
//! 2. the main track is fitted through stations 1 and 2 on both axes;
//! 3. if the main track exists and station 3 is measured on both axes, the
//!    weighted full track is fitted and checked against the main-track
//!    prediction at station 3.
//!
//! A coordinator serves one event. Call [`TrackCoordinator::reset`] before
//! reusing it.

use crate::cluster::{classify_cluster_with, coordinate_of, ClusterOutcome};
use crate::config::{FullTrackWeighting, ReconstructionConfig};
use crate::coordinates::StationCoordinates;
use crate::fit::{two_point_line, weighted_line, weighted_line_with_weights};
use crate::gate::{check_trajectory, GateOutcome};
use log::{debug, trace};
use striptrack_core::{
    Axis, Error, EventTracks, GeometryTable, HitRecord, PlaneId, Result, Station, TrackPair,
    PLANE_COUNT,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Reconstruction stage of a coordinator. Stages only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Fresh coordinator, nothing computed.
    Init,
    /// Plane coordinates assigned.
    PlanesExtracted,
    /// Main-track fit attempted.
    MainAttempted,
    /// Full-track fit and gate attempted.
    FullAttempted,
    /// Results available.
    Done,
}

/// What one plane contributed to the event.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PlaneOutcome {
    /// No strip fired.
    NoSignal,
    /// Hit pattern did not reduce to a single cluster.
    Ambiguous {
        /// Rising edges seen by the scan.
        rising_edges: usize,
        /// Falling edges seen by the scan.
        falling_edges: usize,
    },
    /// Single cluster at this plane coordinate (um, detector frame).
    Measured(f64),
}

/// Single-use reconstruction of one event against a shared geometry table.
#[derive(Debug, Clone)]
pub struct TrackCoordinator<'a> {
    geometry: &'a GeometryTable,
    config: ReconstructionConfig,
    stage: Stage,
    planes: [Option<PlaneOutcome>; PLANE_COUNT],
    stations: StationCoordinates,
    tracks: EventTracks,
    gate: GateOutcome,
    full_chi_square: [Option<f64>; 2],
}

impl<'a> TrackCoordinator<'a> {
    /// Creates a coordinator reading plane positions from `geometry`.
    #[must_use]
    pub fn new(geometry: &'a GeometryTable, config: ReconstructionConfig) -> Self {
        Self {
            geometry,
            config,
            stage: Stage::Init,
            planes: [None; PLANE_COUNT],
            stations: StationCoordinates::new(),
            tracks: EventTracks::default(),
            gate: GateOutcome::NotAttempted,
            full_chi_square: [None; 2],
        }
    }

    /// Reconstructs the tracks of one event.
    ///
    /// Missing planes, ambiguous clusters and rejected full tracks are
    /// reported through the returned flags, never as errors.
    ///
    /// # Errors
    /// Returns [`Error::CoordinatorSpent`] if this coordinator has already
    /// processed an event since construction or the last [`reset`](Self::reset).
    pub fn reconstruct(&mut self, hits: &HitRecord) -> Result<EventTracks> {
        if self.stage != Stage::Init {
            return Err(Error::CoordinatorSpent);
        }
        Ok(self.run(hits))
    }

    /// Runs every stage on a coordinator known to be fresh.
    pub(crate) fn run(&mut self, hits: &HitRecord) -> EventTracks {
        self.extract_planes(hits);
        self.advance(Stage::PlanesExtracted);

        self.fit_main();
        self.advance(Stage::MainAttempted);

        self.fit_full();
        self.advance(Stage::FullAttempted);

        self.tracks.calorimeter_slice = hits.calorimeter_position();
        self.advance(Stage::Done);
        self.tracks
    }

    /// Returns the coordinator to [`Stage::Init`], discarding all results.
    pub fn reset(&mut self) {
        self.stage = Stage::Init;
        self.planes = [None; PLANE_COUNT];
        self.stations.clear();
        self.tracks = EventTracks::default();
        self.gate = GateOutcome::NotAttempted;
        self.full_chi_square = [None; 2];
    }

    fn advance(&mut self, next: Stage) {
        trace!("track coordinator: {:?} -> {:?}", self.stage, next);
        self.stage = next;
    }

    fn extract_planes(&mut self, hits: &HitRecord) {
        for (plane, _) in hits.planes() {
            let geometry = self.geometry.get(plane);
            let mask = hits.plane_mask(plane, geometry.strip_count as usize);
            let outcome = match classify_cluster_with(&mask, self.config.open_boundary_clusters) {
                ClusterOutcome::NoSignal => PlaneOutcome::NoSignal,
                ClusterOutcome::Ambiguous {
                    rising_edges,
                    falling_edges,
                } => {
                    debug!(
                        "plane {plane}: ambiguous cluster \
                         ({rising_edges} rising, {falling_edges} falling edges)"
                    );
                    PlaneOutcome::Ambiguous {
                        rising_edges,
                        falling_edges,
                    }
                }
                ClusterOutcome::Single(range) => {
                    let value = coordinate_of(geometry, range);
                    self.stations.assign(plane, value);
                    PlaneOutcome::Measured(value)
                }
            };
            self.planes[plane.index()] = Some(outcome);
        }
    }

    fn fit_main(&mut self) {
        if !self.stations.complete(&[Station::First, Station::Second]) {
            return;
        }
        let stations = [Station::First, Station::Second];
        let line = |axis: Axis| {
            let [z0, z1] = stations.map(|s| self.plane_z(s, axis));
            let [f0, f1] = stations.map(|s| self.station_value(s, axis));
            two_point_line([z0, z1], [f0, f1])
        };
        if let (Some(x), Some(y)) = (line(Axis::X), line(Axis::Y)) {
            self.tracks.main = TrackPair::new(x, y);
            self.tracks.main_ok = true;
        }
    }

    fn fit_full(&mut self) {
        if !self.tracks.main_ok || !self.stations.complete(&Station::ALL) {
            return;
        }
        let sigmas = self.config.station_sigmas;
        let fit = |axis: Axis| {
            let z = Station::ALL.map(|s| self.plane_z(s, axis));
            let f = Station::ALL.map(|s| self.station_value(s, axis));
            match self.config.full_track_weighting {
                FullTrackWeighting::StationSigma => weighted_line_with_weights(&z, &f, &sigmas),
                FullTrackWeighting::InverseVariance => weighted_line(&z, &f, &sigmas),
            }
        };
        let (x_fit, y_fit) = (fit(Axis::X), fit(Axis::Y));

        if let Some(x) = x_fit {
            self.tracks.full.x = x.line;
            self.full_chi_square[0] = Some(x.chi_square);
        }
        if let Some(y) = y_fit {
            self.tracks.full.y = y.line;
            self.full_chi_square[1] = Some(y.chi_square);
        }
        if x_fit.is_none() || y_fit.is_none() {
            debug!("full track fit degenerate");
            self.gate = GateOutcome::FitFailed;
            return;
        }

        let predicted = self.tracks.main.position(
            self.plane_z(Station::Third, Axis::X),
            self.plane_z(Station::Third, Axis::Y),
        );
        let third = self.stations.station(Station::Third);
        self.gate = check_trajectory(predicted, (third.x, third.y), self.config.gate_tolerance());

        if let GateOutcome::Rejected { distance } = self.gate {
            debug!(
                "full track rejected: station 3 is {distance:.1} um \
                 from the main-track prediction (tolerance {:.1})",
                self.config.gate_tolerance()
            );
        }
        self.tracks.full_ok = self.gate.is_accepted();
    }

    fn plane_z(&self, station: Station, axis: Axis) -> f64 {
        self.geometry.get(PlaneId::for_station(station, axis)).z
    }

    fn station_value(&self, station: Station, axis: Axis) -> f64 {
        let point = self.stations.station(station);
        match axis {
            Axis::X => point.x,
            Axis::Y => point.y,
        }
    }

    /// Current stage.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &ReconstructionConfig {
        &self.config
    }

    /// Outcome of one plane; `None` if the plane was absent from the record.
    #[must_use]
    pub fn plane_outcome(&self, plane: PlaneId) -> Option<PlaneOutcome> {
        self.planes[plane.index()]
    }

    /// Outcomes of all planes present in the record, in table order.
    pub fn plane_outcomes(&self) -> impl Iterator<Item = (PlaneId, PlaneOutcome)> + '_ {
        PlaneId::ALL
            .iter()
            .filter_map(|&plane| self.plane_outcome(plane).map(|outcome| (plane, outcome)))
    }

    /// Number of present planes with an ambiguous cluster.
    #[must_use]
    pub fn ambiguous_planes(&self) -> usize {
        self.plane_outcomes()
            .filter(|(_, outcome)| matches!(outcome, PlaneOutcome::Ambiguous { .. }))
            .count()
    }

    /// Number of present planes where nothing fired.
    #[must_use]
    pub fn silent_planes(&self) -> usize {
        self.plane_outcomes()
            .filter(|(_, outcome)| matches!(outcome, PlaneOutcome::NoSignal))
            .count()
    }

    /// Station coordinates assembled from the planes.
    #[must_use]
    pub fn stations(&self) -> &StationCoordinates {
        &self.stations
    }

    /// Consistency gate result.
    #[must_use]
    pub fn gate(&self) -> GateOutcome {
        self.gate
    }

    /// Chi-square of the full-track fit on one axis.
    #[must_use]
    pub fn full_chi_square(&self, axis: Axis) -> Option<f64> {
        match axis {
            Axis::X => self.full_chi_square[0],
            Axis::Y => self.full_chi_square[1],
        }
    }

    /// Results so far.
    #[must_use]
    pub fn tracks(&self) -> &EventTracks {
        &self.tracks
    }

    /// Main track fitted on both axes.
    #[must_use]
    pub fn main_ok(&self) -> bool {
        self.tracks.main_ok
    }

    /// Full track fitted and accepted by the gate.
    #[must_use]
    pub fn full_ok(&self) -> bool {
        self.tracks.full_ok
    }

    /// Full (`true`) or main (`false`) track pair.
    #[must_use]
    pub fn track(&self, full: bool) -> &TrackPair {
        self.tracks.track(full)
    }
}
