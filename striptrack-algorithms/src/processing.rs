//! Batch reconstruction over independent events.

use crate::config::ReconstructionConfig;
use crate::coordinator::TrackCoordinator;
use crate::gate::GateOutcome;
use rayon::prelude::*;
use striptrack_core::{EventTracks, GeometryTable, HitRecord, TrackPair};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Counters accumulated over reconstructed events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReconstructionStatistics {
    /// Events processed.
    pub events: usize,
    /// Events with an accepted main track.
    pub main_tracks: usize,
    /// Events with an accepted full track.
    pub full_tracks: usize,
    /// Full tracks fitted but rejected by the consistency gate.
    pub rejected_full_tracks: usize,
    /// Full-track fits that were degenerate.
    pub failed_full_fits: usize,
    /// Planes whose hits did not reduce to one cluster.
    pub ambiguous_planes: usize,
    /// Planes present in a record with no fired strip.
    pub silent_planes: usize,
}

impl ReconstructionStatistics {
    /// Adds the outcome of one finished coordinator.
    pub fn record(&mut self, coordinator: &TrackCoordinator<'_>) {
        self.events += 1;
        self.main_tracks += usize::from(coordinator.main_ok());
        self.full_tracks += usize::from(coordinator.full_ok());
        match coordinator.gate() {
            GateOutcome::Rejected { .. } => self.rejected_full_tracks += 1,
            GateOutcome::FitFailed => self.failed_full_fits += 1,
            GateOutcome::NotAttempted | GateOutcome::Accepted { .. } => {}
        }
        self.ambiguous_planes += coordinator.ambiguous_planes();
        self.silent_planes += coordinator.silent_planes();
    }

    /// Adds the counters of `other`.
    pub fn merge(&mut self, other: &Self) {
        self.events += other.events;
        self.main_tracks += other.main_tracks;
        self.full_tracks += other.full_tracks;
        self.rejected_full_tracks += other.rejected_full_tracks;
        self.failed_full_fits += other.failed_full_fits;
        self.ambiguous_planes += other.ambiguous_planes;
        self.silent_planes += other.silent_planes;
    }

    /// Fraction of events with an accepted main track.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn main_efficiency(&self) -> f64 {
        if self.events == 0 {
            0.0
        } else {
            self.main_tracks as f64 / self.events as f64
        }
    }

    /// Fraction of main tracks that also gave an accepted full track.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn full_efficiency(&self) -> f64 {
        if self.main_tracks == 0 {
            0.0
        } else {
            self.full_tracks as f64 / self.main_tracks as f64
        }
    }
}

/// Tracks of a batch, in input order, with their statistics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconstructionRun {
    tracks: Vec<EventTracks>,
    statistics: ReconstructionStatistics,
}

impl ReconstructionRun {
    /// Per-event results in input order.
    #[must_use]
    pub fn tracks(&self) -> &[EventTracks] {
        &self.tracks
    }

    /// Aggregated counters.
    #[must_use]
    pub fn statistics(&self) -> &ReconstructionStatistics {
        &self.statistics
    }

    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// True if the batch was empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Accepted main track pairs.
    pub fn accepted_main(&self) -> impl Iterator<Item = &TrackPair> {
        self.tracks.iter().filter_map(EventTracks::accepted_main)
    }

    /// Accepted full track pairs with their calorimeter slice.
    pub fn accepted_full(&self) -> impl Iterator<Item = (&TrackPair, Option<usize>)> {
        self.tracks.iter().filter_map(EventTracks::accepted_full)
    }

    /// Consumes the run, returning the per-event results.
    #[must_use]
    pub fn into_tracks(self) -> Vec<EventTracks> {
        self.tracks
    }
}

/// Reconstructs a single event with a fresh coordinator.
#[must_use]
pub fn reconstruct_event(
    geometry: &GeometryTable,
    config: &ReconstructionConfig,
    hits: &HitRecord,
) -> EventTracks {
    TrackCoordinator::new(geometry, config.clone()).run(hits)
}

/// Reconstructs every event in parallel.
///
/// Events share `geometry` read-only and each gets its own coordinator.
/// Results keep the order of `events`.
#[must_use]
pub fn reconstruct_events(
    geometry: &GeometryTable,
    config: &ReconstructionConfig,
    events: &[HitRecord],
) -> ReconstructionRun {
    let (tracks, per_event): (Vec<EventTracks>, Vec<ReconstructionStatistics>) = events
        .par_iter()
        .map(|hits| {
            let mut coordinator = TrackCoordinator::new(geometry, config.clone());
            let tracks = coordinator.run(hits);
            let mut statistics = ReconstructionStatistics::default();
            statistics.record(&coordinator);
            (tracks, statistics)
        })
        .unzip();

    let statistics = per_event
        .iter()
        .fold(ReconstructionStatistics::default(), |mut total, event| {
            total.merge(event);
            total
        });

    ReconstructionRun { tracks, statistics }
}
