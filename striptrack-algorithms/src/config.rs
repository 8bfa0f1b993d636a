//! Reconstruction configuration.

use striptrack_core::{Error, Result, Station};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Station 1 resolution (um): single-strip sigma, 200 um pitch / sqrt(12).
pub const SIGMA_STATION_1: f64 = 57.735;
/// Station 2 resolution (um), including multiple scattering and alignment.
pub const SIGMA_STATION_2: f64 = 94.0;
/// Station 3 resolution (um), including multiple scattering and alignment.
pub const SIGMA_STATION_3: f64 = 1000.0;
/// Full tracks farther than this many station-3 sigmas from the main-track
/// prediction are rejected.
pub const GATE_SIGMA_FACTOR: f64 = 2.0;

/// How station sigmas become weights in the full-track fit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FullTrackWeighting {
    /// Each station's sigma is used as its weight as is.
    #[default]
    StationSigma,
    /// Weights are `1 / sigma^2`.
    InverseVariance,
}

/// Configuration for track reconstruction.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReconstructionConfig {
    /// Per-station coordinate sigma (um), upstream first.
    pub station_sigmas: [f64; 3],
    /// Consistency gate width in units of the station-3 sigma.
    pub gate_sigma_factor: f64,
    /// Treat the ends of the strip array as unfired neighbours, so a single
    /// cluster touching the first or last strip is accepted.
    pub open_boundary_clusters: bool,
    /// Weighting of the full-track fit.
    pub full_track_weighting: FullTrackWeighting,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            station_sigmas: [SIGMA_STATION_1, SIGMA_STATION_2, SIGMA_STATION_3],
            gate_sigma_factor: GATE_SIGMA_FACTOR,
            open_boundary_clusters: false,
            full_track_weighting: FullTrackWeighting::default(),
        }
    }
}

impl ReconstructionConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-station sigmas.
    #[must_use]
    pub fn with_station_sigmas(mut self, sigmas: [f64; 3]) -> Self {
        self.station_sigmas = sigmas;
        self
    }

    /// Sets the gate width factor.
    #[must_use]
    pub fn with_gate_sigma_factor(mut self, factor: f64) -> Self {
        self.gate_sigma_factor = factor;
        self
    }

    /// Enables or disables open-boundary clusters.
    #[must_use]
    pub fn with_open_boundary_clusters(mut self, open: bool) -> Self {
        self.open_boundary_clusters = open;
        self
    }

    /// Sets the full-track weighting.
    #[must_use]
    pub fn with_full_track_weighting(mut self, weighting: FullTrackWeighting) -> Self {
        self.full_track_weighting = weighting;
        self
    }

    /// Sigma of one station.
    #[inline]
    #[must_use]
    pub fn sigma(&self, station: Station) -> f64 {
        self.station_sigmas[station.index()]
    }

    /// Maximum accepted distance between predicted and measured station-3 hits.
    #[inline]
    #[must_use]
    pub fn gate_tolerance(&self) -> f64 {
        self.gate_sigma_factor * self.sigma(Station::Third)
    }

    /// Checks that sigmas and the gate factor are positive and finite.
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] describing the first bad value.
    pub fn validate(&self) -> Result<()> {
        for (station, sigma) in Station::ALL.iter().zip(self.station_sigmas) {
            if !(sigma.is_finite() && sigma > 0.0) {
                return Err(Error::ConfigError(format!(
                    "sigma for station {} must be positive, got {sigma}",
                    station.index() + 1
                )));
            }
        }
        if !(self.gate_sigma_factor.is_finite() && self.gate_sigma_factor > 0.0) {
            return Err(Error::ConfigError(format!(
                "gate sigma factor must be positive, got {}",
                self.gate_sigma_factor
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults() {
        let config = ReconstructionConfig::default();
        assert!(config.validate().is_ok());
        assert_relative_eq!(
            config.sigma(Station::First),
            200.0 / 12.0_f64.sqrt(),
            epsilon = 1e-3
        );
        assert_relative_eq!(config.gate_tolerance(), 2000.0);
        assert!(!config.open_boundary_clusters);
        assert_eq!(config.full_track_weighting, FullTrackWeighting::StationSigma);
    }

    #[test]
    fn test_builder() {
        let config = ReconstructionConfig::new()
            .with_station_sigmas([10.0, 20.0, 30.0])
            .with_gate_sigma_factor(3.0)
            .with_open_boundary_clusters(true)
            .with_full_track_weighting(FullTrackWeighting::InverseVariance);

        assert_relative_eq!(config.sigma(Station::Second), 20.0);
        assert_relative_eq!(config.gate_tolerance(), 90.0);
        assert!(config.open_boundary_clusters);
        assert_eq!(config.full_track_weighting, FullTrackWeighting::InverseVariance);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let config = ReconstructionConfig::new().with_station_sigmas([1.0, 0.0, 1.0]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("station 2"));

        let config = ReconstructionConfig::new().with_gate_sigma_factor(f64::NAN);
        assert!(config.validate().is_err());
    }
}
