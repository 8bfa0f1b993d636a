//! Line models and reconstructed track pairs.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Straight-line projection `f = a * z + b` of a track onto one axis.
///
/// `cov00`, `cov01` and `cov11` are the covariance of the `(b, a)` estimate.
/// They are only meaningful when `has_covariance` is set (weighted fits);
/// exact two-point fits leave them at zero. `fitted` separates a stored fit,
/// even one with all-zero parameters, from the default empty model.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LineModel {
    /// Slope.
    pub a: f64,
    /// Intercept.
    pub b: f64,
    /// Variance of the intercept.
    pub cov00: f64,
    /// Covariance of intercept and slope.
    pub cov01: f64,
    /// Variance of the slope.
    pub cov11: f64,
    /// Whether the covariance can be used for error propagation.
    pub has_covariance: bool,
    /// Whether the parameters come from a fit.
    pub fitted: bool,
}

impl LineModel {
    /// The empty model: nothing was fitted.
    pub const EMPTY: LineModel = LineModel {
        a: 0.0,
        b: 0.0,
        cov00: 0.0,
        cov01: 0.0,
        cov11: 0.0,
        has_covariance: false,
        fitted: false,
    };

    /// Creates a model without covariance.
    #[must_use]
    pub fn new(a: f64, b: f64) -> Self {
        Self {
            a,
            b,
            fitted: true,
            ..Self::EMPTY
        }
    }

    /// Creates a model with a usable covariance.
    #[must_use]
    pub fn with_covariance(a: f64, b: f64, cov00: f64, cov01: f64, cov11: f64) -> Self {
        Self {
            a,
            b,
            cov00,
            cov01,
            cov11,
            has_covariance: true,
            fitted: true,
        }
    }

    /// True if nothing was fitted. A fit with all-zero parameters is not empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.fitted
    }

    /// Predicted coordinate at `z`.
    #[inline]
    #[must_use]
    pub fn fit(&self, z: f64) -> f64 {
        self.a * z + self.b
    }

    /// Predicted coordinate and its standard error at `z`.
    ///
    /// The error is zero when the model has no covariance.
    #[must_use]
    pub fn fit_with_error(&self, z: f64) -> (f64, f64) {
        let value = self.fit(z);
        if !self.has_covariance {
            return (value, 0.0);
        }
        let variance = self.cov00 + z * (2.0 * self.cov01 + z * self.cov11);
        (value, variance.max(0.0).sqrt())
    }
}

/// X and Y projections of one track.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackPair {
    /// Projection on the X0Z plane.
    pub x: LineModel,
    /// Projection on the Y0Z plane.
    pub y: LineModel,
}

impl TrackPair {
    /// Creates a pair from its projections.
    #[must_use]
    pub fn new(x: LineModel, y: LineModel) -> Self {
        Self { x, y }
    }

    /// True if neither projection was fitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty() && self.y.is_empty()
    }

    /// Predicted `(x, y)` using each projection at its own `z`.
    #[must_use]
    pub fn position(&self, z_x: f64, z_y: f64) -> (f64, f64) {
        (self.x.fit(z_x), self.y.fit(z_y))
    }
}

/// Reconstruction result of one event, as handed to downstream consumers.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventTracks {
    /// Main track (stations 1-2) was fitted on both axes.
    pub main_ok: bool,
    /// Full track (stations 1-3) was fitted and passed the consistency gate.
    pub full_ok: bool,
    /// Main track pair; empty unless `main_ok`.
    pub main: TrackPair,
    /// Full track pair; may hold rejected fits when `full_ok` is false.
    pub full: TrackPair,
    /// Calorimeter stopping slice of the event.
    pub calorimeter_slice: Option<usize>,
}

impl EventTracks {
    /// Selects the full (`true`) or main (`false`) pair.
    #[must_use]
    pub fn track(&self, full: bool) -> &TrackPair {
        if full {
            &self.full
        } else {
            &self.main
        }
    }

    /// Accepted main pair.
    #[must_use]
    pub fn accepted_main(&self) -> Option<&TrackPair> {
        self.main_ok.then_some(&self.main)
    }

    /// Accepted full pair with its calorimeter slice.
    #[must_use]
    pub fn accepted_full(&self) -> Option<(&TrackPair, Option<usize>)> {
        self.full_ok.then_some((&self.full, self.calorimeter_slice))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_is_empty() {
        assert!(LineModel::default().is_empty());
        assert_eq!(LineModel::default(), LineModel::EMPTY);
        assert!(!LineModel::new(0.1, 0.0).is_empty());
        assert!(!LineModel::with_covariance(0.0, 0.0, 1.0, 0.0, 0.0).is_empty());
        assert!(TrackPair::default().is_empty());
    }

    #[test]
    fn test_zero_fit_is_not_empty() {
        let zero = LineModel::new(0.0, 0.0);
        assert!(!zero.is_empty());
        assert_ne!(zero, LineModel::EMPTY);
        assert_relative_eq!(zero.fit(1000.0), 0.0);
        assert!(!TrackPair::new(zero, zero).is_empty());
    }

    #[test]
    fn test_fit() {
        let line = LineModel::new(0.1, 2.0);
        assert_relative_eq!(line.fit(100.0), 12.0);
        assert_eq!(line.fit_with_error(100.0), (line.fit(100.0), 0.0));
    }

    #[test]
    fn test_fit_with_error_propagates_covariance() {
        let line = LineModel::with_covariance(0.5, 1.0, 4.0, -0.5, 0.25);
        let (value, error) = line.fit_with_error(2.0);
        assert_relative_eq!(value, 2.0);
        // 4 + 2 * (2 * -0.5 + 2 * 0.25) = 3
        assert_relative_eq!(error, 3.0_f64.sqrt());
        let (_, at_origin) = line.fit_with_error(0.0);
        assert_relative_eq!(at_origin, 2.0);
    }

    #[test]
    fn test_event_track_selection() {
        let main = TrackPair::new(LineModel::new(1.0, 0.0), LineModel::new(2.0, 0.0));
        let full = TrackPair::new(LineModel::new(3.0, 0.0), LineModel::new(4.0, 0.0));
        let event = EventTracks {
            main_ok: true,
            full_ok: false,
            main,
            full,
            calorimeter_slice: Some(12),
        };

        assert_eq!(event.track(false), &main);
        assert_eq!(event.track(true), &full);
        assert_eq!(event.accepted_main(), Some(&main));
        assert_eq!(event.accepted_full(), None);

        let accepted = EventTracks {
            full_ok: true,
            ..event
        };
        assert_eq!(accepted.accepted_full(), Some((&full, Some(12))));
    }
}
