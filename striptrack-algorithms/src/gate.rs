//! Trajectory consistency gate between the main and full tracks.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Result of the consistency gate for one event.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GateOutcome {
    /// No full track was attempted (missing main track or station-3 hit).
    #[default]
    NotAttempted,
    /// Station 3 was measured but a full-track fit was degenerate.
    FitFailed,
    /// Station-3 hit too far from the main-track prediction.
    Rejected {
        /// Predicted-to-measured distance (um).
        distance: f64,
    },
    /// Station-3 hit consistent with the main track.
    Accepted {
        /// Predicted-to-measured distance (um).
        distance: f64,
    },
}

impl GateOutcome {
    /// True only for [`GateOutcome::Accepted`].
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// Distance, when the gate was evaluated.
    #[must_use]
    pub fn distance(&self) -> Option<f64> {
        match *self {
            Self::Rejected { distance } | Self::Accepted { distance } => Some(distance),
            Self::NotAttempted | Self::FitFailed => None,
        }
    }
}

/// Euclidean distance between a predicted and a measured `(x, y)`.
#[inline]
#[must_use]
pub fn gate_distance(predicted: (f64, f64), measured: (f64, f64)) -> f64 {
    (predicted.0 - measured.0).hypot(predicted.1 - measured.1)
}

/// Evaluates the gate: accepted when the distance is at most `tolerance`.
#[must_use]
pub fn check_trajectory(
    predicted: (f64, f64),
    measured: (f64, f64),
    tolerance: f64,
) -> GateOutcome {
    let distance = gate_distance(predicted, measured);
    if distance <= tolerance {
        GateOutcome::Accepted { distance }
    } else {
        GateOutcome::Rejected { distance }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_boundary_is_inclusive() {
        let sigma = 1000.0;
        let tolerance = 2.0 * sigma;

        assert!(check_trajectory((0.0, 0.0), (2.0 * sigma, 0.0), tolerance).is_accepted());
        assert!(check_trajectory((0.0, 0.0), (0.0, -2.0 * sigma), tolerance).is_accepted());
        assert_eq!(
            check_trajectory((0.0, 0.0), (2.0 * sigma + 1e-6, 0.0), tolerance),
            GateOutcome::Rejected {
                distance: 2.0 * sigma + 1e-6
            }
        );
    }

    #[test]
    fn test_distance_is_euclidean() {
        assert_relative_eq!(gate_distance((1.0, 2.0), (4.0, 6.0)), 5.0);
        let outcome = check_trajectory((100.0, 100.0), (1300.0, 1700.0), 2000.0);
        assert_eq!(outcome.distance(), Some(2000.0));
        assert!(outcome.is_accepted());
    }

    #[test]
    fn test_not_evaluated_has_no_distance() {
        assert_eq!(GateOutcome::default(), GateOutcome::NotAttempted);
        assert_eq!(GateOutcome::FitFailed.distance(), None);
        assert!(!GateOutcome::FitFailed.is_accepted());
    }
}
