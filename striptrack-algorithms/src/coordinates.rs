//! Per-station hit coordinates assembled from individual planes.

use striptrack_core::{Axis, PlaneId, Station};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Sign applied to Y-plane coordinates to bring the detector frame into the
/// world frame.
pub const Y_COORDINATE_SIGN: f64 = -1.0;

/// Measured `(x, y)` of one station with per-axis validity.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StationPoint {
    /// X coordinate (um).
    pub x: f64,
    /// Y coordinate (um), already sign-flipped.
    pub y: f64,
    /// X plane delivered a coordinate.
    pub x_ok: bool,
    /// Y plane delivered a coordinate.
    pub y_ok: bool,
}

impl StationPoint {
    /// Both axes measured.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.x_ok && self.y_ok
    }

    /// Coordinate on one axis, if measured.
    #[must_use]
    pub fn get(&self, axis: Axis) -> Option<f64> {
        match axis {
            Axis::X => self.x_ok.then_some(self.x),
            Axis::Y => self.y_ok.then_some(self.y),
        }
    }
}

/// Coordinates of the three tracking stations for one event.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StationCoordinates {
    stations: [StationPoint; 3],
}

impl StationCoordinates {
    /// Creates coordinates with no station measured.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the raw plane coordinate `value` measured on `plane`.
    ///
    /// Y values are stored with [`Y_COORDINATE_SIGN`] applied. Returns
    /// `false` for the stereo planes, which have no station slot.
    pub fn assign(&mut self, plane: PlaneId, value: f64) -> bool {
        let (Some(station), Some(axis)) = (plane.station(), plane.axis()) else {
            return false;
        };
        let point = &mut self.stations[station.index()];
        match axis {
            Axis::X => {
                point.x = value;
                point.x_ok = true;
            }
            Axis::Y => {
                point.y = Y_COORDINATE_SIGN * value;
                point.y_ok = true;
            }
        }
        true
    }

    /// Point of one station.
    #[must_use]
    pub fn station(&self, station: Station) -> &StationPoint {
        &self.stations[station.index()]
    }

    /// True if every listed station is measured on both axes.
    #[must_use]
    pub fn complete(&self, stations: &[Station]) -> bool {
        stations.iter().all(|&s| self.station(s).is_complete())
    }

    /// Clears all stations.
    pub fn clear(&mut self) {
        self.stations = [StationPoint::default(); 3];
    }
}
