//! Strip plane identifiers and the plane geometry table.
#![allow(clippy::cast_precision_loss, clippy::unreadable_literal)]

use crate::error::{Error, Result};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of strip planes in the tracker.
pub const PLANE_COUNT: usize = 8;

/// Identifier of a strip plane.
///
/// Raw values run 1..=8; raw value 0 is reserved for "no plane" and has no
/// variant. Variant order matches the table position order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum PlaneId {
    Y1 = 1,
    X1 = 2,
    Y2 = 3,
    X2 = 4,
    Y3 = 5,
    X3 = 6,
    /// Stereo plane, not used for fitting.
    U = 7,
    /// Stereo plane, not used for fitting.
    V = 8,
}

/// Projection axis measured by a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Axis {
    X,
    Y,
}

/// Tracker module along the beam axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Station {
    First,
    Second,
    Third,
}

impl Station {
    /// All stations, upstream first.
    pub const ALL: [Station; 3] = [Station::First, Station::Second, Station::Third];

    /// Zero-based position along the beam.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Station::First => 0,
            Station::Second => 1,
            Station::Third => 2,
        }
    }
}

impl PlaneId {
    /// All planes in table order.
    pub const ALL: [PlaneId; PLANE_COUNT] = [
        PlaneId::Y1,
        PlaneId::X1,
        PlaneId::Y2,
        PlaneId::X2,
        PlaneId::Y3,
        PlaneId::X3,
        PlaneId::U,
        PlaneId::V,
    ];

    /// Table position (0-based) of the plane.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            PlaneId::Y1 => 0,
            PlaneId::X1 => 1,
            PlaneId::Y2 => 2,
            PlaneId::X2 => 3,
            PlaneId::Y3 => 4,
            PlaneId::X3 => 5,
            PlaneId::U => 6,
            PlaneId::V => 7,
        }
    }

    /// Plane at a table position.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(PlaneId::Y1),
            1 => Some(PlaneId::X1),
            2 => Some(PlaneId::Y2),
            3 => Some(PlaneId::X2),
            4 => Some(PlaneId::Y3),
            5 => Some(PlaneId::X3),
            6 => Some(PlaneId::U),
            7 => Some(PlaneId::V),
            _ => None,
        }
    }

    /// Plane for a raw identifier; 0 ("no plane") and unknown values map to `None`.
    #[must_use]
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(PlaneId::Y1),
            2 => Some(PlaneId::X1),
            3 => Some(PlaneId::Y2),
            4 => Some(PlaneId::X2),
            5 => Some(PlaneId::Y3),
            6 => Some(PlaneId::X3),
            7 => Some(PlaneId::U),
            8 => Some(PlaneId::V),
            _ => None,
        }
    }

    /// Raw identifier.
    #[inline]
    #[must_use]
    pub fn raw(self) -> u8 {
        self as u8
    }

    /// Short plane name ("Y1", "X1", ..., "U", "V").
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            PlaneId::Y1 => "Y1",
            PlaneId::X1 => "X1",
            PlaneId::Y2 => "Y2",
            PlaneId::X2 => "X2",
            PlaneId::Y3 => "Y3",
            PlaneId::X3 => "X3",
            PlaneId::U => "U",
            PlaneId::V => "V",
        }
    }

    /// Parses a short plane name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|plane| plane.name() == name)
    }

    /// Measured axis, `None` for the stereo planes.
    #[must_use]
    pub fn axis(self) -> Option<Axis> {
        match self {
            PlaneId::X1 | PlaneId::X2 | PlaneId::X3 => Some(Axis::X),
            PlaneId::Y1 | PlaneId::Y2 | PlaneId::Y3 => Some(Axis::Y),
            PlaneId::U | PlaneId::V => None,
        }
    }

    /// Station the plane belongs to, `None` for the stereo planes.
    #[must_use]
    pub fn station(self) -> Option<Station> {
        match self {
            PlaneId::Y1 | PlaneId::X1 => Some(Station::First),
            PlaneId::Y2 | PlaneId::X2 => Some(Station::Second),
            PlaneId::Y3 | PlaneId::X3 => Some(Station::Third),
            PlaneId::U | PlaneId::V => None,
        }
    }

    /// Plane measuring `axis` at `station`.
    #[must_use]
    pub fn for_station(station: Station, axis: Axis) -> Self {
        match (station, axis) {
            (Station::First, Axis::X) => PlaneId::X1,
            (Station::First, Axis::Y) => PlaneId::Y1,
            (Station::Second, Axis::X) => PlaneId::X2,
            (Station::Second, Axis::Y) => PlaneId::Y2,
            (Station::Third, Axis::X) => PlaneId::X3,
            (Station::Third, Axis::Y) => PlaneId::Y3,
        }
    }
}

impl fmt::Display for PlaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Physical parameters of one strip plane. Lengths in micrometres.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlaneGeometry {
    /// Position along the beam axis.
    pub z: f64,
    /// Strip orientation (degrees).
    pub angle: f64,
    /// Centre-to-centre strip spacing.
    pub pitch: f64,
    /// Number of readout strips.
    pub strip_count: u32,
    /// Half the sensor extent. Stored, not derived from pitch and strip count.
    pub half_width: f64,
    /// Sensor thickness.
    pub thickness: f64,
    /// Alignment offset added to every strip position.
    pub offset: f64,
}

impl PlaneGeometry {
    /// Centre of strip `index` in the plane frame.
    #[inline]
    #[must_use]
    pub fn strip_center(&self, index: usize) -> f64 {
        -self.half_width + index as f64 * self.pitch + self.pitch / 2.0 + self.offset
    }

    /// Checks that the parameters can describe a real sensor.
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] for non-positive pitch, strip count or
    /// half-width, or any non-finite value.
    pub fn validate(&self, plane: PlaneId) -> Result<()> {
        let values = [
            self.z,
            self.angle,
            self.pitch,
            self.half_width,
            self.thickness,
            self.offset,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(Error::ConfigError(format!(
                "plane {plane}: geometry contains a non-finite value"
            )));
        }
        if self.pitch <= 0.0 || self.half_width <= 0.0 || self.strip_count == 0 {
            return Err(Error::ConfigError(format!(
                "plane {plane}: pitch, half width and strip count must be positive"
            )));
        }
        Ok(())
    }
}

const fn reference_plane(z: f64, angle: f64) -> PlaneGeometry {
    PlaneGeometry {
        z,
        angle,
        pitch: 200.0,
        strip_count: 300,
        half_width: 30000.0,
        thickness: 300.0,
        offset: 0.0,
    }
}

/// Fixed table of plane geometries, indexed by [`PlaneId`].
///
/// Built once at start-up and then only read; share it by reference.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeometryTable {
    planes: [PlaneGeometry; PLANE_COUNT],
}

impl Default for GeometryTable {
    fn default() -> Self {
        Self::reference()
    }
}

impl GeometryTable {
    /// The reference beam-test layout: three X/Y stations plus two stereo planes.
    #[must_use]
    pub const fn reference() -> Self {
        Self {
            planes: [
                reference_plane(-52000.0, 180.0),
                reference_plane(-50000.0, 90.0),
                reference_plane(298000.0, 180.0),
                reference_plane(300000.0, 90.0),
                reference_plane(1300000.0, 180.0),
                reference_plane(1302000.0, 90.0),
                reference_plane(1320000.0, -10.5),
                reference_plane(1322000.0, 10.5),
            ],
        }
    }

    /// Builds a table from per-plane geometries in table order.
    ///
    /// # Errors
    /// Returns an error if any plane fails [`PlaneGeometry::validate`].
    pub fn new(planes: [PlaneGeometry; PLANE_COUNT]) -> Result<Self> {
        let table = Self { planes };
        table.validate()?;
        Ok(table)
    }

    /// Validates every plane.
    ///
    /// # Errors
    /// Returns the first plane validation error.
    pub fn validate(&self) -> Result<()> {
        self.iter()
            .try_for_each(|(plane, geometry)| geometry.validate(plane))
    }

    /// Geometry of a plane.
    #[inline]
    #[must_use]
    pub fn get(&self, plane: PlaneId) -> &PlaneGeometry {
        &self.planes[plane.index()]
    }

    /// Geometry for a raw plane identifier; `None` for the reserved 0.
    #[must_use]
    pub fn lookup(&self, raw: u8) -> Option<&PlaneGeometry> {
        PlaneId::from_raw(raw).map(|plane| self.get(plane))
    }

    /// Replaces the geometry of one plane.
    #[must_use]
    pub fn with_plane(mut self, plane: PlaneId, geometry: PlaneGeometry) -> Self {
        self.planes[plane.index()] = geometry;
        self
    }

    /// Iterates planes in table order.
    pub fn iter(&self) -> impl Iterator<Item = (PlaneId, &PlaneGeometry)> {
        PlaneId::ALL.into_iter().zip(self.planes.iter())
    }
}
