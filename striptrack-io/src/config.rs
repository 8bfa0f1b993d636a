//! JSON setup files: plane geometry and reconstruction parameters.
//!
//! Every key is optional. Planes and fields that are not mentioned keep
//! the reference values of [`GeometryTable::reference`] and
//! [`ReconstructionConfig::default`].
//!
//! ```json
//! {
//!   "geometry": {
//!     "planes": [
//!       { "plane": "X3", "z": 1302500.0, "offset": -35.0 }
//!     ]
//!   },
//!   "reconstruction": { "gate_sigma_factor": 3.0 }
//! }
//! ```

use crate::Result;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use striptrack_algorithms::ReconstructionConfig;
use striptrack_core::{Error as CoreError, GeometryTable, PlaneGeometry, PlaneId};

#[derive(Deserialize, Default)]
#[serde(default)]
struct JsonSetup {
    geometry: JsonGeometry,
    reconstruction: ReconstructionConfig,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct JsonGeometry {
    planes: Vec<JsonPlane>,
}

#[derive(Deserialize)]
struct JsonPlane {
    plane: String,
    z: Option<f64>,
    angle: Option<f64>,
    pitch: Option<f64>,
    strips: Option<u32>,
    half_width: Option<f64>,
    thickness: Option<f64>,
    offset: Option<f64>,
}

impl JsonPlane {
    fn apply(&self, base: PlaneGeometry) -> PlaneGeometry {
        PlaneGeometry {
            z: self.z.unwrap_or(base.z),
            angle: self.angle.unwrap_or(base.angle),
            pitch: self.pitch.unwrap_or(base.pitch),
            strip_count: self.strips.unwrap_or(base.strip_count),
            half_width: self.half_width.unwrap_or(base.half_width),
            thickness: self.thickness.unwrap_or(base.thickness),
            offset: self.offset.unwrap_or(base.offset),
        }
    }
}

/// Geometry and reconstruction parameters of one detector setup.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetupConfig {
    /// Plane geometry table.
    pub geometry: GeometryTable,
    /// Reconstruction parameters.
    pub reconstruction: ReconstructionConfig,
}

impl SetupConfig {
    /// Load a setup from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid JSON, names
    /// an unknown or repeated plane, or yields invalid values.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let setup: JsonSetup = serde_json::from_reader(reader)?;
        Self::from_json_setup(setup)
    }

    /// Load a setup from a JSON string.
    ///
    /// # Errors
    /// See [`from_file`](Self::from_file).
    pub fn from_json(json: &str) -> Result<Self> {
        let setup: JsonSetup = serde_json::from_str(json)?;
        Self::from_json_setup(setup)
    }

    fn from_json_setup(setup: JsonSetup) -> Result<Self> {
        let mut geometry = GeometryTable::reference();
        let mut seen = BTreeSet::new();

        for entry in &setup.geometry.planes {
            let plane = PlaneId::from_name(&entry.plane).ok_or_else(|| {
                CoreError::ConfigError(format!("unknown plane name {:?}", entry.plane))
            })?;
            if !seen.insert(plane) {
                return Err(CoreError::ConfigError(format!("plane {plane} listed twice")).into());
            }
            let updated = entry.apply(*geometry.get(plane));
            geometry = geometry.with_plane(plane, updated);
        }

        geometry.validate()?;
        setup.reconstruction.validate()?;

        Ok(Self {
            geometry,
            reconstruction: setup.reconstruction,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::Error;
    use std::io::Write;
    use striptrack_algorithms::FullTrackWeighting;
    use striptrack_core::Station;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_setup_is_reference() {
        let setup = SetupConfig::from_json("{}").unwrap();
        assert_eq!(setup, SetupConfig::default());
        assert_eq!(setup.geometry, GeometryTable::reference());
    }

    #[test]
    fn test_partial_plane_override() {
        let json = r#"{
            "geometry": {
                "planes": [
                    { "plane": "X3", "z": 1302500.0, "offset": -35.0 },
                    { "plane": "U", "strips": 640, "pitch": 50.0, "half_width": 16000.0 }
                ]
            }
        }"#;
        let setup = SetupConfig::from_json(json).unwrap();

        let x3 = setup.geometry.get(PlaneId::X3);
        assert_eq!(x3.z, 1_302_500.0);
        assert_eq!(x3.offset, -35.0);
        assert_eq!(x3.pitch, 200.0); // reference
        let u = setup.geometry.get(PlaneId::U);
        assert_eq!(u.strip_count, 640);
        assert_eq!(u.angle, -10.5); // reference
        assert_eq!(setup.geometry.get(PlaneId::X1), GeometryTable::reference().get(PlaneId::X1));
    }

    #[test]
    fn test_reconstruction_section() {
        let json = r#"{
            "reconstruction": {
                "gate_sigma_factor": 3.0,
                "open_boundary_clusters": true,
                "full_track_weighting": "inverse_variance"
            }
        }"#;
        let setup = SetupConfig::from_json(json).unwrap();
        assert_eq!(setup.reconstruction.gate_sigma_factor, 3.0);
        assert!(setup.reconstruction.open_boundary_clusters);
        assert_eq!(
            setup.reconstruction.full_track_weighting,
            FullTrackWeighting::InverseVariance
        );
        assert_eq!(setup.reconstruction.sigma(Station::Third), 1000.0); // default
    }

    #[test]
    fn test_rejects_bad_setups() {
        for json in [
            r#"{ "geometry": { "planes": [ { "plane": "W9" } ] } }"#,
            r#"{ "geometry": { "planes": [ { "plane": "X1" }, { "plane": "X1" } ] } }"#,
            r#"{ "geometry": { "planes": [ { "plane": "Y2", "pitch": 0.0 } ] } }"#,
            r#"{ "reconstruction": { "station_sigmas": [1.0, -2.0, 3.0] } }"#,
        ] {
            assert!(
                matches!(SetupConfig::from_json(json), Err(Error::CoreError(_))),
                "{json}"
            );
        }
        assert!(matches!(SetupConfig::from_json("{"), Err(Error::Json(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "geometry": {{ "planes": [ {{ "plane": "Y1", "z": -60000.0 }} ] }} }}"#)
            .unwrap();
        file.flush().unwrap();

        let setup = SetupConfig::from_file(file.path()).unwrap();
        assert_eq!(setup.geometry.get(PlaneId::Y1).z, -60000.0);
    }
}
