//! Per-event hit records: fired strips on each plane plus the calorimeter bitmap.

use crate::error::{Error, Result};
use crate::geometry::{GeometryTable, PlaneId};
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fired strips and calorimeter slices of one particle event.
///
/// Strips are stored sparsely as ascending indices. A plane that is absent
/// is equivalent to a plane with no fired strips.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HitRecord {
    strip_hits: BTreeMap<PlaneId, Vec<u32>>,
    calorimeter_hits: Vec<bool>,
}

impl HitRecord {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a record with the given calorimeter bitmap and no plane hits.
    #[must_use]
    pub fn with_calorimeter_hits(hits: Vec<bool>) -> Self {
        Self {
            strip_hits: BTreeMap::new(),
            calorimeter_hits: hits,
        }
    }

    /// Replaces the calorimeter bitmap.
    pub fn set_calorimeter_hits(&mut self, hits: Vec<bool>) {
        self.calorimeter_hits = hits;
    }

    /// Stores the fired strips of a dense per-strip array for `plane`.
    ///
    /// Replaces any previous hits on that plane. A plane with no fired strip
    /// is still recorded (as present but empty).
    #[allow(clippy::cast_possible_truncation)]
    pub fn add_plane_hits(&mut self, plane: PlaneId, hits: &[bool]) {
        let strips = hits
            .iter()
            .enumerate()
            .filter(|(_, &fired)| fired)
            .map(|(index, _)| index as u32)
            .collect();
        self.strip_hits.insert(plane, strips);
    }

    /// Stores already-sparse strip indices for `plane`.
    ///
    /// # Errors
    /// Returns [`Error::UnorderedStrips`] if the indices are not strictly ascending.
    pub fn set_plane_strips(&mut self, plane: PlaneId, strips: Vec<u32>) -> Result<()> {
        if strips.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(Error::UnorderedStrips(plane));
        }
        self.strip_hits.insert(plane, strips);
        Ok(())
    }

    /// Fired strip indices on `plane`, if the plane was recorded.
    #[must_use]
    pub fn plane_strips(&self, plane: PlaneId) -> Option<&[u32]> {
        self.strip_hits.get(&plane).map(Vec::as_slice)
    }

    /// Recorded planes with their fired strips, in table order.
    pub fn planes(&self) -> impl Iterator<Item = (PlaneId, &[u32])> {
        self.strip_hits
            .iter()
            .map(|(plane, strips)| (*plane, strips.as_slice()))
    }

    /// Number of recorded planes (including empty ones).
    #[must_use]
    pub fn plane_count(&self) -> usize {
        self.strip_hits.len()
    }

    /// Dense per-strip array for `plane` with `strip_count` entries.
    ///
    /// Indices at or beyond `strip_count` are dropped; [`Self::validate`]
    /// reports them.
    #[must_use]
    pub fn plane_mask(&self, plane: PlaneId, strip_count: usize) -> Vec<bool> {
        let mut mask = vec![false; strip_count];
        if let Some(strips) = self.strip_hits.get(&plane) {
            for &strip in strips {
                if let Some(slot) = mask.get_mut(strip as usize) {
                    *slot = true;
                }
            }
        }
        mask
    }

    /// Calorimeter slice bitmap.
    #[must_use]
    pub fn calorimeter_hits(&self) -> &[bool] {
        &self.calorimeter_hits
    }

    /// True if no calorimeter slice fired.
    #[must_use]
    pub fn calorimeter_empty(&self) -> bool {
        !self.calorimeter_hits.iter().any(|&hit| hit)
    }

    /// Slice where the particle stopped: the last fired slice followed by an
    /// unfired one.
    ///
    /// Returns `None` for an empty bitmap or when no fired slice is followed
    /// by an unfired one.
    #[must_use]
    pub fn calorimeter_position(&self) -> Option<usize> {
        if self.calorimeter_empty() {
            return None;
        }
        self.calorimeter_hits
            .windows(2)
            .rposition(|pair| pair[0] && !pair[1])
    }

    /// Checks the strip invariants against the plane geometry.
    ///
    /// # Errors
    /// Returns [`Error::StripOutOfRange`] or [`Error::UnorderedStrips`].
    pub fn validate(&self, geometry: &GeometryTable) -> Result<()> {
        for (plane, strips) in self.planes() {
            if strips.windows(2).any(|pair| pair[0] >= pair[1]) {
                return Err(Error::UnorderedStrips(plane));
            }
            let strip_count = geometry.get(plane).strip_count;
            if let Some(&strip) = strips.iter().find(|&&strip| strip >= strip_count) {
                return Err(Error::StripOutOfRange {
                    plane,
                    strip,
                    strip_count,
                });
            }
        }
        Ok(())
    }
}

/// Records sort by calorimeter stopping slice, so events group by range.
impl Ord for HitRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.calorimeter_position()
            .cmp(&other.calorimeter_position())
            .then_with(|| self.strip_hits.cmp(&other.strip_hits))
            .then_with(|| self.calorimeter_hits.cmp(&other.calorimeter_hits))
    }
}

impl PartialOrd for HitRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask(len: usize, fired: &[usize]) -> Vec<bool> {
        let mut hits = vec![false; len];
        for &i in fired {
            hits[i] = true;
        }
        hits
    }

    #[test]
    fn test_add_plane_hits_is_sparse() {
        let mut record = HitRecord::new();
        record.add_plane_hits(PlaneId::X1, &mask(300, &[4, 5, 6]));
        record.add_plane_hits(PlaneId::Y1, &mask(300, &[]));

        assert_eq!(record.plane_strips(PlaneId::X1), Some(&[4, 5, 6][..]));
        assert_eq!(record.plane_strips(PlaneId::Y1), Some(&[][..]));
        assert_eq!(record.plane_strips(PlaneId::X2), None);
        assert_eq!(record.plane_count(), 2);
    }

    #[test]
    fn test_plane_mask_round_trip() {
        let dense = mask(300, &[0, 17, 299]);
        let mut record = HitRecord::new();
        record.add_plane_hits(PlaneId::Y3, &dense);

        assert_eq!(record.plane_mask(PlaneId::Y3, 300), dense);
        assert_eq!(record.plane_mask(PlaneId::X3, 300), vec![false; 300]);
    }

    #[test]
    fn test_planes_iterate_in_table_order() {
        let mut record = HitRecord::new();
        record.add_plane_hits(PlaneId::V, &mask(10, &[1]));
        record.add_plane_hits(PlaneId::Y1, &mask(10, &[2]));
        record.add_plane_hits(PlaneId::X2, &mask(10, &[3]));

        let order: Vec<PlaneId> = record.planes().map(|(plane, _)| plane).collect();
        assert_eq!(order, vec![PlaneId::Y1, PlaneId::X2, PlaneId::V]);
    }

    #[test]
    fn test_set_plane_strips_rejects_unordered() {
        let mut record = HitRecord::new();
        assert!(record.set_plane_strips(PlaneId::X1, vec![1, 5, 9]).is_ok());
        assert_eq!(
            record.set_plane_strips(PlaneId::X2, vec![5, 1]),
            Err(Error::UnorderedStrips(PlaneId::X2))
        );
        assert_eq!(
            record.set_plane_strips(PlaneId::X2, vec![3, 3]),
            Err(Error::UnorderedStrips(PlaneId::X2))
        );
    }

    #[test]
    fn test_validate_strip_range() {
        let geometry = GeometryTable::default();
        let mut record = HitRecord::new();
        record.set_plane_strips(PlaneId::X1, vec![0, 299]).unwrap();
        assert!(record.validate(&geometry).is_ok());

        record.set_plane_strips(PlaneId::Y2, vec![10, 300]).unwrap();
        assert_eq!(
            record.validate(&geometry),
            Err(Error::StripOutOfRange {
                plane: PlaneId::Y2,
                strip: 300,
                strip_count: 300,
            })
        );
    }

    #[test]
    fn test_calorimeter_position() {
        assert_eq!(HitRecord::new().calorimeter_position(), None);
        assert!(HitRecord::new().calorimeter_empty());

        let silent = HitRecord::with_calorimeter_hits(vec![false; 8]);
        assert!(silent.calorimeter_empty());
        assert_eq!(silent.calorimeter_position(), None);

        let stopped = HitRecord::with_calorimeter_hits(mask(8, &[0, 1, 2, 3]));
        assert_eq!(stopped.calorimeter_position(), Some(3));

        // Last marker wins.
        let gap = HitRecord::with_calorimeter_hits(mask(8, &[0, 1, 4, 5]));
        assert_eq!(gap.calorimeter_position(), Some(5));

        // Fired through the last slice: no falling marker.
        let punch_through = HitRecord::with_calorimeter_hits(vec![true; 8]);
        assert!(!punch_through.calorimeter_empty());
        assert_eq!(punch_through.calorimeter_position(), None);
    }

    #[test]
    fn test_ordering_by_calorimeter_position() {
        let deep = HitRecord::with_calorimeter_hits(mask(10, &[0, 1, 2, 3, 4, 5, 6]));
        let shallow = HitRecord::with_calorimeter_hits(mask(10, &[0, 1]));
        let none = HitRecord::new();

        let mut records = vec![deep.clone(), none.clone(), shallow.clone()];
        records.sort();
        assert_eq!(records, vec![none, shallow, deep]);
    }

    #[test]
    fn test_ordering_consistent_with_equality() {
        let mut a = HitRecord::with_calorimeter_hits(mask(4, &[0]));
        let mut b = a.clone();
        a.add_plane_hits(PlaneId::X1, &mask(4, &[1]));
        b.add_plane_hits(PlaneId::X1, &mask(4, &[2]));

        assert_eq!(a.calorimeter_position(), b.calorimeter_position());
        assert_ne!(a, b);
        assert_ne!(a.cmp(&b), Ordering::Equal);
        assert_eq!(a.cmp(&a.clone()), Ordering::Equal);
    }
}
