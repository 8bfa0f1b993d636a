//! Cluster classification on a single strip plane.
//!
//! A plane's fired-strip array is reduced to one of three outcomes: nothing
//! fired, exactly one contiguous cluster, or an ambiguous pattern (several
//! clusters, or a run the edge scan cannot bound). Only the single-cluster
//! case yields a coordinate.
#![allow(clippy::cast_precision_loss)]

use std::ops::RangeInclusive;
use striptrack_core::PlaneGeometry;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Inclusive range of strip indices forming one cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StripRange {
    /// First fired strip.
    pub first: usize,
    /// Last fired strip.
    pub last: usize,
}

impl StripRange {
    /// Zero-width range covering one strip.
    #[must_use]
    pub fn single(index: usize) -> Self {
        Self {
            first: index,
            last: index,
        }
    }

    /// Distance between first and last strip (0 for a single strip).
    #[must_use]
    pub fn width(&self) -> usize {
        self.last - self.first
    }

    /// Number of strips in the range, at least one.
    #[must_use]
    pub fn strip_count(&self) -> usize {
        self.width() + 1
    }

    /// Strip indices in the range.
    #[must_use]
    pub fn strips(&self) -> RangeInclusive<usize> {
        self.first..=self.last
    }
}

/// Result of classifying one plane's hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ClusterOutcome {
    /// No strip fired.
    NoSignal,
    /// Exactly one contiguous cluster.
    Single(StripRange),
    /// The pattern does not reduce to one cluster.
    Ambiguous {
        /// Unfired-to-fired transitions seen.
        rising_edges: usize,
        /// Fired-to-unfired transitions seen.
        falling_edges: usize,
    },
}

/// Classifies a plane with closed boundaries.
///
/// See [`classify_cluster_with`].
#[must_use]
pub fn classify_cluster(hits: &[bool]) -> ClusterOutcome {
    classify_cluster_with(hits, false)
}

/// Classifies a plane's per-strip hit array.
///
/// A lone fired strip is always a single cluster. With two or more fired
/// strips the run must be bounded by exactly one rising and one falling
/// edge. Edges are transitions between neighbouring strips; the array ends
/// only count as unfired neighbours when `open_boundaries` is set.
#[must_use]
pub fn classify_cluster_with(hits: &[bool], open_boundaries: bool) -> ClusterOutcome {
    let fired = hits.iter().filter(|&&hit| hit).count();
    match fired {
        0 => ClusterOutcome::NoSignal,
        1 => match hits.iter().position(|&hit| hit) {
            Some(index) => ClusterOutcome::Single(StripRange::single(index)),
            None => ClusterOutcome::NoSignal,
        },
        _ => find_single_run(hits, open_boundaries),
    }
}

fn find_single_run(hits: &[bool], open_boundaries: bool) -> ClusterOutcome {
    let mut rising_edges = 0;
    let mut falling_edges = 0;
    let mut first = None;
    let mut last = None;

    if open_boundaries && hits.first() == Some(&true) {
        rising_edges += 1;
        first = Some(0);
    }
    for (i, pair) in hits.windows(2).enumerate() {
        match (pair[0], pair[1]) {
            (false, true) => {
                rising_edges += 1;
                first = Some(i + 1);
            }
            (true, false) => {
                falling_edges += 1;
                last = Some(i);
            }
            _ => {}
        }
    }
    if open_boundaries && hits.last() == Some(&true) {
        falling_edges += 1;
        last = Some(hits.len() - 1);
    }

    match (rising_edges, falling_edges, first, last) {
        (1, 1, Some(first), Some(last)) if first <= last => {
            ClusterOutcome::Single(StripRange { first, last })
        }
        _ => ClusterOutcome::Ambiguous {
            rising_edges,
            falling_edges,
        },
    }
}

/// Physical coordinate of a cluster: the unweighted centroid of its strip
/// centres.
#[must_use]
pub fn coordinate_of(geometry: &PlaneGeometry, range: StripRange) -> f64 {
    let sum: f64 = range.strips().map(|strip| geometry.strip_center(strip)).sum();
    sum / range.strip_count() as f64
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use approx::assert_relative_eq;
    use striptrack_core::{GeometryTable, PlaneId};

    fn mask(len: usize, fired: &[usize]) -> Vec<bool> {
        let mut hits = vec![false; len];
        for &i in fired {
            hits[i] = true;
        }
        hits
    }

    fn plane() -> PlaneGeometry {
        *GeometryTable::default().get(PlaneId::X1)
    }

    #[test]
    fn test_no_signal() {
        assert_eq!(classify_cluster(&[]), ClusterOutcome::NoSignal);
        assert_eq!(classify_cluster(&mask(300, &[])), ClusterOutcome::NoSignal);
    }

    #[test]
    fn test_single_strip_anywhere() {
        for index in [0, 1, 150, 299] {
            let outcome = classify_cluster(&mask(300, &[index]));
            assert_eq!(outcome, ClusterOutcome::Single(StripRange::single(index)));
            if let ClusterOutcome::Single(range) = outcome {
                assert_eq!(range.width(), 0);
                assert_eq!(range.strip_count(), 1);
                let geometry = plane();
                let expected = -geometry.half_width
                    + index as f64 * geometry.pitch
                    + geometry.pitch / 2.0
                    + geometry.offset;
                assert_eq!(coordinate_of(&geometry, range), expected);
            }
        }
    }

    #[test]
    fn test_multi_strip_cluster() {
        let outcome = classify_cluster(&mask(300, &[4, 5, 6]));
        let range = StripRange { first: 4, last: 6 };
        assert_eq!(outcome, ClusterOutcome::Single(range));
        assert_eq!(range.strip_count(), 3);
        // Mean of -29100, -28900, -28700.
        assert_relative_eq!(coordinate_of(&plane(), range), -28900.0);
    }

    #[test]
    fn test_two_strip_cluster_centroid_between_strips() {
        let outcome = classify_cluster(&mask(300, &[149, 150]));
        let ClusterOutcome::Single(range) = outcome else {
            panic!("expected a single cluster, got {outcome:?}");
        };
        assert_relative_eq!(coordinate_of(&plane(), range), 0.0);
    }

    #[test]
    fn test_two_clusters_are_ambiguous() {
        assert_eq!(
            classify_cluster(&mask(300, &[2, 50])),
            ClusterOutcome::Ambiguous {
                rising_edges: 2,
                falling_edges: 2
            }
        );
        assert!(matches!(
            classify_cluster(&mask(300, &[10, 11, 12, 20, 21])),
            ClusterOutcome::Ambiguous { .. }
        ));
    }

    #[test]
    fn test_run_touching_edge_needs_open_boundaries() {
        let leading = mask(300, &[0, 1, 2]);
        assert_eq!(
            classify_cluster(&leading),
            ClusterOutcome::Ambiguous {
                rising_edges: 0,
                falling_edges: 1
            }
        );
        assert_eq!(
            classify_cluster_with(&leading, true),
            ClusterOutcome::Single(StripRange { first: 0, last: 2 })
        );

        let trailing = mask(300, &[298, 299]);
        assert!(matches!(
            classify_cluster(&trailing),
            ClusterOutcome::Ambiguous { .. }
        ));
        assert_eq!(
            classify_cluster_with(&trailing, true),
            ClusterOutcome::Single(StripRange {
                first: 298,
                last: 299
            })
        );

        let everything = vec![true; 8];
        assert_eq!(
            classify_cluster_with(&everything, true),
            ClusterOutcome::Single(StripRange { first: 0, last: 7 })
        );
    }

    #[test]
    fn test_runs_at_both_ends_are_ambiguous() {
        // One rising and one falling edge, but in the wrong order.
        let hits = mask(10, &[0, 1, 8, 9]);
        assert_eq!(
            classify_cluster(&hits),
            ClusterOutcome::Ambiguous {
                rising_edges: 1,
                falling_edges: 1
            }
        );
        assert!(matches!(
            classify_cluster_with(&hits, true),
            ClusterOutcome::Ambiguous { .. }
        ));
    }

    #[test]
    fn test_offset_shifts_coordinate() {
        let geometry = PlaneGeometry {
            offset: -25.0,
            ..plane()
        };
        let range = StripRange { first: 10, last: 11 };
        assert_relative_eq!(
            coordinate_of(&geometry, range),
            coordinate_of(&plane(), range) - 25.0
        );
    }
}
