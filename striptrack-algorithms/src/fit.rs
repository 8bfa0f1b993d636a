//! Straight-line fits of `f = a * z + b`.
//!
//! - [`two_point_line`]: exact line through two points, no covariance.
//! - [`weighted_line_with_weights`]: weighted least squares with the
//!   `(b, a)` covariance, weights given directly.
//! - [`weighted_line`]: the same with inverse-variance weights `1 / sigma^2`.
//! - [`least_squares_line`]: unweighted least squares, no covariance.
//!
//! Degenerate input (mismatched lengths, fewer than two points, all `z`
//! equal, non-finite values) yields `None`.
#![allow(clippy::cast_precision_loss)]

use striptrack_core::LineModel;

/// Weighted fit result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedFit {
    /// Fitted line with covariance.
    pub line: LineModel,
    /// Weighted sum of squared residuals.
    pub chi_square: f64,
}

/// Exact line through `(z[0], f[0])` and `(z[1], f[1])`.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn two_point_line(z: [f64; 2], f: [f64; 2]) -> Option<LineModel> {
    if z[0] == z[1] {
        return None;
    }
    let a = (f[0] - f[1]) / (z[0] - z[1]);
    let b = f[0] - a * z[0];
    finite_line(LineModel::new(a, b))
}

/// Weighted least-squares line with weights `1 / sigma^2`.
#[must_use]
pub fn weighted_line(z: &[f64], f: &[f64], sigma: &[f64]) -> Option<WeightedFit> {
    if sigma.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
        return None;
    }
    let weights: Vec<f64> = sigma.iter().map(|s| 1.0 / (s * s)).collect();
    weighted_line_with_weights(z, f, &weights)
}

/// Weighted least-squares line with the given per-point weights.
///
/// Weights must be finite and positive. Means and second moments are
/// accumulated incrementally, which keeps the fit stable for large `z`
/// offsets such as detector positions in micrometres.
#[must_use]
pub fn weighted_line_with_weights(z: &[f64], f: &[f64], weights: &[f64]) -> Option<WeightedFit> {
    if z.len() != f.len() || z.len() != weights.len() || z.len() < 2 {
        return None;
    }
    if weights.iter().any(|w| !(w.is_finite() && *w > 0.0)) {
        return None;
    }

    let mut total = 0.0;
    let mut mean_z = 0.0;
    let mut mean_f = 0.0;
    for ((&zi, &fi), &wi) in z.iter().zip(f).zip(weights) {
        total += wi;
        mean_z += (zi - mean_z) * (wi / total);
        mean_f += (fi - mean_f) * (wi / total);
    }

    total = 0.0;
    let mut dzz = 0.0;
    let mut dzf = 0.0;
    for ((&zi, &fi), &wi) in z.iter().zip(f).zip(weights) {
        let dz = zi - mean_z;
        let df = fi - mean_f;
        total += wi;
        dzz += (dz * dz - dzz) * (wi / total);
        dzf += (dz * df - dzf) * (wi / total);
    }
    if dzz.is_nan() || dzz <= 0.0 {
        return None;
    }

    let a = dzf / dzz;
    let b = mean_f - mean_z * a;
    let cov00 = (1.0 / total) * (1.0 + mean_z * mean_z / dzz);
    let cov01 = -mean_z / (total * dzz);
    let cov11 = 1.0 / (total * dzz);

    let chi_square = z
        .iter()
        .zip(f)
        .zip(weights)
        .map(|((&zi, &fi), &wi)| {
            let residual = fi - (a * zi + b);
            wi * residual * residual
        })
        .sum();

    let line = finite_line(LineModel::with_covariance(a, b, cov00, cov01, cov11))?;
    Some(WeightedFit { line, chi_square })
}

/// Unweighted least-squares line through `n >= 2` points.
#[must_use]
pub fn least_squares_line(z: &[f64], f: &[f64]) -> Option<LineModel> {
    if z.len() != f.len() || z.len() < 2 {
        return None;
    }
    let n = z.len() as f64;
    let mean_z = z.iter().sum::<f64>() / n;
    let mean_f = f.iter().sum::<f64>() / n;

    let (szz, szf) = z.iter().zip(f).fold((0.0, 0.0), |(szz, szf), (&zi, &fi)| {
        let dz = zi - mean_z;
        (szz + dz * dz, szf + dz * (fi - mean_f))
    });
    if szz.is_nan() || szz <= 0.0 {
        return None;
    }

    let a = szf / szz;
    finite_line(LineModel::new(a, mean_f - a * mean_z))
}

fn finite_line(line: LineModel) -> Option<LineModel> {
    let values = [line.a, line.b, line.cov00, line.cov01, line.cov11];
    values.iter().all(|v| v.is_finite()).then_some(line)
}
