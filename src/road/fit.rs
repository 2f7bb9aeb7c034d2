//! Weighted straight-line fits over point combinations.
//!
//! Every plane of a road contributes a list of candidate positions. A fit
//! takes exactly one candidate from each non-empty list and solves the
//! weighted normal equations of `x = pos + slope·z` in closed form. All
//! combinations are enumerated with an odometer, up to a configurable cap.

use crate::hits::HitKey;
use nalgebra::Matrix2;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Relative threshold on the normal-equation determinant.
const SINGULAR_REL: f64 = 1e-12;

/// Candidate hit position on one plane.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Candidate transverse coordinate.
    pub x: f64,
    /// Plane position.
    pub z: f64,
    /// Resolution of the underlying hit (sigma).
    pub res: f64,
    pub hit: HitKey,
}

impl Point {
    pub fn new(x: f64, z: f64, res: f64, hit: HitKey) -> Self {
        Self { x, z, res, hit }
    }

    #[inline]
    fn weight(&self) -> f64 {
        1.0 / (self.res * self.res)
    }
}

/// One weighted least-squares solution for a specific point combination.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FitResult {
    pub pos: f64,
    pub slope: f64,
    pub chi2: f64,
    pub ndof: u32,
    /// Parameter covariance `[V11, V12, V22]` of `(pos, slope)`.
    pub cov: [f64; 3],
    points: Vec<Point>,
}

impl FitResult {
    /// Fits the given combination. Returns `None` with fewer than three
    /// points or when all points share (nearly) the same z.
    pub fn from_points(points: Vec<Point>) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }
        let mut accum = LineAccum::default();
        for p in &points {
            accum.accumulate(p);
        }
        let det = accum.determinant();
        if det.is_nan() || det <= SINGULAR_REL * accum.sw * accum.swzz {
            return None;
        }
        let (pos, slope) = accum.solve(det);
        let chi2 = points
            .iter()
            .map(|p| {
                let r = p.x - pos - slope * p.z;
                p.weight() * r * r
            })
            .sum();
        Some(Self {
            pos,
            slope,
            chi2,
            ndof: (points.len() - 2) as u32,
            cov: [accum.swzz / det, -accum.swz / det, accum.sw / det],
            points,
        })
    }

    /// Points used by this fit, one per contributing plane.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    #[inline]
    pub fn pos_at(&self, z: f64) -> f64 {
        self.pos + self.slope * z
    }

    /// Variance of `pos_at(z)`: `V11 + 2·V12·z + V22·z²`.
    #[inline]
    pub fn pos_errsq(&self, z: f64) -> f64 {
        self.cov[0] + 2.0 * self.cov[1] * z + self.cov[2] * z * z
    }

    /// Symmetric covariance matrix of `(pos, slope)`.
    pub fn covariance(&self) -> Matrix2<f64> {
        Matrix2::new(self.cov[0], self.cov[1], self.cov[1], self.cov[2])
    }

    /// Ascending chi2 ordering.
    pub fn chi2_cmp(a: &FitResult, b: &FitResult) -> Ordering {
        a.chi2.total_cmp(&b.chi2)
    }
}

/// Bookkeeping from one combinatorial fit pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FitSummary {
    /// Number of distinct combinations (saturating).
    pub combinations: u64,
    pub evaluated: u64,
    /// Combinations beyond the cap that were not evaluated.
    pub skipped: u64,
    /// Fits kept after discarding degenerate combinations.
    pub retained: usize,
}

#[derive(Default)]
struct LineAccum {
    sw: f64,
    swz: f64,
    swzz: f64,
    swx: f64,
    swzx: f64,
}

impl LineAccum {
    fn accumulate(&mut self, p: &Point) {
        let w = p.weight();
        self.sw += w;
        self.swz += w * p.z;
        self.swzz += w * p.z * p.z;
        self.swx += w * p.x;
        self.swzx += w * p.z * p.x;
    }

    fn determinant(&self) -> f64 {
        self.sw * self.swzz - self.swz * self.swz
    }

    fn solve(&self, det: f64) -> (f64, f64) {
        let pos = (self.swzz * self.swx - self.swz * self.swzx) / det;
        let slope = (self.sw * self.swzx - self.swz * self.swx) / det;
        (pos, slope)
    }
}

/// Fits every one-point-per-list combination, at most `cap` of them, and
/// returns the valid fits sorted by ascending chi2.
///
/// Enumeration is odometer order with the last list varying fastest, so
/// when the cap is hit the earlier lists stay on their first entries.
pub(crate) fn fit_combinations(lists: &[&[Point]], cap: usize) -> (Vec<FitResult>, FitSummary) {
    let mut summary = FitSummary::default();
    if lists.is_empty() || lists.iter().any(|l| l.is_empty()) {
        return (Vec::new(), summary);
    }
    summary.combinations = lists
        .iter()
        .fold(1u64, |acc, l| acc.saturating_mul(l.len() as u64));

    let mut fits = Vec::new();
    let mut odometer = vec![0usize; lists.len()];
    'combos: while summary.evaluated < cap as u64 {
        let combo: Vec<Point> = odometer
            .iter()
            .zip(lists)
            .map(|(&i, list)| list[i])
            .collect();
        summary.evaluated += 1;
        if let Some(fit) = FitResult::from_points(combo) {
            fits.push(fit);
        }

        // advance, last list fastest
        let mut k = lists.len();
        loop {
            if k == 0 {
                break 'combos;
            }
            k -= 1;
            odometer[k] += 1;
            if odometer[k] < lists[k].len() {
                break;
            }
            odometer[k] = 0;
        }
    }
    summary.skipped = summary.combinations - summary.evaluated;
    fits.sort_by(FitResult::chi2_cmp);
    summary.retained = fits.len();
    (fits, summary)
}
