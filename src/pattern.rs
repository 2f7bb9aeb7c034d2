//! Pattern nodes delivered by the tree search.
//!
//! A node is a bin in (z, x) space, a quadrilateral bounded by two z edges
//! and a straight left and right side, together with the hits found
//! inside it.

use crate::hits::HitKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Quadrilateral bin: x extent `[left, right]` at `z_lo` and at `z_hi`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatternBin {
    pub z_lo: f64,
    pub z_hi: f64,
    pub lo: [f64; 2],
    pub hi: [f64; 2],
}

#[inline]
pub(crate) fn interpolate(z: f64, z0: f64, x0: f64, z1: f64, x1: f64) -> f64 {
    let dz = z1 - z0;
    if dz.abs() <= f64::EPSILON {
        return x0;
    }
    x0 + (x1 - x0) * (z - z0) / dz
}

impl PatternBin {
    pub fn new(z_lo: f64, z_hi: f64, lo: [f64; 2], hi: [f64; 2]) -> Self {
        Self { z_lo, z_hi, lo, hi }
    }

    /// Left edge extended as a straight line to `z`.
    #[inline]
    pub fn left_at(&self, z: f64) -> f64 {
        interpolate(z, self.z_lo, self.lo[0], self.z_hi, self.hi[0])
    }

    /// Right edge extended as a straight line to `z`.
    #[inline]
    pub fn right_at(&self, z: f64) -> f64 {
        interpolate(z, self.z_lo, self.lo[1], self.z_hi, self.hi[1])
    }

    /// True when the x extents of both bins intersect, within `tol`, at
    /// both z edges of the common z range. Bins without common z never
    /// overlap.
    pub fn overlaps(&self, other: &PatternBin, tol: f64) -> bool {
        let z0 = self.z_lo.max(other.z_lo);
        let z1 = self.z_hi.min(other.z_hi);
        if z0 > z1 + tol {
            return false;
        }
        [z0, z1].iter().all(|&z| {
            self.left_at(z) <= other.right_at(z) + tol && other.left_at(z) <= self.right_at(z) + tol
        })
    }
}

/// Tree-search result: a bin plus the hits consistent with it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatternNode {
    pub bin: PatternBin,
    pub hits: BTreeSet<HitKey>,
}

impl PatternNode {
    pub fn new(bin: PatternBin, hits: impl IntoIterator<Item = HitKey>) -> Self {
        Self {
            bin,
            hits: hits.into_iter().collect(),
        }
    }
}
