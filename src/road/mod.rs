//! Roads: track candidate regions within one projection.
//!
//! A road starts from one pattern node of the tree search and absorbs further
//! compatible nodes, growing a quadrilateral region in (z, x) and the union of
//! the nodes' hits. Once growth stops, [`Road::finish`] collects, for each
//! plane inside the region, every hit position that falls inside the region's
//! x envelope. [`Road::fit`] then fits a straight line through every
//! one-candidate-per-plane combination and ranks the results by chi2.
//!
//! Lifecycle:
//!
//! ```text
//! Road::new(seed) -> add(node)* -> finish(&hits) -> fit() -> [void()]
//! ```
//!
//! Invariants maintained by the methods below:
//! - `hits()` is the union of the hit sets of `patterns()`.
//! - the region never shrinks as nodes are added.
//! - `fits()` is sorted by ascending chi2 and is non-empty iff `is_good()`.
//! - the best-fit accessors (`pos`, `slope`, `chi2`, `cov`) mirror `fits()[0]`.

mod corners;
mod error;
mod fit;
mod options;

pub use corners::Corners;
pub use error::RoadError;
pub use fit::{FitResult, FitSummary, Point};
pub use options::RoadParams;

use crate::angle::{angular_difference, axis};
use crate::geometry::Projection;
use crate::hits::{HitKey, HitStore};
use crate::pattern::{PatternBin, PatternNode};
use log::{debug, warn};
use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Identifier of the downstream 3-D track that uses a road.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub u32);

/// Position candidates of one plane inside the road.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlaneCandidates {
    /// Plane index within the projection.
    pub plane: u16,
    pub z: f64,
    pub points: Vec<Point>,
}

/// Track candidate region of one projection with its ranked line fits.
#[derive(Clone, Debug)]
pub struct Road<'a> {
    projection: &'a Projection,
    params: RoadParams,
    region: PatternBin,
    patterns: Vec<&'a PatternNode>,
    hits: BTreeSet<HitKey>,
    candidates: Vec<PlaneCandidates>,
    fits: Vec<FitResult>,

    // Copy of fits[0] for quick access
    pos: f64,
    slope: f64,
    chi2: f64,
    cov: [f64; 3],
    ndof: u32,

    finished: bool,
    good: bool,
    voided: bool,
    track: Option<TrackId>,
}

/// Union of two bins. Each side is extended as a straight line over the
/// combined z range; left sides take the minimum, right sides the maximum.
fn merge_bins(a: &PatternBin, b: &PatternBin) -> PatternBin {
    let z_lo = a.z_lo.min(b.z_lo);
    let z_hi = a.z_hi.max(b.z_hi);
    let edge = |z: f64| {
        [
            a.left_at(z).min(b.left_at(z)),
            a.right_at(z).max(b.right_at(z)),
        ]
    };
    PatternBin {
        z_lo,
        z_hi,
        lo: edge(z_lo),
        hi: edge(z_hi),
    }
}

impl<'a> Road<'a> {
    /// Seeds a road from one pattern node.
    pub fn new(seed: &'a PatternNode, projection: &'a Projection, params: RoadParams) -> Self {
        Self {
            projection,
            params,
            region: seed.bin,
            patterns: vec![seed],
            hits: seed.hits.clone(),
            candidates: Vec::new(),
            fits: Vec::new(),
            pos: 0.0,
            slope: 0.0,
            chi2: f64::INFINITY,
            cov: [0.0; 3],
            ndof: 0,
            finished: false,
            good: false,
            voided: false,
            track: None,
        }
    }

    /// Absorbs a pattern node if its hits are compatible with the road.
    ///
    /// On success the region becomes the union of the old region and the
    /// node's bin and the node's hits join the road's hit set.
    pub fn add(&mut self, node: &'a PatternNode) -> Result<(), RoadError> {
        if self.finished {
            return Err(RoadError::Frozen);
        }
        if let Some(plane) = self.find_conflict(&node.hits) {
            return Err(RoadError::PatternConflict { plane });
        }
        self.region = merge_bins(&self.region, &node.bin);
        self.hits.extend(node.hits.iter().copied());
        self.patterns.push(node);
        Ok(())
    }

    /// True if a pattern with these hits may join the road: on every plane
    /// where both have hits, they share at least one wire.
    pub fn check_match(&self, hits: &BTreeSet<HitKey>) -> bool {
        self.find_conflict(hits).is_none()
    }

    fn find_conflict(&self, hits: &BTreeSet<HitKey>) -> Option<u16> {
        let mut iter = hits.iter().peekable();
        let mut node_wires: Vec<u32> = Vec::new();
        while let Some(first) = iter.next() {
            let plane = first.plane;
            node_wires.clear();
            node_wires.push(first.wire);
            while let Some(k) = iter.next_if(|k| k.plane == plane) {
                node_wires.push(k.wire);
            }
            let mut on_plane = self
                .hits
                .range(HitKey::new(plane, 0, 0)..=HitKey::new(plane, u32::MAX, u32::MAX))
                .peekable();
            if on_plane.peek().is_none() {
                continue;
            }
            if !on_plane.any(|k| node_wires.contains(&k.wire)) {
                return Some(plane);
            }
        }
        None
    }

    /// Whether a plane at `z` lies within the road's z extent (with `z_eps`).
    #[inline]
    pub fn is_in_range(&self, z: f64) -> bool {
        let eps = self.params.z_eps;
        self.region.z_lo - eps <= z && z <= self.region.z_hi + eps
    }

    /// x envelope `[left, right]` of the road at `z`.
    #[inline]
    pub fn envelope_at(&self, z: f64) -> [f64; 2] {
        [self.region.left_at(z), self.region.right_at(z)]
    }

    /// Freezes the road and collects per-plane position candidates from the
    /// event's hit store. Returns the number of planes with candidates.
    ///
    /// Fails with [`RoadError::InsufficientPlanes`] (and leaves the road
    /// not good) when fewer than `min_planes` planes have candidates.
    pub fn finish(&mut self, store: &HitStore) -> Result<usize, RoadError> {
        if self.finished {
            return Err(RoadError::Frozen);
        }
        self.finished = true;
        let found = self.collect_coordinates(store);
        if found < self.params.min_planes {
            self.good = false;
            debug!(
                "road in {}: {} planes with candidates, need {}",
                self.projection.name, found, self.params.min_planes
            );
            return Err(RoadError::InsufficientPlanes {
                found,
                minimum: self.params.min_planes,
            });
        }
        Ok(found)
    }

    fn collect_coordinates(&mut self, store: &HitStore) -> usize {
        self.candidates.clear();
        for (ip, plane) in self.projection.planes().iter().enumerate() {
            if !self.is_in_range(plane.z) {
                continue;
            }
            let [left, right] = self.envelope_at(plane.z);
            let inside = |x: f64| left <= x && x <= right;
            let mut points = Vec::new();
            for (i, hit) in store.plane(ip).iter().enumerate() {
                let key = HitKey::new(ip as u16, hit.wire, i as u32);
                let (xl, xr) = (hit.pos_left(), hit.pos_right());
                if inside(xl) {
                    points.push(Point::new(xl, plane.z, hit.resolution, key));
                }
                if xr != xl && inside(xr) {
                    points.push(Point::new(xr, plane.z, hit.resolution, key));
                }
            }
            self.candidates.push(PlaneCandidates {
                plane: ip as u16,
                z: plane.z,
                points,
            });
        }
        self.candidates
            .iter()
            .filter(|c| !c.points.is_empty())
            .count()
    }

    /// Fits all candidate combinations and ranks them by chi2.
    ///
    /// Combinations beyond `max_combinations` are skipped and counted in the
    /// returned summary.
    pub fn fit(&mut self) -> Result<FitSummary, RoadError> {
        if !self.finished {
            return Err(RoadError::NotFinished);
        }
        self.fits.clear();
        self.set_best(None);
        let lists: Vec<&[Point]> = self
            .candidates
            .iter()
            .filter(|c| !c.points.is_empty())
            .map(|c| c.points.as_slice())
            .collect();
        if lists.len() < self.params.min_planes {
            return Err(RoadError::InsufficientPlanes {
                found: lists.len(),
                minimum: self.params.min_planes,
            });
        }
        let (fits, summary) = fit::fit_combinations(&lists, self.params.max_combinations);
        if summary.skipped > 0 {
            warn!(
                "road in {}: {} of {} point combinations exceed the cap of {} and were skipped",
                self.projection.name,
                summary.skipped,
                summary.combinations,
                self.params.max_combinations
            );
        }
        self.fits = fits;
        let best = self.fits.first().map(|f| (f.pos, f.slope, f.chi2, f.cov, f.ndof));
        self.set_best(best);
        if !self.good {
            return Err(RoadError::NoValidFit);
        }
        debug!(
            "road in {}: {} fits, best chi2={:.3} ndof={}",
            self.projection.name,
            self.fits.len(),
            self.chi2,
            self.ndof
        );
        Ok(summary)
    }

    fn set_best(&mut self, best: Option<(f64, f64, f64, [f64; 3], u32)>) {
        match best {
            Some((pos, slope, chi2, cov, ndof)) => {
                self.pos = pos;
                self.slope = slope;
                self.chi2 = chi2;
                self.cov = cov;
                self.ndof = ndof;
                self.good = true;
            }
            None => {
                self.pos = 0.0;
                self.slope = 0.0;
                self.chi2 = f64::INFINITY;
                self.cov = [0.0; 3];
                self.ndof = 0;
                self.good = false;
            }
        }
    }

    /// True if every hit of `other` also belongs to this road.
    pub fn include(&self, other: &Road<'_>) -> bool {
        other.hits.is_subset(&self.hits)
    }

    /// Intersection, in the detector (x, y) frame, of this road's best line
    /// with `other`'s best line, both evaluated at `z`.
    ///
    /// Each road measures `u = x·cosθ + y·sinθ` for its projection angle θ,
    /// so the two lines give a 2×2 linear system in (x, y).
    pub fn intersect(&self, other: &Road<'_>, z: f64) -> Result<Vector2<f64>, RoadError> {
        let a = self.fit_result()?;
        let b = other.fit_result()?;
        let angle_a = self.projection.angle();
        let angle_b = other.projection.angle();
        let parallel = RoadError::ParallelProjections { angle_a, angle_b };
        if angular_difference(angle_a, angle_b).sin().abs() <= self.params.singular_eps {
            return Err(parallel);
        }
        let [ca, sa] = axis(angle_a);
        let [cb, sb] = axis(angle_b);
        let m = Matrix2::new(ca, sa, cb, sb);
        let inv = m.try_inverse().ok_or(parallel)?;
        Ok(inv * Vector2::new(a.pos_at(z), b.pos_at(z)))
    }

    /// Orders roads by ascending best chi2. Roads without a fit sort last.
    pub fn compare(&self, other: &Road<'_>) -> Ordering {
        self.chi2.total_cmp(&other.chi2)
    }

    /// Excludes the road from further use; its data stays inspectable.
    pub fn void(&mut self) {
        self.voided = true;
    }

    /// True if the road was voided or has no fit.
    pub fn is_void(&self) -> bool {
        self.voided || !self.good
    }

    /// True if the road has at least one fit.
    pub fn is_good(&self) -> bool {
        self.good
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Best fit.
    pub fn fit_result(&self) -> Result<&FitResult, RoadError> {
        self.fits.first().ok_or(RoadError::NoFit)
    }

    /// Points used by the best fit.
    pub fn points(&self) -> Result<&[Point], RoadError> {
        self.fit_result().map(FitResult::points)
    }

    /// All fits, best first.
    pub fn fits(&self) -> &[FitResult] {
        &self.fits
    }

    pub fn n_fits(&self) -> usize {
        self.fits.len()
    }

    pub fn pos(&self) -> f64 {
        self.pos
    }

    /// Best-fit position at `z`.
    pub fn pos_at(&self, z: f64) -> f64 {
        self.pos + self.slope * z
    }

    /// Variance of the best-fit position at `z`.
    pub fn pos_errsq(&self, z: f64) -> f64 {
        self.cov[0] + 2.0 * self.cov[1] * z + self.cov[2] * z * z
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }

    pub fn chi2(&self) -> f64 {
        self.chi2
    }

    pub fn ndof(&self) -> u32 {
        self.ndof
    }

    pub fn cov(&self) -> [f64; 3] {
        self.cov
    }

    pub fn projection(&self) -> &'a Projection {
        self.projection
    }

    pub fn params(&self) -> &RoadParams {
        &self.params
    }

    pub fn region(&self) -> &PatternBin {
        &self.region
    }

    pub fn corners(&self) -> Corners {
        let r = &self.region;
        Corners {
            x_ll: r.lo[0],
            x_lr: r.lo[1],
            z_l: r.z_lo,
            x_ul: r.hi[0],
            x_ur: r.hi[1],
            z_u: r.z_hi,
        }
    }

    pub fn patterns(&self) -> &[&'a PatternNode] {
        &self.patterns
    }

    pub fn hits(&self) -> &BTreeSet<HitKey> {
        &self.hits
    }

    /// Per-plane candidate lists collected by `finish`, in plane order.
    pub fn candidates(&self) -> &[PlaneCandidates] {
        &self.candidates
    }

    pub fn track(&self) -> Option<TrackId> {
        self.track
    }

    pub fn set_track(&mut self, track: TrackId) {
        self.track = Some(track);
    }
}

/// Sorts roads by ascending best chi2.
pub fn sort_roads(roads: &mut [Road<'_>]) {
    roads.sort_by(|a, b| a.compare(b));
}

impl std::fmt::Display for Road<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let c = self.corners();
        write!(
            f,
            "Road {}: z=[{:.4},{:.4}] x_lo=[{:.4},{:.4}] x_hi=[{:.4},{:.4}] patterns={} hits={}",
            self.projection.name,
            c.z_l,
            c.z_u,
            c.x_ll,
            c.x_lr,
            c.x_ul,
            c.x_ur,
            self.patterns.len(),
            self.hits.len()
        )?;
        if self.good {
            write!(
                f,
                " fits={} pos={:.5} slope={:.5} chi2={:.3} ndof={}",
                self.fits.len(),
                self.pos,
                self.slope,
                self.chi2,
                self.ndof
            )?;
        } else {
            write!(f, " (no fit)")?;
        }
        if self.voided {
            write!(f, " [void]")?;
        }
        Ok(())
    }
}
