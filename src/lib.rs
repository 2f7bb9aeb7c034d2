//! Road construction and straight-line track fitting for drift-chamber wire
//! projections.
//!
//! A projection is a stack of wire planes sharing one orientation. For each
//! event a tree search delivers pattern nodes (bins in (z, x) with the hits
//! inside them); this crate grows those nodes into roads, collects the
//! left/right-ambiguous hit positions inside every road, fits straight lines
//! through all candidate combinations and ranks them by chi2. Best-fit lines
//! of two projections with different wire angles are intersected to obtain a
//! transverse (x, y) space point.

// Core model
pub mod geometry;
pub mod hits;
pub mod pattern;
pub mod road;
pub mod ttd;

// Drivers, tooling and reports
pub mod config;
pub mod diagnostics;
pub mod finder;
pub mod io;

pub mod angle;

// --- High-level re-exports -------------------------------------------------

pub use crate::finder::{FinderOutput, FinderStats, RoadFinder};
pub use crate::geometry::{PlaneType, Projection, WirePlane};
pub use crate::hits::{Hit, HitKey, HitStore};
pub use crate::pattern::{PatternBin, PatternNode};
pub use crate::road::{FitResult, Road, RoadError, RoadParams, TrackId};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use drift_road::prelude::*;
///
/// # fn main() {
/// let planes = (0..4)
///     .map(|i| WirePlane::new(format!("x{i}"), PlaneType::X, 0.1 * i as f64, 2e-4))
///     .collect();
/// let proj = Projection::new("x", PlaneType::X, 0.0, planes);
/// let mut store = HitStore::new(proj.n_planes());
/// let keys: Vec<HitKey> = proj
///     .planes()
///     .iter()
///     .enumerate()
///     .map(|(i, p)| store.push(i as u16, Hit::new(5, 0.05, 0.0, p.resolution, p.z)))
///     .collect();
/// let nodes = vec![PatternNode::new(
///     PatternBin::new(0.0, 0.3, [0.04, 0.06], [0.04, 0.06]),
///     keys,
/// )];
///
/// let out = RoadFinder::new(RoadParams::default()).find(&proj, &nodes, &store);
/// for road in out.good_roads() {
///     println!("{road}");
/// }
/// # }
/// ```
pub mod prelude {
    pub use crate::{
        Hit, HitKey, HitStore, PatternBin, PatternNode, PlaneType, Projection, Road, RoadFinder,
        RoadParams, WirePlane,
    };
}
