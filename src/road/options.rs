use serde::{Deserialize, Serialize};

/// Parameters for road building, fitting and road finding.
///
/// - `z_eps`: tolerance on the road's z extent when selecting planes, so that
///   planes sitting exactly on a bin edge are included.
/// - `min_planes`: minimum number of planes with candidates for a fit.
/// - `max_combinations`: cap on the point combinations evaluated per road.
///   Combinations are enumerated in odometer order over the planes sorted
///   by z, the last plane varying fastest, and everything past the cap is
///   counted and skipped. A capped road therefore only ever sees the first
///   candidates of its upstream planes.
/// - `merge_tolerance`: slack (m) when testing whether a pattern bin touches
///   a road's region during road finding.
/// - `singular_eps`: smallest |sin Δθ| accepted when intersecting roads.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadParams {
    pub z_eps: f64,
    pub min_planes: usize,
    pub max_combinations: usize,
    pub merge_tolerance: f64,
    pub singular_eps: f64,
}

impl Default for RoadParams {
    fn default() -> Self {
        Self {
            z_eps: 1e-4,
            min_planes: 3,
            max_combinations: 1000,
            merge_tolerance: 0.0,
            singular_eps: 1e-9,
        }
    }
}
