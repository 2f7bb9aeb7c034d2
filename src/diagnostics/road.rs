use crate::road::{Corners, FitResult, Road, TrackId};
use serde::Serialize;

/// Line parameters of one ranked fit.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FitDescriptor {
    pub pos: f64,
    pub slope: f64,
    pub chi2: f64,
    pub ndof: u32,
    pub cov: [f64; 3],
    /// Wire numbers of the points used, in plane order.
    pub wires: Vec<u32>,
}

impl FitDescriptor {
    pub fn from_fit(fit: &FitResult) -> Self {
        Self {
            pos: fit.pos,
            slope: fit.slope,
            chi2: fit.chi2,
            ndof: fit.ndof,
            cov: fit.cov,
            wires: fit.points().iter().map(|p| p.hit.wire).collect(),
        }
    }
}

/// Number of position candidates found on one plane.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSummary {
    pub plane: u16,
    pub z: f64,
    pub count: usize,
}

/// Snapshot of a road after fitting.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadDiagnostics {
    pub corners: Corners,
    pub patterns: usize,
    pub hits: usize,
    pub candidates: Vec<CandidateSummary>,
    pub n_fits: usize,
    pub fits: Vec<FitDescriptor>,
    pub good: bool,
    pub void: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track: Option<TrackId>,
}

impl RoadDiagnostics {
    pub fn from_road(road: &Road<'_>, max_fits: usize) -> Self {
        Self {
            corners: road.corners(),
            patterns: road.patterns().len(),
            hits: road.hits().len(),
            candidates: road
                .candidates()
                .iter()
                .map(|c| CandidateSummary {
                    plane: c.plane,
                    z: c.z,
                    count: c.points.len(),
                })
                .collect(),
            n_fits: road.n_fits(),
            fits: road
                .fits()
                .iter()
                .take(max_fits)
                .map(FitDescriptor::from_fit)
                .collect(),
            good: road.is_good(),
            void: road.is_void(),
            track: road.track(),
        }
    }
}
