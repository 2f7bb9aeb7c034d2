//! Serializable snapshots of roads and finder runs.
//!
//! `FinderReport` is what the demo binary writes to disk: one per projection,
//! carrying the finder counters, the stage timings, and a `RoadDiagnostics`
//! entry for every road (voided ones included).

pub mod road;
pub mod timing;

pub use road::{CandidateSummary, FitDescriptor, RoadDiagnostics};
pub use timing::{StageTiming, TimingBreakdown};

use crate::finder::{FinderOutput, FinderStats};
use crate::geometry::Projection;
use serde::Serialize;

/// Outcome of the road finder on one projection.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinderReport {
    pub projection: String,
    pub angle_deg: f64,
    pub stats: FinderStats,
    pub timing: TimingBreakdown,
    pub roads: Vec<RoadDiagnostics>,
}

impl FinderReport {
    /// Snapshot of a finder run. `max_fits` limits the fits listed per road.
    pub fn new(projection: &Projection, output: &FinderOutput<'_>, max_fits: usize) -> Self {
        Self {
            projection: projection.name.clone(),
            angle_deg: projection.angle().to_degrees(),
            stats: output.stats,
            timing: output.timing.clone(),
            roads: output
                .roads
                .iter()
                .map(|r| RoadDiagnostics::from_road(r, max_fits))
                .collect(),
        }
    }

    pub fn good_roads(&self) -> usize {
        self.roads.iter().filter(|r| !r.void).count()
    }
}
