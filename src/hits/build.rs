//! Conversion of decoded TDC channel data into calibrated hits.

use super::Hit;
use crate::geometry::WirePlane;
use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// One decoded TDC value on one wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawHit {
    pub wire: u32,
    pub tdc: i32,
}

/// Bookkeeping from [`build_hits`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub accepted: usize,
    pub rejected_time: usize,
    pub rejected_wire: usize,
    /// Input was already ordered by wire position.
    pub was_sorted: bool,
    /// Wires with at least one in-range raw hit, before the time cut.
    pub hit_wires: usize,
    /// Wires with more than one raw hit.
    pub multihit_wires: usize,
    /// Largest number of raw hits on one wire.
    pub max_multiplicity: usize,
    /// Runs of accepted hits on adjacent wires (crosstalk candidates).
    pub clusters: usize,
    /// Accepted hits belonging to such runs.
    pub cluster_hits: usize,
    /// Longest run of adjacent wires.
    pub max_cluster_size: usize,
}

impl BuildStats {
    fn count_multiplicity(&mut self, per_wire: &BTreeMap<u32, usize>) {
        self.hit_wires = per_wire.len();
        self.multihit_wires = per_wire.values().filter(|&&n| n > 1).count();
        self.max_multiplicity = per_wire.values().copied().max().unwrap_or(0);
    }

    /// Scans wire-ordered hits for neighbouring wires. Repeated hits on the
    /// same wire neither extend nor break a run.
    fn count_clusters(&mut self, hits: &[Hit]) {
        let mut prev: Option<u32> = None;
        let mut size = 1usize;
        for hit in hits {
            match prev.map(|w| w.abs_diff(hit.wire)) {
                Some(0) => continue,
                Some(1) => {
                    if size == 1 {
                        self.clusters += 1;
                        self.cluster_hits += 1;
                    }
                    size += 1;
                    self.cluster_hits += 1;
                    self.max_cluster_size = self.max_cluster_size.max(size);
                }
                _ => size = 1,
            }
            prev = Some(hit.wire);
        }
        if !hits.is_empty() {
            self.max_cluster_size = self.max_cluster_size.max(1);
        }
    }
}

/// Calibrates raw TDC data of one plane.
///
/// The readout uses common-stop TDCs, so the drift time is
/// `t = offset[wire] + ref_time − tdc_resolution·(tdc + 0.5)`. Hits outside
/// the plane's time window (when `apply_time_cut` is set) or on wires beyond
/// the plane are dropped. The drift distance is a first estimate assuming a
/// track perpendicular to the plane. Output is ordered by wire position.
pub fn build_hits(
    plane: &WirePlane,
    raw: &[RawHit],
    ref_time: f64,
    apply_time_cut: bool,
) -> (Vec<Hit>, BuildStats) {
    let mut stats = BuildStats {
        was_sorted: true,
        ..Default::default()
    };
    let mut hits: Vec<Hit> = Vec::with_capacity(raw.len());
    let mut per_wire: BTreeMap<u32, usize> = BTreeMap::new();
    for r in raw {
        if plane.nwires > 0 && r.wire >= plane.nwires {
            stats.rejected_wire += 1;
            continue;
        }
        *per_wire.entry(r.wire).or_default() += 1;
        let time =
            plane.tdc_offset(r.wire) + ref_time - plane.tdc_resolution * (r.tdc as f64 + 0.5);
        if apply_time_cut && !plane.accepts_time(time) {
            stats.rejected_time += 1;
            continue;
        }
        let hit = Hit {
            wire: r.wire,
            wire_pos: plane.wire_pos(r.wire),
            raw_tdc: r.tdc,
            drift_time: time,
            drift_dist: plane.ttd.convert(time),
            resolution: plane.resolution,
            z: plane.z,
        };
        if let Some(prev) = hits.last() {
            if hit.wire_pos < prev.wire_pos {
                stats.was_sorted = false;
            }
        }
        hits.push(hit);
    }
    if !stats.was_sorted {
        hits.sort_by(|a, b| {
            a.wire_pos
                .partial_cmp(&b.wire_pos)
                .unwrap_or(Ordering::Equal)
                .then(a.wire.cmp(&b.wire))
        });
    }
    stats.accepted = hits.len();
    stats.count_multiplicity(&per_wire);
    stats.count_clusters(&hits);
    debug!(
        "plane {}: {} hits accepted, {} outside time window, {} bad wire, sorted={}",
        plane.name, stats.accepted, stats.rejected_time, stats.rejected_wire, stats.was_sorted
    );
    debug!(
        "plane {}: {} wires hit, {} multi-hit (max {}), {} clusters with {} hits (max size {})",
        plane.name,
        stats.hit_wires,
        stats.multihit_wires,
        stats.max_multiplicity,
        stats.clusters,
        stats.cluster_hits,
        stats.max_cluster_size
    );
    (hits, stats)
}
