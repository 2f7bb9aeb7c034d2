//! Road finding for one projection.
//!
//! Turns the pattern nodes of one projection into fitted roads:
//!
//! 1. Seeding and growth: each node not yet absorbed seeds a road; every
//!    later unused node whose bin touches the road's region is offered to
//!    [`Road::add`], repeating until the region stops growing.
//! 2. Coordinate collection: [`Road::finish`] on every road. Roads with too
//!    few planes are voided.
//! 3. Deduplication: roads are visited by decreasing hit count and any road
//!    whose hits are contained in an earlier surviving road is voided.
//! 4. Fitting of the surviving roads (in parallel with the `parallel`
//!    feature).
//! 5. Ranking by best chi2.
//!
//! Voided roads stay in the output for diagnostics.

use crate::diagnostics::TimingBreakdown;
use crate::geometry::Projection;
use crate::hits::HitStore;
use crate::pattern::PatternNode;
use crate::road::{sort_roads, FitSummary, Road, RoadError, RoadParams};
use log::debug;
use serde::Serialize;
use std::cmp::Reverse;
use std::time::Instant;

/// Counters collected while finding roads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinderStats {
    pub nodes: usize,
    pub seeded: usize,
    pub patterns_merged: usize,
    pub conflicts: usize,
    pub insufficient: usize,
    pub subsumed: usize,
    pub fit_failures: usize,
    pub fitted: usize,
    pub combinations_skipped: u64,
}

/// Roads of one projection, ranked by best chi2, plus bookkeeping.
#[derive(Debug)]
pub struct FinderOutput<'a> {
    pub roads: Vec<Road<'a>>,
    pub stats: FinderStats,
    pub timing: TimingBreakdown,
}

impl<'a> FinderOutput<'a> {
    /// Roads that are fitted and not voided, best first.
    pub fn good_roads(&self) -> impl Iterator<Item = &Road<'a>> {
        self.roads.iter().filter(|r| !r.is_void())
    }
}

/// Road-finding driver configured by [`RoadParams`].
#[derive(Clone, Debug, Default)]
pub struct RoadFinder {
    params: RoadParams,
}

impl RoadFinder {
    pub fn new(params: RoadParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &RoadParams {
        &self.params
    }

    pub fn find<'a>(
        &self,
        projection: &'a Projection,
        nodes: &'a [PatternNode],
        store: &HitStore,
    ) -> FinderOutput<'a> {
        let t0 = Instant::now();
        let mut stats = FinderStats {
            nodes: nodes.len(),
            ..Default::default()
        };
        let mut timing = TimingBreakdown::default();

        let mut roads = timing.measure("build", || {
            self.build_roads(projection, nodes, &mut stats)
        });

        let mut alive = timing.measure("finish", || {
            roads
                .iter_mut()
                .map(|road| match road.finish(store) {
                    Ok(_) => true,
                    Err(err) => {
                        debug!("{}: road dropped before fit: {err}", projection.name);
                        stats.insufficient += 1;
                        road.void();
                        false
                    }
                })
                .collect::<Vec<_>>()
        });

        stats.subsumed = timing.measure("dedup", || remove_subsumed(&mut roads, &mut alive));

        timing.measure("fit", || {
            let results = fit_roads(&mut roads, &alive);
            for (road, result) in roads.iter_mut().zip(results) {
                match result {
                    Some(Ok(summary)) => {
                        stats.fitted += 1;
                        stats.combinations_skipped += summary.skipped;
                    }
                    Some(Err(err)) => {
                        debug!("{}: fit failed: {err}", projection.name);
                        stats.fit_failures += 1;
                        road.void();
                    }
                    None => {}
                }
            }
        });

        sort_roads(&mut roads);
        timing.total_ms = t0.elapsed().as_secs_f64() * 1000.0;
        debug!(
            "{}: nodes={} roads={} fitted={} subsumed={} insufficient={} elapsed_ms={:.3}",
            projection.name,
            stats.nodes,
            stats.seeded,
            stats.fitted,
            stats.subsumed,
            stats.insufficient,
            timing.total_ms
        );
        FinderOutput {
            roads,
            stats,
            timing,
        }
    }

    /// Seeds a road from every node not yet absorbed and grows it until a
    /// full pass over the remaining nodes adds nothing. A node skipped early
    /// may overlap the region once later nodes have widened it.
    fn build_roads<'a>(
        &self,
        projection: &'a Projection,
        nodes: &'a [PatternNode],
        stats: &mut FinderStats,
    ) -> Vec<Road<'a>> {
        let mut used = vec![false; nodes.len()];
        let mut roads = Vec::new();
        for i in 0..nodes.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            let mut road = Road::new(&nodes[i], projection, self.params);
            stats.seeded += 1;
            loop {
                let mut grew = false;
                let mut conflicts = 0;
                for j in (i + 1)..nodes.len() {
                    if used[j]
                        || !road
                            .region()
                            .overlaps(&nodes[j].bin, self.params.merge_tolerance)
                    {
                        continue;
                    }
                    match road.add(&nodes[j]) {
                        Ok(()) => {
                            used[j] = true;
                            grew = true;
                            stats.patterns_merged += 1;
                        }
                        Err(RoadError::PatternConflict { .. }) => conflicts += 1,
                        Err(err) => debug!("{}: pattern {j} not added: {err}", projection.name),
                    }
                }
                if !grew {
                    // only the refusals of the final region count
                    stats.conflicts += conflicts;
                    break;
                }
            }
            roads.push(road);
        }
        roads
    }
}

/// Voids every live road whose hit set is contained in a larger (or
/// earlier, for equal sets) live road. Returns the number voided.
fn remove_subsumed(roads: &mut [Road<'_>], alive: &mut [bool]) -> usize {
    let mut order: Vec<usize> = (0..roads.len()).filter(|&i| alive[i]).collect();
    order.sort_by_key(|&i| Reverse(roads[i].hits().len()));
    let mut voided = 0;
    for (pos, &a) in order.iter().enumerate() {
        if !alive[a] {
            continue;
        }
        for &b in &order[pos + 1..] {
            if alive[b] && roads[a].include(&roads[b]) {
                alive[b] = false;
                roads[b].void();
                voided += 1;
            }
        }
    }
    voided
}

#[cfg(not(feature = "parallel"))]
fn fit_roads(roads: &mut [Road<'_>], alive: &[bool]) -> Vec<Option<Result<FitSummary, RoadError>>> {
    roads
        .iter_mut()
        .zip(alive)
        .map(|(road, &ok)| ok.then(|| road.fit()))
        .collect()
}

#[cfg(feature = "parallel")]
fn fit_roads(roads: &mut [Road<'_>], alive: &[bool]) -> Vec<Option<Result<FitSummary, RoadError>>> {
    use rayon::prelude::*;

    roads
        .par_iter_mut()
        .zip(alive.par_iter())
        .map(|(road, &ok)| ok.then(|| road.fit()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{PlaneType, WirePlane};
    use crate::hits::{Hit, HitKey};
    use crate::pattern::PatternBin;

    const ZS: [f64; 4] = [0.0, 0.1, 0.2, 0.3];

    fn projection() -> Projection {
        let planes = ZS
            .iter()
            .enumerate()
            .map(|(i, &z)| WirePlane::new(format!("x{i}"), PlaneType::X, z, 5e-4))
            .collect();
        Projection::new("x", PlaneType::X, 0.0, planes)
    }

    fn bin(x: f64, half: f64) -> PatternBin {
        PatternBin::new(0.0, 0.3, [x - half, x + half], [x - half, x + half])
    }

    #[test]
    fn merges_overlapping_patterns_and_voids_subsets() {
        let proj = projection();
        let mut store = HitStore::new(4);
        let keys: Vec<HitKey> = ZS
            .iter()
            .enumerate()
            .map(|(i, &z)| store.push(i as u16, Hit::new(20, 0.2, 0.01, 5e-4, z)))
            .collect();
        let nodes = vec![
            // left-side positions at 0.19
            PatternNode::new(bin(0.19, 0.005), keys[..3].to_vec()),
            // right-side positions at 0.21: disjoint region, same wires
            PatternNode::new(bin(0.21, 0.005), keys[..3].to_vec()),
            PatternNode::new(bin(0.195, 0.005), keys[1..].to_vec()),
        ];
        let out = RoadFinder::new(RoadParams::default()).find(&proj, &nodes, &store);
        assert_eq!(out.stats.seeded, 2);
        assert_eq!(out.stats.patterns_merged, 1);
        assert_eq!(out.stats.subsumed, 1);
        assert_eq!(out.stats.fitted, 1);
        let good: Vec<_> = out.good_roads().collect();
        assert_eq!(good.len(), 1);
        assert_eq!(good[0].hits().len(), 4);
        assert_eq!(good[0].patterns().len(), 2);
        assert_eq!(out.roads.len(), 2);
        assert!(out.roads[1].is_void());
        assert_eq!(out.timing.stages.len(), 4);
    }

    #[test]
    fn growth_revisits_nodes_skipped_before_the_region_widened() {
        let proj = projection();
        let mut store = HitStore::new(4);
        let keys: Vec<HitKey> = ZS
            .iter()
            .enumerate()
            .map(|(i, &z)| store.push(i as u16, Hit::new(20, 0.2, 0.0, 5e-4, z)))
            .collect();
        let window = |z_lo: f64, z_hi: f64| PatternBin::new(z_lo, z_hi, [0.19, 0.21], [0.19, 0.21]);
        let nodes = vec![
            PatternNode::new(window(0.0, 0.1), keys[..2].to_vec()),
            // no common z with the first node
            PatternNode::new(window(0.2, 0.3), keys[2..].to_vec()),
            PatternNode::new(window(0.0, 0.3), keys[1..3].to_vec()),
        ];
        let out = RoadFinder::default().find(&proj, &nodes, &store);
        assert_eq!(out.stats.seeded, 1);
        assert_eq!(out.stats.patterns_merged, 2);
        assert_eq!(out.roads.len(), 1);
        let road = &out.roads[0];
        assert_eq!(road.patterns().len(), 3);
        assert_eq!(road.hits().len(), 4);
        assert_eq!((road.region().z_lo, road.region().z_hi), (0.0, 0.3));
        assert!(road.is_good());
    }

    #[test]
    fn conflicting_patterns_stay_separate() {
        let proj = projection();
        let mut store = HitStore::new(4);
        let mut a = Vec::new();
        let mut b = Vec::new();
        for (i, &z) in ZS.iter().enumerate() {
            a.push(store.push(i as u16, Hit::new(10, 0.100, 0.0, 5e-4, z)));
            b.push(store.push(i as u16, Hit::new(11, 0.104, 0.0, 5e-4, z)));
        }
        let nodes = vec![
            PatternNode::new(bin(0.1, 0.002), a),
            PatternNode::new(bin(0.104, 0.002), b),
        ];
        let out = RoadFinder::new(RoadParams::default()).find(&proj, &nodes, &store);
        assert_eq!(out.stats.seeded, 2);
        assert_eq!(out.stats.conflicts, 1);
        assert_eq!(out.good_roads().count(), 2);
        assert!(out.roads[0].chi2() <= out.roads[1].chi2());
    }

    #[test]
    fn empty_regions_are_counted() {
        let proj = projection();
        let store = HitStore::new(4);
        let nodes = vec![PatternNode::new(bin(0.1, 0.01), [HitKey::new(0, 1, 0)])];
        let out = RoadFinder::default().find(&proj, &nodes, &store);
        assert_eq!(out.stats.insufficient, 1);
        assert_eq!(out.good_roads().count(), 0);
    }
}
