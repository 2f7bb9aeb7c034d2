use super::geometry::ProjectionGeometry;
use crate::geometry::{Projection, WirePlane};
use crate::hits::{build_hits, BuildStats, Hit, HitKey, HitStore, RawHit};
use crate::pattern::{PatternBin, PatternNode};
use crate::road::RoadParams;
use log::warn;
use serde::Deserialize;
use std::cmp::Ordering;
use std::path::PathBuf;

fn default_true() -> bool {
    true
}

/// Event description consumed by the `road_demo` tool.
#[derive(Debug, Deserialize)]
pub struct EventConfig {
    /// Common-stop reference time added to every drift time (ns).
    #[serde(default)]
    pub ref_time_ns: f64,
    #[serde(default = "default_true")]
    pub apply_time_cut: bool,
    #[serde(default)]
    pub params: RoadParams,
    /// z at which the best roads of the first two projections are
    /// intersected. Defaults to the middle of the first projection.
    #[serde(default)]
    pub intersect_z: Option<f64>,
    /// Number of ranked fits listed per road in the report.
    #[serde(default = "default_report_fits")]
    pub report_fits: usize,
    pub projections: Vec<ProjectionConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_report_fits() -> usize {
    5
}

#[derive(Debug, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub report_json: Option<PathBuf>,
}

/// Geometry plus event data of one projection.
#[derive(Debug, Deserialize)]
pub struct ProjectionConfig {
    #[serde(flatten)]
    pub geometry: ProjectionGeometry,
    /// Decoded TDC data, calibrated through the plane's converter.
    #[serde(default)]
    pub raw_hits: Vec<RawHitConfig>,
    /// Already calibrated hits.
    #[serde(default)]
    pub hits: Vec<CalibratedHitConfig>,
    #[serde(default)]
    pub patterns: Vec<PatternConfig>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawHitConfig {
    pub plane: String,
    pub wire: u32,
    pub tdc: i32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CalibratedHitConfig {
    pub plane: String,
    pub wire: u32,
    pub drift_dist: f64,
}

/// Reference to every hit of one wire.
#[derive(Clone, Debug, Deserialize)]
pub struct WireRef {
    pub plane: String,
    pub wire: u32,
}

/// Tree-search pattern: bin corners plus the wires it contains.
#[derive(Clone, Debug, Deserialize)]
pub struct PatternConfig {
    pub z_lo: f64,
    pub z_hi: f64,
    /// `[left, right]` at `z_lo`.
    pub lo: [f64; 2],
    /// `[left, right]` at `z_hi`.
    pub hi: [f64; 2],
    #[serde(default)]
    pub wires: Vec<WireRef>,
}

/// Projection with its hits and patterns, ready for the road finder.
#[derive(Debug)]
pub struct ProjectionEvent {
    pub projection: Projection,
    pub store: HitStore,
    pub nodes: Vec<PatternNode>,
    /// Hit building bookkeeping, one entry per plane.
    pub build_stats: Vec<BuildStats>,
}

fn plane_index(projection: &Projection, name: &str) -> Result<usize, String> {
    projection
        .planes()
        .iter()
        .position(|p| p.name == name)
        .ok_or_else(|| format!("projection {}: unknown plane {name}", projection.name))
}

fn by_wire_pos(a: &Hit, b: &Hit) -> Ordering {
    a.wire_pos
        .partial_cmp(&b.wire_pos)
        .unwrap_or(Ordering::Equal)
        .then(a.wire.cmp(&b.wire))
}

impl ProjectionConfig {
    /// Builds the projection geometry, calibrates its hits and resolves the
    /// pattern wire references into hit keys.
    pub fn build(&self, ref_time: f64, apply_time_cut: bool) -> Result<ProjectionEvent, String> {
        let projection = self.geometry.to_projection()?;
        let n = projection.n_planes();

        let mut raw: Vec<Vec<RawHit>> = vec![Vec::new(); n];
        for r in &self.raw_hits {
            let ip = plane_index(&projection, &r.plane)?;
            let plane = &projection.planes()[ip];
            if plane.nwires == 0 {
                return Err(format!(
                    "plane {}: raw TDC data needs the number of wires",
                    plane.name
                ));
            }
            raw[ip].push(RawHit {
                wire: r.wire,
                tdc: r.tdc,
            });
        }
        let mut calibrated: Vec<Vec<Hit>> = vec![Vec::new(); n];
        for h in &self.hits {
            let ip = plane_index(&projection, &h.plane)?;
            let plane: &WirePlane = &projection.planes()[ip];
            if plane.nwires > 0 && h.wire >= plane.nwires {
                return Err(format!(
                    "plane {}: wire {} out of range (nwires={})",
                    plane.name, h.wire, plane.nwires
                ));
            }
            calibrated[ip].push(Hit::new(
                h.wire,
                plane.wire_pos(h.wire),
                h.drift_dist.abs(),
                plane.resolution,
                plane.z,
            ));
        }

        let mut store = HitStore::new(n);
        let mut build_stats = Vec::with_capacity(n);
        for (ip, plane) in projection.planes().iter().enumerate() {
            let (mut hits, stats) = build_hits(plane, &raw[ip], ref_time, apply_time_cut);
            if !calibrated[ip].is_empty() {
                hits.append(&mut calibrated[ip]);
                hits.sort_by(by_wire_pos);
            }
            build_stats.push(stats);
            store.set_plane(ip as u16, hits);
        }

        let mut nodes = Vec::with_capacity(self.patterns.len());
        for (i, pat) in self.patterns.iter().enumerate() {
            if pat.z_hi < pat.z_lo {
                return Err(format!(
                    "projection {}: pattern {i} has z_hi < z_lo",
                    projection.name
                ));
            }
            let mut keys: Vec<HitKey> = Vec::new();
            for w in &pat.wires {
                let ip = plane_index(&projection, &w.plane)? as u16;
                let before = keys.len();
                keys.extend(store.keys(ip).filter(|k| k.wire == w.wire));
                if keys.len() == before {
                    warn!(
                        "projection {}: pattern {i} references wire {} of {} without hits",
                        projection.name, w.wire, w.plane
                    );
                }
            }
            nodes.push(PatternNode::new(
                PatternBin::new(pat.z_lo, pat.z_hi, pat.lo, pat.hi),
                keys,
            ));
        }

        Ok(ProjectionEvent {
            projection,
            store,
            nodes,
            build_stats,
        })
    }
}

impl EventConfig {
    pub fn build(&self) -> Result<Vec<ProjectionEvent>, String> {
        self.projections
            .iter()
            .map(|p| p.build(self.ref_time_ns * 1e-9, self.apply_time_cut))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVENT: &str = r#"{
        "ref_time_ns": 200.0,
        "params": {"max_combinations": 64},
        "projections": [{
            "name": "x", "angle_deg": 0.0,
            "planes": [
                {"name": "x2", "z": 0.1, "resolution": 2e-4, "nwires": 50,
                 "ttd": {"converter": "linear", "params": [5e4]}},
                {"name": "x1", "z": 0.0, "resolution": 2e-4, "nwires": 50}
            ],
            "raw_hits": [
                {"plane": "x1", "wire": 7, "tdc": 299},
                {"plane": "x1", "wire": 3, "tdc": 299},
                {"plane": "x2", "wire": 60, "tdc": 10}
            ],
            "hits": [{"plane": "x2", "wire": 4, "drift_dist": 0.001}],
            "patterns": [{
                "z_lo": 0.0, "z_hi": 0.1, "lo": [0.0, 0.1], "hi": [0.0, 0.1],
                "wires": [{"plane": "x1", "wire": 3}, {"plane": "x2", "wire": 4}]
            }]
        }]
    }"#;

    #[test]
    fn builds_hits_and_resolves_patterns() {
        let cfg: EventConfig = serde_json::from_str(EVENT).unwrap();
        assert_eq!(cfg.params.max_combinations, 64);
        assert_eq!(cfg.params.min_planes, 3);
        assert!(cfg.apply_time_cut);
        let events = cfg.build().unwrap();
        let ev = &events[0];
        // planes are sorted by z: x1 first
        assert_eq!(ev.projection.planes()[0].name, "x1");
        let x1 = ev.store.plane(0);
        assert_eq!(x1.len(), 2);
        assert_eq!(x1[0].wire, 3);
        // 200 ns - 0.5 ns * 299.5 = 50.25 ns at 50 um/ns
        assert!((x1[0].drift_dist - 50.25e-9 * 5e4).abs() < 1e-12);
        assert_eq!(ev.build_stats[1].rejected_wire, 1);
        assert_eq!(ev.store.plane(1).len(), 1);
        let node = &ev.nodes[0];
        assert_eq!(node.hits.len(), 2);
        assert!(node.hits.contains(&HitKey::new(0, 3, 0)));
        assert!(node.hits.contains(&HitKey::new(1, 4, 0)));
    }

    #[test]
    fn raw_hits_require_a_wire_count() {
        let json = EVENT.replace(r#", "nwires": 50}"#, "}");
        let cfg: EventConfig = serde_json::from_str(&json).unwrap();
        let err = cfg.build().unwrap_err();
        assert!(err.contains("x1") && err.contains("number of wires"), "{err}");
    }

    #[test]
    fn unknown_plane_is_an_error() {
        let json = EVENT.replace(r#""plane": "x2", "wire": 4"#, r#""plane": "y9", "wire": 4"#);
        let cfg: EventConfig = serde_json::from_str(&json).unwrap();
        let err = cfg.build().unwrap_err();
        assert!(err.contains("y9"), "{err}");
    }
}
