//! Per-event hit records and the store that owns them.
//!
//! Hits are owned by a [`HitStore`] (one ordered list per plane of a
//! projection) for the duration of an event. Everything downstream refers to
//! hits through a [`HitKey`], a plain index that never extends the hit's
//! lifetime and can never be null.

mod build;

pub use build::{build_hits, BuildStats, RawHit};

use serde::{Deserialize, Serialize};

/// Non-owning handle to a hit: plane index within the projection, wire
/// number, and position in that plane's hit list.
///
/// Ordering is by plane, then wire, then index, so an ordered set of keys
/// groups hits plane by plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HitKey {
    pub plane: u16,
    pub wire: u32,
    pub index: u32,
}

impl HitKey {
    pub fn new(plane: u16, wire: u32, index: u32) -> Self {
        Self { plane, wire, index }
    }
}

/// Calibrated single-wire measurement.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub wire: u32,
    /// Transverse position of the wire.
    pub wire_pos: f64,
    #[serde(default)]
    pub raw_tdc: i32,
    #[serde(default)]
    pub drift_time: f64,
    pub drift_dist: f64,
    /// Position resolution (sigma).
    pub resolution: f64,
    /// Position of the hit's plane along the detector axis.
    pub z: f64,
}

impl Hit {
    /// Hit with the given geometry and drift distance, no raw timing data.
    pub fn new(wire: u32, wire_pos: f64, drift_dist: f64, resolution: f64, z: f64) -> Self {
        Self {
            wire,
            wire_pos,
            raw_tdc: 0,
            drift_time: 0.0,
            drift_dist,
            resolution,
            z,
        }
    }

    /// Track position assuming the track passed on the low side of the wire.
    #[inline]
    pub fn pos_left(&self) -> f64 {
        self.wire_pos - self.drift_dist
    }

    /// Track position assuming the track passed on the high side of the wire.
    #[inline]
    pub fn pos_right(&self) -> f64 {
        self.wire_pos + self.drift_dist
    }
}

/// Event hit storage for one projection, indexed by plane.
#[derive(Clone, Debug, Default, Serialize)]
pub struct HitStore {
    planes: Vec<Vec<Hit>>,
}

impl HitStore {
    pub fn new(n_planes: usize) -> Self {
        Self {
            planes: vec![Vec::new(); n_planes],
        }
    }

    pub fn n_planes(&self) -> usize {
        self.planes.len()
    }

    /// Hits of one plane, in storage order. Unknown planes are empty.
    pub fn plane(&self, plane: usize) -> &[Hit] {
        self.planes.get(plane).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Appends a hit and returns its key. Grows the plane table if needed.
    pub fn push(&mut self, plane: u16, hit: Hit) -> HitKey {
        let p = plane as usize;
        if p >= self.planes.len() {
            self.planes.resize_with(p + 1, Vec::new);
        }
        let index = self.planes[p].len() as u32;
        self.planes[p].push(hit);
        HitKey::new(plane, hit.wire, index)
    }

    /// Replaces all hits of a plane.
    pub fn set_plane(&mut self, plane: u16, hits: Vec<Hit>) {
        let p = plane as usize;
        if p >= self.planes.len() {
            self.planes.resize_with(p + 1, Vec::new);
        }
        self.planes[p] = hits;
    }

    /// Key of the hit stored at `(plane, index)`.
    pub fn key(&self, plane: u16, index: usize) -> Option<HitKey> {
        let hit = self.planes.get(plane as usize)?.get(index)?;
        Some(HitKey::new(plane, hit.wire, index as u32))
    }

    /// Keys of all hits of a plane, in storage order.
    pub fn keys(&self, plane: u16) -> impl Iterator<Item = HitKey> + '_ {
        self.plane(plane as usize)
            .iter()
            .enumerate()
            .map(move |(i, h)| HitKey::new(plane, h.wire, i as u32))
    }

    pub fn get(&self, key: HitKey) -> Option<&Hit> {
        self.planes
            .get(key.plane as usize)?
            .get(key.index as usize)
            .filter(|h| h.wire == key.wire)
    }

    /// Total number of hits.
    pub fn len(&self) -> usize {
        self.planes.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.planes.iter().all(Vec::is_empty)
    }

    /// Drops the event data but keeps the plane table and its allocations.
    pub fn clear(&mut self) {
        for plane in &mut self.planes {
            plane.clear();
        }
    }
}
