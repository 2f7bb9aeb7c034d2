use drift_road::{Hit, HitKey, HitStore, PatternBin, PatternNode, PlaneType, Projection, WirePlane};

pub const RESOLUTION: f64 = 2e-4;
pub const WIRE_SPACING: f64 = 0.01;
pub const WIRE_START: f64 = -0.5;
pub const N_WIRES: u32 = 101;

/// Straight 3-D track `(x, y) = (x0 + tx·z, y0 + ty·z)`.
#[derive(Clone, Copy, Debug)]
pub struct Track {
    pub x0: f64,
    pub y0: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Track {
    pub fn at(&self, z: f64) -> (f64, f64) {
        (self.x0 + self.tx * z, self.y0 + self.ty * z)
    }

    /// Coordinate measured by `proj` at `z`.
    pub fn measured(&self, proj: &Projection, z: f64) -> f64 {
        let (x, y) = self.at(z);
        proj.project(x, y)
    }
}

/// Projection with one plane per z, all wires on a common grid.
pub fn wire_projection(name: &str, plane_type: PlaneType, angle_deg: f64, zs: &[f64]) -> Projection {
    let planes = zs
        .iter()
        .enumerate()
        .map(|(i, &z)| {
            WirePlane::new(format!("{name}{i}"), plane_type, z, RESOLUTION).with_wires(
                WIRE_START,
                WIRE_SPACING,
                N_WIRES,
            )
        })
        .collect();
    Projection::new(name, plane_type, angle_deg.to_radians(), planes)
}

/// Hits left by `track` on every plane: nearest wire, exact drift distance.
/// Returns the store and the key of the track hit on each plane.
pub fn track_hits(proj: &Projection, track: &Track) -> (HitStore, Vec<HitKey>) {
    let mut store = HitStore::new(proj.n_planes());
    let keys = proj
        .planes()
        .iter()
        .enumerate()
        .map(|(i, plane)| {
            let u = track.measured(proj, plane.z);
            let wire = ((u - plane.wire_start) / plane.wire_spacing).round() as u32;
            let wire_pos = plane.wire_pos(wire);
            store.push(
                i as u16,
                Hit::new(wire, wire_pos, (u - wire_pos).abs(), plane.resolution, plane.z),
            )
        })
        .collect();
    (store, keys)
}

/// Adds a hit on `wire` of plane `plane`.
pub fn push_wire_hit(proj: &Projection, store: &mut HitStore, plane: usize, wire: u32, drift: f64) -> HitKey {
    let p = &proj.planes()[plane];
    store.push(
        plane as u16,
        Hit::new(wire, p.wire_pos(wire), drift, p.resolution, p.z),
    )
}

/// Pattern node following `track` between two planes, `half_width` wide on
/// each side, holding `keys`.
pub fn track_node(
    proj: &Projection,
    track: &Track,
    first_plane: usize,
    last_plane: usize,
    half_width: f64,
    keys: &[HitKey],
) -> PatternNode {
    let z_lo = proj.planes()[first_plane].z;
    let z_hi = proj.planes()[last_plane].z;
    let u_lo = track.measured(proj, z_lo);
    let u_hi = track.measured(proj, z_hi);
    PatternNode::new(
        PatternBin::new(
            z_lo,
            z_hi,
            [u_lo - half_width, u_lo + half_width],
            [u_hi - half_width, u_hi + half_width],
        ),
        keys.iter().copied(),
    )
}
