use super::{PlaneType, WirePlane};
use crate::angle::axis;
use serde::Serialize;
use std::cmp::Ordering;

/// One wire orientation: its planes (sorted by ascending z) and the angle of
/// its measured coordinate axis relative to the detector x axis.
#[derive(Clone, Debug, Serialize)]
pub struct Projection {
    pub name: String,
    pub plane_type: PlaneType,
    /// Direction of the measured axis (radians). Not reduced modulo π:
    /// θ + π measures the same wires with the opposite sign.
    angle: f64,
    planes: Vec<WirePlane>,
}

impl Projection {
    /// Builds a projection, sorting the planes by z.
    pub fn new(
        name: impl Into<String>,
        plane_type: PlaneType,
        angle: f64,
        mut planes: Vec<WirePlane>,
    ) -> Self {
        planes.sort_by(|a, b| a.z.partial_cmp(&b.z).unwrap_or(Ordering::Equal));
        Self {
            name: name.into(),
            plane_type,
            angle,
            planes,
        }
    }

    #[inline]
    pub fn angle(&self) -> f64 {
        self.angle
    }

    #[inline]
    pub fn cos_angle(&self) -> f64 {
        axis(self.angle)[0]
    }

    #[inline]
    pub fn sin_angle(&self) -> f64 {
        axis(self.angle)[1]
    }

    pub fn planes(&self) -> &[WirePlane] {
        &self.planes
    }

    pub fn plane(&self, index: usize) -> Option<&WirePlane> {
        self.planes.get(index)
    }

    pub fn n_planes(&self) -> usize {
        self.planes.len()
    }

    /// z of the first and last plane, or `None` for an empty projection.
    pub fn z_range(&self) -> Option<(f64, f64)> {
        Some((self.planes.first()?.z, self.planes.last()?.z))
    }

    /// Projects a detector-frame point `(x, y)` onto this projection's axis.
    #[inline]
    pub fn project(&self, x: f64, y: f64) -> f64 {
        let a = axis(self.angle);
        x * a[0] + y * a[1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planes_sorted_by_z() {
        let planes = vec![
            WirePlane::new("u3", PlaneType::U, 0.3, 1e-4),
            WirePlane::new("u1", PlaneType::U, 0.0, 1e-4),
            WirePlane::new("u2", PlaneType::U, 0.1, 1e-4),
        ];
        let proj = Projection::new("u", PlaneType::U, 0.5, planes);
        let names: Vec<&str> = proj.planes().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["u1", "u2", "u3"]);
        assert_eq!(proj.z_range(), Some((0.0, 0.3)));
    }

    #[test]
    fn project_uses_rotation() {
        let proj = Projection::new("y", PlaneType::Y, std::f64::consts::FRAC_PI_2, Vec::new());
        assert!((proj.project(3.0, 2.0) - 2.0).abs() < 1e-12);
        assert_eq!(proj.z_range(), None);
    }
}
