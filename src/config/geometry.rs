use crate::angle::deg_to_rad;
use crate::geometry::{PlaneType, Projection, WirePlane};
use crate::ttd::{TtdConfig, TtdConverter};
use serde::Deserialize;

const NS: f64 = 1e-9;

fn default_wire_spacing() -> f64 {
    0.01
}

fn default_tdc_resolution_ns() -> f64 {
    0.5
}

/// Geometry and calibration of one wire plane. Lengths in metres, times in
/// nanoseconds.
#[derive(Clone, Debug, Deserialize)]
pub struct PlaneConfig {
    pub name: String,
    /// Defaults to the type implied by the plane name, then to the
    /// projection's type.
    #[serde(default, rename = "type")]
    pub plane_type: Option<PlaneType>,
    pub z: f64,
    #[serde(default)]
    pub wire_start: f64,
    #[serde(default = "default_wire_spacing")]
    pub wire_spacing: f64,
    /// Number of wires. Zero disables the wire-range cut and is only
    /// allowed for planes without raw TDC data.
    #[serde(default)]
    pub nwires: u32,
    /// Position resolution (sigma).
    pub resolution: f64,
    #[serde(default = "default_tdc_resolution_ns")]
    pub tdc_resolution_ns: f64,
    #[serde(default)]
    pub tdc_offsets_ns: Vec<f64>,
    #[serde(default)]
    pub time_window_ns: Option<[f64; 2]>,
    /// Drift time-to-distance converter. Defaults to a linear converter.
    #[serde(default)]
    pub ttd: Option<TtdConfig>,
}

impl PlaneConfig {
    pub fn to_wire_plane(&self, fallback: PlaneType) -> Result<WirePlane, String> {
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(format!(
                "plane {}: resolution must be positive, got {}",
                self.name, self.resolution
            ));
        }
        if !(self.wire_spacing.is_finite() && self.wire_spacing > 0.0) {
            return Err(format!(
                "plane {}: wire spacing must be positive, got {}",
                self.name, self.wire_spacing
            ));
        }
        if !self.tdc_offsets_ns.is_empty() && self.tdc_offsets_ns.len() != self.nwires as usize {
            return Err(format!(
                "plane {}: {} TDC offsets for {} wires",
                self.name,
                self.tdc_offsets_ns.len(),
                self.nwires
            ));
        }
        if let Some([lo, hi]) = self.time_window_ns {
            if lo >= hi {
                return Err(format!(
                    "plane {}: empty time window [{lo}, {hi}] ns",
                    self.name
                ));
            }
        }
        let plane_type = self
            .plane_type
            .or_else(|| PlaneType::from_name(&self.name))
            .unwrap_or(fallback);
        let ttd = match &self.ttd {
            Some(cfg) => {
                TtdConverter::from_config(cfg).map_err(|e| format!("plane {}: {e}", self.name))?
            }
            None => TtdConverter::default(),
        };
        let mut plane = WirePlane::new(self.name.clone(), plane_type, self.z, self.resolution)
            .with_wires(self.wire_start, self.wire_spacing, self.nwires);
        plane.tdc_resolution = self.tdc_resolution_ns * NS;
        plane.tdc_offsets = self.tdc_offsets_ns.iter().map(|t| t * NS).collect();
        plane.time_window = self.time_window_ns.map(|[lo, hi]| (lo * NS, hi * NS));
        plane.ttd = ttd;
        Ok(plane)
    }
}

/// Planes sharing one wire orientation.
#[derive(Clone, Debug, Deserialize)]
pub struct ProjectionGeometry {
    pub name: String,
    #[serde(rename = "type")]
    pub plane_type: Option<PlaneType>,
    /// Direction of the measured coordinate axis, degrees from detector x.
    pub angle_deg: f64,
    pub planes: Vec<PlaneConfig>,
}

impl ProjectionGeometry {
    pub fn to_projection(&self) -> Result<Projection, String> {
        if self.planes.is_empty() {
            return Err(format!("projection {}: no planes", self.name));
        }
        let plane_type = self
            .plane_type
            .or_else(|| PlaneType::from_name(&self.name))
            .ok_or_else(|| format!("projection {}: cannot infer plane type", self.name))?;
        let planes = self
            .planes
            .iter()
            .map(|p| p.to_wire_plane(plane_type))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Projection::new(
            self.name.clone(),
            plane_type,
            deg_to_rad(self.angle_deg),
            planes,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane_json(extra: &str) -> String {
        format!(r#"{{"name": "u1", "z": 0.2, "resolution": 2e-4 {extra}}}"#)
    }

    #[test]
    fn plane_defaults_and_unit_conversion() {
        let json = plane_json(
            r#", "nwires": 2, "tdc_offsets_ns": [10.0, 20.0], "time_window_ns": [-5.0, 300.0],
               "ttd": {"converter": "TanhTTD", "params": [5e4, 0.005]}"#,
        );
        let cfg: PlaneConfig = serde_json::from_str(&json).unwrap();
        let plane = cfg.to_wire_plane(PlaneType::X).unwrap();
        assert_eq!(plane.plane_type, PlaneType::U);
        assert_eq!(plane.wire_spacing, 0.01);
        assert!((plane.tdc_resolution - 0.5e-9).abs() < 1e-18);
        assert!((plane.tdc_offset(1) - 20e-9).abs() < 1e-18);
        let (lo, hi) = plane.time_window.unwrap();
        assert!((lo + 5e-9).abs() < 1e-18 && (hi - 300e-9).abs() < 1e-18);
        assert!(matches!(plane.ttd, TtdConverter::Tanh { .. }));
    }

    #[test]
    fn plane_errors_name_the_plane() {
        let cfg: PlaneConfig =
            serde_json::from_str(&plane_json(r#", "ttd": {"converter": "spline"}"#)).unwrap();
        let err = cfg.to_wire_plane(PlaneType::U).unwrap_err();
        assert!(err.contains("u1") && err.contains("spline"), "{err}");

        let mut cfg: PlaneConfig = serde_json::from_str(&plane_json("")).unwrap();
        cfg.resolution = 0.0;
        assert!(cfg.to_wire_plane(PlaneType::U).is_err());
    }

    #[test]
    fn tdc_offsets_must_cover_every_wire() {
        let short: PlaneConfig = serde_json::from_str(&plane_json(
            r#", "nwires": 64, "tdc_offsets_ns": [100.0, 100.0]"#,
        ))
        .unwrap();
        let err = short.to_wire_plane(PlaneType::U).unwrap_err();
        assert!(err.contains("2 TDC offsets for 64 wires"), "{err}");

        // offsets without a wire count cannot be checked either
        let no_wires: PlaneConfig =
            serde_json::from_str(&plane_json(r#", "tdc_offsets_ns": [100.0]"#)).unwrap();
        assert!(no_wires.to_wire_plane(PlaneType::U).is_err());

        let full: PlaneConfig = serde_json::from_str(&plane_json(
            r#", "nwires": 3, "tdc_offsets_ns": [100.0, 101.0, 102.0]"#,
        ))
        .unwrap();
        let plane = full.to_wire_plane(PlaneType::U).unwrap();
        assert!((plane.tdc_offset(2) - 102e-9).abs() < 1e-18);
    }

    #[test]
    fn projection_sorts_planes_and_converts_angle() {
        let json = r#"{
            "name": "v", "angle_deg": 90.0,
            "planes": [
                {"name": "v2", "z": 0.3, "resolution": 2e-4},
                {"name": "v1", "z": 0.1, "resolution": 2e-4}
            ]
        }"#;
        let geo: ProjectionGeometry = serde_json::from_str(json).unwrap();
        let proj = geo.to_projection().unwrap();
        assert_eq!(proj.plane_type, PlaneType::V);
        assert_eq!(proj.planes()[0].name, "v1");
        assert!((proj.angle() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }
}
