use crate::ttd::TtdConverter;
use serde::{Deserialize, Serialize};

/// Wire orientation of a plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaneType {
    X,
    Y,
    U,
    V,
}

impl PlaneType {
    /// Plane type from the first character of a type string or plane name
    /// (`"x1"`, `"U"`, `"v2p"`). Returns `None` for anything else.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.chars().next()?.to_ascii_lowercase() {
            'x' => Some(PlaneType::X),
            'y' => Some(PlaneType::Y),
            'u' => Some(PlaneType::U),
            'v' => Some(PlaneType::V),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlaneType::X => "x",
            PlaneType::Y => "y",
            PlaneType::U => "u",
            PlaneType::V => "v",
        }
    }
}

/// One layer of parallel sense wires.
///
/// Positions are in metres, times in seconds. TDC offsets are kept per wire;
/// an empty offset table means all offsets are zero.
#[derive(Clone, Debug, Serialize)]
pub struct WirePlane {
    pub name: String,
    pub plane_type: PlaneType,
    /// Position along the detector axis.
    pub z: f64,
    /// Transverse position of wire 0.
    pub wire_start: f64,
    /// Wire spacing (assumed constant).
    pub wire_spacing: f64,
    /// Number of wires in the plane.
    pub nwires: u32,
    /// Drift distance resolution (sigma).
    pub resolution: f64,
    /// TDC resolution (seconds per channel).
    pub tdc_resolution: f64,
    /// Per-wire TDC offsets (seconds).
    pub tdc_offsets: Vec<f64>,
    /// Accepted drift-time window (seconds). `None` disables the cut.
    pub time_window: Option<(f64, f64)>,
    pub ttd: TtdConverter,
}

impl WirePlane {
    /// Plane with default calibration; mostly useful for simulation and tests.
    pub fn new(name: impl Into<String>, plane_type: PlaneType, z: f64, resolution: f64) -> Self {
        Self {
            name: name.into(),
            plane_type,
            z,
            wire_start: 0.0,
            wire_spacing: 0.01,
            nwires: 0,
            resolution,
            tdc_resolution: 0.5e-9,
            tdc_offsets: Vec::new(),
            time_window: None,
            ttd: TtdConverter::default(),
        }
    }

    pub fn with_wires(mut self, wire_start: f64, wire_spacing: f64, nwires: u32) -> Self {
        self.wire_start = wire_start;
        self.wire_spacing = wire_spacing;
        self.nwires = nwires;
        self
    }

    /// Transverse position of a wire.
    #[inline]
    pub fn wire_pos(&self, wire: u32) -> f64 {
        self.wire_start + wire as f64 * self.wire_spacing
    }

    #[inline]
    pub fn tdc_offset(&self, wire: u32) -> f64 {
        self.tdc_offsets.get(wire as usize).copied().unwrap_or(0.0)
    }

    /// Whether a drift time passes the plane's time window.
    #[inline]
    pub fn accepts_time(&self, time: f64) -> bool {
        match self.time_window {
            Some((lo, hi)) => lo < time && time < hi,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_type_from_name() {
        assert_eq!(PlaneType::from_name("u1"), Some(PlaneType::U));
        assert_eq!(PlaneType::from_name("X"), Some(PlaneType::X));
        assert_eq!(PlaneType::from_name("q"), None);
        assert_eq!(PlaneType::from_name(""), None);
    }

    #[test]
    fn wire_positions_and_offsets() {
        let mut plane = WirePlane::new("x1", PlaneType::X, 0.1, 2e-4).with_wires(-0.5, 0.005, 200);
        plane.tdc_offsets = vec![1e-9; 10];
        assert!((plane.wire_pos(100) - 0.0).abs() < 1e-12);
        assert_eq!(plane.tdc_offset(3), 1e-9);
        assert_eq!(plane.tdc_offset(150), 0.0);
        assert!(plane.accepts_time(1.0));
        plane.time_window = Some((0.0, 200e-9));
        assert!(!plane.accepts_time(300e-9));
    }
}
