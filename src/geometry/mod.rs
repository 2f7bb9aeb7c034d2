//! Detector geometry: wire planes and the projections that group them.
//!
//! A projection is one wire orientation. Its planes share a 1-D transverse
//! coordinate `u = x·cosθ + y·sinθ` and are ordered by their position `z`
//! along the detector axis. Geometry is read-only during event processing and
//! is handed to roads as an explicit `&Projection`.

mod plane;
mod projection;

pub use plane::{PlaneType, WirePlane};
pub use projection::Projection;
