//! JSON configuration for the command-line tool.

pub mod event;
pub mod geometry;

pub use event::{EventConfig, ProjectionConfig, ProjectionEvent};
pub use geometry::{PlaneConfig, ProjectionGeometry};

use crate::io::read_json_file;
use std::path::Path;

pub fn load_config(path: &Path) -> Result<EventConfig, String> {
    read_json_file(path, "config")
}
