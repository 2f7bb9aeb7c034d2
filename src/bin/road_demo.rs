use drift_road::config::{load_config, ProjectionEvent};
use drift_road::diagnostics::FinderReport;
use drift_road::io::write_json_file;
use drift_road::{FinderOutput, RoadFinder};
use serde::Serialize;
use std::env;
use std::path::Path;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = load_config(Path::new(&config_path))?;
    let events = config.build()?;
    let finder = RoadFinder::new(config.params);

    let outputs: Vec<FinderOutput<'_>> = events
        .iter()
        .map(|ev| finder.find(&ev.projection, &ev.nodes, &ev.store))
        .collect();

    for (ev, out) in events.iter().zip(&outputs) {
        print_summary(ev, out);
    }

    let intersection = match (events.first(), outputs.first(), outputs.get(1)) {
        (Some(first), Some(a), Some(b)) => {
            let z = config
                .intersect_z
                .or_else(|| first.projection.z_range().map(|(lo, hi)| 0.5 * (lo + hi)))
                .unwrap_or(0.0);
            intersect_best(a, b, z)
        }
        _ => None,
    };

    if let Some(path) = &config.output.report_json {
        let report = EventReport {
            projections: events
                .iter()
                .zip(&outputs)
                .map(|(ev, out)| FinderReport::new(&ev.projection, out, config.report_fits))
                .collect(),
            intersection,
        };
        write_json_file(path, &report)?;
        println!("Saved road report to {}", path.display());
    }
    Ok(())
}

fn print_summary(ev: &ProjectionEvent, out: &FinderOutput<'_>) {
    let s = &out.stats;
    println!(
        "Projection {} ({:.1} deg): {} hits, {} patterns -> {} roads, {} good \
         ({} merged, {} conflicts, {} subsumed, {} too short)",
        ev.projection.name,
        ev.projection.angle().to_degrees(),
        ev.store.len(),
        s.nodes,
        s.seeded,
        out.good_roads().count(),
        s.patterns_merged,
        s.conflicts,
        s.subsumed,
        s.insufficient
    );
    println!("  timing: {}", out.timing);
    for road in out.good_roads() {
        println!("  {road}");
    }
}

fn intersect_best(a: &FinderOutput<'_>, b: &FinderOutput<'_>, z: f64) -> Option<SpacePoint> {
    let (ra, rb) = (a.good_roads().next()?, b.good_roads().next()?);
    match ra.intersect(rb, z) {
        Ok(xy) => {
            println!(
                "Space point of best roads ({} x {}) at z={z:.4}: x={:.5} y={:.5}",
                ra.projection().name,
                rb.projection().name,
                xy.x,
                xy.y
            );
            Some(SpacePoint {
                z,
                x: xy.x,
                y: xy.y,
            })
        }
        Err(err) => {
            println!("No space point: {err}");
            None
        }
    }
}

fn usage() -> String {
    "Usage: road_demo <event.json>".to_string()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpacePoint {
    z: f64,
    x: f64,
    y: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventReport {
    projections: Vec<FinderReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    intersection: Option<SpacePoint>,
}
