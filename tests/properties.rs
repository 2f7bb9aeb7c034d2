mod common;

use common::synthetic_event::{push_wire_hit, track_hits, track_node, wire_projection, Track};
use drift_road::{PlaneType, Road, RoadFinder, RoadParams};
use proptest::prelude::*;
use std::collections::BTreeSet;

const ZS: [f64; 5] = [0.0, 0.04, 0.08, 0.12, 0.16];

fn arb_track() -> impl Strategy<Value = Track> {
    (-0.2..0.2f64, -0.2..0.2f64, -0.5..0.5f64, -0.5..0.5f64).prop_map(|(x0, y0, tx, ty)| Track {
        x0,
        y0,
        tx,
        ty,
    })
}

proptest! {
    #[test]
    fn prop_exact_track_is_best_fit(t in arb_track(), angle in prop_oneof![Just(0.0), Just(60.0), Just(-60.0), Just(90.0)]) {
        let proj = wire_projection("p", PlaneType::U, angle, &ZS);
        let (store, keys) = track_hits(&proj, &t);
        let nodes = vec![track_node(&proj, &t, 0, ZS.len() - 1, 0.004, &keys)];
        let out = RoadFinder::default().find(&proj, &nodes, &store);
        let road = &out.roads[0];
        prop_assert!(road.is_good());
        prop_assert!(road.chi2() < 1e-6);
        let expected = t.measured(&proj, 0.1);
        prop_assert!((road.pos_at(0.1) - expected).abs() < 1e-9);
    }

    #[test]
    fn prop_road_invariants(
        t in arb_track(),
        extra in proptest::collection::vec((0usize..5, 0u32..101, 0.0..0.005f64), 0..12),
        split in 1usize..4,
    ) {
        let proj = wire_projection("x", PlaneType::X, 0.0, &ZS);
        let (mut store, keys) = track_hits(&proj, &t);
        let mut noise = Vec::new();
        for (plane, wire, drift) in extra {
            noise.push(push_wire_hit(&proj, &mut store, plane, wire, drift));
        }
        let mut first = keys[..=split].to_vec();
        first.extend(noise.iter().filter(|k| (k.plane as usize) <= split));
        let nodes = vec![
            track_node(&proj, &t, 0, split, 0.02, &first),
            track_node(&proj, &t, split, ZS.len() - 1, 0.02, &keys[split..]),
        ];
        let params = RoadParams { max_combinations: 200, ..RoadParams::default() };
        let out = RoadFinder::new(params).find(&proj, &nodes, &store);

        for road in &out.roads {
            // hits are the union of the patterns' hits
            let union: BTreeSet<_> = road.patterns().iter().flat_map(|p| p.hits.iter().copied()).collect();
            prop_assert_eq!(&union, road.hits());
            // fits ranked, non-empty iff good
            prop_assert_eq!(road.is_good(), road.n_fits() > 0);
            prop_assert!(road.fits().windows(2).all(|w| w[0].chi2 <= w[1].chi2));
            prop_assert!(road.n_fits() <= params.max_combinations);
            prop_assert!(road.include(road));
            // region contains every pattern bin at its z edges
            for p in road.patterns() {
                for z in [p.bin.z_lo, p.bin.z_hi] {
                    prop_assert!(road.region().left_at(z) <= p.bin.left_at(z) + 1e-12);
                    prop_assert!(road.region().right_at(z) + 1e-12 >= p.bin.right_at(z));
                }
            }
            if road.is_good() {
                prop_assert_eq!(road.chi2(), road.fits()[0].chi2);
            }
        }
        prop_assert!(out.roads.windows(2).all(|w| Road::compare(&w[0], &w[1]).is_le()));
    }
}
