//! End-to-end scenarios driving the demo definitions through a real
//! compile + step sequence, matching the published concrete examples.

use evolimo_core::{compile, demos};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn drag_only_1d_decays_to_published_value() {
    let ir = compile(&demos::drag_only_1d()).unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    let mut driver = evolimo_core::Driver::new(ir, &mut rng);

    for _ in 0..10 {
        driver.step().unwrap();
    }

    let expected = 1.0_f32 * (1.0_f32 - 0.05).powi(10);
    for v in driver.snapshot()["vel_x"].iter() {
        assert!((v - expected).abs() < 1e-4, "expected {expected}, got {v}");
    }
}

#[test]
fn torus_wrap_returns_to_zero_from_the_published_initial_value() {
    // The published scenario's "after one step pos_x == 0" claim holds for
    // the specific initial value -10 under the exact torus formula; general
    // initial values only satisfy the weaker boundary-invariance property
    // (checked below for every value the distribution can produce).
    let mut def = demos::torus_wrap();
    def.initialization
        .state
        .insert("pos_x".to_string(), evolimo_core::distribution::Distribution::Const { value: -10.0 });
    let ir = compile(&def).unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    let mut driver = evolimo_core::Driver::new(ir, &mut rng);

    driver.step().unwrap();
    for v in driver.snapshot()["pos_x"].iter() {
        assert!((v - 0.0).abs() < 1e-4, "expected 0.0, got {v}");
    }
}

#[test]
fn torus_wrap_keeps_every_initial_value_in_range_after_many_steps() {
    let ir = compile(&demos::torus_wrap()).unwrap();
    let mut rng = StdRng::seed_from_u64(11);
    let mut driver = evolimo_core::Driver::new(ir, &mut rng);

    for _ in 0..50 {
        driver.step().unwrap();
        for v in driver.snapshot()["pos_x"].iter() {
            assert!((-10.0..10.0).contains(v), "pos_x escaped boundary: {v}");
        }
    }
}

#[test]
fn grid_gravity_conserves_total_momentum_per_step() {
    let ir = compile(&demos::grid_gravity()).unwrap();
    let mut rng = StdRng::seed_from_u64(5);
    let mut driver = evolimo_core::Driver::new(ir, &mut rng);

    let momentum = |d: &evolimo_core::Driver| {
        let s = d.snapshot();
        (s["vel_x"].sum(), s["vel_y"].sum())
    };

    let mut prev = momentum(&driver);
    for _ in 0..20 {
        driver.step().unwrap();
        let cur = momentum(&driver);
        assert!((cur.0 - prev.0).abs() < 1e-4, "momentum_x drifted: {prev:?} -> {cur:?}");
        assert!((cur.1 - prev.1).abs() < 1e-4, "momentum_y drifted: {prev:?} -> {cur:?}");
        prev = cur;
    }
}

#[test]
fn determinism_across_fresh_compiles_with_identical_seed() {
    let ir_a = compile(&demos::grid_gravity()).unwrap();
    let ir_b = compile(&demos::grid_gravity()).unwrap();

    let mut rng_a = StdRng::seed_from_u64(123);
    let mut driver_a = evolimo_core::Driver::new(ir_a, &mut rng_a);
    let mut rng_b = StdRng::seed_from_u64(123);
    let mut driver_b = evolimo_core::Driver::new(ir_b, &mut rng_b);

    for _ in 0..8 {
        driver_a.step().unwrap();
        driver_b.step().unwrap();
    }

    assert_eq!(driver_a.snapshot()["pos_x"], driver_b.snapshot()["pos_x"]);
    assert_eq!(driver_a.snapshot()["vel_y"], driver_b.snapshot()["vel_y"]);
}

#[test]
fn ir_round_trips_through_json_for_every_demo() {
    let dir = tempfile::tempdir().unwrap();
    for (name, definition) in demos::registry() {
        let ir = compile(&definition).unwrap();
        let path = dir.path().join(format!("{name}.json"));
        evolimo_core::ir_io::save_ir(&ir, &path).unwrap();
        let loaded = evolimo_core::ir_io::load_ir(&path).unwrap();
        assert_eq!(ir, loaded, "{name} did not round-trip");
    }
}
