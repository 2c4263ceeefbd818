use loam_noise::{
    NoiseSettings, NormalizeMode, apply_falloff, generate_falloff_map, generate_height_map,
};

#[test]
fn grid_has_requested_shape() {
    let map = generate_height_map(7, 4, &NoiseSettings::default(), [0.0, 0.0]);
    assert_eq!(map.width(), 7);
    assert_eq!(map.height(), 4);
    assert_eq!(map.values().len(), 28);
}

#[test]
fn non_positive_scale_is_clamped() {
    for scale in [0.0, -3.0] {
        let s = NoiseSettings {
            scale,
            ..NoiseSettings::default()
        };
        let map = generate_height_map(6, 6, &s, [0.0, 0.0]);
        assert!(map.values().iter().all(|v| v.is_finite()));
    }
}

#[test]
fn seed_changes_the_field() {
    let a = generate_height_map(16, 16, &NoiseSettings::default(), [0.0, 0.0]);
    let b = generate_height_map(
        16,
        16,
        &NoiseSettings {
            seed: 99,
            ..NoiseSettings::default()
        },
        [0.0, 0.0],
    );
    assert_ne!(a.values(), b.values());
}

#[test]
fn local_mode_differs_between_chunks() {
    let s = NoiseSettings {
        normalize_mode: NormalizeMode::Local,
        ..NoiseSettings::default()
    };
    let a = generate_height_map(20, 20, &s, [0.0, 0.0]);
    let b = generate_height_map(20, 20, &s, [19.0, 0.0]);
    // Shared column 19 of `a` is column 0 of `b`, but each chunk normalizes to its own range.
    let shared_equal = (0..20).all(|y| (a.get(19, y) - b.get(0, y)).abs() < 1e-6);
    assert!(!shared_equal);
}

#[test]
fn falloff_is_zero_centre_one_edge() {
    let mask = generate_falloff_map(33);
    assert!(mask.get(16, 16) < 0.01);
    assert!((mask.get(0, 0) - 1.0).abs() < 1e-6);
    assert!((mask.get(0, 16) - 1.0).abs() < 1e-6);
}

#[test]
fn falloff_lowers_and_clamps() {
    let s = NoiseSettings::default();
    let map = generate_height_map(33, 33, &s, [0.0, 0.0]);
    let mask = generate_falloff_map(33);
    let out = apply_falloff(&map, &mask);
    for (i, (&h, &o)) in map.values().iter().zip(out.values()).enumerate() {
        assert!(o <= h + 1e-6, "sample {i} rose");
        assert!((0.0..=1.0).contains(&o));
    }
    assert_eq!(out.get(0, 0), 0.0);
}
