//! End-to-end tests of the viewport location flow: derive envelopes,
//! buffer them for safe feature requests, reproject between client and
//! service CRSs, and recover the original bounds on the way back.

use maploc::prelude::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn finnish_viewport() -> Location {
    let mut loc = Location::with_srs("EPSG:3067");
    loc.set_bbox(vec![380_000.0, 6_660_000.0, 400_000.0, 6_680_000.0]);
    loc.set_zoom(9);
    loc
}

#[test]
fn test_buffered_fetch_flow() {
    init_logging();
    let mut loc = finnish_viewport();

    // Tile grid hands back a buffered bbox one tile larger than the view
    let buffered = [375_000.0, 6_655_000.0, 405_000.0, 6_685_000.0];
    loc.set_enlarged_envelope(&buffered).unwrap();

    let plain = loc.envelope().unwrap();
    let enlarged = loc.enlarged_envelope().unwrap();

    // Full buffered extent added on every side
    assert_eq!(enlarged.min_x, plain.min_x - 30_000.0);
    assert_eq!(enlarged.max_x, plain.max_x + 30_000.0);
    assert_eq!(enlarged.min_y, plain.min_y - 30_000.0);
    assert_eq!(enlarged.max_y, plain.max_y + 30_000.0);

    // The session key ignores the buffering entirely
    assert_eq!(
        loc.key().unwrap(),
        "EPSG:3067_380000_6660000_400000_6680000_9"
    );
}

#[test]
fn test_service_transform_on_points() {
    init_logging();
    let loc = finnish_viewport();
    let wgs84 = resolve("EPSG:4326", true).unwrap();

    let to_service = loc.transform_for_service(&wgs84, true).unwrap();
    let (cx, cy) = loc.envelope().unwrap().center();
    let (lon, lat) = to_service.apply(cx, cy).unwrap();
    assert!((19.0..32.0).contains(&lon), "lon = {lon}");
    assert!((59.0..71.0).contains(&lat), "lat = {lat}");

    let to_client = loc.transform_for_client(&wgs84, true).unwrap();
    let (x, y) = to_client.apply(lon, lat).unwrap();
    assert!((x - cx).abs() < 1.0, "x {cx} -> {x}");
    assert!((y - cy).abs() < 1.0, "y {cy} -> {y}");
}

#[test]
fn test_envelope_roundtrip_over_crs_pairs() {
    init_logging();
    // (source, bbox in source, target, tolerance back in source units).
    // Tolerances are dominated by hull growth from edge densification:
    // a box crossing a transverse-mercator zone picks up a real margin
    // on each leg, a mercator/geographic pair is rectilinear and exact.
    let cases: &[(&str, [f64; 4], &str, f64)] = &[
        ("EPSG:4326", [20.0, 59.0, 32.0, 70.0], "EPSG:3857", 1e-6),
        ("EPSG:4326", [24.0, 60.0, 27.0, 62.0], "EPSG:3067", 0.1),
        ("EPSG:3067", [380_000.0, 6_660_000.0, 400_000.0, 6_680_000.0], "EPSG:3857", 2_000.0),
        ("EPSG:4326", [23.0, 60.0, 28.0, 64.0], "EPSG:2393", 0.2),
    ];

    for (source, bbox, target, tol) in cases {
        let mut loc = Location::with_srs(*source);
        loc.set_bbox(bbox.to_vec());

        let there = loc.transform_envelope(None, target, true).unwrap();
        let back = loc.transform_envelope(Some(&there), source, true).unwrap();

        let original = loc.envelope().unwrap();
        for (a, b) in [
            (original.min_x, back.min_x),
            (original.min_y, back.min_y),
            (original.max_x, back.max_x),
            (original.max_y, back.max_y),
        ] {
            assert!(
                (a - b).abs() < *tol,
                "{source} -> {target} -> {source}: {a} came back as {b}"
            );
        }
        // Hull growth never loses area: the round trip covers the original
        assert!(back.min_x <= original.min_x + tol);
        assert!(back.min_y <= original.min_y + tol);
        assert!(back.max_x >= original.max_x - tol);
        assert!(back.max_y >= original.max_y - tol);
    }
}

#[test]
fn test_error_kinds_are_distinguishable() {
    init_logging();
    let mut loc = Location::with_srs("EPSG:3067");
    loc.set_bbox(vec![0.0, 0.0, 1.0, 1.0]);

    assert!(matches!(
        loc.scaled_envelope(-2.0),
        Err(LocationError::Precondition(_))
    ));
    assert!(matches!(
        loc.transform_envelope(None, "EPSG:12345", true),
        Err(LocationError::Resolution(_))
    ));

    let mut unresolved = Location::with_srs("FOO");
    unresolved.set_bbox(vec![0.0, 0.0, 1.0, 1.0]);
    assert!(matches!(
        unresolved.envelope(),
        Err(LocationError::Resolution(_))
    ));
}

#[test]
fn test_identity_transform_introduces_no_drift() {
    init_logging();
    let loc = finnish_viewport();
    let env = loc.transform_envelope(None, "EPSG:3067", false).unwrap();
    let plain = loc.envelope().unwrap();
    assert_eq!(env.min_x, plain.min_x);
    assert_eq!(env.min_y, plain.min_y);
    assert_eq!(env.max_x, plain.max_x);
    assert_eq!(env.max_y, plain.max_y);
}
