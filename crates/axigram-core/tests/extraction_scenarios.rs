//! End-to-end extraction scenarios against a real reciprocal database.
//!
//! These tests need an actual wavefield database on disk; point
//! `AXIGRAM_TEST_DB` at a directory containing PX/PZ `ordered_output.nc4`
//! files (a coarse ~100 s database is plenty), and optionally
//! `AXIGRAM_TEST_DB_TRANSPOSED` at a copy of the same database whose
//! `Snapshots` variables were repacked with reversed dimension order.
//! Without the variables the tests skip silently so the suite stays green
//! on machines without data.

use std::path::PathBuf;

use axigram_core::source::geocentric_colatitude_rad;
use axigram_core::{
    Component, DatabaseSession, ExtractError, ForceSource, Receiver, Source, SourceMechanism,
};

fn test_db() -> Option<PathBuf> {
    std::env::var_os("AXIGRAM_TEST_DB").map(PathBuf::from)
}

fn test_db_transposed() -> Option<PathBuf> {
    std::env::var_os("AXIGRAM_TEST_DB_TRANSPOSED").map(PathBuf::from)
}

/// Geographic latitude whose geocentric conversion lands exactly on
/// `target_deg`, i.e. the inverse of the WGS84 transform applied at the API
/// surface.
fn invert_geocentric_latitude(target_deg: f64) -> f64 {
    let f = 1.0 / 298.257_223_563;
    (target_deg.to_radians().tan() / ((1.0 - f) * (1.0 - f)))
        .atan()
        .to_degrees()
}

fn moment_source() -> SourceMechanism {
    Source::new(
        4.0, 3.0, 0.0, 4.71e17, 3.81e17, -4.74e17, 3.99e17, -8.05e17, -1.23e17,
    )
    .into()
}

const ALL: [Component; 5] = [
    Component::Z,
    Component::N,
    Component::E,
    Component::R,
    Component::T,
];

#[test]
fn moment_tensor_all_components() {
    let Some(db) = test_db() else { return };
    let mut session = DatabaseSession::open(&db).unwrap();
    let npts = session.info().unwrap().npts;

    let receiver = Receiver::new(10.0, 20.0);
    let traces = session
        .get_seismograms(&moment_source(), &receiver, &ALL)
        .unwrap();

    assert_eq!(traces.len(), 5);
    for (comp, series) in &traces {
        assert_eq!(series.len(), npts, "length of {comp}");
        let peak = series.iter().fold(0.0f64, |a, v| a.max(v.abs()));
        assert!(peak.is_finite(), "{comp} has non-finite samples");
        assert!(
            (1e-13..=1e-3).contains(&peak),
            "{comp} peak {peak:e} out of the plausible range"
        );
    }
}

#[test]
fn source_shift_removal_shifts_by_whole_samples() {
    let Some(db) = test_db() else { return };
    let mut session = DatabaseSession::open(&db).unwrap();
    let info = session.info().unwrap();
    let shift = info.src_shift_samples as usize;

    let receiver = Receiver::new(10.0, 20.0);
    let raw = session
        .get_seismograms_shifted(&moment_source(), &receiver, &[Component::Z], false)
        .unwrap();
    let cut = session
        .get_seismograms_shifted(&moment_source(), &receiver, &[Component::Z], true)
        .unwrap();

    let raw_z = &raw[&Component::Z];
    let cut_z = &cut[&Component::Z];
    assert_eq!(raw_z.len(), info.npts);
    assert_eq!(cut_z.len(), info.npts - shift);
    for (a, b) in cut_z.iter().zip(raw_z.iter().skip(shift)) {
        assert_eq!(a, b);
    }
}

#[test]
fn force_source_in_reciprocal_displacement_db() {
    let Some(db) = test_db() else { return };
    let mut session = DatabaseSession::open(&db).unwrap();
    let npts = session.info().unwrap().npts;

    let source: SourceMechanism =
        ForceSource::new(89.91, 0.0, 12_000.0, 1.23e10, 2.55e10, 1.73e10).into();
    let receiver = Receiver::new(-45.0, 20.0);
    let traces = session.get_seismograms(&source, &receiver, &ALL).unwrap();

    for (comp, series) in &traces {
        assert_eq!(series.len(), npts, "length of {comp}");
        assert!(series.iter().all(|v| v.is_finite()));
    }
}

#[test]
fn repeated_extraction_is_bitwise_identical() {
    let Some(db) = test_db() else { return };
    let mut session = DatabaseSession::open(&db).unwrap();
    let receiver = Receiver::new(10.0, 20.0);

    let first = session
        .get_seismograms(&moment_source(), &receiver, &ALL)
        .unwrap();
    // Second call is served from the buffers; must still be bit-equal.
    let second = session
        .get_seismograms(&moment_source(), &receiver, &ALL)
        .unwrap();
    // A fresh session replays the whole pipeline.
    let mut reopened = DatabaseSession::open(&db).unwrap();
    let third = reopened
        .get_seismograms(&moment_source(), &receiver, &ALL)
        .unwrap();

    for comp in ALL {
        assert_eq!(first[&comp], second[&comp]);
        assert_eq!(first[&comp], third[&comp]);
    }
}

#[test]
fn transposed_database_matches_the_original() {
    let (Some(db), Some(db_t)) = (test_db(), test_db_transposed()) else {
        return;
    };
    let mut session = DatabaseSession::open(&db).unwrap();
    let mut session_t = DatabaseSession::open(&db_t).unwrap();

    let receiver = Receiver::new(10.0, 20.0);
    let original = session
        .get_seismograms(&moment_source(), &receiver, &ALL)
        .unwrap();
    let repacked = session_t
        .get_seismograms(&moment_source(), &receiver, &ALL)
        .unwrap();

    // The contraction is bit-equal; only the floating-point storage order
    // differs, so the traces agree to a sliver of the peak-to-peak range.
    for comp in ALL {
        let a = &original[&comp];
        let b = &repacked[&comp];
        assert_eq!(a.len(), b.len());
        let ptp = a.iter().fold(f64::NEG_INFINITY, |m, v| m.max(*v))
            - a.iter().fold(f64::INFINITY, |m, v| m.min(*v));
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() <= 1e-6 * ptp, "{comp} deviates beyond tolerance");
        }
    }
}

#[test]
fn geocentric_inversion_is_consistent() {
    // Pure check of the S5 construction: feeding the inverted latitude back
    // through the API-surface conversion reproduces the target colatitude.
    let lat = invert_geocentric_latitude(45.0);
    let colat = geocentric_colatitude_rad(lat);
    assert!((colat - 45.0f64.to_radians()).abs() < 1e-12);
    assert!(lat > 45.0); // geographic sits poleward of geocentric up north
}

#[test]
fn geocentric_latitude_changes_the_traces_at_maximum_effect() {
    let Some(db) = test_db() else { return };
    let mut session = DatabaseSession::open(&db).unwrap();

    // Source at 45°, receiver at -45°: the geographic→geocentric conversion
    // has its largest effect here.
    let geographic = session
        .get_seismograms(
            &SourceMechanism::Moment(Source::new(
                45.0, 3.0, 0.0, 4.71e17, 3.81e17, -4.74e17, 3.99e17, -8.05e17, -1.23e17,
            )),
            &Receiver::new(-45.0, 20.0),
            &ALL,
        )
        .unwrap();

    // A naive implementation treats the raw latitudes as geocentric; it is
    // reproduced exactly by pre-inverting the latitudes through the same
    // analytic transform, so the two runs differ by that transform alone.
    let naive = session
        .get_seismograms(
            &SourceMechanism::Moment(Source::new(
                invert_geocentric_latitude(45.0),
                3.0,
                0.0,
                4.71e17,
                3.81e17,
                -4.74e17,
                3.99e17,
                -8.05e17,
                -1.23e17,
            )),
            &Receiver::new(invert_geocentric_latitude(-45.0), 20.0),
            &ALL,
        )
        .unwrap();

    let mut any_component_moved = false;
    for comp in ALL {
        let a = &geographic[&comp];
        let b = &naive[&comp];
        assert_eq!(a.len(), b.len());
        assert!(a.iter().all(|v| v.is_finite()));
        let ptp = a.iter().fold(f64::NEG_INFINITY, |m, v| m.max(*v))
            - a.iter().fold(f64::INFINITY, |m, v| m.min(*v));
        let max_dev = a
            .iter()
            .zip(b.iter())
            .fold(0.0f64, |m, (x, y)| m.max((x - y).abs()));
        if max_dev > 1e-6 * ptp {
            any_component_moved = true;
        }
    }
    assert!(
        any_component_moved,
        "the geocentric conversion must shift the ±45° geometry measurably"
    );
}

#[test]
fn out_of_mesh_query_fails_and_session_survives() {
    let Some(db) = test_db() else { return };
    let mut session = DatabaseSession::open(&db).unwrap();
    let receiver = Receiver::new(10.0, 20.0);

    // A source far below any sensible kernel mesh.
    let buried = SourceMechanism::Moment(Source::new(
        4.0, 3.0, 6.0e6, 4.71e17, 3.81e17, -4.74e17, 3.99e17, -8.05e17, -1.23e17,
    ));
    let err = session
        .get_seismograms(&buried, &receiver, &[Component::Z])
        .unwrap_err();
    assert!(matches!(err, ExtractError::ElementNotFound { .. }));

    // The session keeps answering valid queries afterwards.
    let ok = session
        .get_seismograms(&moment_source(), &receiver, &[Component::Z])
        .unwrap();
    assert_eq!(ok.len(), 1);
}

#[test]
fn info_reports_consistent_timing() {
    let Some(db) = test_db() else { return };
    let session = DatabaseSession::open(&db).unwrap();
    let info = session.info().unwrap();

    assert!(info.is_reciprocal);
    assert!(info.npts > 0);
    assert!(info.dt > 0.0);
    assert!((info.length - info.dt * (info.npts - 1) as f64).abs() < 1e-12);
    assert_eq!(info.nfft, 2 * info.npts.next_power_of_two());
    assert_eq!(info.slip.len(), info.npts);
    assert_eq!(info.sliprate.len(), info.npts);
    assert!(info.format_version >= axigram_core::MIN_FILE_VERSION);
}
