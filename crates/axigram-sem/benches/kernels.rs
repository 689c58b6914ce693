//! Criterion benchmarks for the two hot paths of seismogram extraction:
//! per-element strain reconstruction and 2-D Lagrange interpolation.

use criterion::{criterion_group, criterion_main, Criterion};
use ndarray::{Array3, Array4};

use axigram_sem::basis::{gll_points, lagrange_derivs, lagrange_interp_2d};
use axigram_sem::derivatives::strain_dipole_td;
use axigram_sem::mapping::{Corners, ElemKind};

const N: usize = 4;
const NT: usize = 1000;

fn shell_corners() -> Corners {
    let (r0, r1) = (5_000_000.0, 6_000_000.0);
    let (t0, t1) = (0.4f64, 0.7f64);
    [
        [r0 * t0.sin(), r0 * t0.cos()],
        [r0 * t1.sin(), r0 * t1.cos()],
        [r1 * t1.sin(), r1 * t1.cos()],
        [r1 * t0.sin(), r1 * t0.cos()],
    ]
}

fn bench_strain(c: &mut Criterion) {
    let nodes = gll_points(N);
    let g = lagrange_derivs(&nodes);
    let gt = g.t().to_owned();
    let corners = shell_corners();
    let mut u = Array4::<f64>::zeros((NT, N + 1, N + 1, 3));
    for (k, v) in u.iter_mut().enumerate() {
        *v = (k as f64 * 0.37).sin();
    }

    c.bench_function("strain_dipole_td_1000_samples", |b| {
        b.iter(|| {
            strain_dipole_td(
                u.view(),
                gt.view(),
                g.view(),
                &nodes,
                &nodes,
                &corners,
                ElemKind::Subpar,
                false,
            )
        });
    });
}

fn bench_interp(c: &mut Criterion) {
    let nodes = gll_points(N);
    let mut field = Array3::<f64>::zeros((NT, N + 1, N + 1));
    for (k, v) in field.iter_mut().enumerate() {
        *v = (k as f64 * 0.11).cos();
    }

    c.bench_function("lagrange_interp_2d_1000_samples", |b| {
        b.iter(|| lagrange_interp_2d(&nodes, &nodes, field.view(), 0.31, -0.64));
    });
}

criterion_group!(benches, bench_strain, bench_interp);
criterion_main!(benches);
