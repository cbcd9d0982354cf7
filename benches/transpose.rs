use rand::{rngs::StdRng, Rng, SeedableRng};
use std::hint::black_box;
use std::time::{Duration, Instant};
use strided_transpose::{
    Backend, DepthToSpaceConfig, DepthToSpaceNhwc, Parallelize, Sequential, TransposeNd,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn median(samples: &mut [Duration]) -> Duration {
    samples.sort();
    let n = samples.len();
    if n % 2 == 1 {
        samples[n / 2]
    } else {
        (samples[n / 2 - 1] + samples[n / 2]) / 2
    }
}

fn bench_n(label: &str, warmup: usize, iters: usize, bytes: usize, mut f: impl FnMut()) {
    for _ in 0..warmup {
        f();
    }
    let mut samples = Vec::with_capacity(iters);
    for _ in 0..iters {
        let t0 = Instant::now();
        f();
        samples.push(t0.elapsed());
    }
    let med = median(&mut samples);
    let ms = med.as_secs_f64() * 1e3;
    let gbps = (bytes as f64) / med.as_secs_f64() / 1e9;
    let p25 = samples[samples.len() / 4].as_secs_f64() * 1e3;
    let p75 = samples[samples.len() * 3 / 4].as_secs_f64() * 1e3;
    println!("  {label:36} {ms:8.3} ms  ({p25:.3} / {p75:.3})  {gbps:6.2} GB/s");
}

fn random_u32(len: usize, seed: u64) -> Vec<u32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen()).collect()
}

/// Row-major odometer transpose, the baseline every scenario is compared to.
fn naive_transpose(shape: &[usize], perm: &[usize], src: &[u32], dst: &mut [u32]) {
    let rank = shape.len();
    let out_shape: Vec<usize> = perm.iter().map(|&p| shape[p]).collect();
    let mut out_stride = vec![1usize; rank];
    for i in (0..rank - 1).rev() {
        out_stride[i] = out_stride[i + 1] * out_shape[i + 1];
    }
    let mut dst_stride = vec![0usize; rank];
    for (i, &p) in perm.iter().enumerate() {
        dst_stride[p] = out_stride[i];
    }

    let mut idx = vec![0usize; rank];
    let mut dst_off = 0usize;
    for &value in src {
        dst[dst_off] = value;
        for d in (0..rank).rev() {
            idx[d] += 1;
            dst_off += dst_stride[d];
            if idx[d] < shape[d] {
                break;
            }
            dst_off -= idx[d] * dst_stride[d];
            idx[d] = 0;
        }
    }
}

fn bench_transpose<P: Parallelize>(label: &str, shape: &[usize], perm: &[usize], pool: &P) {
    let backend = Backend::new();
    let total: usize = shape.iter().product();
    let bytes = total * std::mem::size_of::<u32>() * 2; // read + write
    let src = random_u32(total, 42);
    let mut dst = vec![0u32; total];

    let mut op = TransposeNd::<u32>::new(&backend, 0).unwrap();
    op.setup(shape, perm).unwrap();
    bench_n(label, 2, 20, bytes, || {
        op.run(&src, &mut dst, pool).unwrap();
        black_box(dst.as_ptr());
    });
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

/// Scenario 1: 2D transpose, 4096 x 4096 u32 (64 MB).
fn scenario_2d() {
    println!("=== Scenario 1: 2D transpose [4096, 4096] ===");
    let shape = [4096, 4096];
    let perm = [1, 0];
    let total = 4096 * 4096;
    let bytes = total * 4 * 2;

    let src = random_u32(total, 1);
    let mut dst = vec![0u32; total];
    bench_n("naive_odometer", 1, 10, bytes, || {
        naive_transpose(&shape, &perm, &src, &mut dst);
        black_box(dst.as_ptr());
    });
    bench_transpose("TransposeNd (sequential)", &shape, &perm, &Sequential);
    #[cfg(feature = "parallel")]
    bench_transpose(
        "TransposeNd (rayon)",
        &shape,
        &perm,
        &strided_transpose::RayonPool::global(),
    );
    println!();
}

/// Scenario 2: rank-3 rotation [256, 256, 256] perm [2, 0, 1].
fn scenario_rank_3() {
    println!("=== Scenario 2: rank-3 rotation [256, 256, 256] perm [2, 0, 1] ===");
    let shape = [256, 256, 256];
    let perm = [2, 0, 1];
    bench_transpose("TransposeNd (sequential)", &shape, &perm, &Sequential);
    #[cfg(feature = "parallel")]
    bench_transpose(
        "TransposeNd (rayon)",
        &shape,
        &perm,
        &strided_transpose::RayonPool::global(),
    );
    println!();
}

/// Scenario 3: identity permutation collapses to a single memcpy.
fn scenario_copy() {
    println!("=== Scenario 3: identity [64, 64, 64, 64] (contiguous copy) ===");
    let shape = [64, 64, 64, 64];
    let perm = [0, 1, 2, 3];
    let total: usize = shape.iter().product();
    let bytes = total * 4 * 2;

    let src = random_u32(total, 3);
    let mut dst = vec![0u32; total];
    bench_n("std::ptr::copy_nonoverlapping", 2, 20, bytes, || {
        unsafe { std::ptr::copy_nonoverlapping(src.as_ptr(), dst.as_mut_ptr(), total) };
        black_box(dst.as_ptr());
    });
    bench_transpose("TransposeNd (sequential)", &shape, &perm, &Sequential);
    println!();
}

/// Scenario 4: rank-6 reverse permutation, all extents 12.
fn scenario_rank_6() {
    println!("=== Scenario 4: rank-6 reverse [12; 6] ===");
    let shape = [12; 6];
    let perm = [5, 4, 3, 2, 1, 0];
    bench_transpose("TransposeNd (sequential)", &shape, &perm, &Sequential);
    #[cfg(feature = "parallel")]
    bench_transpose(
        "TransposeNd (rayon)",
        &shape,
        &perm,
        &strided_transpose::RayonPool::global(),
    );
    println!();
}

/// Scenario 5: depth-to-space on a 1 x 128 x 128 x 64 feature map, block 2.
fn scenario_depth_to_space() {
    println!("=== Scenario 5: depth-to-space NHWC [1, 128, 128, 4*16], block 2 ===");
    let backend = Backend::new();
    let (n, h, w, c, b) = (1, 128, 128, 16, 2u32);
    let total = n * h * w * c * 4;
    let bytes = total * 4 * 2;
    let src = random_u32(total, 5);
    let mut dst = vec![0u32; total];

    let mut op = DepthToSpaceNhwc::<u32>::new(&backend, DepthToSpaceConfig::packed(c, b)).unwrap();
    op.setup(n, h, w).unwrap();
    bench_n("DepthToSpaceNhwc (sequential)", 2, 20, bytes, || {
        op.run(&src, &mut dst, &Sequential).unwrap();
        black_box(dst.as_ptr());
    });
    println!();
}

// ---------------------------------------------------------------------------
// Correctness verification
// ---------------------------------------------------------------------------

fn verify_scenario(label: &str, shape: &[usize], perm: &[usize]) {
    let backend = Backend::new();
    let total: usize = shape.iter().product();
    let src = random_u32(total, 99);
    let mut expected = vec![0u32; total];
    let mut actual = vec![0u32; total];

    naive_transpose(shape, perm, &src, &mut expected);
    let mut op = TransposeNd::<u32>::new(&backend, 0).unwrap();
    op.setup(shape, perm).unwrap();
    op.run(&src, &mut actual, &Sequential).unwrap();

    for i in 0..total {
        assert_eq!(expected[i], actual[i], "Mismatch at element {i} for '{label}'");
    }
    println!("  [OK] {label}");
}

fn run_correctness_checks() {
    println!("--- Correctness verification ---");
    verify_scenario("2d [300, 200]", &[300, 200], &[1, 0]);
    verify_scenario("rank-3 [30, 40, 50]", &[30, 40, 50], &[2, 0, 1]);
    verify_scenario("rank-6 reverse [5; 6]", &[5; 6], &[5, 4, 3, 2, 1, 0]);
    println!();
}

fn main() {
    run_correctness_checks();
    scenario_2d();
    scenario_rank_3();
    scenario_copy();
    scenario_rank_6();
    scenario_depth_to_space();
}
