#![allow(dead_code)]

use rand::{rngs::StdRng, seq::SliceRandom, Rng};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Row-major strides with `pad[i]` extra elements after each slice of dim `i + 1`.
pub fn padded_strides(shape: &[usize], pad: &[usize]) -> Vec<usize> {
    let rank = shape.len();
    let mut strides = vec![1usize; rank];
    for i in (0..rank.saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1] + pad[i];
    }
    strides
}

pub fn packed(shape: &[usize]) -> Vec<usize> {
    padded_strides(shape, &vec![0; shape.len()])
}

pub fn permuted(shape: &[usize], perm: &[usize]) -> Vec<usize> {
    perm.iter().map(|&p| shape[p]).collect()
}

pub fn inverse(perm: &[usize]) -> Vec<usize> {
    let mut inv = vec![0; perm.len()];
    for (i, &p) in perm.iter().enumerate() {
        inv[p] = i;
    }
    inv
}

/// Number of elements a strided view spans.
pub fn span(shape: &[usize], strides: &[usize]) -> usize {
    shape
        .iter()
        .zip(strides)
        .map(|(&n, &s)| (n - 1) * s)
        .sum::<usize>()
        + 1
}

/// Visit every input multi-index with its (input, output) element offsets.
pub fn for_each_offset(
    shape: &[usize],
    perm: &[usize],
    input_stride: &[usize],
    output_stride: &[usize],
    mut f: impl FnMut(usize, usize),
) {
    let rank = shape.len();
    let total: usize = shape.iter().product();
    let mut idx = vec![0usize; rank];
    for _ in 0..total {
        let src: usize = (0..rank).map(|d| idx[d] * input_stride[d]).sum();
        let dst: usize = (0..rank).map(|i| idx[perm[i]] * output_stride[i]).sum();
        f(src, dst);
        for d in (0..rank).rev() {
            idx[d] += 1;
            if idx[d] < shape[d] {
                break;
            }
            idx[d] = 0;
        }
    }
}

/// Naive odometer transpose of `T` elements.
pub fn reference_transpose<T: Copy>(
    shape: &[usize],
    perm: &[usize],
    input_stride: &[usize],
    output_stride: &[usize],
    input: &[T],
    output: &mut [T],
) {
    for_each_offset(shape, perm, input_stride, output_stride, |src, dst| {
        output[dst] = input[src];
    });
}

/// A random shape of the given rank with extents in `1..=max_extent`, and a
/// random permutation.
pub fn random_problem(rng: &mut StdRng, rank: usize, max_extent: usize) -> (Vec<usize>, Vec<usize>) {
    let shape: Vec<usize> = (0..rank).map(|_| rng.gen_range(1..=max_extent)).collect();
    let mut perm: Vec<usize> = (0..rank).collect();
    perm.shuffle(rng);
    (shape, perm)
}

/// A buffer of `len` elements filled with random bytes.
pub fn random_buffer<T: bytemuck::Pod>(rng: &mut StdRng, len: usize) -> Vec<T> {
    let mut data = vec![<T as bytemuck::Zeroable>::zeroed(); len];
    rng.fill(bytemuck::cast_slice_mut::<T, u8>(&mut data));
    data
}
