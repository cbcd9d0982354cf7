mod common;

use common::*;
use proptest::prelude::*;
use strided_transpose::{
    canonicalize, compute_loop_order, normalize, Backend, LoopNest, NormalizedProblem,
    Sequential, TransposeNd,
};

/// Element size, shape, permutation and per-dimension row padding.
fn problem() -> impl Strategy<Value = (usize, Vec<usize>, Vec<usize>, Vec<usize>)> {
    (1usize..=6).prop_flat_map(|rank| {
        (
            prop::sample::select(vec![1usize, 2, 3, 4, 8]),
            prop::collection::vec(1usize..=4, rank),
            Just((0..rank).collect::<Vec<usize>>()).prop_shuffle(),
            prop::collection::vec(prop::sample::select(vec![0usize, 0, 1, 3]), rank),
        )
    })
}

/// Byte-level (input, output) address pairs moved by the original problem.
fn direct_pairs(
    es: usize,
    shape: &[usize],
    perm: &[usize],
    in_stride: &[usize],
    out_stride: &[usize],
) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for_each_offset(shape, perm, in_stride, out_stride, |src, dst| {
        for k in 0..es {
            pairs.push((src * es + k, dst * es + k));
        }
    });
    pairs.sort_unstable();
    pairs
}

/// Byte-level address pairs moved by iterating a loop nest.
fn nest_pairs(problem: &NormalizedProblem, nest: &LoopNest) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    let rank = nest.rank();
    let mut idx = vec![0usize; rank];
    for _ in 0..nest.total_len() {
        let src: usize = (0..rank).map(|k| idx[k] * nest.input_stride[k]).sum();
        let dst: usize = (0..rank).map(|k| idx[k] * nest.output_stride[k]).sum();
        for b in 0..problem.element_size {
            pairs.push((src + b, dst + b));
        }
        for k in (0..rank).rev() {
            idx[k] += 1;
            if idx[k] < nest.range[k] {
                break;
            }
            idx[k] = 0;
        }
    }
    pairs.sort_unstable();
    pairs
}

proptest! {
    #[test]
    fn normalization_is_idempotent((es, shape, perm, pad) in problem()) {
        let out_shape = permuted(&shape, &perm);
        let in_stride = padded_strides(&shape, &pad);
        let out_stride = padded_strides(&out_shape, &pad);
        let once = normalize(es, &perm, &shape, Some(&in_stride), Some(&out_stride));
        let twice = canonicalize(once.clone());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn normalization_preserves_address_set((es, shape, perm, pad) in problem()) {
        let out_shape = permuted(&shape, &perm);
        let in_stride = padded_strides(&shape, &pad);
        let out_stride = padded_strides(&out_shape, &pad);

        let normalized = normalize(es, &perm, &shape, Some(&in_stride), Some(&out_stride));
        prop_assert!(normalized.rank() <= shape.len());
        let nest = LoopNest::new(&normalized, compute_loop_order(&normalized.perm)).unwrap();

        prop_assert_eq!(
            direct_pairs(es, &shape, &perm, &in_stride, &out_stride),
            nest_pairs(&normalized, &nest)
        );
    }

    #[test]
    fn setup_accepts_exactly_permutations(
        perm in (1usize..=6).prop_flat_map(|rank| prop::collection::vec(0usize..rank + 1, rank))
    ) {
        let backend = Backend::new();
        let mut op = TransposeNd::<u8>::new(&backend, 0).unwrap();
        let shape = vec![2; perm.len()];

        let mut sorted = perm.clone();
        sorted.sort_unstable();
        let is_permutation = sorted.iter().enumerate().all(|(i, &p)| i == p);

        let result = op.setup(&shape, &perm);
        prop_assert_eq!(result.is_ok(), is_permutation);
        if let Err(err) = result {
            prop_assert!(err.invalid_parameter().is_some());
        }
    }

    #[test]
    fn transpose_matches_reference((_es, shape, perm, pad) in problem(), seed in any::<u64>()) {
        use rand::{rngs::StdRng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(seed);
        let out_shape = permuted(&shape, &perm);
        let in_stride = padded_strides(&shape, &pad);
        let out_stride = padded_strides(&out_shape, &pad);

        let input: Vec<u16> = random_buffer(&mut rng, span(&shape, &in_stride));
        let mut output: Vec<u16> = random_buffer(&mut rng, span(&out_shape, &out_stride));
        let mut expected = output.clone();

        let backend = Backend::new();
        let mut op = TransposeNd::<u16>::new(&backend, 0).unwrap();
        op.setup_strided(&shape, &perm, Some(&in_stride), Some(&out_stride)).unwrap();
        op.run(&input, &mut output, &Sequential).unwrap();

        reference_transpose(&shape, &perm, &in_stride, &out_stride, &input, &mut expected);
        prop_assert_eq!(output, expected);
    }
}
