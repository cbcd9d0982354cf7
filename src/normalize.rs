//! Dimension normalization for permutation problems.
//!
//! Collapses a rank-R transpose into the smallest equivalent problem:
//! size-1 dimensions are dropped, input dimensions that stay adjacent and
//! packed on both sides are fused, and a trailing dimension that is
//! innermost on both sides is folded into a wider opaque element.

/// A transpose after normalization.
///
/// Dimensions are indexed in input order. `perm[i]` names the input
/// dimension that output position `i` walks. Strides are in **bytes**:
/// element-width promotion changes the element unit, so element counts would
/// no longer be exact for padded layouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedProblem {
    /// Byte width of one (possibly promoted) element.
    pub element_size: usize,
    pub perm: Vec<usize>,
    /// Output position of each input dimension; the inverse of `perm`.
    pub inverse_perm: Vec<usize>,
    pub shape: Vec<usize>,
    /// Byte stride per input dimension.
    pub input_stride: Vec<usize>,
    /// Byte stride per output position.
    pub output_stride: Vec<usize>,
}

impl NormalizedProblem {
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Output byte stride of input dimension `dim`.
    pub fn output_stride_of(&self, dim: usize) -> usize {
        self.output_stride[self.inverse_perm[dim]]
    }

    /// Remove input dimension `dim`, keeping `perm` a permutation.
    fn remove_input_dim(&mut self, dim: usize) {
        let Some(pos) = self.perm.iter().position(|&p| p == dim) else {
            return;
        };
        self.shape.remove(dim);
        self.input_stride.remove(dim);
        self.perm.remove(pos);
        self.output_stride.remove(pos);
        for p in &mut self.perm {
            if *p > dim {
                *p -= 1;
            }
        }
    }
}

/// Packed row-major strides (last index varies fastest), in elements.
pub fn packed_strides(shape: &[usize]) -> Vec<usize> {
    let rank = shape.len();
    if rank == 0 {
        return vec![];
    }
    let mut strides = vec![1usize; rank];
    for i in (0..rank - 1).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

/// Inverse of a permutation: `inverse[perm[i]] == i`.
pub fn invert_perm(perm: &[usize]) -> Vec<usize> {
    let mut inverse = vec![0; perm.len()];
    for (pos, &dim) in perm.iter().enumerate() {
        inverse[dim] = pos;
    }
    inverse
}

/// Normalize a validated transpose problem.
///
/// `input_stride` (input order) and `output_stride` (output order) are in
/// elements; `None` means packed. The caller guarantees that `perm` is a
/// permutation of `0..shape.len()`, that `shape` has no zero extent, and
/// that the byte extent of both views fits in `usize`.
pub fn normalize(
    element_size: usize,
    perm: &[usize],
    shape: &[usize],
    input_stride: Option<&[usize]>,
    output_stride: Option<&[usize]>,
) -> NormalizedProblem {
    let input_stride = match input_stride {
        Some(s) => s.to_vec(),
        None => packed_strides(shape),
    };
    let output_stride = match output_stride {
        Some(s) => s.to_vec(),
        None => {
            let output_shape: Vec<usize> = perm.iter().map(|&p| shape[p]).collect();
            packed_strides(&output_shape)
        }
    };

    canonicalize(NormalizedProblem {
        element_size,
        perm: perm.to_vec(),
        inverse_perm: invert_perm(perm),
        shape: shape.to_vec(),
        input_stride: input_stride.iter().map(|s| s * element_size).collect(),
        output_stride: output_stride.iter().map(|s| s * element_size).collect(),
    })
}

/// Bring a byte-strided problem into canonical form.
///
/// Rank 1 always means one contiguous element; a lone strided dimension is
/// kept at rank 2 with a trailing unit dimension.
///
/// Idempotent: `canonicalize(canonicalize(p)) == canonicalize(p)`.
pub fn canonicalize(mut problem: NormalizedProblem) -> NormalizedProblem {
    // Size-1 dimensions address a single index and contribute nothing.
    for dim in (0..problem.rank()).rev() {
        if problem.shape[dim] == 1 {
            problem.remove_input_dim(dim);
        }
    }

    fuse_adjacent(&mut problem);
    promote_element(&mut problem);

    let es = problem.element_size;
    match problem.rank() {
        0 => {
            problem.perm = vec![0];
            problem.shape = vec![1];
            problem.input_stride = vec![es];
            problem.output_stride = vec![es];
        }
        // A single strided dimension still goes through the tiled path.
        1 if problem.shape[0] > 1 => {
            problem.perm.push(1);
            problem.shape.push(1);
            problem.input_stride.push(es);
            problem.output_stride.push(es);
        }
        _ => {}
    }
    problem.inverse_perm = invert_perm(&problem.perm);
    problem
}

/// Fuse input dimensions `a, a + 1` that are also consecutive in output order
/// and packed on both sides. Scans from the innermost output position outward.
fn fuse_adjacent(problem: &mut NormalizedProblem) {
    if problem.rank() <= 1 {
        return;
    }
    for pos in (0..problem.rank() - 1).rev() {
        let a = problem.perm[pos];
        let b = problem.perm[pos + 1];
        if b != a + 1 {
            continue;
        }
        let extent = problem.shape[b];
        let input_packed =
            extent.checked_mul(problem.input_stride[b]) == Some(problem.input_stride[a]);
        let output_packed =
            extent.checked_mul(problem.output_stride[pos + 1]) == Some(problem.output_stride[pos]);
        if input_packed && output_packed {
            problem.shape[a] *= extent;
            problem.input_stride[a] = problem.input_stride[b];
            problem.output_stride[pos] = problem.output_stride[pos + 1];
            problem.remove_input_dim(b);
        }
    }
}

/// Fold the innermost dimension into the element while it is innermost and
/// unit-strided on both sides.
///
/// A fold that would leave exactly one strided dimension is skipped: rank 1
/// is reserved for a single contiguous copy.
fn promote_element(problem: &mut NormalizedProblem) {
    loop {
        let rank = problem.rank();
        if rank == 0 || rank == 2 {
            return;
        }
        let last = rank - 1;
        let es = problem.element_size;
        if problem.perm[last] != last
            || problem.input_stride[last] != es
            || problem.output_stride[last] != es
        {
            return;
        }
        problem.element_size = es * problem.shape[last];
        problem.remove_input_dim(last);
    }
}
