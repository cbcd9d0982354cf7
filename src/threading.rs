//! Parallel executor interface.
//!
//! An executor receives an N-dimensional range and per-dimension tile sizes,
//! splits the range into tiles, runs `task(start, extent)` once per tile and
//! returns only after every tile has finished. Tiles carry no ordering
//! guarantee; they write disjoint output regions.

#[cfg(feature = "parallel")]
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::MAX_RANK;

/// A tile task: `(start, extent)` per dimension of the range.
pub type TileTask<'a> = dyn Fn(&[usize], &[usize]) + Sync + 'a;

/// Fan-out/fan-in executor over tiled index ranges.
pub trait Parallelize: Sync {
    /// Run `task` over every tile of `range`. `tile[d]` is the tile extent
    /// along dimension `d`; edge tiles are clipped to the range.
    fn parallelize(&self, range: &[usize], tile: &[usize], task: &TileTask<'_>);
}

/// Number of tiles along each dimension.
fn tile_counts(range: &[usize], tile: &[usize]) -> [usize; MAX_RANK] {
    let mut counts = [1usize; MAX_RANK];
    for (d, (&r, &t)) in range.iter().zip(tile.iter()).enumerate() {
        counts[d] = r.div_ceil(t.max(1));
    }
    counts
}

/// Decode a linear tile index (row-major over tiles) into start/extent.
fn tile_at(
    range: &[usize],
    tile: &[usize],
    counts: &[usize],
    mut linear: usize,
    start: &mut [usize],
    extent: &mut [usize],
) {
    for d in (0..range.len()).rev() {
        let t = tile[d].max(1);
        let i = linear % counts[d];
        linear /= counts[d];
        start[d] = i * t;
        extent[d] = t.min(range[d] - start[d]);
    }
}

fn total_tiles(range: &[usize], tile: &[usize]) -> usize {
    if range.iter().any(|&r| r == 0) {
        return 0;
    }
    tile_counts(range, tile)[..range.len()].iter().product()
}

/// Runs every tile on the calling thread, in row-major tile order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequential;

impl Parallelize for Sequential {
    fn parallelize(&self, range: &[usize], tile: &[usize], task: &TileTask<'_>) {
        let rank = range.len();
        let counts = tile_counts(range, tile);
        let mut start = [0usize; MAX_RANK];
        let mut extent = [0usize; MAX_RANK];
        for linear in 0..total_tiles(range, tile) {
            tile_at(range, tile, &counts, linear, &mut start, &mut extent);
            task(&start[..rank], &extent[..rank]);
        }
    }
}

/// Minimum number of iterated elements before tiles are spread over threads.
#[cfg(feature = "parallel")]
pub const MIN_PARALLEL_LEN: usize = 1 << 15; // 32768

/// Spreads tiles over a rayon thread pool.
///
/// Ranges smaller than [`MIN_PARALLEL_LEN`] run inline on the caller.
#[cfg(feature = "parallel")]
#[derive(Debug, Default)]
pub struct RayonPool {
    pool: Option<rayon::ThreadPool>,
}

#[cfg(feature = "parallel")]
impl RayonPool {
    /// Use rayon's global pool.
    pub fn global() -> Self {
        RayonPool { pool: None }
    }

    /// Use a dedicated pool with `num_threads` workers.
    pub fn with_threads(num_threads: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()?;
        Ok(RayonPool { pool: Some(pool) })
    }

    pub fn current_num_threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }
}

#[cfg(feature = "parallel")]
impl Parallelize for RayonPool {
    fn parallelize(&self, range: &[usize], tile: &[usize], task: &TileTask<'_>) {
        let total = total_tiles(range, tile);
        let len: usize = range.iter().product();
        if total <= 1 || len < MIN_PARALLEL_LEN || self.current_num_threads() <= 1 {
            Sequential.parallelize(range, tile, task);
            return;
        }

        let rank = range.len();
        let counts = tile_counts(range, tile);
        let run = || {
            (0..total).into_par_iter().for_each(|linear| {
                let mut start = [0usize; MAX_RANK];
                let mut extent = [0usize; MAX_RANK];
                tile_at(range, tile, &counts, linear, &mut start, &mut extent);
                task(&start[..rank], &extent[..rank]);
            });
        };
        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }
}
