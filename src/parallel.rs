//! Ordered fan-out over independent work items.
//!
//! With the `parallel` feature the items run on the rayon pool; results are
//! always collected in index order, so callers see the same output either
//! way.

use crate::error::Result;

/// Maps `f` over `0..n`, stopping at the first error.
#[cfg(feature = "parallel")]
pub(crate) fn try_map_indexed<T, F>(n: usize, f: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(usize) -> Result<T> + Sync + Send,
{
    use rayon::prelude::*;
    (0..n).into_par_iter().map(f).collect()
}

/// Maps `f` over `0..n`, stopping at the first error.
#[cfg(not(feature = "parallel"))]
pub(crate) fn try_map_indexed<T, F>(n: usize, f: F) -> Result<Vec<T>>
where
    F: Fn(usize) -> Result<T>,
{
    (0..n).map(f).collect()
}
