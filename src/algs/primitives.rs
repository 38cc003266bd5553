//! Parallel primitive layer.
//!
//! Sort-by-key, gather, offset computation, stream compaction and segmented
//! reduction over rayon. These are the building blocks the coordinate matrix
//! and the packing engine are written against. All functions expect to be
//! called from inside an [`ExecContext`](crate::context::ExecContext) so they
//! run on its pool.
//!
//! Sorting is stable: [`update_permutation`] re-sorts an existing permutation
//! by a new key while keeping the order established by earlier keys, so a
//! lexicographic multi-key sort is a sequence of passes from the least to the
//! most significant key.

use rayon::prelude::*;

use crate::multicut_error::MulticutError;

/// Identity permutation `0..n`.
pub fn sequence(n: usize) -> Vec<usize> {
    (0..n).into_par_iter().collect()
}

/// Stable re-sort of `perm` by `keys[perm[i]]`.
pub fn update_permutation<K>(keys: &[K], perm: &mut [usize])
where
    K: Ord + Copy + Send + Sync,
{
    perm.par_sort_by_key(|&i| keys[i]);
}

/// Gather `values` through `perm`: afterwards `values[i] == old[perm[i]]`.
///
/// The permutation is applied verbatim; payload arrays are never re-sorted on
/// their own.
pub fn apply_permutation<T>(values: &mut Vec<T>, perm: &[usize])
where
    T: Copy + Send + Sync,
{
    assert_eq!(values.len(), perm.len(), "permutation length mismatch");
    let gathered: Vec<T> = perm.par_iter().map(|&i| values[i]).collect();
    *values = gathered;
}

/// Permutation that orders entries by `(primary, secondary)`.
pub fn lexicographic_permutation(primary: &[u32], secondary: &[u32]) -> Vec<usize> {
    assert_eq!(primary.len(), secondary.len());
    let mut perm = sequence(primary.len());
    update_permutation(secondary, &mut perm);
    update_permutation(primary, &mut perm);
    perm
}

/// Row offsets of a sorted key array.
///
/// Returns `n_rows + 1` entries where `offsets[r]` is the first position with
/// `keys[pos] >= r` and `offsets[n_rows] == keys.len()`. Empty rows get the
/// offset of the next non-empty one.
pub fn compute_offsets(sorted_keys: &[u32], n_rows: usize) -> Vec<usize> {
    debug_assert!(sorted_keys.windows(2).all(|w| w[0] <= w[1]));
    debug_assert!(sorted_keys.last().is_none_or(|&k| (k as usize) < n_rows));
    (0..=n_rows)
        .into_par_iter()
        .map(|r| sorted_keys.partition_point(|&k| (k as usize) < r))
        .collect()
}

/// Order-preserving stream compaction: indices in `0..n` where `keep` holds.
pub fn compact_indices<F>(n: usize, keep: F) -> Vec<usize>
where
    F: Fn(usize) -> bool + Sync + Send,
{
    (0..n).into_par_iter().filter(|&i| keep(i)).collect()
}

/// Segmented sum over runs of equal keys.
///
/// `keys` must be sorted so equal keys are adjacent. Returns one key per run
/// and the sum of its values, in key order. Each run is summed in `f64`.
pub fn reduce_by_key_sum<K>(keys: &[K], values: &[f32]) -> (Vec<K>, Vec<f32>)
where
    K: PartialEq + Copy + Send + Sync,
{
    assert_eq!(keys.len(), values.len());
    let starts = compact_indices(keys.len(), |i| i == 0 || keys[i] != keys[i - 1]);
    starts
        .par_iter()
        .enumerate()
        .map(|(s, &begin)| {
            let end = starts.get(s + 1).copied().unwrap_or(keys.len());
            let total: f64 = values[begin..end].iter().map(|&v| v as f64).sum();
            (keys[begin], total as f32)
        })
        .unzip()
}

/// Sum of the negative part of `weights`: Σ min(0, w).
pub fn negative_floor(weights: &[f32]) -> f64 {
    weights
        .par_iter()
        .map(|&w| if w < 0.0 { w as f64 } else { 0.0 })
        .sum()
}

/// Reserve a vector of exactly `n` elements or report the failure.
pub fn try_alloc<T>(n: usize) -> Result<Vec<T>, MulticutError> {
    let mut v = Vec::new();
    v.try_reserve_exact(n)
        .map_err(|_| MulticutError::Allocation { requested: n })?;
    Ok(v)
}

/// Mirror every entry: `(r, c, w)` yields `(r, c, w)` and `(c, r, w)`.
///
/// The first half of the output holds the input as given, the second half
/// the mirrored copies.
pub fn to_undirected(
    rows: &[u32],
    cols: &[u32],
    weights: &[f32],
) -> Result<(Vec<u32>, Vec<u32>, Vec<f32>), MulticutError> {
    let n = rows.len();
    let mut r = try_alloc(2 * n)?;
    let mut c = try_alloc(2 * n)?;
    let mut w = try_alloc(2 * n)?;
    r.par_extend(rows.par_iter().chain(cols.par_iter()).copied());
    c.par_extend(cols.par_iter().chain(rows.par_iter()).copied());
    w.par_extend(weights.par_iter().chain(weights.par_iter()).copied());
    Ok((r, c, w))
}

/// Keep entries with `row >= col`; others are dropped, not merged.
pub fn to_directed(
    rows: &[u32],
    cols: &[u32],
    weights: &[f32],
) -> (Vec<u32>, Vec<u32>, Vec<f32>) {
    let keep = compact_indices(rows.len(), |i| rows[i] >= cols[i]);
    gather3(rows, cols, weights, &keep)
}

/// Gather all three coordinate arrays through the same index list.
pub fn gather3(
    rows: &[u32],
    cols: &[u32],
    weights: &[f32],
    idx: &[usize],
) -> (Vec<u32>, Vec<u32>, Vec<f32>) {
    let r = idx.par_iter().map(|&i| rows[i]).collect();
    let c = idx.par_iter().map(|&i| cols[i]).collect();
    let w = idx.par_iter().map(|&i| weights[i]).collect();
    (r, c, w)
}
