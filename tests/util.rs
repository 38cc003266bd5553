#![allow(dead_code)]
use std::collections::BTreeMap;

use parallel_gaec::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

pub fn ctx() -> &'static ExecContext {
    ExecContext::global()
}

/// Context with a fixed number of workers.
pub fn ctx_with_threads(n: usize) -> ExecContext {
    ExecContext::new(&ContextConfig {
        num_threads: Some(n),
        ..Default::default()
    })
    .expect("worker pool")
}

/// Build a graph from `(row, col, weight)` triples, extents inferred.
pub fn graph_from(triples: &[(u32, u32, f32)]) -> Graph {
    let rows = triples.iter().map(|t| t.0).collect();
    let cols = triples.iter().map(|t| t.1).collect();
    let weights = triples.iter().map(|t| t.2).collect();
    Graph::new(ctx(), 0, 0, rows, cols, weights)
}

/// Random simple graph on `n` vertices, one entry per edge with `row > col`,
/// integer weights in `-max_w..=max_w` excluding 0.
pub fn random_edges(n: u32, p: f64, max_w: i32, seed: u64) -> Vec<(u32, u32, f32)> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut out = Vec::new();
    for r in 1..n {
        for c in 0..r {
            if rng.r#gen::<f64>() < p {
                let mut w = 0;
                while w == 0 {
                    w = rng.gen_range(-max_w..=max_w);
                }
                out.push((r, c, w as f32));
            }
        }
    }
    out
}

/// Entries sorted by `(row, col, weight)`, for multiset comparison.
pub fn sorted_triples(g: &Graph) -> Vec<(u32, u32, f32)> {
    let mut t: Vec<_> = g.iter().collect();
    t.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)).then(a.2.total_cmp(&b.2)));
    t
}

/// Sum of weights per `(row, col)` key.
pub fn summed_by_key(
    triples: impl IntoIterator<Item = (u32, u32, f32)>,
) -> BTreeMap<(u32, u32), f64> {
    let mut m = BTreeMap::new();
    for (r, c, w) in triples {
        *m.entry((r, c)).or_insert(0.0) += w as f64;
    }
    m
}

/// Exact minimum multicut objective by enumerating all partitions.
///
/// Only for tiny graphs: visits Bell(n) labelings.
pub fn brute_force_optimum(n: usize, edges: &[(u32, u32, f32)]) -> f64 {
    fn rec(
        v: usize,
        n: usize,
        labels: &mut Vec<usize>,
        used: usize,
        edges: &[(u32, u32, f32)],
        best: &mut f64,
    ) {
        if v == n {
            let obj: f64 = edges
                .iter()
                .filter(|&&(r, c, _)| r != c && labels[r as usize] == labels[c as usize])
                .map(|&(_, _, w)| w as f64)
                .sum();
            if obj < *best {
                *best = obj;
            }
            return;
        }
        for l in 0..=used {
            labels[v] = l;
            rec(v + 1, n, labels, used.max(l + 1), edges, best);
        }
    }
    let mut best = f64::INFINITY;
    let mut labels = vec![0; n];
    if n == 0 {
        return 0.0;
    }
    labels[0] = 0;
    rec(1, n, &mut labels, 1, edges, &mut best);
    best
}
