mod util;
use std::collections::BTreeMap;

use parallel_gaec::prelude::*;
use proptest::prelude::*;
use util::*;

#[test]
fn two_attractive_groups_split_on_repulsive_bridge() {
    let edges = [
        (1, 0, -1.0),
        (2, 0, -1.0),
        (2, 1, -1.0),
        (4, 3, -2.0),
        (3, 2, 5.0),
    ];
    let (i, j, w): (Vec<u32>, Vec<u32>, Vec<f32>) =
        itertools::multiunzip(edges.iter().copied());
    let sol = greedy_additive_contraction(ctx(), &i, &j, &w, &GaecConfig::default()).unwrap();

    let l = &sol.node_labels;
    assert_eq!(l.len(), 5);
    assert!(l[0] == l[1] && l[1] == l[2]);
    assert_eq!(l[3], l[4]);
    assert_ne!(l[2], l[3]);
    assert_eq!(sol.clusters, 2);
    assert_eq!(sol.iterations, 2);
    assert_eq!(sol.objective, -5.0);
    assert_eq!(sol.lower_bound, Some(-5.0));
}

#[test]
fn duplicate_and_mirrored_input_edges_are_summed() {
    // (0,1) appears as -1 and its mirror as +3: net repulsive, so no merge.
    let sol = greedy_additive_contraction(
        ctx(),
        &[0, 1],
        &[1, 0],
        &[-1.0, 3.0],
        &GaecConfig::default(),
    )
    .unwrap();
    assert_eq!(sol.clusters, 2);
    assert_eq!(sol.objective, 0.0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_solution_is_a_local_optimum_above_the_bound(
        n in 2u32..30,
        p in 0.1f64..0.8,
        seed in any::<u64>(),
    ) {
        let edges = random_edges(n, p, 5, seed);
        prop_assume!(!edges.is_empty());
        let (i, j, w): (Vec<u32>, Vec<u32>, Vec<f32>) =
            itertools::multiunzip(edges.iter().copied());
        let cfg = GaecConfig {
            packing: PackingConfig {
                max_tries_quads: 2,
                seed,
                ..Default::default()
            },
            ..Default::default()
        };
        let sol = greedy_additive_contraction(ctx(), &i, &j, &w, &cfg).unwrap();

        // labels are dense
        let mut seen = vec![false; sol.clusters];
        for &l in &sol.node_labels {
            prop_assert!((l as usize) < sol.clusters);
            seen[l as usize] = true;
        }
        prop_assert!(seen.iter().all(|&s| s));

        // objective matches the labels
        let objective: f64 = edges
            .iter()
            .filter(|&&(r, c, _)| sol.node_labels[r as usize] == sol.node_labels[c as usize])
            .map(|&(_, _, w)| w as f64)
            .sum();
        prop_assert_eq!(objective, sol.objective);

        // no attractive pair of clusters is left
        let mut between: BTreeMap<(u32, u32), f64> = BTreeMap::new();
        for &(r, c, w) in &edges {
            let (a, b) = (sol.node_labels[r as usize], sol.node_labels[c as usize]);
            if a != b {
                *between.entry((a.max(b), a.min(b))).or_insert(0.0) += w as f64;
            }
        }
        prop_assert!(between.values().all(|&s| s >= 0.0));

        // one snapshot per step, each coarsening the previous one
        prop_assert_eq!(sol.timeline.len(), sol.iterations);
        prop_assert_eq!(sol.timeline.last().unwrap_or(&sol.node_labels), &sol.node_labels);
        for step in sol.timeline.windows(2) {
            for a in 0..step[0].len() {
                for b in 0..a {
                    if step[0][a] == step[0][b] {
                        prop_assert_eq!(step[1][a], step[1][b]);
                    }
                }
            }
        }

        let lb = sol.lower_bound.expect("bound requested");
        prop_assert!(lb <= sol.objective + 1e-9);
    }
}
