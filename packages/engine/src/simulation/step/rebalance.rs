use std::ops::Range;
use std::sync::atomic::{fence, Ordering};

use super::{GrainSynthesizer, Phase};

/// Splits `0..row_cost.len()` into `threads` contiguous, non-empty bands of
/// roughly `total / threads` cost each.
///
/// Greedy prefix walk: band t takes rows until the running sum reaches
/// `total * (t + 1) / threads`. A band never takes rows the remaining bands
/// need to get one each, and the last band takes everything left.
pub fn rebalance_rows(row_cost: &[i64], total: i64, threads: usize) -> Vec<Range<usize>> {
    let h = row_cost.len();
    assert!(threads > 0 && threads <= h, "{} bands for {} rows", threads, h);

    let mut bands = Vec::with_capacity(threads);
    let mut load_sum = 0i64;
    let mut y = 0usize;
    let total = total as i128;

    for t in 0..threads {
        let start = y;
        if t + 1 == threads {
            y = h;
        } else {
            let target = (total * (t as i128 + 1) / threads as i128) as i64;
            let limit = h - (threads - 1 - t);
            loop {
                load_sum += row_cost[y];
                y += 1;
                if load_sum >= target || y >= limit {
                    break;
                }
            }
        }
        bands.push(start..y);
    }

    debug_assert_eq!(bands.last().map(|b| b.end), Some(h));
    bands
}

pub(super) fn prepare_rebalance(synth: &mut GrainSynthesizer) {
    assert_eq!(synth.phase, Phase::Pass1, "rebalance outside of pass 1");
    assert!(!synth.draft, "draft frames have no pass 2");
    let threads = synth.thread_count();
    assert!(synth.pass1_complete(), "pass 1 incomplete");
    // Pass 1 rows may have been written by other threads.
    fence(Ordering::SeqCst);

    let result = synth.density.result();
    let bands = rebalance_rows(result.row_costs(), result.total(), threads);

    synth.band_loads.clear();
    for (ctx, rows) in synth.contexts.iter_mut().zip(bands) {
        let load: i64 = result.row_costs()[rows.clone()].iter().sum();
        tracing::trace!(rows = ?rows, load, "band");
        synth.band_loads.push(load);
        ctx.rows = rows;
    }
    synth.phase = Phase::Pass2;

    tracing::debug!(threads, total = result.total(), "rows rebalanced");
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn loads(costs: &[i64], bands: &[Range<usize>]) -> Vec<i64> {
        bands.iter().map(|b| costs[b.clone()].iter().sum()).collect()
    }

    #[test]
    fn uniform_costs_split_evenly() {
        let costs = vec![10i64; 12];
        let bands = rebalance_rows(&costs, 120, 3);
        assert_eq!(bands, vec![0..4, 4..8, 8..12]);
    }

    #[test]
    fn expensive_rows_get_their_own_band() {
        let costs = [1i64, 1, 1, 1, 100, 1, 1, 1];
        let bands = rebalance_rows(&costs, 107, 2);
        assert_eq!(bands, vec![0..5, 5..8]);
    }

    #[test]
    fn heavy_tail_still_leaves_a_row_per_band() {
        // the first band's target is only reached on the last row
        let costs = [1i64, 1, 100];
        let bands = rebalance_rows(&costs, 102, 3);
        assert_eq!(bands, vec![0..1, 1..2, 2..3]);
    }

    #[test]
    fn single_band_takes_everything() {
        assert_eq!(rebalance_rows(&[5, 6, 7], 18, 1), vec![0..3]);
    }

    proptest! {
        #[test]
        fn bands_cover_all_rows_and_respect_the_load_bound(
            costs in prop::collection::vec(1i64..5000, 1..80),
            threads in 1usize..12,
        ) {
            let threads = threads.min(costs.len());
            let total: i64 = costs.iter().sum();
            let bands = rebalance_rows(&costs, total, threads);

            prop_assert_eq!(bands.len(), threads);
            prop_assert_eq!(bands[0].start, 0);
            prop_assert_eq!(bands[threads - 1].end, costs.len());
            for pair in bands.windows(2) {
                prop_assert_eq!(pair[0].end, pair[1].start);
            }
            for b in &bands {
                prop_assert!(!b.is_empty());
            }

            let max_row = *costs.iter().max().unwrap();
            let bound = total / threads as i64 + max_row + 1;
            for load in loads(&costs, &bands) {
                prop_assert!(load <= bound, "load {} > bound {}", load, bound);
            }
        }
    }
}
