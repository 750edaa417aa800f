//! Exact-size subset search.
//!
//! Every subset of the requested size is scored and the best one wins; equal
//! scores keep the lexicographically first index set. Pixel pools whose number
//! of combinations exceeds the configured limit are solved on the sorted
//! values instead, which returns an optimal score but may break ties
//! differently. Device sets over the limit are grown greedily.

use super::options::Method;

/// Winning index set, ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct SubsetChoice {
    pub indices: Vec<usize>,
    pub score: f64,
    /// `false` when the combination count exceeded the limit
    pub exhaustive: bool,
}

/// Number of `k`-combinations of `n` items; `None` on overflow.
pub fn binomial(n: usize, k: usize) -> Option<u64> {
    if k > n {
        return Some(0);
    }
    let k = k.min(n - k) as u64;
    let n = n as u64;
    let mut acc: u64 = 1;
    for i in 0..k {
        // acc * (n - i) / (i + 1) stays integral at every step
        acc = acc.checked_mul(n - i)? / (i + 1);
    }
    Some(acc)
}

/// Advance `combo` to the next combination of `n` in lexicographic order.
pub(crate) fn next_combination(combo: &mut [usize], n: usize) -> bool {
    let k = combo.len();
    let Some(pos) = (0..k).rev().find(|&i| combo[i] < n - k + i) else {
        return false;
    };
    combo[pos] += 1;
    for i in pos + 1..k {
        combo[i] = combo[i - 1] + 1;
    }
    true
}

fn score_of(values: &[f64], indices: &[usize], method: Method) -> Option<f64> {
    let picked: Vec<f64> = indices.iter().map(|&i| values[i]).collect();
    method.score(&picked)
}

/// Score every `size`-combination of `n` items with `score_fn` and keep the best.
fn exhaustive<F>(n: usize, size: usize, method: Method, score_fn: F) -> Option<SubsetChoice>
where
    F: Fn(&[usize]) -> Option<f64>,
{
    let mut combo: Vec<usize> = (0..size).collect();
    let mut best: Option<(Vec<usize>, f64)> = None;

    loop {
        if let Some(score) = score_fn(&combo) {
            let better = match &best {
                None => true,
                Some((_, incumbent)) => method.is_better(score, *incumbent),
            };
            if better {
                best = Some((combo.clone(), score));
            }
        }
        if !next_combination(&mut combo, n) {
            break;
        }
    }

    best.map(|(indices, score)| SubsetChoice {
        indices,
        score,
        exhaustive: true,
    })
}

/// The `size` largest values, or the narrowest run of `size` consecutive
/// sorted values.
fn sorted_fallback(values: &[f64], size: usize, method: Method) -> Option<SubsetChoice> {
    let mut order: Vec<usize> = (0..values.len()).collect();

    let mut indices = match method {
        Method::MaximizeMeanPce => {
            order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));
            order.truncate(size);
            order
        }
        Method::MinimizeSd => {
            order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
            let mut best: Option<(usize, f64)> = None;
            for start in 0..=order.len() - size {
                let Some(score) = score_of(values, &order[start..start + size], method) else {
                    continue;
                };
                if best.map_or(true, |(_, incumbent)| method.is_better(score, incumbent)) {
                    best = Some((start, score));
                }
            }
            let (start, _) = best?;
            order[start..start + size].to_vec()
        }
    };

    indices.sort_unstable();
    let score = score_of(values, &indices, method)?;
    Some(SubsetChoice {
        indices,
        score,
        exhaustive: false,
    })
}

/// Choose exactly `size` of `values` optimizing `method`.
///
/// Returns `None` when fewer than `size` values are available or `size` is zero.
pub fn best_subset(
    values: &[f64],
    size: usize,
    method: Method,
    combination_limit: u64,
) -> Option<SubsetChoice> {
    if size == 0 || size > values.len() {
        return None;
    }

    match binomial(values.len(), size) {
        Some(count) if count <= combination_limit => {
            exhaustive(values.len(), size, method, |c| score_of(values, c, method))
        }
        _ => sorted_fallback(values, size, method),
    }
}

fn pooled_score(pools: &[Vec<f64>], indices: &[usize], method: Method) -> Option<f64> {
    let pooled: Vec<f64> = indices
        .iter()
        .flat_map(|&i| pools[i].iter().copied())
        .collect();
    method.score(&pooled)
}

/// Add one pool at a time, each time the one that scores best together with
/// those already taken. Indices come back in pick order.
fn greedy_pools(pools: &[Vec<f64>], size: usize, method: Method) -> Option<SubsetChoice> {
    let mut chosen: Vec<usize> = Vec::with_capacity(size);
    let mut pooled: Vec<f64> = Vec::new();

    for _ in 0..size {
        let mut best: Option<(usize, f64)> = None;
        for i in (0..pools.len()).filter(|i| !chosen.contains(i)) {
            let mut trial = pooled.clone();
            trial.extend_from_slice(&pools[i]);
            let Some(score) = method.score(&trial) else {
                continue;
            };
            if best.map_or(true, |(_, incumbent)| method.is_better(score, incumbent)) {
                best = Some((i, score));
            }
        }
        let (pick, _) = best?;
        chosen.push(pick);
        pooled.extend_from_slice(&pools[pick]);
    }

    let score = method.score(&pooled)?;
    Some(SubsetChoice {
        indices: chosen,
        score,
        exhaustive: false,
    })
}

/// Choose `size` of the `pools` whose pooled values optimize `method`.
///
/// When `size` covers every pool all of them are taken. Otherwise every
/// combination is scored on its pooled values, or, past `combination_limit`,
/// the set is grown greedily. Returns `None` for an empty request.
pub fn best_device_subset(
    pools: &[Vec<f64>],
    size: usize,
    method: Method,
    combination_limit: u64,
) -> Option<SubsetChoice> {
    if size == 0 || pools.is_empty() {
        return None;
    }
    if size >= pools.len() {
        let indices: Vec<usize> = (0..pools.len()).collect();
        let score = pooled_score(pools, &indices, method)?;
        return Some(SubsetChoice {
            indices,
            score,
            exhaustive: true,
        });
    }

    match binomial(pools.len(), size) {
        Some(count) if count <= combination_limit => {
            exhaustive(pools.len(), size, method, |c| pooled_score(pools, c, method))
        }
        _ => greedy_pools(pools, size, method),
    }
}
