/*
 * MIT License
 *
 * Copyright (c) 2022 Joseph Sacchini
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */
use super::{prelude::*, puzzle::Word, solver::GroupingErr};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

///
/// Which words landed in which cluster. Cluster ids run 0..k, and every input word appears in
/// exactly one cluster, in input order within that cluster.
///
pub type PartitionResult = BTreeMap<usize, Vec<Word>>;

///
/// Splits words into clusters of exactly group_size members each, based on their vectors.
///
/// Plain k-means has no notion of cluster size, so this runs in two phases:
///
/// * k-means (seeded, so results are reproducible) on the standardized vectors finds k centroids
/// * each centroid is copied group_size times, giving k * group_size "seats", and every word is
///   given its own seat such that the total word-to-seat distance is minimal. A word's cluster is
///   whichever centroid its seat was copied from.
///
/// The word count must be a multiple of group_size.
///
pub fn partition(
    vectors: &[Vec<ConnFloat>],
    words: &[Word],
    group_size: usize,
) -> Result<PartitionResult, GroupingErr> {
    if vectors.len() != words.len() {
        return Err(GroupingErr::Misaligned {
            words: words.len(),
            vectors: vectors.len(),
        });
    }

    let mut out = PartitionResult::new();
    for (word, cluster) in words.iter().zip(partition_indices(vectors, group_size)?) {
        out.entry(cluster).or_default().push(word.clone());
    }

    Ok(out)
}

/// Same as partition, but returns the cluster id of every input vector (aligned by index)
pub fn partition_indices(
    vectors: &[Vec<ConnFloat>],
    group_size: usize,
) -> Result<Vec<usize>, GroupingErr> {
    let n = vectors.len();
    if group_size == 0 || n < group_size {
        return Err(GroupingErr::Clustering(format!(
            "cannot make groups of {} out of {} vectors",
            group_size, n
        )));
    }

    if n % group_size != 0 {
        return Err(GroupingErr::UnevenPartition { words: n, group_size });
    }

    // each vector is standardized against its own components, not against the batch
    let standardized = vectors
        .iter()
        .map(|v| standardize(v))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| {
            GroupingErr::Clustering("cannot standardize a constant vector".to_string())
        })?;

    let k = n / group_size;
    let centroids = kmeans(&standardized, k, KMEANS_SEED)?;

    let seats: Vec<&Vec<ConnFloat>> = centroids
        .iter()
        .flat_map(|c| std::iter::repeat(c).take(group_size))
        .collect();

    let cost: Vec<Vec<ConnFloat>> = standardized
        .iter()
        .map(|v| seats.iter().map(|s| euclidean_distance(v, s)).collect())
        .collect();

    let out: Vec<usize> = min_cost_assignment(&cost)?
        .into_iter()
        .map(|seat| seat / group_size)
        .collect();

    log::debug!("balanced partition of {} vectors into {} clusters: {:?}", n, k, out);
    Ok(out)
}

///
/// Lloyd's k-means with k-means++ seeding, returning the k centroids.
///
/// Seeding picks the first centroid uniformly, then each next one with probability proportional to
/// its squared distance from the nearest centroid picked so far. Lloyd iterations then run until
/// no point changes cluster. A cluster that loses all its points keeps its previous centroid.
///
/// Fails if the assignments are still changing after KMEANS_MAX_ITERATIONS rounds.
///
pub fn kmeans(
    points: &[Vec<ConnFloat>],
    k: usize,
    seed: u64,
) -> Result<Vec<Vec<ConnFloat>>, GroupingErr> {
    if k == 0 || points.len() < k {
        return Err(GroupingErr::Clustering(format!(
            "cannot find {} clusters among {} points",
            k,
            points.len()
        )));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut centroids = kmeans_plus_plus_init(points, k, &mut rng);
    let mut assignments: Vec<Option<usize>> = vec![None; points.len()];

    for iteration in 0..KMEANS_MAX_ITERATIONS {
        let mut changed = false;
        for (point, assigned) in points.iter().zip(assignments.iter_mut()) {
            let nearest = nearest_centroid(point, &centroids);
            if *assigned != Some(nearest) {
                *assigned = Some(nearest);
                changed = true;
            }
        }

        if !changed {
            log::debug!("k-means converged after {} iterations", iteration);
            return Ok(centroids);
        }

        recompute_centroids(points, &assignments, &mut centroids);
    }

    Err(GroupingErr::Clustering(format!(
        "k-means did not converge in {} iterations",
        KMEANS_MAX_ITERATIONS
    )))
}

fn kmeans_plus_plus_init(
    points: &[Vec<ConnFloat>],
    k: usize,
    rng: &mut ChaCha8Rng,
) -> Vec<Vec<ConnFloat>> {
    let n = points.len();
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..n)].clone());

    // squared distance from each point to its nearest centroid so far
    let mut min_distances = vec![ConnFloat::MAX; n];

    while centroids.len() < k {
        if let Some(last) = centroids.last() {
            for (point, dist) in points.iter().zip(min_distances.iter_mut()) {
                let d = euclidean_distance(point, last).powi(2);
                if d < *dist {
                    *dist = d;
                }
            }
        }

        let total: ConnFloat = min_distances.iter().sum();
        let picked = if total > 0.0 {
            // walk the cumulative distribution until we pass the sampled target
            let target = rng.gen::<ConnFloat>() * total;
            let mut acc = 0.0;
            let mut picked = n - 1;
            for (idx, d) in min_distances.iter().enumerate() {
                acc += d;
                if acc > target {
                    picked = idx;
                    break;
                }
            }
            picked
        } else {
            // every point sits on a centroid already
            rng.gen_range(0..n)
        };

        centroids.push(points[picked].clone());
    }

    centroids
}

// index of the closest centroid (lowest index wins ties)
fn nearest_centroid(point: &[ConnFloat], centroids: &[Vec<ConnFloat>]) -> usize {
    let mut best = 0;
    let mut best_dist = ConnFloat::INFINITY;
    for (idx, c) in centroids.iter().enumerate() {
        let d = euclidean_distance(point, c);
        if d < best_dist {
            best = idx;
            best_dist = d;
        }
    }
    best
}

fn recompute_centroids(
    points: &[Vec<ConnFloat>],
    assignments: &[Option<usize>],
    centroids: &mut [Vec<ConnFloat>],
) {
    let dim = points.first().map(|p| p.len()).unwrap_or(0);
    let mut sums = vec![vec![0.0; dim]; centroids.len()];
    let mut counts = vec![0usize; centroids.len()];

    for (point, assigned) in points.iter().zip(assignments) {
        if let Some(cluster) = assigned {
            counts[*cluster] += 1;
            for (s, x) in sums[*cluster].iter_mut().zip(point) {
                *s += x;
            }
        }
    }

    for ((centroid, sum), count) in centroids.iter_mut().zip(sums).zip(counts) {
        if count > 0 {
            *centroid = sum.into_iter().map(|s| s / count as ConnFloat).collect();
        }
    }
}

///
/// Solves the rectangular assignment problem: given cost[row][col] with no more rows than columns,
/// gives every row its own column such that the summed cost is minimal. Returns the column chosen
/// for each row.
///
/// This is the O(rows^2 * cols) shortest augmenting path form of the Hungarian algorithm with
/// row/column potentials. Indices below are shifted by one so that row/column 0 can act as the
/// virtual starting point of each augmenting path.
///
pub fn min_cost_assignment(cost: &[Vec<ConnFloat>]) -> Result<Vec<usize>, GroupingErr> {
    let n = cost.len();
    let m = cost.first().map(|r| r.len()).unwrap_or(0);
    if n > m || cost.iter().any(|r| r.len() != m) {
        return Err(GroupingErr::Clustering(format!(
            "cannot assign {} rows to {} columns",
            n, m
        )));
    }

    let mut u = vec![0.0; n + 1];
    let mut v = vec![0.0; m + 1];
    // p[col] = row currently holding col (0 = free)
    let mut p = vec![0usize; m + 1];
    let mut way = vec![0usize; m + 1];

    for row in 1..=n {
        p[0] = row;
        let mut j0 = 0;
        let mut minv = vec![ConnFloat::INFINITY; m + 1];
        let mut used = vec![false; m + 1];

        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = ConnFloat::INFINITY;
            let mut j1 = 0;

            for j in 1..=m {
                if used[j] {
                    continue;
                }

                let cur = cost[i0 - 1][j - 1] - u[i0] - v[j];
                if cur < minv[j] {
                    minv[j] = cur;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }

            if j1 == 0 {
                return Err(GroupingErr::Clustering("assignment costs are not finite".to_string()));
            }

            for j in 0..=m {
                if used[j] {
                    u[p[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }

            j0 = j1;
            if p[j0] == 0 {
                break;
            }
        }

        // flip the augmenting path back to its start
        loop {
            let j1 = way[j0];
            p[j0] = p[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut out = vec![0; n];
    for col in 1..=m {
        if p[col] != 0 {
            out[p[col] - 1] = col - 1;
        }
    }

    Ok(out)
}
