//! Seeded k-means (Lloyd iterations, k-means++ initialisation, multiple restarts)
//!
//! All randomness comes from one `ChaCha8Rng` seeded from the configured seed,
//! so a given input order, seed and parameter set always produces the same fit.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Parameters for one k-means fit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeansParams {
    /// Number of clusters; callers guarantee `1 <= k <= points.len()`
    pub k: usize,
    /// Independent restarts; the lowest-inertia result wins
    pub restarts: usize,
    /// Iteration cap per restart
    pub max_iterations: usize,
    /// Stop once the summed squared centroid movement falls to this value
    pub tolerance: f64,
    pub seed: u64,
}

/// Outcome of a k-means fit
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit {
    /// Cluster index per input point
    pub assignments: Vec<usize>,
    /// Final centroids in the input space
    pub centroids: Vec<Vec<f64>>,
    /// Sum of squared distances from each point to its centroid
    pub inertia: f64,
    /// Iterations used by the winning restart
    pub iterations: usize,
}

fn squared_dist(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Index of the closest centroid; ties go to the lowest index
fn nearest(point: &[f64], centroids: &[Vec<f64>]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let d = squared_dist(point, c);
        if d < best_dist {
            best = i;
            best_dist = d;
        }
    }
    best
}

/// k-means++ seeding: each new centroid is drawn with probability proportional
/// to its squared distance from the closest centroid chosen so far
fn init_centroids(points: &[Vec<f64>], k: usize, rng: &mut ChaCha8Rng) -> Vec<Vec<f64>> {
    let n = points.len();
    let mut chosen = Vec::with_capacity(k);
    chosen.push(rng.gen_range(0..n));

    while chosen.len() < k {
        let dists: Vec<f64> = points
            .iter()
            .map(|p| {
                chosen
                    .iter()
                    .map(|&c| squared_dist(p, &points[c]))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();
        let total: f64 = dists.iter().sum();

        let next = if total <= f64::EPSILON {
            // Every point coincides with a centroid; take the first unused index
            (0..n).find(|i| !chosen.contains(i)).unwrap_or(0)
        } else {
            let threshold = rng.gen::<f64>() * total;
            let mut cumulative = 0.0_f64;
            let mut pick = n - 1;
            for (i, d) in dists.iter().enumerate() {
                cumulative += d;
                if cumulative > threshold {
                    pick = i;
                    break;
                }
            }
            pick
        };
        chosen.push(next);
    }

    chosen.into_iter().map(|i| points[i].clone()).collect()
}

/// Recompute centroids as member means, re-seeding any emptied cluster with the
/// point farthest from its own centroid (taken from a cluster with spare members)
fn update_centroids(
    points: &[Vec<f64>],
    assignments: &mut [usize],
    previous: &[Vec<f64>],
) -> Vec<Vec<f64>> {
    let k = previous.len();
    let dims = previous.first().map_or(0, Vec::len);

    loop {
        let mut sums = vec![vec![0.0_f64; dims]; k];
        let mut counts = vec![0usize; k];
        for (point, &c) in points.iter().zip(assignments.iter()) {
            counts[c] += 1;
            for (s, v) in sums[c].iter_mut().zip(point) {
                *s += v;
            }
        }

        let empty = match counts.iter().position(|&c| c == 0) {
            Some(empty) => empty,
            None => {
                return sums
                    .into_iter()
                    .zip(counts)
                    .map(|(sum, count)| sum.into_iter().map(|s| s / count as f64).collect())
                    .collect();
            }
        };

        let donor = points
            .iter()
            .enumerate()
            .filter(|(i, _)| counts[assignments[*i]] > 1)
            .map(|(i, p)| (i, squared_dist(p, &previous[assignments[i]])))
            .fold(None, |best: Option<(usize, f64)>, (i, d)| match best {
                Some((_, bd)) if bd >= d => best,
                _ => Some((i, d)),
            });

        match donor {
            Some((i, _)) => assignments[i] = empty,
            // Fewer points than clusters; callers rule this out
            None => return previous.to_vec(),
        }
    }
}

/// One Lloyd run from a fresh k-means++ seeding
fn single_run(points: &[Vec<f64>], params: &KMeansParams, rng: &mut ChaCha8Rng) -> KMeansFit {
    let mut centroids = init_centroids(points, params.k, rng);
    let mut assignments: Vec<usize> = points.iter().map(|p| nearest(p, &centroids)).collect();
    let mut iterations = 0;

    for _ in 0..params.max_iterations {
        iterations += 1;
        let updated = update_centroids(points, &mut assignments, &centroids);
        let shift: f64 = centroids
            .iter()
            .zip(&updated)
            .map(|(old, new)| squared_dist(old, new))
            .sum();
        centroids = updated;

        let mut changed = false;
        for (point, assignment) in points.iter().zip(assignments.iter_mut()) {
            let next = nearest(point, &centroids);
            if *assignment != next {
                *assignment = next;
                changed = true;
            }
        }

        if !changed || shift <= params.tolerance {
            break;
        }
    }

    let inertia = points
        .iter()
        .zip(&assignments)
        .map(|(p, &c)| squared_dist(p, &centroids[c]))
        .sum();

    KMeansFit {
        assignments,
        centroids,
        inertia,
        iterations,
    }
}

/// Fit k-means with `restarts` seeded runs and keep the lowest inertia
///
/// `points` must be non-empty with `1 <= k <= points.len()`; the cluster engine
/// checks this before calling.
pub fn fit(points: &[Vec<f64>], params: &KMeansParams) -> KMeansFit {
    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
    let mut best: Option<KMeansFit> = None;

    for _ in 0..params.restarts.max(1) {
        let run = single_run(points, params, &mut rng);
        let better = best.as_ref().map_or(true, |b| run.inertia < b.inertia);
        if better {
            best = Some(run);
        }
    }

    best.unwrap_or_else(|| single_run(points, params, &mut rng))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(k: usize, seed: u64) -> KMeansParams {
        KMeansParams {
            k,
            restarts: 10,
            max_iterations: 300,
            tolerance: 1e-4,
            seed,
        }
    }

    #[test]
    fn test_single_point_single_cluster() {
        let fit = fit(&[vec![1.0, 1.0]], &params(1, 7));
        assert_eq!(fit.assignments, vec![0]);
        assert_eq!(fit.inertia, 0.0);
    }

    #[test]
    fn test_two_separated_groups() {
        let mut points = Vec::new();
        for i in 0..10 {
            points.push(vec![0.0 + i as f64 * 0.01, 0.0]);
        }
        for i in 0..10 {
            points.push(vec![10.0 + i as f64 * 0.01, 10.0]);
        }

        let fit = fit(&points, &params(2, 42));
        let a = fit.assignments[0];
        let b = fit.assignments[10];
        assert!(fit.assignments[..10].iter().all(|&c| c == a));
        assert!(fit.assignments[10..].iter().all(|&c| c == b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_same_seed_same_fit() {
        let points: Vec<Vec<f64>> = (0..12)
            .map(|i| vec![(i * 7 % 5) as f64, (i * 3 % 4) as f64])
            .collect();
        assert_eq!(fit(&points, &params(3, 99)), fit(&points, &params(3, 99)));
    }

    #[test]
    fn test_coincident_points_fit_with_zero_inertia() {
        let points = vec![vec![1.0], vec![1.0], vec![1.0]];
        let fit = fit(&points, &params(3, 1));
        assert_eq!(fit.assignments.len(), 3);
        assert!(fit.assignments.iter().all(|&c| c < 3));
        assert_eq!(fit.inertia, 0.0);
    }

    #[test]
    fn test_k_equal_to_points_gives_zero_inertia() {
        let points = vec![vec![0.0], vec![5.0], vec![9.0]];
        let fit = fit(&points, &params(3, 3));
        assert!(fit.inertia < 1e-12);
        let mut ids = fit.assignments.clone();
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1, 2]);
    }
}
