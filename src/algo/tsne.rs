use rayon::prelude::*;
use thiserror::Error;
use tracing::warn;

use crate::algo::rng::LcgRng;

/// Parameters for the 2D stochastic neighbor embedding.
#[derive(Debug, Clone)]
pub struct TsneConfig {
    /// Effective neighborhood size. Must stay below the sample count;
    /// the pipeline clamps it before calling in here.
    pub perplexity: f64,
    /// Gradient descent iterations.
    pub max_iter: usize,
    pub learning_rate: f64,
    pub seed: u64,
}

impl Default for TsneConfig {
    fn default() -> Self {
        Self {
            perplexity: 30.0,
            max_iter: 300,
            learning_rate: 200.0,
            seed: 42,
        }
    }
}

/// How the 2D coordinates were produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMode {
    /// Neighbor-preserving embedding succeeded.
    Embedded,
    /// Embedding failed; deterministic `(i, 0)` placement was used.
    Fallback,
}

/// One 2D coordinate per input row, in input order.
#[derive(Debug, Clone)]
pub struct Layout {
    pub coords: Vec<(f64, f64)>,
    pub mode: LayoutMode,
}

/// Internal embedding failure. Never escapes [`project`].
#[derive(Debug, Error)]
#[error("{0}")]
pub struct EmbedError(String);

/// Map each high-dimensional row to a 2D point, preserving local
/// neighborhood structure (exact t-SNE: Gaussian input affinities with
/// per-point precision calibrated to `perplexity`, Student-t output
/// affinities, momentum gradient descent with early exaggeration).
pub fn embed(data: &[Vec<f64>], config: &TsneConfig) -> Result<Vec<(f64, f64)>, EmbedError> {
    let n = data.len();
    if n < 3 {
        return Err(EmbedError(format!("need at least 3 samples, got {n}")));
    }
    if config.perplexity >= n as f64 {
        return Err(EmbedError(format!(
            "perplexity {} must be below the sample count {n}",
            config.perplexity
        )));
    }

    let distances = squared_distances(data);
    let p = joint_probabilities(&distances, config.perplexity)?;

    let mut rng = LcgRng::new(config.seed);
    let mut y: Vec<(f64, f64)> = (0..n)
        .map(|_| (rng.next_gaussian() * 1e-4, rng.next_gaussian() * 1e-4))
        .collect();
    let mut velocity = vec![(0.0f64, 0.0f64); n];

    let exaggeration_until = config.max_iter / 3;

    for iter in 0..config.max_iter {
        let exaggeration = if iter < exaggeration_until { 4.0 } else { 1.0 };
        let momentum = if iter < exaggeration_until { 0.5 } else { 0.8 };

        // Student-t output affinities (unnormalized) and their total
        let mut num = vec![vec![0.0f64; n]; n];
        let mut num_sum = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                let dx = y[i].0 - y[j].0;
                let dy = y[i].1 - y[j].1;
                let q = 1.0 / (1.0 + dx * dx + dy * dy);
                num[i][j] = q;
                num[j][i] = q;
                num_sum += 2.0 * q;
            }
        }
        let num_sum = num_sum.max(1e-12);

        for i in 0..n {
            let mut grad = (0.0f64, 0.0f64);
            for j in 0..n {
                if i == j {
                    continue;
                }
                let q = (num[i][j] / num_sum).max(1e-12);
                let mult = (exaggeration * p[i][j] - q) * num[i][j];
                grad.0 += mult * (y[i].0 - y[j].0);
                grad.1 += mult * (y[i].1 - y[j].1);
            }
            velocity[i].0 = momentum * velocity[i].0 - 4.0 * config.learning_rate * grad.0;
            velocity[i].1 = momentum * velocity[i].1 - 4.0 * config.learning_rate * grad.1;
        }
        for i in 0..n {
            y[i].0 += velocity[i].0;
            y[i].1 += velocity[i].1;
        }

        // Keep the embedding centered
        let (mx, my) = y
            .iter()
            .fold((0.0, 0.0), |acc, p| (acc.0 + p.0, acc.1 + p.1));
        let (mx, my) = (mx / n as f64, my / n as f64);
        for point in &mut y {
            point.0 -= mx;
            point.1 -= my;
        }
    }

    if y.iter().any(|&(x, yv)| !x.is_finite() || !yv.is_finite()) {
        return Err(EmbedError("embedding diverged to non-finite coordinates".into()));
    }
    Ok(y)
}

/// Embed with recovery: on any internal failure, degrade to the
/// deterministic `(i, 0)` layout instead of propagating the error. Every
/// input row always receives a coordinate.
pub fn project(data: &[Vec<f64>], config: &TsneConfig) -> Layout {
    match embed(data, config) {
        Ok(coords) => Layout {
            coords,
            mode: LayoutMode::Embedded,
        },
        Err(err) => {
            warn!(%err, "embedding failed, using fallback layout");
            Layout {
                coords: fallback_layout(data.len()),
                mode: LayoutMode::Fallback,
            }
        }
    }
}

/// Degraded placement: point `i` at `(i, 0)`.
pub fn fallback_layout(n: usize) -> Vec<(f64, f64)> {
    (0..n).map(|i| (i as f64, 0.0)).collect()
}

fn squared_distances(data: &[Vec<f64>]) -> Vec<Vec<f64>> {
    data.par_iter()
        .map(|a| {
            data.iter()
                .map(|b| {
                    a.iter()
                        .zip(b)
                        .map(|(x, y)| (x - y) * (x - y))
                        .sum::<f64>()
                })
                .collect()
        })
        .collect()
}

/// Symmetrized joint probabilities with per-row precision chosen by binary
/// search so each row's entropy matches `ln(perplexity)`.
fn joint_probabilities(distances: &[Vec<f64>], perplexity: f64) -> Result<Vec<Vec<f64>>, EmbedError> {
    let n = distances.len();
    let target_entropy = perplexity.ln();

    let conditional: Vec<Vec<f64>> = distances
        .par_iter()
        .enumerate()
        .map(|(i, row)| calibrate_row(row, i, target_entropy))
        .collect::<Result<_, _>>()?;

    let mut joint = vec![vec![0.0f64; n]; n];
    for i in 0..n {
        for j in 0..n {
            if i != j {
                joint[i][j] = ((conditional[i][j] + conditional[j][i]) / (2.0 * n as f64))
                    .max(1e-12);
            }
        }
    }
    Ok(joint)
}

fn calibrate_row(row: &[f64], i: usize, target_entropy: f64) -> Result<Vec<f64>, EmbedError> {
    let n = row.len();
    let mut beta = 1.0f64;
    let mut beta_min = f64::NEG_INFINITY;
    let mut beta_max = f64::INFINITY;
    let mut probs = vec![0.0f64; n];

    for _ in 0..50 {
        let mut sum = 0.0;
        for j in 0..n {
            probs[j] = if j == i { 0.0 } else { (-row[j] * beta).exp() };
            sum += probs[j];
        }
        if sum <= 0.0 || !sum.is_finite() {
            return Err(EmbedError(format!(
                "affinity calibration underflow for sample {i}"
            )));
        }

        let weighted: f64 = (0..n).map(|j| row[j] * probs[j]).sum();
        let entropy = sum.ln() + beta * weighted / sum;
        let diff = entropy - target_entropy;
        if diff.abs() < 1e-5 {
            break;
        }
        if diff > 0.0 {
            beta_min = beta;
            beta = if beta_max.is_infinite() { beta * 2.0 } else { (beta + beta_max) / 2.0 };
        } else {
            beta_max = beta;
            beta = if beta_min.is_infinite() { beta / 2.0 } else { (beta + beta_min) / 2.0 };
        }

        for j in 0..n {
            probs[j] = if j == i { 0.0 } else { (-row[j] * beta).exp() };
        }
    }

    let sum: f64 = probs.iter().sum();
    if sum <= 0.0 || !sum.is_finite() {
        return Err(EmbedError(format!(
            "affinity calibration underflow for sample {i}"
        )));
    }
    probs.iter_mut().for_each(|p| *p /= sum);
    Ok(probs)
}
