use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::config::GmmConfig;
use crate::error::{Class, Result, SegmentError};

type Vec3 = [f64; 3];
type Mat3 = [[f64; 3]; 3];

const LN_2PI: f64 = 1.837_877_066_409_345_3;
/// Components whose responsibility mass falls below this are switched off.
const MIN_COMPONENT_MASS: f64 = 1e-10;
const KMEANS_ITERATIONS: u64 = 10;

/// One weighted Gaussian in color space.
#[derive(Debug, Clone)]
pub struct Component {
    pub weight: f64,
    pub mean: Vec3,
    pub covariance: Mat3,
    inverse: Mat3,
    /// `-0.5 * (3 ln 2π + ln det Σ)`
    log_norm: f64,
}

impl Component {
    fn new(weight: f64, mean: Vec3, covariance: Mat3) -> Self {
        let (inverse, det) = invert(&covariance);
        Self {
            weight,
            mean,
            covariance,
            inverse,
            log_norm: -0.5 * (3.0 * LN_2PI + det.ln()),
        }
    }

    fn is_active(&self) -> bool {
        self.weight > 0.0
    }

    fn log_density(&self, x: ArrayView1<'_, f64>) -> f64 {
        let d = [x[0] - self.mean[0], x[1] - self.mean[1], x[2] - self.mean[2]];
        let mut mahalanobis = 0.0;
        for i in 0..3 {
            let row = &self.inverse[i];
            mahalanobis += d[i] * (row[0] * d[0] + row[1] * d[1] + row[2] * d[2]);
        }
        self.log_norm - 0.5 * mahalanobis
    }
}

/// Gaussian mixture density over 3-channel colors.
///
/// Component count is fixed at fit time and never reduced, even when there are
/// fewer samples than components; such components either share samples or end
/// up with zero weight.
#[derive(Debug, Clone)]
pub struct GaussianMixture {
    components: Vec<Component>,
}

impl GaussianMixture {
    /// Fit by expectation-maximization, seeded from k-means++.
    pub fn fit(samples: ArrayView2<'_, f64>, config: &GmmConfig, class: Class) -> Result<Self> {
        let _span = tracing::debug_span!("gmm_fit", %class, samples = samples.nrows()).entered();

        let n = samples.nrows();
        if n == 0 {
            return Err(SegmentError::InsufficientData { class });
        }
        let k = config.components.max(1);

        let assignment = initial_clusters(samples, k, config.seed);
        let mut resp = Array2::<f64>::zeros((n, k));
        for (i, &c) in assignment.iter().enumerate() {
            resp[[i, c]] = 1.0;
        }

        let mut model = Self {
            components: maximize(samples, &resp, config.covariance_floor),
        };

        let mut previous = f64::NEG_INFINITY;
        for iteration in 0..config.max_iterations {
            let mean_ll = model.expect(samples, &mut resp);
            model.components = maximize(samples, &resp, config.covariance_floor);

            if (mean_ll - previous).abs() < config.tolerance {
                tracing::debug!(iteration, mean_ll, "gmm converged");
                break;
            }
            previous = mean_ll;
        }

        Ok(model)
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// `ln p(x)` under the mixture.
    pub fn log_likelihood(&self, color: ArrayView1<'_, f64>) -> f64 {
        log_sum_exp(
            self.components
                .iter()
                .filter(|c| c.is_active())
                .map(|c| c.weight.ln() + c.log_density(color)),
        )
    }

    /// Negative log-likelihood of one color.
    pub fn score(&self, color: ArrayView1<'_, f64>) -> f64 {
        -self.log_likelihood(color)
    }

    /// Negative log-likelihood of every row of `samples`.
    pub fn score_samples(&self, samples: ArrayView2<'_, f64>) -> Array1<f64> {
        let _span = tracing::debug_span!("gmm_score", samples = samples.nrows()).entered();
        samples.outer_iter().map(|row| self.score(row)).collect()
    }

    /// E-step: fill `resp` with posterior responsibilities, return the mean
    /// log-likelihood of the samples.
    fn expect(&self, samples: ArrayView2<'_, f64>, resp: &mut Array2<f64>) -> f64 {
        let mut total = 0.0;
        let mut log_weighted = vec![0.0; self.components.len()];

        for (i, x) in samples.outer_iter().enumerate() {
            for (j, c) in self.components.iter().enumerate() {
                log_weighted[j] = if c.is_active() {
                    c.weight.ln() + c.log_density(x)
                } else {
                    f64::NEG_INFINITY
                };
            }
            let norm = log_sum_exp(log_weighted.iter().copied());
            total += norm;
            for (j, lw) in log_weighted.iter().enumerate() {
                resp[[i, j]] = (lw - norm).exp();
            }
        }

        total / samples.nrows() as f64
    }
}

/// M-step: weighted means and covariances from responsibilities.
fn maximize(samples: ArrayView2<'_, f64>, resp: &Array2<f64>, floor: f64) -> Vec<Component> {
    let n = samples.nrows() as f64;
    let k = resp.ncols();
    let mut components = Vec::with_capacity(k);

    for j in 0..k {
        let column = resp.column(j);
        let mass: f64 = column.sum();
        if mass < MIN_COMPONENT_MASS {
            components.push(Component::new(0.0, [0.0; 3], identity(floor)));
            continue;
        }

        let mut mean = [0.0; 3];
        for (x, &r) in samples.outer_iter().zip(column.iter()) {
            for c in 0..3 {
                mean[c] += r * x[c];
            }
        }
        for m in &mut mean {
            *m /= mass;
        }

        let mut covariance = identity(floor);
        for (x, &r) in samples.outer_iter().zip(column.iter()) {
            let d = [x[0] - mean[0], x[1] - mean[1], x[2] - mean[2]];
            for a in 0..3 {
                for b in 0..3 {
                    covariance[a][b] += r * d[a] * d[b] / mass;
                }
            }
        }

        components.push(Component::new(mass / n, mean, covariance));
    }

    let total: f64 = components.iter().map(|c| c.weight).sum();
    for c in &mut components {
        c.weight /= total;
    }
    components
}

/// Hard cluster index of every sample, used to start EM.
///
/// When the samples hold no more distinct colors than `k`, each distinct color
/// is its own cluster. Otherwise Lloyd's k-means with k-means++ seeding runs
/// on them.
fn initial_clusters(samples: ArrayView2<'_, f64>, k: usize, seed: u64) -> Vec<usize> {
    if k < 2 {
        return vec![0; samples.nrows()];
    }

    let mut distinct: Vec<Vec3> = Vec::with_capacity(k);
    let mut assignment = Vec::with_capacity(samples.nrows());
    for row in samples.outer_iter() {
        let color = [row[0], row[1], row[2]];
        match distinct.iter().position(|d| *d == color) {
            Some(cluster) => assignment.push(cluster),
            None if distinct.len() < k => {
                assignment.push(distinct.len());
                distinct.push(color);
            }
            None => return lloyd(samples, k, seed),
        }
    }
    assignment
}

/// k-means over at least `k + 1` distinct colors.
fn lloyd(samples: ArrayView2<'_, f64>, k: usize, seed: u64) -> Vec<usize> {
    // rkm works on its own ndarray release.
    let data =
        rkm_ndarray::Array2::from_shape_fn((samples.nrows(), 3), |(i, j)| samples[[i, j]]);

    let mut random_seed: rkm::RandomSeed = [0x5e; 16];
    random_seed[..8].copy_from_slice(&seed.to_le_bytes());
    let config = rkm::Config::from(Some(random_seed), Some(KMEANS_ITERATIONS), None);

    let (_, clusters) = rkm::kmeans_lloyd_with_config(&data.view(), k, &config);
    clusters
}

fn identity(scale: f64) -> Mat3 {
    [[scale, 0.0, 0.0], [0.0, scale, 0.0], [0.0, 0.0, scale]]
}

/// Inverse and determinant of a symmetric positive-definite 3×3 matrix.
fn invert(c: &Mat3) -> (Mat3, f64) {
    let cof00 = c[1][1] * c[2][2] - c[1][2] * c[2][1];
    let cof01 = c[1][2] * c[2][0] - c[1][0] * c[2][2];
    let cof02 = c[1][0] * c[2][1] - c[1][1] * c[2][0];
    let det = (c[0][0] * cof00 + c[0][1] * cof01 + c[0][2] * cof02).max(f64::MIN_POSITIVE);
    let inv_det = 1.0 / det;

    let inverse = [
        [
            cof00 * inv_det,
            (c[0][2] * c[2][1] - c[0][1] * c[2][2]) * inv_det,
            (c[0][1] * c[1][2] - c[0][2] * c[1][1]) * inv_det,
        ],
        [
            cof01 * inv_det,
            (c[0][0] * c[2][2] - c[0][2] * c[2][0]) * inv_det,
            (c[0][2] * c[1][0] - c[0][0] * c[1][2]) * inv_det,
        ],
        [
            cof02 * inv_det,
            (c[0][1] * c[2][0] - c[0][0] * c[2][1]) * inv_det,
            (c[0][0] * c[1][1] - c[0][1] * c[1][0]) * inv_det,
        ],
    ];
    (inverse, det)
}

fn log_sum_exp(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let max = values.clone().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return max;
    }
    max + values.map(|v| (v - max).exp()).sum::<f64>().ln()
}
