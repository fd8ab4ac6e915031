use crate::config::SegmentationConfig;
use crate::error::{Result, SegmentError};
use crate::grid::{for_each_neighbor_pair, ColorGrid, Mask};
use crate::model::{AppearanceModel, DataCosts};
use crate::solver;

use super::FlowNetwork;

/// `β = 1 / (2 · mean ‖c_p − c_q‖²)` over all horizontal and vertical pairs.
///
/// A flat image has no contrast to normalize; it gets `β = 1`, which leaves
/// every pairwise weight at its maximum either way.
pub fn contrast_beta(colors: &ColorGrid) -> f64 {
    let mut total = 0.0;
    let mut pairs = 0usize;
    for_each_neighbor_pair(colors.width(), colors.height(), |a, b| {
        total += colors.squared_distance(a, b);
        pairs += 1;
    });

    if pairs == 0 || total <= 0.0 {
        return 1.0;
    }
    1.0 / (2.0 * total / pairs as f64)
}

fn is_horizontal(width: usize, a: usize, b: usize) -> bool {
    b == a + 1 && a % width + 1 < width
}

/// Data and smoothness terms of the binary labeling energy
///
/// `E(x) = Σ_p D_p(x_p) + Σ_{p~q} w_pq · [x_p ≠ x_q]`
///
/// for one image. The min cut of [`EnergyTerms::build_network`] minimizes it.
#[derive(Debug, Clone)]
pub struct EnergyTerms {
    width: u32,
    height: u32,
    /// Cost of labeling each pixel foreground; the `p → sink` capacity.
    foreground: Vec<f64>,
    /// Cost of labeling each pixel background; the `source → p` capacity.
    background: Vec<f64>,
    /// Weight between `p` and its right neighbor (0 in the last column).
    right: Vec<f64>,
    /// Weight between `p` and the pixel below (0 in the last row).
    down: Vec<f64>,
    beta: f64,
}

impl EnergyTerms {
    /// Score the image under `model` and derive contrast weights.
    pub fn new(
        colors: &ColorGrid,
        model: &AppearanceModel,
        config: &SegmentationConfig,
    ) -> Self {
        Self::from_costs(colors, &model.data_costs(colors), config)
    }

    pub fn from_costs(colors: &ColorGrid, costs: &DataCosts, config: &SegmentationConfig) -> Self {
        let _span = tracing::debug_span!("energy_terms").entered();

        let (width, height) = colors.dimensions();
        let w = width as usize;
        let n = colors.len();
        let beta = contrast_beta(colors);
        let scale = config.data_term_scale;

        let mut right = vec![0.0; n];
        let mut down = vec![0.0; n];
        for_each_neighbor_pair(width, height, |a, b| {
            let weight =
                config.smoothness_term_scale * (-beta * colors.squared_distance(a, b)).exp();
            if is_horizontal(w, a, b) {
                right[a] = weight;
            } else {
                down[a] = weight;
            }
        });

        Self {
            width,
            height,
            foreground: costs.foreground.iter().map(|c| c * scale).collect(),
            background: costs.background.iter().map(|c| c * scale).collect(),
            right,
            down,
            beta,
        }
    }

    /// Raw terms, mostly for tests and synthetic energies.
    pub fn from_parts(
        width: u32,
        height: u32,
        foreground: Vec<f64>,
        background: Vec<f64>,
        right: Vec<f64>,
        down: Vec<f64>,
    ) -> Self {
        let n = width as usize * height as usize;
        assert!(
            foreground.len() == n && background.len() == n && right.len() == n && down.len() == n,
            "energy term lengths must match a {width}x{height} grid"
        );
        Self {
            width,
            height,
            foreground,
            background,
            right,
            down,
            beta: 1.0,
        }
    }

    /// Penalize disagreeing with the previous frame: pixels that were
    /// background pay `weight` extra to become foreground, and vice versa.
    pub fn with_temporal_prior(mut self, previous: &Mask, weight: f64) -> Result<Self> {
        if previous.dimensions() != (self.width, self.height) {
            return Err(SegmentError::shape(
                "previous mask",
                (self.width, self.height),
                previous.dimensions(),
            ));
        }
        if weight == 0.0 {
            return Ok(self);
        }

        for idx in 0..self.foreground.len() {
            if previous.is_foreground(idx) {
                self.background[idx] += weight;
            } else {
                self.foreground[idx] += weight;
            }
        }
        Ok(self)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn foreground_cost(&self, idx: usize) -> f64 {
        self.foreground[idx]
    }

    pub fn background_cost(&self, idx: usize) -> f64 {
        self.background[idx]
    }

    /// Weight of the pair `(a, b)` where `b` is the right or lower neighbor of `a`.
    pub fn pair_weight(&self, a: usize, b: usize) -> f64 {
        if is_horizontal(self.width as usize, a, b) {
            self.right[a]
        } else {
            self.down[a]
        }
    }

    /// Evaluate `E(mask)`.
    pub fn energy(&self, mask: &Mask) -> f64 {
        debug_assert_eq!(mask.dimensions(), (self.width, self.height));

        let mut total = 0.0;
        for idx in 0..self.foreground.len() {
            total += if mask.is_foreground(idx) {
                self.foreground[idx]
            } else {
                self.background[idx]
            };
        }
        for_each_neighbor_pair(self.width, self.height, |a, b| {
            if mask.is_foreground(a) != mask.is_foreground(b) {
                total += self.pair_weight(a, b);
            }
        });
        total
    }

    /// One node per pixel, two terminal arcs each, and one arc pair per
    /// undirected grid edge with equal capacity in both directions.
    pub fn build_network(&self) -> FlowNetwork {
        let _span = tracing::debug_span!("build_graph", width = self.width, height = self.height)
            .entered();

        let n = self.foreground.len();
        let mut network = FlowNetwork::with_arc_capacity(n, 4 * n);
        for idx in 0..n {
            network.add_terminal_edges(idx, self.background[idx], self.foreground[idx]);
        }
        for_each_neighbor_pair(self.width, self.height, |a, b| {
            let weight = self.pair_weight(a, b);
            network.add_edge(a, b, weight, weight);
        });
        network
    }

    /// Build, cut, and read back the labeling: source side is foreground.
    pub fn solve(&self) -> Segmentation {
        let network = self.build_network();
        let cut = solver::solve(&network);
        let data = (0..network.inner_count())
            .map(|idx| cut.is_source_side(idx) as u8)
            .collect();

        Segmentation {
            mask: Mask::from_data(self.width, self.height, data),
            flow: cut.flow,
            energy: cut.flow + network.constant(),
        }
    }
}

/// Labeling produced by one cut.
#[derive(Debug, Clone)]
pub struct Segmentation {
    pub mask: Mask,
    /// Max-flow value of the network.
    pub flow: f64,
    /// Energy of `mask`, i.e. flow plus the constant folded out of the terminals.
    pub energy: f64,
}
