mod gmm;

pub use gmm::{Component, GaussianMixture};

use ndarray::{Array1, Array2, ArrayView2};

use crate::config::GmmConfig;
use crate::error::{Class, Result, SegmentError};
use crate::grid::{ColorGrid, LabelGrid};

/// Foreground and background color densities.
#[derive(Debug, Clone)]
pub struct AppearanceModel {
    foreground: GaussianMixture,
    background: GaussianMixture,
}

/// Per-pixel negative log-likelihoods under each class.
#[derive(Debug, Clone)]
pub struct DataCosts {
    pub foreground: Array1<f64>,
    pub background: Array1<f64>,
}

impl DataCosts {
    pub fn len(&self) -> usize {
        self.foreground.len()
    }

    pub fn is_empty(&self) -> bool {
        self.foreground.is_empty()
    }

    /// Cost of giving pixel `idx` the given class.
    pub fn cost(&self, idx: usize, class: Class) -> f64 {
        match class {
            Class::Foreground => self.foreground[idx],
            Class::Background => self.background[idx],
        }
    }
}

impl AppearanceModel {
    pub fn new(foreground: GaussianMixture, background: GaussianMixture) -> Self {
        Self {
            foreground,
            background,
        }
    }

    pub fn fit(
        foreground: ArrayView2<'_, f64>,
        background: ArrayView2<'_, f64>,
        config: &GmmConfig,
    ) -> Result<Self> {
        Ok(Self {
            foreground: GaussianMixture::fit(foreground, config, Class::Foreground)?,
            background: GaussianMixture::fit(background, config, Class::Background)?,
        })
    }

    /// Initial fit from a freshly seeded label grid.
    ///
    /// Each class is learned from the pixels labeled with it, definite or
    /// probable. A class without any is learned from the undecided pixels
    /// instead, so a bare rectangle seeds the foreground from its inside. A
    /// grid with neither falls back to the whole image.
    pub fn seed(colors: &ColorGrid, labels: &LabelGrid, config: &GmmConfig) -> Result<Self> {
        colors.ensure_dimensions("label grid", labels.dimensions())?;
        let cells = labels.as_slice();

        let pick = |class: Class| -> Array2<f64> {
            let samples = colors.select(|i| cells[i].class() == Some(class));
            if samples.nrows() > 0 {
                return samples;
            }
            let undecided = colors.select(|i| !cells[i].is_definite());
            if undecided.nrows() > 0 {
                return undecided;
            }
            colors.colors().to_owned()
        };

        Self::fit(
            pick(Class::Foreground).view(),
            pick(Class::Background).view(),
            config,
        )
    }

    pub fn foreground(&self) -> &GaussianMixture {
        &self.foreground
    }

    pub fn background(&self) -> &GaussianMixture {
        &self.background
    }

    /// Replace one class's mixture. On empty samples the old mixture is kept
    /// and `InsufficientData` is returned.
    pub fn refit_class(
        &mut self,
        class: Class,
        samples: ArrayView2<'_, f64>,
        config: &GmmConfig,
    ) -> Result<()> {
        let fitted = GaussianMixture::fit(samples, config, class)?;
        match class {
            Class::Foreground => self.foreground = fitted,
            Class::Background => self.background = fitted,
        }
        Ok(())
    }

    /// Refit both classes, skipping any class that has no samples.
    pub fn refit<'a>(
        &mut self,
        foreground: ArrayView2<'a, f64>,
        background: ArrayView2<'a, f64>,
        config: &GmmConfig,
    ) -> Result<()> {
        for (class, samples) in [
            (Class::Foreground, foreground),
            (Class::Background, background),
        ] {
            match self.refit_class(class, samples, config) {
                Ok(()) => {}
                Err(SegmentError::InsufficientData { class }) => {
                    tracing::warn!("no {} samples, keeping previous model", class);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Score every pixel under both classes in one pass.
    pub fn data_costs(&self, colors: &ColorGrid) -> DataCosts {
        let _span = tracing::debug_span!("data_costs", pixels = colors.len()).entered();
        DataCosts {
            foreground: self.foreground.score_samples(colors.colors()),
            background: self.background.score_samples(colors.colors()),
        }
    }
}
