use image::RgbImage;

use crate::config::SegmentationConfig;
use crate::error::{Class, Result, SegmentError};
use crate::graph::{EnergyTerms, Segmentation};
use crate::grid::{ColorGrid, LabelGrid, Mask};
use crate::hint::RegionHint;
use crate::model::AppearanceModel;

use super::types::Refinement;

/// One interactive segmentation: the image, its label state and the models
/// learned from it.
#[derive(Debug, Clone)]
pub struct GraphCut {
    colors: ColorGrid,
    labels: LabelGrid,
    model: AppearanceModel,
    config: SegmentationConfig,
}

impl GraphCut {
    pub fn new(image: &RgbImage, hint: &RegionHint, config: SegmentationConfig) -> Result<Self> {
        Self::from_colors(ColorGrid::from_rgb(image), hint, config)
    }

    /// Seed labels from `hint` and fit the initial models.
    pub fn from_colors(
        colors: ColorGrid,
        hint: &RegionHint,
        config: SegmentationConfig,
    ) -> Result<Self> {
        config.validate()?;
        let labels = hint.seed(colors.width(), colors.height())?;
        let model = AppearanceModel::seed(&colors, &labels, &config.gmm)?;

        tracing::debug!(
            width = colors.width(),
            height = colors.height(),
            undecided = labels.undecided_count(),
            "seeded segmentation"
        );

        Ok(Self {
            colors,
            labels,
            model,
            config,
        })
    }

    pub fn colors(&self) -> &ColorGrid {
        &self.colors
    }

    pub fn labels(&self) -> &LabelGrid {
        &self.labels
    }

    pub fn model(&self) -> &AppearanceModel {
        &self.model
    }

    pub fn config(&self) -> &SegmentationConfig {
        &self.config
    }

    /// Weights can be retuned between runs; the models stay.
    pub fn config_mut(&mut self) -> &mut SegmentationConfig {
        &mut self.config
    }

    /// Single cut with the current models, no refitting.
    pub fn segment(&self) -> Segmentation {
        let terms = EnergyTerms::new(&self.colors, &self.model, &self.config);
        let mut result = terms.solve();
        if self.config.apply_explicit_mask {
            self.labels.override_definite(&mut result.mask);
            result.energy = terms.energy(&result.mask);
        }
        result
    }

    /// Alternate classify / refit / cut for up to `config.rounds` rounds,
    /// stopping early once the cut stops changing.
    pub fn refine(&mut self) -> Result<Refinement> {
        let _span = tracing::debug_span!("refine", rounds = self.config.rounds).entered();

        let mut previous: Option<Mask> = None;
        let mut rounds = 0;
        let mut last = None;

        for round in 0..self.config.rounds {
            let _round_span = tracing::debug_span!("round", round).entered();
            rounds += 1;

            self.refit()?;

            let terms = EnergyTerms::new(&self.colors, &self.model, &self.config);
            let result = terms.solve();
            self.labels.apply_cut(&result.mask);

            tracing::debug!(
                round,
                energy = result.energy,
                foreground = result.mask.count_foreground(),
                "round done"
            );

            let converged = previous.as_ref() == Some(&result.mask);
            previous = Some(result.mask.clone());
            last = Some((terms, result));
            if converged {
                break;
            }
        }

        let (terms, result) = last.ok_or_else(|| {
            SegmentError::InvalidConfig("rounds must be at least 1".to_string())
        })?;

        let mut mask = result.mask;
        if self.config.apply_explicit_mask {
            self.labels.override_definite(&mut mask);
        }
        let energy = terms.energy(&mask);

        tracing::info!(
            rounds,
            energy,
            foreground_ratio = mask.foreground_ratio(),
            "segmentation refined"
        );

        Ok(Refinement {
            labels: self.labels.clone(),
            mask,
            model: self.model.clone(),
            energy,
            rounds,
        })
    }

    /// Classify undecided pixels and refit both mixtures.
    ///
    /// Cells with a label keep their class; unknown cells go to foreground
    /// when the foreground model explains them strictly better.
    fn refit(&mut self) -> Result<()> {
        let costs = self.model.data_costs(&self.colors);
        let cells = self.labels.as_slice();
        let is_foreground = |i: usize| match cells[i].class() {
            Some(class) => class == Class::Foreground,
            None => costs.foreground[i] < costs.background[i],
        };

        let foreground = self.colors.select(is_foreground);
        let background = self.colors.select(|i| !is_foreground(i));
        tracing::debug!(
            foreground = foreground.nrows(),
            background = background.nrows(),
            "refitting appearance model"
        );

        self.model
            .refit(foreground.view(), background.view(), &self.config.gmm)
    }
}

/// Seed from `hint` and run the refinement loop.
pub fn refine(
    colors: &ColorGrid,
    hint: &RegionHint,
    config: &SegmentationConfig,
) -> Result<Refinement> {
    GraphCut::from_colors(colors.clone(), hint, config.clone())?.refine()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Label;
    use crate::hint::{Rect, Strokes};

    fn red_block() -> ColorGrid {
        ColorGrid::from_fn(4, 4, |x, y| {
            if (1..3).contains(&x) && (1..3).contains(&y) {
                [255.0, 0.0, 0.0]
            } else {
                [0.0, 0.0, 255.0]
            }
        })
    }

    #[test]
    fn refine_recovers_block() {
        let result = refine(
            &red_block(),
            &RegionHint::Rect(Rect::new(1, 1, 3, 3)),
            &SegmentationConfig::default(),
        )
        .unwrap();

        let expected = Mask::from_fn(4, 4, |x, y| (1..3).contains(&x) && (1..3).contains(&y));
        assert_eq!(result.mask, expected);
        assert_eq!(result.labels.count(Label::ProbableForeground), 4);
        assert_eq!(result.labels.count(Label::Background), 12);
        // Second round reproduces the first and stops.
        assert_eq!(result.rounds, 2);
    }

    #[test]
    fn single_round_is_respected() {
        let config = SegmentationConfig {
            rounds: 1,
            ..SegmentationConfig::default()
        };
        let hint = RegionHint::Rect(Rect::new(1, 1, 3, 3));
        let result = refine(&red_block(), &hint, &config).unwrap();
        assert_eq!(result.rounds, 1);
    }

    /// Blue everywhere except a red block; a background stroke lands on a
    /// blue corner that the cut would otherwise call foreground.
    fn contradicting_strokes() -> RegionHint {
        RegionHint::Strokes(Strokes::new(
            Mask::from_fn(4, 4, |x, y| x == 0 && y == 0),
            Mask::from_fn(4, 4, |x, y| (x == 3 && y == 3) || (x == 1 && y == 1)),
        ))
    }

    #[test]
    fn explicit_mask_overrides_cut() {
        let colors = red_block();
        let hint = contradicting_strokes();

        let free = refine(&colors, &hint, &SegmentationConfig::default()).unwrap();
        assert!(free.mask.get(0, 0));
        assert!(free.mask.get(3, 3));
        assert!(!free.mask.get(2, 2));

        let config = SegmentationConfig {
            apply_explicit_mask: true,
            ..SegmentationConfig::default()
        };
        let forced = refine(&colors, &hint, &config).unwrap();
        assert!(forced.mask.get(0, 0));
        assert!(!forced.mask.get(3, 3));
        assert_eq!(forced.labels.get(3, 3), Label::Background);
    }

    #[test]
    fn single_cut_uses_seeded_models() {
        let hint = contradicting_strokes();
        let mut session =
            GraphCut::from_colors(red_block(), &hint, SegmentationConfig::default()).unwrap();

        let free = session.segment();
        assert!(free.mask.get(0, 0));
        assert!(free.mask.get(3, 3));
        assert!(!free.mask.get(1, 1));
        assert!(!free.mask.get(2, 2));
        let terms = EnergyTerms::new(session.colors(), session.model(), session.config());
        assert!((free.energy - terms.energy(&free.mask)).abs() < 1e-6 * (1.0 + free.energy.abs()));

        session.config_mut().apply_explicit_mask = true;
        let forced = session.segment();
        assert!(forced.mask.get(0, 0));
        assert!(!forced.mask.get(3, 3));
        assert!(forced.energy > free.energy);

        // A plain cut never touches the label state.
        assert_eq!(session.labels().get(3, 3), Label::Background);
        assert_eq!(session.labels().undecided_count(), 13);
        assert_eq!(session.labels().count(Label::Unknown), 13);
    }

    #[test]
    fn probable_labels_without_definite_pixels_refine() {
        let hint = RegionHint::Labels(LabelGrid::filled(4, 4, Label::ProbableForeground));
        let result = refine(&red_block(), &hint, &SegmentationConfig::default()).unwrap();
        assert_eq!(result.mask.len(), 16);
        assert_eq!(result.labels.undecided_count(), 16);
        assert!(result.rounds >= 1);
    }
}
