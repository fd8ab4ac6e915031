//! Seed regions supplied by the user.
//!
//! A rectangle, brush strokes, both together, or an earlier label grid are all
//! the same thing: a split of the grid into known and unknown pixels. They are
//! converted into a [`LabelGrid`] once, at ingestion.

use crate::error::{Result, SegmentError};
use crate::grid::{Label, LabelGrid, Mask};

/// Half-open pixel rectangle `[x0, x1) × [y0, y1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl Rect {
    pub fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }

    pub fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    fn check_bounds(&self, width: u32, height: u32) -> Result<()> {
        if self.x1 > width || self.y1 > height {
            return Err(SegmentError::RectOutOfBounds {
                x0: self.x0,
                y0: self.y0,
                x1: self.x1,
                y1: self.y1,
                width,
                height,
            });
        }
        Ok(())
    }
}

/// Brush masks; a pixel marked in both counts as foreground.
#[derive(Debug, Clone)]
pub struct Strokes {
    pub foreground: Mask,
    pub background: Mask,
}

impl Strokes {
    pub fn new(foreground: Mask, background: Mask) -> Self {
        Self {
            foreground,
            background,
        }
    }

    fn check_shape(&self, width: u32, height: u32) -> Result<()> {
        for (what, mask) in [
            ("foreground strokes", &self.foreground),
            ("background strokes", &self.background),
        ] {
            if mask.dimensions() != (width, height) {
                return Err(SegmentError::shape(what, (width, height), mask.dimensions()));
            }
        }
        Ok(())
    }

    fn paint(&self, labels: &mut LabelGrid) {
        for y in 0..labels.height() {
            for x in 0..labels.width() {
                if self.foreground.get(x, y) {
                    labels.set(x, y, Label::Foreground);
                } else if self.background.get(x, y) {
                    labels.set(x, y, Label::Background);
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum RegionHint {
    /// Outside is definite background, inside is unknown.
    Rect(Rect),
    /// Marked pixels are definite, the rest unknown.
    Strokes(Strokes),
    /// Rectangle first, then strokes painted over it.
    RectWithStrokes(Rect, Strokes),
    /// Re-seed from an earlier result.
    Labels(LabelGrid),
}

impl RegionHint {
    /// Build the initial label grid for a `width`×`height` image.
    pub fn seed(&self, width: u32, height: u32) -> Result<LabelGrid> {
        let labels = match self {
            RegionHint::Rect(rect) => seed_rect(rect, width, height)?,
            RegionHint::Strokes(strokes) => {
                strokes.check_shape(width, height)?;
                let mut labels = LabelGrid::filled(width, height, Label::Unknown);
                strokes.paint(&mut labels);
                labels
            }
            RegionHint::RectWithStrokes(rect, strokes) => {
                strokes.check_shape(width, height)?;
                let mut labels = seed_rect(rect, width, height)?;
                strokes.paint(&mut labels);
                labels
            }
            RegionHint::Labels(labels) => {
                if labels.dimensions() != (width, height) {
                    return Err(SegmentError::shape(
                        "label grid",
                        (width, height),
                        labels.dimensions(),
                    ));
                }
                labels.clone()
            }
        };

        if labels.undecided_count() == 0 {
            return Err(SegmentError::DegenerateRegion);
        }
        Ok(labels)
    }
}

fn seed_rect(rect: &Rect, width: u32, height: u32) -> Result<LabelGrid> {
    rect.check_bounds(width, height)?;
    if rect.is_empty() {
        return Err(SegmentError::DegenerateRegion);
    }

    let mut labels = LabelGrid::filled(width, height, Label::Background);
    for y in rect.y0..rect.y1 {
        for x in rect.x0..rect.x1 {
            labels.set(x, y, Label::Unknown);
        }
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_marks_inside_unknown() {
        let labels = RegionHint::Rect(Rect::new(1, 1, 3, 3)).seed(4, 4).unwrap();
        assert_eq!(labels.count(Label::Unknown), 4);
        assert_eq!(labels.count(Label::Background), 12);
        assert_eq!(labels.get(1, 1), Label::Unknown);
        assert_eq!(labels.get(3, 3), Label::Background);
    }

    #[test]
    fn empty_rect_is_degenerate() {
        let err = RegionHint::Rect(Rect::new(2, 2, 2, 4)).seed(4, 4).unwrap_err();
        assert!(matches!(err, SegmentError::DegenerateRegion));
    }

    #[test]
    fn rect_outside_image_is_rejected() {
        let err = RegionHint::Rect(Rect::new(0, 0, 5, 2)).seed(4, 4).unwrap_err();
        assert!(matches!(err, SegmentError::RectOutOfBounds { .. }));
    }

    #[test]
    fn strokes_override_rect() {
        let strokes = Strokes::new(
            Mask::from_fn(4, 4, |x, y| x == 2 && y == 2),
            Mask::from_fn(4, 4, |x, y| x == 1 && y == 1),
        );
        let labels = RegionHint::RectWithStrokes(Rect::new(1, 1, 3, 3), strokes)
            .seed(4, 4)
            .unwrap();
        assert_eq!(labels.get(2, 2), Label::Foreground);
        assert_eq!(labels.get(1, 1), Label::Background);
        assert_eq!(labels.count(Label::Unknown), 2);
    }

    #[test]
    fn stroke_shape_mismatch_is_rejected() {
        let strokes = Strokes::new(Mask::new(4, 4), Mask::new(3, 4));
        let err = RegionHint::Strokes(strokes).seed(4, 4).unwrap_err();
        assert!(matches!(err, SegmentError::ShapeMismatch { .. }));
    }

    #[test]
    fn strokes_covering_everything_are_degenerate() {
        let strokes = Strokes::new(Mask::from_fn(2, 2, |_, _| true), Mask::new(2, 2));
        let err = RegionHint::Strokes(strokes).seed(2, 2).unwrap_err();
        assert!(matches!(err, SegmentError::DegenerateRegion));
    }
}
