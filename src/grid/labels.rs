use crate::error::Class;

use super::Mask;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Background,
    Foreground,
    ProbableBackground,
    ProbableForeground,
    Unknown,
}

impl Label {
    /// Hinted by the user; never changed by the solver.
    pub fn is_definite(self) -> bool {
        matches!(self, Label::Background | Label::Foreground)
    }

    /// The class this label leans towards, `None` for unknown pixels.
    pub fn class(self) -> Option<Class> {
        match self {
            Label::Background | Label::ProbableBackground => Some(Class::Background),
            Label::Foreground | Label::ProbableForeground => Some(Class::Foreground),
            Label::Unknown => None,
        }
    }

    /// Trimap code handed to collaborators.
    pub fn code(self) -> u8 {
        match self {
            Label::Background => 0,
            Label::Foreground => 1,
            Label::ProbableBackground => 2,
            Label::ProbableForeground => 3,
            Label::Unknown => 4,
        }
    }
}

/// Per-pixel label state. Every cell holds exactly one [`Label`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelGrid {
    width: u32,
    height: u32,
    labels: Vec<Label>,
}

impl LabelGrid {
    pub fn filled(width: u32, height: u32, label: Label) -> Self {
        Self {
            width,
            height,
            labels: vec![label; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn as_slice(&self) -> &[Label] {
        &self.labels
    }

    pub fn get(&self, x: u32, y: u32) -> Label {
        self.labels[y as usize * self.width as usize + x as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, label: Label) {
        self.labels[y as usize * self.width as usize + x as usize] = label;
    }

    pub fn count(&self, label: Label) -> usize {
        self.labels.iter().filter(|&&l| l == label).count()
    }

    /// Pixels the solver is free to decide.
    pub fn undecided_count(&self) -> usize {
        self.labels.iter().filter(|l| !l.is_definite()).count()
    }

    /// Overwrite every non-definite cell with the cut result.
    pub fn apply_cut(&mut self, mask: &Mask) {
        for (idx, label) in self.labels.iter_mut().enumerate() {
            if label.is_definite() {
                continue;
            }
            *label = if mask.is_foreground(idx) {
                Label::ProbableForeground
            } else {
                Label::ProbableBackground
            };
        }
    }

    /// Force definite cells of `mask` to their hinted value.
    pub fn override_definite(&self, mask: &mut Mask) {
        for (idx, label) in self.labels.iter().enumerate() {
            match label {
                Label::Background => mask.set(idx, false),
                Label::Foreground => mask.set(idx, true),
                _ => {}
            }
        }
    }

    /// Binary view: everything not leaning to background is 1, so the inside
    /// of a rectangle hint starts out as foreground.
    pub fn to_mask(&self) -> Mask {
        let data = self
            .labels
            .iter()
            .map(|l| (l.class() != Some(Class::Background)) as u8)
            .collect();
        Mask::from_data(self.width, self.height, data)
    }

    pub fn to_trimap(&self) -> Vec<u8> {
        self.labels.iter().map(|l| l.code()).collect()
    }
}
