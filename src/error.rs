use std::fmt;

use thiserror::Error;

/// Which of the two appearance classes an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    Foreground,
    Background,
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Class::Foreground => f.write_str("foreground"),
            Class::Background => f.write_str("background"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SegmentError {
    /// A class had zero samples at fit time. Callers recover by keeping the
    /// previous model.
    #[error("no {class} samples to fit the appearance model")]
    InsufficientData { class: Class },

    /// The hint leaves nothing to segment.
    #[error("region hint selects no unknown pixels")]
    DegenerateRegion,

    #[error("{what} is {actual_width}x{actual_height}, expected {expected_width}x{expected_height}")]
    ShapeMismatch {
        what: &'static str,
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("rectangle [{x0}, {y0}, {x1}, {y1}] does not fit a {width}x{height} image")]
    RectOutOfBounds {
        x0: u32,
        y0: u32,
        x1: u32,
        y1: u32,
        width: u32,
        height: u32,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read configuration")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration")]
    Toml(#[from] toml::de::Error),
}

impl SegmentError {
    pub(crate) fn shape(
        what: &'static str,
        expected: (u32, u32),
        actual: (u32, u32),
    ) -> Self {
        SegmentError::ShapeMismatch {
            what,
            expected_width: expected.0,
            expected_height: expected.1,
            actual_width: actual.0,
            actual_height: actual.1,
        }
    }
}

pub type Result<T, E = SegmentError> = std::result::Result<T, E>;
