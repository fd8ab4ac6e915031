//! Interactive foreground/background segmentation of images and frame
//! sequences.
//!
//! Gaussian mixture appearance models supply per-pixel data costs, a 4-connected
//! grid supplies contrast-sensitive smoothness costs, and a push-relabel
//! max-flow finds the minimum-energy binary labeling. [`segmentation::anneal`]
//! offers an approximate stochastic alternative, and
//! [`segmentation::FramePropagator`] carries a learned model through a video
//! with an optional temporal-consistency term.

pub mod config;
pub mod error;
pub mod graph;
pub mod grid;
pub mod hint;
pub mod model;
pub mod segmentation;
pub mod solver;

pub use config::{AnnealConfig, GmmConfig, SegmentationConfig};
pub use error::{Class, Result, SegmentError};
pub use grid::{ColorGrid, Label, LabelGrid, Mask};
pub use hint::{Rect, RegionHint, Strokes};
pub use segmentation::{
    anneal, refine, Annealing, FramePropagator, GraphCut, Refinement, Segmenter,
};
