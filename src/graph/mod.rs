//! Energy graph construction.
//!
//! An image and an appearance model become a flow network whose minimum
//! source/sink cut is the lowest-energy binary labeling.

mod builder;
mod network;

pub use builder::{contrast_beta, EnergyTerms, Segmentation};
pub use network::FlowNetwork;
