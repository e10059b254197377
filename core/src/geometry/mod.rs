//! Trajectory modelling: Bézier flight plans and coverage paths.

pub mod bezier;
pub mod coverage;

pub use bezier::{build_trajectory, interest_curve, split_at_interest, split_segments};
pub use coverage::{CoveragePath, CoverageSpec, SweepAxis};
