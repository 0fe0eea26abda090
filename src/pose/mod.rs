pub mod geometry;
pub mod keypoint;
pub mod source;

use thiserror::Error;

pub use geometry::angle;
pub use keypoint::{Frame, Landmark, LandmarkIndex, Pose};
pub use source::{LandmarkReader, TimedFrame};

/// 関節角度が計算できない
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: zero-length or non-finite joint vector")]
    Degenerate,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoseError {
    #[error("expected {expected} landmarks, got {got}")]
    LandmarkCount { expected: usize, got: usize },
    #[error("landmark {index} has {len} components (expected 2 or 3)")]
    LandmarkShape { index: usize, len: usize },
}
