pub mod engine;
pub mod feedback;
pub mod one_euro;
pub mod profile;
pub mod rep;
pub mod throttle;

#[cfg(test)]
pub(crate) mod testutil;

pub use engine::{RepEngine, RepListener};
pub use feedback::{Feedback, FeedbackEmitter, FeedbackKind, FeedbackTexts};
pub use one_euro::AngleFilter;
pub use profile::{AlignmentAxis, AlignmentGate, ExerciseMode, ExerciseProfile, JointTriplet, RepEdge};
pub use rep::{RepPhase, RepStateMachine, SkipReason, StepOutcome};
pub use throttle::FrameThrottle;
