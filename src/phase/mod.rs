//! Interaction phase tracking
//!
//! One guarded state machine per daemon drives the
//! idle -> anticipation -> engagement -> listening -> processing ->
//! completion cycle, plus a stateless predictor that ranks likely actions
//! for a dragged item before any voice input.

mod machine;
mod predict;

pub use machine::{Phase, PhaseMachine, SessionSignal, DEFAULT_RESET_DELAY};
pub use predict::{predict, ColorTag, PredictedAction};
