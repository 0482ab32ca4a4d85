//! Step-wise volume and mute operations.

mod action;
mod operations;

pub use {
    action::VolumeAction,
    operations::{ActionOutcome, DEFAULT_STEP, apply, decrease, increase, validate_step},
};
