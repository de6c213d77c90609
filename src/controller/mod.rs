//! Step controller module
//!
//! Sequences per-file processing and commit across a queue of files, one
//! file per invocation.
//!
//! # Overview
//!
//! - `StepController::step(state) -> (state, Step)` is the only mutator of
//!   `ProcessingState`
//! - `Step::Continue` asks the caller to invoke again, `Step::Done` means the
//!   queue is exhausted, `Step::Halted` means a fatal error left the current
//!   file unprocessed
//! - `RunOptions` carries the cutoff date and overwrite flag

mod step;
mod types;

pub use step::StepController;
pub use types::{RunOptions, Step};
