//! State management module
//!
//! Holds the step controller's progress and persists it between
//! invocations.
//!
//! # Overview
//!
//! The state module provides:
//! - `ProcessingState` - queue, index, running flag and audit log
//! - `Session` - the state plus the selected profile and run options
//! - `StateManager` - File-based session persistence

mod manager;
mod types;

pub use manager::StateManager;
pub use types::{FileRef, LogEntry, Outcome, Phase, ProcessingState, Session, StateView};

#[cfg(test)]
mod manager_tests;
