//! Controller types

use crate::error::{Error, Result};
use crate::profile::SchemaProfile;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operator-supplied settings for one session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    /// Latest admissible date for cutoff-gated profiles
    #[serde(default)]
    pub cutoff: Option<NaiveDate>,
    /// Delete overlapping destination rows instead of skipping the file
    #[serde(default)]
    pub overwrite: bool,
}

impl RunOptions {
    /// Options with no cutoff and overwrite off
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cutoff date
    #[must_use]
    pub fn with_cutoff(mut self, cutoff: NaiveDate) -> Self {
        self.cutoff = Some(cutoff);
        self
    }

    /// Enable or disable overwrite mode
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Check the options make sense for a profile
    pub fn validate(&self, profile: &SchemaProfile) -> Result<()> {
        if profile.date_filter_enabled && self.cutoff.is_none() {
            return Err(Error::invalid_value(
                "cutoff",
                format!("profile '{}' filters by date and needs a cutoff", profile.name),
            ));
        }

        if self.overwrite && !profile.collision_check_enabled {
            tracing::warn!(
                profile = %profile.name,
                "Overwrite has no effect: profile does not check for collisions"
            );
        }

        Ok(())
    }
}

/// What the caller should do after a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// More files remain; invoke `step` again
    Continue,
    /// The queue is exhausted (or was empty)
    Done,
    /// A fatal error stopped the run; the current file will be retried
    Halted,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Continue => write!(f, "continue"),
            Step::Done => write!(f, "done"),
            Step::Halted => write!(f, "halted"),
        }
    }
}
