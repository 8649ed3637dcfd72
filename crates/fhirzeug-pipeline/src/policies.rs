//! Strictness levels

use serde::{Deserialize, Serialize};

/// How data-quality warnings affect a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrictnessLevel {
    /// Report warnings and keep the resolved model
    #[default]
    Permissive,

    /// Fail the run if any warning was recorded
    Strict,
}

impl StrictnessLevel {
    pub fn fails_on_warnings(self) -> bool {
        matches!(self, Self::Strict)
    }
}
