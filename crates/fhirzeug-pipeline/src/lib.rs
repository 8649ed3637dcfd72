#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # fhirzeug-pipeline
//!
//! Drives one generation run.
//!
//! The pipeline walks every profile's flattened element list, registers the
//! classes those elements declare, resolves each property occurrence and
//! merges it into its owning class. Once every profile is in, superclasses are
//! linked and the data-quality warnings gathered along the way are returned in
//! a [`DiagnosticReport`].

pub mod dump;
pub mod pipeline;
pub mod policies;
pub mod report;

pub use dump::{ClassDump, ModelDump};
pub use pipeline::{Pipeline, PipelineConfig, ResolvedModel, RunStats};
pub use policies::StrictnessLevel;
pub use report::{Diagnostic, DiagnosticReport, Severity};

use thiserror::Error;

/// Errors that abort a generation run
#[derive(Error, Debug)]
pub enum Error {
    #[error("Pipeline error at '{path}': {message}")]
    Pipeline { path: String, message: String },

    #[error("Model error: {0}")]
    Model(#[from] fhirzeug_model::Error),

    #[error("Input error: {0}")]
    Input(#[from] fhirzeug_ir::Error),

    #[error("Policy error: {0}")]
    Policy(String),
}

impl Error {
    /// Create a structured pipeline error with element path context.
    pub fn pipeline(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Pipeline {
            path: path.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
