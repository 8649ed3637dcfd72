#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # fhirzeug-ir
//!
//! Element-occurrence records consumed by the class-model resolver.
//!
//! A schema parser flattens each profile's element tree into an ordered list of
//! [`Element`] records. The driver then pairs every property element with each
//! of its allowed [`ElementType`]s, producing one [`Occurrence`] per pair.

/// Single-element records: cardinality, type choices and class declarations.
pub mod element;
/// Flattened `(element, type)` pairs handed to the resolver.
pub mod occurrence;
/// Profile documents and their file loaders.
pub mod profile;

pub use element::{ClassDeclaration, Element, ElementType, EnumRestriction, MaxCardinality};
pub use occurrence::Occurrence;
pub use profile::{ProfileDocument, ProfileSet};

use thiserror::Error;

/// Errors that can occur when reading element records
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid cardinality '{value}': {reason}")]
    InvalidCardinality { value: String, reason: String },

    #[error("Parse error in {context}: {message}")]
    Parse { context: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build an invalid-cardinality error with the offending literal.
    pub fn invalid_cardinality(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidCardinality {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Build a parse error with the input context (file name or format).
    pub fn parse(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            context: context.into(),
            message: message.into(),
        }
    }
}

/// Crate-local result type for record operations.
pub type Result<T> = std::result::Result<T, Error>;
