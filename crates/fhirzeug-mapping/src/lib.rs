#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # fhirzeug-mapping
//!
//! Naming and type-mapping rules used while resolving a class model.
//!
//! The resolver never hard-codes how schema names become identifiers or how
//! schema type codes become output classes; it asks a [`TypeMapping`]. The
//! stock implementation, [`MappingRules`], is a table loaded from YAML or JSON.

pub mod json_class;
pub mod naming;
pub mod rules;

pub use json_class::JsonClass;
pub use rules::MappingRules;

use thiserror::Error;

/// Errors that can occur when loading mapping rules
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid mapping rules format: {0}")]
    InvalidFormat(String),

    #[error("Unknown JSON class: {0}")]
    UnknownJsonClass(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Collaborator that turns schema names and types into output names and types
pub trait TypeMapping {
    /// Deterministic, output-legal identifier for a raw property name
    fn safe_property_name(&self, name: &str) -> String;

    /// Output class name for a type code, ignoring property-level remapping
    fn class_name_for_type(&self, type_name: &str) -> String;

    /// Output class name for the value type of a property
    fn class_name_for_type_if_property(&self, type_name: &str) -> String;

    /// Representation of values of this class when JSON encoded
    fn json_class_for_class_name(&self, class_name: &str) -> JsonClass;

    /// Whether the class is built in rather than generated
    fn class_name_is_native(&self, class_name: &str) -> bool;

    /// Class name of the resource a target profile URL points to
    fn class_name_for_profile(&self, profile_url: &str) -> String;
}
