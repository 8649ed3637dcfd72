#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # fhirzeug-model
//!
//! Resolves a stream of element occurrences into a class model.
//!
//! - [`Property::resolve`] turns one `(element, type)` occurrence into a
//!   normalized property, expanding choice elements into typed alternatives.
//! - [`ClassRegistry`] creates or reuses classes per name and merges incoming
//!   properties, fusing same-named references and rejecting other duplicates.
//! - [`ClassRegistry::link_superclasses`] resolves superclass names once all
//!   profiles are in.
//! - [`ClassView`] answers inheritance-aware queries for renderers.
//!
//! ```rust
//! use fhirzeug_ir::{ClassDeclaration, Element, ElementType, MaxCardinality};
//! use fhirzeug_mapping::MappingRules;
//! use fhirzeug_model::{ClassRegistry, Property};
//!
//! let rules = MappingRules::fhir_defaults();
//! let mut registry = ClassRegistry::new();
//!
//! let patient = Element::new("Patient").declaring_class(ClassDeclaration::new("Patient"));
//! let (id, _) = registry.for_class(&patient).unwrap();
//!
//! let deceased = Element::new("Patient.deceased[x]")
//!     .with_type(ElementType::code("boolean"))
//!     .with_type(ElementType::code("dateTime"))
//!     .with_cardinality(0, MaxCardinality::Bounded(1));
//! for occurrence in deceased.occurrences() {
//!     let prop = Property::resolve(&occurrence, &rules).unwrap();
//!     registry.add_property(id, prop).unwrap();
//! }
//!
//! let view = registry.view(id).unwrap();
//! assert_eq!(view.properties().len(), 2);
//! assert_eq!(view.nonexpanded_properties().len(), 1);
//! ```

pub mod class;
pub mod inheritance;
pub mod property;
pub mod registry;
pub mod view;

pub use class::{AddOutcome, Class, NameCollision};
pub use inheritance::{ClassId, LinkReport};
pub use property::{Property, PropertyKind};
pub use registry::ClassRegistry;
pub use view::ClassView;

use thiserror::Error;

/// Errors that abort class-model resolution
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Malformed element '{path}': {reason}")]
    MalformedElement { path: String, reason: String },

    #[error("Element '{path}' does not represent a class")]
    NotAClass { path: String },

    #[error("No class with id {0} in this registry")]
    UnknownClassId(ClassId),

    #[error("Circular inheritance: {}", chain.join(" -> "))]
    CircularInheritance { chain: Vec<String> },
}

impl Error {
    /// Build a malformed-element error naming the offending path.
    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedElement {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
