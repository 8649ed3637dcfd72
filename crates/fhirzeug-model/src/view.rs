//! Inheritance-aware read-only views over a class
//!
//! Every `*_all` view lists the class's own tier first, followed by each
//! superclass tier in chain order. Tiers are never deduplicated against each
//! other; a renderer prefers the most-derived entry of a name. Sorted `*_all`
//! views sort within each tier.

use crate::class::{Class, sorted_by_name};
use crate::inheritance::ClassId;
use crate::property::Property;
use crate::registry::ClassRegistry;
use std::ops::Deref;

/// A class together with the registry needed to walk its superclass chain
#[derive(Debug, Clone, Copy)]
pub struct ClassView<'r> {
    registry: &'r ClassRegistry,
    id: ClassId,
    class: &'r Class,
}

impl<'r> ClassView<'r> {
    pub(crate) fn new(registry: &'r ClassRegistry, id: ClassId, class: &'r Class) -> Self {
        Self {
            registry,
            id,
            class,
        }
    }

    pub fn id(&self) -> ClassId {
        self.id
    }

    pub fn class(&self) -> &'r Class {
        self.class
    }

    /// Linked superclass, if superclasses have been linked and it is known
    pub fn superclass(&self) -> Option<ClassView<'r>> {
        self.class
            .superclass_id()
            .and_then(|id| self.registry.view(id))
    }

    /// This class followed by its superclasses, most derived first
    pub fn chain(&self) -> impl Iterator<Item = ClassView<'r>> + 'r {
        // linking rejects cycles, the bound only guards hand-built registries
        let limit = self.registry.len();
        std::iter::successors(Some(*self), ClassView::superclass).take(limit.max(1))
    }

    /// Superclasses only, nearest first
    pub fn ancestors(&self) -> impl Iterator<Item = ClassView<'r>> + 'r {
        self.chain().skip(1)
    }

    /// A class is rendered when it has a superclass or own properties
    pub fn should_write(&self) -> bool {
        self.class.superclass_id().is_some() || !self.class.properties().is_empty()
    }

    /// Find a property by its name before sanitizing, walking up the chain
    pub fn property_for(&self, orig_name: &str) -> Option<&'r Property> {
        self.chain().find_map(|view| view.class.own_property_for(orig_name))
    }

    /// Own and inherited properties, tier by tier
    pub fn properties_all(&self) -> Vec<&'r Property> {
        self.chain()
            .flat_map(|view| view.class.properties().iter())
            .collect()
    }

    pub fn nonexpanded_properties_all(&self) -> Vec<&'r Property> {
        self.chain()
            .flat_map(|view| view.class.nonexpanded_properties())
            .collect()
    }

    pub fn nonexpanded_nonoptionals_all(&self) -> Vec<&'r Property> {
        self.chain()
            .flat_map(|view| view.class.nonexpanded_nonoptionals())
            .collect()
    }

    pub fn sorted_properties_all(&self) -> Vec<&'r Property> {
        self.chain()
            .flat_map(|view| view.class.sorted_properties())
            .collect()
    }

    pub fn sorted_nonexpanded_properties_all(&self) -> Vec<&'r Property> {
        self.chain()
            .flat_map(|view| sorted_by_name(view.class.nonexpanded_properties()))
            .collect()
    }

    pub fn sorted_nonexpanded_nonoptionals_all(&self) -> Vec<&'r Property> {
        self.chain()
            .flat_map(|view| sorted_by_name(view.class.nonexpanded_nonoptionals()))
            .collect()
    }

    /// Required groups of every tier, each tier sorted by group key
    pub fn sorted_nonoptionals_all(&self) -> Vec<(&'r str, Vec<&'r Property>)> {
        self.chain()
            .flat_map(|view| view.class.sorted_nonoptionals())
            .collect()
    }
}

impl Deref for ClassView<'_> {
    type Target = Class;

    fn deref(&self) -> &Class {
        self.class
    }
}
