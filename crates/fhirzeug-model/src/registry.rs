//! Class registry for one generation run

use crate::class::{AddOutcome, Class, NameCollision};
use crate::inheritance::ClassId;
use crate::property::Property;
use crate::view::ClassView;
use crate::{Error, Result};
use fhirzeug_ir::Element;
use indexmap::IndexMap;
use tracing::{debug, warn};

/// Registry of classes keyed by class name.
///
/// Classes from several profiles that share a name are fused into one entry.
/// A registry lives for exactly one generation run; create a new one (or
/// [`clear`](Self::clear) this one) before resolving unrelated input.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: IndexMap<String, Class>,
    collisions: Vec<NameCollision>,
    pub(crate) unresolved_superclasses: Vec<(String, String)>,
}

impl ClassRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the class for an element that represents one, creating it on
    /// first sight. The element's profile URL is always recorded.
    ///
    /// The flag is `true` when the class was created by this call.
    pub fn for_class(&mut self, element: &Element) -> Result<(ClassId, bool)> {
        let Some(class_name) = element.name_if_class() else {
            return Err(Error::NotAClass {
                path: element.path.clone(),
            });
        };

        if let Some((index, _, class)) = self.classes.get_full_mut(class_name) {
            class.add_url(element.profile_url.as_deref());
            return Ok((ClassId(index), false));
        }

        let class = Class::from_element(element).ok_or_else(|| Error::NotAClass {
            path: element.path.clone(),
        })?;
        debug!(class = %class.name, path = %class.path, "Registered class");
        let (index, _) = self.classes.insert_full(class.name.clone(), class);
        Ok((ClassId(index), true))
    }

    /// Register a class built by hand. An existing class of that name is kept
    /// and only gains the new class's URLs.
    pub fn insert(&mut self, class: Class) -> ClassId {
        if let Some((index, _, existing)) = self.classes.get_full_mut(&class.name) {
            for url in class.urls() {
                existing.add_url(Some(url));
            }
            return ClassId(index);
        }
        let (index, _) = self.classes.insert_full(class.name.clone(), class);
        ClassId(index)
    }

    /// Record a profile URL as contributing to a class
    pub fn add_url(&mut self, id: ClassId, url: Option<&str>) -> Result<()> {
        let class = self.get_mut(id).ok_or(Error::UnknownClassId(id))?;
        class.add_url(url);
        Ok(())
    }

    /// Merge a resolved property into a class.
    ///
    /// A rejected same-named property is logged and recorded as a collision;
    /// it never aborts the run.
    pub fn add_property(&mut self, id: ClassId, prop: Property) -> Result<AddOutcome> {
        let class = self
            .classes
            .get_index_mut(id.0)
            .map(|(_, class)| class)
            .ok_or(Error::UnknownClassId(id))?;

        let outcome = class.add_property(prop);
        if let AddOutcome::Rejected(collision) = &outcome {
            warn!(
                class = %collision.class_name,
                property = %collision.property_name,
                urls = ?collision.urls,
                dropped_url = ?collision.dropped_url,
                "Already have property \"{}\" on \"{}\", which is only allowed for references",
                collision.property_name,
                collision.class_name,
            );
            self.collisions.push(collision.clone());
        }
        Ok(outcome)
    }

    /// Look up a class id by name
    pub fn with_name(&self, name: &str) -> Option<ClassId> {
        self.classes.get_index_of(name).map(ClassId)
    }

    pub fn get(&self, id: ClassId) -> Option<&Class> {
        self.classes.get_index(id.0).map(|(_, class)| class)
    }

    /// Look up a class by name
    pub fn class(&self, name: &str) -> Option<&Class> {
        self.classes.get(name)
    }

    pub(crate) fn get_mut(&mut self, id: ClassId) -> Option<&mut Class> {
        self.classes.get_index_mut(id.0).map(|(_, class)| class)
    }

    /// Inheritance-aware view of a class
    pub fn view(&self, id: ClassId) -> Option<ClassView<'_>> {
        self.get(id).map(|class| ClassView::new(self, id, class))
    }

    /// Inheritance-aware view of a class by name
    pub fn view_named(&self, name: &str) -> Option<ClassView<'_>> {
        self.with_name(name).and_then(|id| self.view(id))
    }

    /// All classes in registration order
    pub fn iter(&self) -> impl Iterator<Item = ClassView<'_>> {
        self.classes
            .values()
            .enumerate()
            .map(move |(index, class)| ClassView::new(self, ClassId(index), class))
    }

    /// Classes a renderer should emit: those with a superclass or own
    /// properties, in registration order
    pub fn renderable_classes(&self) -> impl Iterator<Item = ClassView<'_>> {
        self.iter().filter(ClassView::should_write)
    }

    /// Class names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Same-named, non-reference properties dropped so far
    pub fn collisions(&self) -> &[NameCollision] {
        &self.collisions
    }

    /// `(class, superclass name)` pairs whose superclass was not registered at
    /// link time
    pub fn unresolved_superclasses(&self) -> &[(String, String)] {
        &self.unresolved_superclasses
    }

    /// Forget every class and recorded warning
    pub fn clear(&mut self) {
        self.classes.clear();
        self.collisions.clear();
        self.unresolved_superclasses.clear();
    }
}
