//! Classes and property aggregation

use crate::inheritance::ClassId;
use crate::property::{Property, PropertyKind};
use fhirzeug_ir::Element;
use fhirzeug_mapping::naming::lower_first;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// An element or resource that becomes its own class
#[derive(Debug, Clone)]
pub struct Class {
    pub name: String,
    /// Schema path of the element that declared the class
    pub path: String,
    pub resource_type: Option<String>,
    pub superclass_name: Option<String>,
    pub short: Option<String>,
    pub formal: Option<String>,
    pub(crate) superclass: Option<ClassId>,
    properties: Vec<Property>,
    /// Group key -> indices into `properties`, each list sorted by property name
    expanded_nonoptionals: IndexMap<String, Vec<usize>>,
    urls: BTreeSet<String>,
}

/// What happened to a property handed to [`Class::add_property`]
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    /// Appended as a new property
    Added,
    /// Same-named reference; its targets were appended to the existing property
    ReferencesMerged { added: usize },
    /// Same-named non-reference; the earlier property was kept
    Rejected(NameCollision),
}

/// A same-named, non-reference property declared twice on one class
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameCollision {
    pub class_name: String,
    pub property_name: String,
    /// Path of the property that was kept
    pub kept_path: String,
    /// Path of the property that was dropped
    pub dropped_path: String,
    /// Profile the dropped property was read from
    pub dropped_url: Option<String>,
    /// Profiles contributing to the class at the time of the collision
    pub urls: Vec<String>,
    /// The two declarations disagree on optionality; the kept one still wins
    pub cardinality_conflict: bool,
}

impl Class {
    /// Create a class from an element that represents one.
    ///
    /// Returns `None` when the element carries no class declaration.
    pub fn from_element(element: &Element) -> Option<Self> {
        let declaration = element.class.as_ref()?;
        let mut class = Self::new(&declaration.name, &element.path);
        class.resource_type.clone_from(&declaration.resource_type);
        class.superclass_name.clone_from(&declaration.superclass_name);
        class.short.clone_from(&element.short);
        class.formal.clone_from(&element.formal);
        class.add_url(element.profile_url.as_deref());
        Some(class)
    }

    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            resource_type: None,
            superclass_name: None,
            short: None,
            formal: None,
            superclass: None,
            properties: Vec::new(),
            expanded_nonoptionals: IndexMap::new(),
            urls: BTreeSet::new(),
        }
    }

    pub fn with_superclass_name(mut self, superclass: impl Into<String>) -> Self {
        self.superclass_name = Some(superclass.into());
        self
    }

    /// Record a contributing profile URL
    pub fn add_url(&mut self, url: Option<&str>) {
        if let Some(url) = url {
            self.urls.insert(url.to_string());
        }
    }

    /// Contributing profile URLs, sorted
    pub fn urls(&self) -> Vec<&str> {
        self.urls.iter().map(String::as_str).collect()
    }

    /// Linked superclass, available once superclasses have been linked
    pub fn superclass_id(&self) -> Option<ClassId> {
        self.superclass
    }

    /// Merge a property into this class.
    ///
    /// The property's profile URL is recorded as contributing to the class in
    /// every case. A new name is appended. A repeated name extends the
    /// reference targets of the earlier property when that one is a
    /// reference; otherwise the new property is dropped and the collision is
    /// returned.
    pub fn add_property(&mut self, prop: Property) -> AddOutcome {
        self.add_url(prop.profile_url.as_deref());

        if let Some(existing) = self.properties.iter_mut().find(|p| p.name == prop.name) {
            if !existing.is_reference() {
                let collision = NameCollision {
                    class_name: self.name.clone(),
                    property_name: prop.name.clone(),
                    kept_path: existing.path.clone(),
                    dropped_path: prop.path.clone(),
                    dropped_url: prop.profile_url.clone(),
                    urls: self.urls.iter().cloned().collect(),
                    cardinality_conflict: existing.nonoptional != prop.nonoptional,
                };
                return AddOutcome::Rejected(collision);
            }
            let added = prop.reference_to_names.len();
            existing.reference_to_names.extend(prop.reference_to_names);
            return AddOutcome::ReferencesMerged { added };
        }

        let index = self.properties.len();
        let nonoptional = prop.nonoptional;
        let key = prop.group_key().to_string();
        self.properties.push(prop);

        if nonoptional {
            let properties = &self.properties;
            let group = self.expanded_nonoptionals.entry(key).or_default();
            group.push(index);
            group.sort_by(|a, b| properties[*a].name.cmp(&properties[*b].name));
        }

        AddOutcome::Added
    }

    /// Own properties in discovery order
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Own property by output name
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Own property by name before sanitizing
    pub fn own_property_for(&self, orig_name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.orig_name == orig_name)
    }

    /// Required properties grouped by plain name or choice group, in first-seen
    /// group order; each group is sorted by property name
    pub fn expanded_nonoptionals(&self) -> impl Iterator<Item = (&str, Vec<&Property>)> + '_ {
        self.expanded_nonoptionals
            .iter()
            .map(|(key, indices)| (key.as_str(), self.resolve_indices(indices)))
    }

    /// Required properties of one group
    pub fn nonoptional_group(&self, key: &str) -> Option<Vec<&Property>> {
        self.expanded_nonoptionals
            .get(key)
            .map(|indices| self.resolve_indices(indices))
    }

    fn resolve_indices(&self, indices: &[usize]) -> Vec<&Property> {
        indices.iter().map(|i| &self.properties[*i]).collect()
    }

    /// Own properties with choice alternatives collapsed to the first one seen
    pub fn nonexpanded_properties(&self) -> Vec<&Property> {
        collapse_choices(self.properties.iter())
    }

    /// Required own properties with choice alternatives collapsed
    pub fn nonexpanded_nonoptionals(&self) -> Vec<&Property> {
        collapse_choices(self.properties.iter().filter(|p| p.nonoptional))
    }

    pub fn sorted_properties(&self) -> Vec<&Property> {
        sorted_by_name(self.properties.iter().collect())
    }

    pub fn sorted_nonexpanded_properties(&self) -> Vec<&Property> {
        sorted_by_name(self.nonexpanded_properties())
    }

    pub fn sorted_nonexpanded_nonoptionals(&self) -> Vec<&Property> {
        sorted_by_name(self.nonexpanded_nonoptionals())
    }

    /// Required groups as `(group, members)` pairs sorted by group key
    pub fn sorted_nonoptionals(&self) -> Vec<(&str, Vec<&Property>)> {
        let mut groups: Vec<_> = self.expanded_nonoptionals().collect();
        groups.sort_by(|a, b| a.0.cmp(b.0));
        groups
    }

    pub fn has_nonoptional(&self) -> bool {
        self.properties.iter().any(|p| p.nonoptional)
    }

    pub fn has_choice_of_type(&self) -> bool {
        self.properties.iter().any(|p| p.choice_of_type().is_some())
    }

    /// Whether any required property is a choice alternative
    pub fn has_expanded_nonoptionals(&self) -> bool {
        self.properties
            .iter()
            .any(|p| p.nonoptional && p.choice_of_type().is_some())
    }

    /// Whether every own property is a choice alternative (true when empty)
    pub fn has_only_expandable_properties(&self) -> bool {
        self.properties
            .iter()
            .all(|p| matches!(p.kind, PropertyKind::ChoiceAlternative { .. }))
    }

    /// Resource type with its first letter lower-cased
    pub fn resource_type_enum(&self) -> Option<String> {
        self.resource_type.as_deref().map(lower_first)
    }

    /// Choice group -> concrete property names, in discovery order
    pub fn choice_properties(&self) -> IndexMap<&str, Vec<&str>> {
        let mut result: IndexMap<&str, Vec<&str>> = IndexMap::new();
        for prop in &self.properties {
            if let Some(group) = prop.choice_of_type() {
                result.entry(group).or_default().push(&prop.name);
            }
        }
        result
    }

    /// Output name -> property
    pub fn properties_map(&self) -> IndexMap<&str, &Property> {
        self.properties.iter().map(|p| (p.name.as_str(), p)).collect()
    }
}

/// Keep plain properties and the first alternative of every choice group
pub(crate) fn collapse_choices<'a>(props: impl Iterator<Item = &'a Property>) -> Vec<&'a Property> {
    let mut included = HashSet::new();
    props
        .filter(|p| match &p.kind {
            PropertyKind::ChoiceAlternative { group, .. } => included.insert(group.as_str()),
            PropertyKind::Plain => true,
        })
        .collect()
}

pub(crate) fn sorted_by_name(mut props: Vec<&Property>) -> Vec<&Property> {
    props.sort_by(|a, b| a.name.cmp(&b.name));
    props
}
