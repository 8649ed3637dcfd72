//! Property resolution
//!
//! One [`Property`] is built per `(element, type)` occurrence. Choice elements
//! (`value[x]`) are enumerated once per allowed type by the driver; each
//! enumeration becomes a [`PropertyKind::ChoiceAlternative`] whose concrete
//! name appends the type with its first letter upper-cased (`valueString`).

use crate::{Error, Result};
use fhirzeug_ir::element::CHOICE_MARKER;
use fhirzeug_ir::{EnumRestriction, Occurrence};
use fhirzeug_mapping::naming::upper_first;
use fhirzeug_mapping::{JsonClass, TypeMapping};
use serde::Serialize;
use tracing::trace;

/// Type code whose elements may carry an enum restriction
const CODE_TYPE: &str = "code";

/// Whether a property is an ordinary field or one alternative of a choice group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PropertyKind {
    Plain,
    ChoiceAlternative {
        /// Sanitized group base name shared by all alternatives
        group: String,
        /// Type code this alternative was expanded for
        concrete_type: String,
    },
}

/// A normalized property of a class
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    /// Name exactly as declared in the schema, choice marker included
    pub declared_name: String,
    /// Declared name after choice substitution, before sanitizing
    pub orig_name: String,
    /// Output-safe name
    pub name: String,
    pub kind: PropertyKind,
    pub path: String,
    pub parent_name: Option<String>,
    /// Output type of the property's value
    pub class_name: String,
    pub json_class: JsonClass,
    pub is_native: bool,
    pub is_json_primitive_field: bool,
    pub is_array: bool,
    pub is_summary: bool,
    pub is_summary_n_min_conflict: bool,
    pub nonoptional: bool,
    /// Classes a polymorphic reference may point to
    pub reference_to_names: Vec<String>,
    #[serde(rename = "enum")]
    pub enum_restriction: Option<EnumRestriction>,
    /// External module of the value type; never set by the resolver
    pub module_name: Option<String>,
    pub short: Option<String>,
    pub formal: Option<String>,
    pub representation: Option<Vec<String>>,
    /// Profile the declaration was read from
    pub profile_url: Option<String>,
}

impl Property {
    /// Build the property for one occurrence.
    ///
    /// Fails with [`Error::MalformedElement`] when the occurrence has neither
    /// an explicit type name nor a type code.
    pub fn resolve<M>(occurrence: &Occurrence<'_>, mapping: &M) -> Result<Self>
    where
        M: TypeMapping + ?Sized,
    {
        let element = occurrence.element;
        let type_name = occurrence
            .resolved_type_name()
            .ok_or_else(|| Error::malformed(&element.path, "no type chosen and none declared"))?;

        let declared_name = element.prop_name();
        let (orig_name, kind) = match declared_name.strip_suffix(CHOICE_MARKER) {
            Some(base) if !base.contains(CHOICE_MARKER) => (
                format!("{base}{}", upper_first(type_name)),
                PropertyKind::ChoiceAlternative {
                    group: mapping.safe_property_name(base),
                    concrete_type: type_name.to_string(),
                },
            ),
            _ if declared_name.contains(CHOICE_MARKER) => {
                return Err(Error::malformed(
                    &element.path,
                    format!("choice marker must terminate the name '{declared_name}'"),
                ));
            }
            _ => (declared_name.to_string(), PropertyKind::Plain),
        };
        let name = mapping.safe_property_name(&orig_name);

        let class_name = mapping.class_name_for_type_if_property(type_name);
        let enum_restriction = if type_name == CODE_TYPE {
            element.enum_restriction.clone()
        } else {
            None
        };
        let json_class = mapping.json_class_for_class_name(&class_name);
        let is_native = enum_restriction.is_none() && mapping.class_name_is_native(&class_name);

        let reference_to_names = occurrence
            .element_type
            .profile
            .as_deref()
            .map(|profile| vec![mapping.class_name_for_profile(profile)])
            .unwrap_or_default();

        trace!(path = %element.path, %name, %class_name, "Resolved property");

        Ok(Self {
            declared_name: declared_name.to_string(),
            orig_name,
            name,
            kind,
            path: element.path.clone(),
            parent_name: element.parent_name.clone(),
            class_name,
            json_class,
            is_native,
            is_json_primitive_field: json_class.is_primitive(),
            is_array: element.is_unbounded(),
            is_summary: element.is_summary,
            is_summary_n_min_conflict: element.summary_n_min_conflict,
            nonoptional: element.is_required(),
            reference_to_names,
            enum_restriction,
            module_name: None,
            short: element.short.clone(),
            formal: element.formal.clone(),
            representation: element.representation.clone(),
            profile_url: element.profile_url.clone(),
        })
    }

    /// Group name when this property is a choice alternative
    pub fn choice_of_type(&self) -> Option<&str> {
        match &self.kind {
            PropertyKind::ChoiceAlternative { group, .. } => Some(group),
            PropertyKind::Plain => None,
        }
    }

    pub fn is_optional(&self) -> bool {
        !self.nonoptional
    }

    /// Whether this property is a reference with known targets
    pub fn is_reference(&self) -> bool {
        !self.reference_to_names.is_empty()
    }

    /// Key under which this property is grouped among required properties
    pub fn group_key(&self) -> &str {
        self.choice_of_type().unwrap_or(&self.name)
    }

    /// Documentation line for renderers
    pub fn documentation(&self) -> String {
        let mut doc = match &self.enum_restriction {
            Some(restriction) => {
                let mut doc = self.formal.clone().unwrap_or_default();
                if let Some(codes) = &restriction.restricted_to {
                    append_line(&mut doc, &format!("Restricted to: {codes:?}"));
                }
                doc
            }
            None => self.short.clone().unwrap_or_default(),
        };
        if let Some(group) = self.choice_of_type() {
            append_line(&mut doc, &format!("One of `{group}{CHOICE_MARKER}`"));
        }
        doc
    }

    /// Class name a renderer should use for the value type
    pub fn desired_class_name(&self) -> &str {
        match &self.enum_restriction {
            Some(restriction) if restriction.is_codesystem_known => &restriction.name,
            Some(restriction) if restriction.restricted_to.is_some() => "Literal",
            _ => &self.class_name,
        }
    }

    /// Name used in collapsed views: the group name for choice alternatives
    pub fn nonexpanded_name(&self) -> &str {
        self.group_key()
    }

    /// Class name used in collapsed views.
    ///
    /// Choice alternatives have no single authoritative type, so renderers must
    /// supply one themselves.
    pub fn nonexpanded_class_name(&self) -> Option<&str> {
        match self.kind {
            PropertyKind::ChoiceAlternative { .. } => None,
            PropertyKind::Plain => Some(self.desired_class_name()),
        }
    }
}

fn append_line(doc: &mut String, line: &str) {
    if !doc.is_empty() {
        doc.push('\n');
    }
    doc.push_str(line);
}
