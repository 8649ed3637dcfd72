//! Element records as emitted by the schema parser

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Literal marker carried by choice elements, e.g. `value[x]`
pub const CHOICE_MARKER: &str = "[x]";

/// One element of a profile's definition tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Dotted schema path, e.g. `Patient.deceased[x]`
    pub path: String,

    /// Declared property name; falls back to the last path segment
    #[serde(default)]
    pub prop_name: Option<String>,

    /// Name of the immediate schema-level parent
    #[serde(default)]
    pub parent_name: Option<String>,

    /// Name of the class this element contributes a property to
    #[serde(default)]
    pub owner: Option<String>,

    /// Present when the element becomes a class of its own
    #[serde(default)]
    pub class: Option<ClassDeclaration>,

    /// Allowed types, one occurrence is produced per entry
    #[serde(default)]
    pub types: Vec<ElementType>,

    /// Minimum cardinality
    #[serde(default, rename = "min")]
    pub n_min: Option<u32>,

    /// Maximum cardinality
    #[serde(default, rename = "max")]
    pub n_max: Option<MaxCardinality>,

    #[serde(default)]
    pub is_summary: bool,

    /// The summary flag disagrees with the optionality implied by `min`
    #[serde(default)]
    pub summary_n_min_conflict: bool,

    /// Restriction set for `code` elements
    #[serde(default, rename = "enum")]
    pub enum_restriction: Option<EnumRestriction>,

    #[serde(default)]
    pub short: Option<String>,

    #[serde(default)]
    pub formal: Option<String>,

    #[serde(default)]
    pub representation: Option<Vec<String>>,

    /// URL of the profile this element was read from
    #[serde(default)]
    pub profile_url: Option<String>,
}

/// Class identity carried by elements that represent their own class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDeclaration {
    pub name: String,

    #[serde(default, rename = "superclass")]
    pub superclass_name: Option<String>,

    /// Resource discriminator, absent for non-resource elements
    #[serde(default)]
    pub resource_type: Option<String>,
}

/// One allowed type of an element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementType {
    /// Type code, e.g. `string` or `Reference`
    #[serde(default)]
    pub code: Option<String>,

    /// Target profile URL for constrained references
    #[serde(default, alias = "target_profile")]
    pub profile: Option<String>,
}

/// Restriction set of a code element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumRestriction {
    pub name: String,

    #[serde(default)]
    pub restricted_to: Option<Vec<String>>,

    /// Whether the code system is known well enough to emit a named enum
    #[serde(default)]
    pub is_codesystem_known: bool,
}

/// Upper bound of an element's cardinality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMax", into = "String")]
pub enum MaxCardinality {
    Bounded(u32),
    /// `*`
    Unbounded,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMax {
    Text(String),
    Count(u32),
}

impl TryFrom<RawMax> for MaxCardinality {
    type Error = Error;

    fn try_from(raw: RawMax) -> Result<Self> {
        match raw {
            RawMax::Text(text) => text.parse(),
            RawMax::Count(n) => Ok(Self::Bounded(n)),
        }
    }
}

impl FromStr for MaxCardinality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed == "*" {
            return Ok(Self::Unbounded);
        }
        trimmed
            .parse::<u32>()
            .map(Self::Bounded)
            .map_err(|e| Error::invalid_cardinality(s, e.to_string()))
    }
}

impl fmt::Display for MaxCardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bounded(n) => write!(f, "{n}"),
            Self::Unbounded => write!(f, "*"),
        }
    }
}

impl From<MaxCardinality> for String {
    fn from(max: MaxCardinality) -> Self {
        max.to_string()
    }
}

impl MaxCardinality {
    /// Whether more than one value may be given
    pub fn is_unbounded(self) -> bool {
        matches!(self, Self::Unbounded)
    }
}

impl Element {
    /// Create an element at the given path
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Declared property name, or the last segment of the path
    pub fn prop_name(&self) -> &str {
        match &self.prop_name {
            Some(name) => name,
            None => self.path.rsplit('.').next().unwrap_or(&self.path),
        }
    }

    /// Whether the declared name carries the choice marker
    pub fn is_choice(&self) -> bool {
        self.prop_name().contains(CHOICE_MARKER)
    }

    /// Whether this element represents its own class
    pub fn represents_class(&self) -> bool {
        self.class.is_some()
    }

    /// Class name used when this element represents a class
    pub fn name_if_class(&self) -> Option<&str> {
        self.class.as_ref().map(|c| c.name.as_str())
    }

    /// Whether the declared minimum cardinality makes the element required
    pub fn is_required(&self) -> bool {
        self.n_min.is_some_and(|n| n > 0)
    }

    /// Whether the declared maximum cardinality is `*`
    pub fn is_unbounded(&self) -> bool {
        self.n_max.is_some_and(MaxCardinality::is_unbounded)
    }

    pub fn with_prop_name(mut self, name: impl Into<String>) -> Self {
        self.prop_name = Some(name.into());
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_name = Some(parent.into());
        self
    }

    /// Route this element's occurrences into the named class
    pub fn owned_by(mut self, class_name: impl Into<String>) -> Self {
        self.owner = Some(class_name.into());
        self
    }

    /// Mark this element as representing its own class
    pub fn declaring_class(mut self, declaration: ClassDeclaration) -> Self {
        self.class = Some(declaration);
        self
    }

    pub fn with_type(mut self, element_type: ElementType) -> Self {
        self.types.push(element_type);
        self
    }

    /// Set both cardinality bounds
    pub fn with_cardinality(mut self, min: u32, max: MaxCardinality) -> Self {
        self.n_min = Some(min);
        self.n_max = Some(max);
        self
    }

    pub fn summary(mut self, is_summary: bool) -> Self {
        self.is_summary = is_summary;
        self
    }

    pub fn with_enum(mut self, restriction: EnumRestriction) -> Self {
        self.enum_restriction = Some(restriction);
        self
    }

    pub fn with_short(mut self, short: impl Into<String>) -> Self {
        self.short = Some(short.into());
        self
    }

    pub fn with_formal(mut self, formal: impl Into<String>) -> Self {
        self.formal = Some(formal.into());
        self
    }

    pub fn in_profile(mut self, url: impl Into<String>) -> Self {
        self.profile_url = Some(url.into());
        self
    }
}

impl ClassDeclaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            superclass_name: None,
            resource_type: None,
        }
    }

    pub fn with_superclass(mut self, superclass: impl Into<String>) -> Self {
        self.superclass_name = Some(superclass.into());
        self
    }

    pub fn with_resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }
}

impl ElementType {
    /// Create a type with the given code
    pub fn code(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            profile: None,
        }
    }

    /// Create a reference type constrained to the given target profile
    pub fn reference_to(profile: impl Into<String>) -> Self {
        Self {
            code: Some("Reference".to_string()),
            profile: Some(profile.into()),
        }
    }
}

impl EnumRestriction {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            restricted_to: None,
            is_codesystem_known: false,
        }
    }

    pub fn restricted_to(mut self, codes: Vec<String>) -> Self {
        self.restricted_to = Some(codes);
        self
    }

    pub fn known(mut self, known: bool) -> Self {
        self.is_codesystem_known = known;
        self
    }
}
