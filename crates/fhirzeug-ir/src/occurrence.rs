//! Flattened `(element, type)` pairs

use crate::element::{Element, ElementType};

/// Placeholder used for property elements that declare no type at all
static UNTYPED: ElementType = ElementType {
    code: None,
    profile: None,
};

/// One concrete appearance of a property, resolved to a single chosen type
#[derive(Debug, Clone, Copy)]
pub struct Occurrence<'a> {
    pub element: &'a Element,
    pub element_type: &'a ElementType,
    /// Explicit type name overriding the type's own code
    pub type_name: Option<&'a str>,
}

impl<'a> Occurrence<'a> {
    pub fn new(element: &'a Element, element_type: &'a ElementType) -> Self {
        Self {
            element,
            element_type,
            type_name: None,
        }
    }

    /// Force the type name instead of using the type's code
    pub fn with_type_name(mut self, type_name: &'a str) -> Self {
        self.type_name = Some(type_name);
        self
    }

    /// The explicit type name if given, otherwise the type's declared code
    pub fn resolved_type_name(&self) -> Option<&'a str> {
        self.type_name
            .filter(|name| !name.is_empty())
            .or(self.element_type.code.as_deref())
            .filter(|name| !name.is_empty())
    }

    /// Class this occurrence contributes to
    pub fn owner(&self) -> Option<&'a str> {
        self.element.owner.as_deref()
    }
}

impl Element {
    /// One occurrence per allowed type, in declaration order.
    ///
    /// An element without types still yields a single untyped occurrence so
    /// the resolver can reject it with the element's path.
    pub fn occurrences(&self) -> impl Iterator<Item = Occurrence<'_>> {
        let untyped = self.types.is_empty().then(|| Occurrence::new(self, &UNTYPED));
        self.types
            .iter()
            .map(move |t| Occurrence::new(self, t))
            .chain(untyped)
    }
}
