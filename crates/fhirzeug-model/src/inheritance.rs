//! Superclass linking and cycle detection

use crate::registry::ClassRegistry;
use crate::{Error, Result};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// Handle of a class inside the [`ClassRegistry`] that issued it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ClassId(pub(crate) usize);

impl ClassId {
    /// Registration index
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result of linking superclasses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkReport {
    /// Classes whose superclass was found
    pub linked: usize,
    /// `(class, superclass name)` pairs with no registered superclass
    pub unresolved: Vec<(String, String)>,
}

impl ClassRegistry {
    /// Resolve every class's superclass name to the registered class.
    ///
    /// Superclass names with no registered class are reported and leave the
    /// class without a superclass. Fails if the links would form a cycle.
    pub fn link_superclasses(&mut self) -> Result<LinkReport> {
        let mut report = LinkReport::default();
        let mut links: Vec<Option<ClassId>> = Vec::with_capacity(self.len());

        for view in self.iter() {
            let Some(superclass_name) = view.superclass_name.as_deref() else {
                links.push(None);
                continue;
            };
            let superclass = self.with_name(superclass_name);
            if superclass.is_none() {
                warn!(
                    class = %view.name,
                    superclass = %superclass_name,
                    "Superclass is not a known class, leaving class unlinked"
                );
                report
                    .unresolved
                    .push((view.name.clone(), superclass_name.to_string()));
            }
            links.push(superclass);
        }

        if let Some(cycle) = find_cycle(&links) {
            let chain = cycle
                .into_iter()
                .filter_map(|id| self.get(id).map(|class| class.name.clone()))
                .collect();
            return Err(Error::CircularInheritance { chain });
        }

        let links = links
            .into_iter()
            .enumerate()
            .map(|(index, superclass)| (ClassId(index), superclass));
        for (id, superclass) in links {
            if let Some(class) = self.get_mut(id) {
                class.superclass = superclass;
                if superclass.is_some() {
                    report.linked += 1;
                }
            }
        }
        self.unresolved_superclasses.clone_from(&report.unresolved);

        debug!(
            linked = report.linked,
            unresolved = report.unresolved.len(),
            "Linked superclasses"
        );
        Ok(report)
    }
}

/// Walk every superclass chain and return the first loop found, starting
/// and ending at the class where it closes.
fn find_cycle(links: &[Option<ClassId>]) -> Option<Vec<ClassId>> {
    // Classes whose chain is known to end
    let mut acyclic = vec![false; links.len()];

    for start in 0..links.len() {
        let mut chain: Vec<ClassId> = Vec::new();
        let mut current = Some(ClassId(start));

        while let Some(id) = current {
            if acyclic[id.0] {
                break;
            }
            if let Some(pos) = chain.iter().position(|&seen| seen == id) {
                let mut cycle = chain.split_off(pos);
                cycle.push(id);
                return Some(cycle);
            }
            chain.push(id);
            current = links[id.0];
        }

        for id in chain {
            acyclic[id.0] = true;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use fhirzeug_ir::{ClassDeclaration, Element};

    fn declare(registry: &mut ClassRegistry, name: &str, superclass: Option<&str>) -> ClassId {
        let mut declaration = ClassDeclaration::new(name);
        if let Some(superclass) = superclass {
            declaration = declaration.with_superclass(superclass);
        }
        let element = Element::new(name).declaring_class(declaration);
        registry.for_class(&element).unwrap().0
    }

    #[test]
    fn test_link_superclasses() {
        let mut registry = ClassRegistry::new();
        let patient = declare(&mut registry, "Patient", Some("DomainResource"));
        let domain = declare(&mut registry, "DomainResource", Some("Resource"));
        let resource = declare(&mut registry, "Resource", None);

        let report = registry.link_superclasses().unwrap();
        assert_eq!(report.linked, 2);
        assert!(report.unresolved.is_empty());

        assert_eq!(registry.get(patient).unwrap().superclass_id(), Some(domain));
        assert_eq!(registry.get(domain).unwrap().superclass_id(), Some(resource));
        assert_eq!(registry.get(resource).unwrap().superclass_id(), None);
    }

    #[test]
    fn test_link_reports_unresolved_superclass() {
        let mut registry = ClassRegistry::new();
        let patient = declare(&mut registry, "Patient", Some("DomainResource"));

        let report = registry.link_superclasses().unwrap();
        assert_eq!(report.linked, 0);
        assert_eq!(
            report.unresolved,
            vec![("Patient".to_string(), "DomainResource".to_string())]
        );
        assert_eq!(registry.unresolved_superclasses(), report.unresolved.as_slice());
        assert_eq!(registry.get(patient).unwrap().superclass_id(), None);
    }

    #[test]
    fn test_link_rejects_cycles() {
        let mut registry = ClassRegistry::new();
        declare(&mut registry, "A", Some("B"));
        declare(&mut registry, "B", Some("A"));

        let err = registry.link_superclasses().unwrap_err();
        match err {
            Error::CircularInheritance { chain } => assert_eq!(chain, vec!["A", "B", "A"]),
            e => panic!("Expected CircularInheritance error, got {e:?}"),
        }
    }

    #[test]
    fn test_link_rejects_self_superclass() {
        let mut registry = ClassRegistry::new();
        declare(&mut registry, "Element", Some("Element"));
        let err = registry.link_superclasses().unwrap_err();
        assert!(
            matches!(err, Error::CircularInheritance { ref chain } if chain == &["Element", "Element"])
        );
    }

    #[test]
    fn test_link_reports_cycle_behind_acyclic_prefix() {
        let mut registry = ClassRegistry::new();
        declare(&mut registry, "Resource", None);
        declare(&mut registry, "Patient", Some("A"));
        declare(&mut registry, "A", Some("B"));
        declare(&mut registry, "B", Some("C"));
        declare(&mut registry, "C", Some("A"));

        let err = registry.link_superclasses().unwrap_err();
        match err {
            Error::CircularInheritance { chain } => assert_eq!(chain, vec!["A", "B", "C", "A"]),
            e => panic!("Expected CircularInheritance error, got {e:?}"),
        }
    }

    #[test]
    fn test_link_shared_ancestors_are_not_cycles() {
        let mut registry = ClassRegistry::new();
        declare(&mut registry, "Patient", Some("DomainResource"));
        declare(&mut registry, "Observation", Some("DomainResource"));
        declare(&mut registry, "DomainResource", Some("Resource"));
        declare(&mut registry, "Resource", None);

        let report = registry.link_superclasses().unwrap();
        assert_eq!(report.linked, 3);
    }

    #[test]
    fn test_link_is_repeatable() {
        let mut registry = ClassRegistry::new();
        declare(&mut registry, "Patient", Some("DomainResource"));
        declare(&mut registry, "DomainResource", None);
        let first = registry.link_superclasses().unwrap();
        let second = registry.link_superclasses().unwrap();
        assert_eq!(first, second);
    }
}
