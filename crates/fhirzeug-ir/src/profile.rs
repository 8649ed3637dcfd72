//! Profile documents

use crate::element::Element;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, trace};

/// Flattened element list of one profile, in document order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileDocument {
    /// Canonical URL of the profile
    #[serde(default)]
    pub url: Option<String>,

    /// Human-readable name, only used in logs
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub elements: Vec<Element>,
}

/// All profiles that take part in one generation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileSet {
    #[serde(default)]
    pub profiles: Vec<ProfileDocument>,
}

impl ProfileDocument {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            name: None,
            elements: Vec::new(),
        }
    }

    /// Append an element, stamping it with this profile's URL when it has none
    pub fn push(&mut self, mut element: Element) -> &mut Self {
        if element.profile_url.is_none() {
            element.profile_url.clone_from(&self.url);
        }
        self.elements.push(element);
        self
    }

    pub fn with_element(mut self, element: Element) -> Self {
        self.push(element);
        self
    }

    /// Copy the document URL onto every element that has none
    fn stamp_urls(&mut self) {
        for element in &mut self.elements {
            if element.profile_url.is_none() {
                element.profile_url.clone_from(&self.url);
            }
        }
    }
}

impl ProfileSet {
    pub fn new(profiles: Vec<ProfileDocument>) -> Self {
        let mut set = Self { profiles };
        set.normalize();
        set
    }

    /// Total number of elements across all profiles
    pub fn element_count(&self) -> usize {
        self.profiles.iter().map(|p| p.elements.len()).sum()
    }

    /// Load a profile set, choosing the format from the file extension
    pub fn load_from_file(path: &Path) -> Result<Self> {
        trace!("Loading profiles from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;

        if path
            .extension()
            .is_some_and(|e| e == "yaml" || e == "yml")
        {
            Self::load_from_yaml(&content)
        } else {
            Self::load_from_json(&content)
        }
    }

    /// Load a profile set from a JSON string
    pub fn load_from_json(json: &str) -> Result<Self> {
        let mut set: Self =
            serde_json::from_str(json).map_err(|e| Error::parse("JSON", e.to_string()))?;
        set.normalize();
        debug!(
            profiles = set.profiles.len(),
            elements = set.element_count(),
            "Loaded profile set"
        );
        Ok(set)
    }

    /// Load a profile set from a YAML string
    pub fn load_from_yaml(yaml: &str) -> Result<Self> {
        let mut set: Self =
            serde_yaml::from_str(yaml).map_err(|e| Error::parse("YAML", e.to_string()))?;
        set.normalize();
        debug!(
            profiles = set.profiles.len(),
            elements = set.element_count(),
            "Loaded profile set"
        );
        Ok(set)
    }

    fn normalize(&mut self) {
        for profile in &mut self.profiles {
            profile.stamp_urls();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    const PATIENT_YAML: &str = r#"
profiles:
  - url: http://hl7.org/fhir/StructureDefinition/Patient
    elements:
      - path: Patient
        class:
          name: Patient
          superclass: DomainResource
          resource_type: Patient
      - path: Patient.name
        owner: Patient
        types: [{code: HumanName}]
        min: 0
        max: "*"
"#;

    #[test]
    fn test_load_from_yaml_stamps_urls() {
        let set = ProfileSet::load_from_yaml(PATIENT_YAML).unwrap();
        assert_eq!(set.profiles.len(), 1);
        assert_eq!(set.element_count(), 2);

        let name = &set.profiles[0].elements[1];
        assert_eq!(
            name.profile_url.as_deref(),
            Some("http://hl7.org/fhir/StructureDefinition/Patient")
        );
        assert!(name.is_unbounded());
        let class = set.profiles[0].elements[0].class.as_ref().unwrap();
        assert_eq!(class.superclass_name.as_deref(), Some("DomainResource"));
    }

    #[test]
    fn test_load_from_json() {
        let json = r#"{"profiles": [{"url": "u", "elements": [{"path": "A", "class": {"name": "A"}}]}]}"#;
        let set = ProfileSet::load_from_json(json).unwrap();
        assert_eq!(set.profiles[0].elements[0].profile_url.as_deref(), Some("u"));
    }

    #[test]
    fn test_load_from_json_invalid() {
        let err = ProfileSet::load_from_json("not json").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_load_from_file_by_extension() {
        let mut file = Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(PATIENT_YAML.as_bytes()).unwrap();
        let set = ProfileSet::load_from_file(file.path()).unwrap();
        assert_eq!(set.element_count(), 2);
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = ProfileSet::load_from_file(Path::new("does/not/exist.json")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_push_keeps_explicit_url() {
        let mut doc = ProfileDocument::new("base");
        doc.push(Element::new("A").in_profile("other"));
        doc.push(Element::new("B"));
        assert_eq!(doc.elements[0].profile_url.as_deref(), Some("other"));
        assert_eq!(doc.elements[1].profile_url.as_deref(), Some("base"));
    }
}
