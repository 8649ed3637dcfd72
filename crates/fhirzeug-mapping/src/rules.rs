//! Table-driven mapping rules

use crate::json_class::JsonClass;
use crate::naming::{sanitize_identifier, upper_first, url_tail};
use crate::{Error, Result, TypeMapping};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, trace};

const DEFAULT_RULES: &str = include_str!("default_rules.yaml");

/// Mapping tables, as read from a rules file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingRules {
    /// Schema type code -> output class name
    pub class_map: IndexMap<String, String>,

    /// Reserved property names -> replacement identifier
    pub replace_map: IndexMap<String, String>,

    /// Output classes considered built in
    pub natives: IndexSet<String>,

    /// Output class name -> JSON representation
    pub json_map: IndexMap<String, JsonClass>,

    /// JSON representation of classes missing from `json_map`
    pub json_map_default: Option<JsonClass>,
}

impl MappingRules {
    /// Empty tables: every type maps to its capitalized code and encodes as an object
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules for FHIR built-in types
    pub fn fhir_defaults() -> Self {
        Self::load_from_yaml(DEFAULT_RULES).expect("embedded default rules are valid")
    }

    /// Load rules from a file, choosing the format from the extension
    pub fn load_from_file(path: &Path) -> Result<Self> {
        trace!("Loading mapping rules from file: {:?}", path);
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

    /// Load rules from a JSON string
    pub fn load_from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::InvalidFormat(format!("JSON parse error: {e}")))
    }

    /// Load rules from a YAML string
    pub fn load_from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::InvalidFormat(format!("YAML parse error: {e}")))
    }

    /// Layer `overrides` on top of these rules; override entries win
    pub fn merge(&mut self, overrides: Self) {
        debug!(
            class_map = overrides.class_map.len(),
            replace_map = overrides.replace_map.len(),
            natives = overrides.natives.len(),
            json_map = overrides.json_map.len(),
            "Merging mapping rule overrides"
        );
        self.class_map.extend(overrides.class_map);
        self.replace_map.extend(overrides.replace_map);
        self.natives.extend(overrides.natives);
        self.json_map.extend(overrides.json_map);
        if overrides.json_map_default.is_some() {
            self.json_map_default = overrides.json_map_default;
        }
    }

    /// Builder-style [`merge`](Self::merge)
    pub fn with_overrides(mut self, overrides: Self) -> Self {
        self.merge(overrides);
        self
    }
}

impl TypeMapping for MappingRules {
    fn safe_property_name(&self, name: &str) -> String {
        match self.replace_map.get(name) {
            Some(replacement) => replacement.clone(),
            None => sanitize_identifier(name),
        }
    }

    fn class_name_for_type(&self, type_name: &str) -> String {
        upper_first(type_name)
    }

    fn class_name_for_type_if_property(&self, type_name: &str) -> String {
        if let Some(mapped) = self.class_map.get(type_name) {
            return mapped.clone();
        }
        let class_name = self.class_name_for_type(type_name);
        self.class_map.get(&class_name).cloned().unwrap_or(class_name)
    }

    fn json_class_for_class_name(&self, class_name: &str) -> JsonClass {
        self.json_map
            .get(class_name)
            .copied()
            .unwrap_or_else(|| self.json_map_default.unwrap_or_default())
    }

    fn class_name_is_native(&self, class_name: &str) -> bool {
        self.natives.contains(class_name)
    }

    fn class_name_for_profile(&self, profile_url: &str) -> String {
        self.class_name_for_type(url_tail(profile_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_fhir_defaults_load() {
        let rules = MappingRules::fhir_defaults();
        assert_eq!(rules.class_map.get("boolean").map(String::as_str), Some("bool"));
        assert!(rules.natives.contains("str"));
        assert_eq!(rules.json_map_default, Some(JsonClass::Dict));
    }

    #[test]
    fn test_class_name_for_type_if_property() {
        let rules = MappingRules::fhir_defaults();
        assert_eq!(rules.class_name_for_type_if_property("string"), "str");
        assert_eq!(rules.class_name_for_type_if_property("dateTime"), "FHIRDateTime");
        assert_eq!(rules.class_name_for_type_if_property("HumanName"), "HumanName");
        assert_eq!(rules.class_name_for_type_if_property("codeableConcept"), "CodeableConcept");
    }

    #[test]
    fn test_json_class_and_natives() {
        let rules = MappingRules::fhir_defaults();
        assert_eq!(rules.json_class_for_class_name("bool"), JsonClass::Bool);
        assert_eq!(rules.json_class_for_class_name("FHIRDate"), JsonClass::Str);
        assert_eq!(rules.json_class_for_class_name("HumanName"), JsonClass::Dict);
        assert!(rules.class_name_is_native("FHIRDateTime"));
        assert!(!rules.class_name_is_native("HumanName"));
    }

    #[test]
    fn test_safe_property_name() {
        let rules = MappingRules::fhir_defaults();
        assert_eq!(rules.safe_property_name("class"), "class_");
        assert_eq!(rules.safe_property_name("import"), "import_");
        assert_eq!(rules.safe_property_name("valueString"), "valueString");
        assert_eq!(rules.safe_property_name("some-name"), "some_name");
    }

    #[test]
    fn test_class_name_for_profile() {
        let rules = MappingRules::new();
        assert_eq!(
            rules.class_name_for_profile("http://hl7.org/fhir/StructureDefinition/Patient"),
            "Patient"
        );
        assert_eq!(
            rules.class_name_for_profile("http://hl7.org/fhir/StructureDefinition/vitalsigns"),
            "Vitalsigns"
        );
    }

    #[test]
    fn test_empty_rules_default_to_dict() {
        let rules = MappingRules::new();
        assert_eq!(rules.class_name_for_type_if_property("string"), "String");
        assert_eq!(rules.json_class_for_class_name("String"), JsonClass::Dict);
        assert!(!rules.class_name_is_native("String"));
    }

    #[test]
    fn test_merge_overrides_win() {
        let overrides = MappingRules::load_from_yaml(
            "class_map:\n  decimal: Decimal\nnatives: [Decimal]\njson_map:\n  Decimal: float\n",
        )
        .unwrap();
        let rules = MappingRules::fhir_defaults().with_overrides(overrides);

        assert_eq!(rules.class_name_for_type_if_property("decimal"), "Decimal");
        assert!(rules.class_name_is_native("Decimal"));
        assert_eq!(rules.json_class_for_class_name("Decimal"), JsonClass::Float);
        // untouched entries survive
        assert_eq!(rules.class_name_for_type_if_property("boolean"), "bool");
        assert_eq!(rules.json_map_default, Some(JsonClass::Dict));
    }

    #[test]
    fn test_load_from_json_invalid() {
        let result = MappingRules::load_from_json("{\"json_map\": {\"x\": \"list\"}}");
        assert!(matches!(result, Err(Error::InvalidFormat(_))));
    }

    #[test]
    fn test_load_from_file_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(br#"{"natives": ["Money"]}"#).unwrap();
        let rules = MappingRules::load_from_file(file.path()).unwrap();
        assert!(rules.class_name_is_native("Money"));
        assert!(rules.class_map.is_empty());
    }
}
