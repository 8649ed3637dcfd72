//! Run orchestration
//!
//! This module provides the [`Pipeline`] that turns a [`ProfileSet`] into a
//! resolved class model.

use std::path::Path;

use fhirzeug_ir::{Element, ProfileDocument, ProfileSet};
use fhirzeug_mapping::{MappingRules, TypeMapping};
use fhirzeug_model::{AddOutcome, ClassRegistry, ClassView, Property};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::dump::ModelDump;
use crate::report::{Diagnostic, DiagnosticReport};
use crate::{Error, Result, StrictnessLevel};

/// Configuration for the pipeline
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Strictness level for data-quality warnings
    pub strictness: StrictnessLevel,
}

impl PipelineConfig {
    pub fn with_strictness(mut self, strictness: StrictnessLevel) -> Self {
        self.strictness = strictness;
        self
    }
}

/// Counters for one run
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Profiles walked
    pub profiles: usize,
    /// Elements walked across all profiles
    pub elements: usize,
    /// Property occurrences resolved
    pub occurrences: usize,
    /// Classes registered for the first time
    pub classes_created: usize,
    /// Properties appended to a class
    pub properties_added: usize,
    /// Reference properties fused into an existing one
    pub references_merged: usize,
    /// Same-named properties dropped
    pub collisions: usize,
}

/// Output of a successful run
#[derive(Debug)]
pub struct ResolvedModel {
    pub registry: ClassRegistry,
    pub report: DiagnosticReport,
    pub stats: RunStats,
}

impl ResolvedModel {
    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    pub fn report(&self) -> &DiagnosticReport {
        &self.report
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Inheritance-aware view of a class by name
    pub fn class(&self, name: &str) -> Option<ClassView<'_>> {
        self.registry.view_named(name)
    }

    /// Serializable snapshot of the whole model
    pub fn to_dump(&self) -> ModelDump {
        ModelDump::from_model(self)
    }
}

/// Main pipeline for resolving profiles into a class model
#[derive(Debug)]
pub struct Pipeline<M = MappingRules> {
    config: PipelineConfig,
    mapping: M,
}

impl Pipeline<MappingRules> {
    /// Create a pipeline with the built-in FHIR mapping rules
    pub fn with_defaults() -> Self {
        Self::new(MappingRules::fhir_defaults())
    }

    /// Read a profile set from a JSON or YAML file
    pub fn load_profiles<P: AsRef<Path>>(path: P) -> Result<ProfileSet> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::pipeline(
                path.display().to_string(),
                "Profile file not found",
            ));
        }
        Ok(ProfileSet::load_from_file(path)?)
    }
}

impl<M: TypeMapping> Pipeline<M> {
    /// Create a new pipeline around the given type mapping
    pub fn new(mapping: M) -> Self {
        Self {
            config: PipelineConfig::default(),
            mapping,
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn mapping(&self) -> &M {
        &self.mapping
    }

    /// Resolve every profile into a fresh class registry.
    ///
    /// Malformed input aborts the run. Data-quality issues are collected in
    /// the returned report, and fail the run only under
    /// [`StrictnessLevel::Strict`].
    pub fn run(&self, profiles: &ProfileSet) -> Result<ResolvedModel> {
        info!(
            profiles = profiles.profiles.len(),
            elements = profiles.element_count(),
            "Starting resolution run"
        );

        let mut registry = ClassRegistry::new();
        let mut stats = RunStats::default();

        // Classes first, so a profile may extend a class declared by a later one
        for profile in &profiles.profiles {
            self.declare_classes(&mut registry, profile, &mut stats)?;
        }
        for profile in &profiles.profiles {
            self.process_profile(&mut registry, profile, &mut stats)?;
        }

        let link = registry.link_superclasses()?;
        debug!(
            linked = link.linked,
            unresolved = link.unresolved.len(),
            "Linked superclasses"
        );

        let mut report = DiagnosticReport::collect(registry.collisions(), &link);
        for view in registry.iter().filter(|v| !v.should_write()) {
            report.push(Diagnostic::not_renderable(&view.name));
        }
        stats.collisions = registry.collisions().len();

        for diagnostic in report.warnings() {
            warn!(code = diagnostic.code, class = %diagnostic.class_name, "{}", diagnostic.message);
        }

        if self.config.strictness.fails_on_warnings() && report.has_warnings() {
            return Err(Error::Policy(format!(
                "{} warning(s) recorded under strict mode",
                report.warnings().count()
            )));
        }

        info!(
            classes = registry.len(),
            properties = stats.properties_added,
            warnings = report.warnings().count(),
            "Resolution run finished"
        );

        Ok(ResolvedModel {
            registry,
            report,
            stats,
        })
    }

    fn declare_classes(
        &self,
        registry: &mut ClassRegistry,
        profile: &ProfileDocument,
        stats: &mut RunStats,
    ) -> Result<()> {
        for element in profile.elements.iter().filter(|e| e.represents_class()) {
            let (id, created) = registry.for_class(element)?;
            if created {
                stats.classes_created += 1;
            }
            if element.profile_url.is_none() {
                registry.add_url(id, profile.url.as_deref())?;
            }
        }
        Ok(())
    }

    fn process_profile(
        &self,
        registry: &mut ClassRegistry,
        profile: &ProfileDocument,
        stats: &mut RunStats,
    ) -> Result<()> {
        trace!(
            url = ?profile.url,
            name = ?profile.name,
            elements = profile.elements.len(),
            "Processing profile"
        );
        stats.profiles += 1;

        for element in &profile.elements {
            stats.elements += 1;
            if element.owner.is_some() {
                self.process_property(registry, profile, element, stats)?;
            }
        }
        Ok(())
    }

    fn process_property(
        &self,
        registry: &mut ClassRegistry,
        profile: &ProfileDocument,
        element: &Element,
        stats: &mut RunStats,
    ) -> Result<()> {
        let owner = element.owner.as_deref().unwrap_or_default();
        let owner_id = registry.with_name(owner).ok_or_else(|| {
            Error::pipeline(
                &element.path,
                format!("Owner class \"{owner}\" is not declared by any profile"),
            )
        })?;

        // A nested class is typed by its own class name, not by its base type
        let class_type = element.name_if_class();

        for occurrence in element.occurrences() {
            let occurrence = match class_type {
                Some(name) => occurrence.with_type_name(name),
                None => occurrence,
            };
            stats.occurrences += 1;

            let mut prop = Property::resolve(&occurrence, &self.mapping)?;
            if prop.profile_url.is_none() {
                prop.profile_url = profile.url.clone();
            }
            match registry.add_property(owner_id, prop)? {
                AddOutcome::Added => stats.properties_added += 1,
                AddOutcome::ReferencesMerged { .. } => stats.references_merged += 1,
                AddOutcome::Rejected(_) => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fhirzeug_ir::{ClassDeclaration, ElementType, MaxCardinality};

    fn patient_profile() -> ProfileDocument {
        ProfileDocument::new("http://hl7.org/fhir/StructureDefinition/Patient")
            .with_element(
                Element::new("Patient")
                    .declaring_class(ClassDeclaration::new("Patient").with_superclass("DomainResource")),
            )
            .with_element(
                Element::new("Patient.active")
                    .owned_by("Patient")
                    .with_type(ElementType::code("boolean"))
                    .with_cardinality(0, MaxCardinality::Bounded(1)),
            )
            .with_element(
                Element::new("Patient.contact")
                    .owned_by("Patient")
                    .declaring_class(ClassDeclaration::new("PatientContact").with_superclass("BackboneElement"))
                    .with_type(ElementType::code("BackboneElement"))
                    .with_cardinality(0, MaxCardinality::Unbounded),
            )
    }

    #[test]
    fn test_run_counts_and_nested_class_type() {
        let set = ProfileSet::new(vec![patient_profile()]);
        let model = Pipeline::with_defaults().run(&set).unwrap();

        assert_eq!(model.stats().profiles, 1);
        assert_eq!(model.stats().elements, 3);
        assert_eq!(model.stats().classes_created, 2);
        assert_eq!(model.stats().properties_added, 2);

        let patient = model.class("Patient").unwrap();
        let contact = patient.property("contact").unwrap();
        assert_eq!(contact.class_name, "PatientContact");
        assert!(contact.is_array);

        let hidden: Vec<_> = model
            .report()
            .with_code(crate::report::NOT_RENDERABLE)
            .collect();
        assert_eq!(hidden.len(), 1);
        assert_eq!(hidden[0].class_name, "PatientContact");
    }

    #[test]
    fn test_unknown_owner_is_fatal() {
        let profile = ProfileDocument::new("u").with_element(
            Element::new("Ghost.name")
                .owned_by("Ghost")
                .with_type(ElementType::code("string")),
        );
        let err = Pipeline::with_defaults()
            .run(&ProfileSet::new(vec![profile]))
            .unwrap_err();
        assert!(matches!(err, Error::Pipeline { ref path, .. } if path == "Ghost.name"));
    }

    fn gender(url: &str, code: &str) -> ProfileDocument {
        ProfileDocument::new(url).with_element(
            Element::new("Patient.gender")
                .owned_by("Patient")
                .with_type(ElementType::code(code)),
        )
    }

    #[test]
    fn test_profile_order_does_not_matter() {
        let declaring = patient_profile().with_element(
            Element::new("Patient.gender")
                .owned_by("Patient")
                .with_type(ElementType::code("code")),
        );
        let extending = gender("http://example.org/us-core-patient", "string");

        let forward = ProfileSet::new(vec![declaring.clone(), extending.clone()]);
        let backward = ProfileSet::new(vec![extending, declaring]);
        let forward = Pipeline::with_defaults().run(&forward).unwrap();
        let backward = Pipeline::with_defaults().run(&backward).unwrap();

        let urls = vec![
            "http://example.org/us-core-patient",
            "http://hl7.org/fhir/StructureDefinition/Patient",
        ];
        assert_eq!(forward.class("Patient").unwrap().urls(), urls);
        assert_eq!(backward.class("Patient").unwrap().urls(), urls);
        assert_eq!(forward.stats().classes_created, 2);
        assert_eq!(backward.stats().classes_created, 2);
        assert_eq!(forward.stats().collisions, 1);
        assert_eq!(backward.stats().collisions, 1);
    }

    #[test]
    fn test_property_only_profile_is_named_in_collision() {
        let declaring = patient_profile().with_element(
            Element::new("Patient.gender")
                .owned_by("Patient")
                .with_type(ElementType::code("code")),
        );
        let set = ProfileSet::new(vec![
            declaring,
            gender("http://example.org/us-core-patient", "string"),
        ]);
        let model = Pipeline::with_defaults().run(&set).unwrap();

        let collision = &model.registry().collisions()[0];
        assert_eq!(
            collision.dropped_url.as_deref(),
            Some("http://example.org/us-core-patient")
        );
        assert!(
            collision
                .urls
                .contains(&"http://example.org/us-core-patient".to_string())
        );
        let diagnostic = model
            .report()
            .with_code(crate::report::NAME_COLLISION)
            .next()
            .unwrap();
        assert!(diagnostic.message.contains("from http://example.org/us-core-patient"));
    }

    #[test]
    fn test_hand_built_profiles_fall_back_to_profile_url() {
        let profile = ProfileDocument {
            url: Some("http://example.org/Patient".to_string()),
            name: None,
            elements: vec![
                Element::new("Patient").declaring_class(ClassDeclaration::new("Patient")),
                Element::new("Patient.active")
                    .owned_by("Patient")
                    .with_type(ElementType::code("boolean")),
            ],
        };
        let model = Pipeline::with_defaults()
            .run(&ProfileSet { profiles: vec![profile] })
            .unwrap();

        let patient = model.class("Patient").unwrap();
        assert_eq!(patient.urls(), vec!["http://example.org/Patient"]);
        assert_eq!(
            patient.property("active").unwrap().profile_url.as_deref(),
            Some("http://example.org/Patient")
        );
    }

    #[test]
    fn test_strict_mode_fails_on_unresolved_superclass() {
        let set = ProfileSet::new(vec![patient_profile()]);

        let permissive = Pipeline::with_defaults().run(&set).unwrap();
        assert!(permissive.report().has_warnings());

        let strict = Pipeline::with_defaults()
            .with_config(PipelineConfig::default().with_strictness(StrictnessLevel::Strict))
            .run(&set);
        assert!(matches!(strict, Err(Error::Policy(_))));
    }

    #[test]
    fn test_missing_profile_file() {
        let err = Pipeline::load_profiles("/nonexistent/profiles.yaml").unwrap_err();
        assert!(matches!(err, Error::Pipeline { .. }));
    }
}
