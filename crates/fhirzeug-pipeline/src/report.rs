//! Data-quality diagnostics collected during a run

use fhirzeug_model::{LinkReport, NameCollision};
use serde::Serialize;
use std::fmt;

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Issue in the source schema, the run continued
    Warning,
    /// Informational only
    Info,
}

/// One reported issue, with enough context to fix the source schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: &'static str,
    pub class_name: String,
    pub property_name: Option<String>,
    pub urls: Vec<String>,
    pub message: String,
}

/// Code for a non-reference property declared twice on one class
pub const NAME_COLLISION: &str = "PROPERTY_NAME_COLLISION";
/// Code for a superclass name that matches no class
pub const UNRESOLVED_SUPERCLASS: &str = "UNRESOLVED_SUPERCLASS";
/// Code for a class with neither superclass nor properties
pub const NOT_RENDERABLE: &str = "NOT_RENDERABLE";

impl Diagnostic {
    pub fn from_collision(collision: &NameCollision) -> Self {
        let mut message = format!(
            "Already have property \"{}\" on \"{}\", which is only allowed for references; kept {}, dropped {}",
            collision.property_name, collision.class_name, collision.kept_path, collision.dropped_path
        );
        if let Some(url) = &collision.dropped_url {
            message.push_str(&format!(" from {url}"));
        }
        if collision.cardinality_conflict {
            message.push_str(" (declarations disagree on optionality)");
        }
        Self {
            severity: Severity::Warning,
            code: NAME_COLLISION,
            class_name: collision.class_name.clone(),
            property_name: Some(collision.property_name.clone()),
            urls: collision.urls.clone(),
            message,
        }
    }

    pub fn unresolved_superclass(class_name: &str, superclass_name: &str) -> Self {
        Self {
            severity: Severity::Warning,
            code: UNRESOLVED_SUPERCLASS,
            class_name: class_name.to_string(),
            property_name: None,
            urls: Vec::new(),
            message: format!(
                "Superclass \"{superclass_name}\" of \"{class_name}\" is not a known class"
            ),
        }
    }

    pub fn not_renderable(class_name: &str) -> Self {
        Self {
            severity: Severity::Info,
            code: NOT_RENDERABLE,
            class_name: class_name.to_string(),
            property_name: None,
            urls: Vec::new(),
            message: format!(
                "Class \"{class_name}\" has neither a superclass nor properties and will not be rendered"
            ),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if !self.urls.is_empty() {
            write!(f, " (profiles: {})", self.urls.join(", "))?;
        }
        Ok(())
    }
}

/// Diagnostics of one run, in the order they were found
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiagnosticReport {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the report from what the registry recorded
    pub fn collect(collisions: &[NameCollision], link: &LinkReport) -> Self {
        let mut report = Self::new();
        for collision in collisions {
            report.push(Diagnostic::from_collision(collision));
        }
        for (class_name, superclass_name) in &link.unresolved {
            report.push(Diagnostic::unresolved_superclass(class_name, superclass_name));
        }
        report
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    /// Diagnostics with the given code
    pub fn with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.code == code)
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}
