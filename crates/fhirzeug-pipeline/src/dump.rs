//! Serializable snapshot of a resolved model

use fhirzeug_model::{ClassView, Property};
use indexmap::IndexMap;
use serde::Serialize;

use crate::pipeline::{ResolvedModel, RunStats};
use crate::report::Diagnostic;

/// One class as handed to a renderer
#[derive(Debug, Clone, Serialize)]
pub struct ClassDump {
    pub name: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,
    pub urls: Vec<String>,
    pub renderable: bool,
    pub properties: Vec<Property>,
    /// Required choice groups and plain properties, keyed by group name
    pub nonoptional_groups: IndexMap<String, Vec<String>>,
}

impl ClassDump {
    pub fn from_view(view: &ClassView<'_>) -> Self {
        Self {
            name: view.name.clone(),
            path: view.path.clone(),
            resource_type: view.resource_type.clone(),
            superclass: view.superclass_name.clone(),
            urls: view.urls().into_iter().map(str::to_string).collect(),
            renderable: view.should_write(),
            properties: view.properties().to_vec(),
            nonoptional_groups: view
                .expanded_nonoptionals()
                .map(|(key, members)| {
                    (
                        key.to_string(),
                        members.iter().map(|p| p.name.clone()).collect(),
                    )
                })
                .collect(),
        }
    }
}

/// Whole-model snapshot, the `--format json` output of the CLI
#[derive(Debug, Clone, Serialize)]
pub struct ModelDump {
    pub classes: Vec<ClassDump>,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: RunStats,
}

impl ModelDump {
    pub fn from_model(model: &ResolvedModel) -> Self {
        Self {
            classes: model
                .registry
                .iter()
                .map(|view| ClassDump::from_view(&view))
                .collect(),
            diagnostics: model.report.diagnostics().to_vec(),
            stats: model.stats.clone(),
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
