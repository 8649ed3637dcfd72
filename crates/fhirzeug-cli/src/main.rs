//! # fhirzeug-cli
//!
//! Command-line front end for the class-model resolver.
//!
//! This crate loads profile files, runs them through the pipeline and prints
//! either a human-readable summary or a JSON dump of the resolved model.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use fhirzeug_mapping::MappingRules;
use fhirzeug_model::ClassView;
use fhirzeug_pipeline::{Pipeline, PipelineConfig, ResolvedModel, StrictnessLevel};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fhirzeug")]
#[command(about = "Resolve FHIR profiles into a class model")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a profile set and report the result
    Resolve {
        /// Profile set file (JSON or YAML)
        input: PathBuf,

        /// Mapping rules overriding the built-in ones
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Fail when any data-quality warning is recorded
        #[arg(long)]
        strict: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Summary)]
        format: OutputFormat,
    },

    /// List renderable classes with their inherited properties
    Classes {
        /// Profile set file (JSON or YAML)
        input: PathBuf,

        /// Mapping rules overriding the built-in ones
        #[arg(short, long)]
        rules: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Summary,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Resolve {
            input,
            rules,
            strict,
            format,
        } => {
            let strictness = if strict {
                StrictnessLevel::Strict
            } else {
                StrictnessLevel::Permissive
            };
            let model = resolve(&input, rules.as_deref(), strictness)?;
            match format {
                OutputFormat::Summary => print_summary(&model),
                OutputFormat::Json => println!("{}", model.to_dump().to_json_pretty()?),
            }
        }
        Commands::Classes { input, rules } => {
            let model = resolve(&input, rules.as_deref(), StrictnessLevel::Permissive)?;
            for view in model.registry().renderable_classes() {
                print_class(&view);
            }
        }
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_rules(path: Option<&Path>) -> anyhow::Result<MappingRules> {
    let rules = MappingRules::fhir_defaults();
    let Some(path) = path else {
        return Ok(rules);
    };
    tracing::info!("Using mapping rules: {}", path.display());
    let overrides = MappingRules::load_from_file(path)
        .with_context(|| format!("failed to load mapping rules from {}", path.display()))?;
    Ok(rules.with_overrides(overrides))
}

fn resolve(
    input: &Path,
    rules: Option<&Path>,
    strictness: StrictnessLevel,
) -> anyhow::Result<ResolvedModel> {
    tracing::info!("Resolving {}", input.display());
    let profiles = Pipeline::load_profiles(input)
        .with_context(|| format!("failed to load profiles from {}", input.display()))?;
    let pipeline = Pipeline::new(load_rules(rules)?)
        .with_config(PipelineConfig::default().with_strictness(strictness));
    Ok(pipeline.run(&profiles)?)
}

fn print_summary(model: &ResolvedModel) {
    let stats = model.stats();
    println!(
        "Resolved {} classes from {} profiles ({} elements, {} properties)",
        model.registry().len(),
        stats.profiles,
        stats.elements,
        stats.properties_added
    );
    for view in model.registry().renderable_classes() {
        match &view.superclass_name {
            Some(superclass) => println!(
                "  {}({superclass}): {} properties",
                view.name,
                view.properties().len()
            ),
            None => println!("  {}: {} properties", view.name, view.properties().len()),
        }
    }
    for diagnostic in model.report().diagnostics() {
        println!("{:?}: {diagnostic}", diagnostic.severity);
    }
}

fn print_class(view: &ClassView<'_>) {
    println!("{}", view.name);
    for prop in view.sorted_properties_all() {
        let marker = if prop.is_array { "[]" } else { "" };
        let required = if prop.nonoptional { " (required)" } else { "" };
        println!("  {}: {}{marker}{required}", prop.name, prop.class_name);
    }
}
