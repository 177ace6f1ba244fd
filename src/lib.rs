//! classmark - build-time class capability resolver for Paper/Bukkit plugins.
//!
//! Reads a module's compiled classes, links them into an inheritance graph,
//! and works out which classes the plugin manifest has to name: the plugin
//! main class, the bootstrap hook, the loader, event listeners and scheduled
//! tasks.
//!
//! # Example
//!
//! ```no_run
//! use classmark::{analyze_directory, AnalysisConfig, CapabilityRules};
//!
//! let rules = CapabilityRules::paper();
//! let analysis = analyze_directory("build/classes/java/main", "sample", &rules, &AnalysisConfig::default()).unwrap();
//!
//! match &analysis.outcome {
//!     Ok(facts) => println!("main: {:?}", facts.entry_point),
//!     Err(err) => eprintln!("{}", err),
//! }
//! ```

pub mod capabilities;
pub mod checker;
pub mod cli;
pub mod config;
pub mod emitter;
pub mod error;
pub mod graph;
pub mod loader;
pub mod output;
pub mod types;

// Re-export commonly used types at crate root
pub use capabilities::{CapabilityMatch, CapabilityMatcher, CapabilityRule, CapabilityRules, MemberPredicate};
pub use checker::{check, Severity, ValidatedFactSet, Violation};
pub use config::AnalysisConfig;
pub use emitter::{emit, ManifestFacts};
pub use error::{ConfigError, Diagnostic, MalformedClassError, ResolveError};
pub use graph::{ExternalTypeRegistry, HierarchyGraph};
pub use types::{
    AnalysisInput, CapabilityKind, Cardinality, ClassDescriptor, ClassInput, MemberDescriptor, MemberKind,
};

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

/// Result of one analysis run.
///
/// `diagnostics` only carries non-fatal findings; a fatal problem is the
/// `Err` side of `outcome`.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    #[serde(serialize_with = "serialize_outcome")]
    pub outcome: std::result::Result<ManifestFacts, ResolveError>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Analysis {
    pub fn facts(&self) -> Option<&ManifestFacts> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&ResolveError> {
        self.outcome.as_ref().err()
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

fn serialize_outcome<S: serde::Serializer>(
    outcome: &std::result::Result<ManifestFacts, ResolveError>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    #[serde(rename_all = "snake_case")]
    enum Outcome<'a> {
        Facts(&'a ManifestFacts),
        Error(&'a ResolveError),
    }

    match outcome {
        Ok(facts) => Outcome::Facts(facts).serialize(serializer),
        Err(err) => Outcome::Error(err).serialize(serializer),
    }
}

/// External-type registry for a run: platform types, rule targets and
/// whatever the caller adds.
pub fn external_registry(rules: &CapabilityRules, config: &AnalysisConfig) -> ExternalTypeRegistry {
    ExternalTypeRegistry::paper()
        .with_types(rules.known_types())
        .with_types(config.extra_external_types.iter().map(String::as_str))
}

/// Run the whole pipeline over in-memory class inputs.
///
/// An invalid `config` is rejected before any class is read. After that,
/// stages run strictly in order; a fatal stage stops the run and its error
/// becomes the outcome.
pub fn analyze(
    input: AnalysisInput,
    rules: &CapabilityRules,
    config: &AnalysisConfig,
) -> error::Result<Analysis> {
    let _span = tracing::info_span!("analyze", module = %input.module).entered();
    config.validate()?;

    let loaded = loader::load_classes(&input.classes);
    let mut diagnostics = loaded.diagnostics;

    let registry = external_registry(rules, config);
    let graph = match HierarchyGraph::build(loaded.classes, &registry) {
        Ok(graph) => graph,
        Err(err) => {
            tracing::warn!("{}", err);
            return Ok(Analysis {
                outcome: Err(err),
                diagnostics,
            });
        }
    };

    let matches = CapabilityMatcher::new(&graph, rules, config).match_all();
    let facts = check(matches, &input.module, config);
    diagnostics.extend(facts.warnings().cloned().map(Diagnostic::Violation));

    let outcome = emit(&facts);
    match &outcome {
        Ok(manifest) => tracing::info!(
            "Resolved module '{}': entry point {:?}, {} listeners, {} tasks",
            manifest.module,
            manifest.entry_point,
            manifest.listeners.len(),
            manifest.scheduled_tasks.len()
        ),
        Err(err) => tracing::warn!("{}", err),
    }

    Ok(Analysis { outcome, diagnostics })
}

/// Read every `.class` file below `path` and analyze them as one module.
///
/// Only problems with the directory itself (or an invalid configuration)
/// are errors; unreadable or malformed classes become diagnostics.
pub fn analyze_directory<P: AsRef<Path>>(
    path: P,
    module: &str,
    rules: &CapabilityRules,
    config: &AnalysisConfig,
) -> Result<Analysis> {
    let path = path.as_ref();

    let (classes, read_diagnostics) = loader::read_class_directory(path, config.max_class_size)
        .with_context(|| format!("Failed to read class directory {}", path.display()))?;

    let input = AnalysisInput {
        module: module.to_string(),
        classes,
    };
    let mut analysis = analyze(input, rules, config)?;

    if !read_diagnostics.is_empty() {
        let mut diagnostics = read_diagnostics;
        diagnostics.append(&mut analysis.diagnostics);
        analysis.diagnostics = diagnostics;
    }
    Ok(analysis)
}
