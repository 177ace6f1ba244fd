use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::types::CapabilityKind;

/// Structural faults that abort an analysis run.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum ResolveError {
    #[error("cyclic class hierarchy: {}", cycle.join(" -> "))]
    CyclicHierarchy { cycle: Vec<String> },

    #[error("multiple plugin entry points: {}", candidates.join(", "))]
    MultipleEntryPoints { candidates: Vec<String> },

    #[error("multiple bootstrap hooks: {}", candidates.join(", "))]
    MultipleBootstrapHooks { candidates: Vec<String> },

    #[error("multiple plugin loaders: {}", candidates.join(", "))]
    MultipleLoaders { candidates: Vec<String> },

    #[error("no plugin entry point found in module '{module}'")]
    NoEntryPoint { module: String },
}

impl ResolveError {
    /// Cardinality error for a kind that allows at most one class.
    pub(crate) fn multiple(kind: CapabilityKind, candidates: Vec<String>) -> Option<Self> {
        match kind {
            CapabilityKind::EntryPoint => Some(Self::MultipleEntryPoints { candidates }),
            CapabilityKind::BootstrapHook => Some(Self::MultipleBootstrapHooks { candidates }),
            CapabilityKind::PluginLoader => Some(Self::MultipleLoaders { candidates }),
            CapabilityKind::EventListener | CapabilityKind::ScheduledTask => None,
        }
    }
}

/// Problems with rule tables or analysis settings, raised before a run starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Rule loading failed: {message}")]
    RuleLoading { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

impl ConfigError {
    pub fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub fn rule_loading<S: Into<String>>(message: S) -> Self {
        Self::RuleLoading { message: message.into() }
    }

    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration { message: message.into() }
    }
}

/// A class input that could not be parsed. Never fatal: the input is
/// excluded and the run continues.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[error("malformed class {origin}: {reason}")]
pub struct MalformedClassError {
    pub origin: String,
    pub reason: String,
}

/// Non-fatal findings returned next to the facts (or next to the fatal error).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Diagnostic {
    MalformedClass(MalformedClassError),
    /// Several inputs declared the same class; the first origin was kept
    DuplicateClass { name: String, kept: String, ignored: Vec<String> },
    Violation(crate::checker::Violation),
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedClass(err) => write!(f, "{err}"),
            Self::DuplicateClass { name, kept, ignored } => write!(
                f,
                "duplicate class {name}: kept {kept}, ignored {}",
                ignored.join(", ")
            ),
            Self::Violation(violation) => write!(f, "{violation}"),
        }
    }
}
