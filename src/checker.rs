//! Project-wide conflict and completeness checks.
//!
//! Groups capability matches by kind, enforces per-kind cardinality, and turns
//! matches without the required member shape into warnings. Matches are only
//! classified here, never changed.

use crate::capabilities::{CapabilityMatch, MemberShape};
use crate::config::AnalysisConfig;
use crate::error::ResolveError;
use crate::types::{CapabilityKind, Cardinality};
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Fatal,
}

/// A problem found while validating capability matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub severity: Severity,
    pub capability: CapabilityKind,
    /// Offending class; empty for module-wide findings
    #[serde(skip_serializing_if = "String::is_empty")]
    pub class: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    /// Outer class of a nested or anonymous offender
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enclosing: Option<String>,
    pub message: String,
    #[serde(skip)]
    error: Option<ResolveError>,
}

impl Violation {
    fn warning(found: &CapabilityMatch, message: String) -> Self {
        Self {
            severity: Severity::Warning,
            capability: found.kind,
            class: found.class.clone(),
            rule: Some(found.rule.clone()),
            enclosing: found.enclosing.clone(),
            message,
            error: None,
        }
    }

    fn fatal(capability: CapabilityKind, error: ResolveError) -> Self {
        Self {
            severity: Severity::Fatal,
            capability,
            class: String::new(),
            rule: None,
            enclosing: None,
            message: error.to_string(),
            error: Some(error),
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }

    /// The run-aborting error behind a fatal violation.
    pub fn error(&self) -> Option<&ResolveError> {
        self.error.as_ref()
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.class.is_empty() {
            write!(f, "{} ({}): {}", self.capability, severity_label(self.severity), self.message)
        } else if let Some(outer) = &self.enclosing {
            write!(
                f,
                "{} {} in {} ({}): {}",
                self.capability,
                self.class,
                outer,
                severity_label(self.severity),
                self.message
            )
        } else {
            write!(
                f,
                "{} {} ({}): {}",
                self.capability,
                self.class,
                severity_label(self.severity),
                self.message
            )
        }
    }
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Warning => "warning",
        Severity::Fatal => "fatal",
    }
}

/// Deduplicated, cardinality-checked capability facts for one module.
#[derive(Debug, Clone, Default)]
pub struct ValidatedFactSet {
    module: String,
    facts: BTreeMap<CapabilityKind, Vec<CapabilityMatch>>,
    pinned: BTreeMap<CapabilityKind, String>,
    violations: Vec<Violation>,
}

impl ValidatedFactSet {
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Facts of one kind, ordered by depth then class name.
    pub fn matches(&self, kind: CapabilityKind) -> &[CapabilityMatch] {
        self.facts.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Class the configuration fixed for `kind`; detection is not consulted.
    pub fn pinned(&self, kind: CapabilityKind) -> Option<&str> {
        self.pinned.get(&kind).map(String::as_str)
    }

    /// Warnings first (by class), then fatal violations in check order.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| !v.is_fatal())
    }

    /// First fatal condition, if any.
    pub fn fatal(&self) -> Option<&ResolveError> {
        self.violations.iter().find_map(Violation::error)
    }
}

/// Validate matcher output for `module`.
pub fn check(matches: Vec<CapabilityMatch>, module: &str, config: &AnalysisConfig) -> ValidatedFactSet {
    let _span = tracing::info_span!("check_capabilities", matches = matches.len()).entered();

    let mut ordered = matches;
    ordered.sort_by(|a, b| {
        a.kind
            .cmp(&b.kind)
            .then(a.origin_depth.cmp(&b.origin_depth))
            .then_with(|| a.class.cmp(&b.class))
            .then_with(|| a.rule.cmp(&b.rule))
    });
    let (facts, missing): (Vec<_>, Vec<_>) = ordered.into_iter().partition(CapabilityMatch::is_fact);

    let mut set = ValidatedFactSet {
        module: module.to_string(),
        ..ValidatedFactSet::default()
    };

    // First match per (kind, class) is the shallowest one.
    let mut seen: FxHashSet<(CapabilityKind, String)> = FxHashSet::default();
    for fact in facts {
        if seen.insert((fact.kind, fact.class.clone())) {
            set.facts.entry(fact.kind).or_default().push(fact);
        } else {
            debug!("Dropping duplicate {} match for {} from rule {}", fact.kind, fact.class, fact.rule);
        }
    }

    let mut warnings = Vec::new();
    for candidate in missing {
        debug_assert_eq!(candidate.shape, MemberShape::Missing);
        if !seen.insert((candidate.kind, candidate.class.clone())) {
            continue;
        }
        warn!(
            "{} reaches {} but lacks the required member shape (rule {})",
            candidate.class, candidate.kind, candidate.rule
        );
        warnings.push(Violation::warning(
            &candidate,
            format!("reaches {} but lacks the required member shape", candidate.kind),
        ));
    }
    warnings.sort_by(|a, b| a.class.cmp(&b.class).then(a.capability.cmp(&b.capability)));
    set.violations = warnings;

    for kind in CapabilityKind::ALL {
        if kind.cardinality() != Cardinality::AtMostOne {
            continue;
        }
        if let Some(class) = config.pinned(kind) {
            debug!("Using configured {} {}, skipping detection", kind, class);
            set.pinned.insert(kind, class.to_string());
            continue;
        }
        let found = set.matches(kind);
        if found.len() > 1 {
            let mut candidates: Vec<String> = found.iter().map(|m| m.class.clone()).collect();
            candidates.sort();
            if let Some(error) = ResolveError::multiple(kind, candidates) {
                set.violations.push(Violation::fatal(kind, error));
            }
        }
    }

    if config.plugin_module
        && set.pinned(CapabilityKind::EntryPoint).is_none()
        && set.matches(CapabilityKind::EntryPoint).is_empty()
    {
        set.violations.push(Violation::fatal(
            CapabilityKind::EntryPoint,
            ResolveError::NoEntryPoint {
                module: module.to_string(),
            },
        ));
    }

    tracing::info!(
        "Validated {} capability facts, {} violations",
        set.facts.values().map(Vec::len).sum::<usize>(),
        set.violations.len()
    );
    set
}
