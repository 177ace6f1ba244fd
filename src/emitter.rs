//! Manifest fact emission.
//!
//! The emitter is all-or-nothing: a fact set carrying a fatal violation
//! produces its error, never a partial manifest.

use crate::checker::ValidatedFactSet;
use crate::error::ResolveError;
use crate::types::CapabilityKind;
use serde::{Deserialize, Serialize};

/// Ordered facts a manifest serializer needs to write a plugin descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestFacts {
    pub module: String,
    pub entry_point: Option<String>,
    pub bootstrap_hook: Option<String>,
    pub loader: Option<String>,
    /// By inheritance depth, then class name
    pub listeners: Vec<String>,
    /// By inheritance depth, then class name
    pub scheduled_tasks: Vec<String>,
}

impl ManifestFacts {
    pub fn is_empty(&self) -> bool {
        self.entry_point.is_none()
            && self.bootstrap_hook.is_none()
            && self.loader.is_none()
            && self.listeners.is_empty()
            && self.scheduled_tasks.is_empty()
    }
}

pub fn emit(facts: &ValidatedFactSet) -> Result<ManifestFacts, ResolveError> {
    if let Some(error) = facts.fatal() {
        tracing::debug!("Not emitting manifest facts: {}", error);
        return Err(error.clone());
    }

    let single = |kind: CapabilityKind| {
        facts
            .pinned(kind)
            .map(str::to_string)
            .or_else(|| facts.matches(kind).first().map(|m| m.class.clone()))
    };
    let ordered = |kind: CapabilityKind| {
        let mut found: Vec<_> = facts.matches(kind).iter().collect();
        found.sort_by(|a, b| a.origin_depth.cmp(&b.origin_depth).then_with(|| a.class.cmp(&b.class)));
        found.into_iter().map(|m| m.class.clone()).collect::<Vec<_>>()
    };

    Ok(ManifestFacts {
        module: facts.module().to_string(),
        entry_point: single(CapabilityKind::EntryPoint),
        bootstrap_hook: single(CapabilityKind::BootstrapHook),
        loader: single(CapabilityKind::PluginLoader),
        listeners: ordered(CapabilityKind::EventListener),
        scheduled_tasks: ordered(CapabilityKind::ScheduledTask),
    })
}
