//! Data structures for capability rules.
//!
//! Raw structures mirror the YAML layout (fields may be absent); they are
//! converted into [`CapabilityRule`]s once loading succeeds.

use crate::types::{CapabilityKind, MemberDescriptor, MemberKind};
use serde::{Deserialize, Serialize};

/// Shape a class (or one of its in-set ancestors) must declare.
///
/// Every present field must hold for the same member; absent fields match
/// anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberPredicate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<MemberKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
}

impl MemberPredicate {
    pub fn method(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            kind: Some(MemberKind::Method),
            name: Some(name.into()),
            descriptor: Some(descriptor.into()),
            annotation: None,
        }
    }

    pub fn annotated_method(annotation: impl Into<String>) -> Self {
        Self {
            kind: Some(MemberKind::Method),
            annotation: Some(annotation.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.kind.is_none() && self.name.is_none() && self.descriptor.is_none() && self.annotation.is_none()
    }

    pub fn matches(&self, member: &MemberDescriptor) -> bool {
        self.kind.map_or(true, |kind| kind == member.kind)
            && self.name.as_deref().map_or(true, |name| name == member.name)
            && self.descriptor.as_deref().map_or(true, |desc| desc == member.descriptor)
            && self.annotation.as_deref().map_or(true, |ann| member.has_annotation(ann))
    }
}

impl std::fmt::Display for MemberPredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if let Some(annotation) = &self.annotation {
            parts.push(format!("@{}", annotation));
        }
        match self.kind {
            Some(MemberKind::Method) => parts.push("method".to_string()),
            Some(MemberKind::Field) => parts.push("field".to_string()),
            None => parts.push("member".to_string()),
        }
        if let Some(name) = &self.name {
            parts.push(name.clone());
        }
        if let Some(descriptor) = &self.descriptor {
            parts.push(descriptor.clone());
        }
        f.write_str(&parts.join(" "))
    }
}

/// One declarative capability rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityRule {
    pub id: String,
    /// Dotted name of the type or interface to match
    pub target: String,
    pub kind: CapabilityKind,
    pub desc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<MemberPredicate>,
}

impl CapabilityRule {
    pub fn new(id: impl Into<String>, target: impl Into<String>, kind: CapabilityKind) -> Self {
        Self {
            id: id.into(),
            target: target.into(),
            kind,
            desc: String::new(),
            members: None,
        }
    }

    #[must_use]
    pub fn with_members(mut self, predicate: MemberPredicate) -> Self {
        self.members = Some(predicate);
        self
    }
}

/// Raw rule for parsing (fields can be absent)
#[derive(Debug, Deserialize)]
pub(crate) struct RawCapabilityRule {
    #[serde(default)]
    pub(crate) id: Option<String>,
    #[serde(alias = "match", alias = "match_target")]
    pub(crate) target: String,
    #[serde(alias = "capability")]
    pub(crate) kind: CapabilityKind,
    #[serde(default, alias = "description")]
    pub(crate) desc: String,
    #[serde(default, alias = "member")]
    pub(crate) members: Option<MemberPredicate>,
}

/// YAML file structure
#[derive(Debug, Deserialize)]
pub(crate) struct RuleFile {
    #[serde(default)]
    pub(crate) external_types: Vec<String>,
    #[serde(default)]
    pub(crate) rules: Vec<RawCapabilityRule>,
}
