//! Capability rule tables.
//!
//! Rules are loaded once, validated, and never change during a run. The
//! built-in Paper table is embedded at compile time; custom tables come from a
//! YAML file or a directory of YAML files.

use super::models::{CapabilityRule, RawCapabilityRule, RuleFile};
use crate::error::{ConfigError, Result};
use rustc_hash::FxHashSet;
use std::fs;
use std::path::Path;

const PAPER_RULES: &str = include_str!("../../rules/paper.yaml");

/// Immutable, validated rule table.
#[derive(Debug, Clone, Default)]
pub struct CapabilityRules {
    rules: Vec<CapabilityRule>,
    external_types: Vec<String>,
}

impl CapabilityRules {
    /// Built-in rules for Paper/Bukkit plugins.
    pub fn paper() -> Self {
        Self::from_yaml_str(PAPER_RULES).unwrap_or_else(|err| {
            tracing::error!("Embedded Paper rules are invalid: {}", err);
            Self::default()
        })
    }

    pub fn from_rules(rules: Vec<CapabilityRule>) -> Result<Self> {
        let table = Self {
            rules,
            external_types: Vec::new(),
        };
        table.validate()?;
        Ok(table)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let file: RuleFile = serde_yaml::from_str(content)
            .map_err(|err| ConfigError::rule_loading(format!("Failed to parse rules YAML: {}", err)))?;
        let mut table = Self::default();
        table.extend(file);
        table.validate()?;
        Ok(table)
    }

    /// Load a YAML file, or every `*.yaml`/`*.yml` file below a directory
    /// (in sorted path order).
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let files = if path.is_dir() {
            let mut files: Vec<_> = walkdir::WalkDir::new(path)
                .follow_links(false)
                .into_iter()
                .filter_map(std::result::Result::ok)
                .filter(|entry| entry.file_type().is_file())
                .map(walkdir::DirEntry::into_path)
                .filter(|p| {
                    p.extension()
                        .is_some_and(|ext| ext == "yaml" || ext == "yml")
                })
                .collect();
            files.sort_by(|a, b| a.to_string_lossy().cmp(&b.to_string_lossy()));
            if files.is_empty() {
                return Err(ConfigError::rule_loading(format!(
                    "No YAML files found in {}",
                    path.display()
                )));
            }
            files
        } else {
            vec![path.to_path_buf()]
        };

        let mut table = Self::default();
        for file in &files {
            tracing::debug!("Loading rules from {}", file.display());
            let content = fs::read_to_string(file).map_err(|err| ConfigError::io(file, err))?;
            let parsed: RuleFile = serde_yaml::from_str(&content).map_err(|err| {
                ConfigError::rule_loading(format!("Failed to parse {}: {}", file.display(), err))
            })?;
            table.extend(parsed);
        }
        table.validate()?;
        tracing::info!("Loaded {} capability rules from {}", table.rules.len(), path.display());
        Ok(table)
    }

    fn extend(&mut self, file: RuleFile) {
        self.external_types.extend(file.external_types);
        self.rules.extend(file.rules.into_iter().map(Self::convert));
    }

    fn convert(raw: RawCapabilityRule) -> CapabilityRule {
        let target = raw.target.trim().replace('/', ".");
        let id = raw
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| format!("{}/{}", raw.kind, target));
        CapabilityRule {
            id,
            target,
            kind: raw.kind,
            desc: raw.desc,
            members: raw.members.filter(|predicate| !predicate.is_empty()),
        }
    }

    fn validate(&self) -> Result<()> {
        let mut seen = FxHashSet::default();
        for rule in &self.rules {
            if rule.target.is_empty() {
                return Err(ConfigError::rule_loading(format!("Rule '{}' has an empty target", rule.id)));
            }
            if !seen.insert(rule.id.as_str()) {
                return Err(ConfigError::rule_loading(format!("Duplicate rule id '{}'", rule.id)));
            }
        }
        Ok(())
    }

    pub fn rules(&self) -> &[CapabilityRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Every name the external-type registry should recognize.
    pub fn known_types(&self) -> impl Iterator<Item = &str> {
        self.rules
            .iter()
            .map(|rule| rule.target.as_str())
            .chain(self.external_types.iter().map(String::as_str))
    }
}
