use crate::error::{ConfigError, Result};
use crate::types::{CapabilityKind, ClassDescriptor};

/// Largest class file the directory loader will read
pub const MAX_CLASS_SIZE: u64 = 16 * 1024 * 1024; // 16MB

/// Settings for one analysis run, supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// The module declares itself a plugin: a missing entry point is fatal
    pub plugin_module: bool,
    /// Class-name prefixes that may produce capabilities (empty = all classes)
    pub scope: Vec<String>,
    /// Class-name prefixes removed from the scope
    pub exclude: Vec<String>,
    /// Report abstract classes and interfaces as capability holders
    pub include_abstract: bool,
    /// Report compiler-generated classes as capability holders
    pub include_synthetic: bool,
    /// Keep nested and anonymous classes out of the capability holders
    pub skip_nested: bool,
    /// Extra names the external-type registry should recognize
    pub extra_external_types: Vec<String>,
    pub max_class_size: u64,
    /// Main class chosen by the user; detection for entry points is skipped
    pub entry_point: Option<String>,
    /// Bootstrapper chosen by the user
    pub bootstrap_hook: Option<String>,
    /// Loader chosen by the user
    pub loader: Option<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            plugin_module: true,
            scope: Vec::new(),
            exclude: Vec::new(),
            include_abstract: false,
            include_synthetic: false,
            skip_nested: false,
            extra_external_types: Vec::new(),
            max_class_size: MAX_CLASS_SIZE,
            entry_point: None,
            bootstrap_hook: None,
            loader: None,
        }
    }
}

impl AnalysisConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration for a library module that is not a plugin itself.
    #[must_use]
    pub fn library() -> Self {
        Self {
            plugin_module: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_scope<S: Into<String>>(mut self, prefix: S) -> Self {
        self.scope.push(prefix.into());
        self
    }

    #[must_use]
    pub fn with_exclude<S: Into<String>>(mut self, prefix: S) -> Self {
        self.exclude.push(prefix.into());
        self
    }

    /// Use `class` for `kind` instead of detecting it.
    #[must_use]
    pub fn with_pinned<S: Into<String>>(mut self, kind: CapabilityKind, class: S) -> Self {
        let class = Some(class.into());
        match kind {
            CapabilityKind::EntryPoint => self.entry_point = class,
            CapabilityKind::BootstrapHook => self.bootstrap_hook = class,
            CapabilityKind::PluginLoader => self.loader = class,
            CapabilityKind::EventListener | CapabilityKind::ScheduledTask => {
                tracing::warn!("{} cannot be pinned to a single class", kind);
            }
        }
        self
    }

    /// Class the user configured for `kind`, if any.
    pub fn pinned(&self, kind: CapabilityKind) -> Option<&str> {
        match kind {
            CapabilityKind::EntryPoint => self.entry_point.as_deref(),
            CapabilityKind::BootstrapHook => self.bootstrap_hook.as_deref(),
            CapabilityKind::PluginLoader => self.loader.as_deref(),
            CapabilityKind::EventListener | CapabilityKind::ScheduledTask => None,
        }
    }

    /// Validate the configuration and return errors for invalid settings
    pub fn validate(&self) -> Result<()> {
        if self.max_class_size == 0 {
            return Err(ConfigError::configuration("max_class_size must be greater than 0"));
        }
        for prefix in self.scope.iter().chain(self.exclude.iter()) {
            if prefix.trim().is_empty() {
                return Err(ConfigError::configuration("scope prefixes must not be empty"));
            }
            if prefix.contains('/') {
                return Err(ConfigError::configuration(format!(
                    "scope prefix '{}' must use dotted class names",
                    prefix
                )));
            }
        }
        for kind in CapabilityKind::ALL {
            if let Some(class) = self.pinned(kind) {
                if class.trim().is_empty() || class.contains('/') {
                    return Err(ConfigError::configuration(format!(
                        "configured {} '{}' must be a dotted class name",
                        kind, class
                    )));
                }
            }
        }
        Ok(())
    }

    /// Whether a class name falls inside the caller's scope boundary.
    pub fn in_scope(&self, name: &str) -> bool {
        let included = self.scope.is_empty() || self.scope.iter().any(|prefix| name.starts_with(prefix.as_str()));
        included && !self.exclude.iter().any(|prefix| name.starts_with(prefix.as_str()))
    }

    /// Whether a class may produce capability matches.
    ///
    /// Classes that fail this check still take part in the hierarchy.
    pub fn is_subject(&self, class: &ClassDescriptor) -> bool {
        self.in_scope(&class.name)
            && (self.include_abstract || class.is_concrete())
            && (self.include_synthetic || !class.synthetic)
            && !(self.skip_nested && class.is_nested())
    }
}
