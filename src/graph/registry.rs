//! Registry of recognized types that live outside the analyzed class set.

use rustc_hash::FxHashSet;

use super::{OBJECT_CLASS, RECORD_CLASS};

/// Platform types a Paper plugin commonly builds on.
pub const PAPER_PLATFORM_TYPES: &[&str] = &[
    "org.bukkit.plugin.java.JavaPlugin",
    "org.bukkit.plugin.Plugin",
    "org.bukkit.event.Listener",
    "org.bukkit.scheduler.BukkitRunnable",
    "java.lang.Runnable",
    "io.papermc.paper.plugin.bootstrap.PluginBootstrap",
    "io.papermc.paper.plugin.loader.PluginLoader",
];

/// Fixed set of external type names the resolver knows about.
///
/// Lookups never traverse: a recognized external type is a leaf of the
/// hierarchy graph, it only carries a name.
#[derive(Debug, Clone, Default)]
pub struct ExternalTypeRegistry {
    known: FxHashSet<String>,
}

impl ExternalTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the Paper/Bukkit platform types.
    pub fn paper() -> Self {
        Self::new().with_types(PAPER_PLATFORM_TYPES.iter().copied())
    }

    #[must_use]
    pub fn with_types<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn is_recognized(&self, name: &str) -> bool {
        self.known.contains(name)
    }

    /// Designated roots terminate a parent chain without an edge.
    pub fn is_root(&self, name: &str) -> bool {
        name == OBJECT_CLASS || name == RECORD_CLASS
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}
