use serde::{Deserialize, Serialize};
use std::fmt;

/// JVM access flags we care about (class and member level).
pub mod access {
    pub const ACC_PUBLIC: u16 = 0x0001;
    pub const ACC_STATIC: u16 = 0x0008;
    pub const ACC_ABSTRACT: u16 = 0x0400;
    pub const ACC_INTERFACE: u16 = 0x0200;
    pub const ACC_SYNTHETIC: u16 = 0x1000;
    pub const ACC_ANNOTATION: u16 = 0x2000;
    pub const ACC_ENUM: u16 = 0x4000;
    pub const ACC_MODULE: u16 = 0x8000;
}

/// One compiled class handed to the loader.
#[derive(Debug, Clone)]
pub struct ClassInput {
    /// Where the bytes came from (relative path, archive entry, test label)
    pub origin: String,
    pub bytes: Vec<u8>,
}

impl ClassInput {
    pub fn new(origin: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            origin: origin.into(),
            bytes: bytes.into(),
        }
    }
}

/// The complete input of one analysis run.
#[derive(Debug, Clone, Default)]
pub struct AnalysisInput {
    /// Name of the module the classes were compiled from
    pub module: String,
    pub classes: Vec<ClassInput>,
}

impl AnalysisInput {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            classes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_class(mut self, class: ClassInput) -> Self {
        self.classes.push(class);
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Method,
    Field,
}

/// A declared field or method of a class.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemberDescriptor {
    pub name: String,
    pub kind: MemberKind,
    /// Raw JVM descriptor, e.g. `()V` or `Lorg/bukkit/Server;`
    pub descriptor: String,
    pub access: u16,
    /// Dotted annotation type names present on the member
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<String>,
}

impl MemberDescriptor {
    pub fn method(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Method,
            descriptor: descriptor.into(),
            access: access::ACC_PUBLIC,
            annotations: Vec::new(),
        }
    }

    pub fn field(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Field,
            descriptor: descriptor.into(),
            access: access::ACC_PUBLIC,
            annotations: Vec::new(),
        }
    }

    #[must_use]
    pub fn annotated(mut self, annotation: impl Into<String>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    pub fn has_annotation(&self, annotation: &str) -> bool {
        self.annotations.iter().any(|a| a == annotation)
    }
}

/// Metadata of one compiled class, as read by the loader.
///
/// Names are dotted (`org.bukkit.event.Listener`); nested classes keep their
/// binary `$` separator (`a.b.Outer$Inner`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassDescriptor {
    pub name: String,
    /// Absent for root types (`java.lang.Object`)
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub members: Vec<MemberDescriptor>,
    /// Outer class of a nested, local or anonymous class
    pub enclosing: Option<String>,
    pub access: u16,
    pub synthetic: bool,
    /// Label of the input this class was read from
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub origin: String,
}

impl ClassDescriptor {
    /// A public concrete class extending `java.lang.Object`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            superclass: Some(crate::graph::OBJECT_CLASS.to_string()),
            interfaces: Vec::new(),
            members: Vec::new(),
            enclosing: None,
            access: access::ACC_PUBLIC,
            synthetic: false,
            origin: String::new(),
        }
    }

    #[must_use]
    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    #[must_use]
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    #[must_use]
    pub fn with_member(mut self, member: MemberDescriptor) -> Self {
        self.members.push(member);
        self
    }

    #[must_use]
    pub fn enclosed_by(mut self, outer: impl Into<String>) -> Self {
        self.enclosing = Some(outer.into());
        self
    }

    #[must_use]
    pub fn with_access(mut self, access: u16) -> Self {
        self.access = access;
        self
    }

    #[must_use]
    pub fn as_synthetic(mut self) -> Self {
        self.synthetic = true;
        self
    }

    pub fn is_interface(&self) -> bool {
        self.access & access::ACC_INTERFACE != 0
    }

    pub fn is_abstract(&self) -> bool {
        self.access & access::ACC_ABSTRACT != 0
    }

    /// Instantiable: neither an interface nor abstract.
    pub fn is_concrete(&self) -> bool {
        !self.is_interface() && !self.is_abstract()
    }

    pub fn is_nested(&self) -> bool {
        self.enclosing.is_some()
    }
}

/// Structural trait a class can exhibit.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    EntryPoint,
    BootstrapHook,
    PluginLoader,
    EventListener,
    ScheduledTask,
}

/// How many classes of one kind a plugin may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    AtMostOne,
    Many,
}

impl CapabilityKind {
    pub const ALL: [CapabilityKind; 5] = [
        CapabilityKind::EntryPoint,
        CapabilityKind::BootstrapHook,
        CapabilityKind::PluginLoader,
        CapabilityKind::EventListener,
        CapabilityKind::ScheduledTask,
    ];

    pub const fn cardinality(self) -> Cardinality {
        match self {
            Self::EntryPoint | Self::BootstrapHook | Self::PluginLoader => Cardinality::AtMostOne,
            Self::EventListener | Self::ScheduledTask => Cardinality::Many,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EntryPoint => "entry_point",
            Self::BootstrapHook => "bootstrap_hook",
            Self::PluginLoader => "plugin_loader",
            Self::EventListener => "event_listener",
            Self::ScheduledTask => "scheduled_task",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
