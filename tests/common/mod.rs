//! Builds minimal but well-formed JVM class files for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

const ACC_PUBLIC: u16 = 0x0001;
const ACC_SUPER: u16 = 0x0020;
const ACC_INTERFACE: u16 = 0x0200;
const ACC_ABSTRACT: u16 = 0x0400;
const ACC_SYNTHETIC: u16 = 0x1000;

#[derive(Debug, Clone)]
struct Method {
    name: String,
    descriptor: String,
    annotations: Vec<String>,
}

/// A class to compile into bytes. Names are dotted (`a.b.Main$Inner`).
#[derive(Debug, Clone)]
pub struct ClassFile {
    name: String,
    superclass: Option<String>,
    interfaces: Vec<String>,
    access: u16,
    fields: Vec<(String, String)>,
    methods: Vec<Method>,
    outer: Option<String>,
    anonymous_in: Option<String>,
    synthetic_attribute: bool,
    major: u16,
}

impl ClassFile {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            superclass: Some("java.lang.Object".to_string()),
            interfaces: Vec::new(),
            access: ACC_PUBLIC | ACC_SUPER,
            fields: Vec::new(),
            methods: Vec::new(),
            outer: None,
            anonymous_in: None,
            synthetic_attribute: false,
            major: 65,
        }
    }

    pub fn extends(mut self, superclass: &str) -> Self {
        self.superclass = Some(superclass.to_string());
        self
    }

    /// `java.lang.Object` itself has no superclass
    pub fn without_superclass(mut self) -> Self {
        self.superclass = None;
        self
    }

    pub fn implements(mut self, interface: &str) -> Self {
        self.interfaces.push(interface.to_string());
        self
    }

    pub fn interface(mut self) -> Self {
        self.access = ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT;
        self
    }

    pub fn abstract_class(mut self) -> Self {
        self.access |= ACC_ABSTRACT;
        self
    }

    pub fn synthetic(mut self) -> Self {
        self.access |= ACC_SYNTHETIC;
        self
    }

    /// Mark synthetic through the `Synthetic` attribute instead of the flag
    pub fn synthetic_attribute(mut self) -> Self {
        self.synthetic_attribute = true;
        self
    }

    pub fn field(mut self, name: &str, descriptor: &str) -> Self {
        self.fields.push((name.to_string(), descriptor.to_string()));
        self
    }

    pub fn method(mut self, name: &str, descriptor: &str) -> Self {
        self.methods.push(Method {
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            annotations: Vec::new(),
        });
        self
    }

    pub fn annotated_method(mut self, name: &str, descriptor: &str, annotation: &str) -> Self {
        self.methods.push(Method {
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            annotations: vec![annotation.to_string()],
        });
        self
    }

    /// Member class declared inside `outer` (InnerClasses entry)
    pub fn nested_in(mut self, outer: &str) -> Self {
        self.outer = Some(outer.to_string());
        self
    }

    /// Anonymous class created inside a method of `outer` (EnclosingMethod)
    pub fn anonymous_in(mut self, outer: &str) -> Self {
        self.anonymous_in = Some(outer.to_string());
        self
    }

    pub fn file_name(&self) -> String {
        format!("{}.class", internal(&self.name))
    }

    pub fn bytes(&self) -> Vec<u8> {
        let mut pool = Pool::default();
        let mut body = Vec::new();

        let this_class = pool.class(&self.name);
        put_u16(&mut body, self.access);
        put_u16(&mut body, this_class);
        let super_class = self.superclass.as_deref().map_or(0, |name| pool.class(name));
        put_u16(&mut body, super_class);

        put_u16(&mut body, self.interfaces.len() as u16);
        for interface in &self.interfaces {
            let index = pool.class(interface);
            put_u16(&mut body, index);
        }

        put_u16(&mut body, self.fields.len() as u16);
        for (name, descriptor) in &self.fields {
            put_u16(&mut body, ACC_PUBLIC);
            put_u16(&mut body, pool.utf8(name));
            put_u16(&mut body, pool.utf8(descriptor));
            put_u16(&mut body, 0);
        }

        put_u16(&mut body, self.methods.len() as u16);
        for method in &self.methods {
            put_u16(&mut body, ACC_PUBLIC);
            put_u16(&mut body, pool.utf8(&method.name));
            put_u16(&mut body, pool.utf8(&method.descriptor));
            if method.annotations.is_empty() {
                put_u16(&mut body, 0);
                continue;
            }
            put_u16(&mut body, 1);
            put_u16(&mut body, pool.utf8("RuntimeVisibleAnnotations"));
            let mut attribute = Vec::new();
            put_u16(&mut attribute, method.annotations.len() as u16);
            for annotation in &method.annotations {
                put_u16(&mut attribute, pool.utf8(&format!("L{};", internal(annotation))));
                // element_value_pairs
                put_u16(&mut attribute, 0);
            }
            put_u32(&mut body, attribute.len() as u32);
            body.extend_from_slice(&attribute);
        }

        let mut attributes: Vec<(u16, Vec<u8>)> = Vec::new();
        if let Some(outer) = &self.outer {
            let mut attribute = Vec::new();
            put_u16(&mut attribute, 1);
            put_u16(&mut attribute, this_class);
            put_u16(&mut attribute, pool.class(outer));
            let simple = self.name.rsplit('$').next().unwrap_or(&self.name).to_string();
            put_u16(&mut attribute, pool.utf8(&simple));
            put_u16(&mut attribute, ACC_PUBLIC);
            attributes.push((pool.utf8("InnerClasses"), attribute));
        }
        if let Some(outer) = &self.anonymous_in {
            let mut inner = Vec::new();
            put_u16(&mut inner, 1);
            put_u16(&mut inner, this_class);
            put_u16(&mut inner, 0);
            put_u16(&mut inner, 0);
            put_u16(&mut inner, 0);
            attributes.push((pool.utf8("InnerClasses"), inner));

            let mut enclosing = Vec::new();
            put_u16(&mut enclosing, pool.class(outer));
            put_u16(&mut enclosing, 0);
            attributes.push((pool.utf8("EnclosingMethod"), enclosing));
        }
        if self.synthetic_attribute {
            attributes.push((pool.utf8("Synthetic"), Vec::new()));
        }

        put_u16(&mut body, attributes.len() as u16);
        for (name, attribute) in attributes {
            put_u16(&mut body, name);
            put_u32(&mut body, attribute.len() as u32);
            body.extend_from_slice(&attribute);
        }

        let mut out = Vec::new();
        put_u32(&mut out, 0xCAFE_BABE);
        put_u16(&mut out, 0);
        put_u16(&mut out, self.major);
        put_u16(&mut out, pool.count());
        out.extend_from_slice(&pool.bytes);
        out.extend_from_slice(&body);
        out
    }
}

/// Constant pool with interned Utf8 and Class entries.
#[derive(Default)]
struct Pool {
    bytes: Vec<u8>,
    entries: Vec<(u8, String)>,
}

impl Pool {
    fn count(&self) -> u16 {
        self.entries.len() as u16 + 1
    }

    fn find(&self, tag: u8, value: &str) -> Option<u16> {
        self.entries
            .iter()
            .position(|(t, v)| *t == tag && v == value)
            .map(|i| i as u16 + 1)
    }

    fn utf8(&mut self, value: &str) -> u16 {
        if let Some(index) = self.find(1, value) {
            return index;
        }
        self.bytes.push(1);
        put_u16(&mut self.bytes, value.len() as u16);
        self.bytes.extend_from_slice(value.as_bytes());
        self.entries.push((1, value.to_string()));
        self.entries.len() as u16
    }

    fn class(&mut self, dotted: &str) -> u16 {
        let name = internal(dotted);
        if let Some(index) = self.find(7, &name) {
            return index;
        }
        let name_index = self.utf8(&name);
        self.bytes.push(7);
        put_u16(&mut self.bytes, name_index);
        self.entries.push((7, name));
        self.entries.len() as u16
    }
}

fn internal(dotted: &str) -> String {
    dotted.replace('.', "/")
}

fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// Write classes below `root` the way a compiler lays out its output directory.
pub fn write_classes(root: &Path, classes: &[ClassFile]) {
    for class in classes {
        let path = root.join(class.file_name());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, class.bytes()).unwrap();
    }
}

pub const JAVA_PLUGIN: &str = "org.bukkit.plugin.java.JavaPlugin";
pub const PLUGIN_BOOTSTRAP: &str = "io.papermc.paper.plugin.bootstrap.PluginBootstrap";
pub const PLUGIN_LOADER: &str = "io.papermc.paper.plugin.loader.PluginLoader";
pub const LISTENER: &str = "org.bukkit.event.Listener";
pub const EVENT_HANDLER: &str = "org.bukkit.event.EventHandler";
pub const RUNNABLE: &str = "java.lang.Runnable";
pub const BUKKIT_RUNNABLE: &str = "org.bukkit.scheduler.BukkitRunnable";

/// Plugin main class extending `JavaPlugin`
pub fn plugin_main(name: &str) -> ClassFile {
    ClassFile::new(name).extends(JAVA_PLUGIN).method("onEnable", "()V")
}

/// Listener with one `@EventHandler` method
pub fn listener(name: &str) -> ClassFile {
    ClassFile::new(name)
        .implements(LISTENER)
        .annotated_method("onJoin", "(Lorg/bukkit/event/player/PlayerJoinEvent;)V", EVENT_HANDLER)
}

/// Runnable task with a `run()V` method
pub fn task(name: &str) -> ClassFile {
    ClassFile::new(name).implements(RUNNABLE).method("run", "()V")
}
