//! Name and version helpers for class-file data.

/// Convert a JVM internal name (`org/bukkit/event/Listener`) to its dotted form.
pub(crate) fn internal_to_dotted(name: &str) -> String {
    name.replace('/', ".")
}

/// Convert an annotation field descriptor (`Lorg/bukkit/event/EventHandler;`)
/// to a dotted type name. Returns `None` for anything that is not an object type.
pub(crate) fn annotation_type_name(descriptor: &str) -> Option<String> {
    descriptor
        .strip_prefix('L')
        .and_then(|rest| rest.strip_suffix(';'))
        .filter(|inner| !inner.is_empty())
        .map(internal_to_dotted)
}

pub(crate) fn major_to_java_version(major: u16) -> String {
    match major {
        45 => "1.1".to_string(),
        46 => "1.2".to_string(),
        47 => "1.3".to_string(),
        48 => "1.4".to_string(),
        49..=255 => format!("{}", major - 44),
        _ => format!("unknown ({})", major),
    }
}

/// Whether a file name looks like a compiled class we should load.
/// `module-info` and `package-info` carry no class hierarchy.
pub(crate) fn is_class_file_name(file_name: &str) -> bool {
    file_name.ends_with(".class")
        && file_name != "module-info.class"
        && file_name != "package-info.class"
}
