//! Java class file parsing.
//!
//! Reads just enough of the class-file format to answer hierarchy questions:
//! the constant pool, class identity, supertypes, members with their
//! annotations, and the attributes that tie nested classes to their outer class.

use super::helpers::{annotation_type_name, internal_to_dotted, major_to_java_version};
use crate::types::{access, ClassDescriptor, MemberDescriptor, MemberKind};
use anyhow::{bail, Context, Result};

const CLASS_MAGIC: u32 = 0xCAFE_BABE;

#[derive(Debug, Clone)]
enum ConstantPoolEntry {
    Empty,
    Utf8(String),
    Class(u16),
    /// Numeric, reference and dynamic entries; only their size matters here
    Other,
}

/// Bounds-checked big-endian cursor over class bytes.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn bytes(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len());
        let Some(end) = end else {
            bail!("Truncated {} at offset {:#x}", what, self.pos);
        };
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.bytes(1, what)?[0])
    }

    fn u16(&mut self, what: &str) -> Result<u16> {
        let b = self.bytes(2, what)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self, what: &str) -> Result<u32> {
        let b = self.bytes(4, what)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn skip(&mut self, len: usize, what: &str) -> Result<()> {
        self.bytes(len, what).map(|_| ())
    }
}

struct ConstantPool(Vec<ConstantPoolEntry>);

impl ConstantPool {
    fn parse(reader: &mut Reader<'_>) -> Result<Self> {
        let count = reader.u16("constant pool count")? as usize;
        let mut entries = vec![ConstantPoolEntry::Empty; count.max(1)];
        let mut i = 1;
        while i < count {
            let tag = reader.u8("constant pool tag")?;
            let mut wide = false;
            let entry = match tag {
                1 => {
                    let length = reader.u16("UTF8 length")? as usize;
                    let raw = reader.bytes(length, "UTF8 string")?;
                    ConstantPoolEntry::Utf8(String::from_utf8_lossy(raw).into_owned())
                }
                7 => ConstantPoolEntry::Class(reader.u16("class entry")?),
                // String, MethodType, Module, Package
                8 | 16 | 19 | 20 => {
                    reader.skip(2, "constant pool entry")?;
                    ConstantPoolEntry::Other
                }
                // MethodHandle
                15 => {
                    reader.skip(3, "method handle entry")?;
                    ConstantPoolEntry::Other
                }
                // Integer, Float, Fieldref, Methodref, InterfaceMethodref,
                // NameAndType, Dynamic, InvokeDynamic
                3 | 4 | 9 | 10 | 11 | 12 | 17 | 18 => {
                    reader.skip(4, "constant pool entry")?;
                    ConstantPoolEntry::Other
                }
                // Long and Double take two slots
                5 | 6 => {
                    reader.skip(8, "wide constant")?;
                    wide = true;
                    ConstantPoolEntry::Other
                }
                other => bail!("Unknown constant pool tag {} at index {}", other, i),
            };
            entries[i] = entry;
            i += if wide { 2 } else { 1 };
        }
        Ok(Self(entries))
    }

    fn utf8(&self, index: u16) -> Result<&str> {
        match self.0.get(index as usize) {
            Some(ConstantPoolEntry::Utf8(s)) => Ok(s),
            Some(_) => bail!("Constant pool index {} is not a UTF8 entry", index),
            None => bail!("Constant pool index {} out of range", index),
        }
    }

    /// Internal name of a `Class` entry.
    fn class_name(&self, index: u16) -> Result<&str> {
        match self.0.get(index as usize) {
            Some(ConstantPoolEntry::Class(name_index)) => self.utf8(*name_index),
            Some(_) => bail!("Constant pool index {} is not a class entry", index),
            None => bail!("Constant pool index {} out of range", index),
        }
    }

    fn optional_class_name(&self, index: u16) -> Result<Option<&str>> {
        if index == 0 {
            Ok(None)
        } else {
            self.class_name(index).map(Some)
        }
    }
}

/// Class-level attributes relevant to nesting.
#[derive(Default)]
struct NestingInfo {
    inner_classes_outer: Option<String>,
    enclosing_method_class: Option<String>,
    nest_host: Option<String>,
    synthetic_attribute: bool,
}

impl NestingInfo {
    fn enclosing(self) -> Option<String> {
        self.inner_classes_outer
            .or(self.enclosing_method_class)
            .or(self.nest_host)
    }
}

/// Parse one compiled class into a descriptor.
pub(crate) fn parse_class_file(data: &[u8]) -> Result<ClassDescriptor> {
    let mut reader = Reader::new(data);

    let magic = reader.u32("magic").context("File too small to be a valid class file")?;
    if magic != CLASS_MAGIC {
        bail!("Invalid class file magic number {:#010x}", magic);
    }
    let _minor = reader.u16("minor version")?;
    let major = reader.u16("major version")?;

    let pool = ConstantPool::parse(&mut reader)?;

    let access_flags = reader.u16("access flags")?;
    let this_class = reader.u16("this_class")?;
    let name = pool.class_name(this_class).context("Invalid this_class")?.to_string();
    let super_class = reader.u16("super_class")?;
    let superclass = pool
        .optional_class_name(super_class)
        .context("Invalid super_class")?
        .map(internal_to_dotted);

    let interface_count = reader.u16("interface count")?;
    let mut interfaces = Vec::with_capacity(interface_count as usize);
    for _ in 0..interface_count {
        let index = reader.u16("interface index")?;
        interfaces.push(internal_to_dotted(
            pool.class_name(index).context("Invalid interface entry")?,
        ));
    }

    let mut members = Vec::new();
    for kind in [MemberKind::Field, MemberKind::Method] {
        let count = reader.u16("member count")?;
        for _ in 0..count {
            members.push(parse_member(&mut reader, &pool, kind)?);
        }
    }

    let nesting = parse_class_attributes(&mut reader, &pool, &name)?;
    let synthetic = access_flags & access::ACC_SYNTHETIC != 0 || nesting.synthetic_attribute;

    tracing::trace!(
        "Parsed {} (Java {}, {} members)",
        name,
        major_to_java_version(major),
        members.len()
    );

    Ok(ClassDescriptor {
        name: internal_to_dotted(&name),
        superclass,
        interfaces,
        members,
        enclosing: nesting.enclosing(),
        access: access_flags,
        synthetic,
        origin: String::new(),
    })
}

fn parse_member(reader: &mut Reader<'_>, pool: &ConstantPool, kind: MemberKind) -> Result<MemberDescriptor> {
    let access_flags = reader.u16("member access flags")?;
    let name = pool.utf8(reader.u16("member name")?)?.to_string();
    let descriptor = pool.utf8(reader.u16("member descriptor")?)?.to_string();

    let mut annotations = Vec::new();
    let attribute_count = reader.u16("member attribute count")?;
    for _ in 0..attribute_count {
        let attr_name = pool.utf8(reader.u16("attribute name")?)?;
        let length = reader.u32("attribute length")? as usize;
        let body = reader.bytes(length, "attribute body")?;
        if attr_name == "RuntimeVisibleAnnotations" || attr_name == "RuntimeInvisibleAnnotations" {
            let mut body_reader = Reader::new(body);
            read_annotations(&mut body_reader, pool, &mut annotations)
                .with_context(|| format!("Malformed annotations on member {}", name))?;
        }
    }

    Ok(MemberDescriptor {
        name,
        kind,
        descriptor,
        access: access_flags,
        annotations,
    })
}

fn parse_class_attributes(reader: &mut Reader<'_>, pool: &ConstantPool, this_name: &str) -> Result<NestingInfo> {
    let mut nesting = NestingInfo::default();
    let attribute_count = reader.u16("class attribute count")?;
    for _ in 0..attribute_count {
        let attr_name = pool.utf8(reader.u16("attribute name")?)?;
        let length = reader.u32("attribute length")? as usize;
        let body = reader.bytes(length, "attribute body")?;
        let mut body_reader = Reader::new(body);
        match attr_name {
            "InnerClasses" => {
                let count = body_reader.u16("inner class count")?;
                for _ in 0..count {
                    let inner = body_reader.u16("inner class index")?;
                    let outer = body_reader.u16("outer class index")?;
                    body_reader.skip(4, "inner class entry")?;
                    if pool.class_name(inner)? == this_name {
                        if let Some(outer) = pool.optional_class_name(outer)? {
                            nesting.inner_classes_outer = Some(internal_to_dotted(outer));
                        }
                    }
                }
            }
            "EnclosingMethod" => {
                let class_index = body_reader.u16("enclosing class index")?;
                nesting.enclosing_method_class =
                    Some(internal_to_dotted(pool.class_name(class_index)?));
            }
            "NestHost" => {
                let host = body_reader.u16("nest host index")?;
                nesting.nest_host = Some(internal_to_dotted(pool.class_name(host)?));
            }
            "Synthetic" => nesting.synthetic_attribute = true,
            _ => {}
        }
    }
    Ok(nesting)
}

fn read_annotations(reader: &mut Reader<'_>, pool: &ConstantPool, out: &mut Vec<String>) -> Result<()> {
    let count = reader.u16("annotation count")?;
    for _ in 0..count {
        if let Some(type_name) = read_annotation(reader, pool)? {
            out.push(type_name);
        }
    }
    Ok(())
}

/// Reads one annotation structure and returns its type name.
fn read_annotation(reader: &mut Reader<'_>, pool: &ConstantPool) -> Result<Option<String>> {
    let type_index = reader.u16("annotation type")?;
    let type_name = annotation_type_name(pool.utf8(type_index)?);
    let pairs = reader.u16("annotation pair count")?;
    for _ in 0..pairs {
        reader.skip(2, "annotation element name")?;
        skip_element_value(reader, pool)?;
    }
    Ok(type_name)
}

fn skip_element_value(reader: &mut Reader<'_>, pool: &ConstantPool) -> Result<()> {
    let tag = reader.u8("element value tag")?;
    match tag {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' | b'c' => {
            reader.skip(2, "element value")?;
        }
        b'e' => reader.skip(4, "enum element value")?,
        b'@' => {
            read_annotation(reader, pool)?;
        }
        b'[' => {
            let count = reader.u16("array element count")?;
            for _ in 0..count {
                skip_element_value(reader, pool)?;
            }
        }
        other => bail!("Unknown element value tag {:?}", other as char),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_short_input() {
        let err = parse_class_file(&[0xCA, 0xFE]).unwrap_err();
        assert!(format!("{:#}", err).contains("too small"));
    }

    #[test]
    fn test_rejects_bad_magic() {
        let data = [0xDE, 0xAD, 0xBE, 0xEF, 0, 0, 0, 52, 0, 1];
        let err = parse_class_file(&data).unwrap_err();
        assert!(err.to_string().contains("magic"));
    }

    #[test]
    fn test_rejects_truncated_constant_pool() {
        // magic, version 52, pool count 3, one UTF8 entry claiming 10 bytes
        let data = [
            0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 52, 0, 3, 1, 0, 10, b'a', b'b',
        ];
        let err = parse_class_file(&data).unwrap_err();
        assert!(err.to_string().contains("Truncated"));
    }

    #[test]
    fn test_rejects_unknown_constant_tag() {
        let data = [0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 52, 0, 2, 99, 0, 0];
        let err = parse_class_file(&data).unwrap_err();
        assert!(err.to_string().contains("Unknown constant pool tag 99"));
    }

    #[test]
    fn test_rejects_this_class_pointing_at_utf8() {
        // pool: #1 Utf8 "A"; this_class = #1 (not a Class entry)
        let data = [
            0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 52, 0, 2, 1, 0, 1, b'A', 0, 0x21, 0, 1, 0, 0,
        ];
        let err = parse_class_file(&data).unwrap_err();
        assert!(format!("{:#}", err).contains("not a class entry"));
    }
}
