//! Hand-rolled classfile writer for exercising the extractor end to end
//!
//! Emits just enough of the classfile format to cover what the reader
//! decodes: a deduplicating constant pool, access flags, interfaces, fields
//! and methods with `RuntimeVisibleAnnotations` and `Signature` attributes.

#![allow(dead_code)]

use byteorder::{BigEndian, WriteBytesExt};
use std::collections::HashMap;

const MAJOR_VERSION: u16 = 52; // Java 8

// Class access flags
pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_SUPER: u16 = 0x0020;
pub const ACC_INTERFACE: u16 = 0x0200;
pub const ACC_ABSTRACT: u16 = 0x0400;
pub const ACC_ENUM: u16 = 0x4000;

// Field access flags
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_FINAL: u16 = 0x0010;
pub const ACC_TRANSIENT: u16 = 0x0080;

/// Growing constant pool with deduplicated UTF-8 and class entries
#[derive(Default)]
struct ConstantsPool {
    bytes: Vec<u8>,
    entries: u16,
    utf8: HashMap<String, u16>,
    classes: HashMap<String, u16>,
}

impl ConstantsPool {
    fn utf8(&mut self, value: &str) -> u16 {
        if let Some(&index) = self.utf8.get(value) {
            return index;
        }
        self.entries += 1;
        self.bytes.write_u8(1).unwrap();
        self.bytes
            .write_u16::<BigEndian>(value.len() as u16)
            .unwrap();
        self.bytes.extend_from_slice(value.as_bytes());
        self.utf8.insert(value.to_owned(), self.entries);
        self.entries
    }

    fn class(&mut self, name: &str) -> u16 {
        if let Some(&index) = self.classes.get(name) {
            return index;
        }
        let name_index = self.utf8(name);
        self.entries += 1;
        self.bytes.write_u8(7).unwrap();
        self.bytes.write_u16::<BigEndian>(name_index).unwrap();
        self.classes.insert(name.to_owned(), self.entries);
        self.entries
    }
}

/// One annotation to attach to a class, field, or method
#[derive(Clone)]
pub struct AnnotationSpec {
    descriptor: String,
    elements: Vec<(String, String)>,
}

impl AnnotationSpec {
    pub fn new(dotted_name: &str) -> AnnotationSpec {
        AnnotationSpec {
            descriptor: format!("L{};", dotted_name.replace('.', "/")),
            elements: vec![],
        }
    }

    pub fn element(mut self, name: &str, value: &str) -> AnnotationSpec {
        self.elements.push((name.to_owned(), value.to_owned()));
        self
    }

    fn encode(&self, pool: &mut ConstantsPool, out: &mut Vec<u8>) {
        let type_index = pool.utf8(&self.descriptor);
        out.write_u16::<BigEndian>(type_index).unwrap();
        out.write_u16::<BigEndian>(self.elements.len() as u16)
            .unwrap();
        for (name, value) in &self.elements {
            let name_index = pool.utf8(name);
            let value_index = pool.utf8(value);
            out.write_u16::<BigEndian>(name_index).unwrap();
            out.write_u8(b's').unwrap();
            out.write_u16::<BigEndian>(value_index).unwrap();
        }
    }
}

pub fn node_entity() -> AnnotationSpec {
    AnnotationSpec::new("io.class2graph.annotation.NodeEntity")
}

pub fn node_entity_labelled(label: &str) -> AnnotationSpec {
    node_entity().element("label", label)
}

pub fn graph_id() -> AnnotationSpec {
    AnnotationSpec::new("io.class2graph.annotation.GraphId")
}

pub fn property(name: &str) -> AnnotationSpec {
    AnnotationSpec::new("io.class2graph.annotation.Property").element("name", name)
}

pub fn relationship(kind: &str) -> AnnotationSpec {
    AnnotationSpec::new("io.class2graph.annotation.Relationship").element("type", kind)
}

pub fn transient() -> AnnotationSpec {
    AnnotationSpec::new("io.class2graph.annotation.Transient")
}

pub fn date_string(format: &str) -> AnnotationSpec {
    AnnotationSpec::new("io.class2graph.typeconversion.DateString").element("value", format)
}

pub fn date_long() -> AnnotationSpec {
    AnnotationSpec::new("io.class2graph.typeconversion.DateLong")
}

/// One field declaration
#[derive(Clone)]
pub struct FieldSpec {
    name: String,
    descriptor: String,
    flags: u16,
    signature: Option<String>,
    annotations: Vec<AnnotationSpec>,
}

impl FieldSpec {
    pub fn new(name: &str, descriptor: &str) -> FieldSpec {
        FieldSpec {
            name: name.to_owned(),
            descriptor: descriptor.to_owned(),
            flags: 0x0002, // private
            signature: None,
            annotations: vec![],
        }
    }

    pub fn flags(mut self, flags: u16) -> FieldSpec {
        self.flags = flags;
        self
    }

    pub fn signature(mut self, signature: &str) -> FieldSpec {
        self.signature = Some(signature.to_owned());
        self
    }

    pub fn annotate(mut self, annotation: AnnotationSpec) -> FieldSpec {
        self.annotations.push(annotation);
        self
    }
}

/// One method declaration
#[derive(Clone)]
pub struct MethodSpec {
    name: String,
    descriptor: String,
    flags: u16,
    signature: Option<String>,
    annotations: Vec<AnnotationSpec>,
}

impl MethodSpec {
    pub fn new(name: &str, descriptor: &str) -> MethodSpec {
        MethodSpec {
            name: name.to_owned(),
            descriptor: descriptor.to_owned(),
            flags: ACC_PUBLIC,
            signature: None,
            annotations: vec![],
        }
    }

    pub fn signature(mut self, signature: &str) -> MethodSpec {
        self.signature = Some(signature.to_owned());
        self
    }

    pub fn annotate(mut self, annotation: AnnotationSpec) -> MethodSpec {
        self.annotations.push(annotation);
        self
    }
}

/// Assemble a complete classfile byte for byte
pub struct ClassFileBuilder {
    name: String,
    superclass: Option<String>,
    access: u16,
    interfaces: Vec<String>,
    annotations: Vec<AnnotationSpec>,
    fields: Vec<FieldSpec>,
    methods: Vec<MethodSpec>,
}

impl ClassFileBuilder {
    /// New public class extending `java/lang/Object`
    pub fn new(internal_name: &str) -> ClassFileBuilder {
        ClassFileBuilder {
            name: internal_name.to_owned(),
            superclass: Some("java/lang/Object".to_owned()),
            access: ACC_PUBLIC | ACC_SUPER,
            interfaces: vec![],
            annotations: vec![],
            fields: vec![],
            methods: vec![],
        }
    }

    pub fn superclass(mut self, internal_name: &str) -> ClassFileBuilder {
        self.superclass = Some(internal_name.to_owned());
        self
    }

    pub fn access(mut self, access: u16) -> ClassFileBuilder {
        self.access = access;
        self
    }

    pub fn interface_type(mut self) -> ClassFileBuilder {
        self.access = ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT;
        self.superclass = Some("java/lang/Object".to_owned());
        self
    }

    pub fn abstract_type(mut self) -> ClassFileBuilder {
        self.access |= ACC_ABSTRACT;
        self
    }

    pub fn enum_type(mut self) -> ClassFileBuilder {
        self.access |= ACC_ENUM;
        self.superclass = Some("java/lang/Enum".to_owned());
        self
    }

    pub fn implements(mut self, internal_name: &str) -> ClassFileBuilder {
        self.interfaces.push(internal_name.to_owned());
        self
    }

    pub fn annotate(mut self, annotation: AnnotationSpec) -> ClassFileBuilder {
        self.annotations.push(annotation);
        self
    }

    pub fn field(mut self, field: FieldSpec) -> ClassFileBuilder {
        self.fields.push(field);
        self
    }

    pub fn method(mut self, method: MethodSpec) -> ClassFileBuilder {
        self.methods.push(method);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut pool = ConstantsPool::default();

        let this_class = pool.class(&self.name);
        let super_class = self
            .superclass
            .as_deref()
            .map(|name| pool.class(name))
            .unwrap_or(0);
        let interfaces: Vec<u16> = self
            .interfaces
            .iter()
            .map(|name| pool.class(name))
            .collect();

        let mut members = vec![];
        members
            .write_u16::<BigEndian>(self.fields.len() as u16)
            .unwrap();
        for field in &self.fields {
            let name = pool.utf8(&field.name);
            let descriptor = pool.utf8(&field.descriptor);
            members.write_u16::<BigEndian>(field.flags).unwrap();
            members.write_u16::<BigEndian>(name).unwrap();
            members.write_u16::<BigEndian>(descriptor).unwrap();
            write_member_attributes(
                &mut members,
                &mut pool,
                &field.annotations,
                field.signature.as_deref(),
            );
        }
        members
            .write_u16::<BigEndian>(self.methods.len() as u16)
            .unwrap();
        for method in &self.methods {
            let name = pool.utf8(&method.name);
            let descriptor = pool.utf8(&method.descriptor);
            members.write_u16::<BigEndian>(method.flags).unwrap();
            members.write_u16::<BigEndian>(name).unwrap();
            members.write_u16::<BigEndian>(descriptor).unwrap();
            write_member_attributes(
                &mut members,
                &mut pool,
                &method.annotations,
                method.signature.as_deref(),
            );
        }

        let mut class_attributes = vec![];
        write_member_attributes(&mut class_attributes, &mut pool, &self.annotations, None);

        let mut out = vec![];
        out.write_u32::<BigEndian>(0xCAFE_BABE).unwrap();
        out.write_u16::<BigEndian>(0).unwrap(); // minor
        out.write_u16::<BigEndian>(MAJOR_VERSION).unwrap();
        out.write_u16::<BigEndian>(pool.entries + 1).unwrap();
        out.extend_from_slice(&pool.bytes);
        out.write_u16::<BigEndian>(self.access).unwrap();
        out.write_u16::<BigEndian>(this_class).unwrap();
        out.write_u16::<BigEndian>(super_class).unwrap();
        out.write_u16::<BigEndian>(interfaces.len() as u16).unwrap();
        for interface in interfaces {
            out.write_u16::<BigEndian>(interface).unwrap();
        }
        out.extend_from_slice(&members);
        out.extend_from_slice(&class_attributes);
        out
    }
}

/// Attribute table: `RuntimeVisibleAnnotations` and `Signature` as needed
fn write_member_attributes(
    out: &mut Vec<u8>,
    pool: &mut ConstantsPool,
    annotations: &[AnnotationSpec],
    signature: Option<&str>,
) {
    let mut count = 0;
    let mut attributes = vec![];

    if !annotations.is_empty() {
        let name = pool.utf8("RuntimeVisibleAnnotations");
        let mut payload = vec![];
        payload
            .write_u16::<BigEndian>(annotations.len() as u16)
            .unwrap();
        for annotation in annotations {
            annotation.encode(pool, &mut payload);
        }
        attributes.write_u16::<BigEndian>(name).unwrap();
        attributes
            .write_u32::<BigEndian>(payload.len() as u32)
            .unwrap();
        attributes.extend_from_slice(&payload);
        count += 1;
    }

    if let Some(signature) = signature {
        let name = pool.utf8("Signature");
        let value = pool.utf8(signature);
        attributes.write_u16::<BigEndian>(name).unwrap();
        attributes.write_u32::<BigEndian>(2).unwrap();
        attributes.write_u16::<BigEndian>(value).unwrap();
        count += 1;
    }

    out.write_u16::<BigEndian>(count).unwrap();
    out.extend_from_slice(&attributes);
}
