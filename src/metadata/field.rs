use crate::errors::Error;
use crate::jvm::class_file::{
    for_each_attribute, ConstantPool, Deserialize, RUNTIME_VISIBLE_ANNOTATIONS, SIGNATURE,
};
use crate::jvm::{BinaryName, ClassName, FieldAccessFlags, FieldType, ParseDescriptor};
use crate::metadata::annotations::{parse_runtime_visible, ObjectAnnotations};
use crate::metadata::convert::Converter;
use byteorder::ReadBytesExt;
use std::collections::HashMap;

/// One persistable field of a scanned class
#[derive(Clone, Debug)]
pub struct FieldInfo {
    name: String,
    descriptor: FieldType,
    /// First type argument of a generic signature (`Dog` for `List<Dog>`)
    generic_element: Option<FieldType>,
    annotations: ObjectAnnotations,
    converter: Option<Converter>,
    /// Logical name in the graph, resolved once the domain is frozen
    property_name: Option<String>,
}

impl FieldInfo {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &FieldType {
        &self.descriptor
    }

    pub fn annotations(&self) -> &ObjectAnnotations {
        &self.annotations
    }

    pub fn converter(&self) -> Option<&Converter> {
        self.converter.as_ref()
    }

    /// The type that classification and conversion look at: the generic
    /// element if the field carried a signature, otherwise the raw type
    pub fn target_type(&self) -> &FieldType {
        self.generic_element.as_ref().unwrap_or(&self.descriptor)
    }

    /// Does this field hold a plain value rather than a relationship?
    ///
    /// Primitives, anything with a converter, and standard-library types are
    /// all values. Everything else points at another domain class.
    pub fn is_simple(&self) -> bool {
        let target = self.target_type();
        target.is_primitive()
            || self.converter.is_some()
            || target
                .object_type()
                .map_or(false, BinaryName::is_standard_library)
    }

    /// Name of this field in the graph
    ///
    /// Before [`Self::resolve_property_name`] runs this falls back to the
    /// declared field name.
    pub fn property_name(&self) -> &str {
        self.property_name.as_deref().unwrap_or(&self.name)
    }

    /// Fix the logical name: `@Property`'s `name`, else `@Relationship`'s
    /// `type`, else the declared field name
    pub(crate) fn resolve_property_name(&mut self) {
        let fallback = self.name.clone();
        let resolved = if let Some(property) = self.annotations.get_mut(&ClassName::PROPERTY) {
            property.get("name", &fallback)
        } else if let Some(relationship) = self.annotations.get_mut(&ClassName::RELATIONSHIP) {
            relationship.get("type", &fallback)
        } else {
            fallback
        };
        self.property_name = Some(resolved);
    }

    pub(crate) fn set_converter_if_absent(&mut self, converter: Option<Converter>) {
        if self.converter.is_none() {
            self.converter = converter;
        }
    }
}

/// The persistable fields of a class, keyed by declared name
#[derive(Clone, Debug, Default)]
pub struct FieldsInfo {
    fields: HashMap<String, FieldInfo>,
}

impl FieldsInfo {
    /// Decode a classfile's field table
    ///
    /// Static, final, and transient fields are decoded (their bytes have to
    /// be consumed either way) but never recorded, and neither are fields
    /// carrying the transient mapping annotation.
    pub fn parse<R: ReadBytesExt>(
        reader: &mut R,
        pool: &ConstantPool,
    ) -> Result<FieldsInfo, Error> {
        let count = u16::deserialize(reader)?;
        let mut fields = HashMap::new();
        for _ in 0..count {
            let access_flags = FieldAccessFlags::deserialize(reader)?;
            let name = pool.expect(u16::deserialize(reader)?)?.to_owned();
            let descriptor_index = u16::deserialize(reader)?;

            let mut annotations = ObjectAnnotations::default();
            let mut generic_element = None;
            for_each_attribute(reader, pool, |reader, attribute| match attribute {
                RUNTIME_VISIBLE_ANNOTATIONS => {
                    for annotation in parse_runtime_visible(reader, pool)? {
                        annotations.add(annotation);
                    }
                    Ok(true)
                }
                SIGNATURE => {
                    let signature = pool.expect(u16::deserialize(reader)?)?;
                    generic_element = extract_generic_element(signature);
                    Ok(true)
                }
                _ => Ok(false),
            })?;

            let skipped = access_flags.intersects(
                FieldAccessFlags::STATIC | FieldAccessFlags::FINAL | FieldAccessFlags::TRANSIENT,
            ) || annotations.has(&ClassName::TRANSIENT);
            if skipped {
                continue;
            }

            let raw_descriptor = pool.expect(descriptor_index)?;
            let descriptor = FieldType::parse(raw_descriptor)
                .map_err(|_| Error::BadDescriptor(raw_descriptor.to_owned()))?;
            let converter = annotations.resolve_converter();
            fields.insert(
                name.clone(),
                FieldInfo {
                    name,
                    descriptor,
                    generic_element,
                    annotations,
                    converter,
                    property_name: None,
                },
            );
        }
        Ok(FieldsInfo { fields })
    }

    pub fn get(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldInfo> {
        self.fields.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut FieldInfo> {
        self.fields.values_mut()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// First-wins merge, used when hydrating a stub and when pushing
    /// inherited fields down a hierarchy
    pub(crate) fn append(&mut self, other: &FieldsInfo) {
        for (name, field) in &other.fields {
            self.fields
                .entry(name.clone())
                .or_insert_with(|| field.clone());
        }
    }
}

/// Pull the first type argument out of a generic signature
///
/// `Ljava/util/List<Lcom/example/Dog;>;` yields the `Dog` object type. Type
/// variables and wildcards do not parse as field types and yield `None`.
pub(crate) fn extract_generic_element(signature: &str) -> Option<FieldType> {
    let open = signature.find('<')?;
    let close = signature.find('>')?;
    let arguments = signature.get(open + 1..close)?;
    let mut chars = arguments.chars().peekable();
    FieldType::parse_from(&mut chars).ok()
}
