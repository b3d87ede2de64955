use crate::errors::Error;
use crate::jvm::class_file::{
    for_each_attribute, skip_bytes, ConstantPool, Deserialize, RUNTIME_VISIBLE_ANNOTATIONS,
};
use crate::jvm::ClassName;
use crate::metadata::convert::Converter;
use byteorder::ReadBytesExt;
use std::collections::HashMap;

/// One decoded runtime-visible annotation instance
///
/// Element values are kept as strings resolved through the constant pool.
/// Enum-constant and array element values are consumed but dropped; the
/// extractor has no use for them.
#[derive(Clone, Debug)]
pub struct AnnotationInfo {
    name: ClassName,
    elements: HashMap<String, String>,
}

impl AnnotationInfo {
    /// Decode one `annotation` structure
    pub fn parse<R: ReadBytesExt>(
        reader: &mut R,
        pool: &ConstantPool,
    ) -> Result<AnnotationInfo, Error> {
        let type_index = u16::deserialize(reader)?;
        let descriptor = pool.expect(type_index)?;
        let name = annotation_type_name(descriptor);

        let pair_count = u16::deserialize(reader)?;
        let mut elements = HashMap::new();
        for _ in 0..pair_count {
            let name_index = u16::deserialize(reader)?;
            let key = pool.expect(name_index)?.to_owned();
            if let Some(value) = parse_element_value(reader, pool)? {
                // Duplicate keys in the same decode pass: last one wins
                elements.insert(key, value);
            }
        }
        Ok(AnnotationInfo { name, elements })
    }

    #[cfg(test)]
    fn with_elements(name: ClassName, elements: HashMap<String, String>) -> AnnotationInfo {
        AnnotationInfo { name, elements }
    }

    /// Fully qualified name of the annotation type
    pub fn name(&self) -> &ClassName {
        &self.name
    }

    /// Read an element value, falling back to `default`
    ///
    /// The first default used for a missing key is remembered, as if it had
    /// been decoded from the classfile; later reads of the same key return it
    /// regardless of their own default.
    pub fn get(&mut self, key: &str, default: &str) -> String {
        self.elements
            .entry(key.to_owned())
            .or_insert_with(|| default.to_owned())
            .clone()
    }

    /// Non-memoizing peek at a decoded element
    pub fn element(&self, key: &str) -> Option<&str> {
        self.elements.get(key).map(String::as_str)
    }
}

/// Annotation type descriptor (`Lfoo/Bar;`) to its dotted name (`foo.Bar`)
fn annotation_type_name(descriptor: &str) -> ClassName {
    let stripped = descriptor
        .strip_prefix('L')
        .and_then(|rest| rest.strip_suffix(';'))
        .unwrap_or(descriptor);
    ClassName::from_internal(stripped)
}

/// Decode one `element_value`, returning `None` for the value kinds the
/// extractor intentionally drops
fn parse_element_value<R: ReadBytesExt>(
    reader: &mut R,
    pool: &ConstantPool,
) -> Result<Option<String>, Error> {
    match u8::deserialize(reader)? {
        // Primitive and string constants, class literals, and nested
        // annotations all reduce to a constant-pool string. Numeric entries
        // were skipped while building the pool, so their lookups come back
        // empty and the pair is dropped.
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' | b'c' | b'@' => {
            let value_index = u16::deserialize(reader)?;
            Ok(pool.lookup(value_index).map(str::to_owned))
        }
        // Enum constant: type-name and const-name indexes, both unused
        b'e' => {
            skip_bytes(reader, 4)?;
            Ok(None)
        }
        // Array: consume every nested value, keep none
        b'[' => {
            let count = u16::deserialize(reader)?;
            for _ in 0..count {
                parse_element_value(reader, pool)?;
            }
            Ok(None)
        }
        other => Err(Error::UnknownAnnotationElementTag(other)),
    }
}

/// Decode the payload of a `RuntimeVisibleAnnotations` attribute
pub(crate) fn parse_runtime_visible<R: ReadBytesExt>(
    reader: &mut R,
    pool: &ConstantPool,
) -> Result<Vec<AnnotationInfo>, Error> {
    let count = u16::deserialize(reader)?;
    (0..count)
        .map(|_| AnnotationInfo::parse(reader, pool))
        .collect()
}

/// Class-level annotation bag
#[derive(Clone, Debug, Default)]
pub struct AnnotationsInfo {
    annotations: HashMap<ClassName, AnnotationInfo>,
}

impl AnnotationsInfo {
    pub fn empty() -> AnnotationsInfo {
        AnnotationsInfo::default()
    }

    /// Decode a class's attribute table, keeping `RuntimeVisibleAnnotations`
    /// and skipping everything else by declared length
    pub fn parse<R: ReadBytesExt>(
        reader: &mut R,
        pool: &ConstantPool,
    ) -> Result<AnnotationsInfo, Error> {
        let mut annotations = HashMap::new();
        for_each_attribute(reader, pool, |reader, attribute| {
            if attribute == RUNTIME_VISIBLE_ANNOTATIONS {
                for annotation in parse_runtime_visible(reader, pool)? {
                    annotations.insert(annotation.name().clone(), annotation);
                }
                Ok(true)
            } else {
                Ok(false)
            }
        })?;
        Ok(AnnotationsInfo { annotations })
    }

    pub fn get(&self, name: &ClassName) -> Option<&AnnotationInfo> {
        self.annotations.get(name.as_str())
    }

    pub fn get_mut(&mut self, name: &ClassName) -> Option<&mut AnnotationInfo> {
        self.annotations.get_mut(name.as_str())
    }

    pub fn has(&self, name: &ClassName) -> bool {
        self.annotations.contains_key(name.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &ClassName> {
        self.annotations.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Merge annotations in during hydration; existing keys are never
    /// overwritten, unlike same-pass decoding where the last one wins
    pub fn append(&mut self, other: &AnnotationsInfo) {
        for (name, annotation) in &other.annotations {
            self.annotations
                .entry(name.clone())
                .or_insert_with(|| annotation.clone());
        }
    }
}

/// Per-member annotation bag plus converter resolution
#[derive(Clone, Debug, Default)]
pub struct ObjectAnnotations {
    annotations: HashMap<ClassName, AnnotationInfo>,
}

impl ObjectAnnotations {
    /// Record a freshly decoded annotation (same-pass duplicates: last wins)
    pub fn add(&mut self, annotation: AnnotationInfo) {
        self.annotations
            .insert(annotation.name().clone(), annotation);
    }

    pub fn get(&self, name: &ClassName) -> Option<&AnnotationInfo> {
        self.annotations.get(name.as_str())
    }

    pub fn get_mut(&mut self, name: &ClassName) -> Option<&mut AnnotationInfo> {
        self.annotations.get_mut(name.as_str())
    }

    pub fn has(&self, name: &ClassName) -> bool {
        self.annotations.contains_key(name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// First-wins merge, used when hydrating a stub
    pub fn append(&mut self, other: &ObjectAnnotations) {
        for (name, annotation) in &other.annotations {
            self.annotations
                .entry(name.clone())
                .or_insert_with(|| annotation.clone());
        }
    }

    /// Resolve an explicitly requested converter from the conversion
    /// annotations on this member
    pub fn resolve_converter(&mut self) -> Option<Converter> {
        if let Some(date) = self.get_mut(&ClassName::DATE_STRING) {
            return Some(Converter::DateString {
                format: date.get("value", Converter::ISO_8601),
            });
        }
        if self.has(&ClassName::DATE_LONG) {
            return Some(Converter::DateLong);
        }
        if let Some(enumeration) = self.get_mut(&ClassName::ENUM_STRING) {
            return Some(Converter::EnumString {
                enum_type: ClassName::from_string(enumeration.get("value", "")),
            });
        }
        if let Some(number) = self.get_mut(&ClassName::NUMBER_STRING) {
            return Some(Converter::NumberString {
                number_type: ClassName::from_string(number.get("value", "")),
            });
        }
        None
    }
}
