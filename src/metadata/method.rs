use crate::errors::Error;
use crate::jvm::class_file::{
    for_each_attribute, ConstantPool, Deserialize, RUNTIME_VISIBLE_ANNOTATIONS, SIGNATURE,
};
use crate::jvm::{
    BinaryName, ClassName, FieldType, MethodAccessFlags, MethodDescriptor, ParseDescriptor,
};
use crate::metadata::annotations::{parse_runtime_visible, ObjectAnnotations};
use crate::metadata::convert::Converter;
use byteorder::ReadBytesExt;
use std::collections::HashMap;

/// One accessor method of a scanned class
#[derive(Clone, Debug)]
pub struct MethodInfo {
    name: String,
    descriptor: MethodDescriptor,
    /// First type argument of a generic return or parameter signature
    generic_element: Option<FieldType>,
    annotations: ObjectAnnotations,
    converter: Option<Converter>,
    property_name: Option<String>,
}

impl MethodInfo {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &MethodDescriptor {
        &self.descriptor
    }

    pub fn annotations(&self) -> &ObjectAnnotations {
        &self.annotations
    }

    pub fn converter(&self) -> Option<&Converter> {
        self.converter.as_ref()
    }

    /// A no-argument method following the `getX` naming convention
    pub fn is_getter(&self) -> bool {
        self.name.starts_with("get") && self.descriptor.parameters.is_empty()
    }

    /// A void method following the `setX` naming convention
    pub fn is_setter(&self) -> bool {
        self.name.starts_with("set") && self.descriptor.return_type.is_none()
    }

    /// The type a converter could apply to, with the generic element taking
    /// precedence over the raw accessor signature
    pub fn target_type(&self) -> Option<&FieldType> {
        self.generic_element
            .as_ref()
            .or_else(|| self.descriptor.convertible_type())
    }

    /// Does this accessor move a plain value rather than a relationship?
    pub fn is_simple(&self) -> bool {
        if self.converter.is_some() {
            return true;
        }
        match self.target_type() {
            Some(target) => {
                target.is_primitive()
                    || target
                        .object_type()
                        .map_or(false, BinaryName::is_standard_library)
            }
            None => false,
        }
    }

    /// Name of the accessed property in the graph
    ///
    /// Before [`Self::resolve_property_name`] runs this falls back to the
    /// de-prefixed method name.
    pub fn property_name(&self) -> &str {
        match &self.property_name {
            Some(name) => name,
            None => self.bare_name(),
        }
    }

    /// Method name with any `get` / `set` prefix removed
    fn bare_name(&self) -> &str {
        if self.is_getter() || self.is_setter() {
            &self.name[3..]
        } else {
            &self.name
        }
    }

    /// Fix the logical name: `@Property`'s `name`, else `@Relationship`'s
    /// `type`, else the de-prefixed method name
    pub(crate) fn resolve_property_name(&mut self) {
        let fallback = self.bare_name().to_owned();
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

/// The accessor methods of a class, keyed by declared name
#[derive(Clone, Debug, Default)]
pub struct MethodsInfo {
    methods: HashMap<String, MethodInfo>,
}

impl MethodsInfo {
    /// Decode a classfile's method table
    ///
    /// Constructors and methods carrying the transient mapping annotation are
    /// decoded but never recorded.
    pub fn parse<R: ReadBytesExt>(
        reader: &mut R,
        pool: &ConstantPool,
    ) -> Result<MethodsInfo, Error> {
        let count = u16::deserialize(reader)?;
        let mut methods = HashMap::new();
        for _ in 0..count {
            let _access_flags = MethodAccessFlags::deserialize(reader)?;
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
                    generic_element = super::field::extract_generic_element(signature);
                    Ok(true)
                }
                _ => Ok(false),
            })?;

            if name == "<init>" || annotations.has(&ClassName::TRANSIENT) {
                continue;
            }

            let raw_descriptor = pool.expect(descriptor_index)?;
            let descriptor = MethodDescriptor::parse(raw_descriptor)
                .map_err(|_| Error::BadDescriptor(raw_descriptor.to_owned()))?;
            let converter = annotations.resolve_converter();
            methods.insert(
                name.clone(),
                MethodInfo {
                    name,
                    descriptor,
                    generic_element,
                    annotations,
                    converter,
                    property_name: None,
                },
            );
        }
        Ok(MethodsInfo { methods })
    }

    pub fn get(&self, name: &str) -> Option<&MethodInfo> {
        self.methods.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MethodInfo> {
        self.methods.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut MethodInfo> {
        self.methods.values_mut()
    }

    pub fn getters(&self) -> impl Iterator<Item = &MethodInfo> {
        self.methods.values().filter(|method| method.is_getter())
    }

    pub fn setters(&self) -> impl Iterator<Item = &MethodInfo> {
        self.methods.values().filter(|method| method.is_setter())
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// First-wins merge, used when hydrating a stub and when pushing
    /// inherited accessors down a hierarchy
    pub(crate) fn append(&mut self, other: &MethodsInfo) {
        for (name, method) in &other.methods {
            self.methods
                .entry(name.clone())
                .or_insert_with(|| method.clone());
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn method(name: &str, descriptor: &str) -> MethodInfo {
        MethodInfo {
            name: name.to_owned(),
            descriptor: MethodDescriptor::parse(descriptor).unwrap(),
            generic_element: None,
            annotations: ObjectAnnotations::default(),
            converter: None,
            property_name: None,
        }
    }

    #[test]
    fn accessor_shapes() {
        assert!(method("getName", "()Ljava/lang/String;").is_getter());
        assert!(!method("getName", "(I)Ljava/lang/String;").is_getter());
        assert!(method("setName", "(Ljava/lang/String;)V").is_setter());
        assert!(!method("setName", "(Ljava/lang/String;)I").is_setter());
        assert!(!method("name", "()Ljava/lang/String;").is_getter());
    }

    #[test]
    fn de_prefixed_property_names() {
        let mut getter = method("getName", "()Ljava/lang/String;");
        getter.resolve_property_name();
        assert_eq!(getter.property_name(), "Name");

        let mut odd = method("fetch", "()Ljava/lang/String;");
        odd.resolve_property_name();
        assert_eq!(odd.property_name(), "fetch");
    }

    #[test]
    fn simple_accessors() {
        assert!(method("getName", "()Ljava/lang/String;").is_simple());
        assert!(!method("getOwner", "()Lcom/example/Person;").is_simple());
        assert!(!method("compute", "(II)I").is_simple());

        let mut generic = method("getDogs", "()Ljava/util/List;");
        generic.generic_element =
            Some(FieldType::Object(BinaryName::from_string(
                "com/example/Dog".to_owned(),
            )));
        assert!(!generic.is_simple());
    }
}
