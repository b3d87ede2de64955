use crate::errors::Error;
use crate::jvm::class_file::{ConstantPool, Deserialize};
use crate::jvm::{BinaryName, ClassAccessFlags, ClassName, FieldType, RenderDescriptor};
use crate::metadata::annotations::{AnnotationsInfo, ObjectAnnotations};
use crate::metadata::field::{FieldInfo, FieldsInfo};
use crate::metadata::interface::InterfacesInfo;
use crate::metadata::method::{MethodInfo, MethodsInfo};
use byteorder::ReadBytesExt;

/// Magic number opening every classfile
const MAGIC: u32 = 0xCAFE_BABE;

/// Stable handle to a class node in a [`DomainInfo`][super::DomainInfo]
///
/// Handles index into the domain's node arena, so links between nodes stay
/// valid while nodes are hydrated in place.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClassId(pub(crate) u32);

/// Metadata node for one class or interface
///
/// A node starts either fully decoded from a classfile or as a bare stub
/// created to satisfy a forward reference; stubs are hydrated in place when
/// their classfile turns up.
#[derive(Clone, Debug)]
pub struct ClassInfo {
    name: ClassName,
    superclass_name: Option<ClassName>,
    /// Classfile version, `(major, minor)`
    version: (u16, u16),
    is_interface: bool,
    is_abstract: bool,
    is_enum: bool,
    hydrated: bool,
    annotations: AnnotationsInfo,
    interfaces: InterfacesInfo,
    fields: FieldsInfo,
    methods: MethodsInfo,
    /// Graph label, resolved once the whole domain has been scanned
    label: Option<String>,
    pub(crate) superclass: Option<ClassId>,
    pub(crate) subclasses: Vec<ClassId>,
    pub(crate) direct_interfaces: Vec<ClassId>,
    pub(crate) implementing_classes: Vec<ClassId>,
}

impl ClassInfo {
    /// Decode one complete classfile
    pub fn parse<R: ReadBytesExt>(reader: &mut R) -> Result<ClassInfo, Error> {
        let magic = u32::deserialize(reader)?;
        if magic != MAGIC {
            return Err(Error::BadMagic(magic));
        }
        let minor = u16::deserialize(reader)?;
        let major = u16::deserialize(reader)?;
        let pool = ConstantPool::parse(reader)?;

        let access_flags = ClassAccessFlags::deserialize(reader)?;
        let name = ClassName::from_internal(pool.expect(u16::deserialize(reader)?)?);
        let superclass_name = pool
            .lookup(u16::deserialize(reader)?)
            .map(ClassName::from_internal);
        let interfaces = InterfacesInfo::parse(reader, &pool)?;
        let fields = FieldsInfo::parse(reader, &pool)?;
        let methods = MethodsInfo::parse(reader, &pool)?;
        let annotations = AnnotationsInfo::parse(reader, &pool)?;

        Ok(ClassInfo {
            name,
            superclass_name,
            version: (major, minor),
            is_interface: access_flags.contains(ClassAccessFlags::INTERFACE),
            is_abstract: access_flags.contains(ClassAccessFlags::ABSTRACT),
            is_enum: access_flags.contains(ClassAccessFlags::ENUM),
            hydrated: true,
            annotations,
            interfaces,
            fields,
            methods,
            label: None,
            superclass: None,
            subclasses: vec![],
            direct_interfaces: vec![],
            implementing_classes: vec![],
        })
    }

    /// Placeholder node for a class referenced before its classfile is seen
    pub(crate) fn stub(name: ClassName) -> ClassInfo {
        ClassInfo {
            name,
            superclass_name: None,
            version: (0, 0),
            is_interface: false,
            is_abstract: false,
            is_enum: false,
            hydrated: false,
            annotations: AnnotationsInfo::empty(),
            interfaces: InterfacesInfo::default(),
            fields: FieldsInfo::default(),
            methods: MethodsInfo::default(),
            label: None,
            superclass: None,
            subclasses: vec![],
            direct_interfaces: vec![],
            implementing_classes: vec![],
        }
    }

    /// Fill a stub in from its decoded classfile
    ///
    /// Hydrating twice is a no-op, so duplicate classfiles on the scan path
    /// are tolerated and the first decoded copy wins. Members already present
    /// on the node are never overwritten.
    pub(crate) fn hydrate(&mut self, source: &ClassInfo) {
        if self.hydrated {
            log::debug!("Ignoring duplicate classfile for {:?}", self.name);
            return;
        }
        self.superclass_name = source.superclass_name.clone();
        self.version = source.version;
        self.is_interface = source.is_interface;
        self.is_abstract = source.is_abstract;
        self.is_enum = source.is_enum;
        self.annotations.append(&source.annotations);
        self.interfaces.append(&source.interfaces);
        self.fields.append(&source.fields);
        self.methods.append(&source.methods);
        self.hydrated = true;
    }

    pub fn name(&self) -> &ClassName {
        &self.name
    }

    pub fn superclass_name(&self) -> Option<&ClassName> {
        self.superclass_name.as_ref()
    }

    /// Classfile version as `(major, minor)`; `(0, 0)` for an unhydrated stub
    pub fn version(&self) -> (u16, u16) {
        self.version
    }

    pub fn is_interface(&self) -> bool {
        self.is_interface
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn is_enum(&self) -> bool {
        self.is_enum
    }

    /// Has the classfile for this node been seen, or is it still a stub?
    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    pub fn annotations(&self) -> &AnnotationsInfo {
        &self.annotations
    }

    pub fn interfaces(&self) -> &InterfacesInfo {
        &self.interfaces
    }

    pub fn fields(&self) -> &FieldsInfo {
        &self.fields
    }

    pub fn methods(&self) -> &MethodsInfo {
        &self.methods
    }

    pub(crate) fn fields_mut(&mut self) -> &mut FieldsInfo {
        &mut self.fields
    }

    pub(crate) fn methods_mut(&mut self) -> &mut MethodsInfo {
        &mut self.methods
    }

    /// Graph label of this class
    ///
    /// The annotated label if one was given, otherwise the simple class name;
    /// empty until the domain is frozen.
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or_else(|| self.name.simple_name())
    }

    /// Resolve the label and every member's logical name
    ///
    /// Runs once while freezing the domain so that later reads never need to
    /// mutate the node.
    pub(crate) fn resolve_names(&mut self) {
        let simple_name = self.name.simple_name().to_owned();
        let label = match self.annotations.get_mut(&ClassName::NODE_ENTITY) {
            Some(entity) => entity.get("label", &simple_name),
            None => simple_name,
        };
        self.label = Some(label);
        for field in self.fields.iter_mut() {
            field.resolve_property_name();
        }
        for method in self.methods.iter_mut() {
            method.resolve_property_name();
        }
    }

    /// Name of the field holding the graph-internal identity
    ///
    /// An explicitly annotated `Long` field wins; failing that, a field named
    /// `id` of type `Long` is picked up by convention.
    pub fn identity_field_name(&self) -> Option<&str> {
        let boxed_long = FieldType::Object(BinaryName::LONG);
        self.fields
            .iter()
            .find(|field| {
                field.annotations().has(&ClassName::GRAPH_ID)
                    && *field.descriptor() == boxed_long
            })
            .or_else(|| {
                self.fields
                    .get("id")
                    .filter(|field| *field.descriptor() == boxed_long)
            })
            .map(FieldInfo::name)
    }

    /// The identity field, or an error for a class that cannot be persisted
    pub fn identity_field(&self) -> Result<&FieldInfo, Error> {
        self.identity_field_name()
            .and_then(|name| self.fields.get(name))
            .ok_or_else(|| Error::MissingIdentityField(self.name.as_str().to_owned()))
    }

    /// Getter for the identity value: an annotated `() -> Long` method, else
    /// a `getId` of the same shape by convention
    pub fn identity_getter(&self) -> Option<&MethodInfo> {
        self.methods
            .iter()
            .find(|method| {
                method.annotations().has(&ClassName::GRAPH_ID)
                    && method.descriptor().render() == "()Ljava/lang/Long;"
            })
            .or_else(|| {
                self.methods
                    .get("getId")
                    .filter(|method| method.descriptor().render() == "()Ljava/lang/Long;")
            })
    }

    /// Setter for the identity value: an annotated `Long -> void` method,
    /// else a `setId` of the same shape by convention
    pub fn identity_setter(&self) -> Option<&MethodInfo> {
        self.methods
            .iter()
            .find(|method| {
                method.annotations().has(&ClassName::GRAPH_ID)
                    && method.descriptor().render() == "(Ljava/lang/Long;)V"
            })
            .or_else(|| {
                self.methods
                    .get("setId")
                    .filter(|method| method.descriptor().render() == "(Ljava/lang/Long;)V")
            })
    }

    /// Fields persisted as plain property values
    pub fn property_fields(&self) -> Vec<&FieldInfo> {
        let identity = self.identity_field_name().map(str::to_owned);
        self.fields
            .iter()
            .filter(|field| identity.as_deref() != Some(field.name()))
            .filter(|field| is_property(field.annotations(), field.is_simple()))
            .collect()
    }

    /// Fields persisted as relationships to other domain classes
    pub fn relationship_fields(&self) -> Vec<&FieldInfo> {
        let identity = self.identity_field_name().map(str::to_owned);
        self.fields
            .iter()
            .filter(|field| identity.as_deref() != Some(field.name()))
            .filter(|field| is_relationship(field.annotations(), field.is_simple()))
            .collect()
    }

    pub fn property_getters(&self) -> Vec<&MethodInfo> {
        self.accessors(MethodInfo::is_getter, is_property)
    }

    pub fn property_setters(&self) -> Vec<&MethodInfo> {
        self.accessors(MethodInfo::is_setter, is_property)
    }

    pub fn relationship_getters(&self) -> Vec<&MethodInfo> {
        self.accessors(MethodInfo::is_getter, is_relationship)
    }

    pub fn relationship_setters(&self) -> Vec<&MethodInfo> {
        self.accessors(MethodInfo::is_setter, is_relationship)
    }

    fn accessors(
        &self,
        shape: impl Fn(&MethodInfo) -> bool,
        kind: impl Fn(&ObjectAnnotations, bool) -> bool,
    ) -> Vec<&MethodInfo> {
        let identity_getter = self.identity_getter().map(MethodInfo::name);
        let identity_setter = self.identity_setter().map(MethodInfo::name);
        self.methods
            .iter()
            .filter(|method| shape(method))
            .filter(|method| {
                Some(method.name()) != identity_getter && Some(method.name()) != identity_setter
            })
            .filter(|method| kind(method.annotations(), method.is_simple()))
            .collect()
    }

    /// Look a property field up by its logical name, ignoring case
    pub fn property_field(&self, property_name: &str) -> Option<&FieldInfo> {
        self.property_fields()
            .into_iter()
            .find(|field| field.property_name().eq_ignore_ascii_case(property_name))
    }

    /// Look a relationship field up by its logical name, ignoring case
    pub fn relationship_field(&self, property_name: &str) -> Option<&FieldInfo> {
        self.relationship_fields()
            .into_iter()
            .find(|field| field.property_name().eq_ignore_ascii_case(property_name))
    }

    /// Look a property getter up by its logical name, ignoring case
    pub fn property_getter(&self, property_name: &str) -> Option<&MethodInfo> {
        self.property_getters()
            .into_iter()
            .find(|method| method.property_name().eq_ignore_ascii_case(property_name))
    }

    /// Look a property setter up by its logical name, ignoring case
    pub fn property_setter(&self, property_name: &str) -> Option<&MethodInfo> {
        self.property_setters()
            .into_iter()
            .find(|method| method.property_name().eq_ignore_ascii_case(property_name))
    }

    /// Look a relationship getter up by its logical name, ignoring case
    pub fn relationship_getter(&self, property_name: &str) -> Option<&MethodInfo> {
        self.relationship_getters()
            .into_iter()
            .find(|method| method.property_name().eq_ignore_ascii_case(property_name))
    }

    /// Look a relationship setter up by its logical name, ignoring case
    pub fn relationship_setter(&self, property_name: &str) -> Option<&MethodInfo> {
        self.relationship_setters()
            .into_iter()
            .find(|method| method.property_name().eq_ignore_ascii_case(property_name))
    }
}

/// Property members: explicitly annotated as a property, or unannotated with
/// a simple value type
fn is_property(annotations: &ObjectAnnotations, simple: bool) -> bool {
    annotations.has(&ClassName::PROPERTY)
        || (!annotations.has(&ClassName::RELATIONSHIP) && simple)
}

/// Relationship members: explicitly annotated as a relationship, or
/// unannotated with a domain-class type
fn is_relationship(annotations: &ObjectAnnotations, simple: bool) -> bool {
    annotations.has(&ClassName::RELATIONSHIP)
        || (!annotations.has(&ClassName::PROPERTY) && !simple)
}
