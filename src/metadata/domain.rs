use crate::errors::Error;
use crate::jvm::{BinaryName, ClassName};
use crate::metadata::class::{ClassId, ClassInfo};
use crate::metadata::convert::default_converter;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::io::Read;
use std::ops::Deref;

/// Metadata graph over every scanned classfile
///
/// Built in two phases: [`Self::process`] decodes classfiles one at a time in
/// any order, creating stub nodes for classes referenced before they are
/// seen; [`Self::finish`] runs once afterwards and freezes the graph. Once
/// frozen the graph is read-only, so lookups can be shared freely across
/// threads.
#[derive(Debug, Default)]
pub struct DomainInfo {
    /// Node storage; handles index into this and stay valid as nodes are
    /// hydrated in place
    arena: Vec<ClassInfo>,
    classes: HashMap<ClassName, ClassId>,
    interfaces: HashMap<ClassName, ClassId>,
    annotation_index: HashMap<ClassName, Vec<ClassId>>,
    /// Internal-form names of every scanned enum type
    enum_types: HashSet<BinaryName>,
}

impl DomainInfo {
    pub fn new() -> DomainInfo {
        DomainInfo::default()
    }

    fn node(&self, id: ClassId) -> &ClassInfo {
        &self.arena[id.0 as usize]
    }

    fn node_mut(&mut self, id: ClassId) -> &mut ClassInfo {
        &mut self.arena[id.0 as usize]
    }

    fn alloc(&mut self, info: ClassInfo) -> ClassId {
        let id = ClassId(self.arena.len() as u32);
        self.arena.push(info);
        id
    }

    fn view(&self, id: ClassId) -> ClassView {
        ClassView { domain: self, id }
    }

    /// Decode one classfile into the graph
    ///
    /// A classfile whose class was already seen is ignored, and one whose
    /// class was only referenced so far hydrates the existing stub in place.
    /// Enums additionally record their name for converter inference.
    pub fn process<R: Read>(&mut self, mut reader: R) -> Result<(), Error> {
        let parsed = ClassInfo::parse(&mut reader)?;
        log::debug!("Processing classfile for {:?}", parsed.name());

        if parsed.is_enum() {
            // Enum types additionally feed default converter inference
            self.enum_types
                .insert(BinaryName::from_string(parsed.name().internal_form()));
        }

        if parsed.is_interface() {
            if let Some(&id) = self.interfaces.get(parsed.name().as_str()) {
                self.node_mut(id).hydrate(&parsed);
            } else {
                let name = parsed.name().clone();
                let id = self.alloc(parsed);
                self.interfaces.insert(name, id);
            }
            return Ok(());
        }

        let id = match self.classes.get(parsed.name().as_str()) {
            Some(&id) => {
                let already_hydrated = self.node(id).is_hydrated();
                self.node_mut(id).hydrate(&parsed);
                if already_hydrated {
                    // Duplicate classfile: the first one already linked in
                    return Ok(());
                }
                id
            }
            None => {
                let name = parsed.name().clone();
                let id = self.alloc(parsed);
                self.classes.insert(name, id);
                id
            }
        };

        if let Some(super_name) = self.node(id).superclass_name().cloned() {
            if !super_name.is_root_object() {
                let super_id = match self.classes.get(super_name.as_str()) {
                    Some(&super_id) => super_id,
                    None => {
                        let super_id = self.alloc(ClassInfo::stub(super_name.clone()));
                        self.classes.insert(super_name, super_id);
                        super_id
                    }
                };
                self.link_superclass(id, super_id)?;
            }
        }
        Ok(())
    }

    fn link_superclass(&mut self, id: ClassId, super_id: ClassId) -> Result<(), Error> {
        if let Some(existing) = self.node(id).superclass {
            if existing != super_id {
                return Err(Error::SuperclassConflict {
                    class: self.node(id).name().as_str().to_owned(),
                    existing: self.node(existing).name().as_str().to_owned(),
                    conflicting: self.node(super_id).name().as_str().to_owned(),
                });
            }
            return Ok(());
        }
        self.node_mut(id).superclass = Some(super_id);
        self.node_mut(super_id).subclasses.push(id);
        Ok(())
    }

    /// Freeze the graph after the last classfile has been processed
    ///
    /// Indexes annotations, assigns default converters (enum inference needs
    /// the full scan), resolves labels and logical member names, pushes
    /// inherited members down every hierarchy, wires interfaces to their
    /// implementors, and prunes transient subtrees.
    pub fn finish(&mut self) {
        self.build_annotation_index();
        self.assign_default_converters();
        for node in self.arena.iter_mut() {
            node.resolve_names();
        }
        self.extend_hierarchies();
        self.wire_interfaces();
        self.prune_transient();
        log::info!(
            "Domain frozen with {} classes and {} interfaces",
            self.classes.len(),
            self.interfaces.len(),
        );
    }

    fn build_annotation_index(&mut self) {
        let mut index: HashMap<ClassName, Vec<ClassId>> = HashMap::new();
        for &id in self.classes.values().chain(self.interfaces.values()) {
            for annotation in self.node(id).annotations().names() {
                index.entry(annotation.clone()).or_default().push(id);
            }
        }
        self.annotation_index = index;
    }

    fn assign_default_converters(&mut self) {
        let DomainInfo {
            arena, enum_types, ..
        } = self;
        for node in arena.iter_mut() {
            for field in node.fields_mut().iter_mut() {
                let inferred = default_converter(field.target_type(), enum_types);
                field.set_converter_if_absent(inferred);
            }
            for method in node.methods_mut().iter_mut() {
                let inferred = method
                    .target_type()
                    .and_then(|target| default_converter(target, enum_types));
                method.set_converter_if_absent(inferred);
            }
        }
    }

    /// Push every class's fields and accessors down into its subclasses
    ///
    /// Works root-first so grandchildren pick inherited members up through
    /// their parents; a redeclared member always shadows the inherited one.
    fn extend_hierarchies(&mut self) {
        let roots: Vec<ClassId> = self
            .classes
            .values()
            .copied()
            .filter(|&id| self.node(id).superclass.is_none())
            .collect();
        for root in roots {
            self.extend_subclasses(root);
        }
    }

    fn extend_subclasses(&mut self, id: ClassId) {
        let fields = self.node(id).fields().clone();
        let methods = self.node(id).methods().clone();
        for child in self.node(id).subclasses.clone() {
            self.node_mut(child).fields_mut().append(&fields);
            self.node_mut(child).methods_mut().append(&methods);
            self.extend_subclasses(child);
        }
    }

    /// Link every class to the interfaces it implements, directly or through
    /// an interface extending another, and every interface to the interfaces
    /// it extends
    fn wire_interfaces(&mut self) {
        // Extension edges between interfaces come first so that pruning a
        // transient interface can walk into its extending sub-interfaces
        let interface_ids: Vec<ClassId> = self.interfaces.values().copied().collect();
        for id in interface_ids {
            let extended: Vec<ClassName> = self
                .node(id)
                .interfaces()
                .iter()
                .map(|interface| interface.name().clone())
                .collect();
            for name in extended {
                if let Some(&super_interface) = self.interfaces.get(name.as_str()) {
                    if !self.node(id).direct_interfaces.contains(&super_interface) {
                        self.node_mut(id).direct_interfaces.push(super_interface);
                        self.node_mut(super_interface).implementing_classes.push(id);
                    }
                }
            }
        }

        let class_ids: Vec<ClassId> = self.classes.values().copied().collect();
        for id in class_ids {
            let declared: Vec<ClassName> = self
                .node(id)
                .interfaces()
                .iter()
                .map(|interface| interface.name().clone())
                .collect();
            for name in declared {
                match self.interfaces.get(name.as_str()) {
                    Some(&interface_id) => self.wire_interface(id, interface_id),
                    // Standard-library interfaces (Serializable and friends)
                    // are expected to be absent from the scan
                    None if !name.as_str().starts_with("java.") => log::warn!(
                        "Interface {:?} implemented by {:?} was never scanned",
                        name,
                        self.node(id).name(),
                    ),
                    None => {}
                }
            }
        }
    }

    fn wire_interface(&mut self, class_id: ClassId, interface_id: ClassId) {
        if self.node(class_id).direct_interfaces.contains(&interface_id) {
            return;
        }
        self.node_mut(class_id).direct_interfaces.push(interface_id);
        self.node_mut(interface_id).implementing_classes.push(class_id);

        // An interface's own interface table holds the interfaces it extends
        let extended: Vec<ClassName> = self
            .node(interface_id)
            .interfaces()
            .iter()
            .map(|interface| interface.name().clone())
            .collect();
        for name in extended {
            if let Some(&super_interface) = self.interfaces.get(name.as_str()) {
                self.wire_interface(class_id, super_interface);
            }
        }
    }

    /// Drop every transient class along with its whole subtree
    fn prune_transient(&mut self) {
        let transient = self
            .annotation_index
            .get(ClassName::TRANSIENT.as_str())
            .cloned()
            .unwrap_or_default();
        for id in transient {
            self.remove_subtree(id);
        }
        let classes = &self.classes;
        let interfaces = &self.interfaces;
        for ids in self.annotation_index.values_mut() {
            ids.retain(|&id| {
                classes.values().any(|&c| c == id) || interfaces.values().any(|&i| i == id)
            });
        }
    }

    fn remove_subtree(&mut self, id: ClassId) {
        let name = self.node(id).name().clone();
        log::debug!("Pruning transient class {:?}", name);
        self.classes.remove(name.as_str());
        self.interfaces.remove(name.as_str());
        for child in self.node(id).subclasses.clone() {
            self.remove_subtree(child);
        }
        for implementor in self.node(id).implementing_classes.clone() {
            self.remove_subtree(implementor);
        }
    }

    /// Look a class up by fully qualified dotted name
    pub fn get_class(&self, name: &str) -> Option<ClassView> {
        self.classes.get(name).map(|&id| self.view(id))
    }

    /// Look an interface up by fully qualified dotted name
    pub fn get_interface(&self, name: &str) -> Option<ClassView> {
        self.interfaces.get(name).map(|&id| self.view(id))
    }

    /// Every class or interface carrying the given annotation
    pub fn get_classes_with_annotation(&self, annotation: &str) -> Vec<ClassView> {
        self.annotation_index
            .get(annotation)
            .map(|ids| ids.iter().map(|&id| self.view(id)).collect())
            .unwrap_or_default()
    }

    /// Look a class up by unqualified name
    ///
    /// Fails when two scanned packages declare the same simple name; the
    /// caller must qualify the lookup.
    pub fn get_class_simple_name(&self, simple_name: &str) -> Result<Option<ClassView>, Error> {
        let mut candidates: Vec<&ClassName> = self
            .classes
            .keys()
            .filter(|name| name.simple_name() == simple_name)
            .collect();
        match candidates.len() {
            0 => Ok(None),
            1 => Ok(self.get_class(candidates[0].as_str())),
            _ => {
                candidates.sort();
                Err(Error::AmbiguousSimpleName {
                    simple_name: simple_name.to_owned(),
                    candidates: candidates
                        .into_iter()
                        .map(|name| name.as_str().to_owned())
                        .collect(),
                })
            }
        }
    }

    /// Number of mapped classes (interfaces and pruned subtrees not counted)
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Iterate over every mapped class
    pub fn classes(&self) -> impl Iterator<Item = ClassView<'_>> + '_ {
        self.classes.values().map(move |&id| self.view(id))
    }
}

/// Borrowed handle to one node of a frozen [`DomainInfo`]
///
/// Dereferences to the underlying [`ClassInfo`] and adds the lookups that
/// need the rest of the graph.
#[derive(Copy, Clone)]
pub struct ClassView<'d> {
    domain: &'d DomainInfo,
    id: ClassId,
}

impl<'d> ClassView<'d> {
    pub fn id(&self) -> ClassId {
        self.id
    }

    pub fn superclass(&self) -> Option<ClassView<'d>> {
        self.domain.node(self.id).superclass.map(|id| self.domain.view(id))
    }

    pub fn direct_subclasses(&self) -> Vec<ClassView<'d>> {
        self.domain
            .node(self.id)
            .subclasses
            .iter()
            .map(|&id| self.domain.view(id))
            .collect()
    }

    pub fn direct_interfaces(&self) -> Vec<ClassView<'d>> {
        self.domain
            .node(self.id)
            .direct_interfaces
            .iter()
            .map(|&id| self.domain.view(id))
            .collect()
    }

    pub fn implementing_classes(&self) -> Vec<ClassView<'d>> {
        self.domain
            .node(self.id)
            .implementing_classes
            .iter()
            .map(|&id| self.domain.view(id))
            .collect()
    }

    /// Every label stored on a node of this class: its own, plus those
    /// inherited from concrete superclasses and annotated interfaces
    pub fn labels(&self) -> BTreeSet<String> {
        let mut labels = BTreeSet::new();
        self.collect_labels(&mut labels);
        labels
    }

    fn collect_labels(&self, labels: &mut BTreeSet<String>) {
        let node = self.domain.node(self.id);
        // Abstract types only label nodes when explicitly marked as entities
        if !node.is_abstract() || node.annotations().has(&ClassName::NODE_ENTITY) {
            labels.insert(node.label().to_owned());
        }
        if let Some(superclass) = self.superclass() {
            superclass.collect_labels(labels);
        }
        for interface in self.direct_interfaces() {
            interface.collect_labels(labels);
        }
    }
}

impl Deref for ClassView<'_> {
    type Target = ClassInfo;

    fn deref(&self) -> &ClassInfo {
        self.domain.node(self.id)
    }
}

impl std::fmt::Debug for ClassView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self.domain.node(self.id), f)
    }
}
