use crate::errors::Error;
use crate::jvm::class_file::{ConstantPool, Deserialize};
use crate::jvm::ClassName;
use byteorder::ReadBytesExt;

/// One directly implemented (or extended) interface
#[derive(Clone, Debug)]
pub struct InterfaceInfo {
    name: ClassName,
}

impl InterfaceInfo {
    pub fn name(&self) -> &ClassName {
        &self.name
    }
}

/// The interfaces a class declares directly
#[derive(Clone, Debug, Default)]
pub struct InterfacesInfo {
    interfaces: Vec<InterfaceInfo>,
}

impl InterfacesInfo {
    /// Decode a classfile's interface table (a list of class-entry indexes)
    pub fn parse<R: ReadBytesExt>(
        reader: &mut R,
        pool: &ConstantPool,
    ) -> Result<InterfacesInfo, Error> {
        let count = u16::deserialize(reader)?;
        let mut interfaces = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let name = pool.expect(u16::deserialize(reader)?)?;
            interfaces.push(InterfaceInfo {
                name: ClassName::from_internal(name),
            });
        }
        Ok(InterfacesInfo { interfaces })
    }

    pub fn iter(&self) -> impl Iterator<Item = &InterfaceInfo> {
        self.interfaces.iter()
    }

    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }

    /// First-wins merge by name, used when hydrating a stub
    pub(crate) fn append(&mut self, other: &InterfacesInfo) {
        for interface in &other.interfaces {
            if !self.interfaces.iter().any(|i| i.name == interface.name) {
                self.interfaces.push(interface.clone());
            }
        }
    }
}
