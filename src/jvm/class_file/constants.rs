use crate::errors::Error;
use crate::jvm::class_file::{read_modified_utf8, skip_bytes, Deserialize};
use byteorder::ReadBytesExt;

/// Tags marking the type of a constant-pool entry
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.4
mod tag {
    pub const UTF8: u8 = 1;
    pub const INTEGER: u8 = 3;
    pub const FLOAT: u8 = 4;
    pub const LONG: u8 = 5;
    pub const DOUBLE: u8 = 6;
    pub const CLASS: u8 = 7;
    pub const STRING: u8 = 8;
    pub const FIELD_REF: u8 = 9;
    pub const METHOD_REF: u8 = 10;
    pub const INTERFACE_METHOD_REF: u8 = 11;
    pub const NAME_AND_TYPE: u8 = 12;
    pub const METHOD_HANDLE: u8 = 15;
    pub const METHOD_TYPE: u8 = 16;
    pub const INVOKE_DYNAMIC: u8 = 18;
}

/// One decoded constant-pool slot
///
/// The extractor only ever needs the string constants, so numeric entries are
/// skipped entirely and symbolic references keep just the index of the entry
/// that ultimately holds their string.
#[derive(Clone, Debug)]
enum Slot {
    /// Slot 0, and the unusable second half of an 8-byte constant
    Empty,
    Utf8(String),
    /// Index of the slot holding this entry's string
    Indirect(u16),
}

/// Resolvable string constants of a single classfile, indexed starting at 1
///
/// The pool lives only as long as parsing the classfile it came from; once
/// the metadata node is built it is discarded.
pub struct ConstantPool {
    slots: Vec<Slot>,
}

impl ConstantPool {
    /// Decode the pool, positioned at its size `u16`
    ///
    /// `LONG` and `DOUBLE` constants take up two slots; the second is left
    /// empty and is never independently resolvable. An unrecognized tag is a
    /// malformed classfile.
    pub fn parse<R: ReadBytesExt>(reader: &mut R) -> Result<ConstantPool, Error> {
        let size = u16::deserialize(reader)?;
        let mut slots = vec![Slot::Empty; size as usize];
        let mut index: u16 = 1;
        while index < size {
            match u8::deserialize(reader)? {
                tag::UTF8 => {
                    slots[index as usize] = Slot::Utf8(read_modified_utf8(reader)?);
                }
                tag::INTEGER | tag::FLOAT => skip_bytes(reader, 4)?,
                tag::LONG | tag::DOUBLE => {
                    skip_bytes(reader, 8)?;
                    // 8-byte constants consume the following slot as well
                    index += 1;
                }
                tag::CLASS | tag::STRING => {
                    slots[index as usize] = Slot::Indirect(u16::deserialize(reader)?);
                }
                tag::FIELD_REF
                | tag::METHOD_REF
                | tag::INTERFACE_METHOD_REF
                | tag::NAME_AND_TYPE => {
                    // Drop the owning-class (or name) half of the reference
                    skip_bytes(reader, 2)?;
                    slots[index as usize] = Slot::Indirect(u16::deserialize(reader)?);
                }
                tag::METHOD_HANDLE => skip_bytes(reader, 3)?,
                tag::METHOD_TYPE => skip_bytes(reader, 2)?,
                tag::INVOKE_DYNAMIC => skip_bytes(reader, 4)?,
                other => {
                    return Err(Error::UnknownConstantPoolTag { tag: other, index });
                }
            }
            index += 1;
        }
        Ok(ConstantPool { slots })
    }

    /// Resolve the string at `index`, following at most one indirection
    pub fn lookup(&self, index: u16) -> Option<&str> {
        match self.slots.get(index as usize)? {
            Slot::Utf8(string) => Some(string),
            Slot::Indirect(target) => match self.slots.get(*target as usize)? {
                Slot::Utf8(string) => Some(string),
                _ => None,
            },
            Slot::Empty => None,
        }
    }

    /// Like [`Self::lookup`], but failing where the format requires a string
    pub fn expect(&self, index: u16) -> Result<&str, Error> {
        self.lookup(index).ok_or(Error::MissingUtf8(index))
    }
}
