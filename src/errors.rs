use std::fmt;

/// Errors surfaced while decoding classfiles or querying the metadata graph
///
/// Decode errors are fatal to the classfile (or build) that produced them and
/// are never retried; the classfile set is assumed static for the process
/// lifetime. Lookup errors are fatal only to the individual query.
#[derive(Debug)]
pub enum Error {
    IoError(std::io::Error),

    /// The first four bytes of the classfile were not `0xCAFEBABE`
    BadMagic(u32),

    /// A constant-pool entry carried a tag this reader does not know
    UnknownConstantPoolTag { tag: u8, index: u16 },

    /// An annotation element value carried an unknown tag byte
    UnknownAnnotationElementTag(u8),

    /// A constant-pool slot that must resolve to a string does not
    MissingUtf8(u16),

    /// A field or method descriptor failed to parse
    BadDescriptor(String),

    /// No identity field could be resolved for the named class
    MissingIdentityField(String),

    /// More than one registered class matches a simple-name query
    AmbiguousSimpleName {
        simple_name: String,
        candidates: Vec<String>,
    },

    /// A class was asserted to have two different direct superclasses
    SuperclassConflict {
        class: String,
        existing: String,
        conflicting: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::IoError(err) => write!(f, "i/o error reading classfile: {}", err),
            Error::BadMagic(magic) => {
                write!(f, "bad classfile magic 0x{:08X}", magic)
            }
            Error::UnknownConstantPoolTag { tag, index } => {
                write!(f, "unknown constant pool tag {} at index {}", tag, index)
            }
            Error::UnknownAnnotationElementTag(tag) => {
                write!(f, "unknown annotation element tag {}", tag)
            }
            Error::MissingUtf8(index) => {
                write!(f, "constant pool index {} does not hold a string", index)
            }
            Error::BadDescriptor(descriptor) => {
                write!(f, "malformed descriptor '{}'", descriptor)
            }
            Error::MissingIdentityField(class) => {
                write!(f, "no identity field found for class {}", class)
            }
            Error::AmbiguousSimpleName {
                simple_name,
                candidates,
            } => {
                write!(
                    f,
                    "simple name '{}' matches more than one class: {}",
                    simple_name,
                    candidates.join(", ")
                )
            }
            Error::SuperclassConflict {
                class,
                existing,
                conflicting,
            } => {
                write!(
                    f,
                    "class {} already has superclass {} (conflicting: {})",
                    class, existing, conflicting
                )
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::IoError(err)
    }
}
