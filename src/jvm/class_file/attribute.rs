use crate::errors::Error;
use crate::jvm::class_file::{skip_bytes, ConstantPool, Deserialize};
use byteorder::ReadBytesExt;

/// Attribute holding the runtime-visible annotations of a class or member
pub const RUNTIME_VISIBLE_ANNOTATIONS: &str = "RuntimeVisibleAnnotations";

/// Attribute holding a member's generic type signature
pub const SIGNATURE: &str = "Signature";

/// Walk an attribute table, letting `handle` consume recognized attributes
///
/// `handle` receives the attribute name and must return `true` after reading
/// exactly the attribute's payload; any attribute it declines is skipped
/// using the declared length. Skipping unrecognized attributes is by design,
/// not an error: only a small subset of the classfile format feeds metadata
/// extraction.
pub fn for_each_attribute<R, F>(
    reader: &mut R,
    pool: &ConstantPool,
    mut handle: F,
) -> Result<(), Error>
where
    R: ReadBytesExt,
    F: FnMut(&mut R, &str) -> Result<bool, Error>,
{
    let count = u16::deserialize(reader)?;
    for _ in 0..count {
        let name_index = u16::deserialize(reader)?;
        let length = u32::deserialize(reader)?;
        let name = pool.lookup(name_index).unwrap_or("");
        if !handle(reader, name)? {
            skip_bytes(reader, u64::from(length))?;
        }
    }
    Ok(())
}
