use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Error, ErrorKind, Read, Result};

/// Utility trait for deserializing data inside class files
///
/// Java class files have some peculiarities that make it useful to define an
/// extra trait (instead of just using `serde`):
///
///   - tags are always `u8`
///   - when deserializing a sequence, the length of the sequence is usually `u16`
///   - all multi-byte quantities are big endian
///
pub trait Deserialize: Sized {
    /// Deserialize construct from a binary input stream
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self>;
}

impl Deserialize for u8 {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self> {
        reader.read_u8()
    }
}

impl Deserialize for u16 {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self> {
        reader.read_u16::<BigEndian>()
    }
}

impl Deserialize for u32 {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self> {
        reader.read_u32::<BigEndian>()
    }
}

/// Discard exactly `count` bytes from the stream
///
/// Used for constants whose values the extractor never needs and for
/// attributes skipped by declared length.
pub fn skip_bytes<R: Read>(reader: &mut R, count: u64) -> Result<()> {
    let copied = std::io::copy(&mut reader.by_ref().take(count), &mut std::io::sink())?;
    if copied == count {
        Ok(())
    } else {
        Err(Error::new(
            ErrorKind::UnexpectedEof,
            format!("Expected {} more bytes, found {}", count, copied),
        ))
    }
}

/// Read a length-prefixed modified-UTF-8 string
pub fn read_modified_utf8<R: ReadBytesExt>(reader: &mut R) -> Result<String> {
    let length = u16::deserialize(reader)? as usize;
    let mut buffer = vec![0u8; length];
    reader.read_exact(&mut buffer)?;
    decode_modified_utf8(&buffer)
}

/// Modified UTF-8 format used in class files.
///
/// See [this `DataInput` section for details][0]. Quoting from that section:
///
/// > The differences between this format and the standard UTF-8 format are the following:
/// >
/// >  * The null byte `\u{0000}` is encoded in 2-byte format rather than 1-byte, so that the encoded
/// >    strings never have embedded nulls.
/// >  * Only the 1-byte, 2-byte, and 3-byte formats are used.
/// >  * Supplementary characters are represented in the form of surrogate pairs.
///
/// [0]: https://docs.oracle.com/en/java/javase/17/docs/api/java.base/java/io/DataInput.html#modified-utf-8
pub fn decode_modified_utf8(bytes: &[u8]) -> Result<String> {
    fn invalid() -> Error {
        Error::new(ErrorKind::InvalidData, "Invalid modified UTF-8")
    }
    fn byte_at(bytes: &[u8], index: usize) -> Result<u32> {
        bytes
            .get(index)
            .copied()
            .map(u32::from)
            .ok_or_else(invalid)
    }

    let mut decoded = String::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        let byte = bytes[index];
        if byte & 0b1000_0000 == 0 {
            decoded.push(byte as char);
            index += 1;
        } else if byte & 0b1110_0000 == 0b1100_0000 {
            let second = byte_at(bytes, index + 1)?;
            let code = (u32::from(byte) & 0x1F) << 6 | (second & 0x3F);
            decoded.push(char::from_u32(code).ok_or_else(invalid)?);
            index += 2;
        } else if byte & 0b1111_0000 == 0b1110_0000 {
            let second = byte_at(bytes, index + 1)?;
            let third = byte_at(bytes, index + 2)?;
            let code = (u32::from(byte) & 0x0F) << 12 | (second & 0x3F) << 6 | (third & 0x3F);
            if (0xD800..0xDC00).contains(&code) {
                // High surrogate: the low half must follow as another 3-byte sequence
                let fourth = byte_at(bytes, index + 3)?;
                let fifth = byte_at(bytes, index + 4)?;
                let sixth = byte_at(bytes, index + 5)?;
                if fourth & 0xF0 != 0xE0 {
                    return Err(invalid());
                }
                let low = (fourth & 0x0F) << 12 | (fifth & 0x3F) << 6 | (sixth & 0x3F);
                if !(0xDC00..0xE000).contains(&low) {
                    return Err(invalid());
                }
                let code = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                decoded.push(char::from_u32(code).ok_or_else(invalid)?);
                index += 6;
            } else {
                decoded.push(char::from_u32(code).ok_or_else(invalid)?);
                index += 3;
            }
        } else {
            return Err(invalid());
        }
    }
    Ok(decoded)
}
