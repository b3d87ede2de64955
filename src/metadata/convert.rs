use crate::jvm::{BinaryName, ClassName, FieldType};
use std::collections::HashSet;

/// Attribute converters bridging object members and graph property values
///
/// A converter is attached to a member either explicitly, through a
/// conversion annotation, or by default from the member's type signature once
/// the whole domain has been scanned (enum types are only known at that
/// point).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Converter {
    /// `java.util.Date` <-> formatted string
    DateString { format: String },
    /// `java.util.Date` <-> epoch milliseconds
    DateLong,
    /// Enum constant <-> its name
    EnumString { enum_type: ClassName },
    /// `BigInteger` / `BigDecimal` <-> decimal string
    NumberString { number_type: ClassName },
    /// `byte[]` <-> base64 string
    ByteArrayBase64,
    /// `java.lang.Byte[]` <-> base64 string
    WrappedByteArrayBase64,
}

impl Converter {
    /// Default format for date properties stored as strings
    pub const ISO_8601: &'static str = "yyyy-MM-dd'T'HH:mm:ss.SSSXXX";
}

/// Infer the default converter for a member type
///
/// Matches in a fixed priority order (date, big integer, big decimal, byte
/// array, boxed byte array, then any scanned enum type); the first match
/// wins, and a type matching nothing gets no converter.
pub(crate) fn default_converter(
    field_type: &FieldType,
    enum_types: &HashSet<BinaryName>,
) -> Option<Converter> {
    match field_type {
        FieldType::Object(name) if *name == BinaryName::DATE => Some(Converter::DateString {
            format: Converter::ISO_8601.to_owned(),
        }),
        FieldType::Object(name) if *name == BinaryName::BIG_INTEGER => {
            Some(Converter::NumberString {
                number_type: name.dotted(),
            })
        }
        FieldType::Object(name) if *name == BinaryName::BIG_DECIMAL => {
            Some(Converter::NumberString {
                number_type: name.dotted(),
            })
        }
        FieldType::PrimitiveArray(array)
            if array.additional_dimensions == 0
                && array.element_type == crate::jvm::BaseType::Byte =>
        {
            Some(Converter::ByteArrayBase64)
        }
        FieldType::ObjectArray(array)
            if array.additional_dimensions == 0 && array.element_type == BinaryName::BYTE =>
        {
            Some(Converter::WrappedByteArrayBase64)
        }
        FieldType::Object(name) if enum_types.contains(name) => Some(Converter::EnumString {
            enum_type: name.dotted(),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::ParseDescriptor;

    fn infer(descriptor: &str, enums: &[&str]) -> Option<Converter> {
        let enum_types = enums
            .iter()
            .map(|name| BinaryName::from_string((*name).to_owned()))
            .collect();
        default_converter(&FieldType::parse(descriptor).unwrap(), &enum_types)
    }

    #[test]
    fn date_gets_iso_format() {
        assert_eq!(
            infer("Ljava/util/Date;", &[]),
            Some(Converter::DateString {
                format: Converter::ISO_8601.to_owned()
            })
        );
    }

    #[test]
    fn byte_arrays() {
        assert_eq!(infer("[B", &[]), Some(Converter::ByteArrayBase64));
        assert_eq!(
            infer("[Ljava/lang/Byte;", &[]),
            Some(Converter::WrappedByteArrayBase64)
        );
        // Multi-dimensional arrays are not convertible
        assert_eq!(infer("[[B", &[]), None);
    }

    #[test]
    fn scanned_enums() {
        assert_eq!(
            infer("Lcom/example/Colour;", &["com/example/Colour"]),
            Some(Converter::EnumString {
                enum_type: ClassName::from_internal("com/example/Colour")
            })
        );
        assert_eq!(infer("Lcom/example/Colour;", &[]), None);
    }

    #[test]
    fn unmatched_types() {
        assert_eq!(infer("J", &[]), None);
        assert_eq!(infer("Ljava/lang/String;", &[]), None);
    }
}
