use std::borrow::{Borrow, Cow};
use std::fmt::{Debug, Error as FmtError, Formatter};

/// Name of a class or interface in the classfile's internal (slash) form
///
/// See <https://docs.oracle.com/javase/specs/jvms/se16/html/jvms-4.html#jvms-4.2.1>
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct BinaryName(Cow<'static, str>);

impl BinaryName {
    const fn name(value: &'static str) -> BinaryName {
        BinaryName(Cow::Borrowed(value))
    }

    pub fn from_string(name: String) -> BinaryName {
        BinaryName(Cow::Owned(name))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_ref()
    }

    /// Convert to the dotted source form (`a/b/C` becomes `a.b.C`)
    pub fn dotted(&self) -> ClassName {
        ClassName(Cow::Owned(self.0.replace('/', ".")))
    }

    /// Is this type part of the Java standard library?
    ///
    /// Standard-library types are never relationship targets; the mapper
    /// stores them as plain property values.
    pub fn is_standard_library(&self) -> bool {
        self.0.starts_with("java/")
    }

    // JDK names the classifier needs
    pub const OBJECT: Self = Self::name("java/lang/Object");
    pub const LONG: Self = Self::name("java/lang/Long");
    pub const BYTE: Self = Self::name("java/lang/Byte");
    pub const DATE: Self = Self::name("java/util/Date");
    pub const BIG_INTEGER: Self = Self::name("java/math/BigInteger");
    pub const BIG_DECIMAL: Self = Self::name("java/math/BigDecimal");
}

impl AsRef<str> for BinaryName {
    fn as_ref(&self) -> &str {
        self.0.as_ref()
    }
}

impl Debug for BinaryName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.write_str(self.0.as_ref())
    }
}

/// Fully qualified dotted class name (eg. `java.lang.Long`)
///
/// Every map in the metadata graph is keyed by this form; the internal slash
/// form never escapes the decoder.
#[derive(Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct ClassName(Cow<'static, str>);

impl ClassName {
    const fn name(value: &'static str) -> ClassName {
        ClassName(Cow::Borrowed(value))
    }

    pub fn from_string(name: String) -> ClassName {
        ClassName(Cow::Owned(name))
    }

    /// Convert a name in internal (slash) form to the dotted form
    pub fn from_internal(name: &str) -> ClassName {
        ClassName(Cow::Owned(name.replace('/', ".")))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_ref()
    }

    /// The unqualified part of the name (`Long` for `java.lang.Long`)
    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(self.0.as_ref())
    }

    /// Back to the internal slash form, as recorded in enum signatures
    pub fn internal_form(&self) -> String {
        self.0.replace('.', "/")
    }

    /// Is this the root of every class hierarchy?
    pub fn is_root_object(&self) -> bool {
        *self == ClassName::OBJECT
    }

    pub const OBJECT: Self = Self::name("java.lang.Object");

    // Mapping annotations recognized by the extractor. These live in the
    // companion Java annotation library; the extractor only ever sees their
    // fully qualified names in `RuntimeVisibleAnnotations` attributes.
    pub const NODE_ENTITY: Self = Self::name("io.class2graph.annotation.NodeEntity");
    pub const GRAPH_ID: Self = Self::name("io.class2graph.annotation.GraphId");
    pub const PROPERTY: Self = Self::name("io.class2graph.annotation.Property");
    pub const RELATIONSHIP: Self = Self::name("io.class2graph.annotation.Relationship");
    pub const TRANSIENT: Self = Self::name("io.class2graph.annotation.Transient");

    // Conversion annotations
    pub const DATE_STRING: Self = Self::name("io.class2graph.typeconversion.DateString");
    pub const DATE_LONG: Self = Self::name("io.class2graph.typeconversion.DateLong");
    pub const ENUM_STRING: Self = Self::name("io.class2graph.typeconversion.EnumString");
    pub const NUMBER_STRING: Self = Self::name("io.class2graph.typeconversion.NumberString");
}

impl AsRef<str> for ClassName {
    fn as_ref(&self) -> &str {
        self.0.as_ref()
    }
}

/// Lets name-keyed maps be queried with plain `&str` keys
impl Borrow<str> for ClassName {
    fn borrow(&self) -> &str {
        self.0.as_ref()
    }
}

impl Debug for ClassName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.write_str(self.0.as_ref())
    }
}
