//! Extract domain metadata from JVM class files
//!
//! This crate reads raw classfile bytes (no runtime reflection involved) and
//! builds an in-memory graph of type metadata: the class hierarchy, fields,
//! methods, annotations, and the inferred persistence role of every member
//! (identity, property, or relationship). An object-graph mapper consumes the
//! resulting graph to translate objects to graph-database records.
//!
//! The build is a two-phase, one-shot computation. An external classpath
//! scanner feeds one classfile stream per discovered class to
//! [`DomainInfo::process`]; once every stream is exhausted, a single call to
//! [`DomainInfo::finish`] links the hierarchy, assigns default converters,
//! and prunes transient subtrees. After that the graph is frozen and safe
//! for unsynchronized concurrent reads.
//!
//! ```ignore
//! let mut domain = DomainInfo::new();
//! for mut stream in scanner.classfiles(&["com/example/domain"]) {
//!     domain.process(&mut stream)?;
//! }
//! domain.finish();
//!
//! let dog = domain.get_class("com.example.domain.Dog").unwrap();
//! assert!(dog.labels().contains("Dog"));
//! ```

pub mod errors;
pub mod jvm;
pub mod metadata;

pub use errors::Error;
pub use metadata::{ClassView, DomainInfo};
