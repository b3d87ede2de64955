//! JVM-side plumbing: names, descriptors, access flags, and classfile reading

mod access_flags;
pub mod class_file;
mod descriptors;
mod names;

pub use access_flags::*;
pub use descriptors::*;
pub use names::*;
