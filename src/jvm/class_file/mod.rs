//! Reader for the subset of the classfile format the extractor needs
//!
//! Only the structures feeding metadata extraction are decoded: the constant
//! pool, access flags, this/super class, interfaces, fields, methods, and the
//! `RuntimeVisibleAnnotations` and `Signature` attributes. Every other
//! attribute is skipped using its declared length.

mod attribute;
mod constants;
mod deserialize;

pub use attribute::*;
pub use constants::*;
pub use deserialize::*;
